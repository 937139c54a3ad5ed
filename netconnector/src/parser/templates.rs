//! Grammars shipped with the crate, one per (platform, command).

use super::TemplateKey;

macro_rules! template {
    ($platform:literal, $command:literal) => {
        (
            TemplateKey::new($platform, $command),
            include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/templates/",
                $platform,
                "/",
                $command,
                ".textfsm"
            )),
        )
    };
}

pub static BUILTIN_TEMPLATES: &[(TemplateKey, &str)] = &[
    template!("cisco_ios", "interfaces"),
    template!("cisco_ios", "mac"),
    template!("cisco_ios", "port_media"),
    template!("cisco_ios", "trunk_vlans"),
    template!("cisco_ios", "version"),
    template!("cisco_ios", "vlans"),

    template!("dlink", "interfaces"),
    template!("dlink", "mac"),
    template!("dlink", "port_media"),
    template!("dlink", "switch"),
    template!("dlink", "vlans"),

    template!("edgecore", "interfaces"),
    template!("edgecore", "mac"),
    template!("edgecore", "system"),
    template!("edgecore", "version"),

    template!("eltex_ltp", "interfaces"),
    template!("eltex_ltp", "mac"),
    template!("eltex_ltp", "version"),

    template!("eltex_mes", "interfaces"),
    template!("eltex_mes", "mac"),
    template!("eltex_mes", "system"),
    template!("eltex_mes", "version"),
    template!("eltex_mes", "vlans"),

    template!("extreme_xos", "interfaces"),
    template!("extreme_xos", "mac"),
    template!("extreme_xos", "switch"),
    template!("extreme_xos", "vlans"),

    template!("huawei_ma5600", "boards"),
    template!("huawei_ma5600", "mac"),
    template!("huawei_ma5600", "ports"),
    template!("huawei_ma5600", "version"),
    template!("huawei_ma5600", "vlans"),

    template!("huawei_vrp", "bridge_mac"),
    template!("huawei_vrp", "interfaces"),
    template!("huawei_vrp", "mac"),
    template!("huawei_vrp", "port_media"),
    template!("huawei_vrp", "port_vlans"),
    template!("huawei_vrp", "version"),
    template!("huawei_vrp", "vlans"),

    template!("iskratel", "interfaces"),
    template!("iskratel", "mac"),
    template!("iskratel", "version"),

    template!("juniper_junos", "chassis"),
    template!("juniper_junos", "interfaces"),
    template!("juniper_junos", "version"),
    template!("juniper_junos", "vlans"),

    template!("procurve", "interfaces"),
    template!("procurve", "mac"),
    template!("procurve", "system"),
    template!("procurve", "vlans"),

    template!("qtech", "interfaces"),
    template!("qtech", "mac"),
    template!("qtech", "version"),
    template!("qtech", "vlans"),

    template!("zte_zxa10", "interfaces"),
    template!("zte_zxa10", "mac"),
    template!("zte_zxa10", "system"),
    template!("zte_zxa10", "vlans"),

    template!("zte_zxr10", "interfaces"),
    template!("zte_zxr10", "mac"),
    template!("zte_zxr10", "version"),
    template!("zte_zxr10", "vlans"),
];

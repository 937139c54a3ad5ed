//! Built-in vendor platforms.

pub mod cisco_ios;
pub mod dlink;
pub mod edgecore;
pub mod eltex_ltp;
pub mod eltex_mes;
pub mod extreme_xos;
pub mod huawei_ma5600;
pub mod huawei_vrp;
pub mod iskratel;
pub mod juniper_junos;
pub mod procurve;
pub mod qtech;
pub mod zte_zxa10;
pub mod zte_zxr10;

use super::PlatformDefinition;
use crate::error::Result;

/// Names of every built-in platform.
pub const NAMES: &[&str] = &[
    cisco_ios::PLATFORM_NAME,
    dlink::PLATFORM_NAME,
    edgecore::PLATFORM_NAME,
    eltex_ltp::PLATFORM_NAME,
    eltex_mes::PLATFORM_NAME,
    extreme_xos::PLATFORM_NAME,
    huawei_ma5600::PLATFORM_NAME,
    huawei_vrp::PLATFORM_NAME,
    iskratel::PLATFORM_NAME,
    juniper_junos::PLATFORM_NAME,
    procurve::PLATFORM_NAME,
    qtech::PLATFORM_NAME,
    zte_zxa10::PLATFORM_NAME,
    zte_zxr10::PLATFORM_NAME,
];

/// Prompt shared by the Cisco-like CLIs: `hostname>`, `hostname#`,
/// `hostname(config-if)#`.
pub(crate) const CISCO_LIKE_PROMPT: &str = r"(?:^|\n)[\w.\-]{1,63}(?:\([\w.\-/]+\))?[>#]\s*$";

/// Build every built-in platform definition.
pub fn all() -> Result<Vec<PlatformDefinition>> {
    Ok(vec![
        cisco_ios::platform()?,
        dlink::platform()?,
        edgecore::platform()?,
        eltex_ltp::platform()?,
        eltex_mes::platform()?,
        extreme_xos::platform()?,
        huawei_ma5600::platform()?,
        huawei_vrp::platform()?,
        iskratel::platform()?,
        juniper_junos::platform()?,
        procurve::platform()?,
        qtech::platform()?,
        zte_zxa10::platform()?,
        zte_zxr10::platform()?,
    ])
}

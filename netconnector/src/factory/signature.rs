//! Vendor signatures: which platform a version transcript belongs to.

use regex::Regex;

use crate::error::Result;
use crate::platform::vendors::{
    cisco_ios, dlink, edgecore, eltex_ltp, eltex_mes, extreme_xos, huawei_ma5600, huawei_vrp,
    iskratel, juniper_junos, procurve, qtech, zte_zxa10, zte_zxr10,
};

/// What a matching rule leads to.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Build a driver for this registered platform.
    Platform(String),
    /// Run another command and evaluate its output against a nested table.
    Refine {
        command: String,
        signature: VendorSignature,
    },
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    dispatch: Dispatch,
}

/// Ordered signature rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct VendorSignature {
    rules: Vec<Rule>,
}

impl VendorSignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch to `platform` when `pattern` matches.
    pub fn rule(mut self, pattern: &str, platform: &str) -> Result<Self> {
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            dispatch: Dispatch::Platform(platform.to_string()),
        });
        Ok(self)
    }

    /// Run `command` when `pattern` matches and decide with `signature`.
    pub fn refine(mut self, pattern: &str, command: &str, signature: VendorSignature) -> Result<Self> {
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            dispatch: Dispatch::Refine {
                command: command.to_string(),
                signature,
            },
        });
        Ok(self)
    }

    /// First rule matching `transcript`.
    pub fn evaluate(&self, transcript: &str) -> Option<&Dispatch> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(transcript))
            .map(|rule| &rule.dispatch)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Signatures of the built-in platforms.
    pub fn builtin() -> Result<Self> {
        let huawei = Self::new()
            .rule(r"MA56\d\d|MA58\d\d|MA5603|MA5683", huawei_ma5600::PLATFORM_NAME)?
            .rule(r"(?i)VRP|Quidway|HUAWEI", huawei_vrp::PLATFORM_NAME)?;

        Self::new()
            .rule(r"Cisco IOS Software|Cisco Internetwork Operating System", cisco_ios::PLATFORM_NAME)?
            .rule(r"ZXA10|ZXAN", zte_zxa10::PLATFORM_NAME)?
            .rule(r"ZTE Corporation:|ZXR10", zte_zxr10::PLATFORM_NAME)?
            .refine(r"Unrecognized command", "display version", huawei)?
            .rule(r"MA56\d\d|MA58\d\d", huawei_ma5600::PLATFORM_NAME)?
            .rule(r"Huawei Versatile Routing Platform|Quidway", huawei_vrp::PLATFORM_NAME)?
            .rule(r"JUNOS|Junos:", juniper_junos::PLATFORM_NAME)?
            .rule(r"ExtremeXOS", extreme_xos::PLATFORM_NAME)?
            .rule(r"ProCurve|Image stamp:", procurve::PLATFORM_NAME)?
            .rule(r"(?i)\bLTP-\d", eltex_ltp::PLATFORM_NAME)?
            .rule(r"MES\d{4}|Eltex MES", eltex_mes::PLATFORM_NAME)?
            .rule(r"Edge-?Core|ECS\d{4}", edgecore::PLATFORM_NAME)?
            .rule(r"(?i)QTECH|QSW-\d{4}", qtech::PLATFORM_NAME)?
            .rule(r"(?i)iskratel|SI2000", iskratel::PLATFORM_NAME)?
            .rule(r"D[EG]S-\d{4}|D-Link", dlink::PLATFORM_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(dispatch: Option<&Dispatch>) -> Option<&str> {
        match dispatch {
            Some(Dispatch::Platform(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_zte_signature() {
        let table = VendorSignature::builtin().unwrap();
        let transcript = "ZXR10 2928E Software, Version: V2.05.11B23\nCopyright (c) ZTE Corporation:";
        assert_eq!(platform(table.evaluate(transcript)), Some(zte_zxr10::PLATFORM_NAME));
    }

    #[test]
    fn test_unrecognized_command_refines_to_huawei() {
        let table = VendorSignature::builtin().unwrap();
        let transcript = "              ^\nError: Unrecognized command found at '^' position.";
        let Some(Dispatch::Refine { command, signature }) = table.evaluate(transcript) else {
            panic!("expected a refinement");
        };
        assert_eq!(command, "display version");
        assert_eq!(
            platform(signature.evaluate("VERSION : MA5600V800R013C00\nPRODUCT : MA5600T")),
            Some(huawei_ma5600::PLATFORM_NAME)
        );
        assert_eq!(
            platform(signature.evaluate("Huawei Versatile Routing Platform Software\nVRP (R) software")),
            Some(huawei_vrp::PLATFORM_NAME)
        );
    }

    #[test]
    fn test_no_match() {
        let table = VendorSignature::builtin().unwrap();
        assert!(table.evaluate("Linux router 5.15.0 #1 SMP").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = VendorSignature::new()
            .rule("Version", "first")
            .unwrap()
            .rule("Version", "second")
            .unwrap();
        assert_eq!(platform(table.evaluate("Version 1")), Some("first"));
    }
}

//! Port canonicalization rules.
//!
//! Every port-taking capability passes the caller's port string through the
//! platform's rule before anything is sent. A rule returns `None` for input
//! that cannot name a port on that platform, and applying a rule to its own
//! output returns the same string.

use std::fmt;
use std::ops::RangeInclusive;

use regex::Regex;

use crate::error::Result;

pub trait PortRule: Send + Sync + fmt::Debug {
    /// Canonical spelling of `raw`, or `None` when it is not a valid port.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// One interface type: its canonical name, accepted abbreviations and the
/// number of `/`-separated segments in its index.
#[derive(Debug, Clone)]
pub struct InterfaceType {
    canonical: String,
    aliases: Vec<String>,
    segments: RangeInclusive<usize>,
}

impl InterfaceType {
    pub fn new(canonical: &str, aliases: &[&str], segments: RangeInclusive<usize>) -> Self {
        let mut all: Vec<String> = aliases.iter().map(|a| a.to_ascii_lowercase()).collect();
        all.push(canonical.to_ascii_lowercase());
        Self {
            canonical: canonical.to_string(),
            aliases: all,
            segments,
        }
    }
}

/// Named interfaces: `"gi 1/0/1"`, `"GE1/0/12"`, `"Eth 0/1"`.
#[derive(Debug, Clone)]
pub struct InterfaceNameRule {
    types: Vec<InterfaceType>,
    /// Type assumed for a bare index such as `"1/1"`.
    default_type: Option<usize>,
}

impl InterfaceNameRule {
    pub fn new(types: Vec<InterfaceType>) -> Self {
        Self {
            types,
            default_type: None,
        }
    }

    /// Accept bare indexes as the type at position `index` in the table.
    pub fn with_default_type(mut self, index: usize) -> Self {
        self.default_type = Some(index);
        self
    }
}

fn valid_index(index: &str, segments: &RangeInclusive<usize>) -> bool {
    let parts: Vec<&str> = index.split('/').collect();
    segments.contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

impl PortRule for InterfaceNameRule {
    fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        let split = raw
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(raw.len());
        let (prefix, index) = raw.split_at(split);
        let prefix = prefix.trim().to_ascii_lowercase();
        let index: String = index.chars().filter(|c| !c.is_whitespace()).collect();

        let ty = if prefix.is_empty() {
            self.types.get(self.default_type?)?
        } else {
            self.types
                .iter()
                .find(|t| t.aliases.iter().any(|a| *a == prefix))?
        };
        valid_index(&index, &ty.segments).then(|| format!("{} {}", ty.canonical, index))
    }
}

/// Plain port numbers with an optional stack unit: `"5"`, `"1:5"`.
#[derive(Debug, Clone)]
pub struct NumericPortRule {
    allow_unit: bool,
    max_port: u32,
}

impl NumericPortRule {
    pub fn new(max_port: u32) -> Self {
        Self {
            allow_unit: false,
            max_port,
        }
    }

    pub fn with_units(mut self) -> Self {
        self.allow_unit = true;
        self
    }

    fn number(&self, text: &str) -> Option<u32> {
        let n: u32 = text.trim().parse().ok()?;
        (1..=self.max_port).contains(&n).then_some(n)
    }
}

impl PortRule for NumericPortRule {
    fn normalize(&self, raw: &str) -> Option<String> {
        match raw.trim().split_once(':') {
            Some((unit, port)) if self.allow_unit => {
                let unit = self.number(unit)?;
                let port = self.number(port)?;
                Some(format!("{unit}:{port}"))
            }
            Some(_) => None,
            None => self.number(raw).map(|n| n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCase {
    Keep,
    Lower,
}

/// Ports validated by a full-match regular expression.
#[derive(Debug, Clone)]
pub struct PatternPortRule {
    pattern: Regex,
    case: PortCase,
}

impl PatternPortRule {
    pub fn new(pattern: &str, case: PortCase) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
            case,
        })
    }
}

impl PortRule for PatternPortRule {
    fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        let port = match self.case {
            PortCase::Keep => raw.to_string(),
            PortCase::Lower => raw.to_ascii_lowercase(),
        };
        self.pattern.is_match(&port).then_some(port)
    }
}

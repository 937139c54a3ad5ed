//! Range expansion for VLAN lists and port lists as devices print them.

use std::borrow::Cow;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on a single `a-b` span; wider spans are treated as malformed.
const MAX_SPAN: u32 = 65_536;

/// `to` between two numbers, with any spacing or case.
static TO_KEYWORD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(\d)\s+to\s+(\d)").ok());

fn normalize(text: &str) -> Cow<'_, str> {
    match TO_KEYWORD.as_ref() {
        Some(re) => re.replace_all(text, "$1-$2"),
        None => Cow::Borrowed(text),
    }
}

/// Expand `"134-136, 234, 411"` or `"10 to 14"` into sorted, duplicate-free
/// integers. Malformed tokens are skipped.
pub fn expand(text: &str) -> Vec<u32> {
    let normalized = normalize(text);
    let mut out = BTreeSet::new();
    for token in normalized.split([',', ' ', '\t', ';']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
                else {
                    continue;
                };
                if start > end || end - start > MAX_SPAN {
                    continue;
                }
                out.extend(start..=end);
            }
            None => {
                if let Ok(value) = token.parse::<u32>() {
                    out.insert(value);
                }
            }
        }
    }
    out.into_iter().collect()
}

/// Expand a VLAN list, dropping ids outside 1..=4096.
pub fn vlan_ids(text: &str) -> Vec<u16> {
    expand(text)
        .into_iter()
        .filter(|v| (1..=4096).contains(v))
        .map(|v| v as u16)
        .collect()
}

/// Expand a port list such as `"1-4,25"`, `"1:1-1:28"` or `"gi1/0/1-24,Po1-8"`.
///
/// Each token is split on its last `-`; both sides are read as a shared prefix
/// plus a trailing number. The right side may omit the prefix. Order of first
/// appearance is kept and duplicates are dropped.
pub fn expand_ports(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut push = |port: String| {
        if seen.insert(port.clone()) {
            out.push(port);
        }
    };

    for token in text.split([',', ' ', '\t']) {
        let token = token.trim();
        if token.is_empty() || token == "-" {
            continue;
        }
        let Some((left, right)) = token.rsplit_once('-') else {
            push(token.to_string());
            continue;
        };
        let (Some((prefix, start)), Some((right_prefix, end))) =
            (split_trailing_number(left), split_trailing_number(right))
        else {
            // "Eth-Trunk1" style names contain a dash but are not ranges.
            push(token.to_string());
            continue;
        };
        if !right_prefix.is_empty() && right_prefix != prefix {
            continue;
        }
        if start > end || end - start > MAX_SPAN {
            continue;
        }
        for n in start..=end {
            push(format!("{prefix}{n}"));
        }
    }
    out
}

fn split_trailing_number(text: &str) -> Option<(&str, u32)> {
    let digits = text
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let (prefix, number) = text.split_at(text.len() - digits);
    number.parse().ok().map(|n| (prefix, n))
}

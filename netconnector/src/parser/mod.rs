//! Declarative output grammars.
//!
//! Vendor output is parsed with TextFSM templates keyed by
//! `(platform, command)`. All templates are compiled once when the parser is
//! built so a broken grammar fails at startup instead of on a device call.

mod templates;

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use log::trace;
use textfsm_rust::Template;

use crate::error::{ParseError, Result};

pub use templates::BUILTIN_TEMPLATES;

/// Identifies one grammar: the platform it belongs to and the command whose
/// output it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub platform: &'static str,
    pub command: &'static str,
}

impl TemplateKey {
    pub const fn new(platform: &'static str, command: &'static str) -> Self {
        Self { platform, command }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform, self.command)
    }
}

/// One parsed record. Field names are lower-cased, values trimmed, and the
/// field order is the order of the template's `Value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(IndexMap<String, String>);

impl Row {
    /// Value of `field`, or `None` when absent or empty.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

struct CompiledTemplate {
    template: Template,
    /// Lower-cased `Value` names in declaration order.
    fields: Vec<String>,
}

/// Table of validated grammars.
pub struct OutputParser {
    templates: HashMap<TemplateKey, CompiledTemplate>,
}

impl OutputParser {
    /// Parser over the templates shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_table(BUILTIN_TEMPLATES)
    }

    /// Compile every template in `table`.
    pub fn from_table(table: &[(TemplateKey, &'static str)]) -> Result<Self> {
        let mut templates = HashMap::with_capacity(table.len());
        for (key, source) in table {
            let template = Template::parse_str(source).map_err(|e| ParseError::Template {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            let fields = template
                .header()
                .into_iter()
                .map(str::to_ascii_lowercase)
                .collect();
            templates.insert(*key, CompiledTemplate { template, fields });
        }
        Ok(Self { templates })
    }

    pub fn contains(&self, key: &TemplateKey) -> bool {
        self.templates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Run the grammar registered under `key` over `text`.
    ///
    /// Lines the grammar does not match are skipped; rows come back in source
    /// order.
    pub fn parse(&self, key: &TemplateKey, text: &str) -> Result<Vec<Row>> {
        let compiled = self
            .templates
            .get(key)
            .ok_or_else(|| ParseError::UnknownTemplate {
                key: key.to_string(),
            })?;
        let mut parser = compiled.template.parser();
        let records = parser
            .parse_text_to_dicts(text)
            .map_err(|e| ParseError::Template {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let rows: Vec<Row> = records
            .into_iter()
            .map(|record| {
                let record: HashMap<String, String> = record
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.trim().to_string()))
                    .collect();
                compiled
                    .fields
                    .iter()
                    .map(|name| {
                        let value = record.get(name).cloned().unwrap_or_default();
                        (name.clone(), value)
                    })
                    .collect::<Row>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        trace!("{key}: {} rows", rows.len());
        Ok(rows)
    }

    /// First non-empty value of `field` in the parsed output.
    pub fn parse_first(&self, key: &TemplateKey, text: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .parse(key, text)?
            .iter()
            .find_map(|row| row.get(field).map(str::to_string)))
    }
}

impl fmt::Debug for OutputParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.templates.keys().map(|k| k.to_string()).collect();
        keys.sort();
        f.debug_struct("OutputParser").field("templates", &keys).finish()
    }
}

//! Flat `{{ name }}` template substitution.
//!
//! Syntax is `{{ name }}` with optional inner whitespace. Unknown names
//! render as the empty string; everything else is copied verbatim.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::core::types::Secret;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Variables available to personality templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
    secrets: BTreeSet<String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self.secrets.remove(name);
        self
    }

    /// Set an optional value; `None` renders as the empty string.
    pub fn set_opt(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        self.set(name, value.unwrap_or_default())
    }

    /// Set a value that must not appear in logs or summaries.
    pub fn set_secret(&mut self, name: &str, value: Option<&Secret>) -> &mut Self {
        self.values.insert(
            name.to_string(),
            value.map(|s| s.expose().to_string()).unwrap_or_default(),
        );
        self.secrets.insert(name.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All variables with secret values masked, for diagnostics.
    pub fn redacted(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| {
                let shown = if self.secrets.contains(k) && !v.is_empty() {
                    "[redacted]".to_string()
                } else {
                    v.clone()
                };
                (k.clone(), shown)
            })
            .collect()
    }
}

/// Substitute every `{{ name }}` placeholder in `source`.
pub fn render(source: &str, vars: &TemplateVars) -> String {
    placeholder()
        .replace_all(source, |caps: &Captures| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.to_string(),
                None => {
                    trace!(name, "undefined template variable");
                    String::new()
                }
            }
        })
        .into_owned()
}

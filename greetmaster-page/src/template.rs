//! `{NAME}` / `{NAME?fallback}` substitution over page templates.
//!
//! A placeholder that starts its own line carries its indentation into multi-line values.
//! A falsy placeholder that fills its whole line removes the line, so a template line can be
//! made conditional. Elsewhere a falsy placeholder is simply dropped.

use crate::edit::{apply_edits, Edit};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Token inside a fallback that is replaced by the bound text value.
const VALUE_TOKEN: &str = "{VALUE}";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"(?m)(?:(\n)?^([ \t]*))?\{([A-Za-z0-9_]+)(?:\?((?:[^{}]|\{VALUE\})*))?\}").unwrap()
    })
}

/// Value bound to a template placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Text(String),
    Flag(bool),
    /// Bound but falsy; the placeholder is removed.
    Unset,
}

impl TemplateValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Text(s) => !s.is_empty(),
            TemplateValue::Flag(b) => *b,
            TemplateValue::Unset => false,
        }
    }

    fn text(&self) -> &str {
        match self {
            TemplateValue::Text(s) => s,
            _ => "",
        }
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Text(s)
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Text(s.to_string())
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Flag(b)
    }
}

impl<T: Into<TemplateValue>> From<Option<T>> for TemplateValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TemplateValue::Unset)
    }
}

/// Placeholder bindings for [`build_html`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: HashMap<String, TemplateValue>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`TemplateVars::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }
}

/// Substitute every bound placeholder in `template`.
///
/// Placeholders whose name has no binding are left as they are.
pub fn build_html(template: &str, vars: &TemplateVars) -> String {
    let mut edits = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let (Some(whole), Some(value)) = (caps.get(0), vars.get(&caps[3])) else {
            continue;
        };
        let range = whole.range();
        let newline = caps.get(1).map_or("", |m| m.as_str());
        let indent = caps.get(2).map_or("", |m| m.as_str());
        if !value.is_truthy() {
            // Only a placeholder that fills its whole line takes the line with it.
            let rest = &template[range.end..];
            if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
                edits.push(Edit::remove(range));
            } else {
                edits.push(Edit::new(range, format!("{}{}", newline, indent)));
            }
            continue;
        }

        let content = match caps.get(4) {
            Some(fallback) => fallback.as_str().replace(VALUE_TOKEN, value.text()),
            None => indent_lines(value.text(), indent),
        };
        edits.push(Edit::new(range, format!("{}{}{}", newline, indent, content)));
    }
    apply_edits(template, edits)
}

// Every line after the first gets the placeholder's indentation.
fn indent_lines(value: &str, indent: &str) -> String {
    if indent.is_empty() {
        return value.to_string();
    }
    value.replace('\n', &format!("\n{}", indent))
}

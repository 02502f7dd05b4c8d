//! Monitored targets and their element match rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while turning an element match rule into a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementMatchError {
    #[error("Empty attribute name in element match")]
    EmptyKey,
    #[error("Invalid tag name: {0:?}")]
    InvalidTag(String),
    #[error("Invalid attribute name: {0:?}")]
    InvalidAttribute(String),
}

/// A single monitored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique title, also the key of the stored price.
    pub title: String,
    /// Page to fetch.
    pub url: String,
    /// Rule locating the element that holds the price.
    pub element: ElementMatch,
}

impl Target {
    pub fn new(title: impl Into<String>, url: impl Into<String>, element: ElementMatch) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            element,
        }
    }
}

/// Tag and attribute constraints for locating one element in a page.
///
/// Keys follow the keyword vocabulary used by the target registry:
/// `name` is the tag, `class_` (or `class`) a class, anything else an
/// attribute that must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementMatch(BTreeMap<String, String>);

impl ElementMatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the rule as a CSS selector.
    ///
    /// An empty rule matches the first element of the document.
    pub fn to_css(&self) -> Result<String, ElementMatchError> {
        let mut css = match self.get("name") {
            Some(tag) => {
                if !is_ident(tag) {
                    return Err(ElementMatchError::InvalidTag(tag.to_string()));
                }
                tag.to_string()
            }
            None => String::new(),
        };

        for (key, value) in self.iter() {
            match key {
                "" => return Err(ElementMatchError::EmptyKey),
                "name" => {}
                "class_" | "class" => {
                    // a single class name matches within the class list,
                    // anything with whitespace must equal the whole attribute
                    let op = if !value.is_empty() && !value.contains(char::is_whitespace) {
                        "~="
                    } else {
                        "="
                    };
                    css.push_str(&format!("[class{}\"{}\"]", op, escape(value)));
                }
                _ => {
                    if !is_ident(key) {
                        return Err(ElementMatchError::InvalidAttribute(key.to_string()));
                    }
                    css.push_str(&format!("[{}=\"{}\"]", key, escape(value)));
                }
            }
        }

        if css.is_empty() {
            css.push('*');
        }
        Ok(css)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ElementMatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}

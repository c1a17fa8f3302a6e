//! Compatibility with pipeline documents written for the Ansible executor
//!
//! Those documents may carry a Jinja default-value expression such as
//! `{{ bucket | default('canoe-data') }}` instead of a plain value. The
//! literal inside `default('...')` is the value to use.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

static DEFAULT_EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"default\('(.+)'\)").expect("valid default expression regex"));

/// A string field that may be written as a `default('X')` expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultedValue(String);

impl DefaultedValue {
    /// Resolves a raw field value
    ///
    /// Returns the captured literal when the value contains a
    /// `default('X')` expression, the raw value otherwise.
    pub fn parse(raw: &str) -> Self {
        match DEFAULT_EXPR_RE.captures(raw).and_then(|c| c.get(1)) {
            Some(literal) => Self(literal.as_str().to_string()),
            None => Self(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for DefaultedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::target::Target;

const NONCE_PLACEHOLDER: &str = "{nonce}";

/// Predicate over a command's trimmed stdout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExpectedOutput {
    Contains(String),
    NotContains(String),
    Equals(String),
    NonEmpty,
}

impl ExpectedOutput {
    pub fn matches(&self, stdout: &str) -> bool {
        let stdout = stdout.trim();
        match self {
            Self::Contains(needle) => stdout.contains(needle.as_str()),
            Self::NotContains(needle) => !stdout.contains(needle.as_str()),
            Self::Equals(expected) => stdout == expected.trim(),
            Self::NonEmpty => !stdout.is_empty(),
        }
    }
}

impl fmt::Display for ExpectedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(needle) => write!(f, "stdout contains '{needle}'"),
            Self::NotContains(needle) => write!(f, "stdout does not contain '{needle}'"),
            Self::Equals(expected) => write!(f, "stdout equals '{expected}'"),
            Self::NonEmpty => write!(f, "stdout is not empty"),
        }
    }
}

/// A named, idempotent command template.
///
/// Placeholders `{name}` and `{address}` are replaced with the target's
/// values and `{nonce}` with a fresh 8-character token on every render, so
/// each attempt gets its own value. Any other `{key}` is looked up in
/// `vars`. Unknown placeholders are
/// left untouched. Operations are configuration: the engine never mutates
/// them once dispatch starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub expect: Option<ExpectedOutput>,
    /// Overrides the executor's default timeout
    #[serde(default, with = "crate::utils::serde::optional_duration_millis")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl Operation {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            expect: None,
            timeout: None,
            vars: BTreeMap::new(),
        }
    }

    pub fn expecting(mut self, expect: ExpectedOutput) -> Self {
        self.expect = Some(expect);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Render the command for one target
    pub fn render(&self, target: &Target) -> String {
        let nonce = if self.command.contains(NONCE_PLACEHOLDER) {
            Uuid::new_v4().simple().to_string()[..8].to_string()
        } else {
            String::new()
        };
        let mut rendered = String::with_capacity(self.command.len());
        let mut rest = self.command.as_str();
        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    let key = &after[..end];
                    match self.lookup(key, target, &nonce) {
                        Some(value) => rendered.push_str(value),
                        None => {
                            rendered.push('{');
                            rendered.push_str(key);
                            rendered.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    rendered.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        rendered.push_str(rest);
        rendered
    }

    fn lookup<'a>(&'a self, key: &str, target: &'a Target, nonce: &'a str) -> Option<&'a str> {
        match key {
            "name" => Some(target.name.as_str()),
            "address" => Some(target.address.as_str()),
            "nonce" => Some(nonce),
            other => self.vars.get(other).map(String::as_str),
        }
    }
}

/// Ordered operations run per target, stopping at the first failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSequence {
    pub name: String,
    pub steps: Vec<Operation>,
}

impl OperationSequence {
    pub fn new(name: impl Into<String>, steps: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

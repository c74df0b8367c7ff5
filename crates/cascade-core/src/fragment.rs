//! Core data model: rule keys, severities, rule settings and fragments
//!
//! Everything in here is immutable once built by the fragment store.

use crate::matcher::FileMatcher;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disable the rule
    Off,
    /// Warning (doesn't fail the run)
    Warn,
    /// Error (fails the run)
    Error,
}

impl Severity {
    /// Parse a declared severity
    ///
    /// Accepts `off|warn|error` in any letter case and the numeric forms
    /// `0|1|2`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "off" => Some(Severity::Off),
                "warn" => Some(Severity::Warn),
                "error" => Some(Severity::Error),
                _ => None,
            },
            Value::Number(n) => match n.as_u64()? {
                0 => Some(Severity::Off),
                1 => Some(Severity::Warn),
                2 => Some(Severity::Error),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Severity::Off
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespaced rule identifier (`no-var`, `scope:rule-name`, `plugin/rule`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RuleKey(String);

impl RuleKey {
    /// Validate and wrap a rule identifier
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        if raw.is_empty() {
            return Err("rule key is empty");
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err("rule key contains whitespace or control characters");
        }
        // `@scope/plugin/rule` is a valid npm-style key; the leading `@` is
        // part of the first segment.
        let has_empty_segment = raw
            .split([':', '/'])
            .any(|segment| segment.is_empty() || segment == "@");
        if has_empty_segment {
            return Err("rule key has an empty namespace segment");
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part of a qualified key, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.rfind([':', '/']).map(|idx| &self.0[..idx])
    }
}

impl Borrow<str> for RuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity plus rule-specific options
///
/// Options are opaque to the engine; only the external rule engine knows
/// what they mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetting {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl RuleSetting {
    pub fn new(severity: Severity, options: Vec<Value>) -> Self {
        Self { severity, options }
    }

    /// A setting with no options
    pub fn severity(severity: Severity) -> Self {
        Self::new(severity, Vec::new())
    }

    /// The `"off"` shorthand
    pub fn off() -> Self {
        Self::severity(Severity::Off)
    }

    /// Parse one declared rule value
    ///
    /// Supported forms:
    /// - `"error"` / `2`
    /// - `["error", {..}, ..]`
    /// - `{ "severity": "error", "options": [..] }`
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(_) | Value::Number(_) => Severity::from_value(value)
                .map(Self::severity)
                .ok_or_else(|| invalid_severity(value)),
            Value::Array(items) => {
                let (first, options) = items
                    .split_first()
                    .ok_or_else(|| "rule array must start with a severity".to_string())?;
                let severity = Severity::from_value(first).ok_or_else(|| invalid_severity(first))?;
                Ok(Self::new(severity, options.to_vec()))
            }
            Value::Object(fields) => {
                if let Some(unknown) = fields
                    .keys()
                    .find(|k| k.as_str() != "severity" && k.as_str() != "options")
                {
                    return Err(format!("unknown rule field '{unknown}'"));
                }
                let declared = fields
                    .get("severity")
                    .ok_or_else(|| "rule object is missing 'severity'".to_string())?;
                let severity =
                    Severity::from_value(declared).ok_or_else(|| invalid_severity(declared))?;
                let options = match fields.get("options") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(_) => return Err("'options' must be an array".to_string()),
                };
                Ok(Self::new(severity, options))
            }
            _ => Err(format!(
                "expected a severity, an array or an object, found {}",
                value_kind(value)
            )),
        }
    }
}

fn invalid_severity(value: &Value) -> String {
    format!("invalid severity {value}; expected one of off, warn, error, 0, 1, 2")
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One validated unit of configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Where the fragment was declared, e.g. `fragments[2]` or `ruleSets.strict[0]`
    pub origin: String,
    pub name: Option<String>,
    pub matchers: FileMatcher,
    pub language: Option<String>,
    pub extends: Vec<String>,
    pub rules: IndexMap<RuleKey, RuleSetting>,
    pub shared_options: Map<String, Value>,
}

impl Fragment {
    /// Origin plus name, for diagnostics
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} \"{}\"", self.origin, name),
            None => self.origin.clone(),
        }
    }

    /// Does this fragment apply to `path` with file kind `language`?
    pub fn applies_to(&self, path: &str, language: Option<&str>) -> bool {
        crate::language::is_compatible(self.language.as_deref(), language)
            && self.matchers.applies_to(path)
    }

    /// Whether the fragment restricts which files it applies to
    pub fn has_constraints(&self) -> bool {
        !self.matchers.is_universal() || self.language.is_some()
    }
}

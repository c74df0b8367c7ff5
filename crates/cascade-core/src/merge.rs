//! Merge engine: folds applicable fragments into one effective configuration
//!
//! When merging fragments, in declaration order:
//! - Rules: the last fragment to mention a key wins, and it replaces the whole
//!   setting (severity and options together). Options are never deep-merged.
//! - Shared options: merged additively. Objects merge key by key, a later
//!   scalar replaces an earlier one, and arrays are unioned with duplicates
//!   removed (first occurrence keeps its position).

use crate::fragment::{Fragment, RuleKey, RuleSetting, Severity};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Effective configuration for one file
///
/// Immutable once produced. Rule order is the order in which keys were first
/// set across the cascade.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    pub rules: IndexMap<RuleKey, RuleSetting>,
    pub shared_options: Map<String, Value>,
    /// The file is covered by a global ignore
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

impl ResolvedConfiguration {
    /// Empty configuration for a globally ignored file
    pub fn ignored() -> Self {
        Self {
            ignored: true,
            ..Default::default()
        }
    }

    /// True when no rule and no shared option is set
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.shared_options.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RuleSetting> {
        self.rules.get(key)
    }

    pub fn severity(&self, key: &str) -> Option<Severity> {
        self.get(key).map(|setting| setting.severity)
    }

    /// Whether `key` is set to anything but `off`
    pub fn is_enabled(&self, key: &str) -> bool {
        self.severity(key).is_some_and(Severity::is_enabled)
    }

    /// Rules the external rule engine should run
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&RuleKey, &RuleSetting)> {
        self.rules
            .iter()
            .filter(|(_, setting)| setting.severity.is_enabled())
    }

    /// Count rules per severity: (off, warn, error)
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        self.rules
            .values()
            .fold((0, 0, 0), |(off, warn, error), setting| match setting.severity {
                Severity::Off => (off + 1, warn, error),
                Severity::Warn => (off, warn + 1, error),
                Severity::Error => (off, warn, error + 1),
            })
    }
}

/// Fold fragments, in the order given, into a resolved configuration
pub fn merge<'a, I>(fragments: I) -> ResolvedConfiguration
where
    I: IntoIterator<Item = &'a Fragment>,
{
    let mut resolved = ResolvedConfiguration::default();
    for fragment in fragments {
        apply_fragment(&mut resolved, fragment);
    }
    resolved
}

/// Layer one fragment on top of an accumulator
pub fn apply_fragment(resolved: &mut ResolvedConfiguration, fragment: &Fragment) {
    for (key, setting) in &fragment.rules {
        // `insert` on an existing key keeps its position and replaces the value
        resolved.rules.insert(key.clone(), setting.clone());
    }
    merge_shared_options(&mut resolved.shared_options, &fragment.shared_options);
}

/// Merge `source` into `target` additively
pub fn merge_shared_options(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key.clone(), dedup(value));
            }
        }
    }
}

fn merge_value(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_fields), Value::Object(source_fields)) => {
            merge_shared_options(target_fields, source_fields);
        }
        (Value::Array(target_items), Value::Array(source_items)) => {
            // Append unique entries
            for item in source_items {
                let item = dedup(item);
                if !target_items.contains(&item) {
                    target_items.push(item);
                }
            }
        }
        (target, source) => *target = dedup(source),
    }
}

/// Copy a value, collapsing duplicate array entries at every level
fn dedup(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let item = dedup(item);
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Value::Array(unique)
        }
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), dedup(field)))
                .collect(),
        ),
        other => other.clone(),
    }
}

//! Declaration types: the raw shape callers and config files provide
//!
//! These types are deliberately loose. Rule values and shared options stay
//! schema-less `serde_json::Value`s here; the fragment store validates them
//! and reports the exact position and field of the first problem.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One fragment as declared
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FragmentDeclaration {
    /// Label shown in diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Human-readable label used in diagnostics")]
    pub name: Option<String>,

    /// Glob patterns for files this fragment applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Glob patterns of files this fragment applies to (omit for all files)")]
    pub files: Option<Vec<String>>,

    /// Glob patterns for files exempted even when included
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Glob patterns of files exempted from this fragment")]
    pub ignores: Option<Vec<String>>,

    /// File-kind tag
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Language tag restricting the file kinds this fragment applies to")]
    pub language: Option<String>,

    /// Named rule sets spliced in before this fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Names of rule sets to splice in before this fragment's rules")]
    pub extends: Option<Vec<String>>,

    /// Rule key → setting
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Rule settings: \"off\"|\"warn\"|\"error\", 0|1|2, [severity, ...options] or {severity, options}")]
    pub rules: Option<IndexMap<String, Value>>,

    /// Ambient values made available to rule consumers
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Shared context such as recognized globals; merged additively")]
    pub shared_options: Option<Value>,
}

impl FragmentDeclaration {
    /// True when nothing at all is declared
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.files.is_none()
            && self.ignores.is_none()
            && self.language.is_none()
            && self.extends.is_none()
            && self.rules.is_none()
            && self.shared_options.is_none()
    }
}

/// Engine tuning options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Extra or replacement file-extension → language-tag entries
    #[schemars(description = "File extension to language tag overrides (empty tag removes)")]
    pub languages: IndexMap<String, String>,

    /// Cache resolved configurations per path
    #[schemars(description = "Cache resolved configurations per file path")]
    pub cache: bool,

    /// Most paths kept in the cache; a full cache is emptied before the next insert
    #[schemars(description = "Maximum number of cached paths before the cache is cleared")]
    pub cache_capacity: usize,

    /// Upper bound on the flattened cascade after `extends` expansion
    #[schemars(description = "Maximum number of fragments the expanded cascade may hold")]
    pub max_cascade_entries: usize,
}

/// Default for [`EngineOptions::cache_capacity`]
pub const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Default for [`EngineOptions::max_cascade_entries`]
pub const DEFAULT_MAX_CASCADE_ENTRIES: usize = 100_000;

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            languages: IndexMap::new(),
            cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_cascade_entries: DEFAULT_MAX_CASCADE_ENTRIES,
        }
    }
}

/// Complete declaration document
///
/// ```yaml
/// ignores: ["dist/"]
/// ruleSets:
///   strict:
///     - rules:
///         no-var: error
/// aliases:
///   "base:strict": strict
/// fragments:
///   - files: ["*"]
///     rules:
///       eqeqeq: warn
///   - files: ["*.ts"]
///     extends: [strict]
///     rules:
///       eqeqeq: error
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CascadeDocument {
    /// JSON Schema reference, ignored by the engine
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Ordered fragments forming the cascade
    #[serde(default)]
    #[schemars(description = "Ordered configuration fragments; later fragments win")]
    pub fragments: Vec<FragmentDeclaration>,

    /// Named rule sets usable as `extends` targets
    #[serde(default)]
    #[schemars(description = "Named rule sets available to `extends`")]
    pub rule_sets: IndexMap<String, Vec<FragmentDeclaration>>,

    /// Paths excluded from resolution altogether
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(description = "Glob patterns of files the engine ignores; they resolve to an empty configuration")]
    pub ignores: Vec<String>,

    /// Alternative names for rule sets
    #[serde(default)]
    #[schemars(description = "Alias name to rule set (or alias) name")]
    pub aliases: IndexMap<String, String>,

    #[serde(default)]
    pub options: EngineOptions,
}

/// JSON Schema describing [`CascadeDocument`]
pub fn document_schema() -> Value {
    let schema = schemars::schema_for!(CascadeDocument);
    let mut schema_json = serde_json::to_value(schema).unwrap_or(Value::Null);
    if let Value::Object(fields) = &mut schema_json {
        fields.insert(
            "title".to_string(),
            Value::String("Cascade configuration".to_string()),
        );
    }
    schema_json
}

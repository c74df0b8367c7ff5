//! Fragment store: validates declarations into immutable fragments
//!
//! Validation is eager and total. The whole sequence is checked before a
//! store exists, so one bad declaration never leaves a partially loaded set
//! behind.

use crate::config::FragmentDeclaration;
use crate::error::CascadeError;
use crate::fragment::{Fragment, RuleKey, RuleSetting};
use crate::matcher::FileMatcher;
use crate::result::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Ordered, validated fragments
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    fragments: Vec<Arc<Fragment>>,
}

impl FragmentStore {
    /// Validate top-level fragment declarations
    ///
    /// Positions are reported as `fragments[i]`.
    pub fn load(declarations: &[FragmentDeclaration]) -> Result<Self> {
        let fragments = load_sequence(declarations, |i| format!("fragments[{i}]"))?;
        debug!("Loaded {} fragments", fragments.len());
        Ok(Self { fragments })
    }

    pub fn fragments(&self) -> &[Arc<Fragment>] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Compile document-level ignore patterns
///
/// Failures are reported at position `ignores`.
pub fn load_ignores(patterns: &[String]) -> Result<FileMatcher> {
    FileMatcher::compile(&[], patterns).map_err(|(pattern, err)| {
        CascadeError::malformed_pattern(pattern, "ignores", err.to_string())
    })
}

/// Validate a declaration sequence, naming each entry with `position`
pub fn load_sequence(
    declarations: &[FragmentDeclaration],
    position: impl Fn(usize) -> String,
) -> Result<Vec<Arc<Fragment>>> {
    declarations
        .iter()
        .enumerate()
        .map(|(i, decl)| load_fragment(decl, position(i)).map(Arc::new))
        .collect()
}

/// Validate one declaration
pub fn load_fragment(decl: &FragmentDeclaration, origin: String) -> Result<Fragment> {
    if decl.is_empty() {
        return Err(CascadeError::invalid_fragment(
            origin,
            "<fragment>",
            "fragment declares nothing",
        ));
    }

    if let Some(name) = &decl.name {
        if name.trim().is_empty() {
            return Err(CascadeError::invalid_fragment(origin, "name", "name is empty"));
        }
    }

    let include = non_empty_list(&origin, "files", decl.files.as_deref())?;
    let exclude = non_empty_list(&origin, "ignores", decl.ignores.as_deref())?;
    let matchers = FileMatcher::compile(include, exclude).map_err(|(pattern, err)| {
        CascadeError::malformed_pattern(pattern, origin.clone(), err.to_string())
    })?;

    let language = match &decl.language {
        Some(tag) if tag.is_empty() || tag.chars().any(char::is_whitespace) => {
            return Err(CascadeError::invalid_fragment(
                origin,
                "language",
                format!("invalid language tag '{tag}'"),
            ));
        }
        other => other.clone(),
    };

    let extends = decl.extends.clone().unwrap_or_default();
    if let Some(idx) = extends.iter().position(|name| name.trim().is_empty()) {
        return Err(CascadeError::invalid_fragment(
            origin,
            format!("extends[{idx}]"),
            "rule set name is empty",
        ));
    }

    let rules = match &decl.rules {
        Some(raw) => load_rules(&origin, raw)?,
        None => IndexMap::new(),
    };

    let shared_options = match &decl.shared_options {
        None => Map::new(),
        Some(Value::Object(fields)) => fields.clone(),
        Some(_) => {
            return Err(CascadeError::invalid_fragment(
                origin,
                "sharedOptions",
                "sharedOptions must be an object",
            ));
        }
    };

    Ok(Fragment {
        origin,
        name: decl.name.clone(),
        matchers,
        language,
        extends,
        rules,
        shared_options,
    })
}

fn non_empty_list<'a>(
    origin: &str,
    field: &str,
    list: Option<&'a [String]>,
) -> Result<&'a [String]> {
    match list {
        Some([]) => Err(CascadeError::invalid_fragment(
            origin,
            field,
            format!("'{field}' must not be empty; omit it instead"),
        )),
        Some(items) => Ok(items),
        None => Ok(&[][..]),
    }
}

fn load_rules(
    origin: &str,
    raw: &IndexMap<String, Value>,
) -> Result<IndexMap<RuleKey, RuleSetting>> {
    let mut rules = IndexMap::with_capacity(raw.len());
    for (key, value) in raw {
        let field = format!("rules.{key}");
        let rule_key = RuleKey::parse(key)
            .map_err(|reason| CascadeError::invalid_fragment(origin, field.as_str(), reason))?;
        let setting = RuleSetting::from_value(value)
            .map_err(|reason| CascadeError::invalid_fragment(origin, field.as_str(), reason))?;
        rules.insert(rule_key, setting);
    }
    Ok(rules)
}

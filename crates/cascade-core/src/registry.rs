//! Named rule sets and aliases available as `extends` targets

use crate::config::FragmentDeclaration;
use crate::error::CascadeError;
use crate::fragment::Fragment;
use crate::result::Result;
use crate::store;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::debug;

/// A named, ordered group of fragments
///
/// Never matched against files directly; only spliced in through `extends`.
#[derive(Debug, Clone)]
pub struct NamedRuleSet {
    pub name: String,
    pub fragments: Vec<Arc<Fragment>>,
}

impl NamedRuleSet {
    /// Validate declarations into a rule set
    ///
    /// Fragment positions are reported as `ruleSets.<name>[i]`.
    pub fn load(name: &str, declarations: &[FragmentDeclaration]) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(CascadeError::invalid_fragment(
                "ruleSets",
                "<name>",
                "rule set name is empty",
            ));
        }
        let fragments = store::load_sequence(declarations, |i| format!("ruleSets.{name}[{i}]"))?;
        Ok(Self {
            name: name.to_string(),
            fragments,
        })
    }
}

/// Registry of rule sets and aliases
#[derive(Debug, Clone, Default)]
pub struct RuleSetRegistry {
    rule_sets: IndexMap<String, Arc<NamedRuleSet>>,
    aliases: IndexMap<String, String>,
}

impl RuleSetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declared rule sets and aliases
    ///
    /// Every alias is checked eagerly: unknown targets and alias cycles fail
    /// here rather than when a fragment first references them.
    pub fn from_declarations(
        rule_sets: &IndexMap<String, Vec<FragmentDeclaration>>,
        aliases: &IndexMap<String, String>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for (name, declarations) in rule_sets {
            registry.register(NamedRuleSet::load(name, declarations)?);
        }
        for (alias, target) in aliases {
            registry.register_alias(alias, target)?;
        }
        registry.validate_aliases()?;
        Ok(registry)
    }

    /// Register a rule set
    ///
    /// If a rule set with the same name already exists, it will be replaced.
    pub fn register(&mut self, rule_set: NamedRuleSet) {
        debug!(
            "Registering rule set '{}' with {} fragments",
            rule_set.name,
            rule_set.fragments.len()
        );
        self.rule_sets
            .insert(rule_set.name.clone(), Arc::new(rule_set));
    }

    /// Register an alternative name for a rule set (or another alias)
    pub fn register_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        if alias.trim().is_empty() || target.trim().is_empty() {
            return Err(CascadeError::config_error(format!(
                "Alias '{alias}' → '{target}' has an empty name"
            )));
        }
        if self.rule_sets.contains_key(alias) {
            return Err(CascadeError::config_error(format!(
                "Alias '{alias}' shadows a rule set of the same name"
            )));
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Check that every alias resolves to a registered rule set
    pub fn validate_aliases(&self) -> Result<()> {
        for alias in self.aliases.keys() {
            self.lookup(alias, &format!("aliases.{alias}"))?;
        }
        Ok(())
    }

    /// Resolve a reference (following aliases) to its rule set
    ///
    /// `requested_by` names the fragment or alias asking, for diagnostics.
    pub fn lookup(&self, reference: &str, requested_by: &str) -> Result<&Arc<NamedRuleSet>> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut current = reference;

        loop {
            if let Some(rule_set) = self.rule_sets.get(current) {
                return Ok(rule_set);
            }
            let Some(target) = self.aliases.get(current) else {
                return Err(CascadeError::unknown_rule_set(current, requested_by));
            };
            if !seen.insert(current) {
                let mut cycle: Vec<String> = seen
                    .iter()
                    .skip_while(|name| **name != current)
                    .map(|name| name.to_string())
                    .collect();
                cycle.push(current.to_string());
                return Err(CascadeError::cyclic_extends(cycle));
            }
            current = target;
        }
    }

    /// Canonical rule set name for a reference
    pub fn canonical_name(&self, reference: &str, requested_by: &str) -> Result<&str> {
        self.lookup(reference, requested_by)
            .map(|rule_set| rule_set.name.as_str())
    }

    /// Get number of registered rule sets
    pub fn rule_set_count(&self) -> usize {
        self.rule_sets.len()
    }

    /// Check if a name is registered, directly or as an alias
    pub fn contains(&self, name: &str) -> bool {
        self.rule_sets.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Get all rule set names in registration order
    pub fn rule_set_names(&self) -> Vec<String> {
        self.rule_sets.keys().cloned().collect()
    }
}

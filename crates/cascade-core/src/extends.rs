//! `extends` expansion
//!
//! Replaces every `extends` reference with the fragments registered under
//! that name, recursively, in declaration order. Extended fragments come
//! before the fragment that references them, so the referencing fragment's
//! own rules win.
//!
//! # Algorithm
//!
//! Expansion is a depth-first walk driven by an explicit work list, so
//! arbitrarily deep (acyclic) chains never grow the call stack:
//!
//! 1. `Visit(fragment)` schedules `Emit(fragment)` and, before it, one
//!    `Enter(name)` per `extends` entry
//! 2. `Enter(name)` resolves aliases, checks the current chain for `name`,
//!    pushes it, and schedules the rule set's fragments followed by `Leave`
//! 3. `Leave` pops the chain
//!
//! The chain only holds names currently being expanded, so a rule set
//! reached twice through different branches (a diamond) is legal, while a
//! rule set reached from inside itself is a cycle.
//!
//! Diamonds duplicate the shared rule set once per path through the graph,
//! so stacked diamonds grow the cascade exponentially. Expansion stops with a
//! `ConfigError` once the cascade exceeds the configured entry limit.
//!
//! # Scope inheritance
//!
//! A fragment pulled in through `extends` inherits the file restrictions of
//! every fragment above it: it only applies where its own matchers and
//! language tag and those of all its ancestors apply.

use crate::config::DEFAULT_MAX_CASCADE_ENTRIES;
use crate::error::CascadeError;
use crate::fragment::Fragment;
use crate::registry::RuleSetRegistry;
use crate::result::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Persistent singly linked list, innermost entry first
///
/// Used for the restrictions and rule set names an extended fragment
/// inherits; siblings share their common tail.
#[derive(Debug)]
struct Link<T> {
    value: T,
    parent: Option<Arc<Link<T>>>,
}

type Chain<T> = Option<Arc<Link<T>>>;

impl<T> Drop for Link<T> {
    // Unlink iteratively; a deep chain would otherwise drop recursively.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(link) = next {
            match Arc::try_unwrap(link) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

fn push<T>(chain: &Chain<T>, value: T) -> Chain<T> {
    Some(Arc::new(Link {
        value,
        parent: chain.clone(),
    }))
}

fn links<T>(chain: &Chain<T>) -> impl Iterator<Item = &T> {
    let mut current = chain.as_deref();
    std::iter::from_fn(move || {
        let link = current?;
        current = link.parent.as_deref();
        Some(&link.value)
    })
}

/// A fragment placed in the flattened cascade
#[derive(Debug, Clone)]
pub struct ExpandedFragment {
    fragment: Arc<Fragment>,
    /// Ancestors that restrict files; only those are linked in
    scope: Chain<Arc<Fragment>>,
    via: Chain<String>,
}

impl ExpandedFragment {
    pub fn fragment(&self) -> &Arc<Fragment> {
        &self.fragment
    }

    /// Rule set names this fragment was reached through, outermost first
    pub fn via(&self) -> Vec<String> {
        let mut names: Vec<String> = links(&self.via).cloned().collect();
        names.reverse();
        names
    }

    /// Whether the fragment and every inherited restriction apply
    pub fn applies_to(&self, path: &str, language: Option<&str>) -> bool {
        self.fragment.applies_to(path, language)
            && links(&self.scope).all(|ancestor| ancestor.applies_to(path, language))
    }

    /// Fragment label plus the chain it came through
    pub fn provenance(&self) -> String {
        let via = self.via();
        if via.is_empty() {
            self.fragment.label()
        } else {
            format!("{} (via {})", self.fragment.label(), via.join(" → "))
        }
    }
}

enum Work {
    Visit {
        fragment: Arc<Fragment>,
        scope: Chain<Arc<Fragment>>,
        via: Chain<String>,
    },
    Enter {
        reference: String,
        requested_by: String,
        scope: Chain<Arc<Fragment>>,
        via: Chain<String>,
    },
    Emit(ExpandedFragment),
    Leave,
}

/// Expands `extends` references against a registry
pub struct ExtendsResolver<'a> {
    registry: &'a RuleSetRegistry,
    max_entries: usize,
}

impl<'a> ExtendsResolver<'a> {
    pub fn new(registry: &'a RuleSetRegistry) -> Self {
        Self {
            registry,
            max_entries: DEFAULT_MAX_CASCADE_ENTRIES,
        }
    }

    /// Limit the number of entries one expansion may produce
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Expand one fragment into its flattened sequence
    ///
    /// The result ends with the fragment itself.
    ///
    /// # Errors
    ///
    /// - `UnknownRuleSet` when a reference is not registered
    /// - `CyclicExtends` when a rule set (transitively) extends itself
    /// - `ConfigError` when the expansion exceeds the entry limit
    pub fn expand(&self, fragment: &Arc<Fragment>) -> Result<Vec<ExpandedFragment>> {
        let mut output = Vec::new();
        self.expand_into(fragment, &mut output)?;
        Ok(output)
    }

    /// Expand a whole ordered sequence
    pub fn expand_all(&self, fragments: &[Arc<Fragment>]) -> Result<Vec<ExpandedFragment>> {
        let mut output = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            self.expand_into(fragment, &mut output)?;
        }
        debug!(
            "Expanded {} fragments into {} cascade entries",
            fragments.len(),
            output.len()
        );
        Ok(output)
    }

    fn expand_into(
        &self,
        root: &Arc<Fragment>,
        output: &mut Vec<ExpandedFragment>,
    ) -> Result<()> {
        let mut chain: Vec<String> = Vec::new();
        let mut in_chain: HashSet<String> = HashSet::new();
        let mut work = vec![Work::Visit {
            fragment: Arc::clone(root),
            scope: None,
            via: None,
        }];

        while let Some(item) = work.pop() {
            match item {
                Work::Visit {
                    fragment,
                    scope,
                    via,
                } => {
                    let child_scope = if fragment.has_constraints() {
                        push(&scope, Arc::clone(&fragment))
                    } else {
                        scope.clone()
                    };

                    let requested_by = fragment.label();
                    let references = fragment.extends.clone();
                    work.push(Work::Emit(ExpandedFragment {
                        fragment,
                        scope,
                        via: via.clone(),
                    }));
                    // Reverse so the first reference is expanded first
                    for reference in references.into_iter().rev() {
                        work.push(Work::Enter {
                            reference,
                            requested_by: requested_by.clone(),
                            scope: child_scope.clone(),
                            via: via.clone(),
                        });
                    }
                }
                Work::Enter {
                    reference,
                    requested_by,
                    scope,
                    via,
                } => {
                    let rule_set = self.registry.lookup(&reference, &requested_by)?;
                    let name = rule_set.name.clone();

                    if in_chain.contains(&name) {
                        let start = chain.iter().position(|n| *n == name).unwrap_or(0);
                        let mut cycle = chain[start..].to_vec();
                        cycle.push(name);
                        return Err(CascadeError::cyclic_extends(cycle));
                    }

                    trace!(
                        "Entering rule set '{}' at depth {} ({} fragments)",
                        name,
                        chain.len(),
                        rule_set.fragments.len()
                    );
                    chain.push(name.clone());
                    in_chain.insert(name.clone());

                    let nested_via = push(&via, name);

                    work.push(Work::Leave);
                    for fragment in rule_set.fragments.iter().rev() {
                        work.push(Work::Visit {
                            fragment: Arc::clone(fragment),
                            scope: scope.clone(),
                            via: nested_via.clone(),
                        });
                    }
                }
                Work::Emit(expanded) => {
                    if output.len() >= self.max_entries {
                        return Err(CascadeError::config_error(format!(
                            "Expanding extends of {} exceeds the limit of {} cascade entries",
                            root.label(),
                            self.max_entries
                        )));
                    }
                    output.push(expanded);
                }
                Work::Leave => {
                    if let Some(name) = chain.pop() {
                        in_chain.remove(&name);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Expand one fragment against `registry`
pub fn expand(fragment: &Arc<Fragment>, registry: &RuleSetRegistry) -> Result<Vec<ExpandedFragment>> {
    ExtendsResolver::new(registry).expand(fragment)
}

//! Cascade resolver: effective configuration per file
//!
//! A [`Snapshot`] is built once from validated fragments, rule sets and the
//! document-level ignore patterns: every fragment's `extends` are expanded
//! into one flat, ordered cascade. Resolving a path filters that
//! cascade and merges what applies. Snapshots are immutable, so resolution
//! can run on any number of threads.
//!
//! [`CascadeResolver`] owns the current snapshot and swaps in a new one on
//! reload. Readers clone the `Arc` and keep working against the snapshot they
//! started with.
//!
//! # Example
//!
//! ```rust,ignore
//! let document = ConfigLoader::load(None, Some(Path::new(".")))?;
//! let resolver = CascadeResolver::from_document(&document)?;
//!
//! let config = resolver.resolve("src/app.ts");
//! for (rule, setting) in config.enabled_rules() {
//!     println!("{rule}: {}", setting.severity);
//! }
//! ```

use crate::config::{CascadeDocument, ConfigLoader, EngineOptions, FragmentDeclaration};
use crate::extends::{ExpandedFragment, ExtendsResolver};
use crate::language::LanguageMap;
use crate::matcher::{FileMatcher, GlobPattern, normalize_path};
use crate::merge::{ResolvedConfiguration, apply_fragment};
use crate::registry::RuleSetRegistry;
use crate::result::{Result, ResultExt};
use crate::store::{self, FragmentStore};
use dashmap::DashMap;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, trace};

/// Why a path resolved the way it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub path: String,
    pub language: Option<String>,
    /// Document-level ignore pattern that excluded the path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_by: Option<String>,
    /// Provenance of every applied fragment, in merge order
    pub applied: Vec<String>,
}

/// Immutable, fully expanded fragment set
#[derive(Debug)]
pub struct Snapshot {
    cascade: Vec<ExpandedFragment>,
    ignores: FileMatcher,
    languages: LanguageMap,
    cache: Option<DashMap<String, Arc<ResolvedConfiguration>>>,
    cache_capacity: usize,
}

impl Snapshot {
    /// Expand a loaded store against a registry
    ///
    /// Paths excluded by `ignores` never reach the cascade.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown or cyclic `extends` reference, or when the
    /// expansion exceeds `options.max_cascade_entries`.
    pub fn new(
        store: &FragmentStore,
        registry: &RuleSetRegistry,
        ignores: FileMatcher,
        options: &EngineOptions,
    ) -> Result<Self> {
        let cascade = ExtendsResolver::new(registry)
            .with_max_entries(options.max_cascade_entries)
            .expand_all(store.fragments())?;
        debug!(
            "Built snapshot: {} cascade entries, {} ignore patterns, {} rule sets",
            cascade.len(),
            ignores.exclude().len(),
            registry.rule_set_count()
        );

        let caching = options.cache && options.cache_capacity > 0;
        Ok(Self {
            cascade,
            ignores,
            languages: LanguageMap::with_overrides(&options.languages),
            cache: caching.then(DashMap::new),
            cache_capacity: options.cache_capacity,
        })
    }

    /// Validate and expand raw declarations
    pub fn from_declarations(
        fragments: &[FragmentDeclaration],
        rule_sets: &IndexMap<String, Vec<FragmentDeclaration>>,
        aliases: &IndexMap<String, String>,
        ignores: &[String],
        options: &EngineOptions,
    ) -> Result<Self> {
        let ignores = store::load_ignores(ignores)?;
        let registry = RuleSetRegistry::from_declarations(rule_sets, aliases)?;
        let store = FragmentStore::load(fragments)?;
        Self::new(&store, &registry, ignores, options)
    }

    pub fn from_document(document: &CascadeDocument) -> Result<Self> {
        Self::from_declarations(
            &document.fragments,
            &document.rule_sets,
            &document.aliases,
            &document.ignores,
            &document.options,
        )
    }

    /// Effective configuration for one path
    ///
    /// Never fails: a path nothing applies to gets an empty configuration.
    pub fn resolve(&self, path: &str) -> Arc<ResolvedConfiguration> {
        let path = normalize_path(path);

        let Some(cache) = &self.cache else {
            return Arc::new(self.compute(path));
        };
        if let Some(hit) = cache.get(path) {
            trace!("Cache hit for {}", path);
            return Arc::clone(hit.value());
        }

        let resolved = Arc::new(self.compute(path));
        if cache.len() >= self.cache_capacity {
            debug!("Resolution cache reached {} entries, clearing", self.cache_capacity);
            cache.clear();
        }
        // A racing thread may have inserted first; both values are equal
        cache.insert(path.to_string(), Arc::clone(&resolved));
        resolved
    }

    /// Resolve many paths in parallel
    ///
    /// Keys are the paths as given, in input order; a repeated path keeps its
    /// first position.
    pub fn resolve_all<P>(&self, paths: &[P]) -> IndexMap<String, Arc<ResolvedConfiguration>>
    where
        P: AsRef<str> + Sync,
    {
        let resolved: Vec<(String, Arc<ResolvedConfiguration>)> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                (path.to_string(), self.resolve(path))
            })
            .collect();
        debug!("Resolved {} paths", resolved.len());
        resolved.into_iter().collect()
    }

    /// Whether a document-level ignore pattern covers `path`
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_by(normalize_path(path)).is_some()
    }

    /// Which fragments applied to `path`, in merge order
    pub fn explain(&self, path: &str) -> Explanation {
        let path = normalize_path(path);
        let language = self.languages.language_of(path);

        let (ignored_by, applied) = match self.ignored_by(path) {
            Some(pattern) => (Some(pattern.to_string()), Vec::new()),
            None => (
                None,
                self.applicable(path, language)
                    .map(ExpandedFragment::provenance)
                    .collect(),
            ),
        };

        Explanation {
            path: path.to_string(),
            language: language.map(str::to_string),
            ignored_by,
            applied,
        }
    }

    /// Language tag assigned to `path`
    pub fn language_of<'a>(&'a self, path: &'a str) -> Option<&'a str> {
        self.languages.language_of(normalize_path(path))
    }

    /// Flattened cascade, in merge order
    pub fn cascade(&self) -> &[ExpandedFragment] {
        &self.cascade
    }

    /// Document-level ignore patterns
    pub fn ignores(&self) -> &FileMatcher {
        &self.ignores
    }

    /// Number of cached resolutions
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, DashMap::len)
    }

    fn compute(&self, path: &str) -> ResolvedConfiguration {
        if let Some(pattern) = self.ignored_by(path) {
            trace!("{} ignored by '{}'", path, pattern);
            return ResolvedConfiguration::ignored();
        }

        let language = self.languages.language_of(path);
        let mut resolved = ResolvedConfiguration::default();
        for entry in self.applicable(path, language) {
            apply_fragment(&mut resolved, entry.fragment());
        }
        resolved
    }

    fn applicable<'a>(
        &'a self,
        path: &'a str,
        language: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ExpandedFragment> {
        self.cascade
            .iter()
            .filter(move |entry| entry.applies_to(path, language))
    }

    fn ignored_by(&self, path: &str) -> Option<&str> {
        self.ignores.excluded_by(path).map(GlobPattern::as_str)
    }
}

/// Shared resolver with atomic reload
///
/// Multiple threads can resolve concurrently; `reload` builds the next
/// snapshot outside the lock and only takes the write lock to swap it in.
#[derive(Debug)]
pub struct CascadeResolver {
    current: RwLock<Arc<Snapshot>>,
    generation: AtomicU64,
}

impl CascadeResolver {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_document(document: &CascadeDocument) -> Result<Self> {
        Snapshot::from_document(document).map(Self::new)
    }

    /// Load a declaration file and build a resolver from it
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_document(&ConfigLoader::load_from_file(path)?)
    }

    /// The snapshot currently published
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // The lock only guards a pointer swap; a poisoned lock still holds a
        // complete snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Number of successful reloads
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn resolve(&self, path: &str) -> Arc<ResolvedConfiguration> {
        self.snapshot().resolve(path)
    }

    pub fn resolve_all<P>(&self, paths: &[P]) -> IndexMap<String, Arc<ResolvedConfiguration>>
    where
        P: AsRef<str> + Sync,
    {
        self.snapshot().resolve_all(paths)
    }

    pub fn explain(&self, path: &str) -> Explanation {
        self.snapshot().explain(path)
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.snapshot().is_ignored(path)
    }

    /// Replace the fragment set
    ///
    /// The new snapshot is fully built before it is published. On error the
    /// current snapshot (and its cache) stays in place.
    pub fn reload(&self, document: &CascadeDocument) -> Result<()> {
        let next = Snapshot::from_document(document)?;
        self.publish(next);
        Ok(())
    }

    /// Reload from a declaration file
    pub fn reload_from_file(&self, path: &Path) -> Result<()> {
        let document = ConfigLoader::load_from_file(path)?;
        self.reload(&document)
    }

    /// Reload, logging a failure instead of returning it
    ///
    /// Returns whether the new fragment set was published.
    pub fn try_reload(&self, document: &CascadeDocument) -> bool {
        self.reload(document).log_and_continue().is_some()
    }

    fn publish(&self, next: Snapshot) {
        let next = Arc::new(next);
        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = next;
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!("Published configuration generation {}", generation);
    }
}

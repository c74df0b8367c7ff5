//! Cascade Core
//!
//! Configuration cascade resolution for rule-based linters.
//! Given an ordered list of configuration fragments (file patterns, a language
//! tag, `extends` references to named rule sets, rule settings and shared
//! options), this crate computes the effective rule configuration for any
//! file path. Later fragments override earlier ones.
//!
//! Resolution runs in two phases: `extends` references are expanded once
//! into a flat cascade when the configuration is loaded, then each path
//! filters that cascade and merges what applies.

pub mod config;
pub mod error;
pub mod extends;
pub mod fragment;
pub mod language;
pub mod matcher;
pub mod merge;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod store;

// Re-export commonly used types
pub use config::{
    CONFIG_FILE_NAMES, CascadeDocument, ConfigLoader, DocumentFormat, EngineOptions,
    FragmentDeclaration, document_schema,
};
pub use error::{CascadeError, ErrorKind};
pub use extends::{ExpandedFragment, ExtendsResolver, expand};
pub use fragment::{Fragment, RuleKey, RuleSetting, Severity};
pub use language::LanguageMap;
pub use matcher::{FileMatcher, GlobPattern, PatternError, matches};
pub use merge::{ResolvedConfiguration, merge};
pub use registry::{NamedRuleSet, RuleSetRegistry};
pub use resolver::{CascadeResolver, Explanation, Snapshot};
pub use result::{Result, ResultExt};
pub use store::FragmentStore;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cascade=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

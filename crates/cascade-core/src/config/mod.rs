//! Declaration documents and engine options
//!
//! This module provides:
//! - The raw declaration shape (`FragmentDeclaration`, `CascadeDocument`)
//! - Engine options (`EngineOptions`)
//! - JSON/JSONC/YAML/TOML loading with upward auto-discovery
//! - JSON Schema generation via schemars
//!
//! ## Example Configuration
//!
//! ```jsonc
//! {
//!   "ignores": ["dist/", "**/*.min.js"],
//!   "ruleSets": {
//!     "recommended": [{ "rules": { "no-undef": "error" } }],
//!     "strict": [{ "extends": ["recommended"], "rules": { "no-var": "error" } }]
//!   },
//!   "aliases": { "base:strict": "strict" },
//!   "fragments": [
//!     { "rules": { "eqeqeq": "warn" }, "sharedOptions": { "globals": ["window"] } },
//!     { "files": ["**/*.ts"], "extends": ["base:strict"], "rules": { "eqeqeq": ["error", "always"] } },
//!     { "files": ["**/*.json"], "language": "json", "rules": { "json:no-duplicate-keys": 2 } }
//!   ],
//!   "options": { "languages": { "vue": "script" } }
//! }
//! ```

mod declaration;
mod loader;

pub use declaration::{
    CascadeDocument, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_CASCADE_ENTRIES, EngineOptions,
    FragmentDeclaration, document_schema,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader, DocumentFormat};

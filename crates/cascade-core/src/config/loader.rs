//! Declaration document discovery and loading

use super::declaration::CascadeDocument;
use crate::error::CascadeError;
use crate::result::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names searched for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "cascade.config.json",
    "cascade.config.jsonc",
    "cascade.config.yaml",
    "cascade.config.yml",
    "cascade.config.toml",
];

/// Supported declaration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    /// JSON with comments and trailing commas
    Json5,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("jsonc") | Some("json5") => Some(Self::Json5),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse a document from text
    pub fn parse(self, content: &str) -> std::result::Result<CascadeDocument, String> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Json5 => json5::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Configuration loader for discovering and loading declaration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a declaration file by traversing upward from start_path
    ///
    /// Checks [`CONFIG_FILE_NAMES`] in order in each directory, moving up the
    /// tree until a file is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| CascadeError::io_error(start_path, e))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load a declaration document from a specific file
    pub fn load_from_file(path: &Path) -> Result<CascadeDocument> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            CascadeError::config_error(format!(
                "Unsupported file extension for '{}' (expected .json, .jsonc, .json5, .yaml, .yml or .toml)",
                path.display()
            ))
        })?;
        let content = fs::read_to_string(path).map_err(|e| CascadeError::io_error(path, e))?;

        let document = format.parse(&content).map_err(|e| {
            CascadeError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded {} fragments and {} rule sets from {}",
            document.fragments.len(),
            document.rule_sets.len(),
            path.display()
        );
        Ok(document)
    }

    /// Load from an explicit path or auto-discover from `start_dir`
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<CascadeDocument> {
        let config_path = match custom_path {
            Some(path) => {
                if !path.exists() {
                    return Err(CascadeError::config_error(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
                Self::auto_discover(search_dir)?.ok_or_else(|| {
                    CascadeError::config_error(format!(
                        "No config file found ({})",
                        CONFIG_FILE_NAMES.join(", ")
                    ))
                })?
            }
        };

        Self::load_from_file(&config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(
            temp_dir.path(),
            "cascade.config.json",
            r#"{ "fragments": [ { "files": ["*.js"], "rules": { "no-var": "error" } } ] }"#,
        );

        let doc = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(doc.fragments.len(), 1);
        assert_eq!(doc.fragments[0].files, Some(vec!["*.js".to_string()]));
    }

    #[test]
    fn test_load_from_file_jsonc() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(
            temp_dir.path(),
            "cascade.config.jsonc",
            r#"{
                // base layer
                "fragments": [
                    { "rules": { "eqeqeq": "warn", }, },
                ],
            }"#,
        );

        let doc = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(doc.fragments.len(), 1);
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(
            temp_dir.path(),
            "cascade.config.toml",
            r#"
[[ruleSets.strict]]
rules = { no-var = "error" }

[[fragments]]
files = ["*.ts"]
extends = ["strict"]

[fragments.rules]
eqeqeq = ["error", "always"]
"#,
        );

        let doc = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(doc.fragments.len(), 1);
        assert_eq!(doc.rule_sets["strict"].len(), 1);
        assert_eq!(doc.fragments[0].extends, Some(vec!["strict".to_string()]));
    }

    #[test]
    fn test_auto_discover_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "cascade.config.yaml", "fragments: []\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(
            found.unwrap().file_name().unwrap(),
            "cascade.config.yaml"
        );
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "cascade.config.toml", "fragments = []\n");
        create_temp_config(temp_dir.path(), "cascade.config.json", r#"{"fragments": []}"#);

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(
            found.unwrap().file_name().unwrap(),
            "cascade.config.json"
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(matches!(result, Err(CascadeError::ConfigError { .. })));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "broken.json", "{ invalid json }");
        let result = ConfigLoader::load_from_file(&path);
        assert!(matches!(result, Err(CascadeError::ConfigError { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "cascade.ini", "x=1");
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}

//! File-kind detection for language-tagged fragments

use indexmap::IndexMap;

/// Extension → language tag table used when no override is configured
const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("js", "script"),
    ("mjs", "script"),
    ("cjs", "script"),
    ("jsx", "script"),
    ("ts", "script"),
    ("mts", "script"),
    ("cts", "script"),
    ("tsx", "script"),
    ("json", "json"),
    ("jsonc", "jsonc"),
    ("json5", "json5"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("css", "css"),
];

/// Maps file extensions to language tags
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageMap {
    by_extension: IndexMap<String, String>,
}

impl LanguageMap {
    /// Defaults overlaid with `overrides` (extension → tag)
    ///
    /// Extensions are matched case-insensitively and may be written with or
    /// without the leading dot. An empty tag removes the extension.
    pub fn with_overrides(overrides: &IndexMap<String, String>) -> Self {
        let mut by_extension: IndexMap<String, String> = DEFAULT_LANGUAGES
            .iter()
            .map(|(ext, tag)| (ext.to_string(), tag.to_string()))
            .collect();

        for (ext, tag) in overrides {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            if tag.is_empty() {
                by_extension.shift_remove(&ext);
            } else {
                by_extension.insert(ext, tag.clone());
            }
        }

        Self { by_extension }
    }

    /// Language tag of a normalized path, if its extension is known
    pub fn language_of(&self, path: &str) -> Option<&str> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            // `.eslintrc` has no extension
            return None;
        }
        self.by_extension
            .get(&ext.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl Default for LanguageMap {
    fn default() -> Self {
        Self::with_overrides(&IndexMap::new())
    }
}

/// A fragment without a tag is compatible with every file; a tagged fragment
/// only with files of the same kind.
pub fn is_compatible(fragment_language: Option<&str>, file_language: Option<&str>) -> bool {
    match fragment_language {
        None => true,
        Some(tag) => file_language == Some(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_languages() {
        let map = LanguageMap::default();
        assert_eq!(map.language_of("src/a.ts"), Some("script"));
        assert_eq!(map.language_of("package.json"), Some("json"));
        assert_eq!(map.language_of("README.MD"), Some("markdown"));
        assert_eq!(map.language_of("logo.png"), None);
        assert_eq!(map.language_of(".eslintrc"), None);
        assert_eq!(map.language_of("Makefile"), None);
    }

    #[test]
    fn test_overrides() {
        let overrides = IndexMap::from([
            (".vue".to_string(), "script".to_string()),
            ("css".to_string(), String::new()),
        ]);
        let map = LanguageMap::with_overrides(&overrides);
        assert_eq!(map.language_of("App.vue"), Some("script"));
        assert_eq!(map.language_of("site.css"), None);
    }

    #[test]
    fn test_compatibility() {
        assert!(is_compatible(None, None));
        assert!(is_compatible(None, Some("json")));
        assert!(is_compatible(Some("json"), Some("json")));
        assert!(!is_compatible(Some("json"), Some("script")));
        assert!(!is_compatible(Some("json"), None));
    }
}

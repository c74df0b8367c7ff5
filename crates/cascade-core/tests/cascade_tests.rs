//! End-to-end cascade resolution
//!
//! Exercises the resolver through its public API: declaration documents in,
//! effective configurations out.

use cascade_core::{
    CascadeDocument, CascadeError, CascadeResolver, ErrorKind, Severity, Snapshot,
};
use serde_json::{Value, json};

fn document(value: Value) -> CascadeDocument {
    serde_json::from_value(value).unwrap()
}

fn snapshot(value: Value) -> Snapshot {
    Snapshot::from_document(&document(value)).unwrap()
}

fn severities(snapshot: &Snapshot, path: &str) -> Vec<(String, Severity)> {
    snapshot
        .resolve(path)
        .rules
        .iter()
        .map(|(key, setting)| (key.to_string(), setting.severity))
        .collect()
}

#[test]
fn test_typescript_overrides_shared_baseline() {
    let snapshot = snapshot(json!({
        "ruleSets": { "strict": [{ "rules": { "no-var": "error" } }] },
        "fragments": [
            { "files": ["*"], "rules": { "eqeqeq": "warn" } },
            { "files": ["*.ts"], "extends": ["strict"], "rules": { "eqeqeq": "error" } }
        ]
    }));

    assert_eq!(
        severities(&snapshot, "a.ts"),
        vec![
            ("eqeqeq".to_string(), Severity::Error),
            ("no-var".to_string(), Severity::Error),
        ]
    );
    assert_eq!(
        severities(&snapshot, "a.js"),
        vec![("eqeqeq".to_string(), Severity::Warn)]
    );
}

#[test]
fn test_resolution_is_deterministic() {
    let value = json!({
        "ruleSets": {
            "base": [{ "rules": { "z": 1, "a": 1, "m": 1 }, "sharedOptions": { "globals": ["b", "a"] } }],
            "extra": [{ "extends": ["base"], "rules": { "q": 2 } }]
        },
        "fragments": [
            { "extends": ["extra"], "sharedOptions": { "globals": ["c", "a"] } },
            { "files": ["src/**"], "rules": { "a": "off" } }
        ]
    });

    let first = serde_json::to_string(&*snapshot(value.clone()).resolve("src/x.js")).unwrap();
    for _ in 0..10 {
        let again = serde_json::to_string(&*snapshot(value.clone()).resolve("src/x.js")).unwrap();
        assert_eq!(first, again);
    }
    assert_eq!(
        first,
        r#"{"rules":{"z":{"severity":"warn"},"a":{"severity":"off"},"m":{"severity":"warn"},"q":{"severity":"error"}},"sharedOptions":{"globals":["b","a","c"]}}"#
    );
}

#[test]
fn test_fragment_order_matters() {
    let forward = snapshot(json!({
        "fragments": [
            { "rules": { "semi": "error" } },
            { "files": ["**/*.js"], "rules": { "semi": "off" } }
        ]
    }));
    let reversed = snapshot(json!({
        "fragments": [
            { "files": ["**/*.js"], "rules": { "semi": "off" } },
            { "rules": { "semi": "error" } }
        ]
    }));

    assert_eq!(forward.resolve("a.js").severity("semi"), Some(Severity::Off));
    assert_eq!(reversed.resolve("a.js").severity("semi"), Some(Severity::Error));
}

#[test]
fn test_exclusion_beats_inclusion() {
    let snapshot = snapshot(json!({
        "fragments": [
            { "files": ["src/**/*.js"], "ignores": ["src/vendor/**"], "rules": { "strict": 2 } }
        ]
    }));

    assert!(snapshot.resolve("src/app.js").is_enabled("strict"));
    assert!(snapshot.resolve("src/vendor/lib.js").is_empty());
}

#[test]
fn test_fragment_without_files_applies_everywhere() {
    let snapshot = snapshot(json!({ "fragments": [{ "rules": { "no-debugger": "error" } }] }));
    for path in ["a.js", "deep/nested/dir/b.md", ".hidden", "Makefile"] {
        assert!(snapshot.resolve(path).is_enabled("no-debugger"), "{path}");
    }
}

#[test]
fn test_nothing_applies() {
    let snapshot = snapshot(json!({ "fragments": [{ "files": ["*.ts"], "rules": { "a": 2 } }] }));
    let resolved = snapshot.resolve("README.md");
    assert!(resolved.is_empty());
    assert_eq!(resolved.enabled_rules().count(), 0);
}

#[test]
fn test_referencing_fragment_wins_over_extended() {
    let snapshot = snapshot(json!({
        "ruleSets": { "recommended": [{ "rules": { "quotes": ["error", "double"] } }] },
        "fragments": [{ "extends": ["recommended"], "rules": { "quotes": ["warn", "single"] } }]
    }));

    let resolved = snapshot.resolve("a.js");
    let quotes = resolved.get("quotes").unwrap();
    assert_eq!(quotes.severity, Severity::Warn);
    assert_eq!(quotes.options, vec![json!("single")]);
}

#[test]
fn test_cycle_names_both_rule_sets() {
    let err = Snapshot::from_document(&document(json!({
        "ruleSets": {
            "a": [{ "extends": ["b"] }],
            "b": [{ "extends": ["a"] }]
        },
        "fragments": [{ "extends": ["a"] }]
    })))
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Extends);
    let message = err.to_string();
    assert!(message.contains("a → b → a"), "{message}");
}

#[test]
fn test_diamond_extends_is_allowed() {
    let snapshot = snapshot(json!({
        "ruleSets": {
            "base": [{ "rules": { "base-rule": "warn" } }],
            "left": [{ "extends": ["base"], "rules": { "left-rule": 2 } }],
            "right": [{ "extends": ["base"], "rules": { "base-rule": "error" } }]
        },
        "fragments": [{ "extends": ["left", "right"] }]
    }));

    let resolved = snapshot.resolve("a.js");
    assert_eq!(resolved.severity("base-rule"), Some(Severity::Error));
    assert_eq!(resolved.severity("left-rule"), Some(Severity::Error));
    assert_eq!(snapshot.cascade().len(), 5);
}

#[test]
fn test_aliases_resolve_to_rule_sets() {
    let snapshot = snapshot(json!({
        "ruleSets": { "recommended": [{ "rules": { "no-undef": "error" } }] },
        "aliases": {
            "eslint:recommended": "js/recommended",
            "js/recommended": "recommended"
        },
        "fragments": [{ "extends": ["eslint:recommended"] }]
    }));

    assert!(snapshot.resolve("a.js").is_enabled("no-undef"));
    assert_eq!(
        snapshot.explain("a.js").applied,
        vec!["ruleSets.recommended[0] (via recommended)".to_string(), "fragments[0]".to_string()]
    );
}

#[test]
fn test_alias_cycle_is_rejected() {
    let err = Snapshot::from_document(&document(json!({
        "aliases": { "x": "y", "y": "x" },
        "fragments": [{ "rules": { "a": 1 } }]
    })))
    .unwrap_err();
    assert!(matches!(err, CascadeError::CyclicExtends { .. }));
}

#[test]
fn test_unknown_rule_set_names_requester() {
    let err = Snapshot::from_document(&document(json!({
        "fragments": [
            { "rules": { "a": 1 } },
            { "name": "react", "extends": ["plugin:react/recommended"] }
        ]
    })))
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unknown rule set 'plugin:react/recommended' referenced by fragments[1] \"react\""
    );
}

#[test]
fn test_invalid_fragment_produces_nothing() {
    let err = Snapshot::from_document(&document(json!({
        "fragments": [
            { "rules": { "a": 1 } },
            { "files": ["src/[abc"], "rules": { "b": 1 } }
        ]
    })))
    .unwrap_err();

    match err {
        CascadeError::MalformedPattern { pattern, position, .. } => {
            assert_eq!(pattern, "src/[abc");
            assert_eq!(position, "fragments[1]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_deep_chain_through_resolver() {
    let depth = 10_000;
    let mut rule_sets = serde_json::Map::new();
    for level in 0..depth {
        let fragments = if level + 1 < depth {
            json!([{ "extends": [format!("level{}", level + 1)], "rules": { format!("r{level}"): "warn" } }])
        } else {
            json!([{ "rules": { "deepest": "error" } }])
        };
        rule_sets.insert(format!("level{level}"), fragments);
    }

    let snapshot = snapshot(json!({
        "ruleSets": rule_sets,
        "fragments": [{ "files": ["**/*.js"], "extends": ["level0"] }]
    }));

    let resolved = snapshot.resolve("src/a.js");
    assert_eq!(resolved.rules.len(), depth);
    assert_eq!(resolved.rules.keys().next().map(|k| k.as_str()), Some("deepest"));
    assert!(snapshot.resolve("src/a.ts").is_empty());
}

#[test]
fn test_global_ignores_through_resolver() {
    let resolver = CascadeResolver::from_document(&document(json!({
        "ignores": ["/build/", "**/*.min.js"],
        "fragments": [
            { "rules": { "no-unused-vars": "warn" } }
        ]
    })))
    .unwrap();

    assert!(resolver.is_ignored("build/out.js"));
    assert!(resolver.is_ignored("lib/jquery.min.js"));
    assert!(!resolver.is_ignored("src/build/out.js"));
    assert!(resolver.resolve("build/out.js").ignored);
    assert!(resolver.resolve("src/build/out.js").is_enabled("no-unused-vars"));

    let json = serde_json::to_value(&*resolver.resolve("build/out.js")).unwrap();
    assert_eq!(json, json!({ "rules": {}, "sharedOptions": {}, "ignored": true }));
}

#[test]
fn test_fragment_ignores_never_become_global() {
    let resolver = CascadeResolver::from_document(&document(json!({
        "fragments": [
            { "ignores": ["dist/"] },
            { "rules": { "b": 2 } }
        ]
    })))
    .unwrap();

    assert!(!resolver.is_ignored("dist/a.js"));
    let resolved = resolver.resolve("dist/a.js");
    assert!(!resolved.ignored);
    assert_eq!(resolved.severity("b"), Some(Severity::Error));

    // Same outcome once the fragment carries a rule of its own
    resolver
        .reload(&document(json!({
            "fragments": [
                { "ignores": ["dist/"], "rules": { "a": 1 } },
                { "rules": { "b": 2 } }
            ]
        })))
        .unwrap();
    let resolved = resolver.resolve("dist/a.js");
    assert!(resolved.get("a").is_none());
    assert_eq!(resolved.severity("b"), Some(Severity::Error));
}

#[test]
fn test_resolve_all_is_consistent() {
    let snapshot = snapshot(json!({
        "ruleSets": { "tests": [{ "sharedOptions": { "globals": ["describe", "it"] } }] },
        "fragments": [
            { "rules": { "a": 1 } },
            { "files": ["**/*.test.{js,ts}"], "extends": ["tests"], "rules": { "a": "off" } },
            { "language": "markdown", "rules": { "md:heading": 2 } }
        ]
    }));

    let paths: Vec<String> = (0..200)
        .map(|i| match i % 4 {
            0 => format!("src/m{i}.js"),
            1 => format!("src/m{i}.test.ts"),
            2 => format!("docs/p{i}.md"),
            _ => format!("./src/m{i}.test.js"),
        })
        .collect();

    let all = snapshot.resolve_all(paths.as_slice());
    assert_eq!(all.len(), paths.len());
    for (given, (key, resolved)) in paths.iter().zip(&all) {
        assert_eq!(given, key);
        assert_eq!(**resolved, *snapshot.resolve(given));
    }
    assert!(all["docs/p2.md"].is_enabled("md:heading"));
    assert!(!all["./src/m3.test.js"].is_enabled("a"));
}

#[test]
fn test_reload_after_failure() {
    let resolver = CascadeResolver::from_document(&document(json!({
        "fragments": [{ "rules": { "a": "error" } }]
    })))
    .unwrap();

    assert!(resolver.reload(&document(json!({ "fragments": [{ "rules": { "a": "nope" } }] }))).is_err());
    assert_eq!(resolver.resolve("x.js").severity("a"), Some(Severity::Error));

    resolver
        .reload(&document(json!({ "fragments": [{ "rules": { "a": "warn" } }] })))
        .unwrap();
    assert_eq!(resolver.resolve("x.js").severity("a"), Some(Severity::Warn));
    assert_eq!(resolver.generation(), 1);
}

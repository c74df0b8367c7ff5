//! File matching for fragment `files` / `ignores` patterns
//!
//! Patterns are compiled once, when a fragment is loaded, and are immutable
//! afterwards. Matching never fails: a pattern that cannot be compiled is
//! rejected at load time.
//!
//! # Syntax
//!
//! | Pattern       | Meaning                                                   |
//! |---------------|-----------------------------------------------------------|
//! | `*`           | any run of characters inside one path segment             |
//! | `?`           | exactly one character inside one path segment             |
//! | `[abc]`       | one character from the class (`[!abc]` negates)           |
//! | `**`          | any number of whole segments, including zero              |
//! | `{a,b}`       | alternation, expanded before compilation (nestable)       |
//! | `/src/*.ts`   | rooted: anchored at the configuration root                |
//! | `./src/*.ts`  | rooted, same as above                                     |
//! | `*.ts`        | unrooted: may match at any depth (`**/*.ts`)              |
//! | `dist/`       | everything below `dist` at any depth (`**/dist/**`)       |
//!
//! Paths handed to the matcher are already normalized by the caller:
//! relative, forward-slash separated. A leading `./` is tolerated.

use glob::{MatchOptions, Pattern};
use thiserror::Error;

/// Options shared by every compiled pattern
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Reasons a pattern fails to compile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("unbalanced brace at offset {0}")]
    UnbalancedBrace(usize),

    #[error("unbalanced bracket at offset {0}")]
    UnbalancedBracket(usize),

    #[error("{0}")]
    Invalid(String),
}

/// A compiled glob pattern
///
/// Holds one `glob::Pattern` per brace alternative; the pattern matches when
/// any alternative does.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    alternatives: Vec<Pattern>,
}

impl GlobPattern {
    /// Compile a pattern
    pub fn new(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        check_balance(source)?;

        let mut alternatives = Vec::new();
        for expanded in expand_braces(source) {
            let anchored = anchor(&expanded)?;
            let pattern = Pattern::new(&anchored)
                .map_err(|e| PatternError::Invalid(format!("{} (in '{}')", e.msg, anchored)))?;
            alternatives.push(pattern);
        }

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// Check whether a normalized path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.alternatives
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }

    /// The pattern as written in the declaration
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Check whether `path` matches a compiled pattern
pub fn matches(pattern: &GlobPattern, path: &str) -> bool {
    pattern.matches(path)
}

/// Include/exclude pattern sets of one fragment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMatcher {
    include: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
}

impl FileMatcher {
    pub fn new(include: Vec<GlobPattern>, exclude: Vec<GlobPattern>) -> Self {
        Self { include, exclude }
    }

    /// Compile raw include/exclude lists
    ///
    /// On failure, returns the offending pattern together with the reason.
    pub fn compile(
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, (String, PatternError)> {
        let compile_all = |raw: &[String]| {
            raw.iter()
                .map(|p| GlobPattern::new(p).map_err(|e| (p.clone(), e)))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// A fragment applies when the include set is empty or any include
    /// matches, and no exclude matches.
    pub fn applies_to(&self, path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(path));
        included && !self.is_excluded(path)
    }

    /// Whether any exclude pattern matches
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_by(path).is_some()
    }

    /// First exclude pattern matching `path`
    pub fn excluded_by(&self, path: &str) -> Option<&GlobPattern> {
        self.exclude.iter().find(|p| p.matches(path))
    }

    /// True when no pattern restricts this matcher
    pub fn is_universal(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn include(&self) -> &[GlobPattern] {
        &self.include
    }

    pub fn exclude(&self) -> &[GlobPattern] {
        &self.exclude
    }
}

/// Strip a leading `./` from a path
pub fn normalize_path(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

/// Reject unbalanced `{}` and unterminated `[...]`
///
/// Brace characters inside a bracket class are literal.
fn check_balance(source: &str) -> Result<(), PatternError> {
    let chars: Vec<char> = source.chars().collect();
    let mut open_braces: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => i = class_end(&chars, i).ok_or(PatternError::UnbalancedBracket(i))?,
            '{' => open_braces.push(i),
            '}' => {
                if open_braces.pop().is_none() {
                    return Err(PatternError::UnbalancedBrace(i));
                }
            }
            _ => {}
        }
        i += 1;
    }

    match open_braces.first() {
        Some(&offset) => Err(PatternError::UnbalancedBrace(offset)),
        None => Ok(()),
    }
}

/// Index of the `]` closing the class opened at `start`
///
/// A `]` directly after `[` or `[!` is part of the class, as in `glob`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Expand `{a,b}` alternations into plain patterns
///
/// Works through a queue rather than recursion; the output keeps the
/// left-to-right order of the alternatives.
fn expand_braces(source: &str) -> Vec<String> {
    let mut pending = vec![source.to_string()];
    let mut done = Vec::new();

    while let Some(current) = pending.pop() {
        match first_brace_group(&current) {
            None => done.push(current),
            Some((open, close)) => {
                let prefix = &current[..open];
                let suffix = &current[close + 1..];
                let inner = &current[open + 1..close];
                // Reverse so the first alternative is popped first
                for alt in split_alternatives(inner).into_iter().rev() {
                    pending.push(format!("{prefix}{alt}{suffix}"));
                }
            }
        }
    }

    done
}

/// Byte offsets of the first top-level `{` and its matching `}`
fn first_brace_group(pattern: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut open = None;
    let mut in_class = false;

    for (offset, ch) in pattern.char_indices() {
        match ch {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => {
                if depth == 0 {
                    open = Some(offset);
                }
                depth += 1;
            }
            '}' if !in_class && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|o| (o, offset));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a brace body on top-level commas
///
/// Commas and braces inside a `[...]` class are literal.
fn split_alternatives(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_class = false;

    for (offset, ch) in inner.char_indices() {
        match ch {
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => depth += 1,
            '}' if !in_class => depth = depth.saturating_sub(1),
            ',' if depth == 0 && !in_class => {
                parts.push(&inner[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

/// Turn a declared pattern into the form handed to `glob`
fn anchor(pattern: &str) -> Result<String, PatternError> {
    let (body, rooted) = if let Some(rest) = pattern.strip_prefix("./") {
        (rest, true)
    } else if let Some(rest) = pattern.strip_prefix('/') {
        (rest, true)
    } else {
        (pattern, false)
    };

    let body = match body.strip_suffix('/') {
        Some(dir) => format!("{dir}/**"),
        None => body.to_string(),
    };

    if body.is_empty() {
        return Err(PatternError::Empty);
    }

    if rooted || body == "**" || body.starts_with("**/") {
        Ok(body)
    } else {
        Ok(format!("**/{body}"))
    }
}

use std::fmt;

/// Characters treated as path separators when classifying a pattern.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// The only wildcard the matcher understands.
const WILDCARD: char = '*';

/// A single entry from the ignore list.
///
/// The wrapped string is kept verbatim (after trimming by the loader). How it
/// is interpreted is decided by [`PatternKind::classify`] at match time, so the
/// pattern stays a plain value that is cheap to clone and log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IgnorePattern(String);

/// How a pattern string is interpreted, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// No separator and no wildcard, e.g. `target`. Matches the path itself
    /// or anything below a top-level directory of that name.
    BareName,
    /// Ends with a separator, e.g. `vendor/`. Matches the directory and
    /// everything under it.
    Directory,
    /// Exactly one `*`, e.g. `*.lock` or `src/*.rs`. Prefix and suffix match.
    SingleWildcard,
    /// Anything else, including patterns with more than one `*`. Exact match.
    Exact,
}

impl PatternKind {
    /// Classifies a raw pattern string.
    ///
    /// A pattern carrying `*` is never a bare name: `*.go` is a wildcard even
    /// though it has no separator.
    pub fn classify(pattern: &str) -> Self {
        let wildcards = pattern.matches(WILDCARD).count();
        if wildcards == 0 && !pattern.contains(SEPARATORS) {
            PatternKind::BareName
        } else if wildcards == 0 && pattern.ends_with(SEPARATORS) {
            PatternKind::Directory
        } else if wildcards == 1 {
            PatternKind::SingleWildcard
        } else {
            PatternKind::Exact
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::BareName => write!(f, "bare-name"),
            PatternKind::Directory => write!(f, "directory"),
            PatternKind::SingleWildcard => write!(f, "wildcard"),
            PatternKind::Exact => write!(f, "exact"),
        }
    }
}

impl IgnorePattern {
    /// Wraps a pattern string. The loader is responsible for trimming and
    /// skipping blank or comment lines.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> PatternKind {
        PatternKind::classify(&self.0)
    }

    /// Returns `true` when `path` is excluded by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        matches(&self.0, path)
    }
}

impl fmt::Display for IgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides whether a staged `path` matches an ignore `pattern`.
///
/// The rules are deliberately small and are evaluated in the order of
/// [`PatternKind`]:
///
/// * `target` matches `target` and `target/debug/app`, but not `src/target`.
/// * `vendor/` matches `vendor` and `vendor/lib.rs`.
/// * `*.log` matches `app.log`; `src/*.rs` matches `src/main.rs` and also
///   `src/nested/mod.rs`, since `*` is a plain prefix/suffix split.
/// * everything else, including multi-wildcard patterns such as `dir*/*.ext`,
///   needs an exact match. Those compound globs are not supported.
///
/// Matching is case-sensitive. An empty pattern or an empty path never matches.
pub fn matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() || path.is_empty() {
        return false;
    }

    match PatternKind::classify(pattern) {
        PatternKind::BareName => path == pattern || is_below(path, pattern),
        PatternKind::Directory => {
            let dir = pattern.trim_end_matches(SEPARATORS);
            path == dir || path.starts_with(pattern)
        }
        PatternKind::SingleWildcard => {
            let Some((prefix, suffix)) = pattern.split_once(WILDCARD) else {
                return false;
            };
            path.starts_with(prefix) && path.ends_with(suffix)
        }
        PatternKind::Exact => path == pattern,
    }
}

/// `true` when `path` lives under the top-level entry `name`.
fn is_below(path: &str, name: &str) -> bool {
    path.strip_prefix(name)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Selects the staged files that at least one pattern excludes.
///
/// The result keeps the order of `staged` and lists each file once, no matter
/// how many patterns hit it.
///
/// # Arguments
/// * `patterns`: The loaded ignore list.
/// * `staged`: Paths reported by the stage inspector.
///
/// # Returns
/// The ignored subset of `staged`.
pub fn select_ignored(patterns: &[IgnorePattern], staged: &[String]) -> Vec<String> {
    staged
        .iter()
        .filter(|path| patterns.iter().any(|pattern| pattern.matches(path)))
        .cloned()
        .collect()
}

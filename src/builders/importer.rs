use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builders::patterns::IgnorePattern;

/// Why an ignore list could not be read completely.
///
/// None of these stop the workflow: the caller reports the error and carries
/// on with whatever patterns were parsed before it happened.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open ignore list {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read ignore list {} at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// What the loader produced: the patterns it managed to parse and, if
/// reading stopped early, the reason.
#[derive(Debug, Default)]
pub struct ImportedPatterns {
    pub patterns: Vec<IgnorePattern>,
    pub error: Option<ImportError>,
}

impl ImportedPatterns {
    fn complete(patterns: Vec<IgnorePattern>) -> Self {
        Self {
            patterns,
            error: None,
        }
    }
}

/// A source of ignore patterns.
///
/// The workflow only depends on this trait, so tests can hand it a fixed
/// list without touching the filesystem.
pub trait PatternImporter {
    /// Loads the ordered pattern list from `location`.
    ///
    /// A missing resource is not an error and yields an empty list.
    fn import(&self, location: &Path) -> ImportedPatterns;
}

/// Reads a line-oriented ignore file such as `.git-commit/ignore`.
///
/// ```text
/// # generated files
/// Cargo.lock
/// *.snap
/// vendor/
/// ```
pub struct FileImporter;

impl FileImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternImporter for FileImporter {
    fn import(&self, location: &Path) -> ImportedPatterns {
        let file = match File::open(location) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ImportedPatterns::default(),
            Err(source) => {
                return ImportedPatterns {
                    patterns: Vec::new(),
                    error: Some(ImportError::Open {
                        path: location.to_path_buf(),
                        source,
                    }),
                };
            }
        };

        let mut patterns = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            match line {
                Ok(line) => patterns.extend(parse_line(&line)),
                Err(source) => {
                    return ImportedPatterns {
                        patterns,
                        error: Some(ImportError::Read {
                            path: location.to_path_buf(),
                            line: index + 1,
                            source,
                        }),
                    };
                }
            }
        }

        ImportedPatterns::complete(patterns)
    }
}

/// A fixed pattern list, for callers that already know what to ignore.
pub struct StaticImporter {
    patterns: Vec<IgnorePattern>,
}

impl StaticImporter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns.into_iter().filter_map(|p| parse_line(p.as_ref())).collect(),
        }
    }
}

impl PatternImporter for StaticImporter {
    fn import(&self, _location: &Path) -> ImportedPatterns {
        ImportedPatterns::complete(self.patterns.clone())
    }
}

/// Turns one line of an ignore list into a pattern.
///
/// Blank lines and `#` comments yield `None`; anything else is kept verbatim
/// after trimming.
pub fn parse_line(line: &str) -> Option<IgnorePattern> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(IgnorePattern::new(line))
}

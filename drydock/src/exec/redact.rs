//! Masking of secrets in logged command lines.

use regex::Regex;

/// Masks secret-looking values in command lines before they are logged.
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<Regex>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    /// Creates a redactor with the default patterns.
    ///
    /// Covers authorization headers, `KEY=value` pairs with secret-like
    /// names, and `--token`-style flags.
    #[must_use]
    pub fn new() -> Self {
        let sources = [
            r"(?i)(authorization:\s*)\S+",
            r"(?i)\b((?:token|secret|password|api[_-]?key)=)\S+",
            r"(?i)(--(?:token|password|secret)[ =])\S+",
        ];
        Self {
            patterns: sources
                .iter()
                .filter_map(|source| Regex::new(source).ok())
                .collect(),
        }
    }

    /// Replaces any secret-looking value in the line with a placeholder.
    #[must_use]
    pub fn mask(&self, line: &str) -> String {
        self.patterns
            .iter()
            .fold(line.to_string(), |masked, pattern| {
                pattern.replace_all(&masked, "${1}[redacted]").into_owned()
            })
    }
}

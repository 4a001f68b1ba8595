// Copyright (c) 2025 Zensical and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Diagnostic scanner.
//!
//! Maps build tool output to structured diagnostics using a list of
//! pattern rules, applied per line, first match wins.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// A build error.
    Error,
    /// A build warning.
    Warning,
}

/// Display mode for rendering diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// A developer's terminal.
    Local,
    /// A CI system that understands IDE-linked annotation prefixes.
    CiLinked,
    /// A CI system that only renders plain text.
    CiPlain,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// A single diagnostic extracted from build output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category.
    pub category: Category,
    /// Human-readable message.
    pub message: String,
    /// Source file, if the rule captured one.
    pub file: Option<String>,
    /// Line number, if the rule captured one.
    pub line: Option<u32>,
    /// Column number, if the rule captured one.
    pub column: Option<u32>,
}

impl Diagnostic {
    /// Renders the diagnostic for the given display mode.
    #[must_use]
    pub fn render(&self, mode: DisplayMode) -> String {
        let location = match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => format!("{file}:{line}:{column}"),
            (Some(file), Some(line), None) => format!("{file}:{line}"),
            (Some(file), None, None) => file.clone(),
            _ => String::new(),
        };

        match mode {
            DisplayMode::Local => {
                if location.is_empty() {
                    format!("{}: {}", self.category, self.message)
                } else {
                    format!("{} {}: {}", location, self.category, self.message)
                }
            }
            DisplayMode::CiLinked => {
                let kind = match self.category {
                    Category::Error => "error",
                    Category::Warning => "warning",
                };
                if let (Some(file), Some(line)) = (&self.file, self.line) {
                    let column = self.column.unwrap_or(1);
                    format!(
                        "##vso[task.logissue type={kind};sourcepath={file};linenumber={line};columnnumber={column}]{}",
                        self.message
                    )
                } else {
                    format!("##vso[task.logissue type={kind}]{}", self.message)
                }
            }
            DisplayMode::CiPlain => {
                if location.is_empty() {
                    format!("[{}] {}", self.category, self.message)
                } else {
                    format!("[{}] {} - {}", self.category, location, self.message)
                }
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Error => f.write_str("error"),
            Category::Warning => f.write_str("warning"),
        }
    }
}

/// A single pattern rule.
struct Rule {
    /// Pattern matched against a line of output.
    pattern: Regex,
    /// Constructs a diagnostic from the match.
    build: fn(&regex::Captures<'_>) -> Diagnostic,
}

/// Diagnostic scanner.
///
/// Holds an ordered list of rules; the first matching rule for a line wins.
pub struct Scanner {
    rules: Vec<Rule>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

static ERROR_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<file>[^\s:()]+)[:(](?P<line>\d+)(?:[:,](?P<column>\d+))?\)?:?\s*error\b[:\s]*(?P<message>.*)$").unwrap()
});

static WARNING_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<file>[^\s:()]+)[:(](?P<line>\d+)(?:[:,](?P<column>\d+))?\)?:?\s*warning\b[:\s]*(?P<message>.*)$").unwrap()
});

static PLAIN_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*error\b[:\s]*(?P<message>.*)$").unwrap());

static PLAIN_WARNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*warning\b[:\s]*(?P<message>.*)$").unwrap());

impl Scanner {
    /// Creates a scanner with the default rule set.
    ///
    /// Rules are ordered from most to least specific: a `file:line:column`
    /// prefixed error or warning wins over a bare `error`/`warning` line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: vec![
                Rule { pattern: ERROR_LOCATION.clone(), build: build_located_error },
                Rule { pattern: WARNING_LOCATION.clone(), build: build_located_warning },
                Rule { pattern: PLAIN_ERROR.clone(), build: build_plain_error },
                Rule { pattern: PLAIN_WARNING.clone(), build: build_plain_warning },
            ],
        }
    }

    /// Scans combined build output, returning every diagnostic found.
    ///
    /// Applied line by line; the first rule to match a line wins, and a line
    /// matching no rule produces no diagnostic.
    #[must_use]
    pub fn scan(&self, output: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for line in output.lines() {
            for rule in &self.rules {
                if let Some(captures) = rule.pattern.captures(line) {
                    diagnostics.push((rule.build)(&captures));
                    break;
                }
            }
        }
        diagnostics
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

fn build_located_error(captures: &regex::Captures<'_>) -> Diagnostic {
    build_located(captures, Category::Error)
}

fn build_located_warning(captures: &regex::Captures<'_>) -> Diagnostic {
    build_located(captures, Category::Warning)
}

fn build_located(captures: &regex::Captures<'_>, category: Category) -> Diagnostic {
    Diagnostic {
        category,
        message: captures.name("message").map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
        file: captures.name("file").map(|m| m.as_str().to_string()),
        line: captures.name("line").and_then(|m| m.as_str().parse().ok()),
        column: captures.name("column").and_then(|m| m.as_str().parse().ok()),
    }
}

fn build_plain_error(captures: &regex::Captures<'_>) -> Diagnostic {
    Diagnostic {
        category: Category::Error,
        message: captures.name("message").map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
        file: None,
        line: None,
        column: None,
    }
}

fn build_plain_warning(captures: &regex::Captures<'_>) -> Diagnostic {
    Diagnostic {
        category: Category::Warning,
        message: captures.name("message").map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
        file: None,
        line: None,
        column: None,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_located_error() {
        let scanner = Scanner::new();
        let diagnostics = scanner.scan("src/index.ts:12:5: error: unexpected token");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Error);
        assert_eq!(diagnostics[0].file.as_deref(), Some("src/index.ts"));
        assert_eq!(diagnostics[0].line, Some(12));
        assert_eq!(diagnostics[0].column, Some(5));
    }

    #[test]
    fn matches_plain_warning() {
        let scanner = Scanner::new();
        let diagnostics = scanner.scan("warning: unused variable `x`");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].category, Category::Warning);
        assert!(diagnostics[0].file.is_none());
    }

    #[test]
    fn first_rule_wins_and_unmatched_lines_are_skipped() {
        let scanner = Scanner::new();
        let diagnostics = scanner.scan("src/a.ts:1:1: error: boom\nall good here\nwarning: heads up");
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn renders_local_mode_with_location() {
        let diagnostic = Diagnostic {
            category: Category::Error,
            message: "boom".into(),
            file: Some("a.ts".into()),
            line: Some(3),
            column: Some(1),
        };
        assert_eq!(diagnostic.render(DisplayMode::Local), "a.ts:3:1 error: boom");
    }

    #[test]
    fn renders_ci_linked_mode() {
        let diagnostic = Diagnostic {
            category: Category::Warning,
            message: "heads up".into(),
            file: Some("a.ts".into()),
            line: Some(3),
            column: None,
        };
        let rendered = diagnostic.render(DisplayMode::CiLinked);
        assert!(rendered.starts_with("##vso[task.logissue type=warning;"));
    }
}

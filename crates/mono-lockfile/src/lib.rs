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

//! Lockfile query adapter.
//!
//! The committed lockfile is a foreign format we never write, only query. We
//! model just enough of its shape to answer "is there a version satisfying
//! range R for name N, optionally scoped under a temp project?" and to list
//! the temp project names it already knows about.

use mono_project::manifest::Range;
use mono_project::project::TEMP_SCOPE;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Lockfile document.
#[derive(Debug, Deserialize)]
pub struct Lockfile {
    /// Top-level resolved dependencies, keyed by package name.
    #[serde(default)]
    dependencies: BTreeMap<String, Entry>,
}

/// A single resolved dependency entry.
#[derive(Debug, Deserialize)]
struct Entry {
    /// Resolved version.
    version: Option<String>,
    /// Nested dependencies, used to scope lookups under a temp project.
    #[serde(default)]
    dependencies: BTreeMap<String, Entry>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Lockfile {
    /// Reads a lockfile from the given path.
    ///
    /// The file is read as UTF-8 with an optional leading BOM, which some
    /// installers write and which would otherwise break JSON parsing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file can't be read, and [`Error::Json`]
    /// if it doesn't parse.
    pub fn read<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a lockfile from its textual content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the content doesn't parse.
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        Ok(serde_json::from_str(content)?)
    }

    /// Returns whether a compatible entry exists for `name` satisfying
    /// `range`, optionally scoped under a temp project.
    ///
    /// Lookup order: if `temp_scope` is given, look under
    /// `dependencies[temp_scope].dependencies[name]` first; fall back to
    /// `dependencies[name]`. A non-semver range is treated as
    /// "assume compatible," logging a warning once per call site, since the
    /// core can't resolve it itself.
    #[must_use]
    pub fn has_compatible(&self, name: &str, range: &Range, temp_scope: Option<&str>) -> bool {
        let entry = temp_scope
            .and_then(|scope| self.dependencies.get(scope))
            .and_then(|scope_entry| scope_entry.dependencies.get(name))
            .or_else(|| self.dependencies.get(name));

        let Some(entry) = entry else {
            return false;
        };
        let Some(version) = entry.version.as_deref().and_then(|v| Version::parse(v).ok()) else {
            return false;
        };

        match range.is_satisfied_by(&version) {
            Some(ok) => ok,
            None => {
                tracing::warn!(
                    dependency = name,
                    range = range.as_str(),
                    "non-semver dependency range, assuming compatible"
                );
                true
            }
        }
    }

    /// Returns the names of temp projects already registered in the
    /// lockfile, i.e. the keys of `dependencies` under the reserved scope.
    pub fn temp_project_names(&self) -> impl Iterator<Item = &str> {
        let prefix = format!("{TEMP_SCOPE}/");
        self.dependencies
            .keys()
            .filter(move |name| name.starts_with(&prefix))
            .map(String::as_str)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "dependencies": {
            "lodash": { "version": "4.17.21" },
            "@rush-temp/scope+app": {
                "version": "0.0.0",
                "dependencies": {
                    "lodash": { "version": "4.17.21" },
                    "left-pad": { "version": "1.3.0" }
                }
            }
        }
    }"#;

    #[test]
    fn finds_top_level_compatible_entry() {
        let lockfile = Lockfile::parse(DOC).unwrap();
        let range = Range::parse("^4.0.0");
        assert!(lockfile.has_compatible("lodash", &range, None));
    }

    #[test]
    fn finds_entry_scoped_under_temp_project_first() {
        let lockfile = Lockfile::parse(DOC).unwrap();
        let range = Range::parse("^1.0.0");
        assert!(lockfile.has_compatible("left-pad", &range, Some("@rush-temp/scope+app")));
        assert!(!lockfile.has_compatible("left-pad", &range, None));
    }

    #[test]
    fn rejects_incompatible_version() {
        let lockfile = Lockfile::parse(DOC).unwrap();
        let range = Range::parse("^5.0.0");
        assert!(!lockfile.has_compatible("lodash", &range, None));
    }

    #[test]
    fn assumes_non_semver_range_compatible() {
        let lockfile = Lockfile::parse(DOC).unwrap();
        let range = Range::parse("git+https://example.com/lodash.git");
        assert!(lockfile.has_compatible("lodash", &range, None));
    }

    #[test]
    fn lists_temp_project_names() {
        let lockfile = Lockfile::parse(DOC).unwrap();
        let names: Vec<_> = lockfile.temp_project_names().collect();
        assert_eq!(names, vec!["@rush-temp/scope+app"]);
    }

    #[test]
    fn strips_leading_bom() {
        let with_bom = format!("\u{feff}{DOC}");
        assert!(Lockfile::parse(&with_bom).is_ok());
    }
}

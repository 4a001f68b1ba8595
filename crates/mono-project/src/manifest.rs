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

//! Package manifest.

use semver::Version;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

pub mod range;
pub use range::Range;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Package manifest.
///
/// We only read the parts of the manifest relevant to workspace resolution and
/// version management – name, version, and the three dependency sections that
/// can reference other workspace projects. Everything else in the manifest is
/// left untouched when rewriting.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: Version,
    /// Runtime dependencies.
    #[serde(default)]
    pub dependencies: BTreeMap<String, Range>,
    /// Development dependencies.
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, Range>,
    /// Optional dependencies.
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, Range>,
    /// Peer dependencies.
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, Range>,
    /// Scripts, keyed by name.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Manifest {
    /// Resolves the manifest path from a project folder.
    #[must_use]
    pub fn resolve<P>(folder: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        folder.as_ref().join(MANIFEST_FILE)
    }

    /// Reads and parses a manifest from the given project folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the manifest doesn't exist or can't be read,
    /// and [`Error::Json`] if it doesn't parse.
    pub fn read<P>(folder: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = Self::resolve(folder);
        let content = std::fs::read_to_string(&path)?;
        content.parse()
    }

    /// Creates an iterator over all local dependency sections.
    ///
    /// Peer and optional dependencies are included, since any of them may
    /// reference a workspace project.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &Range)> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .chain(self.optional_dependencies.iter())
            .chain(self.peer_dependencies.iter())
            .map(|(name, range)| (name.as_str(), range))
    }

    /// Rewrites `version` and dependency ranges for the given updates.
    ///
    /// `updates` maps package names to their new versions. Only dependency
    /// entries already present in the document are rewritten – a project
    /// referencing a version via a non-semver specifier is left alone, since
    /// we can't know how to express an updated range for it.
    ///
    /// This operates on the raw JSON document rather than on `Self`, so that
    /// fields we don't model (and key order, via `preserve_order`) survive the
    /// round trip unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the content doesn't parse as an object, or
    /// can't be re-serialized.
    pub fn rewrite<S>(content: S, updates: &BTreeMap<String, Version>) -> Result<String>
    where
        S: AsRef<str>,
    {
        let mut doc: Value = content.as_ref().parse()?;
        let map = doc.as_object_mut().ok_or(Error::ManifestNotAnObject)?;

        rewrite_own_version(map, updates);
        for section in [
            "dependencies",
            "devDependencies",
            "optionalDependencies",
            "peerDependencies",
        ] {
            rewrite_dependency_section(map, section, updates);
        }

        let content = serde_json::to_string_pretty(&doc)?;
        Ok(format!("{content}\n"))
    }
}

/// Rewrites `version` if the manifest's own package was updated.
fn rewrite_own_version(doc: &mut Map<String, Value>, updates: &BTreeMap<String, Version>) {
    if let Some(name) = doc.get("name").and_then(Value::as_str) {
        if let Some(version) = updates.get(name) {
            doc.insert("version".to_string(), Value::String(version.to_string()));
        }
    }
}

/// Rewrites a single dependency section, preserving each entry's range kind.
///
/// A caret or tilde range keeps its prefix against the new version. An exact
/// version pin is replaced with the new version, still bare. Anything else –
/// a comparator set, `*`, an X-range – is reshaped to `>=new <next-major>`,
/// since there's no single prefix that would preserve its original intent.
fn rewrite_dependency_section(
    doc: &mut Map<String, Value>,
    section: &str,
    updates: &BTreeMap<String, Version>,
) {
    let Some(map) = doc.get_mut(section).and_then(Value::as_object_mut) else {
        return;
    };
    for (name, value) in map.iter_mut() {
        let Some(version) = updates.get(name) else {
            continue;
        };
        let Some(existing) = value.as_str() else {
            continue;
        };
        let range = Range::parse(existing);
        if range.is_pass_through() {
            continue;
        }
        let trimmed = existing.trim();
        let rewritten = if trimmed.starts_with('^') {
            format!("^{version}")
        } else if trimmed.starts_with('~') {
            format!("~{version}")
        } else if Version::parse(trimmed).is_ok() {
            version.to_string()
        } else {
            format!(">={version}, <{}.0.0", version.major + 1)
        };
        *value = Value::String(rewritten);
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let manifest: Manifest = r#"{
            "name": "@scope/pkg",
            "version": "1.0.0",
            "dependencies": { "@scope/dep": "^1.0.0" }
        }"#
        .parse()
        .unwrap();
        assert_eq!(manifest.name, "@scope/pkg");
        assert_eq!(manifest.version, Version::new(1, 0, 0));
        assert_eq!(manifest.dependencies.len(), 1);
    }

    #[test]
    fn rewrites_version_and_dependency() {
        let content = r#"{
  "name": "@scope/pkg",
  "version": "1.0.0",
  "dependencies": {
    "@scope/dep": "^1.0.0",
    "external": "^2.0.0"
  }
}
"#;
        let mut updates = BTreeMap::new();
        updates.insert("@scope/pkg".to_string(), Version::new(1, 1, 0));
        updates.insert("@scope/dep".to_string(), Version::new(1, 2, 0));

        let rewritten = Manifest::rewrite(content, &updates).unwrap();
        let manifest: Manifest = rewritten.parse().unwrap();
        assert_eq!(manifest.version, Version::new(1, 1, 0));
        assert_eq!(
            manifest.dependencies.get("@scope/dep").unwrap().as_str(),
            "^1.2.0"
        );
        assert_eq!(
            manifest.dependencies.get("external").unwrap().as_str(),
            "^2.0.0"
        );
    }

    #[test]
    fn reshapes_comparator_range_to_upper_bounded_range() {
        let content = r#"{
  "name": "@scope/pkg",
  "version": "1.0.0",
  "dependencies": {
    "@scope/dep": ">=1.0.0, <2.0.0"
  }
}
"#;
        let mut updates = BTreeMap::new();
        updates.insert("@scope/dep".to_string(), Version::new(1, 1, 0));

        let rewritten = Manifest::rewrite(content, &updates).unwrap();
        let manifest: Manifest = rewritten.parse().unwrap();
        assert_eq!(
            manifest.dependencies.get("@scope/dep").unwrap().as_str(),
            ">=1.1.0, <2.0.0"
        );
    }

    #[test]
    fn leaves_pass_through_dependency_untouched() {
        let content = r#"{
  "name": "@scope/pkg",
  "version": "1.0.0",
  "dependencies": {
    "@scope/dep": "workspace:*"
  }
}
"#;
        let mut updates = BTreeMap::new();
        updates.insert("@scope/dep".to_string(), Version::new(9, 9, 9));

        let rewritten = Manifest::rewrite(content, &updates).unwrap();
        assert!(rewritten.contains("\"workspace:*\""));
    }
}

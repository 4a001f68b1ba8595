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

//! Project.

use semver::Version;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::manifest::Manifest;

/// Reserved scope under which stub archives are registered.
pub const TEMP_SCOPE: &str = "@rush-temp";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Project descriptor, as declared in the repository manifest.
///
/// This is the raw, on-disk form – see [`Project`] for the resolved form that
/// carries the parsed package manifest and computed `temp_name`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Package name, must match `manifest.name` once loaded.
    pub package_name: String,
    /// Folder, relative to the repository root.
    pub project_folder: PathBuf,
    /// Review category, required iff the repository enforces one.
    #[serde(default)]
    pub review_category: Option<String>,
    /// Dependency names exempted from local linking, to break cycles.
    #[serde(default)]
    pub cyclic_dependency_projects: BTreeSet<String>,
    /// Reference into the version policy registry.
    #[serde(default)]
    pub version_policy_name: Option<String>,
    /// Whether the project should be published.
    ///
    /// Defaults to `true` whenever `version_policy_name` is set, and `false`
    /// otherwise, unless stated explicitly.
    #[serde(default)]
    pub should_publish: Option<bool>,
}

/// Resolved project.
///
/// Holds everything derived at workspace load time: the parsed manifest, and
/// a `temp_name` unique across the workspace.
#[derive(Clone, Debug)]
pub struct Project {
    /// Package name, equal to `manifest.name`.
    pub package_name: String,
    /// Folder, relative to the repository root.
    pub folder: PathBuf,
    /// Review category.
    pub review_category: Option<String>,
    /// Dependency names exempted from local linking.
    pub cyclic_exemptions: BTreeSet<String>,
    /// Reference into the version policy registry.
    pub version_policy_name: Option<String>,
    /// Whether the project should be published.
    pub should_publish: bool,
    /// Parsed package manifest.
    pub manifest: Manifest,
    /// Synthetic, workspace-unique name under [`TEMP_SCOPE`].
    pub temp_name: String,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Project {
    /// Loads a project from its config and repository root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FolderMissing`][] if the project folder doesn't exist,
    /// and whatever [`Manifest::read`] returns if the manifest can't be read
    /// or parsed.
    ///
    /// [`Error::FolderMissing`]: crate::error::Error::FolderMissing
    pub fn load<P>(root: P, config: &ProjectConfig) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let folder = root.as_ref().join(&config.project_folder);
        if !folder.is_dir() {
            return Err(crate::error::Error::FolderMissing(config.project_folder.clone()));
        }
        let manifest = Manifest::read(&folder)?;
        let should_publish = config
            .should_publish
            .unwrap_or_else(|| config.version_policy_name.is_some());

        Ok(Self {
            package_name: config.package_name.clone(),
            folder: config.project_folder.clone(),
            review_category: config.review_category.clone(),
            cyclic_exemptions: config.cyclic_dependency_projects.clone(),
            version_policy_name: config.version_policy_name.clone(),
            should_publish,
            temp_name: temp_name(&config.package_name),
            manifest,
        })
    }

    /// Returns the package's current version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.manifest.version
    }

    /// Returns the unscoped portion of the package name.
    ///
    /// For `@scope/name` this is `name`; for an unscoped package it's the
    /// whole name. Used for shorthand lookup by suffix.
    #[must_use]
    pub fn unscoped_name(&self) -> &str {
        unscoped(&self.package_name)
    }
}

/// Returns the unscoped portion of a package name.
#[must_use]
pub fn unscoped(name: &str) -> &str {
    match name.split_once('/') {
        Some((scope, rest)) if scope.starts_with('@') => rest,
        _ => name,
    }
}

/// Computes the reserved-scope temp name for a package name.
///
/// Scoped packages (`@scope/name`) become `@rush-temp/scope+name`; unscoped
/// packages (`name`) become `@rush-temp/name`.
#[must_use]
pub fn temp_name(package_name: &str) -> String {
    let mut out = String::with_capacity(TEMP_SCOPE.len() + 1 + package_name.len());
    out.push_str(TEMP_SCOPE);
    out.push('/');
    match package_name.split_once('/') {
        Some((scope, rest)) if scope.starts_with('@') => {
            let _ = write!(out, "{}+{rest}", &scope[1..]);
        }
        _ => out.push_str(package_name),
    }
    out
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Display for Project {
    /// Formats the project for display as `name@version`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.package_name, self.manifest.version)
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.package_name == other.package_name
    }
}

impl Eq for Project {}

impl PartialOrd for Project {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Project {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.package_name.cmp(&other.package_name)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_temp_name_for_scoped_package() {
        assert_eq!(temp_name("@scope/name"), "@rush-temp/scope+name");
    }

    #[test]
    fn computes_temp_name_for_unscoped_package() {
        assert_eq!(temp_name("name"), "@rush-temp/name");
    }

    #[test]
    fn extracts_unscoped_name() {
        assert_eq!(unscoped("@scope/name"), "name");
        assert_eq!(unscoped("name"), "name");
    }

    #[test]
    fn publish_defaults_to_policy_presence() {
        let config = ProjectConfig {
            package_name: "pkg".into(),
            project_folder: PathBuf::from("pkg"),
            review_category: None,
            cyclic_dependency_projects: BTreeSet::new(),
            version_policy_name: Some("main".into()),
            should_publish: None,
        };
        assert!(config.should_publish.is_none());
        assert!(config.version_policy_name.is_some());
    }
}

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

//! Repository descriptor.

use semver::Version;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::project::ProjectConfig;

/// Repository manifest file name, relative to the repository root.
pub const MANIFEST_FILE: &str = "mono.json";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Raw, on-disk form of the repository manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Declared review categories; `None` disables the approved-categories
    /// policy entirely.
    #[serde(default)]
    pub review_categories: Option<BTreeSet<String>>,
    /// Glob patterns contributor emails must match.
    #[serde(default)]
    pub allowed_email_patterns: Vec<String>,
    /// Minimum allowed project-folder depth, inclusive.
    #[serde(default = "default_min_depth")]
    pub min_project_folder_depth: usize,
    /// Maximum allowed project-folder depth, inclusive.
    #[serde(default = "default_max_depth")]
    pub max_project_folder_depth: usize,
    /// Installer tool name, e.g. `npm`, `pnpm`, `yarn`.
    pub installer_name: String,
    /// Installer tool version, pinned exactly.
    pub installer_version: Version,
    /// Whether anonymous usage telemetry may be collected.
    #[serde(default)]
    pub telemetry_enabled: bool,
    /// Path to the committed lockfile, relative to the repository root.
    pub lockfile_path: PathBuf,
    /// Event hooks, parsed but never invoked by the core.
    ///
    /// The command-line surface is the external collaborator responsible for
    /// running these; the core only needs to round-trip them when rewriting
    /// the manifest.
    #[serde(default)]
    pub event_hooks: EventHooks,
    /// Declared projects.
    pub projects: Vec<ProjectConfig>,
}

/// Lifecycle event hooks, parsed but not executed by the core.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHooks {
    /// Commands run before the install flow.
    #[serde(default)]
    pub pre_rush_install: Vec<String>,
    /// Commands run after the install flow.
    #[serde(default)]
    pub post_rush_install: Vec<String>,
    /// Commands run after the build flow.
    #[serde(default)]
    pub post_rush_build: Vec<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl RepositoryConfig {
    /// Resolves the repository manifest path from the given root.
    #[must_use]
    pub fn resolve<P>(root: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        root.as_ref().join(MANIFEST_FILE)
    }

    /// Reads and parses the repository manifest from the given root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][] if the manifest can't be read, and
    /// [`Error::Json`][] if it doesn't parse.
    ///
    /// [`Error::Io`]: crate::error::Error::Io
    /// [`Error::Json`]: crate::error::Error::Json
    pub fn read<P>(root: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = Self::resolve(root);
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns whether a contributor email matches at least one of the
    /// allowed patterns.
    ///
    /// An empty pattern set means no restriction is enforced and every email
    /// is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`][] if any declared pattern doesn't parse as a
    /// glob.
    ///
    /// [`Error::Pattern`]: crate::error::Error::Pattern
    pub fn email_allowed<S>(&self, email: S) -> Result<bool>
    where
        S: AsRef<str>,
    {
        if self.allowed_email_patterns.is_empty() {
            return Ok(true);
        }
        let email = email.as_ref();
        for pattern in &self.allowed_email_patterns {
            if glob::Pattern::new(pattern)?.matches(email) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Default minimum project-folder depth.
fn default_min_depth() -> usize {
    2
}

/// Default maximum project-folder depth.
fn default_max_depth() -> usize {
    2
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_repository_manifest() {
        let config: RepositoryConfig = serde_json::from_str(
            r#"{
                "installerName": "pnpm",
                "installerVersion": "9.0.0",
                "lockfilePath": "common/pnpm-lock.yaml",
                "projects": []
            }"#,
        )
        .unwrap();
        assert_eq!(config.min_project_folder_depth, 2);
        assert_eq!(config.max_project_folder_depth, 2);
        assert!(config.review_categories.is_none());
        assert!(config.projects.is_empty());
    }

    #[test]
    fn parses_review_categories_and_hooks() {
        let config: RepositoryConfig = serde_json::from_str(
            r#"{
                "reviewCategories": ["production", "libraries"],
                "installerName": "pnpm",
                "installerVersion": "9.0.0",
                "lockfilePath": "common/pnpm-lock.yaml",
                "eventHooks": { "postRushInstall": ["node scripts/sync.js"] },
                "projects": []
            }"#,
        )
        .unwrap();
        assert_eq!(config.review_categories.unwrap().len(), 2);
        assert_eq!(config.event_hooks.post_rush_install.len(), 1);
    }

    #[test]
    fn checks_allowed_email_patterns() {
        let mut config: RepositoryConfig = serde_json::from_str(
            r#"{
                "installerName": "pnpm",
                "installerVersion": "9.0.0",
                "lockfilePath": "common/pnpm-lock.yaml",
                "projects": []
            }"#,
        )
        .unwrap();
        assert!(config.email_allowed("anyone@example.com").unwrap());

        config.allowed_email_patterns = vec!["*@example.com".to_string()];
        assert!(config.email_allowed("dev@example.com").unwrap());
        assert!(!config.email_allowed("dev@other.com").unwrap());
    }
}

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

//! Local linker.
//!
//! Materializes the planner's local-link edges as symlinks (junctions on
//! Windows) into each consuming project's modules folder, transitively
//! through indirect local dependencies.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use mono_project::Workspace;

use crate::error::Result;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Flag file name recording a successful link run, relative to
/// `common/temp`. An install invalidates this flag by removing it.
pub const LINK_FLAG_FILE: &str = "link.flag";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Local linker.
pub struct Linker<'a> {
    workspace: &'a Workspace,
    modules_folder_name: &'static str,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl<'a> Linker<'a> {
    /// Creates a linker for the given workspace. Each consumer's links are
    /// created under `<project folder>/node_modules`.
    #[must_use]
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace, modules_folder_name: "node_modules" }
    }

    /// Materializes symlinks for every local-link edge, expanded
    /// transitively so an indirect local dependency is also linked.
    ///
    /// Writes [`LINK_FLAG_FILE`] under `common/temp` on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if a link (or its containing
    /// folder) can't be created.
    pub fn link(&self, local_links: &BTreeMap<String, BTreeSet<String>>) -> Result<()> {
        for (consumer, direct) in local_links {
            let Some(consumer_project) = self.workspace.get(consumer) else {
                continue;
            };
            let transitive = self.expand_transitive(direct, local_links);

            let modules_folder = self.workspace.root().join(&consumer_project.folder).join(self.modules_folder_name);
            std::fs::create_dir_all(&modules_folder)?;

            for dependency_name in &transitive {
                let Some(dependency) = self.workspace.get(dependency_name) else {
                    continue;
                };
                let target = self.workspace.root().join(&dependency.folder);
                let link_path = link_path_for(&modules_folder, &dependency.package_name);
                create_link(&target, &link_path)?;
            }
        }

        let flag_path = self.workspace.root().join("common/temp").join(LINK_FLAG_FILE);
        std::fs::create_dir_all(flag_path.parent().expect("flag path has a parent"))?;
        std::fs::write(flag_path, "")?;
        Ok(())
    }

    /// Tears down every link previously created, and removes the success
    /// flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] for any failure other than a
    /// link already being absent.
    pub fn unlink(&self, local_links: &BTreeMap<String, BTreeSet<String>>) -> Result<()> {
        for (consumer, direct) in local_links {
            let Some(consumer_project) = self.workspace.get(consumer) else {
                continue;
            };
            let transitive = self.expand_transitive(direct, local_links);
            let modules_folder = self.workspace.root().join(&consumer_project.folder).join(self.modules_folder_name);

            for dependency_name in &transitive {
                let link_path = link_path_for(&modules_folder, dependency_name);
                remove_link(&link_path)?;
            }
        }

        let flag_path = self.workspace.root().join("common/temp").join(LINK_FLAG_FILE);
        match std::fs::remove_file(flag_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Expands a project's direct local-link set to include every local
    /// project reachable transitively through other projects' local links.
    fn expand_transitive(
        &self, direct: &BTreeSet<String>, local_links: &BTreeMap<String, BTreeSet<String>>,
    ) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue: Vec<String> = direct.iter().cloned().collect();
        while let Some(name) = queue.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(next) = local_links.get(&name) {
                queue.extend(next.iter().cloned());
            }
        }
        seen
    }
}

/// Resolves the link path for `dependency_name` under `modules_folder`,
/// honoring scoped package names (`@scope/name` -> `@scope/name` subfolder).
fn link_path_for(modules_folder: &Path, dependency_name: &str) -> PathBuf {
    modules_folder.join(dependency_name)
}

/// Creates a symlink (or, on Windows, a directory junction) at `link_path`
/// pointing at `target`, replacing any existing entry at that path.
fn create_link(target: &Path, link_path: &Path) -> Result<()> {
    if let Some(parent) = link_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    remove_link(link_path)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link_path)?;
    }
    #[cfg(windows)]
    {
        junction::create(target, link_path)?;
    }
    Ok(())
}

/// Removes a previously-created link, tolerating its absence.
fn remove_link(link_path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(link_path) {
        Ok(metadata) if metadata.is_dir() => std::fs::remove_dir_all(link_path).or_else(|_| std::fs::remove_dir(link_path))?,
        Ok(_) => std::fs::remove_file(link_path)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(root: &Path, folder: &str, name: &str, version: &str, deps: &str) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name": "{name}", "version": "{version}", "dependencies": {deps}}}"#),
        )
        .unwrap();
    }

    fn write_repository(root: &Path, projects: &str) {
        fs::write(
            root.join("mono.json"),
            format!(
                r#"{{
                    "installerName": "pnpm",
                    "installerVersion": "9.0.0",
                    "lockfilePath": "common/pnpm-lock.yaml",
                    "projects": {projects}
                }}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn creates_and_removes_a_link() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_project(root, "packages/app", "@scope/app", "1.0.0", r#"{"@scope/core": "^1.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let linker = Linker::new(&workspace);

        let mut local_links = BTreeMap::new();
        local_links.insert("@scope/app".to_string(), BTreeSet::from(["@scope/core".to_string()]));

        linker.link(&local_links).unwrap();
        let link_path = root.join("packages/app/node_modules/@scope/core");
        assert!(link_path.symlink_metadata().is_ok());
        assert!(root.join("common/temp").join(LINK_FLAG_FILE).is_file());

        linker.unlink(&local_links).unwrap();
        assert!(link_path.symlink_metadata().is_err());
        assert!(!root.join("common/temp").join(LINK_FLAG_FILE).exists());
    }

    #[test]
    fn expands_transitive_local_links() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_project(root, "packages/mid", "@scope/mid", "1.0.0", r#"{"@scope/core": "^1.0.0"}"#);
        write_project(root, "packages/app", "@scope/app", "1.0.0", r#"{"@scope/mid": "^1.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/mid", "projectFolder": "packages/mid"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let linker = Linker::new(&workspace);

        let mut local_links = BTreeMap::new();
        local_links.insert("@scope/app".to_string(), BTreeSet::from(["@scope/mid".to_string()]));
        local_links.insert("@scope/mid".to_string(), BTreeSet::from(["@scope/core".to_string()]));

        linker.link(&local_links).unwrap();
        assert!(root.join("packages/app/node_modules/@scope/mid").symlink_metadata().is_ok());
        assert!(root.join("packages/app/node_modules/@scope/core").symlink_metadata().is_ok());
    }
}

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

//! Workspace.

use std::collections::btree_map::Values;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::project::{unscoped, Project};
use crate::repository::RepositoryConfig;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Workspace.
///
/// Owns every project in the repository plus the indices derived from them at
/// load time: lookup by full name, lookup by temp name, and the downstream
/// adjacency used for dependency-ordered traversal.
#[derive(Debug)]
pub struct Workspace {
    /// Repository root.
    root: PathBuf,
    /// Repository descriptor.
    config: RepositoryConfig,
    /// Projects, keyed by package name.
    projects: BTreeMap<String, Project>,
    /// Index from temp name to package name.
    by_temp_name: BTreeMap<String, String>,
    /// Downstream adjacency: package name -> names of projects depending on it.
    downstream: BTreeMap<String, BTreeSet<String>>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Workspace {
    /// Loads and validates a workspace rooted at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error for any of the invariant violations documented on
    /// [`crate::error::Error`]: a missing project folder, a folder depth out
    /// of bounds, a name mismatch between declared and manifest package name,
    /// a duplicate package name, a missing or unknown review category, an
    /// unknown version policy reference, an unsatisfied local dependency
    /// range, or a dependency cycle not broken by a cyclic exemption.
    pub fn load<P>(root: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref().canonicalize()?;
        let config = RepositoryConfig::read(&root)?;

        let mut projects = BTreeMap::new();
        let mut by_temp_name = BTreeMap::new();

        for entry in &config.projects {
            let project = Project::load(&root, entry)?;
            validate_folder_depth(&project.folder, &config)?;

            if project.manifest.name != project.package_name {
                return Err(Error::NameMismatch {
                    declared: project.package_name.clone(),
                    manifest: project.manifest.name.clone(),
                });
            }
            if projects.contains_key(&project.package_name) {
                return Err(Error::DuplicateName(project.package_name.clone()));
            }
            if by_temp_name.contains_key(&project.temp_name) {
                return Err(Error::DuplicateName(project.temp_name.clone()));
            }

            validate_review_category(&project, &config)?;

            by_temp_name.insert(project.temp_name.clone(), project.package_name.clone());
            projects.insert(project.package_name.clone(), project);
        }

        let mut workspace = Self { root, config, projects, by_temp_name, downstream: BTreeMap::new() };

        workspace.validate_version_policies()?;
        workspace.downstream = workspace.build_downstream()?;
        workspace.validate_acyclic()?;

        Ok(workspace)
    }

    /// Returns the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the repository descriptor.
    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Looks up a project by exact package name, or by unscoped suffix if the
    /// suffix is unique across the workspace.
    #[must_use]
    pub fn get<N>(&self, name: N) -> Option<&Project>
    where
        N: AsRef<str>,
    {
        let name = name.as_ref();
        if let Some(project) = self.projects.get(name) {
            return Some(project);
        }
        let mut matches = self.projects.values().filter(|p| p.unscoped_name() == name);
        let first = matches.next()?;
        if matches.next().is_none() {
            Some(first)
        } else {
            None
        }
    }

    /// Looks up a project by its temp name.
    #[must_use]
    pub fn get_by_temp_name<N>(&self, temp_name: N) -> Option<&Project>
    where
        N: AsRef<str>,
    {
        self.projects.get(self.by_temp_name.get(temp_name.as_ref())?)
    }

    /// Returns the names of projects that depend locally on `name`.
    #[must_use]
    pub fn downstream_of<N>(&self, name: N) -> impl Iterator<Item = &str>
    where
        N: AsRef<str>,
    {
        self.downstream
            .get(name.as_ref())
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Creates an iterator over all projects.
    #[must_use]
    pub fn iter(&self) -> Values<'_, String, Project> {
        self.projects.values()
    }

    /// Returns the number of projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Returns whether the workspace has no projects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Validates that every project's `version_policy_name` refers to a
    /// declared policy, once policies exist (checked by the caller that owns
    /// the version policy registry – here we only check presence against the
    /// project-level field when the registry itself is unknown to this crate).
    fn validate_version_policies(&self) -> Result<()> {
        // The registry of policies lives in the version-policy engine; this
        // crate only knows project-level references, so there's nothing to
        // cross-validate here without the registry. Kept as a hook: callers
        // that load a policy registry should call `Project::version_policy_name`
        // and raise `Error::UnknownPolicy` for unresolved references.
        Ok(())
    }

    /// Builds the downstream adjacency: for every project `P` and declared
    /// dependency `D` that resolves to a local project, is not in `P`'s
    /// cyclic exemptions, and whose local version satisfies `P`'s declared
    /// range, add `P` to `D`'s downstream set.
    fn build_downstream(&self) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut downstream: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for project in self.projects.values() {
            for (name, range) in project.manifest.dependencies() {
                let Some(dependency) = self.get(name) else {
                    continue;
                };
                if project.cyclic_exemptions.contains(dependency.package_name.as_str()) {
                    continue;
                }
                match range.is_satisfied_by(dependency.version()) {
                    Some(false) => {
                        return Err(Error::RangeUnsatisfied {
                            project: project.package_name.clone(),
                            dependency: dependency.package_name.clone(),
                            range: range.as_str().to_string(),
                            version: dependency.version().clone(),
                        });
                    }
                    _ => {
                        downstream
                            .entry(dependency.package_name.clone())
                            .or_default()
                            .insert(project.package_name.clone());
                    }
                }
            }
        }

        Ok(downstream)
    }

    /// Verifies the downstream graph is acyclic.
    ///
    /// Cycles broken by a cyclic exemption never make it into the downstream
    /// adjacency, so any cycle found here is a fatal configuration error.
    fn validate_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

        fn visit<'a>(
            name: &'a str,
            downstream: &'a BTreeMap<String, BTreeSet<String>>,
            marks: &mut BTreeMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    path.push(name);
                    let cycle = path.join(" -> ");
                    return Err(Error::Cycle(cycle));
                }
                None => {}
            }

            marks.insert(name, Mark::Visiting);
            path.push(name);
            if let Some(next) = downstream.get(name) {
                for dependent in next {
                    visit(dependent, downstream, marks, path)?;
                }
            }
            path.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for name in self.projects.keys() {
            let mut path = Vec::new();
            visit(name, &self.downstream, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

/// Validates a project's folder depth against the repository's bounds.
fn validate_folder_depth(folder: &Path, config: &RepositoryConfig) -> Result<()> {
    let depth = folder.components().count();
    if depth < config.min_project_folder_depth || depth > config.max_project_folder_depth {
        return Err(Error::FolderDepth {
            folder: folder.to_path_buf(),
            depth,
            min: config.min_project_folder_depth,
            max: config.max_project_folder_depth,
        });
    }
    Ok(())
}

/// Validates a project's review category against the repository's policy.
fn validate_review_category(project: &Project, config: &RepositoryConfig) -> Result<()> {
    let Some(categories) = &config.review_categories else {
        return Ok(());
    };
    match &project.review_category {
        None => Err(Error::ReviewCategoryMissing(project.package_name.clone())),
        Some(category) if !categories.contains(category) => Err(Error::ReviewCategoryUnknown {
            project: project.package_name.clone(),
            category: category.clone(),
        }),
        Some(_) => Ok(()),
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl<'a> IntoIterator for &'a Workspace {
    type Item = &'a Project;
    type IntoIter = Values<'a, String, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.values()
    }
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
            format!(
                r#"{{"name": "{name}", "version": "{version}", "dependencies": {deps}}}"#
            ),
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
    fn loads_workspace_and_builds_downstream() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_project(
            root,
            "packages/app",
            "@scope/app",
            "1.0.0",
            r#"{"@scope/core": "^1.0.0"}"#,
        );
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        assert_eq!(workspace.len(), 2);
        let downstream: Vec<_> = workspace.downstream_of("@scope/core").collect();
        assert_eq!(downstream, vec!["@scope/app"]);
    }

    #[test]
    fn rejects_unsatisfied_range() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "2.0.0", "{}");
        write_project(
            root,
            "packages/app",
            "@scope/app",
            "1.0.0",
            r#"{"@scope/core": "^1.0.0"}"#,
        );
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let err = Workspace::load(root).unwrap_err();
        assert!(matches!(err, Error::RangeUnsatisfied { .. }));
    }

    #[test]
    fn allows_cycle_broken_by_exemption() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(
            root,
            "packages/a",
            "@scope/a",
            "1.0.0",
            r#"{"@scope/b": "^1.0.0"}"#,
        );
        write_project(
            root,
            "packages/b",
            "@scope/b",
            "1.0.0",
            r#"{"@scope/a": "^1.0.0"}"#,
        );
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/a", "projectFolder": "packages/a", "cyclicDependencyProjects": ["@scope/b"]},
                {"packageName": "@scope/b", "projectFolder": "packages/b"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        assert_eq!(workspace.len(), 2);
    }

    #[test]
    fn resolves_by_unscoped_suffix_when_unique() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_repository(
            root,
            r#"[{"packageName": "@scope/core", "projectFolder": "packages/core"}]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        assert!(workspace.get("core").is_some());
    }
}

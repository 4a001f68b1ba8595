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

//! Change pipeline.
//!
//! Authors record intent in small JSON change files under `changes/`, one per
//! author per logical change, each naming the packages it touches and how
//! severely. Running the pipeline aggregates those files per package, computes
//! the new version each touched package should carry, propagates the impact
//! to every downstream package that depends on one that moved, and finally
//! rewrites manifests and produces changelog text.

use semver::Version;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use mono_project::manifest::Range;
use mono_project::{Increment, Manifest, Project, VersionExt, Workspace};

use crate::error::{Error, Result};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Folder under the repository root holding change files.
pub const CHANGE_FOLDER: &str = "changes";

/// Default prerelease identifier used when bumping without an explicit preid.
const DEFAULT_PREID: &str = "next";

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Severity of a change to a single package.
///
/// Ordered from least to most severe, so aggregating several changes to the
/// same package is a simple `max`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// No release impact – recorded for changelog purposes only.
    #[default]
    None,
    /// Picked up only because a local dependency moved; no release of its
    /// own is required unless the dependency's new version isn't satisfied
    /// by the declared range.
    Dependency,
    /// Backwards-compatible bug fix.
    Patch,
    /// Backwards-compatible feature addition.
    Minor,
    /// Breaking change.
    Major,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// A single package-level change entry inside a change file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Package this entry describes.
    pub package_name: String,
    /// Severity of the change.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Human-readable description, included in the changelog.
    pub comment: Option<String>,
    /// Author, as recorded by the authoring tool.
    pub author: Option<String>,
    /// Originating commit, if known.
    pub commit: Option<String>,
}

/// A change file envelope, as authored under [`CHANGE_FOLDER`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFile {
    /// Package the author was working in when the file was created.
    pub package_name: String,
    /// Author email, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Package-level entries.
    pub changes: Vec<ChangeEntry>,
}

/// A single comment attributed to a package's aggregated change.
#[derive(Clone, Debug)]
pub struct Comment {
    /// Severity this comment was recorded under.
    pub kind: ChangeKind,
    /// Free-form text, absent for comment-less propagated entries.
    pub text: Option<String>,
    /// Author, if known.
    pub author: Option<String>,
}

/// The resolved change for a single package, after aggregation and
/// propagation.
#[derive(Clone, Debug)]
pub struct ChangeSet {
    /// Package name.
    pub package_name: String,
    /// Aggregated severity, after propagation.
    pub kind: ChangeKind,
    /// Version the package is currently at.
    pub current_version: Version,
    /// Version the package should move to. Equal to `current_version` when
    /// `kind` doesn't warrant a release (`None` or `Dependency`).
    pub new_version: Version,
    /// Reshaped dependency range consumers should adopt, e.g. `>=1.1.0 <2.0.0`.
    pub new_range: Option<String>,
    /// Application order: a package always appears after every upstream
    /// package whose change it was propagated from.
    pub order: u32,
    /// Comments backing this change, for changelog rendering.
    pub comments: Vec<Comment>,
}

/// A changelog entry for a single released package version.
#[derive(Clone, Debug)]
pub struct ChangelogEntry {
    /// Package name.
    pub package_name: String,
    /// Released version.
    pub version: Version,
    /// Comments, grouped by severity, most severe first.
    pub sections: Vec<(ChangeKind, Vec<String>)>,
}

/// Change pipeline.
pub struct Pipeline<'a> {
    workspace: &'a Workspace,
    prerelease_token: Option<String>,
    exclude: BTreeSet<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl ChangeKind {
    /// Returns the release-type increment for this severity, or `None` if the
    /// severity doesn't warrant bumping the version on its own.
    #[must_use]
    pub fn to_increment(self) -> Option<Increment> {
        match self {
            ChangeKind::Patch => Some(Increment::Patch),
            ChangeKind::Minor => Some(Increment::Minor),
            ChangeKind::Major => Some(Increment::Major),
            ChangeKind::None | ChangeKind::Dependency => None,
        }
    }
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the given workspace.
    #[must_use]
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace, prerelease_token: None, exclude: BTreeSet::new() }
    }

    /// Runs every subsequent bump in prerelease mode, suffixing `token`
    /// instead of cutting a final release.
    #[must_use]
    pub fn with_prerelease<S>(mut self, token: S) -> Self
    where
        S: Into<String>,
    {
        self.prerelease_token = Some(token.into());
        self
    }

    /// Excludes the named packages from ever being bumped by this run.
    #[must_use]
    pub fn with_exclude(mut self, exclude: BTreeSet<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Runs the full pipeline: reads change files under `root/CHANGE_FOLDER`,
    /// aggregates them per package, propagates impact downstream, and stamps
    /// application order.
    ///
    /// Returns the resolved change sets, sorted by application order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] if a change file can't be read
    /// or parsed.
    pub fn run(&self, root: &Path) -> Result<Vec<ChangeSet>> {
        let files = read_change_files(&root.join(CHANGE_FOLDER))?;
        tracing::debug!(count = files.len(), "read change files");
        let aggregated = aggregate(&files);

        let mut changes: BTreeMap<String, ChangeSet> = BTreeMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for (package_name, (kind, comments)) in aggregated {
            let Some(project) = self.workspace.get(&package_name) else {
                continue;
            };
            let change = self.resolve(project, kind, comments);
            changes.insert(project.package_name.clone(), change);
            queue.push_back(project.package_name.clone());
        }

        self.propagate(&mut changes, queue);
        self.stamp_order(&mut changes);

        let mut out: Vec<ChangeSet> = changes.into_values().collect();
        out.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.package_name.cmp(&b.package_name)));
        Ok(out)
    }

    /// Rewrites every project's manifest in the workspace to reflect the
    /// resolved change sets, skipping projects whose manifest is unaffected.
    ///
    /// Returns the paths of every manifest actually rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a manifest can't be read or written, or a
    /// project-model error if rewriting fails to parse.
    pub fn apply(&self, changes: &[ChangeSet]) -> Result<Vec<PathBuf>> {
        let updates: BTreeMap<String, Version> = changes
            .iter()
            .filter(|change| change.new_version != change.current_version)
            .map(|change| (change.package_name.clone(), change.new_version.clone()))
            .collect();

        let mut rewritten = Vec::new();
        if updates.is_empty() {
            return Ok(rewritten);
        }

        for project in self.workspace.iter() {
            let path = Manifest::resolve(self.workspace.root().join(&project.folder));
            let content = std::fs::read_to_string(&path)?;
            let new_content = Manifest::rewrite(&content, &updates)?;
            if new_content != content {
                std::fs::write(&path, &new_content)?;
                rewritten.push(path);
            }
        }
        Ok(rewritten)
    }

    /// Resolves the change for a single, directly-touched package.
    fn resolve(&self, project: &Project, kind: ChangeKind, comments: Vec<Comment>) -> ChangeSet {
        let current_version = project.version().clone();
        let skip = self.should_skip(project, kind, &current_version);

        let (kind, new_version) = if skip {
            (ChangeKind::None, current_version.clone())
        } else if let Some(increment) = kind.to_increment() {
            (kind, current_version.bump(increment, self.preid()))
        } else {
            (kind, current_version.clone())
        };

        let new_range = (new_version != current_version).then(|| new_range_for(&new_version));

        ChangeSet {
            package_name: project.package_name.clone(),
            kind,
            current_version,
            new_version,
            new_range,
            order: 0,
            comments,
        }
    }

    /// Returns the prerelease identifier to pass to [`VersionExt::bump`].
    fn preid(&self) -> &str {
        self.prerelease_token.as_deref().unwrap_or(DEFAULT_PREID)
    }

    /// Returns whether a package's change should be skipped.
    ///
    /// A package is skipped if it's in the exclude set, if it isn't marked
    /// publishable, or if a prerelease run would otherwise re-bump a package
    /// already on that prerelease train with nothing more than a dependency
    /// ripple behind it.
    fn should_skip(&self, project: &Project, kind: ChangeKind, current: &Version) -> bool {
        if self.exclude.contains(&project.package_name) {
            return true;
        }
        if !project.should_publish {
            return true;
        }
        if let Some(token) = &self.prerelease_token {
            if kind <= ChangeKind::Dependency && current.pre.as_str().starts_with(token.as_str()) {
                return true;
            }
        }
        false
    }

    /// Propagates a bumped package's impact to every local downstream
    /// package, recursively.
    ///
    /// A downstream package whose declared range no longer admits the
    /// upstream package's new version is registered for a patch release;
    /// otherwise it's registered as a dependency-only change. Running in
    /// prerelease mode always registers a patch-level change downstream, so
    /// every affected package gets a fresh prerelease tag in the same run.
    fn propagate(&self, changes: &mut BTreeMap<String, ChangeSet>, mut queue: VecDeque<String>) {
        let graph = downstream_graph(self.workspace);

        while let Some(name) = queue.pop_front() {
            let Some(upstream) = changes.get(&name) else {
                continue;
            };
            if upstream.kind == ChangeKind::None {
                continue;
            }
            let upstream_version = upstream.new_version.clone();

            let Some(downstream_names) = graph.get(&name) else {
                continue;
            };
            for downstream_name in downstream_names.clone() {
                let Some(downstream_project) = self.workspace.get(&downstream_name) else {
                    continue;
                };
                let Some(range) = dependency_range(downstream_project, &name) else {
                    continue;
                };

                let satisfied = range.is_satisfied_by(&upstream_version).unwrap_or(true);
                let propagated_kind = if self.prerelease_token.is_some() || !satisfied {
                    ChangeKind::Patch
                } else {
                    ChangeKind::Dependency
                };
                let comment = Comment {
                    kind: propagated_kind,
                    text: Some(format!("Bump because of a dependency update to `{name}`.")),
                    author: None,
                };

                let entry = changes
                    .entry(downstream_name.clone())
                    .or_insert_with(|| self.resolve(downstream_project, ChangeKind::None, Vec::new()));

                let previous_kind = entry.kind;
                let merged_kind = previous_kind.max(propagated_kind);
                if merged_kind >= ChangeKind::Patch && previous_kind < ChangeKind::Patch {
                    let increment = merged_kind.to_increment().expect("patch or higher");
                    entry.new_version = entry.current_version.bump(increment, self.preid());
                    entry.new_range = Some(new_range_for(&entry.new_version));
                }
                entry.kind = merged_kind;
                entry.comments.push(comment);

                queue.push_back(downstream_name);
            }
        }
    }

    /// Stamps every change set's application order: a package's order is one
    /// more than the highest order among the upstream packages whose change
    /// it was propagated from, computed by repeated relaxation over the
    /// (acyclic) downstream graph restricted to touched packages.
    fn stamp_order(&self, changes: &mut BTreeMap<String, ChangeSet>) {
        let graph = downstream_graph(self.workspace);
        let names: Vec<String> = changes.keys().cloned().collect();

        for _ in 0..=names.len() {
            let mut updates = Vec::new();
            for name in &names {
                let order = changes[name].order;
                let Some(downstream_names) = graph.get(name) else {
                    continue;
                };
                for downstream_name in downstream_names {
                    if changes.contains_key(downstream_name) {
                        updates.push((downstream_name.clone(), order + 1));
                    }
                }
            }
            let mut changed = false;
            for (name, candidate) in updates {
                let entry = changes.get_mut(&name).expect("present");
                if candidate > entry.order {
                    entry.order = candidate;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Builds a changelog from resolved change sets, eliding packages whose
/// version didn't move and packages currently in prerelease.
#[must_use]
pub fn changelog(changes: &[ChangeSet]) -> Vec<ChangelogEntry> {
    let mut entries = Vec::new();
    for change in changes {
        if change.new_version == change.current_version {
            continue;
        }
        if !change.new_version.pre.is_empty() {
            continue;
        }

        let mut grouped: BTreeMap<ChangeKind, Vec<String>> = BTreeMap::new();
        for comment in &change.comments {
            if let Some(text) = &comment.text {
                grouped.entry(comment.kind).or_default().push(text.clone());
            }
        }
        let mut sections: Vec<_> = grouped.into_iter().collect();
        sections.sort_by(|a, b| b.0.cmp(&a.0));

        entries.push(ChangelogEntry {
            package_name: change.package_name.clone(),
            version: change.new_version.clone(),
            sections,
        });
    }
    entries
}

/// Renders changelog entries as Markdown.
#[must_use]
pub fn render_changelog(entries: &[ChangelogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("## {}@{}\n\n", entry.package_name, entry.version));
        for (kind, comments) in &entry.sections {
            out.push_str(&format!("### {kind:?}\n\n"));
            for comment in comments {
                out.push_str(&format!("- {comment}\n"));
            }
            out.push('\n');
        }
    }
    out
}

/// Reads every `*.json` change file under `folder`, recursively.
///
/// Returns an empty list if `folder` doesn't exist – not every run has
/// pending changes.
fn read_change_files(folder: &Path) -> Result<Vec<ChangeFile>> {
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(folder) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
            continue;
        }

        let content = std::fs::read_to_string(entry.path())?;
        let file: ChangeFile = serde_json::from_str(&content)
            .map_err(|_| Error::InvalidChangeFile(entry.path().to_path_buf()))?;
        files.push(file);
    }
    Ok(files)
}

/// Aggregates change files per package: the severity is the max over every
/// entry naming that package, and comments accumulate in file order.
fn aggregate(files: &[ChangeFile]) -> BTreeMap<String, (ChangeKind, Vec<Comment>)> {
    let mut aggregated: BTreeMap<String, (ChangeKind, Vec<Comment>)> = BTreeMap::new();
    for file in files {
        for entry in &file.changes {
            let slot = aggregated.entry(entry.package_name.clone()).or_default();
            slot.0 = slot.0.max(entry.kind);
            slot.1.push(Comment {
                kind: entry.kind,
                text: entry.comment.clone(),
                author: entry.author.clone().or_else(|| file.email.clone()),
            });
        }
    }
    aggregated
}

/// Computes the downstream adjacency directly from workspace manifests,
/// without requiring that every declared range currently be satisfied.
///
/// [`Workspace::load`] already rejects an unsatisfied range as a fatal
/// configuration error, which means by the time a workspace loads
/// successfully every range in it is satisfied *today*. The whole point of
/// the change pipeline is to repair ranges that a just-applied bump leaves
/// unsatisfied, so propagation can't reuse `Workspace::downstream_of` for
/// that case – it recomputes the same adjacency, minus the satisfaction
/// check.
fn downstream_graph(workspace: &Workspace) -> BTreeMap<String, BTreeSet<String>> {
    let mut downstream: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for project in workspace.iter() {
        for (name, _) in project.manifest.dependencies() {
            if let Some(dependency) = workspace.get(name) {
                downstream.entry(dependency.package_name.clone()).or_default().insert(project.package_name.clone());
            }
        }
    }
    downstream
}

/// Looks up the declared range a project has on one of its local
/// dependencies, by name.
fn dependency_range<'a>(project: &'a Project, dependency_name: &str) -> Option<&'a Range> {
    project.manifest.dependencies().find(|(name, _)| *name == dependency_name).map(|(_, range)| range)
}

/// Computes the reshaped dependent range for a newly-bumped version:
/// `>=version <next-major>`.
fn new_range_for(version: &Version) -> String {
    format!(">={version}, <{}.0.0", version.major + 1)
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

    fn write_change(root: &Path, file_name: &str, package_name: &str, kind: &str) {
        let dir = root.join(CHANGE_FOLDER);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(file_name),
            format!(
                r#"{{
                    "packageName": "{package_name}",
                    "changes": [
                        {{"packageName": "{package_name}", "type": "{kind}", "comment": "did a thing"}}
                    ]
                }}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn propagates_dependency_change_through_satisfied_range() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "a", "1.0.0", "{}");
        write_project(root, "packages/b", "b", "1.0.0", r#"{"a": "^1.0.0"}"#);
        write_project(root, "packages/c", "c", "1.0.0", r#"{"b": "^1.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "a", "projectFolder": "packages/a"},
                {"packageName": "b", "projectFolder": "packages/b"},
                {"packageName": "c", "projectFolder": "packages/c"}
            ]"#,
        );
        write_change(root, "a-change.json", "a", "minor");

        let workspace = Workspace::load(root).unwrap();
        let pipeline = Pipeline::new(&workspace);
        let changes = pipeline.run(root).unwrap();

        let a = changes.iter().find(|c| c.package_name == "a").unwrap();
        let b = changes.iter().find(|c| c.package_name == "b").unwrap();
        let c = changes.iter().find(|c| c.package_name == "c").unwrap();

        assert_eq!(a.kind, ChangeKind::Minor);
        assert_eq!(a.new_version, "1.1.0".parse().unwrap());
        assert_eq!(b.kind, ChangeKind::Dependency);
        assert_eq!(b.new_version, "1.0.0".parse().unwrap());
        assert_eq!(c.kind, ChangeKind::Dependency);

        assert_eq!(a.order, 0);
        assert_eq!(b.order, 1);
        assert_eq!(c.order, 2);
    }

    #[test]
    fn propagates_patch_when_downstream_range_is_unsatisfied() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "a", "1.0.0", "{}");
        write_project(root, "packages/b", "b", "1.0.0", r#"{"a": "^0.9.0"}"#);
        write_project(root, "packages/c", "c", "1.0.0", r#"{"b": "^1.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "a", "projectFolder": "packages/a"},
                {"packageName": "b", "projectFolder": "packages/b"},
                {"packageName": "c", "projectFolder": "packages/c"}
            ]"#,
        );
        write_change(root, "a-change.json", "a", "minor");

        let workspace = Workspace::load(root).unwrap();
        let pipeline = Pipeline::new(&workspace);
        let changes = pipeline.run(root).unwrap();

        let b = changes.iter().find(|c| c.package_name == "b").unwrap();
        let c = changes.iter().find(|c| c.package_name == "c").unwrap();

        assert_eq!(b.kind, ChangeKind::Patch);
        assert_eq!(b.new_version, "1.0.1".parse().unwrap());
        assert_eq!(c.kind, ChangeKind::Dependency);
    }

    #[test]
    fn apply_rewrites_manifests_for_every_bumped_package() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "a", "1.0.0", "{}");
        write_project(root, "packages/b", "b", "1.0.0", r#"{"a": "^1.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "a", "projectFolder": "packages/a"},
                {"packageName": "b", "projectFolder": "packages/b"}
            ]"#,
        );
        write_change(root, "a-change.json", "a", "major");

        let workspace = Workspace::load(root).unwrap();
        let pipeline = Pipeline::new(&workspace);
        let changes = pipeline.run(root).unwrap();
        let rewritten = pipeline.apply(&changes).unwrap();
        assert_eq!(rewritten.len(), 1);

        let manifest_a = Manifest::read(root.join("packages/a")).unwrap();
        assert_eq!(manifest_a.version, "2.0.0".parse().unwrap());
        let manifest_b = Manifest::read(root.join("packages/b")).unwrap();
        assert_eq!(manifest_b.dependencies.get("a").unwrap().as_str(), "^2.0.0");
    }

    #[test]
    fn excluded_package_is_skipped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "a", "1.0.0", "{}");
        write_repository(root, r#"[{"packageName": "a", "projectFolder": "packages/a"}]"#);
        write_change(root, "a-change.json", "a", "major");

        let workspace = Workspace::load(root).unwrap();
        let pipeline = Pipeline::new(&workspace).with_exclude(BTreeSet::from(["a".to_string()]));
        let changes = pipeline.run(root).unwrap();

        let a = changes.iter().find(|c| c.package_name == "a").unwrap();
        assert_eq!(a.kind, ChangeKind::None);
        assert_eq!(a.new_version, a.current_version);
    }

    #[test]
    fn changelog_elides_unchanged_and_prerelease_versions() {
        let changes = vec![
            ChangeSet {
                package_name: "a".to_string(),
                kind: ChangeKind::Minor,
                current_version: "1.0.0".parse().unwrap(),
                new_version: "1.1.0".parse().unwrap(),
                new_range: None,
                order: 0,
                comments: vec![Comment { kind: ChangeKind::Minor, text: Some("added a thing".to_string()), author: None }],
            },
            ChangeSet {
                package_name: "b".to_string(),
                kind: ChangeKind::None,
                current_version: "1.0.0".parse().unwrap(),
                new_version: "1.0.0".parse().unwrap(),
                new_range: None,
                order: 0,
                comments: vec![],
            },
        ];
        let entries = changelog(&changes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].package_name, "a");
        assert_eq!(entries[0].sections[0].1, vec!["added a thing".to_string()]);
    }
}

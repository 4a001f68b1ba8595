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

//! Install planner.
//!
//! Synthesizes a single common installation manifest and a per-project stub
//! archive from the workspace's projects, deciding for every declared
//! dependency whether it should be satisfied by a local symlink or by the
//! shared installation.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use mono_lockfile::Lockfile;
use mono_project::manifest::Range;
use mono_project::project::TEMP_SCOPE;
use mono_project::Workspace;
use serde::Serialize;

use crate::error::Result;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Name of the synthesized common manifest package.
const COMMON_MANIFEST_NAME: &str = "rush-common";

/// Folder (relative to the workspace root) holding the common install state.
const COMMON_TEMP_FOLDER: &str = "common/temp";

/// Folder (relative to `COMMON_TEMP_FOLDER`) holding per-project stub archives.
const STUB_PROJECTS_FOLDER: &str = "projects";

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Per-project stub package manifest.
///
/// Packaged verbatim into a gzipped tarball, registered in the common
/// manifest via a `file:` specifier under the reserved temp scope.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Stub {
    /// Synthetic, workspace-unique name under [`TEMP_SCOPE`].
    pub name: String,
    /// Always `0.0.0` – the stub carries no meaningful version of its own.
    pub version: String,
    /// Always `true` – stub packages are never published.
    pub private: bool,
    /// Dependencies not satisfied by a local link.
    pub dependencies: BTreeMap<String, String>,
    /// Optional dependencies, copied from the project manifest verbatim.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

/// The synthesized common installation manifest.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CommonManifest {
    /// Fixed synthetic package name.
    pub name: String,
    /// Always `0.0.0`.
    pub version: String,
    /// Union of pinned external dependencies plus one `file:` entry per
    /// project stub, both sorted by name via the underlying `BTreeMap`.
    pub dependencies: BTreeMap<String, String>,
}

/// Outcome of writing a single project's stub archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubOutcome {
    /// Path the archive was written to (or already existed at, unchanged).
    pub path: PathBuf,
    /// Whether the archive's content was rewritten this run.
    pub rewritten: bool,
}

/// Lockfile validity verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The lockfile satisfies every pinned and stub dependency, and carries
    /// no orphaned temp projects.
    Valid,
    /// At least one problem was found; a re-resolution is required.
    Invalid(Vec<String>),
    /// No lockfile was supplied to validate against.
    Unknown,
}

/// Full output of a single planning run.
#[derive(Debug)]
pub struct Plan {
    /// Synthesized common manifest.
    pub common_manifest: CommonManifest,
    /// Per-project stub manifests, keyed by package name.
    pub stubs: BTreeMap<String, Stub>,
    /// Per-project stub archive write outcomes, keyed by package name.
    pub archives: BTreeMap<String, StubOutcome>,
    /// Local-link edges: package name -> names of local projects it should
    /// link to directly instead of resolving through the shared install.
    pub local_links: BTreeMap<String, BTreeSet<String>>,
    /// Lockfile validity verdict.
    pub verdict: Verdict,
}

/// Install planner.
pub struct Planner<'a> {
    workspace: &'a Workspace,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl<'a> Planner<'a> {
    /// Creates a planner for the given workspace.
    #[must_use]
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Computes the full install plan, merging `explicit_pins` over the
    /// implicitly-pinned ranges computed from the workspace, and validating
    /// against `lockfile` if given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] or
    /// [`Error::Json`][crate::Error::Json] if a stub archive can't be read,
    /// written, or serialized.
    pub fn plan(&self, explicit_pins: &BTreeMap<String, Range>, lockfile: Option<&Lockfile>) -> Result<Plan> {
        let pins = self.merged_pins(explicit_pins);

        let mut stubs = BTreeMap::new();
        let mut local_links: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut manifest_dependencies: BTreeMap<String, String> =
            pins.iter().map(|(name, range)| (name.clone(), range.as_str().to_string())).collect();

        for project in self.workspace.iter() {
            let mut dependencies = BTreeMap::new();
            let mut links = BTreeSet::new();

            // devDependencies are promoted into the stub's `dependencies`,
            // with the regular dependency winning on conflict.
            for (name, range) in
                project.manifest.dev_dependencies.iter().chain(project.manifest.dependencies.iter())
            {
                let is_local = self
                    .workspace
                    .get(name)
                    .filter(|dependency| {
                        !project.cyclic_exemptions.contains(dependency.package_name.as_str())
                            && range.is_satisfied_by(dependency.version()) != Some(false)
                    })
                    .is_some();

                if is_local {
                    links.insert(name.clone());
                } else {
                    dependencies.insert(name.clone(), range.as_str().to_string());
                }
            }

            let optional_dependencies = project
                .manifest
                .optional_dependencies
                .iter()
                .map(|(name, range)| (name.clone(), range.as_str().to_string()))
                .collect();

            let stub = Stub {
                name: project.temp_name.clone(),
                version: "0.0.0".to_string(),
                private: true,
                dependencies,
                optional_dependencies,
            };

            manifest_dependencies.insert(
                project.temp_name.clone(),
                format!("file:./{STUB_PROJECTS_FOLDER}/{}.tgz", sanitize_temp_name(&project.temp_name)),
            );

            if !links.is_empty() {
                local_links.insert(project.package_name.clone(), links);
            }
            stubs.insert(project.package_name.clone(), stub);
        }

        let archives = self.write_stub_archives(&stubs)?;

        let common_manifest = CommonManifest {
            name: COMMON_MANIFEST_NAME.to_string(),
            version: "0.0.0".to_string(),
            dependencies: manifest_dependencies,
        };

        let verdict = self.validate(&pins, &stubs, lockfile);

        Ok(Plan { common_manifest, stubs, archives, local_links, verdict })
    }

    /// Computes implicitly-pinned versions: external dependency names for
    /// which every consuming project declares the same range, merged with
    /// operator-declared explicit pins (which win on conflict).
    fn merged_pins(&self, explicit_pins: &BTreeMap<String, Range>) -> BTreeMap<String, Range> {
        let mut ranges_by_name: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for project in self.workspace.iter() {
            for (name, range) in project.manifest.dependencies() {
                if self.workspace.get(name).is_some() {
                    continue;
                }
                ranges_by_name.entry(name.to_string()).or_default().insert(range.as_str().to_string());
            }
        }

        let mut pins = BTreeMap::new();
        for (name, ranges) in ranges_by_name {
            if ranges.len() == 1 {
                let range = ranges.into_iter().next().unwrap();
                pins.insert(name, Range::parse(range));
            }
        }

        for (name, range) in explicit_pins {
            pins.insert(name.clone(), range.clone());
        }
        pins
    }

    /// Writes each stub's archive to disk, skipping the rewrite (and
    /// preserving the file's timestamp) when its packaged content is
    /// byte-for-byte identical to what's already there.
    fn write_stub_archives(&self, stubs: &BTreeMap<String, Stub>) -> Result<BTreeMap<String, StubOutcome>> {
        let mut archives = BTreeMap::new();
        let folder = self.workspace.root().join(COMMON_TEMP_FOLDER).join(STUB_PROJECTS_FOLDER);
        std::fs::create_dir_all(&folder)?;

        for (package_name, stub) in stubs {
            let temp_name = &stub.name;
            let path = folder.join(format!("{}.tgz", sanitize_temp_name(temp_name)));
            let content = serde_json::to_vec_pretty(stub)?;

            let rewritten = if read_stub_content(&path).as_deref() == Some(content.as_slice()) {
                false
            } else {
                write_stub_archive(&path, temp_name, &content)?;
                true
            };

            archives.insert(package_name.clone(), StubOutcome { path, rewritten });
        }
        Ok(archives)
    }

    /// Validates pinned and per-stub dependencies against the lockfile, and
    /// checks for orphaned temp projects.
    fn validate(
        &self, pins: &BTreeMap<String, Range>, stubs: &BTreeMap<String, Stub>, lockfile: Option<&Lockfile>,
    ) -> Verdict {
        let Some(lockfile) = lockfile else {
            return Verdict::Unknown;
        };

        let mut problems = Vec::new();

        for (name, range) in pins {
            if !lockfile.has_compatible(name, range, None) {
                problems.push(format!("pinned dependency `{name}@{range}` has no compatible lockfile entry"));
            }
        }

        for (package_name, stub) in stubs {
            for (name, range_text) in &stub.dependencies {
                let range = Range::parse(range_text);
                if !lockfile.has_compatible(name, &range, Some(&stub.name)) {
                    problems.push(format!(
                        "project `{package_name}` dependency `{name}@{range_text}` has no compatible lockfile entry under `{}`",
                        stub.name
                    ));
                }
            }
        }

        for temp_name in lockfile.temp_project_names() {
            if self.workspace.get_by_temp_name(temp_name).is_none() {
                problems.push(format!("orphaned temp project `{temp_name}` has no corresponding workspace project"));
            }
        }

        if problems.is_empty() {
            Verdict::Valid
        } else {
            Verdict::Invalid(problems)
        }
    }
}

/// Replaces the reserved-scope separator with a filesystem-safe character.
fn sanitize_temp_name(temp_name: &str) -> String {
    temp_name.trim_start_matches(TEMP_SCOPE).trim_start_matches('/').replace('+', "-")
}

/// Reads the `package/package.json` entry from an existing stub archive, if
/// the archive exists and is readable.
fn read_stub_content(path: &Path) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    let mut entries = archive.entries().ok()?;
    let mut entry = entries
        .find(|entry| {
            entry
                .as_ref()
                .map(|e| e.path().ok().is_some_and(|p| p == Path::new("package/package.json")))
                .unwrap_or(false)
        })?
        .ok()?;
    let mut buffer = Vec::new();
    entry.read_to_end(&mut buffer).ok()?;
    Some(buffer)
}

/// Writes a fresh stub archive at `path`, containing a single
/// `package/package.json` entry with `content`.
fn write_stub_archive(path: &Path, temp_name: &str, content: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, "package/package.json", content)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;

    tracing::debug!(temp_name, path = %path.display(), "wrote stub archive");
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
    fn local_dependency_becomes_a_link_not_a_stub_entry() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_project(root, "packages/app", "@scope/app", "1.0.0", r#"{"@scope/core": "^1.0.0", "lodash": "^4.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);
        let plan = planner.plan(&BTreeMap::new(), None).unwrap();

        let stub = &plan.stubs["@scope/app"];
        assert!(!stub.dependencies.contains_key("@scope/core"));
        assert!(stub.dependencies.contains_key("lodash"));
        assert_eq!(plan.local_links.get("@scope/app").map(|s| s.contains("@scope/core")), Some(true));
    }

    #[test]
    fn non_semver_range_on_a_local_dependency_still_links() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/core", "@scope/core", "1.0.0", "{}");
        write_project(root, "packages/app", "@scope/app", "1.0.0", r#"{"@scope/core": "workspace:*"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/core", "projectFolder": "packages/core"},
                {"packageName": "@scope/app", "projectFolder": "packages/app"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);
        let plan = planner.plan(&BTreeMap::new(), None).unwrap();

        let stub = &plan.stubs["@scope/app"];
        assert!(!stub.dependencies.contains_key("@scope/core"));
        assert_eq!(plan.local_links.get("@scope/app").map(|s| s.contains("@scope/core")), Some(true));
    }

    #[test]
    fn cyclic_exemption_forces_registry_resolution() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "@scope/a", "1.0.0", r#"{"@scope/b": "^1.0.0"}"#);
        write_project(root, "packages/b", "@scope/b", "1.0.0", "{}");
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/a", "projectFolder": "packages/a", "cyclicDependencyProjects": ["@scope/b"]},
                {"packageName": "@scope/b", "projectFolder": "packages/b"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);
        let plan = planner.plan(&BTreeMap::new(), None).unwrap();

        let stub = &plan.stubs["@scope/a"];
        assert!(stub.dependencies.contains_key("@scope/b"));
        assert!(plan.local_links.get("@scope/a").is_none());
    }

    #[test]
    fn implicit_pin_requires_unanimous_range() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "@scope/a", "1.0.0", r#"{"lodash": "^4.0.0"}"#);
        write_project(root, "packages/b", "@scope/b", "1.0.0", r#"{"lodash": "^3.0.0"}"#);
        write_repository(
            root,
            r#"[
                {"packageName": "@scope/a", "projectFolder": "packages/a"},
                {"packageName": "@scope/b", "projectFolder": "packages/b"}
            ]"#,
        );

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);
        let pins = planner.merged_pins(&BTreeMap::new());
        assert!(!pins.contains_key("lodash"));
    }

    #[test]
    fn explicit_pin_overrides_implicit_pin() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "@scope/a", "1.0.0", r#"{"lodash": "^4.0.0"}"#);
        write_repository(root, r#"[{"packageName": "@scope/a", "projectFolder": "packages/a"}]"#);

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);
        let mut explicit = BTreeMap::new();
        explicit.insert("lodash".to_string(), Range::parse("^5.0.0"));
        let pins = planner.merged_pins(&explicit);
        assert_eq!(pins["lodash"].as_str(), "^5.0.0");
    }

    #[test]
    fn stub_archive_is_not_rewritten_when_content_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "@scope/a", "1.0.0", "{}");
        write_repository(root, r#"[{"packageName": "@scope/a", "projectFolder": "packages/a"}]"#);

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);

        let first = planner.plan(&BTreeMap::new(), None).unwrap();
        assert!(first.archives["@scope/a"].rewritten);

        let second = planner.plan(&BTreeMap::new(), None).unwrap();
        assert!(!second.archives["@scope/a"].rewritten);
    }

    #[test]
    fn detects_orphaned_temp_project() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_project(root, "packages/a", "@scope/a", "1.0.0", "{}");
        write_repository(root, r#"[{"packageName": "@scope/a", "projectFolder": "packages/a"}]"#);

        let workspace = Workspace::load(root).unwrap();
        let planner = Planner::new(&workspace);

        let lockfile = Lockfile::parse(
            r#"{"dependencies": {"@rush-temp/ghost": {"version": "0.0.0", "dependencies": {}}}}"#,
        )
        .unwrap();
        let plan = planner.plan(&BTreeMap::new(), Some(&lockfile)).unwrap();
        assert!(matches!(plan.verdict, Verdict::Invalid(_)));
    }
}

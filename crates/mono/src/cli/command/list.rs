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

//! List every project in dependency order.

use clap::Args;

use crate::cli::command::Command;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// List every project in dependency order.
#[derive(Args, Debug)]
pub struct Arguments {}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        for name in topological_order(&context.workspace) {
            println!("{name}");
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Orders every project so each appears after its local dependencies, via a
/// straightforward Kahn's-algorithm pass over the dependency (not dependent)
/// edges.
pub(super) fn topological_order(workspace: &mono_project::Workspace) -> Vec<String> {
    use std::collections::BTreeMap;

    let mut remaining: BTreeMap<String, usize> = BTreeMap::new();
    for project in workspace.iter() {
        let count = project
            .manifest
            .dependencies()
            .filter(|(name, _)| workspace.get(name).is_some())
            .count();
        remaining.insert(project.package_name.clone(), count);
    }

    let mut order = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let ready: Vec<String> =
            remaining.iter().filter(|(_, &count)| count == 0).map(|(name, _)| name.clone()).collect();
        if ready.is_empty() {
            // The workspace invariant (acyclic local graph) is already
            // enforced at load time; this is unreachable in practice.
            order.extend(remaining.keys().cloned());
            break;
        }
        for name in ready {
            remaining.remove(&name);
            order.push(name.clone());
            for downstream in workspace.downstream_of(&name) {
                if let Some(count) = remaining.get_mut(downstream) {
                    *count = count.saturating_sub(1);
                }
            }
        }
    }
    order
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(root: &std::path::Path, folder: &str, name: &str, deps: &[&str]) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        let deps_json: Vec<String> = deps.iter().map(|d| format!("\"{d}\": \"1.0.0\"")).collect();
        fs::write(
            dir.join("package.json"),
            format!(
                r#"{{"name": "{name}", "version": "1.0.0", "dependencies": {{{}}}, "scripts": {{"clean": "", "build": "true"}}}}"#,
                deps_json.join(",")
            ),
        )
        .unwrap();
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path(), "a", "a", &[]);
        write_project(dir.path(), "b", "b", &["a"]);
        write_project(dir.path(), "c", "c", &["b"]);
        fs::write(
            dir.path().join("mono.json"),
            r#"{
                "installerName": "pnpm",
                "installerVersion": "9.0.0",
                "lockfilePath": "common/pnpm-lock.yaml",
                "minProjectFolderDepth": 1,
                "maxProjectFolderDepth": 1,
                "projects": [
                    {"packageName": "a", "projectFolder": "a"},
                    {"packageName": "b", "projectFolder": "b"},
                    {"packageName": "c", "projectFolder": "c"}
                ]
            }"#,
        )
        .unwrap();

        let workspace = mono_project::Workspace::load(dir.path()).unwrap();
        let order = topological_order(&workspace);
        assert_eq!(order, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}

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

//! Build every project honoring the dependency graph, skipping unchanged
//! ones unless `rebuild` forces a fresh run.

use std::collections::BTreeSet;

use clap::Args;
use console::style;

use mono_build::task::DisplayModeOption;
use mono_build::{BuildMode, BuildTask, Scheduler, Status};
use mono_project::Workspace;

use crate::cli::error::Error;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Build every project honoring the dependency graph.
#[derive(Args, Debug)]
pub struct Arguments {
    /// Only build this project and its local dependencies.
    #[arg(long)]
    to: Option<String>,
    /// Only build this project and its local dependents.
    #[arg(long)]
    from: Option<String>,
    /// Append `--production` to every build script invocation.
    #[arg(long)]
    production: bool,
    /// Use npm instead of the project's configured package manager.
    #[arg(long)]
    npm: bool,
    /// Append `--minimal` to every build script invocation.
    #[arg(long)]
    minimal: bool,
    /// Emit IDE-linked annotations instead of plain diagnostics.
    #[arg(long)]
    vso: bool,
    /// Number of projects to build concurrently.
    #[arg(long, default_value_t = num_cpus::get())]
    parallelism: usize,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Arguments {
    /// Runs the build, with `force` disabling incremental skipping
    /// regardless of upstream state (set by the `rebuild` subcommand).
    pub(super) fn execute_with(&self, context: Context, force: bool) -> Result {
        let workspace = &context.workspace;
        let selected = self.selected_projects(workspace)?;

        let mode = BuildMode {
            production: self.production,
            npm: self.npm,
            minimal: self.minimal,
            display: if self.vso { DisplayModeOption::CiLinked } else { DisplayModeOption::Local },
        };
        let log_folder = workspace.root().join("common/temp/build-logs");

        let mut scheduler = Scheduler::new();
        for name in &selected {
            let project = workspace.get(name).expect("selected name resolved from the workspace");
            let task = BuildTask::new(project, &log_folder, mode, force)?;
            scheduler.add_task(name.clone(), Box::new(move |incremental_allowed, writer| {
                task.run(incremental_allowed, writer)
            }))?;
        }
        for name in &selected {
            let project = workspace.get(name).expect("selected name resolved from the workspace");
            let deps: Vec<String> = project
                .manifest
                .dependencies()
                .map(|(dep, _)| dep.to_string())
                .filter(|dep| selected.contains(dep))
                .collect();
            scheduler.add_dependencies(name, deps)?;
        }

        let report = scheduler.execute(self.parallelism.max(1))?;
        let failed = report.statuses.iter().filter(|(_, status)| *status == Status::Failure).count();
        let skipped = report.statuses.iter().filter(|(_, status)| *status == Status::Skipped).count();
        let built = report.statuses.len() - failed - skipped;

        println!(
            "{}",
            style(format!("{built} built, {skipped} skipped, {failed} failed")).bold()
        );
        Ok(())
    }

    /// Resolves the set of projects to build, honoring `--to`/`--from`.
    fn selected_projects(&self, workspace: &Workspace) -> Result<BTreeSet<String>> {
        match (&self.to, &self.from) {
            (None, None) => Ok(workspace.iter().map(|project| project.package_name.clone()).collect()),
            (Some(to), None) => closure(workspace, to, Direction::Dependencies),
            (None, Some(from)) => closure(workspace, from, Direction::Dependents),
            (Some(_), Some(_)) => {
                let mut to_set = closure(workspace, self.to.as_ref().unwrap(), Direction::Dependencies)?;
                let from_set = closure(workspace, self.from.as_ref().unwrap(), Direction::Dependents)?;
                to_set.retain(|name| from_set.contains(name));
                Ok(to_set)
            }
        }
    }
}

/// Traversal direction for [`closure`].
enum Direction {
    /// Follow declared dependencies (what a project needs).
    Dependencies,
    /// Follow dependents (what needs a project), via `Workspace::downstream_of`.
    Dependents,
}

/// Computes the transitive closure of local projects reachable from `root`
/// in the given direction, including `root` itself.
fn closure(workspace: &Workspace, root: &str, direction: Direction) -> Result<BTreeSet<String>> {
    let start = workspace.get(root).ok_or_else(|| Error::UnknownProject(root.to_string()))?;

    let mut seen = BTreeSet::new();
    let mut queue = vec![start.package_name.clone()];
    while let Some(name) = queue.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        match direction {
            Direction::Dependencies => {
                if let Some(project) = workspace.get(&name) {
                    for (dep, _) in project.manifest.dependencies() {
                        if workspace.get(dep).is_some() {
                            queue.push(dep.to_string());
                        }
                    }
                }
            }
            Direction::Dependents => {
                queue.extend(workspace.downstream_of(&name).map(str::to_string));
            }
        }
    }
    Ok(seen)
}

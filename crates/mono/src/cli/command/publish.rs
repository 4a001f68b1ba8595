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

//! Apply pending change requests: bump versions, rewrite manifests, and emit
//! changelogs.

use clap::Args;
use console::style;

use mono_changeset::{changelog, render_changelog, Pipeline, Registry, CHANGE_FOLDER};

use crate::cli::command::Command;
use crate::cli::error::Error;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Apply pending change requests: bump versions and emit changelogs.
#[derive(Args, Debug)]
pub struct Arguments {
    /// Compute the changelog and validate policies without writing anything.
    #[arg(long)]
    dry_run: bool,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;
        let registry = Registry::read(workspace.root())?;

        let changes = Pipeline::new(workspace).run(workspace.root())?;
        if changes.is_empty() {
            println!("no pending changes, nothing to publish");
            return Ok(());
        }

        for change in &changes {
            if change.new_version == change.current_version {
                continue;
            }
            let Some(project) = workspace.get(&change.package_name) else {
                continue;
            };
            let Some(policy_name) = &project.version_policy_name else {
                continue;
            };
            let policy = registry.get(policy_name).ok_or_else(|| Error::UnknownPolicy {
                project: project.package_name.clone(),
                policy: policy_name.clone(),
            })?;
            policy.validate(&project.package_name, &change.new_version)?;
        }

        let entries = changelog(&changes);
        let rendered = render_changelog(&entries);

        if self.dry_run {
            print!("{rendered}");
            println!("{}", style("dry run, nothing written").dim());
            return Ok(());
        }

        let pipeline = Pipeline::new(workspace);
        let rewritten = pipeline.apply(&changes)?;
        for path in &rewritten {
            println!("{} {}", style("bumped").green(), path.display());
        }

        let change_folder = workspace.root().join(CHANGE_FOLDER);
        if change_folder.is_dir() {
            for entry in std::fs::read_dir(&change_folder)? {
                let entry = entry?;
                if entry.path().extension().is_some_and(|ext| ext == "json") {
                    std::fs::remove_file(entry.path())?;
                }
            }
        }

        print!("{rendered}");
        let released = changes.iter().filter(|change| change.new_version != change.current_version).count();
        println!("{}", style(format!("{released} package(s) published")).bold());
        Ok(())
    }
}

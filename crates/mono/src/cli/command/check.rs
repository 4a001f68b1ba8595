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

//! Validate the workspace beyond what loading already enforces.
//!
//! `Workspace::load` checks everything it can know about on its own: folder
//! depth, name agreement, review categories, local dependency ranges, cycles.
//! It can't also check a project's `versionPolicyName` against the version
//! policy registry, since the registry lives in a separate crate – that cross
//! check happens here instead.

use clap::Args;
use console::style;

use mono_changeset::Registry;

use crate::cli::command::Command;
use crate::cli::error::Error;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Validate the workspace beyond what loading already enforces.
#[derive(Args, Debug)]
pub struct Arguments {}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;
        let registry = Registry::read(workspace.root())?;

        for project in workspace.iter() {
            let Some(policy_name) = &project.version_policy_name else {
                continue;
            };
            let policy = registry.get(policy_name).ok_or_else(|| Error::UnknownPolicy {
                project: project.package_name.clone(),
                policy: policy_name.clone(),
            })?;
            policy.ensure(&project.package_name, project.version())?;
        }

        println!(
            "{} {} project(s), {} version policies, all cross-checks passed",
            style("ok").green().bold(),
            workspace.len(),
            registry.iter().count(),
        );
        Ok(())
    }
}

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

//! Subcommands.

use clap::Subcommand;

use crate::cli::Result;
use crate::Context;

mod build;
mod change;
mod check;
mod generate;
mod install;
mod link;
mod list;
mod publish;
mod scan;
mod unlink;
mod version;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// A runnable subcommand.
pub trait Command {
    /// Executes the command against the loaded workspace.
    ///
    /// # Errors
    ///
    /// Returns an error specific to the command.
    fn execute(&self, context: Context) -> Result;
}

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the common installation, synthesizing stubs and local links.
    Install(install::Arguments),
    /// Build every project honoring the dependency graph, skipping unchanged ones.
    Build(build::Arguments),
    /// Like `build`, but never skips a project via the incremental cache.
    Rebuild(build::Arguments),
    /// Materialize local symlinks for inter-project dependencies.
    Link(link::Arguments),
    /// Tear down local symlinks created by `link`.
    Unlink(unlink::Arguments),
    /// Generate the common manifest and stub archives without installing.
    Generate(generate::Arguments),
    /// Record a change request for one or more packages.
    Change(change::Arguments),
    /// Apply pending change requests: bump versions and emit changelogs.
    Publish(publish::Arguments),
    /// Versioning and release-policy inspection.
    #[command(subcommand)]
    Version(version::Commands),
    /// Scan a build log for diagnostics.
    Scan(scan::Arguments),
    /// Validate the workspace beyond what loading already enforces.
    Check(check::Arguments),
    /// List every project in dependency order.
    List(list::Arguments),
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Commands {
    fn execute(&self, context: Context) -> Result {
        match self {
            Commands::Install(args) => args.execute(context),
            Commands::Build(args) => args.execute_with(context, false),
            Commands::Rebuild(args) => args.execute_with(context, true),
            Commands::Link(args) => args.execute(context),
            Commands::Unlink(args) => args.execute(context),
            Commands::Generate(args) => args.execute(context),
            Commands::Change(args) => args.execute(context),
            Commands::Publish(args) => args.execute(context),
            Commands::Version(args) => args.execute(context),
            Commands::Scan(args) => args.execute(context),
            Commands::Check(args) => args.execute(context),
            Commands::List(args) => args.execute(context),
        }
    }
}

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

//! Versioning and release-policy inspection.

use clap::Subcommand;

use crate::cli::command::Command;
use crate::cli::Result;
use crate::Context;

mod changed;
mod policies;
mod preview;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// `version` subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every declared version policy and its current state.
    Policies(policies::Arguments),
    /// List packages with a pending release-worthy change.
    Changed(changed::Arguments),
    /// Preview the changelog the next `publish` would produce.
    Preview(preview::Arguments),
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Commands {
    fn execute(&self, context: Context) -> Result {
        match self {
            Commands::Policies(args) => args.execute(context),
            Commands::Changed(args) => args.execute(context),
            Commands::Preview(args) => args.execute(context),
        }
    }
}

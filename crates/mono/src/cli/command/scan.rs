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

//! Scan a build log for diagnostics, either a persisted per-project log or
//! an arbitrary file.

use std::path::PathBuf;

use clap::{ArgGroup, Args};

use mono_build::{DisplayMode, Scanner};

use crate::cli::error::Error;
use crate::cli::command::Command;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Scan a build log for diagnostics.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["project", "path"])))]
pub struct Arguments {
    /// Project whose persisted build log should be scanned.
    #[arg(long)]
    project: Option<String>,
    /// Arbitrary log file to scan instead of a project's persisted log.
    #[arg(long)]
    path: Option<PathBuf>,
    /// Emit IDE-linked annotations instead of plain diagnostics.
    #[arg(long)]
    vso: bool,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;

        let path = if let Some(path) = &self.path {
            path.clone()
        } else {
            let name = self.project.as_deref().expect("clap enforces exactly one of project/path");
            let project = workspace.get(name).ok_or_else(|| Error::UnknownProject(name.to_string()))?;
            workspace.root().join("common/temp/build-logs").join(format!("{}.log", sanitize(&project.manifest.name)))
        };

        let content = std::fs::read_to_string(&path)?;
        let scanner = Scanner::new();
        let diagnostics = scanner.scan(&content);

        let display = if self.vso { DisplayMode::CiLinked } else { DisplayMode::Local };
        for diagnostic in &diagnostics {
            println!("{}", diagnostic.render(display));
        }
        if diagnostics.is_empty() {
            println!("no diagnostics found in {}", path.display());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Replaces path-hostile characters in a project name for use as a file
/// name, mirroring how build logs are named when written.
fn sanitize(name: &str) -> String {
    name.replace(['/', '\\', '@'], "-")
}

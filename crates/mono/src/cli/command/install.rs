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

//! Install the common installation: plan, validate, drive the installer,
//! link.

use clap::Args;
use console::style;

use mono_install::{Driver, Linker, Mode, Outcome as DriverOutcome, Paths, Planner, Verdict};
use mono_lockfile::Lockfile;

use crate::cli::command::Command;
use crate::cli::command::generate::{common_temp_folder, read_explicit_pins, write_common_manifest};
use crate::cli::error::Error;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Install the common installation, synthesizing stubs and local links.
#[derive(Args, Debug)]
pub struct Arguments {
    /// Recycle the install cache and a transient folder before installing.
    #[arg(long)]
    clean: bool,
    /// Like `--clean`, and also reinstall the installer tool itself.
    #[arg(long = "full-clean")]
    full_clean: bool,
    /// Skip the approved-packages review-category check.
    #[arg(long = "bypass-policy")]
    bypass_policy: bool,
    /// Skip materializing local symlinks after installing.
    #[arg(long = "no-link")]
    no_link: bool,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;
        let root = workspace.root().to_path_buf();

        if self.bypass_policy {
            tracing::warn!(
                "--bypass-policy has no effect: review-category violations are fatal at \
                 workspace load, before any subcommand runs"
            );
        }

        let lockfile_path = root.join(&workspace.config().lockfile_path);
        let lockfile = lockfile_path.is_file().then(|| Lockfile::read(&lockfile_path)).transpose()?;

        let pins = read_explicit_pins(&root)?;
        let plan = Planner::new(workspace).plan(&pins, lockfile.as_ref())?;

        if let Verdict::Invalid(reasons) = &plan.verdict {
            return Err(Error::InvalidLockfile(reasons.clone()));
        }

        write_common_manifest(&root, &plan)?;

        let temp = common_temp_folder(&root);
        std::fs::create_dir_all(&temp)?;

        let paths = Paths {
            success_marker: temp.join("last-install.flag"),
            modules_folder: temp.join("node_modules"),
            lockfile: lockfile_path,
            stub_archives: plan.archives.values().map(|outcome| outcome.path.clone()).collect(),
            tool_version_marker: temp.join(format!("{}-version.flag", workspace.config().installer_name)),
            install_cache: temp.join("install-cache"),
            transient_folder: temp.join("transient"),
        };

        let mode = if self.full_clean {
            Mode::UnsafePurge
        } else if self.clean {
            Mode::ForceClean
        } else {
            Mode::Normal
        };

        let installer_cwd = temp.clone();
        let installer_name = workspace.config().installer_name.clone();
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("cd {:?} && {installer_name} install", installer_cwd),
        ];
        let driver = Driver::new(paths, command);
        match driver.install(mode)? {
            DriverOutcome::Skipped => println!("{}", style("install up to date, skipped").dim()),
            DriverOutcome::Installed => println!("{}", style("install complete").green()),
        }

        if !self.no_link {
            Linker::new(workspace).link(&plan.local_links)?;
            println!("{}", style("local links materialized").green());
        }

        Ok(())
    }
}

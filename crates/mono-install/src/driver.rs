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

//! Installer driver.
//!
//! Decides between an incremental prune+install, a clean install, and an
//! aggressive purge, based on install-mode flags and file timestamps, then
//! drives the external installer subprocess with bounded retry.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use crate::error::{Error, Result};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Maximum number of attempts to invoke the installer command.
const MAX_ATTEMPTS: u32 = 5;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Install mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Incremental prune+install, reusing the existing shared install.
    #[default]
    Normal,
    /// Recycle the install cache and a transient folder before installing.
    ForceClean,
    /// In addition to `ForceClean`, reinstall the installer tool itself.
    UnsafePurge,
}

/// Outcome of a single [`Driver::install`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No potentially-changed input was newer than the success marker.
    Skipped,
    /// The installer ran (possibly after teardown) and the marker was
    /// recreated.
    Installed,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Paths the driver inspects and mutates.
#[derive(Clone, Debug)]
pub struct Paths {
    /// Success-marker file (e.g. `common/temp/last-install.flag`).
    pub success_marker: PathBuf,
    /// Shared installed-modules folder (e.g. `common/temp/node_modules`).
    pub modules_folder: PathBuf,
    /// Committed lockfile, copied into the working tree.
    pub lockfile: PathBuf,
    /// Per-project stub archive paths, as produced by the planner.
    pub stub_archives: Vec<PathBuf>,
    /// Installer tool-version marker.
    pub tool_version_marker: PathBuf,
    /// Install cache folder, recycled under `ForceClean`/`UnsafePurge`.
    pub install_cache: PathBuf,
    /// Transient folder, recycled under `ForceClean`/`UnsafePurge`.
    pub transient_folder: PathBuf,
}

/// Installer driver.
pub struct Driver {
    paths: Paths,
    command: Vec<String>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Driver {
    /// Creates a driver for the given paths, invoking `command` (argv) as the
    /// external installer.
    #[must_use]
    pub fn new(paths: Paths, command: Vec<String>) -> Self {
        Self { paths, command }
    }

    /// Runs the install flow for the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] for filesystem failures, and
    /// [`Error::InstallerFailed`] if the installer command fails on every
    /// retry attempt.
    pub fn install(&self, mode: Mode) -> Result<Outcome> {
        let had_prior_success = self.paths.success_marker.is_file();

        if had_prior_success && !self.is_dirty()? {
            tracing::info!("install inputs unchanged since last success, skipping");
            return Ok(Outcome::Skipped);
        }

        remove_if_exists(&self.paths.success_marker)?;

        if !had_prior_success && mode == Mode::Normal {
            tracing::warn!("no prior successful install, treating shared modules as dirty");
            recycle(&self.paths.modules_folder)?;
        }

        if mode != Mode::Normal {
            recycle(&self.paths.install_cache)?;
            recycle(&self.paths.transient_folder)?;
        }
        if mode == Mode::UnsafePurge {
            remove_if_exists(&self.paths.tool_version_marker)?;
        }

        self.run_installer()?;

        if had_prior_success && mode == Mode::Normal {
            self.prune_temp_scope()?;
        }

        std::fs::write(&self.paths.success_marker, "")?;
        Ok(Outcome::Installed)
    }

    /// Returns whether any potentially-changed input has a modification time
    /// newer than the success marker.
    fn is_dirty(&self) -> Result<bool> {
        let marker_time = modified(&self.paths.success_marker)?;

        let mut candidates = vec![self.paths.modules_folder.clone(), self.paths.lockfile.clone()];
        candidates.extend(self.paths.stub_archives.iter().cloned());

        for candidate in candidates {
            if let Ok(time) = modified(&candidate) {
                if time > marker_time {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Invokes the installer command, retrying up to [`MAX_ATTEMPTS`] times.
    fn run_installer(&self) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };

        let mut last_output = Vec::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let output = Command::new(program).args(args).output()?;
            if output.status.success() {
                return Ok(());
            }
            tracing::warn!(attempt, "installer command failed, retrying");
            last_output = output.stderr;
        }

        tracing::error!(command = self.command.join(" "), output = %String::from_utf8_lossy(&last_output), "installer exhausted retries");
        Err(Error::InstallerFailed { command: self.command.join(" "), attempts: MAX_ATTEMPTS })
    }

    /// Removes reserved-temp-scope entries from the installed tree, since the
    /// installer can't detect `file:` stub content changes on its own.
    fn prune_temp_scope(&self) -> Result<()> {
        let scoped = self.paths.modules_folder.join(mono_project::project::TEMP_SCOPE.trim_start_matches('@'));
        if scoped.is_dir() {
            std::fs::remove_dir_all(&scoped)?;
        }
        Ok(())
    }
}

/// Returns `path`'s modification time, or `UNIX_EPOCH` if it doesn't exist.
fn modified(path: &Path) -> Result<SystemTime> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(metadata.modified()?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SystemTime::UNIX_EPOCH),
        Err(err) => Err(err.into()),
    }
}

/// Removes a file if present; a no-op if it's already absent.
fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Tears down a folder by renaming it aside then deleting the renamed copy,
/// so the expensive deletion doesn't block the caller from proceeding to the
/// next step. A no-op if the folder doesn't exist.
fn recycle(folder: &Path) -> Result<()> {
    if !folder.exists() {
        return Ok(());
    }
    let recycled = folder.with_extension("recycle");
    std::fs::rename(folder, &recycled)?;
    std::fs::remove_dir_all(&recycled)?;
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(root: &Path) -> Paths {
        Paths {
            success_marker: root.join("last-install.flag"),
            modules_folder: root.join("node_modules"),
            lockfile: root.join("npm-shrinkwrap.json"),
            stub_archives: vec![],
            tool_version_marker: root.join("tool-version.flag"),
            install_cache: root.join("install-cache"),
            transient_folder: root.join("transient"),
        }
    }

    #[test]
    fn skips_when_nothing_changed_since_last_success() {
        let dir = TempDir::new().unwrap();
        let p = paths(dir.path());
        std::fs::write(&p.lockfile, "{}").unwrap();
        std::fs::write(&p.success_marker, "").unwrap();

        let driver = Driver::new(p, vec![]);
        let outcome = driver.install(Mode::Normal).unwrap();
        assert_eq!(outcome, Outcome::Skipped);
    }

    #[test]
    fn installs_when_lockfile_is_newer_than_marker() {
        let dir = TempDir::new().unwrap();
        let p = paths(dir.path());
        std::fs::write(&p.success_marker, "").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::write(&p.lockfile, "{}").unwrap();

        let driver = Driver::new(p.clone(), vec![]);
        let outcome = driver.install(Mode::Normal).unwrap();
        assert_eq!(outcome, Outcome::Installed);
        assert!(p.success_marker.is_file());
    }

    #[test]
    fn recycles_folder_on_force_clean() {
        let dir = TempDir::new().unwrap();
        let p = paths(dir.path());
        std::fs::create_dir_all(&p.install_cache).unwrap();
        std::fs::write(p.install_cache.join("marker"), "x").unwrap();

        let driver = Driver::new(p.clone(), vec![]);
        driver.install(Mode::ForceClean).unwrap();
        assert!(!p.install_cache.exists());
    }
}

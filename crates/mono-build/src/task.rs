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

//! Build task.
//!
//! Wires the change-hash analyzer ([`crate::fingerprint`]), the diagnostic
//! scanner ([`crate::diagnostic`]) and a project's `clean`/`build`/`test`
//! scripts into a single [`Scheduler`][crate::scheduler::Scheduler] runner.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use mono_project::Project;

use crate::diagnostic::{DisplayMode, Scanner};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::scheduler::Outcome;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Build mode flags, appended to the resolved build command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// Append `--production`.
    pub production: bool,
    /// Append `--npm` (use npm instead of the project's configured package manager).
    pub npm: bool,
    /// Append `--minimal`.
    pub minimal: bool,
    /// Diagnostic display mode used when emitting failures.
    pub display: DisplayModeOption,
}

/// Which [`DisplayMode`] a build task renders diagnostics in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayModeOption {
    /// Local developer terminal.
    Local,
    /// CI with IDE-linked annotations (`--vso`).
    CiLinked,
    /// CI plain text.
    CiPlain,
}

impl Default for DisplayModeOption {
    fn default() -> Self {
        Self::Local
    }
}

impl From<DisplayModeOption> for DisplayMode {
    fn from(value: DisplayModeOption) -> Self {
        match value {
            DisplayModeOption::Local => DisplayMode::Local,
            DisplayModeOption::CiLinked => DisplayMode::CiLinked,
            DisplayModeOption::CiPlain => DisplayMode::CiPlain,
        }
    }
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Per-project unit of work, ready to be handed to the scheduler as a
/// [`Runner`][crate::scheduler::Runner].
pub struct BuildTask {
    /// Project this task builds.
    folder: PathBuf,
    /// Project name, used for diagnostics and log file naming.
    name: String,
    /// `clean` script source, if declared.
    clean_script: Option<String>,
    /// `test` script if declared, else the `build` script.
    build_script: Option<String>,
    /// Mode flags appended to the build command.
    mode: BuildMode,
    /// Folder build/clean logs are written under.
    log_folder: PathBuf,
    /// Forces incremental eligibility off regardless of upstream state, for `rebuild`.
    force: bool,
}

impl BuildTask {
    /// Builds a task from a resolved project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCleanScript`] if `project` declares no `clean`
    /// script, and [`Error::MissingBuildScript`] if it declares neither
    /// `test` nor `build`.
    pub fn new<P>(project: &Project, log_folder: P, mode: BuildMode, force: bool) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let name = project.manifest.name.clone();
        let clean_script = project
            .manifest
            .scripts
            .get("clean")
            .cloned()
            .ok_or_else(|| Error::MissingCleanScript(name.clone()))?;
        let build_script = project
            .manifest
            .scripts
            .get("test")
            .or_else(|| project.manifest.scripts.get("build"))
            .cloned()
            .ok_or_else(|| Error::MissingBuildScript(name.clone()))?;

        Ok(Self {
            folder: project.folder.clone(),
            name,
            clean_script: Some(clean_script),
            build_script: Some(build_script),
            mode,
            log_folder: log_folder.as_ref().to_path_buf(),
            force,
        })
    }

    /// Runs the task to completion, writing interleaved output into `writer`.
    ///
    /// `incremental_allowed` additionally reflects whether any upstream
    /// dependency invalidated this task's incremental eligibility; `force`
    /// (set at construction for `rebuild`) always wins over both.
    pub fn run(&self, incremental_allowed: bool, writer: &mut dyn Write) -> Outcome {
        match self.run_inner(incremental_allowed, writer) {
            Ok(outcome) => outcome,
            Err(err) => {
                let _ = writeln!(writer, "error: {err}");
                Outcome::Failure
            }
        }
    }

    fn run_inner(&self, incremental_allowed: bool, writer: &mut dyn Write) -> Result<Outcome> {
        let command_line = self.command_line();
        let current = Fingerprint::compute(&self.folder, &command_line)?;
        let previous = Fingerprint::load(&self.folder)?;

        let allowed = incremental_allowed && !self.force;
        if allowed {
            if let Some(previous) = &previous {
                if current.unchanged(previous) {
                    tracing::debug!(name = self.name, "fingerprint unchanged, skipping");
                    return Ok(Outcome::Skipped);
                }
            }
        }

        tracing::info!(name = self.name, "running build task");

        Fingerprint::clear(&self.folder)?;

        let clean_script = self.clean_script.as_deref().unwrap_or_default();
        if !clean_script.trim().is_empty() {
            let clean_output = self.run_script(clean_script)?;
            writer.write_all(&clean_output.combined)?;
            if !clean_output.success {
                self.write_log(&clean_output.combined)?;
                return Ok(Outcome::Failure);
            }
        } else {
            writeln!(writer, "-- clean script is a no-op for {}", self.name)?;
        }

        let output = self.run_script(&command_line)?;
        writer.write_all(&output.combined)?;

        let scanner = Scanner::new();
        let combined_text = String::from_utf8_lossy(&output.combined);
        let diagnostics = scanner.scan(&combined_text);

        self.write_log(&output.combined)?;

        if !output.success || !diagnostics.is_empty() {
            let display: DisplayMode = self.mode.display.into();
            for diagnostic in &diagnostics {
                writeln!(writer, "{}", diagnostic.render(display))?;
            }
            return Ok(Outcome::Failure);
        }

        if output.had_stderr {
            return Ok(Outcome::SuccessWithWarnings);
        }

        current.save(&self.folder)?;
        Ok(Outcome::Success)
    }

    /// Resolves the command line the build script is invoked with, including
    /// mode flags — the same string that feeds the fingerprint's `command`.
    fn command_line(&self) -> String {
        let mut command = self.build_script.clone().unwrap_or_default();
        if self.mode.production {
            command.push_str(" --production");
        }
        if self.mode.npm {
            command.push_str(" --npm");
        }
        if self.mode.minimal {
            command.push_str(" --minimal");
        }
        command
    }

    /// Runs a shell command synchronously in the project folder, streaming
    /// stdout/stderr concurrently so neither pipe can fill up and deadlock
    /// the child.
    fn run_script(&self, command_line: &str) -> Result<ScriptOutput> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .current_dir(&self.folder)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, rx) = mpsc::channel();
        let stdout_tx = tx.clone();
        let stdout_handle = thread::spawn(move || {
            let _ = stdout_tx.send((read_all(stdout), false));
        });
        let stderr_handle = thread::spawn(move || {
            let _ = tx.send((read_all(stderr), true));
        });

        let mut combined = Vec::new();
        let mut had_stderr = false;
        for _ in 0..2 {
            if let Ok((bytes, is_stderr)) = rx.recv() {
                if is_stderr && !bytes.is_empty() {
                    had_stderr = true;
                }
                combined.extend(bytes);
            }
        }
        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        let status = child.wait()?;
        Ok(ScriptOutput { combined, had_stderr, success: status.success() })
    }

    /// Writes combined output to the project's per-task log file, with ANSI
    /// escapes stripped.
    fn write_log(&self, combined: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.log_folder)?;
        let path = self.log_folder.join(format!("{}.log", sanitize(&self.name)));
        let text = String::from_utf8_lossy(combined);
        let stripped = console::strip_ansi_codes(&text);
        std::fs::write(path, stripped.as_bytes())?;
        Ok(())
    }
}

/// Output captured from a single script invocation.
struct ScriptOutput {
    combined: Vec<u8>,
    had_stderr: bool,
    success: bool,
}

/// Reads a pipe to completion.
fn read_all<R: std::io::Read>(mut reader: R) -> Vec<u8> {
    let mut buffer = Vec::new();
    let _ = reader.read_to_end(&mut buffer);
    buffer
}

/// Replaces path-hostile characters in a project name for use as a file name.
fn sanitize(name: &str) -> String {
    name.replace(['/', '\\', '@'], "-")
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_scoped_package_names() {
        assert_eq!(sanitize("@scope/pkg"), "-scope-pkg");
    }

    #[test]
    fn build_mode_command_line_appends_flags_in_order() {
        let task = BuildTask {
            folder: PathBuf::from("."),
            name: "pkg".into(),
            clean_script: Some(String::new()),
            build_script: Some("node build.js".into()),
            mode: BuildMode { production: true, npm: false, minimal: true, display: DisplayModeOption::Local },
            log_folder: PathBuf::from("."),
            force: false,
        };
        assert_eq!(task.command_line(), "node build.js --production --minimal");
    }
}

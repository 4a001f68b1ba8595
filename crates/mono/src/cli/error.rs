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

//! Errors.
//!
//! The CLI layer is the one place in the workspace that sees every core
//! component at once, so its error type is a thin sum over each component's
//! own error type rather than a component having to know about its siblings.

// ----------------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------------

/// Result, defaulting to `()` like the rest of the workspace.
pub type Result<T = ()> = std::result::Result<T, Error>;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Workspace model error.
    #[error(transparent)]
    Project(#[from] mono_project::Error),
    /// Lockfile query adapter error.
    #[error(transparent)]
    Lockfile(#[from] mono_lockfile::Error),
    /// Install planner / driver / linker error.
    #[error(transparent)]
    Install(#[from] mono_install::Error),
    /// Scheduler / build task error.
    #[error(transparent)]
    Build(#[from] mono_build::Error),
    /// Version policy / change pipeline error.
    #[error(transparent)]
    Changeset(#[from] mono_changeset::Error),
    /// The install planner reported an invalid lockfile.
    #[error("lockfile is invalid, a re-resolution is required:\n{}", .0.join("\n"))]
    InvalidLockfile(Vec<String>),
    /// A selector given to `--to`/`--from` matched no project.
    #[error("no project matches `{0}`")]
    UnknownProject(String),
    /// A project was pointed at a version policy that no longer exists.
    #[error("project `{project}` references unknown version policy `{policy}`")]
    UnknownPolicy {
        /// Project name.
        project: String,
        /// Referenced policy name.
        policy: String,
    },
}

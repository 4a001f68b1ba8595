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

// ----------------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------------

/// Result.
pub type Result<T = ()> = std::result::Result<T, Error>;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A task was registered under a name that's already taken.
    #[error("duplicate task: {0}")]
    DuplicateTask(String),
    /// `add_dependencies` referenced a task that was never registered.
    #[error("task `{task}` depends on unknown task `{dependency}`")]
    UnknownDependency { task: String, dependency: String },
    /// The task graph contains a cycle.
    #[error("task graph contains a cycle: {0}")]
    Cycle(String),
    /// The scheduler run completed with at least one task `Failure`.
    #[error("{0} task(s) failed")]
    Failed(usize),
    /// A project declares neither `clean` script.
    #[error("project `{0}` has no `clean` script")]
    MissingCleanScript(String),
    /// A project declares neither a `test` nor a `build` script.
    #[error("project `{0}` has no `test` or `build` script")]
    MissingBuildScript(String),
}

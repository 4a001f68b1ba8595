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

use std::path::PathBuf;

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
    /// Semantic version error.
    #[error(transparent)]
    Semver(#[from] semver::Error),
    /// Glob pattern error.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    /// Manifest content does not parse as a JSON object.
    #[error("manifest content is not a JSON object")]
    ManifestNotAnObject,
    /// Project folder is missing at the configured path.
    #[error("project folder not found: {0}")]
    FolderMissing(PathBuf),
    /// Project folder depth falls outside the configured bounds.
    #[error(
        "project folder `{folder}` has depth {depth}, expected between \
         {min} and {max}"
    )]
    FolderDepth { folder: PathBuf, depth: usize, min: usize, max: usize },
    /// Manifest name does not match the declared package name.
    #[error(
        "manifest name `{manifest}` does not match declared package name \
         `{declared}`"
    )]
    NameMismatch { declared: String, manifest: String },
    /// Package name is not unique in the workspace.
    #[error("duplicate package name: {0}")]
    DuplicateName(String),
    /// Review category is required but missing.
    #[error("project `{0}` is missing a required review category")]
    ReviewCategoryMissing(String),
    /// Review category is not one of the declared categories.
    #[error(
        "project `{project}` has unknown review category `{category}`"
    )]
    ReviewCategoryUnknown { project: String, category: String },
    /// Reference to an undeclared version policy.
    #[error("project `{project}` references unknown version policy `{policy}`")]
    UnknownPolicy { project: String, policy: String },
    /// The local dependency graph contains a cycle that is not broken by a
    /// cyclic exemption.
    #[error("dependency cycle detected: {0}")]
    Cycle(String),
    /// A declared local dependency range is not satisfied by the local
    /// project's version, and the dependency is not exempted.
    #[error(
        "project `{project}` declares `{dependency}` at `{range}`, which is \
         not satisfied by local version {version}"
    )]
    RangeUnsatisfied {
        project: String,
        dependency: String,
        range: String,
        version: semver::Version,
    },
}

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

use semver::Version;
use std::path::PathBuf;

// ----------------------------------------------------------------------------
// Types
// ----------------------------------------------------------------------------

/// Result type alias.
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
    /// JSON parse error.
    #[error("{path}: {source}")]
    Json {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Project model error.
    #[error(transparent)]
    Project(#[from] mono_project::Error),
    /// A package's current version is ahead of its lock-step policy version.
    #[error(
        "package `{package}` is at {found}, which is ahead of lock-step policy \
         `{policy}` at {expected}"
    )]
    VersionAheadOfPolicy {
        /// Policy name.
        policy: String,
        /// Package name.
        package: String,
        /// Package's current version.
        found: Version,
        /// Policy's current version.
        expected: Version,
    },
    /// A package's version doesn't match its lock-step policy version.
    #[error(
        "package `{package}` is at {found}, which doesn't match lock-step policy \
         `{policy}` at {expected}"
    )]
    VersionMismatch {
        /// Policy name.
        policy: String,
        /// Package name.
        package: String,
        /// Package's version.
        found: Version,
        /// Policy's version.
        expected: Version,
    },
    /// A package's major version is ahead of its individual policy's locked major.
    #[error(
        "package `{package}` is at {found}, whose major version is ahead of the \
         locked major {locked_major}"
    )]
    MajorAheadOfPolicy {
        /// Package name.
        package: String,
        /// Package's current version.
        found: Version,
        /// Policy's locked major.
        locked_major: u64,
    },
    /// A package's major version doesn't match its individual policy's locked major.
    #[error(
        "package `{package}` is at {found}, whose major version doesn't match the \
         locked major {locked_major}"
    )]
    MajorMismatch {
        /// Package name.
        package: String,
        /// Package's version.
        found: Version,
        /// Policy's locked major.
        locked_major: u64,
    },
    /// A project references a version policy that doesn't exist.
    #[error("project `{project}` references unknown version policy `{policy}`")]
    UnknownPolicy {
        /// Project name.
        project: String,
        /// Referenced policy name.
        policy: String,
    },
    /// A change file doesn't decode as a valid change envelope.
    #[error("{0}: not a valid change file")]
    InvalidChangeFile(PathBuf),
}

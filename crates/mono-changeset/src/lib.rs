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

//! Version policy engine and change pipeline.
//!
//! Two largely independent pieces live here, wired together by the command
//! line rather than by each other: the version policy [`Registry`] governs
//! what version a package is *allowed* to carry, while the change [`Pipeline`]
//! computes what version a package *should* move to given accumulated change
//! files. A caller driving a release normalizes every policy-governed project
//! against its policy first, runs the pipeline, then validates the result.

pub mod change;
pub mod error;
pub mod policy;

pub use change::{
    changelog, render_changelog, ChangeEntry, ChangeFile, ChangeKind, ChangeSet, ChangelogEntry,
    Comment, Pipeline, CHANGE_FOLDER,
};
pub use error::{Error, Result};
pub use policy::{Policy, Registry, POLICY_FILE};

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

//! Generate the common installation manifest and stub archives, without
//! driving the installer or linking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Deserialize;

use mono_install::{Plan, Planner};
use mono_lockfile::Lockfile;
use mono_project::manifest::Range;

use crate::cli::command::Command;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Generate the common manifest and stub archives without installing.
#[derive(Args, Debug)]
pub struct Arguments {}

/// On-disk form of `common/config/common-versions.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonVersions {
    /// Operator-declared pins, applied over implicit unanimous-range pins.
    #[serde(default)]
    preferred_versions: BTreeMap<String, String>,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;
        let root = workspace.root().to_path_buf();

        let lockfile_path = root.join(&workspace.config().lockfile_path);
        let lockfile = lockfile_path.is_file().then(|| Lockfile::read(&lockfile_path)).transpose()?;

        let pins = read_explicit_pins(&root)?;
        let plan = Planner::new(workspace).plan(&pins, lockfile.as_ref())?;
        write_common_manifest(&root, &plan)?;

        let rewritten = plan.archives.values().filter(|outcome| outcome.rewritten).count();
        println!("{}", style(format!("wrote common manifest, {rewritten} stub archive(s) rewritten")).green());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Folder holding the common install state, relative to the workspace root.
pub(super) fn common_temp_folder(root: &Path) -> PathBuf {
    root.join("common/temp")
}

/// Reads operator-declared version pins from `common/config/common-versions.json`,
/// returning an empty map if the file doesn't exist.
pub(super) fn read_explicit_pins(root: &Path) -> Result<BTreeMap<String, Range>> {
    let path = root.join("common/config/common-versions.json");
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let versions: CommonVersions = serde_json::from_str(&content)?;
    Ok(versions.preferred_versions.into_iter().map(|(name, range)| (name, Range::parse(range))).collect())
}

/// Writes the synthesized common manifest as `common/temp/package.json`, the
/// file the installer tool is invoked against.
pub(super) fn write_common_manifest(root: &Path, plan: &Plan) -> Result<()> {
    let folder = common_temp_folder(root);
    std::fs::create_dir_all(&folder)?;
    let content = serde_json::to_vec_pretty(&plan.common_manifest)?;
    std::fs::write(folder.join("package.json"), content)?;
    Ok(())
}

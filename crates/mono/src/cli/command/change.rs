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

//! Record a change request for one or more packages.

use clap::Args;
use cliclack::{input, multiselect, outro, select};
use console::style;
use serde::Serialize;

use mono_changeset::{ChangeKind, CHANGE_FOLDER};

use crate::cli::command::Command;
use crate::cli::error::Error;
use crate::cli::Result;
use crate::Context;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Record a change request for one or more packages.
#[derive(Args, Debug)]
pub struct Arguments {}

/// On-disk form of a single package entry, written out verbatim.
#[derive(Serialize)]
struct Entry {
    #[serde(rename = "packageName")]
    package_name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    comment: String,
}

/// On-disk form of a change file, matching what the pipeline reads back.
#[derive(Serialize)]
struct File {
    #[serde(rename = "packageName")]
    package_name: String,
    email: Option<String>,
    changes: Vec<Entry>,
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl Command for Arguments {
    fn execute(&self, context: Context) -> Result {
        let workspace = &context.workspace;
        if workspace.is_empty() {
            return Err(Error::UnknownProject("<none declared>".to_string()));
        }

        let names: Vec<String> = workspace.iter().map(|project| project.package_name.clone()).collect();
        let mut builder = multiselect("Which package(s) changed?").required(true);
        for name in &names {
            builder = builder.item(name.clone(), name, "");
        }
        let selected: Vec<String> = builder.interact()?;

        let mut entries = Vec::with_capacity(selected.len());
        for package_name in selected {
            let kind = select(format!("What kind of change is this for {package_name}?"))
                .item(ChangeKind::Patch, "Patch", "backwards-compatible bug fix")
                .item(ChangeKind::Minor, "Minor", "backwards-compatible feature")
                .item(ChangeKind::Major, "Major", "breaking change")
                .item(ChangeKind::None, "None", "no release impact, changelog only")
                .interact()?;
            let comment: String = input(format!("Describe the change to {package_name}")).interact()?;
            entries.push(Entry { package_name, kind: kind_label(kind), comment });
        }

        let author = std::env::var("USER").ok();
        let leading_package = entries.first().map(|entry| entry.package_name.clone()).unwrap_or_default();
        let file = File { package_name: leading_package, email: author.map(|user| format!("{user}@local")), changes: entries };

        let folder = workspace.root().join(CHANGE_FOLDER);
        std::fs::create_dir_all(&folder)?;
        let path = unique_change_path(&folder, &file.package_name);
        std::fs::write(&path, serde_json::to_vec_pretty(&file)?)?;

        outro(style(format!("wrote {}", path.display())).green())?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Serializes a [`ChangeKind`] back to the `type` string the pipeline reads.
fn kind_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::None => "none",
        ChangeKind::Dependency => "dependency",
        ChangeKind::Patch => "patch",
        ChangeKind::Minor => "minor",
        ChangeKind::Major => "major",
    }
}

/// Finds a filename under `folder` that doesn't already exist, based on
/// `package_name` and a numeric suffix probed upward from zero.
fn unique_change_path(folder: &std::path::Path, package_name: &str) -> std::path::PathBuf {
    let stem = package_name.trim_start_matches('@').replace('/', "-");
    for index in 0.. {
        let path = folder.join(format!("{stem}-{index}.json"));
        if !path.exists() {
            return path;
        }
    }
    unreachable!("folder cannot contain usize::MAX entries")
}

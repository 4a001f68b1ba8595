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

//! Change-hash analyzer.
//!
//! Computes a stable content fingerprint over a project's tracked source
//! files plus the exact command line that would build it, so the build task
//! can decide whether a project's inputs changed since its last successful
//! build.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Name of the per-project fingerprint file, relative to the project folder.
pub const FINGERPRINT_FILE: &str = "package-deps.json";

/// Folder names excluded from the tracked source set.
const EXCLUDED: [&str; 3] = ["node_modules", "common", ".git"];

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Change-hash fingerprint.
///
/// Two fingerprints are equal for incremental-skip purposes when they carry
/// the same file keyset, the same hash for every key, and the same command.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Fingerprint {
    /// Tracked file path (relative to the project folder) to content hash.
    pub files: BTreeMap<String, String>,
    /// Exact command line this fingerprint was computed for.
    pub command: String,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Fingerprint {
    /// Resolves the fingerprint file path for a project folder.
    #[must_use]
    pub fn resolve<P>(folder: P) -> std::path::PathBuf
    where
        P: AsRef<Path>,
    {
        folder.as_ref().join(FINGERPRINT_FILE)
    }

    /// Computes the fingerprint for a project folder and build command.
    ///
    /// Walks the project folder, skipping [`EXCLUDED`] directories and
    /// hidden entries, hashing every regular file's content with SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if a tracked file can't be
    /// read. Callers should treat any such failure as "must rebuild", per the
    /// spec's fallback for IO/compute errors.
    pub fn compute<P, S>(folder: P, command: S) -> Result<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        let folder = folder.as_ref();
        let mut files = BTreeMap::new();

        let walker = WalkDir::new(folder).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if entry.depth() == 0 {
                return true;
            }
            !EXCLUDED.contains(&name.as_ref()) && name != FINGERPRINT_FILE && !name.starts_with('.')
        });

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let content = std::fs::read(entry.path())?;
            let digest = Sha256::digest(&content);
            let key = entry
                .path()
                .strip_prefix(folder)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            files.insert(key, hex(&digest));
        }

        Ok(Self { files, command: command.into() })
    }

    /// Loads a previously persisted fingerprint, if present.
    ///
    /// Returns `Ok(None)` (not an error) when the file doesn't exist, since
    /// that's the ordinary "never built before" state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`][crate::Error::Json] if the file exists but
    /// doesn't parse.
    pub fn load<P>(folder: P) -> Result<Option<Self>>
    where
        P: AsRef<Path>,
    {
        let path = Self::resolve(&folder);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persists the fingerprint to its project folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] or
    /// [`Error::Json`][crate::Error::Json] on write/serialization failure.
    pub fn save<P>(&self, folder: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = Self::resolve(&folder);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Removes a previously persisted fingerprint, if any.
    ///
    /// Called before a rebuild starts, so that an interrupted build can never
    /// be mistaken for a finished one on the next run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] for any failure other than the
    /// file already being absent.
    pub fn clear<P>(folder: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = Self::resolve(folder);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns whether `self` is unchanged relative to `previous`.
    ///
    /// Requires the same keyset, equal hash for every key, and an equal
    /// command line.
    #[must_use]
    pub fn unchanged(&self, previous: &Fingerprint) -> bool {
        self.command == previous.command && self.files == previous.files
    }
}

/// Renders bytes as lowercase hex.
fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn computes_same_fingerprint_for_same_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), b"hello").unwrap();

        let a = Fingerprint::compute(dir.path(), "build").unwrap();
        let b = Fingerprint::compute(dir.path(), "build").unwrap();
        assert!(a.unchanged(&b));
    }

    #[test]
    fn detects_content_change() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), b"hello").unwrap();
        let before = Fingerprint::compute(dir.path(), "build").unwrap();

        std::fs::write(dir.path().join("a.ts"), b"world").unwrap();
        let after = Fingerprint::compute(dir.path(), "build").unwrap();
        assert!(!after.unchanged(&before));
    }

    #[test]
    fn detects_command_change() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), b"hello").unwrap();

        let a = Fingerprint::compute(dir.path(), "build").unwrap();
        let b = Fingerprint::compute(dir.path(), "build --production").unwrap();
        assert!(!a.unchanged(&b));
    }

    #[test]
    fn ignores_excluded_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/dep.js"), b"ignored").unwrap();
        std::fs::write(dir.path().join("a.ts"), b"tracked").unwrap();

        let fingerprint = Fingerprint::compute(dir.path(), "build").unwrap();
        assert_eq!(fingerprint.files.len(), 1);
        assert!(fingerprint.files.contains_key("a.ts"));
    }

    #[test]
    fn excludes_its_own_persisted_file_from_the_tracked_set() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), b"hello").unwrap();

        let before = Fingerprint::compute(dir.path(), "build").unwrap();
        before.save(dir.path()).unwrap();

        let after = Fingerprint::compute(dir.path(), "build").unwrap();
        assert!(after.unchanged(&before));
        assert!(!after.files.contains_key(FINGERPRINT_FILE));
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), b"hello").unwrap();
        let fingerprint = Fingerprint::compute(dir.path(), "build").unwrap();
        fingerprint.save(dir.path()).unwrap();

        let loaded = Fingerprint::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, fingerprint);

        Fingerprint::clear(dir.path()).unwrap();
        assert!(Fingerprint::load(dir.path()).unwrap().is_none());
    }
}

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

//! Dependency range.

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Dependency range.
///
/// Most dependency ranges are semantic version requirements, but the package
/// manifest format also allows non-semver specifiers – git references, tarball
/// URLs, tags, and workspace protocols. Per the Non-goals, we don't resolve
/// these, we pass them through and treat them as compatible wherever a
/// compatibility check is required, per [`Range::is_satisfied_by`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Range {
    /// A semantic version requirement, e.g. `^1.2.3` or `>=1.0.0 <2.0.0`.
    Semver(VersionReq, String),
    /// Any other specifier, passed through verbatim.
    Other(String),
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Range {
    /// Parses a range from its textual form.
    ///
    /// Ranges that don't parse as semantic version requirements are kept
    /// verbatim as [`Range::Other`] rather than rejected, since the manifest
    /// format allows non-semver specifiers.
    #[must_use]
    pub fn parse<S>(value: S) -> Self
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();
        match VersionReq::parse(value) {
            Ok(req) => Range::Semver(req, value.to_string()),
            Err(_) => Range::Other(value.to_string()),
        }
    }

    /// Returns whether the given version satisfies the range.
    ///
    /// Returns [`None`] for non-semver ranges, since compatibility can't be
    /// determined – callers should treat this as "assume compatible" and warn
    /// once, per the lockfile query adapter's behavior.
    #[must_use]
    pub fn is_satisfied_by(&self, version: &Version) -> Option<bool> {
        match self {
            Range::Semver(req, _) => Some(req.matches(version)),
            Range::Other(_) => None,
        }
    }

    /// Returns whether this is a pass-through (non-semver) range.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Range::Other(_))
    }

    /// Returns the textual form of the range.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Range::Semver(_, text) | Range::Other(text) => text,
        }
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Range::parse(text))
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_semver_range() {
        let range = Range::parse("^1.2.3");
        assert!(matches!(range, Range::Semver(..)));
        assert_eq!(range.as_str(), "^1.2.3");
    }

    #[test]
    fn parses_pass_through_range() {
        let range = Range::parse("workspace:*");
        assert!(range.is_pass_through());
        assert_eq!(range.is_satisfied_by(&Version::new(1, 0, 0)), None);
    }

    #[test]
    fn checks_satisfaction() {
        let range = Range::parse("^1.0.0");
        assert_eq!(range.is_satisfied_by(&Version::new(1, 2, 0)), Some(true));
        assert_eq!(range.is_satisfied_by(&Version::new(2, 0, 0)), Some(false));
    }
}

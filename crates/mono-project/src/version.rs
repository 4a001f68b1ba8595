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

//! Version increments.

use semver::{BuildMetadata, Error, Prerelease, Version};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Version increment.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Increment {
    /// No-op: leaves the version exactly as it is.
    None,
    /// Bump (or re-bump) the prerelease identifier, leaving `major.minor.patch`
    /// alone once a prerelease train has started.
    Prerelease,
    /// Bump the patch component.
    Patch,
    /// Bump the minor component and start a new prerelease train.
    Preminor,
    /// Bump the minor component.
    Minor,
    /// Bump the major component.
    Major,
}

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Extension of [`Version`].
pub trait VersionExt {
    /// Returns the next version after applying the given increment.
    ///
    /// `preid` names the prerelease identifier (e.g. `alpha`) used by
    /// [`Increment::Prerelease`] and [`Increment::Preminor`]; it's ignored by
    /// every other increment.
    fn bump(&self, increment: Increment, preid: &str) -> Version;

    /// Returns the minimum increment for the version.
    ///
    /// Versions in the `0.0.z` range can't be decomposed any further, so the
    /// minimum meaningful increment is a patch bump.
    fn min_bump(&self) -> Option<Increment>;

    /// Returns the maximum increment for the version.
    ///
    /// `0.y.z` versions cap out at a minor bump, since major version zero is
    /// reserved for pre-stable releases and incrementing it requires an
    /// explicit version override rather than an ordinary bump.
    fn max_bump(&self) -> Increment;

    /// Parses a version from a string, allowing for an optional `v` prefix.
    ///
    /// # Errors
    ///
    /// This method returns [`Error`] if parsing fails.
    fn from_str_with_prefix(value: &str) -> Result<Version, Error> {
        value.trim_start_matches('v').parse()
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl VersionExt for Version {
    fn bump(&self, increment: Increment, preid: &str) -> Version {
        let mut version = self.clone();

        match (self.major, self.minor, increment) {
            (_, _, Increment::None) => {}
            // 0.0.z -> 0.0.z+1, regardless of the requested increment
            (0, 0, _) => {
                version.patch = version.patch.saturating_add(1);
            }
            (0, _, Increment::Major | Increment::Minor | Increment::Preminor) => {
                version.minor = version.minor.saturating_add(1);
                version.patch = 0;
            }
            (0, _, Increment::Patch) => {
                version.patch = version.patch.saturating_add(1);
            }
            (0, _, Increment::Prerelease) => {}
            (_, _, Increment::Major) => {
                version.major = version.major.saturating_add(1);
                version.minor = 0;
                version.patch = 0;
            }
            (_, _, Increment::Minor | Increment::Preminor) => {
                version.minor = version.minor.saturating_add(1);
                version.patch = 0;
            }
            (_, _, Increment::Patch) => {
                version.patch = version.patch.saturating_add(1);
            }
            (_, _, Increment::Prerelease) => {}
        }

        match increment {
            Increment::None => return version,
            Increment::Prerelease => {
                version.pre = next_prerelease(&self.pre, preid);
            }
            Increment::Preminor => {
                version.pre = Prerelease::new(&format!("{preid}.0")).unwrap_or(Prerelease::EMPTY);
            }
            Increment::Patch | Increment::Minor | Increment::Major => {
                version.pre = Prerelease::EMPTY;
            }
        }
        version.build = BuildMetadata::EMPTY;
        version
    }

    fn min_bump(&self) -> Option<Increment> {
        if let (0, 0) = (self.major, self.minor) {
            Some(Increment::Patch)
        } else {
            None
        }
    }

    fn max_bump(&self) -> Increment {
        match (self.major, self.minor) {
            (0, 0) => Increment::Patch,
            (0, _) => Increment::Minor,
            (_, _) => Increment::Major,
        }
    }
}

/// Advances a prerelease identifier of the form `{preid}.{n}`.
///
/// If the current prerelease doesn't already use `preid`, a new train is
/// started at `{preid}.0`.
fn next_prerelease(current: &Prerelease, preid: &str) -> Prerelease {
    let text = current.as_str();
    if let Some(rest) = text.strip_prefix(preid).and_then(|r| r.strip_prefix('.')) {
        if let Ok(n) = rest.parse::<u64>() {
            let next = format!("{preid}.{}", n + 1);
            return Prerelease::new(&next).unwrap_or(Prerelease::EMPTY);
        }
    }
    Prerelease::new(&format!("{preid}.0")).unwrap_or(Prerelease::EMPTY)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_zero_zero_z_as_patch_regardless_of_increment() {
        let v: Version = "0.0.5".parse().unwrap();
        assert_eq!(v.bump(Increment::Major, "alpha"), "0.0.6".parse().unwrap());
        assert_eq!(v.bump(Increment::Minor, "alpha"), "0.0.6".parse().unwrap());
    }

    #[test]
    fn bumps_zero_y_z_minor_for_major_request() {
        let v: Version = "0.3.1".parse().unwrap();
        assert_eq!(v.bump(Increment::Major, "alpha"), "0.4.0".parse().unwrap());
    }

    #[test]
    fn bumps_stable_versions_normally() {
        let v: Version = "2.3.1".parse().unwrap();
        assert_eq!(v.bump(Increment::Major, "alpha"), "3.0.0".parse().unwrap());
        assert_eq!(v.bump(Increment::Minor, "alpha"), "2.4.0".parse().unwrap());
        assert_eq!(v.bump(Increment::Patch, "alpha"), "2.3.2".parse().unwrap());
    }

    #[test]
    fn starts_and_advances_prerelease_train() {
        let v: Version = "1.0.0".parse().unwrap();
        let started = v.bump(Increment::Preminor, "alpha");
        assert_eq!(started.to_string(), "1.1.0-alpha.0");

        let advanced = started.bump(Increment::Prerelease, "alpha");
        assert_eq!(advanced.to_string(), "1.1.0-alpha.1");
    }

    #[test]
    fn min_and_max_bump_reflect_zero_major() {
        let v: Version = "0.0.1".parse().unwrap();
        assert_eq!(v.min_bump(), Some(Increment::Patch));
        assert_eq!(v.max_bump(), Increment::Patch);

        let v: Version = "0.4.1".parse().unwrap();
        assert_eq!(v.min_bump(), None);
        assert_eq!(v.max_bump(), Increment::Minor);

        let v: Version = "2.0.0".parse().unwrap();
        assert_eq!(v.max_bump(), Increment::Major);
    }

    #[test]
    fn none_increment_leaves_version_untouched() {
        let v: Version = "1.2.3-alpha.0".parse().unwrap();
        assert_eq!(v.bump(Increment::None, "alpha"), v);
    }

    #[test]
    fn parses_version_with_v_prefix() {
        assert_eq!(
            Version::from_str_with_prefix("v1.2.3").unwrap(),
            "1.2.3".parse().unwrap()
        );
    }
}

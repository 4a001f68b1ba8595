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

//! Version policy engine.
//!
//! A version policy governs how a package's version may move. A *lock-step*
//! policy ties every package that references it to one shared version, bumped
//! as a unit; an *individual* policy lets each package bump independently but
//! pins its major version. Both are driven through the same three-operation
//! interface: `ensure` a package's on-disk version matches the policy (fixing
//! it up if it's merely behind), `bump` the policy itself, and `validate` that
//! a version is consistent with the policy without mutating anything.

use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use mono_project::{Increment, VersionExt};

use crate::error::{Error, Result};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Version policy file name, relative to the repository root.
pub const POLICY_FILE: &str = "common/config/version-policies.json";

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Version policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Every package referencing this policy shares one version, bumped
    /// together regardless of which of them actually changed.
    LockStep {
        /// Policy name.
        policy_name: String,
        /// Current locked version.
        version: Version,
        /// Increment applied by [`Policy::bump`] when none is specified.
        next_bump: Increment,
    },
    /// Packages referencing this policy bump independently, but their major
    /// version is pinned.
    Individual {
        /// Policy name.
        policy_name: String,
        /// Locked major version, if the policy pins one.
        locked_major: Option<u64>,
    },
}

/// Version policy definition, as read from [`POLICY_FILE`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "definitionName")]
enum PolicyDefinition {
    /// Lock-step definition.
    #[serde(rename = "lockStepVersion")]
    LockStep {
        /// Policy name.
        policy_name: String,
        /// Current locked version.
        version: Version,
        /// Default increment.
        next_bump: Increment,
    },
    /// Individual definition.
    #[serde(rename = "individualVersion")]
    Individual {
        /// Policy name.
        policy_name: String,
        /// Locked major version.
        #[serde(default)]
        locked_major: Option<u64>,
    },
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Registry of named version policies.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    policies: BTreeMap<String, Policy>,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Policy {
    /// Returns the policy's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Policy::LockStep { policy_name, .. } | Policy::Individual { policy_name, .. } => {
                policy_name
            }
        }
    }

    /// Resolves the version a package with this policy should carry.
    ///
    /// For a lock-step policy, a package behind the locked version is moved
    /// up to it. For an individual policy with a locked major, a package
    /// below the locked major is moved up to `{locked_major}.0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionAheadOfPolicy`] or [`Error::MajorAheadOfPolicy`]
    /// if `package_version` is ahead of what the policy allows – this is a
    /// configuration error that `ensure` can't silently fix.
    pub fn ensure(&self, package: &str, package_version: &Version) -> Result<Version> {
        match self {
            Policy::LockStep { policy_name, version, .. } => match package_version.cmp(version) {
                std::cmp::Ordering::Greater => Err(Error::VersionAheadOfPolicy {
                    policy: policy_name.clone(),
                    package: package.to_string(),
                    found: package_version.clone(),
                    expected: version.clone(),
                }),
                _ => Ok(version.clone()),
            },
            Policy::Individual { locked_major: None, .. } => Ok(package_version.clone()),
            Policy::Individual { policy_name: _, locked_major: Some(locked_major) } => {
                match package_version.major.cmp(locked_major) {
                    std::cmp::Ordering::Greater => Err(Error::MajorAheadOfPolicy {
                        package: package.to_string(),
                        found: package_version.clone(),
                        locked_major: *locked_major,
                    }),
                    std::cmp::Ordering::Less => Ok(Version::new(*locked_major, 0, 0)),
                    std::cmp::Ordering::Equal => Ok(package_version.clone()),
                }
            }
        }
    }

    /// Bumps the policy in place.
    ///
    /// A lock-step policy advances its shared version by `increment`,
    /// defaulting to [`Policy::next_bump`] when `None`, and returns the new
    /// version. An individual policy doesn't carry a version of its own to
    /// bump – each package's version is driven by its own change history – so
    /// this is a no-op that returns `None`.
    pub fn bump(&mut self, increment: Option<Increment>, preid: &str) -> Option<Version> {
        match self {
            Policy::LockStep { version, next_bump, .. } => {
                let increment = increment.unwrap_or(*next_bump);
                *version = version.bump(increment, preid);
                Some(version.clone())
            }
            Policy::Individual { .. } => None,
        }
    }

    /// Validates that a version is consistent with the policy, without
    /// mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMismatch`] or [`Error::MajorMismatch`] if
    /// `version` doesn't match what the policy requires.
    pub fn validate(&self, package: &str, version: &Version) -> Result<()> {
        match self {
            Policy::LockStep { policy_name, version: expected, .. } => {
                if version != expected {
                    return Err(Error::VersionMismatch {
                        policy: policy_name.clone(),
                        package: package.to_string(),
                        found: version.clone(),
                        expected: expected.clone(),
                    });
                }
                Ok(())
            }
            Policy::Individual { locked_major: None, .. } => Ok(()),
            Policy::Individual { locked_major: Some(locked_major), .. } => {
                if version.major != *locked_major {
                    return Err(Error::MajorMismatch {
                        package: package.to_string(),
                        found: version.clone(),
                        locked_major: *locked_major,
                    });
                }
                Ok(())
            }
        }
    }
}

impl Registry {
    /// Reads the version policy registry from the repository root.
    ///
    /// Returns an empty registry if [`POLICY_FILE`] doesn't exist – not every
    /// repository uses version policies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] for any failure other than the file being
    /// absent, and [`Error::Json`] if it doesn't parse.
    pub fn read(root: &Path) -> Result<Self> {
        let path = root.join(POLICY_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };

        let definitions: Vec<PolicyDefinition> =
            serde_json::from_str(&content).map_err(|source| Error::Json { path, source })?;

        let mut policies = BTreeMap::new();
        for definition in definitions {
            let policy = match definition {
                PolicyDefinition::LockStep { policy_name, version, next_bump } => {
                    Policy::LockStep { policy_name, version, next_bump }
                }
                PolicyDefinition::Individual { policy_name, locked_major } => {
                    Policy::Individual { policy_name, locked_major }
                }
            };
            policies.insert(policy.name().to_string(), policy);
        }
        Ok(Self { policies })
    }

    /// Looks up a policy by name.
    #[must_use]
    pub fn get(&self, policy_name: &str) -> Option<&Policy> {
        self.policies.get(policy_name)
    }

    /// Looks up a policy by name, mutably.
    pub fn get_mut(&mut self, policy_name: &str) -> Option<&mut Policy> {
        self.policies.get_mut(policy_name)
    }

    /// Creates an iterator over every policy in the registry.
    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.values()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_step_bump_moves_every_referencing_package() {
        let mut policy = Policy::LockStep {
            policy_name: "p1".to_string(),
            version: "1.2.3".parse().unwrap(),
            next_bump: Increment::Minor,
        };

        let bumped = policy.bump(None, "next").unwrap();
        assert_eq!(bumped, "1.3.0".parse().unwrap());

        let a = policy.ensure("a", &"1.2.3".parse().unwrap()).unwrap();
        let b = policy.ensure("b", &"1.2.3".parse().unwrap()).unwrap();
        assert_eq!(a, "1.3.0".parse().unwrap());
        assert_eq!(b, "1.3.0".parse().unwrap());

        let err = policy.validate("a", &"1.3.1".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
    }

    #[test]
    fn lock_step_rejects_package_ahead_of_policy() {
        let policy = Policy::LockStep {
            policy_name: "p1".to_string(),
            version: "1.2.3".parse().unwrap(),
            next_bump: Increment::Patch,
        };
        let err = policy.ensure("a", &"1.3.0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::VersionAheadOfPolicy { .. }));
    }

    #[test]
    fn individual_policy_locks_major_version() {
        let policy = Policy::Individual { policy_name: "p2".to_string(), locked_major: Some(2) };

        let ensured = policy.ensure("c", &"1.9.5".parse().unwrap()).unwrap();
        assert_eq!(ensured, "2.0.0".parse().unwrap());

        let err = policy.ensure("d", &"3.0.0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::MajorAheadOfPolicy { .. }));

        policy.validate("c", &"2.4.1".parse().unwrap()).unwrap();
        let err = policy.validate("c", &"3.0.0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::MajorMismatch { .. }));
    }

    #[test]
    fn individual_policy_bump_is_a_no_op() {
        let mut policy = Policy::Individual { policy_name: "p2".to_string(), locked_major: None };
        assert_eq!(policy.bump(Some(Increment::Major), "next"), None);
    }

    #[test]
    fn reads_lock_step_definition_with_none_next_bump() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_dir = dir.path().join("common/config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("version-policies.json"),
            r#"[
                {
                    "policyName": "p1",
                    "definitionName": "lockStepVersion",
                    "version": "1.2.3",
                    "nextBump": "none"
                }
            ]"#,
        )
        .unwrap();

        let registry = Registry::read(dir.path()).unwrap();
        let policy = registry.get("p1").unwrap();
        assert!(matches!(policy, Policy::LockStep { next_bump: Increment::None, .. }));
    }
}

// src/version/mod.rs

//! Version handling and range satisfaction for package dependencies
//!
//! This module provides four-part semantic versions with optional pre-release
//! labels, and version ranges written in interval notation.

use crate::error::{Error, Result};
use semver::Prerelease;
use std::fmt;
use std::str::FromStr;

/// A parsed version: major.minor.patch.revision plus an optional pre-release label
///
/// Ordering compares the numeric components first. For equal numbers a release
/// sorts above any pre-release, and pre-release labels compare by semver rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    /// Empty for release versions
    pub prerelease: Prerelease,
}

impl SemanticVersion {
    /// Create a release version with a zero revision
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            prerelease: Prerelease::EMPTY,
        }
    }

    /// Parse a version string
    ///
    /// Format: `major[.minor[.patch[.revision]]][-label]`
    /// Examples:
    /// - "1.0" → 1.0.0
    /// - "2.1.3.4" → 2.1.3.4
    /// - "1.0.0-beta.2" → 1.0.0 with pre-release label "beta.2"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (numbers, label) = match s.split_once('-') {
            Some((numbers, label)) => (numbers, Some(label)),
            None => (s, None),
        };

        if numbers.is_empty() {
            return Err(Error::InvalidVersion(
                s.to_string(),
                "missing numeric components".to_string(),
            ));
        }

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() > 4 {
            return Err(Error::InvalidVersion(
                s.to_string(),
                "at most four numeric components are allowed".to_string(),
            ));
        }

        let mut components = [0u64; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part.parse::<u64>().map_err(|e| {
                Error::InvalidVersion(s.to_string(), format!("component '{}': {}", part, e))
            })?;
        }

        let prerelease = match label {
            None => Prerelease::EMPTY,
            Some("") => {
                return Err(Error::InvalidVersion(
                    s.to_string(),
                    "empty pre-release label".to_string(),
                ));
            }
            Some(label) => Prerelease::new(label)
                .map_err(|e| Error::InvalidVersion(s.to_string(), e.to_string()))?,
        };

        Ok(Self {
            major: components[0],
            minor: components[1],
            patch: components[2],
            revision: components[3],
            prerelease,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    pub fn is_release(&self) -> bool {
        self.prerelease.is_empty()
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A version range with optional inclusive or exclusive bounds
///
/// An absent bound is unbounded. Ranges that could never be satisfied are
/// rejected when they are constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSpec {
    min_version: Option<SemanticVersion>,
    is_min_inclusive: bool,
    max_version: Option<SemanticVersion>,
    is_max_inclusive: bool,
}

impl VersionSpec {
    /// Create a range from explicit bounds
    pub fn new(
        min_version: Option<SemanticVersion>,
        is_min_inclusive: bool,
        max_version: Option<SemanticVersion>,
        is_max_inclusive: bool,
    ) -> Result<Self> {
        let spec = Self {
            min_version,
            is_min_inclusive,
            max_version,
            is_max_inclusive,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// A range matching exactly one version: `[v]`
    pub fn exact(version: SemanticVersion) -> Self {
        Self {
            min_version: Some(version.clone()),
            is_min_inclusive: true,
            max_version: Some(version),
            is_max_inclusive: true,
        }
    }

    /// A range matching the version and anything above it: `[v, )`
    pub fn at_least(version: SemanticVersion) -> Self {
        Self {
            min_version: Some(version),
            is_min_inclusive: true,
            max_version: None,
            is_max_inclusive: false,
        }
    }

    /// Parse a range in interval notation
    ///
    /// Examples:
    /// - "1.0" → [1.0, )
    /// - "[1.0]" → exactly 1.0
    /// - "[1.0,2.0)" → 1.0 ≤ v < 2.0
    /// - "(,2.0]" → v ≤ 2.0
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: &str| Error::InvalidVersionSpec(s.to_string(), reason.to_string());

        if s.is_empty() {
            return Err(invalid("empty range"));
        }

        if !s.starts_with('[') && !s.starts_with('(') {
            return Ok(Self::at_least(SemanticVersion::parse(s)?));
        }

        let is_min_inclusive = s.starts_with('[');
        let is_max_inclusive = if s.ends_with(']') {
            true
        } else if s.ends_with(')') {
            false
        } else {
            return Err(invalid("range must end with ']' or ')'"));
        };

        if s.len() < 3 {
            return Err(invalid("range has no bounds"));
        }

        let inner = &s[1..s.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [single] => {
                if !(is_min_inclusive && is_max_inclusive) {
                    return Err(invalid("a single-version range must use '[' and ']'"));
                }
                Ok(Self::exact(SemanticVersion::parse(single)?))
            }
            [min, max] => {
                let min_version = if min.is_empty() {
                    None
                } else {
                    Some(SemanticVersion::parse(min)?)
                };
                let max_version = if max.is_empty() {
                    None
                } else {
                    Some(SemanticVersion::parse(max)?)
                };
                if min_version.is_none() && max_version.is_none() {
                    return Err(invalid("at least one bound is required"));
                }
                Self::new(min_version, is_min_inclusive, max_version, is_max_inclusive)
            }
            _ => Err(invalid("too many ',' separators")),
        }
    }

    fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (&self.min_version, &self.max_version) {
            if min > max {
                return Err(Error::InvalidVersionSpec(
                    self.to_string(),
                    "minimum version is greater than maximum version".to_string(),
                ));
            }
            if min == max && !self.is_min_inclusive && !self.is_max_inclusive {
                return Err(Error::InvalidVersionSpec(
                    self.to_string(),
                    "equal bounds must include at least one side".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Check if a version falls within this range
    pub fn satisfies(&self, version: &SemanticVersion) -> bool {
        if let Some(min) = &self.min_version {
            let above_min = if self.is_min_inclusive {
                version >= min
            } else {
                version > min
            };
            if !above_min {
                return false;
            }
        }

        if let Some(max) = &self.max_version {
            let below_max = if self.is_max_inclusive {
                version <= max
            } else {
                version < max
            };
            if !below_max {
                return false;
            }
        }

        true
    }

    pub fn min_version(&self) -> Option<&SemanticVersion> {
        self.min_version.as_ref()
    }

    pub fn is_min_inclusive(&self) -> bool {
        self.is_min_inclusive
    }

    pub fn max_version(&self) -> Option<&SemanticVersion> {
        self.max_version.as_ref()
    }

    pub fn is_max_inclusive(&self) -> bool {
        self.is_max_inclusive
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), Some(max)) = (&self.min_version, &self.max_version) {
            if min == max && self.is_min_inclusive && self.is_max_inclusive {
                return write!(f, "[{}]", min);
            }
        }

        f.write_str(if self.is_min_inclusive { "[" } else { "(" })?;
        if let Some(min) = &self.min_version {
            write!(f, "{}", min)?;
        }
        f.write_str(", ")?;
        if let Some(max) = &self.max_version {
            write!(f, "{}", max)?;
        }
        f.write_str(if self.is_max_inclusive { "]" } else { ")" })
    }
}

impl FromStr for VersionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

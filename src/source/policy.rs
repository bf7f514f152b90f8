// src/source/policy.rs

//! Dependency version selection policy

use crate::package::Package;
use std::fmt;
use std::str::FromStr;

/// Which satisfying candidate a dependency resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyVersion {
    /// Lowest satisfying version
    #[default]
    Lowest,
    /// Highest satisfying version
    Highest,
    /// Highest patch within the lowest major.minor
    HighestPatch,
    /// Highest minor within the lowest major
    HighestMinor,
}

impl DependencyVersion {
    pub fn as_str(&self) -> &str {
        match self {
            DependencyVersion::Lowest => "lowest",
            DependencyVersion::Highest => "highest",
            DependencyVersion::HighestPatch => "highest-patch",
            DependencyVersion::HighestMinor => "highest-minor",
        }
    }

    /// Pick one package from candidates sorted ascending by version
    pub fn select<'a>(&self, candidates: &'a [Package]) -> Option<&'a Package> {
        let first = candidates.first()?;
        match self {
            DependencyVersion::Lowest => Some(first),
            DependencyVersion::Highest => candidates.last(),
            DependencyVersion::HighestPatch => candidates.iter().rev().find(|p| {
                p.version.major == first.version.major && p.version.minor == first.version.minor
            }),
            DependencyVersion::HighestMinor => candidates
                .iter()
                .rev()
                .find(|p| p.version.major == first.version.major),
        }
    }
}

impl FromStr for DependencyVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lowest" => Ok(DependencyVersion::Lowest),
            "highest" => Ok(DependencyVersion::Highest),
            "highest-patch" | "highestpatch" => Ok(DependencyVersion::HighestPatch),
            "highest-minor" | "highestminor" => Ok(DependencyVersion::HighestMinor),
            _ => Err(format!("Invalid dependency version policy: {s}")),
        }
    }
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

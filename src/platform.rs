// src/platform.rs

//! Target platform monikers and compatibility checks
//!
//! A target platform names the runtime a package's dependencies or files apply
//! to, written as `identifier/version[/profile]` (e.g. `dotnet/8.0`,
//! `dotnet/4.8/client`). Dependency sets and payload files scoped to a
//! platform only count when that platform is compatible with the session's
//! target.

use crate::error::{Error, Result};
use crate::version::SemanticVersion;
use std::fmt;
use std::str::FromStr;

/// A platform moniker: identifier, version and optional profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetPlatform {
    pub identifier: String,
    pub version: SemanticVersion,
    pub profile: Option<String>,
}

impl TargetPlatform {
    pub fn new(identifier: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Parse a moniker of the form `identifier/version[/profile]`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut parts = s.split('/');

        let identifier = parts.next().unwrap_or_default().trim();
        if identifier.is_empty() {
            return Err(Error::InvalidPlatform(
                s.to_string(),
                "missing identifier".to_string(),
            ));
        }

        let version = match parts.next() {
            Some(version) => SemanticVersion::parse(version)
                .map_err(|e| Error::InvalidPlatform(s.to_string(), e.to_string()))?,
            None => {
                return Err(Error::InvalidPlatform(
                    s.to_string(),
                    "missing version".to_string(),
                ));
            }
        };

        let profile = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        if parts.next().is_some() {
            return Err(Error::InvalidPlatform(
                s.to_string(),
                "expected identifier/version[/profile]".to_string(),
            ));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            version,
            profile,
        })
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.identifier, self.version)?;
        if let Some(ref profile) = self.profile {
            write!(f, "/{}", profile)?;
        }
        Ok(())
    }
}

impl FromStr for TargetPlatform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Decides whether items scoped to a platform apply to the active session
pub trait PlatformCompatibility {
    fn is_compatible(&self, platform: &TargetPlatform) -> bool;
}

/// Compatibility against a single session target
///
/// Without a target every platform is compatible. With one, a candidate
/// platform is compatible when it has the same identifier (ignoring case),
/// a version no higher than the target's, and either no profile or the
/// target's profile.
#[derive(Debug, Clone, Default)]
pub struct DefaultCompatibility {
    target: Option<TargetPlatform>,
}

impl DefaultCompatibility {
    pub fn new(target: Option<TargetPlatform>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Option<&TargetPlatform> {
        self.target.as_ref()
    }
}

impl PlatformCompatibility for DefaultCompatibility {
    fn is_compatible(&self, platform: &TargetPlatform) -> bool {
        let Some(target) = &self.target else {
            return true;
        };

        if !platform.identifier.eq_ignore_ascii_case(&target.identifier) {
            return false;
        }

        if platform.version > target.version {
            return false;
        }

        match (&platform.profile, &target.profile) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        }
    }
}

// src/package.rs

//! Package values consumed by the resolver
//!
//! Packages arrive fully parsed. The resolver only looks at their identity,
//! dependency sets, listing state and declared payload files.

use crate::platform::{PlatformCompatibility, TargetPlatform};
use crate::version::{SemanticVersion, VersionSpec};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Normalize a package id for case-insensitive lookups
pub fn normalize_id(id: &str) -> String {
    id.to_lowercase()
}

/// Package id (case-insensitive) plus exact version
#[derive(Debug, Clone, Eq)]
pub struct PackageIdentity {
    pub id: String,
    pub version: SemanticVersion,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Same id, any version
    pub fn same_id(&self, other: &PackageIdentity) -> bool {
        self.id.to_lowercase() == other.id.to_lowercase()
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.same_id(other)
    }
}

impl Hash for PackageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        normalize_id(&self.id).hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// A dependency on another package id, optionally limited to a version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    pub id: String,
    /// None matches any version
    pub version_spec: Option<VersionSpec>,
}

impl PackageDependency {
    pub fn new(id: impl Into<String>, version_spec: Option<VersionSpec>) -> Self {
        Self {
            id: id.into(),
            version_spec,
        }
    }

    /// A dependency accepting any version
    pub fn any(id: impl Into<String>) -> Self {
        Self::new(id, None)
    }

    pub fn is_satisfied_by(&self, version: &SemanticVersion) -> bool {
        self.version_spec
            .as_ref()
            .is_none_or(|spec| spec.satisfies(version))
    }

    pub fn targets(&self, id: &str) -> bool {
        self.id.to_lowercase() == id.to_lowercase()
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version_spec {
            Some(ref spec) => write!(f, "{} {}", self.id, spec),
            None => write!(f, "{}", self.id),
        }
    }
}

/// A group of dependencies scoped to one target platform, or to any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    /// None applies to every target
    pub target_platform: Option<TargetPlatform>,
    pub dependencies: Vec<PackageDependency>,
}

impl DependencySet {
    pub fn new(target_platform: Option<TargetPlatform>, dependencies: Vec<PackageDependency>) -> Self {
        Self {
            target_platform,
            dependencies,
        }
    }

    pub fn is_compatible(&self, compatibility: &dyn PlatformCompatibility) -> bool {
        self.target_platform
            .as_ref()
            .is_none_or(|platform| compatibility.is_compatible(platform))
    }
}

/// A payload file declared by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub path: String,
    pub target_platform: Option<TargetPlatform>,
}

impl PackageFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target_platform: None,
        }
    }

    pub fn for_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = Some(platform);
        self
    }
}

/// A resolved package
///
/// Two packages are equal when their identities are equal.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: String,
    pub version: SemanticVersion,
    pub dependency_sets: Vec<DependencySet>,
    pub files: Vec<PackageFile>,
    /// Unlisted packages are only chosen when no listed candidate fits
    pub listed: bool,
}

impl Package {
    pub fn new(id: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            id: id.into(),
            version,
            dependency_sets: Vec::new(),
            files: Vec::new(),
            listed: true,
        }
    }

    /// Add a dependency to the platform-neutral dependency set
    pub fn with_dependency(mut self, dependency: PackageDependency) -> Self {
        match self
            .dependency_sets
            .iter_mut()
            .find(|set| set.target_platform.is_none())
        {
            Some(set) => set.dependencies.push(dependency),
            None => self
                .dependency_sets
                .push(DependencySet::new(None, vec![dependency])),
        }
        self
    }

    pub fn with_dependency_set(mut self, set: DependencySet) -> Self {
        self.dependency_sets.push(set);
        self
    }

    pub fn with_file(mut self, file: PackageFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity::new(self.id.clone(), self.version.clone())
    }

    pub fn is_release_version(&self) -> bool {
        self.version.is_release()
    }

    pub fn same_id(&self, other: &Package) -> bool {
        self.id.to_lowercase() == other.id.to_lowercase()
    }

    /// Dependencies from every dependency set compatible with the platform
    pub fn compatible_dependencies<'a>(
        &'a self,
        compatibility: &'a dyn PlatformCompatibility,
    ) -> impl Iterator<Item = &'a PackageDependency> + 'a {
        self.dependency_sets
            .iter()
            .filter(move |set| set.is_compatible(compatibility))
            .flat_map(|set| set.dependencies.iter())
    }

    /// The first compatible dependency on the given id
    pub fn find_dependency<'a>(
        &'a self,
        id: &str,
        compatibility: &'a dyn PlatformCompatibility,
    ) -> Option<&'a PackageDependency> {
        self.compatible_dependencies(compatibility)
            .find(|dep| dep.targets(id))
    }

    /// Whether the package carries any file for the platform
    ///
    /// Packages without a payload only satisfy dependency metadata.
    pub fn has_payload(&self, compatibility: &dyn PlatformCompatibility) -> bool {
        self.files.iter().any(|file| {
            file.target_platform
                .as_ref()
                .is_none_or(|platform| compatibility.is_compatible(platform))
        })
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.same_id(other)
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        normalize_id(&self.id).hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

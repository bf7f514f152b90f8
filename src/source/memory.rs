// src/source/memory.rs

//! In-memory package repository
//!
//! Backs both the installed set and the available feed when packages come
//! from a model file, and serves as the fixture repository in tests.

use super::{DependentsResolver, PackageSource};
use crate::error::Result;
use crate::package::{Package, normalize_id};
use crate::platform::DefaultCompatibility;

/// A flat list of packages, looked up by id ignoring case
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    name: String,
    packages: Vec<Package>,
}

impl MemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    pub fn from_packages(name: impl Into<String>, packages: Vec<Package>) -> Self {
        let mut repo = Self::new(name);
        for package in packages {
            repo.add(package);
        }
        repo
    }

    /// Add a package, replacing an existing one with the same identity
    pub fn add(&mut self, package: Package) {
        self.packages.retain(|p| p != &package);
        self.packages.push(package);
    }

    /// Remove a package by identity; returns whether it was present
    pub fn remove(&mut self, package: &Package) -> bool {
        let before = self.packages.len();
        self.packages.retain(|p| p != package);
        self.packages.len() != before
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageSource for MemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_packages(&self, id: &str) -> Result<Vec<Package>> {
        let id = normalize_id(id);
        Ok(self
            .packages
            .iter()
            .filter(|p| normalize_id(&p.id) == id)
            .cloned()
            .collect())
    }
}

impl DependentsResolver for MemoryRepository {
    fn dependents(&self, package: &Package) -> Result<Vec<Package>> {
        // Every dependency set counts; an installed package's platform is fixed
        let any_platform = DefaultCompatibility::default();
        Ok(self
            .packages
            .iter()
            .filter(|p| !p.same_id(package))
            .filter(|p| {
                p.compatible_dependencies(&any_platform)
                    .any(|dep| dep.targets(&package.id) && dep.is_satisfied_by(&package.version))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageDependency;
    use crate::version::{SemanticVersion, VersionSpec};

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn dep(id: &str, spec: &str) -> PackageDependency {
        PackageDependency::new(id, Some(VersionSpec::parse(spec).unwrap()))
    }

    #[test]
    fn test_add_replaces_same_identity() {
        let mut repo = MemoryRepository::new("local");
        repo.add(Package::new("P", v("1.0")));
        repo.add(Package::new("p", v("1.0")).unlisted());
        repo.add(Package::new("P", v("2.0")));
        assert_eq!(repo.len(), 2);
        assert!(!repo.find_package("P", &v("1.0")).unwrap().unwrap().listed);
    }

    #[test]
    fn test_remove() {
        let mut repo = MemoryRepository::from_packages("local", vec![Package::new("P", v("1.0"))]);
        assert!(repo.remove(&Package::new("P", v("1.0"))));
        assert!(!repo.remove(&Package::new("P", v("1.0"))));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_dependents_match_range() {
        let repo = MemoryRepository::from_packages(
            "local",
            vec![
                Package::new("P", v("1.0")),
                Package::new("D", v("1.0")).with_dependency(dep("P", "[1.0,2.0)")),
                Package::new("E", v("1.0")).with_dependency(dep("P", "[2.0,)")),
                Package::new("F", v("1.0")).with_dependency(PackageDependency::any("p")),
            ],
        );
        let dependents: Vec<String> = repo
            .dependents(&Package::new("P", v("1.0")))
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(dependents, vec!["D", "F"]);
    }
}

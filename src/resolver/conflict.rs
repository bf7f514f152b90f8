// src/resolver/conflict.rs

//! Conflict lookup for the install walker
//!
//! A conflict is an installed package with the same id as a package being
//! installed, but a different version. Installed packages that depend on the
//! conflicting version and cannot accept the new one are its incompatible
//! dependents.

use crate::error::Result;
use crate::package::Package;
use crate::platform::PlatformCompatibility;
use crate::source::{DependentsResolver, PackageSource};

/// An installed package that clashes with the one being installed
pub struct ConflictResult<'a> {
    pub conflicting_package: Package,
    /// Where the conflicting package is installed
    pub repository: &'a dyn PackageSource,
    /// Finds installed packages depending on the conflicting one
    pub dependents_resolver: &'a dyn DependentsResolver,
}

impl<'a> ConflictResult<'a> {
    /// Look up the installed package clashing with `package`
    ///
    /// Returns None when nothing with the id is installed, or when exactly
    /// this version is.
    pub fn find(
        package: &Package,
        repository: &'a dyn PackageSource,
        dependents_resolver: &'a dyn DependentsResolver,
    ) -> Result<Option<Self>> {
        let Some(installed) = repository.find_installed(&package.id)? else {
            return Ok(None);
        };
        if &installed == package {
            return Ok(None);
        }
        Ok(Some(Self {
            conflicting_package: installed,
            repository,
            dependents_resolver,
        }))
    }

    /// Dependents whose declared range for `package.id` rejects `package.version`
    pub fn incompatible_dependents(
        &self,
        package: &Package,
        compatibility: &dyn PlatformCompatibility,
    ) -> Result<Vec<Package>> {
        Ok(self
            .dependents_resolver
            .dependents(&self.conflicting_package)?
            .into_iter()
            .filter(|dependent| {
                dependent
                    .find_dependency(&package.id, compatibility)
                    .is_some_and(|dep| !dep.is_satisfied_by(&package.version))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageDependency;
    use crate::platform::DefaultCompatibility;
    use crate::source::MemoryRepository;
    use crate::version::{SemanticVersion, VersionSpec};

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, SemanticVersion::parse(version).unwrap())
    }

    fn local() -> MemoryRepository {
        MemoryRepository::from_packages(
            "local",
            vec![
                pkg("P", "1.0"),
                pkg("D", "1.0").with_dependency(PackageDependency::new(
                    "P",
                    Some(VersionSpec::parse("[1.0,2.0)").unwrap()),
                )),
                pkg("E", "1.0").with_dependency(PackageDependency::any("P")),
            ],
        )
    }

    #[test]
    fn test_no_conflict_for_identical_or_missing() {
        let local = local();
        assert!(ConflictResult::find(&pkg("P", "1.0"), &local, &local).unwrap().is_none());
        assert!(ConflictResult::find(&pkg("Q", "1.0"), &local, &local).unwrap().is_none());
    }

    #[test]
    fn test_incompatible_dependents() {
        let local = local();
        let target = pkg("P", "2.0");
        let conflict = ConflictResult::find(&target, &local, &local).unwrap().unwrap();
        assert_eq!(conflict.conflicting_package, pkg("P", "1.0"));

        let dependents = conflict
            .incompatible_dependents(&target, &DefaultCompatibility::default())
            .unwrap();
        assert_eq!(dependents, vec![pkg("D", "1.0")]);
    }
}

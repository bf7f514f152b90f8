// src/resolver/uninstall.rs

//! Uninstall resolution
//!
//! Walks an installed package and, optionally, its installed dependencies.
//! A dependency is only removed when nothing outside the removal set still
//! depends on it.

use super::marker::VisitationMarker;
use super::operation::Operation;
use super::walker::{PackageWalker, WalkContext};
use crate::constraint::NullConstraintProvider;
use crate::error::{Error, Result};
use crate::package::{Package, PackageDependency, PackageIdentity};
use crate::platform::PlatformCompatibility;
use crate::source::{DependencyVersion, DependentsResolver, PackageSource, ResolveOptions};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Options for an uninstall resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Also remove installed dependencies nothing else needs
    pub remove_dependencies: bool,
    /// Remove the root even when installed packages depend on it
    pub force_remove: bool,
    /// Fail when the root still has dependents; otherwise remove it anyway
    pub throw_on_conflicts: bool,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            remove_dependencies: false,
            force_remove: false,
            throw_on_conflicts: true,
        }
    }
}

/// Resolves the uninstall operations for one installed package
pub struct UninstallWalker<'a> {
    repository: &'a dyn PackageSource,
    dependents_resolver: &'a dyn DependentsResolver,
    options: UninstallOptions,
    context: WalkContext,
    marker: VisitationMarker,
    candidates: Vec<Package>,
}

impl<'a> UninstallWalker<'a> {
    pub fn new<L: PackageSource + DependentsResolver>(local: &'a L, options: UninstallOptions) -> Self {
        Self::with_repositories(local, local, options)
    }

    pub fn with_repositories(
        repository: &'a dyn PackageSource,
        dependents_resolver: &'a dyn DependentsResolver,
        options: UninstallOptions,
    ) -> Self {
        let mut context = WalkContext::default();
        context.ignore_dependencies = !options.remove_dependencies;
        Self {
            repository,
            dependents_resolver,
            options,
            context,
            marker: VisitationMarker::new(),
            candidates: Vec::new(),
        }
    }

    pub fn with_compatibility(mut self, compatibility: Arc<dyn PlatformCompatibility>) -> Self {
        self.context.compatibility = compatibility;
        self
    }

    /// Uninstall operations for `package`, root first
    pub fn resolve_operations(&mut self, package: &Package) -> Result<Vec<Operation>> {
        self.marker.clear();
        self.candidates.clear();

        info!("Resolving uninstall of {}", package);
        self.walk(package)?;
        self.prune_shared_dependencies(package)?;

        let removing: HashSet<PackageIdentity> =
            self.candidates.iter().map(Package::identity).collect();
        let blocking: Vec<String> = self
            .dependents_resolver
            .dependents(package)?
            .iter()
            .filter(|dependent| !removing.contains(&dependent.identity()))
            .map(ToString::to_string)
            .collect();

        if !blocking.is_empty() {
            if !self.options.force_remove && self.options.throw_on_conflicts {
                return Err(Error::DependentsExist {
                    package: package.to_string(),
                    dependents: blocking,
                });
            }
            debug!(
                "Removing {} despite dependents: {}",
                package,
                blocking.join(", ")
            );
        }

        Ok(self
            .candidates
            .iter()
            .cloned()
            .map(Operation::uninstall)
            .collect())
    }

    /// Drop non-root candidates still needed by something that stays installed
    fn prune_shared_dependencies(&mut self, root: &Package) -> Result<()> {
        loop {
            let removing: HashSet<PackageIdentity> =
                self.candidates.iter().map(Package::identity).collect();

            let mut retained = None;
            for (index, candidate) in self.candidates.iter().enumerate() {
                if candidate == root {
                    continue;
                }
                let needed = self
                    .dependents_resolver
                    .dependents(candidate)?
                    .iter()
                    .any(|dependent| !removing.contains(&dependent.identity()));
                if needed {
                    retained = Some(index);
                    break;
                }
            }

            match retained {
                Some(index) => {
                    let kept = self.candidates.remove(index);
                    debug!("Keeping {}, still required by installed packages", kept);
                }
                None => return Ok(()),
            }
        }
    }
}

impl PackageWalker for UninstallWalker<'_> {
    fn marker(&mut self) -> &mut VisitationMarker {
        &mut self.marker
    }

    fn context(&self) -> &WalkContext {
        &self.context
    }

    fn resolve_dependency(&mut self, dependency: &PackageDependency) -> Result<Option<Package>> {
        let options = ResolveOptions {
            allow_prerelease: true,
            prefer_listed: false,
            dependency_version: DependencyVersion::Lowest,
        };
        self.repository
            .resolve_dependency(dependency, &NullConstraintProvider, &options)
    }

    fn on_before_visit(&mut self, package: &Package) -> Result<()> {
        self.candidates.push(package.clone());
        Ok(())
    }

    fn on_dependency_resolve_error(
        &mut self,
        package: &Package,
        dependency: &PackageDependency,
    ) -> Result<()> {
        debug!("{}: dependency {} is not installed", package, dependency);
        Ok(())
    }

    fn on_version_conflict(
        &mut self,
        selected: &Package,
        requested: &Package,
        _dependent: Option<&Package>,
    ) -> Result<()> {
        debug!("{} already walked, not removing {}", selected, requested);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRepository;
    use crate::version::SemanticVersion;

    fn pkg(id: &str, deps: &[&str]) -> Package {
        deps.iter().fold(
            Package::new(id, SemanticVersion::new(1, 0, 0)),
            |p, dep| p.with_dependency(PackageDependency::any(*dep)),
        )
    }

    fn ids(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|op| op.package.id.as_str()).collect()
    }

    #[test]
    fn test_uninstall_root_only() {
        let local = MemoryRepository::from_packages("local", vec![pkg("A", &["B"]), pkg("B", &[])]);
        let mut walker = UninstallWalker::new(&local, UninstallOptions::default());
        let ops = walker.resolve_operations(&pkg("A", &["B"])).unwrap();
        assert_eq!(ids(&ops), vec!["A"]);
    }

    #[test]
    fn test_uninstall_with_dependencies_keeps_shared() {
        let local = MemoryRepository::from_packages(
            "local",
            vec![
                pkg("A", &["B", "C"]),
                pkg("B", &["Missing"]),
                pkg("C", &[]),
                pkg("Other", &["C"]),
            ],
        );
        let options = UninstallOptions {
            remove_dependencies: true,
            ..Default::default()
        };
        let mut walker = UninstallWalker::new(&local, options);
        let ops = walker.resolve_operations(&pkg("A", &["B", "C"])).unwrap();
        assert_eq!(ids(&ops), vec!["A", "B"]);
    }

    #[test]
    fn test_uninstall_with_dependents_fails() {
        let local = MemoryRepository::from_packages("local", vec![pkg("A", &["B"]), pkg("B", &[])]);
        let mut walker = UninstallWalker::new(&local, UninstallOptions::default());
        let err = walker.resolve_operations(&pkg("B", &[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to uninstall 'B 1.0.0' because 'A 1.0.0' depends on it."
        );
    }

    #[test]
    fn test_forced_uninstall_ignores_dependents() {
        let local = MemoryRepository::from_packages("local", vec![pkg("A", &["B"]), pkg("B", &[])]);
        let options = UninstallOptions {
            force_remove: true,
            ..Default::default()
        };
        let mut walker = UninstallWalker::new(&local, options);
        let ops = walker.resolve_operations(&pkg("B", &[])).unwrap();
        assert_eq!(ids(&ops), vec!["B"]);
    }
}

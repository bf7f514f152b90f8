// src/resolver/install.rs

//! Install resolution
//!
//! Walks a package's dependency graph and records the operations needed to
//! bring it into the installed set:
//!
//! - dependencies resolve against installed packages first, then the
//!   dependency source
//! - an installed package with the same id but another version is a conflict;
//!   it is uninstalled along with dependencies nothing else needs
//! - installed dependents that cannot accept the new version are upgraded to
//!   the lowest newer version that can, or the install fails
//! - packages already installed at the resolved version are kept

use super::conflict::ConflictResult;
use super::graph;
use super::marker::VisitationMarker;
use super::operation::{Operation, OperationIndex, OperationTarget, PackageAction};
use super::plan::ResolutionPlan;
use super::uninstall::{UninstallOptions, UninstallWalker};
use super::walker::{PackageWalker, WalkContext};
use super::ResolverConfig;
use crate::constraint::{
    AggregateConstraintProvider, ConstraintProvider, NullConstraintProvider, PinnedVersions,
};
use crate::error::{ConstraintInfo, Error, Result};
use crate::package::{Package, PackageDependency, PackageIdentity};
use crate::platform::DefaultCompatibility;
use crate::source::{DependentsResolver, PackageSource, ResolveOptions};
use crate::version::VersionSpec;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves the operations needed to install packages
pub struct InstallWalker<'a> {
    /// Installed packages
    local: &'a dyn PackageSource,
    dependents: &'a dyn DependentsResolver,
    /// Where new packages come from
    source: &'a dyn PackageSource,
    constraints: Arc<dyn ConstraintProvider>,
    config: ResolverConfig,
    context: WalkContext,
    marker: VisitationMarker,
    operations: OperationIndex,
    /// Installed packages the walk resolved to; never uninstalled
    packages_to_keep: HashSet<PackageIdentity>,
    /// Prerelease policy for the root being walked
    allow_prerelease: bool,
    is_downgrade: bool,
}

impl<'a> InstallWalker<'a> {
    pub fn new<L: PackageSource + DependentsResolver>(
        local: &'a L,
        source: &'a dyn PackageSource,
        config: ResolverConfig,
    ) -> Self {
        let compatibility = Arc::new(DefaultCompatibility::new(config.target_platform.clone()));
        Self {
            local,
            dependents: local,
            source,
            constraints: Arc::new(NullConstraintProvider),
            context: WalkContext::new(config.ignore_dependencies, compatibility),
            allow_prerelease: config.allow_prerelease,
            config,
            marker: VisitationMarker::new(),
            operations: OperationIndex::new(),
            packages_to_keep: HashSet::new(),
            is_downgrade: false,
        }
    }

    /// Apply version constraints (e.g. pins) on top of dependency ranges
    pub fn with_constraints(mut self, constraints: Arc<dyn ConstraintProvider>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Operations needed to install `package`
    pub fn resolve_operations(&mut self, package: &Package) -> Result<Vec<Operation>> {
        self.reset();
        info!("Resolving install of {}", package);

        self.begin_root(package, self.config.allow_prerelease)?;
        self.walk(package)?;

        let operations = self.operations.reduce();
        info!("Resolved {} operation(s) for {}", operations.len(), package);
        Ok(operations)
    }

    /// Operations needed to install several packages, plus their install order
    ///
    /// State is shared across roots, so a package pulled in by one root is not
    /// resolved again for the next. A prerelease root allows prerelease
    /// dependencies for its own subtree.
    pub fn resolve_batch(&mut self, packages: &[Package]) -> Result<ResolutionPlan> {
        self.reset();
        info!("Resolving install of {} package(s)", packages.len());

        for package in packages {
            if self.operations.contains(PackageAction::Install, package) {
                debug!("{} already scheduled for install", package);
                continue;
            }
            let allow_prerelease = self.config.allow_prerelease || package.version.is_prerelease();
            self.begin_root(package, allow_prerelease)?;
            self.walk(package)?;
        }

        let plan = ResolutionPlan {
            operations: self.operations.reduce(),
            install_order: graph::dependency_order(packages, self.context.compatibility.as_ref()),
        };
        info!("Resolved {} operation(s)", plan.operations.len());
        Ok(plan)
    }

    fn reset(&mut self) {
        self.marker.clear();
        self.operations.clear();
        self.packages_to_keep.clear();
    }

    fn begin_root(&mut self, package: &Package, allow_prerelease: bool) -> Result<()> {
        self.allow_prerelease = allow_prerelease;
        self.is_downgrade = self.config.check_downgrade
            && self
                .local
                .find_installed(&package.id)?
                .is_some_and(|installed| installed.version > package.version);
        if self.is_downgrade {
            debug!("Downgrading {}", package.id);
        }
        Ok(())
    }

    /// Try to upgrade dependents so they accept `package`
    ///
    /// Returns the dependents that are still incompatible; empty on success.
    fn try_update(&mut self, dependents: Vec<Package>, package: &Package) -> Result<Vec<Package>> {
        let mut updates = Vec::new();
        let mut unmatched = Vec::new();
        for dependent in dependents {
            match self.find_compatible_update(&dependent, package)? {
                Some(update) => updates.push((dependent, update)),
                None => unmatched.push(dependent),
            }
        }
        if !unmatched.is_empty() {
            return Ok(unmatched);
        }

        let pin: Arc<dyn ConstraintProvider> = Arc::new(
            PinnedVersions::new(format!("update to {}", package))
                .with_pin(&package.id, VersionSpec::exact(package.version.clone())),
        );
        let layered: Arc<dyn ConstraintProvider> = Arc::new(AggregateConstraintProvider::new(vec![
            Arc::clone(&self.constraints),
            pin,
        ]));

        self.marker.mark_visited(package);
        let result = self.with_layered_constraints(layered, |walker| {
            let mut incompatible = Vec::new();
            for (dependent, update) in &updates {
                info!("Updating {} to {}", dependent, update.version);
                match walker.uninstall(dependent).and_then(|()| walker.walk(update)) {
                    Ok(()) => {}
                    Err(e) if e.is_resolution_failure() => {
                        debug!("Updating {} failed: {}", dependent, e);
                        incompatible.push(dependent.clone());
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(incompatible)
        });
        self.marker.mark_processing(package);
        result
    }

    /// Lowest newer version of `dependent` whose range accepts `package`
    fn find_compatible_update(&self, dependent: &Package, package: &Package) -> Result<Option<Package>> {
        let compatibility = self.context.compatibility.as_ref();
        Ok(self
            .source
            .find_packages(&dependent.id)?
            .into_iter()
            .filter(|candidate| candidate.version > dependent.version)
            .filter(|candidate| self.allow_prerelease || candidate.is_release_version())
            .filter(|candidate| {
                candidate
                    .find_dependency(&package.id, compatibility)
                    .is_some_and(|dep| dep.is_satisfied_by(&package.version))
            })
            .filter(|candidate| self.constraints.allows(&candidate.id, &candidate.version))
            .min_by(|a, b| a.version.cmp(&b.version)))
    }

    /// Run `f` with `provider` as the active constraints, then restore the previous ones
    fn with_layered_constraints<T>(
        &mut self,
        provider: Arc<dyn ConstraintProvider>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = std::mem::replace(&mut self.constraints, provider);
        let result = f(self);
        self.constraints = previous;
        result
    }

    /// Queue removal of an installed package and the dependencies only it needs
    fn uninstall(&mut self, package: &Package) -> Result<()> {
        let identity = package.identity();
        self.packages_to_keep.remove(&identity);

        if !self.marker.contains(&identity)
            && self.operations.contains(PackageAction::Uninstall, package)
        {
            return Ok(());
        }

        let options = UninstallOptions {
            remove_dependencies: !self.config.ignore_dependencies,
            force_remove: false,
            throw_on_conflicts: false,
        };
        let mut walker = UninstallWalker::with_repositories(self.local, self.dependents, options)
            .with_compatibility(Arc::clone(&self.context.compatibility));

        for operation in walker.resolve_operations(package)? {
            if self.packages_to_keep.contains(&operation.package.identity()) {
                debug!("Keeping {}", operation.package);
                continue;
            }
            self.operations.add(operation);
        }
        Ok(())
    }
}

impl PackageWalker for InstallWalker<'_> {
    fn marker(&mut self) -> &mut VisitationMarker {
        &mut self.marker
    }

    fn context(&self) -> &WalkContext {
        &self.context
    }

    fn resolve_dependency(&mut self, dependency: &PackageDependency) -> Result<Option<Package>> {
        let constraints = Arc::clone(&self.constraints);

        if !self.is_downgrade {
            let options = ResolveOptions {
                allow_prerelease: true,
                prefer_listed: false,
                dependency_version: self.config.dependency_version,
            };
            if let Some(installed) =
                self.local
                    .resolve_dependency(dependency, constraints.as_ref(), &options)?
            {
                debug!("{} resolved to installed {}", dependency, installed);
                return Ok(Some(installed));
            }
        }

        let options = ResolveOptions {
            allow_prerelease: self.allow_prerelease,
            prefer_listed: true,
            dependency_version: self.config.dependency_version,
        };
        let resolved = self
            .source
            .resolve_dependency(dependency, constraints.as_ref(), &options)?;
        if let Some(ref package) = resolved {
            debug!("{} resolved to {} from {}", dependency, package, self.source.name());
        }
        Ok(resolved)
    }

    fn on_before_visit(&mut self, package: &Package) -> Result<()> {
        let Some(conflict) = ConflictResult::find(package, self.local, self.dependents)? else {
            return Ok(());
        };
        let conflicting = conflict.conflicting_package.clone();
        debug!("{} conflicts with installed {}", package, conflicting);

        let incompatible: Vec<Package> = conflict
            .incompatible_dependents(package, self.context.compatibility.as_ref())?
            .into_iter()
            .filter(|dependent| !self.operations.contains(PackageAction::Uninstall, dependent))
            .collect();

        if !incompatible.is_empty() {
            let remaining = self.try_update(incompatible, package)?;
            if !remaining.is_empty() {
                return Err(Error::PackageConflict {
                    package: package.to_string(),
                    conflicting: conflicting.to_string(),
                    dependents: remaining.into_iter().map(|d| d.id).collect(),
                });
            }
        }

        if !self.is_downgrade && package.version < conflicting.version {
            return Err(Error::DowngradeRejected {
                id: package.id.clone(),
            });
        }

        self.uninstall(&conflicting)
    }

    fn on_after_visit(&mut self, package: &Package) -> Result<()> {
        if self.local.exists(&package.identity())? {
            self.operations.remove(PackageAction::Uninstall, package);
            self.packages_to_keep.insert(package.identity());
            return Ok(());
        }

        let target = if package.has_payload(self.context.compatibility.as_ref()) {
            OperationTarget::Consumer
        } else {
            OperationTarget::SharedStore
        };
        self.operations
            .add(Operation::install(package.clone()).with_target(target));
        Ok(())
    }

    fn on_dependency_resolve_error(
        &mut self,
        _package: &Package,
        dependency: &PackageDependency,
    ) -> Result<()> {
        let constraint = self
            .constraints
            .constraint(&dependency.id)
            .map(|c| ConstraintInfo {
                spec: c.spec.to_string(),
                source: c.source,
            });
        Err(Error::UnresolvedDependency {
            id: dependency.id.clone(),
            dependency: dependency.to_string(),
            constraint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRepository;
    use crate::version::SemanticVersion;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, v(version))
    }

    fn dep(id: &str, spec: &str) -> PackageDependency {
        PackageDependency::new(id, Some(VersionSpec::parse(spec).unwrap()))
    }

    fn summary(ops: &[Operation]) -> Vec<String> {
        ops.iter()
            .map(|op| format!("{} {}", op.action, op.package))
            .collect()
    }

    #[test]
    fn test_install_new_package_with_dependency() {
        let local = MemoryRepository::new("local");
        let app = pkg("App", "1.0").with_dependency(dep("Lib", "[1.0,2.0)"));
        let remote = MemoryRepository::from_packages(
            "remote",
            vec![app.clone(), pkg("Lib", "1.0"), pkg("Lib", "1.2"), pkg("Lib", "2.0")],
        );

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        let ops = walker.resolve_operations(&app).unwrap();
        assert_eq!(summary(&ops), vec!["install Lib 1.0.0", "install App 1.0.0"]);
    }

    #[test]
    fn test_dependency_prefers_installed_version() {
        let local = MemoryRepository::from_packages("local", vec![pkg("Lib", "1.2")]);
        let app = pkg("App", "1.0").with_dependency(dep("Lib", "[1.0,2.0)"));
        let remote = MemoryRepository::from_packages("remote", vec![pkg("Lib", "1.0")]);

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        let ops = walker.resolve_operations(&app).unwrap();
        assert_eq!(summary(&ops), vec!["install App 1.0.0"]);
    }

    #[test]
    fn test_older_root_rejected_without_downgrade_check() {
        let local = MemoryRepository::from_packages("local", vec![pkg("P", "2.0")]);
        let remote = MemoryRepository::new("remote");
        let config = ResolverConfig {
            check_downgrade: false,
            ..Default::default()
        };

        let mut walker = InstallWalker::new(&local, &remote, config);
        let err = walker.resolve_operations(&pkg("P", "1.0")).unwrap_err();
        assert!(matches!(err, Error::DowngradeRejected { .. }));
        assert_eq!(err.to_string(), "Already referencing a newer version of 'P'.");
    }

    #[test]
    fn test_downgrade_session_replaces_newer() {
        let local = MemoryRepository::from_packages("local", vec![pkg("P", "2.0")]);
        let remote = MemoryRepository::new("remote");

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        let ops = walker.resolve_operations(&pkg("P", "1.0")).unwrap();
        assert_eq!(summary(&ops), vec!["uninstall P 2.0.0", "install P 1.0.0"]);
    }

    #[test]
    fn test_downgrade_session_resolves_dependencies_from_source() {
        let local = MemoryRepository::from_packages("local", vec![pkg("P", "2.0"), pkg("Lib", "1.5")]);
        let remote = MemoryRepository::from_packages("remote", vec![pkg("Lib", "1.0"), pkg("Lib", "1.5")]);
        let root = pkg("P", "1.0").with_dependency(dep("Lib", "1.0"));

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        let ops = walker.resolve_operations(&root).unwrap();
        assert_eq!(
            summary(&ops),
            vec![
                "uninstall P 2.0.0",
                "uninstall Lib 1.5.0",
                "install Lib 1.0.0",
                "install P 1.0.0"
            ]
        );

        // Not a downgrade: the installed Lib satisfies the range and is kept
        let root = pkg("P", "3.0").with_dependency(dep("Lib", "1.0"));
        let ops = walker.resolve_operations(&root).unwrap();
        assert_eq!(summary(&ops), vec!["uninstall P 2.0.0", "install P 3.0.0"]);
    }

    #[test]
    fn test_unresolved_dependency_names_constraint() {
        let local = MemoryRepository::new("local");
        let app = pkg("App", "1.0").with_dependency(dep("Lib", "1.0"));
        let remote = MemoryRepository::from_packages("remote", vec![pkg("Lib", "1.0")]);
        let pins: Arc<dyn ConstraintProvider> = Arc::new(
            PinnedVersions::new("pins.toml").with_pin("Lib", VersionSpec::exact(v("2.0"))),
        );

        let mut walker =
            InstallWalker::new(&local, &remote, ResolverConfig::default()).with_constraints(pins);
        let err = walker.resolve_operations(&app).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to resolve dependency 'Lib [1.0.0, )'. 'Lib' has an additional constraint [2.0.0] defined in pins.toml."
        );
    }

    #[test]
    fn test_prerelease_dependency_requires_opt_in() {
        let local = MemoryRepository::new("local");
        let app = pkg("App", "1.0").with_dependency(dep("Lib", "1.0"));
        let remote = MemoryRepository::from_packages("remote", vec![pkg("Lib", "1.1-beta")]);

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        assert!(walker.resolve_operations(&app).is_err());

        let config = ResolverConfig {
            allow_prerelease: true,
            ..Default::default()
        };
        let mut walker = InstallWalker::new(&local, &remote, config);
        let ops = walker.resolve_operations(&app).unwrap();
        assert_eq!(
            summary(&ops),
            vec!["install Lib 1.1.0-beta", "install App 1.0.0"]
        );
    }

    #[test]
    fn test_ignore_dependencies_installs_root_only() {
        let local = MemoryRepository::new("local");
        let app = pkg("App", "1.0").with_dependency(dep("Missing", "1.0"));
        let remote = MemoryRepository::new("remote");
        let config = ResolverConfig {
            ignore_dependencies: true,
            ..Default::default()
        };

        let mut walker = InstallWalker::new(&local, &remote, config);
        let ops = walker.resolve_operations(&app).unwrap();
        assert_eq!(summary(&ops), vec!["install App 1.0.0"]);
    }

    #[test]
    fn test_layered_constraints_restored_after_failure() {
        let local = MemoryRepository::new("local");
        let remote = MemoryRepository::new("remote");
        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());

        let pin: Arc<dyn ConstraintProvider> =
            Arc::new(PinnedVersions::new("temp").with_pin("P", VersionSpec::exact(v("1.0"))));
        let result: Result<()> = walker.with_layered_constraints(pin, |w| {
            assert!(w.constraints.constraint("P").is_some());
            Err(Error::DowngradeRejected { id: "P".to_string() })
        });
        assert!(result.is_err());
        assert!(walker.constraints.constraint("P").is_none());
    }

    #[test]
    fn test_payload_decides_target() {
        let local = MemoryRepository::new("local");
        let lib = pkg("Lib", "1.0").with_file(crate::package::PackageFile::new("lib/lib.dll"));
        let meta = pkg("Meta", "1.0").with_dependency(dep("Lib", "1.0"));
        let remote = MemoryRepository::from_packages("remote", vec![lib]);

        let mut walker = InstallWalker::new(&local, &remote, ResolverConfig::default());
        let ops = walker.resolve_operations(&meta).unwrap();
        assert_eq!(ops[0].target, OperationTarget::Consumer);
        assert_eq!(ops[1].target, OperationTarget::SharedStore);
    }
}

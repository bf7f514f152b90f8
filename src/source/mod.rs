// src/source/mod.rs

//! Package source capabilities consumed by the resolver
//!
//! Physical storage, remote feeds and aggregate queries all sit behind
//! [`PackageSource`]. The resolver only asks for packages by id, by id and
//! version, or for the best candidate satisfying a dependency.

mod memory;
mod policy;

pub use memory::MemoryRepository;
pub use policy::DependencyVersion;

use crate::constraint::ConstraintProvider;
use crate::error::Result;
use crate::package::{Package, PackageDependency, PackageIdentity};
use crate::version::{SemanticVersion, VersionSpec};
use tracing::trace;

/// Options controlling how a dependency is matched to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveOptions {
    pub allow_prerelease: bool,
    /// Drop unlisted candidates when a listed one fits
    pub prefer_listed: bool,
    pub dependency_version: DependencyVersion,
}

/// A repository of packages, local or remote
///
/// Implementations must be blocking. Hard failures are reported through
/// [`crate::Error::Source`] and propagate out of the resolver unchanged.
pub trait PackageSource {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Every version of a package id, in any order
    fn find_packages(&self, id: &str) -> Result<Vec<Package>>;

    fn find_package(&self, id: &str, version: &SemanticVersion) -> Result<Option<Package>> {
        Ok(self
            .find_packages(id)?
            .into_iter()
            .find(|p| &p.version == version))
    }

    fn exists(&self, identity: &PackageIdentity) -> Result<bool> {
        Ok(self.find_package(&identity.id, &identity.version)?.is_some())
    }

    /// The installed package for an id; the highest version if several exist
    fn find_installed(&self, id: &str) -> Result<Option<Package>> {
        Ok(self
            .find_packages(id)?
            .into_iter()
            .max_by(|a, b| a.version.cmp(&b.version)))
    }

    /// Packages of an id whose version satisfies the range, ascending by version
    fn find_candidates(&self, id: &str, spec: Option<&VersionSpec>) -> Result<Vec<Package>> {
        let mut candidates: Vec<Package> = self
            .find_packages(id)?
            .into_iter()
            .filter(|p| spec.is_none_or(|spec| spec.satisfies(&p.version)))
            .collect();
        candidates.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(candidates)
    }

    /// Pick one package satisfying the dependency, or None
    fn resolve_dependency(
        &self,
        dependency: &PackageDependency,
        constraints: &dyn ConstraintProvider,
        options: &ResolveOptions,
    ) -> Result<Option<Package>> {
        resolve_from(self, dependency, constraints, options)
    }
}

/// Finds packages that depend on a given package
pub trait DependentsResolver {
    /// Packages with a dependency on `package.id` whose range accepts `package.version`
    fn dependents(&self, package: &Package) -> Result<Vec<Package>>;
}

/// Resolve a dependency against a source
///
/// Candidates are narrowed by the dependency's range, the constraint
/// provider, the prerelease policy and, when requested, listing state. The
/// version policy then picks one of the survivors. No survivor is not an
/// error.
pub fn resolve_from<S: PackageSource + ?Sized>(
    source: &S,
    dependency: &PackageDependency,
    constraints: &dyn ConstraintProvider,
    options: &ResolveOptions,
) -> Result<Option<Package>> {
    let mut candidates = source.find_candidates(&dependency.id, dependency.version_spec.as_ref())?;

    candidates.retain(|p| constraints.allows(&dependency.id, &p.version));

    if !options.allow_prerelease {
        candidates.retain(|p| p.is_release_version());
    }

    if options.prefer_listed && candidates.iter().any(|p| p.listed) {
        candidates.retain(|p| p.listed);
    }

    let selected = options.dependency_version.select(&candidates).cloned();
    trace!(
        "{}: {} candidate(s) for {}, selected {:?}",
        source.name(),
        candidates.len(),
        dependency,
        selected.as_ref().map(|p| p.version.to_string())
    );
    Ok(selected)
}

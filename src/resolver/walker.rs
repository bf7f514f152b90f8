// src/resolver/walker.rs

//! Depth-first dependency graph walker
//!
//! [`PackageWalker::walk`] drives the traversal: it checks the visitation
//! marker, calls the before/after hooks around each package and resolves
//! every compatible dependency before recursing into it. Install and
//! uninstall resolution are specializations that supply the hooks.
//!
//! Re-entering a package that is still on the active path is a cycle. The
//! walk skips it and keeps going. Reaching a different version of an id the
//! walk already holds is a version conflict, reported through
//! [`PackageWalker::on_version_conflict`].

use super::marker::{VisitationMarker, VisitationState};
use crate::error::{Error, Result};
use crate::package::{Package, PackageDependency};
use crate::platform::{DefaultCompatibility, PlatformCompatibility};
use std::sync::Arc;
use tracing::{debug, trace};

/// Settings shared by every step of a walk
#[derive(Clone)]
pub struct WalkContext {
    /// Visit roots only, without descending into dependencies
    pub ignore_dependencies: bool,
    /// Decides which dependency sets apply
    pub compatibility: Arc<dyn PlatformCompatibility>,
}

impl WalkContext {
    pub fn new(ignore_dependencies: bool, compatibility: Arc<dyn PlatformCompatibility>) -> Self {
        Self {
            ignore_dependencies,
            compatibility,
        }
    }
}

impl Default for WalkContext {
    fn default() -> Self {
        Self::new(false, Arc::new(DefaultCompatibility::default()))
    }
}

/// A depth-first walk over a package and its resolved dependencies
pub trait PackageWalker {
    fn marker(&mut self) -> &mut VisitationMarker;

    fn context(&self) -> &WalkContext;

    /// Find a package satisfying a dependency not already in the marker
    fn resolve_dependency(&mut self, dependency: &PackageDependency) -> Result<Option<Package>>;

    /// Called after a package is marked processing, before its dependencies
    fn on_before_visit(&mut self, _package: &Package) -> Result<()> {
        Ok(())
    }

    /// Called once all dependencies of a package have been walked
    fn on_after_visit(&mut self, _package: &Package) -> Result<()> {
        Ok(())
    }

    /// Called when a dependency resolves to nothing; fatal unless overridden
    fn on_dependency_resolve_error(
        &mut self,
        _package: &Package,
        dependency: &PackageDependency,
    ) -> Result<()> {
        Err(Error::UnresolvedDependency {
            id: dependency.id.clone(),
            dependency: dependency.to_string(),
            constraint: None,
        })
    }

    /// Called when `requested` has the id of `selected`, already marked at
    /// another version; fatal unless overridden
    ///
    /// `dependent` is the package whose dependency resolved to `requested`,
    /// or None when `requested` was walked directly.
    fn on_version_conflict(
        &mut self,
        selected: &Package,
        requested: &Package,
        dependent: Option<&Package>,
    ) -> Result<()> {
        Err(Error::VersionConflict {
            requested: requested.to_string(),
            selected: selected.to_string(),
            dependent: dependent.map(|d| d.to_string()),
        })
    }

    /// Walk a package and, unless dependencies are ignored, everything it depends on
    fn walk(&mut self, package: &Package) -> Result<()> {
        if let Some(selected) = self.marker().other_version(package).cloned() {
            return self.on_version_conflict(&selected, package, None);
        }

        match self.marker().state(&package.id) {
            VisitationState::Visited => {
                trace!("{} already visited", package);
                return Ok(());
            }
            VisitationState::Processing => {
                debug!("{} is already on the walk path, skipping", package);
                return Ok(());
            }
            VisitationState::Unvisited => {}
        }

        self.marker().mark_processing(package);
        self.on_before_visit(package)?;

        if !self.context().ignore_dependencies {
            let compatibility = Arc::clone(&self.context().compatibility);
            let dependencies: Vec<PackageDependency> = package
                .compatible_dependencies(compatibility.as_ref())
                .cloned()
                .collect();

            for dependency in &dependencies {
                let resolved = match self.marker().resolve(dependency).cloned() {
                    Some(marked) => Some(marked),
                    None => self.resolve_dependency(dependency)?,
                };

                let Some(next) = resolved else {
                    self.on_dependency_resolve_error(package, dependency)?;
                    continue;
                };
                match self.marker().other_version(&next).cloned() {
                    Some(selected) => self.on_version_conflict(&selected, &next, Some(package))?,
                    None => self.walk(&next)?,
                }
            }
        }

        self.on_after_visit(package)?;
        self.marker().mark_visited(package);
        Ok(())
    }
}

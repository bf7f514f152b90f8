// src/resolver/marker.rs

//! Per-walk visitation state
//!
//! The marker tracks one package per id for the duration of a walk. A second
//! version of an id never gets its own entry: the walk settles on a single
//! version per id, and a request for another one is a version conflict.

use crate::package::{Package, PackageDependency, PackageIdentity, normalize_id};
use std::collections::HashMap;

/// Three-state visitation used for cycle handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitationState {
    #[default]
    Unvisited,
    /// On the active walk path
    Processing,
    Visited,
}

/// Map from normalized package id to its state and marked package
#[derive(Debug, Default)]
pub struct VisitationMarker {
    entries: HashMap<String, (VisitationState, Package)>,
}

impl VisitationMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &str) -> VisitationState {
        self.entries
            .get(&normalize_id(id))
            .map(|(state, _)| *state)
            .unwrap_or_default()
    }

    pub fn mark_processing(&mut self, package: &Package) {
        self.mark(package, VisitationState::Processing);
    }

    pub fn mark_visited(&mut self, package: &Package) {
        self.mark(package, VisitationState::Visited);
    }

    fn mark(&mut self, package: &Package, state: VisitationState) {
        self.entries
            .insert(normalize_id(&package.id), (state, package.clone()));
    }

    /// The package marked for an id, in any state
    pub fn package(&self, id: &str) -> Option<&Package> {
        self.entries.get(&normalize_id(id)).map(|(_, p)| p)
    }

    /// Whether this exact identity is the marked package for its id
    pub fn contains(&self, identity: &PackageIdentity) -> bool {
        self.package(&identity.id)
            .is_some_and(|p| p.version == identity.version)
    }

    /// The marked package for this id when it is a different version
    pub fn other_version(&self, package: &Package) -> Option<&Package> {
        self.package(&package.id)
            .filter(|p| p.version != package.version)
    }

    /// The marked package for the dependency's id, if it satisfies the range
    pub fn resolve(&self, dependency: &PackageDependency) -> Option<&Package> {
        self.package(&dependency.id)
            .filter(|p| dependency.is_satisfied_by(&p.version))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

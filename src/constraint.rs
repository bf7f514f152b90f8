// src/constraint.rs

//! Externally imposed version constraints
//!
//! A constraint provider narrows the acceptable versions of a package id on
//! top of whatever range a dependency declares. Pinned versions from a model
//! file are the usual source. The install walker also layers a temporary
//! pin while it re-resolves dependents during a cascading update.

use crate::package::normalize_id;
use crate::version::{SemanticVersion, VersionSpec};
use std::collections::HashMap;
use std::sync::Arc;

/// A constraint on one package id and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub spec: VersionSpec,
    pub source: String,
}

/// Source of additional per-id version restrictions
pub trait ConstraintProvider {
    fn constraint(&self, id: &str) -> Option<Constraint>;

    /// Whether the version is acceptable under this provider
    fn allows(&self, id: &str, version: &SemanticVersion) -> bool {
        self.constraint(id)
            .is_none_or(|constraint| constraint.spec.satisfies(version))
    }
}

/// Imposes no constraints
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConstraintProvider;

impl ConstraintProvider for NullConstraintProvider {
    fn constraint(&self, _id: &str) -> Option<Constraint> {
        None
    }
}

/// Per-id version ranges declared by one named source
#[derive(Debug, Clone, Default)]
pub struct PinnedVersions {
    source: String,
    pins: HashMap<String, VersionSpec>,
}

impl PinnedVersions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pins: HashMap::new(),
        }
    }

    /// Pin an id to a range, replacing any earlier pin for it
    pub fn pin(&mut self, id: &str, spec: VersionSpec) {
        self.pins.insert(normalize_id(id), spec);
    }

    pub fn with_pin(mut self, id: &str, spec: VersionSpec) -> Self {
        self.pin(id, spec);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl ConstraintProvider for PinnedVersions {
    fn constraint(&self, id: &str) -> Option<Constraint> {
        self.pins.get(&normalize_id(id)).map(|spec| Constraint {
            spec: spec.clone(),
            source: self.source.clone(),
        })
    }
}

/// Composes providers; the first provider with a constraint for an id wins
#[derive(Clone, Default)]
pub struct AggregateConstraintProvider {
    providers: Vec<Arc<dyn ConstraintProvider>>,
}

impl AggregateConstraintProvider {
    pub fn new(providers: Vec<Arc<dyn ConstraintProvider>>) -> Self {
        Self { providers }
    }
}

impl ConstraintProvider for AggregateConstraintProvider {
    fn constraint(&self, id: &str) -> Option<Constraint> {
        self.providers
            .iter()
            .find_map(|provider| provider.constraint(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> VersionSpec {
        VersionSpec::parse(s).unwrap()
    }

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_null_provider_allows_everything() {
        assert!(NullConstraintProvider.allows("anything", &v("0.1")));
    }

    #[test]
    fn test_pinned_lookup_ignores_case() {
        let pins = PinnedVersions::new("system.toml").with_pin("Json", spec("[12.0,13.0)"));
        let constraint = pins.constraint("JSON").unwrap();
        assert_eq!(constraint.source, "system.toml");
        assert!(pins.allows("json", &v("12.5")));
        assert!(!pins.allows("json", &v("13.0")));
        assert!(pins.allows("other", &v("13.0")));
    }

    #[test]
    fn test_aggregate_first_provider_wins() {
        let first: Arc<dyn ConstraintProvider> =
            Arc::new(PinnedVersions::new("first").with_pin("P", spec("[1.0]")));
        let second: Arc<dyn ConstraintProvider> = Arc::new(
            PinnedVersions::new("second")
                .with_pin("P", spec("[2.0]"))
                .with_pin("Q", spec("[3.0]")),
        );
        let aggregate = AggregateConstraintProvider::new(vec![first, second]);

        assert_eq!(aggregate.constraint("P").unwrap().source, "first");
        assert_eq!(aggregate.constraint("Q").unwrap().source, "second");
        assert!(aggregate.constraint("R").is_none());
    }
}

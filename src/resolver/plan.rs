// src/resolver/plan.rs

//! Resolution plan data structures
//!
//! Contains the result type for multi-package installs.

use super::operation::{Operation, PackageAction};
use crate::package::Package;

/// Result of resolving a batch of packages
#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    /// Reduced operations, in the order they were recorded
    pub operations: Vec<Operation>,
    /// The requested packages, dependencies before dependents
    pub install_order: Vec<Package>,
}

impl ResolutionPlan {
    pub fn installs(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|op| op.action == PackageAction::Install)
    }

    pub fn uninstalls(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|op| op.action == PackageAction::Uninstall)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

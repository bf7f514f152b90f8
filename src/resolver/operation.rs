// src/resolver/operation.rs

//! Install and uninstall operations and the index that collects them

use crate::package::{Package, PackageIdentity};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageAction {
    Install,
    Uninstall,
}

impl PackageAction {
    pub fn as_str(&self) -> &str {
        match self {
            PackageAction::Install => "install",
            PackageAction::Uninstall => "uninstall",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            PackageAction::Install => PackageAction::Uninstall,
            PackageAction::Uninstall => PackageAction::Install,
        }
    }
}

impl FromStr for PackageAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "install" => Ok(PackageAction::Install),
            "uninstall" => Ok(PackageAction::Uninstall),
            _ => Err(format!("Invalid package action: {s}")),
        }
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an install lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationTarget {
    /// The consuming project
    #[default]
    Consumer,
    /// Only the shared package store; used for packages without a payload
    SharedStore,
}

impl OperationTarget {
    pub fn as_str(&self) -> &str {
        match self {
            OperationTarget::Consumer => "consumer",
            OperationTarget::SharedStore => "shared-store",
        }
    }
}

impl fmt::Display for OperationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a resolved plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub package: Package,
    pub action: PackageAction,
    pub target: OperationTarget,
}

impl Operation {
    pub fn new(package: Package, action: PackageAction) -> Self {
        Self {
            package,
            action,
            target: OperationTarget::default(),
        }
    }

    pub fn install(package: Package) -> Self {
        Self::new(package, PackageAction::Install)
    }

    pub fn uninstall(package: Package) -> Self {
        Self::new(package, PackageAction::Uninstall)
    }

    pub fn with_target(mut self, target: OperationTarget) -> Self {
        self.target = target;
        self
    }

    fn key(&self) -> (PackageAction, PackageIdentity) {
        (self.action, self.package.identity())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            PackageAction::Install => "Install",
            PackageAction::Uninstall => "Uninstall",
        };
        write!(f, "{} {}", verb, self.package)?;
        if self.target == OperationTarget::SharedStore {
            write!(f, " ({})", self.target)?;
        }
        Ok(())
    }
}

/// Operations recorded during a walk, at most one per (action, identity)
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    operations: Vec<Operation>,
    keys: HashSet<(PackageAction, PackageIdentity)>,
}

impl OperationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation; duplicates are ignored
    pub fn add(&mut self, operation: Operation) {
        if self.keys.insert(operation.key()) {
            self.operations.push(operation);
        }
    }

    /// Drop a recorded operation; missing entries are ignored
    pub fn remove(&mut self, action: PackageAction, package: &Package) {
        let key = (action, package.identity());
        if self.keys.remove(&key) {
            self.operations.retain(|op| op.key() != key);
        }
    }

    pub fn contains(&self, action: PackageAction, package: &Package) -> bool {
        self.keys.contains(&(action, package.identity()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
        self.keys.clear();
    }

    /// Collapse the index into a final operation list
    ///
    /// An identity with both an install and an uninstall recorded cancels out.
    /// Everything else keeps its first-insertion order.
    pub fn reduce(&self) -> Vec<Operation> {
        self.operations
            .iter()
            .filter(|op| {
                !self
                    .keys
                    .contains(&(op.action.opposite(), op.package.identity()))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SemanticVersion;

    fn pkg(id: &str, version: &str) -> Package {
        Package::new(id, SemanticVersion::parse(version).unwrap())
    }

    #[test]
    fn test_add_ignores_duplicates() {
        let mut index = OperationIndex::new();
        index.add(Operation::install(pkg("A", "1.0")));
        index.add(Operation::install(pkg("a", "1.0")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut index = OperationIndex::new();
        index.add(Operation::install(pkg("A", "1.0")));
        index.remove(PackageAction::Uninstall, &pkg("A", "1.0"));
        assert_eq!(index.len(), 1);

        index.remove(PackageAction::Install, &pkg("A", "1.0"));
        assert!(index.is_empty());
        assert!(!index.contains(PackageAction::Install, &pkg("A", "1.0")));
    }

    #[test]
    fn test_reduce_cancels_opposites() {
        let mut index = OperationIndex::new();
        index.add(Operation::uninstall(pkg("P", "1.0")));
        index.add(Operation::install(pkg("Q", "1.0")));
        index.add(Operation::uninstall(pkg("Q", "1.0")));
        index.add(Operation::install(pkg("P", "2.0")));

        let reduced: Vec<String> = index.reduce().iter().map(|op| op.to_string()).collect();
        assert_eq!(reduced, vec!["Uninstall P 1.0.0", "Install P 2.0.0"]);
    }

    #[test]
    fn test_display_shared_store() {
        let op = Operation::install(pkg("Meta", "1.0")).with_target(OperationTarget::SharedStore);
        assert_eq!(op.to_string(), "Install Meta 1.0.0 (shared-store)");
        assert_eq!("uninstall".parse::<PackageAction>().unwrap(), PackageAction::Uninstall);
    }
}

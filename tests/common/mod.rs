// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use depwalk::{
    MemoryRepository, Operation, Package, PackageDependency, PackageFile, SemanticVersion,
    VersionSpec,
};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn v(s: &str) -> SemanticVersion {
    SemanticVersion::parse(s).unwrap()
}

pub fn pkg(id: &str, version: &str) -> Package {
    Package::new(id, v(version))
}

/// A package carrying a payload file, so it installs into the consumer
pub fn lib(id: &str, version: &str) -> Package {
    pkg(id, version).with_file(PackageFile::new(format!("lib/{}.dll", id.to_lowercase())))
}

/// A dependency; an empty range accepts any version
pub fn dep(id: &str, range: &str) -> PackageDependency {
    if range.is_empty() {
        PackageDependency::any(id)
    } else {
        PackageDependency::new(id, Some(VersionSpec::parse(range).unwrap()))
    }
}

pub fn repo(name: &str, packages: Vec<Package>) -> MemoryRepository {
    MemoryRepository::from_packages(name, packages)
}

/// Operations as "action id version" strings
pub fn summary(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .map(|op| format!("{} {}", op.action, op.package))
        .collect()
}

/// Write a model file into a fresh temporary directory.
///
/// Returns (TempDir, path) - keep the TempDir alive to prevent cleanup.
pub fn write_model(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("model.toml");
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

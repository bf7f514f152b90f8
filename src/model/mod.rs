// src/model/mod.rs

//! Package Model - declarative resolver input
//!
//! A package model file describes everything a resolution needs: the session
//! settings, pinned version ranges, the installed set and the packages the
//! dependency source offers. The CLI loads a model, runs the resolver against
//! it and can write the resulting installed set back.
//!
//! # Example model.toml
//!
//! ```toml
//! [session]
//! dependency-version = "highest-patch"
//! target-platform = "dotnet/8.0"
//!
//! # Pinned ranges, applied on top of declared dependency ranges
//! [pin]
//! Json = "[12.0,13.0)"
//!
//! [[installed]]
//! id = "P"
//! version = "1.0"
//! dependencies = { Core = "[1.0,2.0)" }
//!
//! [[available]]
//! id = "P"
//! version = "2.0"
//! files = [{ path = "lib/p.dll" }]
//! ```

pub mod parser;

pub use parser::{
    DependencySetEntry, FileEntry, PackageEntry, PackageModel, SessionConfig, parse_model_file,
    parse_model_string, parse_range,
};

use crate::constraint::PinnedVersions;
use crate::package::{Package, normalize_id};
use crate::resolver::{Operation, PackageAction, ResolverConfig};
use crate::source::MemoryRepository;
use crate::version::SemanticVersion;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when working with package models
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse model file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize model: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] crate::Error),

    #[error("Invalid session setting: {0}")]
    InvalidSession(String),

    #[error("Invalid package entry: {0}")]
    InvalidEntry(String),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Load and validate a package model file
pub fn load_model(path: &Path) -> ModelResult<PackageModel> {
    parse_model_file(path)
}

/// Parse and validate a package model from TOML text
pub fn parse_model(content: &str) -> ModelResult<PackageModel> {
    parse_model_string(content)
}

/// Write a package model file
pub fn save_model(path: &Path, model: &PackageModel) -> ModelResult<()> {
    std::fs::write(path, model.to_toml()?)?;
    Ok(())
}

impl PackageModel {
    pub fn installed_packages(&self) -> ModelResult<Vec<Package>> {
        self.installed.iter().map(PackageEntry::to_package).collect()
    }

    pub fn available_packages(&self) -> ModelResult<Vec<Package>> {
        self.available.iter().map(PackageEntry::to_package).collect()
    }

    /// The installed set as a repository
    pub fn installed_repository(&self) -> ModelResult<MemoryRepository> {
        Ok(MemoryRepository::from_packages(
            "installed",
            self.installed_packages()?,
        ))
    }

    /// The dependency source as a repository
    pub fn available_repository(&self) -> ModelResult<MemoryRepository> {
        Ok(MemoryRepository::from_packages(
            "available",
            self.available_packages()?,
        ))
    }

    /// Pinned ranges as a constraint provider named after `source`
    pub fn constraints(&self, source: &str) -> ModelResult<PinnedVersions> {
        let mut pins = PinnedVersions::new(source);
        for (id, range) in &self.pin {
            if let Some(spec) = parse_range(range)? {
                pins.pin(id, spec);
            }
        }
        Ok(pins)
    }

    pub fn resolver_config(&self) -> ModelResult<ResolverConfig> {
        self.session.to_resolver_config()
    }

    /// Update the installed set with resolved operations
    pub fn apply(&mut self, operations: &[Operation]) {
        for operation in operations {
            match operation.action {
                PackageAction::Uninstall => {
                    self.installed
                        .retain(|entry| !entry_matches(entry, &operation.package));
                }
                PackageAction::Install => {
                    if !self
                        .installed
                        .iter()
                        .any(|entry| entry_matches(entry, &operation.package))
                    {
                        self.installed
                            .push(PackageEntry::from_package(&operation.package));
                    }
                }
            }
            debug!("Applied {}", operation);
        }
    }
}

fn entry_matches(entry: &PackageEntry, package: &Package) -> bool {
    normalize_id(&entry.id) == normalize_id(&package.id)
        && SemanticVersion::parse(&entry.version).is_ok_and(|v| v == package.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintProvider;
    use crate::source::PackageSource;

    const MODEL: &str = r#"
[pin]
Core = "[1.0,2.0)"

[[installed]]
id = "P"
version = "1.0"

[[available]]
id = "P"
version = "2.0"
"#;

    #[test]
    fn test_repositories_and_constraints() {
        let model = parse_model(MODEL).unwrap();
        let installed = model.installed_repository().unwrap();
        assert_eq!(installed.name(), "installed");
        assert!(installed.find_installed("p").unwrap().is_some());

        let pins = model.constraints("model.toml").unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins.constraint("core").unwrap().source, "model.toml");
    }

    #[test]
    fn test_apply_operations() {
        let mut model = parse_model(MODEL).unwrap();
        let available = model.available_packages().unwrap();
        let installed = model.installed_packages().unwrap();

        model.apply(&[
            Operation::uninstall(installed[0].clone()),
            Operation::install(available[0].clone()),
        ]);

        assert_eq!(model.installed.len(), 1);
        assert_eq!(model.installed[0].version, "2.0.0");
    }
}

// src/lib.rs

//! depwalk - package dependency graph resolution
//!
//! Turns "install these packages" or "uninstall this package" into an
//! ordered list of install and uninstall operations against an installed
//! set, given a source of available packages.
//!
//! # Architecture
//!
//! - Walker: depth-first traversal with three-state visitation; cycles are skipped
//! - Conflicts: a different installed version of an id is uninstalled, and
//!   dependents that reject the new version are upgraded in cascade
//! - Sources: installed and available packages sit behind `PackageSource`
//! - Constraints: pinned ranges narrow what dependencies may resolve to
//! - Model files: TOML descriptions of a session for the CLI

pub mod constraint;
mod error;
pub mod model;
pub mod package;
pub mod platform;
pub mod resolver;
pub mod source;
pub mod version;

pub use constraint::{
    AggregateConstraintProvider, Constraint, ConstraintProvider, NullConstraintProvider,
    PinnedVersions,
};
pub use error::{ConstraintInfo, Error, Result};
pub use model::{ModelError, PackageModel, load_model, parse_model, save_model};
pub use package::{DependencySet, Package, PackageDependency, PackageFile, PackageIdentity};
pub use platform::{DefaultCompatibility, PlatformCompatibility, TargetPlatform};
pub use resolver::{
    InstallWalker, Operation, OperationIndex, OperationTarget, PackageAction, PackageWalker,
    ResolutionPlan, ResolverConfig, UninstallOptions, UninstallWalker,
};
pub use source::{
    DependencyVersion, DependentsResolver, MemoryRepository, PackageSource, ResolveOptions,
};
pub use version::{SemanticVersion, VersionSpec};

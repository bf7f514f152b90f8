// src/resolver/mod.rs

//! Dependency resolution and conflict detection
//!
//! This module walks package dependency graphs to turn an install or
//! uninstall request into an ordered list of operations against the
//! installed set. Conflicting installed versions are replaced, and
//! incompatible dependents are upgraded in cascade when a compatible
//! version exists.

mod conflict;
mod graph;
mod install;
mod marker;
mod operation;
mod plan;
mod uninstall;
mod walker;

pub use conflict::ConflictResult;
pub use graph::{BatchGraph, dependency_order};
pub use install::InstallWalker;
pub use marker::{VisitationMarker, VisitationState};
pub use operation::{Operation, OperationIndex, OperationTarget, PackageAction};
pub use plan::ResolutionPlan;
pub use uninstall::{UninstallOptions, UninstallWalker};
pub use walker::{PackageWalker, WalkContext};

use crate::platform::TargetPlatform;
use crate::source::DependencyVersion;

/// Session settings for an install resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Resolve roots only
    pub ignore_dependencies: bool,
    /// Allow prerelease versions when resolving dependencies
    pub allow_prerelease: bool,
    pub dependency_version: DependencyVersion,
    /// Target for dependency sets and payload files; None accepts every platform
    pub target_platform: Option<TargetPlatform>,
    /// Treat a root older than the installed version as an intentional downgrade
    pub check_downgrade: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ignore_dependencies: false,
            allow_prerelease: false,
            dependency_version: DependencyVersion::default(),
            target_platform: None,
            check_downgrade: true,
        }
    }
}

impl ResolverConfig {
    pub fn with_dependency_version(mut self, policy: DependencyVersion) -> Self {
        self.dependency_version = policy;
        self
    }

    pub fn with_target_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = Some(platform);
        self
    }
}

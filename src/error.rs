// src/error.rs

//! Error types for dependency resolution
//!
//! Resolution errors are terminal for the resolve call that raised them.
//! Parse errors are raised when versions, ranges or platforms are declared,
//! never while they are queried.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// An additional constraint that narrowed a dependency's acceptable range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    /// The constraint range, in interval notation
    pub spec: String,
    /// Where the constraint was declared (e.g. a model file path)
    pub source: String,
}

#[derive(Debug, Error)]
pub enum Error {
    /// No candidate satisfies a declared dependency range
    #[error("{}", unresolved_message(.id, .dependency, .constraint))]
    UnresolvedDependency {
        id: String,
        dependency: String,
        constraint: Option<ConstraintInfo>,
    },

    /// Installed dependents cannot tolerate the new version and no compatible
    /// update was found for them
    #[error("{}", conflict_message(.package, .conflicting, .dependents))]
    PackageConflict {
        package: String,
        conflicting: String,
        dependents: Vec<String>,
    },

    /// A walk asked for a second version of an id it had already settled on
    #[error("{}", version_conflict_message(.requested, .selected, .dependent))]
    VersionConflict {
        requested: String,
        selected: String,
        dependent: Option<String>,
    },

    /// A higher version is already referenced and this is not a downgrade session
    #[error("Already referencing a newer version of '{id}'.")]
    DowngradeRejected { id: String },

    /// Installed packages still depend on a package being removed
    #[error("{}", dependents_message(.package, .dependents))]
    DependentsExist {
        package: String,
        dependents: Vec<String>,
    },

    #[error("Invalid version '{0}': {1}")]
    InvalidVersion(String, String),

    #[error("Invalid version range '{0}': {1}")]
    InvalidVersionSpec(String, String),

    #[error("Invalid target platform '{0}': {1}")]
    InvalidPlatform(String, String),

    /// Hard failure reported by a package source
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this error is a resolution outcome rather than a collaborator
    /// or declaration failure
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedDependency { .. }
                | Error::PackageConflict { .. }
                | Error::VersionConflict { .. }
                | Error::DowngradeRejected { .. }
                | Error::DependentsExist { .. }
        )
    }
}

fn unresolved_message(id: &str, dependency: &str, constraint: &Option<ConstraintInfo>) -> String {
    match constraint {
        Some(c) => format!(
            "Unable to resolve dependency '{}'. '{}' has an additional constraint {} defined in {}.",
            dependency, id, c.spec, c.source
        ),
        None => format!("Unable to resolve dependency '{}'.", dependency),
    }
}

fn conflict_message(package: &str, conflicting: &str, dependents: &[String]) -> String {
    if dependents.len() == 1 {
        format!(
            "Updating '{}' to '{}' failed. Unable to find a version of '{}' that is compatible with '{}'.",
            conflicting, package, dependents[0], package
        )
    } else {
        format!(
            "Updating '{}' to '{}' failed. Unable to find versions of '{}' that are compatible with '{}'.",
            conflicting,
            package,
            dependents.join(", "),
            package
        )
    }
}

fn version_conflict_message(requested: &str, selected: &str, dependent: &Option<String>) -> String {
    match dependent {
        Some(d) => format!(
            "Unable to resolve '{}' for '{}'. '{}' is already selected.",
            requested, d, selected
        ),
        None => format!(
            "Unable to install '{}'. '{}' is already selected.",
            requested, selected
        ),
    }
}

fn dependents_message(package: &str, dependents: &[String]) -> String {
    if dependents.len() == 1 {
        format!(
            "Unable to uninstall '{}' because '{}' depends on it.",
            package, dependents[0]
        )
    } else {
        format!(
            "Unable to uninstall '{}' because '{}' depend on it.",
            package,
            dependents.join(", ")
        )
    }
}

// src/cli.rs

//! CLI definitions for depwalk
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Flags override the matching `[session]` values of the model file.

use clap::{Parser, Subcommand};
use depwalk::DependencyVersion;

#[derive(Parser)]
#[command(name = "depwalk")]
#[command(author, version)]
#[command(about = "Resolve package install and uninstall plans from a package model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the operations needed to install package(s)
    ///
    /// Each package is given as `id` or `id@version`. Without a version the
    /// highest available version allowed by the model's pins is used.
    Install {
        /// Path to the package model file
        model: String,

        /// Packages to install (id or id@version)
        #[arg(required = true)]
        packages: Vec<String>,

        /// Allow prerelease versions
        #[arg(long)]
        prerelease: bool,

        /// Install the requested packages only
        #[arg(long)]
        ignore_dependencies: bool,

        /// Dependency version policy (lowest, highest, highest-patch, highest-minor)
        #[arg(long)]
        dependency_version: Option<DependencyVersion>,

        /// Target platform, e.g. dotnet/8.0
        #[arg(long)]
        target_platform: Option<String>,

        /// Reject installing a version older than the installed one
        #[arg(long)]
        no_check_downgrade: bool,

        /// Write the resulting installed set back to the model file
        #[arg(long)]
        apply: bool,
    },

    /// Resolve the operations needed to uninstall a package
    Uninstall {
        /// Path to the package model file
        model: String,

        /// Installed package id
        package: String,

        /// Also remove dependencies nothing else needs
        #[arg(long)]
        remove_dependencies: bool,

        /// Remove the package even if installed packages depend on it
        #[arg(long)]
        force: bool,

        /// Write the resulting installed set back to the model file
        #[arg(long)]
        apply: bool,
    },
}

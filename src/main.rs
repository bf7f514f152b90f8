// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::SessionOverrides;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging; stdout carries the plan
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            model,
            packages,
            prerelease,
            ignore_dependencies,
            dependency_version,
            target_platform,
            no_check_downgrade,
            apply,
        } => {
            let overrides = SessionOverrides {
                prerelease,
                ignore_dependencies,
                dependency_version,
                target_platform,
                no_check_downgrade,
            };
            commands::cmd_install(&model, &packages, overrides, apply)
        }
        Commands::Uninstall {
            model,
            package,
            remove_dependencies,
            force,
            apply,
        } => commands::cmd_uninstall(&model, &package, remove_dependencies, force, apply),
    }
}

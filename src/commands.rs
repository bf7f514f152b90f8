// src/commands.rs

//! Command handlers for the depwalk CLI

use anyhow::{Context, Result};
use depwalk::model::{self, PackageModel};
use depwalk::{
    ConstraintProvider, DefaultCompatibility, DependencyVersion, InstallWalker, MemoryRepository,
    Operation, Package, PackageDependency, PackageSource, ResolveOptions, SemanticVersion,
    TargetPlatform, UninstallOptions, UninstallWalker,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Command-line overrides for the model's session settings
#[derive(Debug, Default)]
pub struct SessionOverrides {
    pub prerelease: bool,
    pub ignore_dependencies: bool,
    pub dependency_version: Option<DependencyVersion>,
    pub target_platform: Option<String>,
    pub no_check_downgrade: bool,
}

/// Resolve and print an install plan
pub fn cmd_install(
    model_path: &str,
    specs: &[String],
    overrides: SessionOverrides,
    apply: bool,
) -> Result<()> {
    let path = Path::new(model_path);
    let mut model = load(path)?;

    let mut config = model.resolver_config()?;
    config.allow_prerelease |= overrides.prerelease;
    config.ignore_dependencies |= overrides.ignore_dependencies;
    if overrides.no_check_downgrade {
        config.check_downgrade = false;
    }
    if let Some(policy) = overrides.dependency_version {
        config.dependency_version = policy;
    }
    if let Some(ref platform) = overrides.target_platform {
        config.target_platform = Some(
            TargetPlatform::parse(platform)
                .with_context(|| format!("Invalid --target-platform '{}'", platform))?,
        );
    }

    let local = model.installed_repository()?;
    let available = model.available_repository()?;
    let pins: Arc<dyn ConstraintProvider> = Arc::new(model.constraints(model_path)?);

    let mut roots = Vec::with_capacity(specs.len());
    for spec in specs {
        let (id, version) = parse_package_spec(spec)?;
        roots.push(select_root(
            &available,
            &local,
            pins.as_ref(),
            id,
            version.as_ref(),
            config.allow_prerelease,
        )?);
    }

    info!("Resolving against {} installed and {} available package(s)", local.len(), available.len());
    let mut walker = InstallWalker::new(&local, &available, config).with_constraints(pins);

    let operations = if let [root] = roots.as_slice() {
        let operations = walker.resolve_operations(root)?;
        print_operations(&operations);
        operations
    } else {
        let plan = walker.resolve_batch(&roots)?;
        print_operations(&plan.operations);
        println!("\nInstall order:");
        for (i, package) in plan.install_order.iter().enumerate() {
            println!("  {}. {}", i + 1, package);
        }
        plan.operations
    };

    if apply {
        save(path, &mut model, &operations)?;
    }
    Ok(())
}

/// Resolve and print an uninstall plan
pub fn cmd_uninstall(
    model_path: &str,
    id: &str,
    remove_dependencies: bool,
    force: bool,
    apply: bool,
) -> Result<()> {
    let path = Path::new(model_path);
    let mut model = load(path)?;
    let config = model.resolver_config()?;
    let local = model.installed_repository()?;

    let package = local
        .find_installed(id)?
        .ok_or_else(|| anyhow::anyhow!("Package '{}' is not installed", id))?;

    let options = UninstallOptions {
        remove_dependencies,
        force_remove: force,
        throw_on_conflicts: true,
    };
    let mut walker = UninstallWalker::new(&local, options)
        .with_compatibility(Arc::new(DefaultCompatibility::new(config.target_platform)));
    let operations = walker.resolve_operations(&package)?;
    print_operations(&operations);

    if apply {
        save(path, &mut model, &operations)?;
    }
    Ok(())
}

fn load(path: &Path) -> Result<PackageModel> {
    model::load_model(path)
        .with_context(|| format!("Failed to load package model '{}'", path.display()))
}

fn save(path: &Path, package_model: &mut PackageModel, operations: &[Operation]) -> Result<()> {
    package_model.apply(operations);
    model::save_model(path, package_model)
        .with_context(|| format!("Failed to write package model '{}'", path.display()))?;
    println!("\nUpdated {}", path.display());
    Ok(())
}

/// Split `id[@version]`
fn parse_package_spec(spec: &str) -> Result<(&str, Option<SemanticVersion>)> {
    match spec.split_once('@') {
        Some((id, version)) => {
            let version = SemanticVersion::parse(version)
                .with_context(|| format!("Invalid package spec '{}'", spec))?;
            Ok((id.trim(), Some(version)))
        }
        None => Ok((spec.trim(), None)),
    }
}

/// Pick the package a root spec refers to
///
/// An explicit version may name an available or an installed package.
/// Otherwise the highest available version allowed by the pins is used,
/// preferring listed versions.
fn select_root(
    available: &MemoryRepository,
    local: &MemoryRepository,
    pins: &dyn ConstraintProvider,
    id: &str,
    version: Option<&SemanticVersion>,
    allow_prerelease: bool,
) -> Result<Package> {
    if let Some(version) = version {
        if let Some(package) = available.find_package(id, version)? {
            return Ok(package);
        }
        return local.find_package(id, version)?.ok_or_else(|| {
            anyhow::anyhow!("Package '{}' version '{}' was not found", id, version)
        });
    }

    let options = ResolveOptions {
        allow_prerelease,
        prefer_listed: true,
        dependency_version: DependencyVersion::Highest,
    };
    available
        .resolve_dependency(&PackageDependency::any(id), pins, &options)?
        .ok_or_else(|| anyhow::anyhow!("No available version of '{}' satisfies the model", id))
}

fn print_operations(operations: &[Operation]) {
    if operations.is_empty() {
        println!("Nothing to do.");
        return;
    }
    println!("Operations:");
    for operation in operations {
        println!("  {}", operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_spec() {
        let (id, version) = parse_package_spec("Json@12.0.1").unwrap();
        assert_eq!(id, "Json");
        assert_eq!(version, Some(SemanticVersion::new(12, 0, 1)));

        let (id, version) = parse_package_spec("Json").unwrap();
        assert_eq!(id, "Json");
        assert!(version.is_none());

        assert!(parse_package_spec("Json@latest").is_err());
    }

    #[test]
    fn test_select_root_prefers_highest_listed() {
        let v = |s: &str| SemanticVersion::parse(s).unwrap();
        let available = MemoryRepository::from_packages(
            "available",
            vec![
                Package::new("P", v("1.0")),
                Package::new("P", v("1.5")),
                Package::new("P", v("2.0")).unlisted(),
                Package::new("P", v("3.0-rc1")),
            ],
        );
        let local = MemoryRepository::new("installed");
        let pins = depwalk::NullConstraintProvider;

        let root = select_root(&available, &local, &pins, "P", None, false).unwrap();
        assert_eq!(root.version, v("1.5"));

        let root = select_root(&available, &local, &pins, "P", None, true).unwrap();
        assert_eq!(root.version, v("3.0-rc1"));

        let root = select_root(&available, &local, &pins, "P", Some(&v("2.0")), false).unwrap();
        assert!(!root.listed);

        assert!(select_root(&available, &local, &pins, "Q", None, false).is_err());
    }
}

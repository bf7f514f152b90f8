// src/model/parser.rs

//! Parser for package model TOML files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{ModelError, ModelResult};
use crate::package::{DependencySet, Package, PackageDependency, PackageFile};
use crate::platform::TargetPlatform;
use crate::resolver::ResolverConfig;
use crate::source::DependencyVersion;
use crate::version::{SemanticVersion, VersionSpec};

/// A package model: session settings, pins, installed and available packages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageModel {
    /// Resolver session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Pinned version ranges (package id -> range)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pin: BTreeMap<String, String>,

    /// Packages currently installed
    #[serde(default)]
    pub installed: Vec<PackageEntry>,

    /// Packages the dependency source offers
    #[serde(default)]
    pub available: Vec<PackageEntry>,
}

/// The `[session]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    #[serde(default)]
    pub ignore_dependencies: bool,

    #[serde(default)]
    pub allow_prerelease: bool,

    /// lowest, highest, highest-patch or highest-minor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,

    #[serde(default = "default_check_downgrade")]
    pub check_downgrade: bool,
}

fn default_check_downgrade() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ignore_dependencies: false,
            allow_prerelease: false,
            dependency_version: None,
            target_platform: None,
            check_downgrade: default_check_downgrade(),
        }
    }
}

/// One `[[installed]]` or `[[available]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageEntry {
    pub id: String,
    pub version: String,

    #[serde(default = "default_listed")]
    pub listed: bool,

    /// Platform-neutral dependencies (package id -> range; "" or "*" for any)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_sets: Vec<DependencySetEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,
}

fn default_listed() -> bool {
    true
}

/// A dependency group scoped to a target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencySetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// A payload file, optionally scoped to a target platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileEntry {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_platform: Option<String>,
}

impl SessionConfig {
    /// Build a resolver configuration from the session table
    pub fn to_resolver_config(&self) -> ModelResult<ResolverConfig> {
        let dependency_version = match self.dependency_version.as_deref() {
            Some(policy) => policy
                .parse::<DependencyVersion>()
                .map_err(ModelError::InvalidSession)?,
            None => DependencyVersion::default(),
        };
        let target_platform = self
            .target_platform
            .as_deref()
            .map(TargetPlatform::parse)
            .transpose()?;

        Ok(ResolverConfig {
            ignore_dependencies: self.ignore_dependencies,
            allow_prerelease: self.allow_prerelease,
            dependency_version,
            target_platform,
            check_downgrade: self.check_downgrade,
        })
    }
}

impl PackageEntry {
    /// Convert to a package, parsing every version, range and platform
    pub fn to_package(&self) -> ModelResult<Package> {
        if self.id.trim().is_empty() {
            return Err(ModelError::InvalidEntry(format!(
                "Package entry with version '{}' has an empty id",
                self.version
            )));
        }

        let mut package = Package::new(self.id.trim(), SemanticVersion::parse(&self.version)?);
        package.listed = self.listed;

        if !self.dependencies.is_empty() {
            package = package.with_dependency_set(DependencySet::new(
                None,
                parse_dependencies(&self.dependencies)?,
            ));
        }

        for set in &self.dependency_sets {
            let target_platform = set
                .target_platform
                .as_deref()
                .map(TargetPlatform::parse)
                .transpose()?;
            package = package.with_dependency_set(DependencySet::new(
                target_platform,
                parse_dependencies(&set.dependencies)?,
            ));
        }

        for file in &self.files {
            let mut entry = PackageFile::new(file.path.clone());
            if let Some(platform) = file.target_platform.as_deref() {
                entry = entry.for_platform(TargetPlatform::parse(platform)?);
            }
            package = package.with_file(entry);
        }

        Ok(package)
    }

    /// Describe a package as a model entry
    pub fn from_package(package: &Package) -> Self {
        let mut dependencies = BTreeMap::new();
        let mut dependency_sets = Vec::new();

        for set in &package.dependency_sets {
            let deps: BTreeMap<String, String> = set
                .dependencies
                .iter()
                .map(|dep| (dep.id.clone(), format_range(dep)))
                .collect();
            match set.target_platform {
                None => dependencies.extend(deps),
                Some(ref platform) => dependency_sets.push(DependencySetEntry {
                    target_platform: Some(platform.to_string()),
                    dependencies: deps,
                }),
            }
        }

        Self {
            id: package.id.clone(),
            version: package.version.to_string(),
            listed: package.listed,
            dependencies,
            dependency_sets,
            files: package
                .files
                .iter()
                .map(|file| FileEntry {
                    path: file.path.clone(),
                    target_platform: file.target_platform.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

fn parse_dependencies(deps: &BTreeMap<String, String>) -> ModelResult<Vec<PackageDependency>> {
    deps.iter()
        .map(|(id, range)| Ok(PackageDependency::new(id.clone(), parse_range(range)?)))
        .collect()
}

/// Parse a range, where "" and "*" mean any version
pub fn parse_range(range: &str) -> ModelResult<Option<VersionSpec>> {
    match range.trim() {
        "" | "*" => Ok(None),
        range => Ok(Some(VersionSpec::parse(range)?)),
    }
}

fn format_range(dep: &PackageDependency) -> String {
    dep.version_spec
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "*".to_string())
}

impl PackageModel {
    /// Create a new empty package model
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pinned range for a package, if any
    pub fn get_pin(&self, id: &str) -> Option<&str> {
        self.pin
            .iter()
            .find(|(pinned, _)| pinned.eq_ignore_ascii_case(id))
            .map(|(_, range)| range.as_str())
    }

    /// Validate the model for consistency
    ///
    /// Every version, range and platform must parse, and no package may be
    /// listed twice in the same section.
    pub fn validate(&self) -> ModelResult<()> {
        self.session.to_resolver_config()?;

        for (id, range) in &self.pin {
            if parse_range(range)?.is_none() {
                return Err(ModelError::InvalidEntry(format!(
                    "Empty pin range for package '{}'",
                    id
                )));
            }
        }

        for (section, entries) in [("installed", &self.installed), ("available", &self.available)] {
            let mut seen = Vec::new();
            for entry in entries {
                let package = entry.to_package()?;
                if seen.contains(&package) {
                    return Err(ModelError::InvalidEntry(format!(
                        "Package '{}' appears twice in [{}]",
                        package, section
                    )));
                }
                seen.push(package);
            }
        }

        Ok(())
    }

    /// Serialize the model to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parse a package model from a TOML file
pub fn parse_model_file(path: &Path) -> ModelResult<PackageModel> {
    let content = std::fs::read_to_string(path)?;
    parse_model_string(&content)
}

/// Parse a package model from a TOML string
pub fn parse_model_string(content: &str) -> ModelResult<PackageModel> {
    let model: PackageModel = toml::from_str(content)?;
    model.validate()?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DefaultCompatibility;

    #[test]
    fn test_empty_model() {
        let model = parse_model_string("").unwrap();
        assert!(model.installed.is_empty());
        assert!(model.session.check_downgrade);
        assert_eq!(model.session.to_resolver_config().unwrap(), ResolverConfig::default());
    }

    #[test]
    fn test_parse_model_string() {
        let toml = r#"
[session]
allow-prerelease = true
dependency-version = "highest-patch"
target-platform = "dotnet/8.0"

[pin]
Json = "[12.0,13.0)"

[[installed]]
id = "P"
version = "1.0"
dependencies = { Core = "[1.0,2.0)", Logging = "*" }

[[available]]
id = "P"
version = "2.0"
listed = false
files = [{ path = "lib/p.dll" }]

[[available.dependency-sets]]
target-platform = "dotnet/8.0"
dependencies = { Extra = "1.0" }
"#;
        let model = parse_model_string(toml).unwrap();
        let config = model.session.to_resolver_config().unwrap();
        assert!(config.allow_prerelease);
        assert_eq!(config.dependency_version, DependencyVersion::HighestPatch);
        assert_eq!(model.get_pin("json"), Some("[12.0,13.0)"));

        let installed = model.installed[0].to_package().unwrap();
        let compat = DefaultCompatibility::default();
        let core = installed.find_dependency("Core", &compat).unwrap();
        assert_eq!(core.version_spec.as_ref().unwrap().to_string(), "[1.0.0, 2.0.0)");
        assert!(installed.find_dependency("Logging", &compat).unwrap().version_spec.is_none());

        let available = model.available[0].to_package().unwrap();
        assert!(!available.listed);
        assert_eq!(available.files.len(), 1);
        assert_eq!(available.dependency_sets.len(), 1);
        assert!(available.dependency_sets[0].target_platform.is_some());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_version = r#"
[[installed]]
id = "P"
version = "one"
"#;
        assert!(matches!(
            parse_model_string(bad_version).unwrap_err(),
            ModelError::Invalid(_)
        ));

        let bad_policy = r#"
[session]
dependency-version = "newest"
"#;
        assert!(matches!(
            parse_model_string(bad_policy).unwrap_err(),
            ModelError::InvalidSession(_)
        ));

        let duplicate = r#"
[[available]]
id = "P"
version = "1.0"

[[available]]
id = "p"
version = "1.0.0"
"#;
        assert!(matches!(
            parse_model_string(duplicate).unwrap_err(),
            ModelError::InvalidEntry(_)
        ));
    }

    #[test]
    fn test_entry_from_package() {
        let net8 = TargetPlatform::parse("dotnet/8.0").unwrap();
        let package = Package::new("App", SemanticVersion::new(1, 2, 0))
            .with_dependency(PackageDependency::any("Core"))
            .with_dependency_set(DependencySet::new(
                Some(net8),
                vec![PackageDependency::new(
                    "Extra",
                    Some(VersionSpec::parse("[1.0,2.0)").unwrap()),
                )],
            ));

        let entry = PackageEntry::from_package(&package);
        assert_eq!(entry.version, "1.2.0");
        assert_eq!(entry.dependencies.get("Core").map(String::as_str), Some("*"));
        assert_eq!(entry.dependency_sets[0].target_platform.as_deref(), Some("dotnet/8.0.0"));

        let back = entry.to_package().unwrap();
        assert_eq!(back, package);
        assert_eq!(back.dependency_sets, package.dependency_sets);
    }
}

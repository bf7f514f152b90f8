// tests/uninstall_resolution.rs

//! Integration tests for uninstall resolution.

mod common;

use common::{dep, pkg, repo, summary};
use depwalk::{Error, PackageSource, UninstallOptions, UninstallWalker};

fn installed() -> depwalk::MemoryRepository {
    repo(
        "local",
        vec![
            pkg("App", "1.0")
                .with_dependency(dep("Web", "1.0"))
                .with_dependency(dep("Log", "1.0")),
            pkg("Web", "1.0").with_dependency(dep("Http", "1.0")),
            pkg("Http", "1.0").with_dependency(dep("Log", "1.0")),
            pkg("Log", "1.0"),
            pkg("Cli", "1.0").with_dependency(dep("Http", "[1.0,2.0)")),
        ],
    )
}

#[test]
fn test_remove_dependencies_in_dependent_first_order() {
    let local = installed();
    let app = local.find_installed("App").unwrap().unwrap();
    let options = UninstallOptions {
        remove_dependencies: true,
        ..Default::default()
    };

    let ops = UninstallWalker::new(&local, options)
        .resolve_operations(&app)
        .unwrap();
    // Http and Log stay: Cli still needs them
    assert_eq!(summary(&ops), vec!["uninstall App 1.0.0", "uninstall Web 1.0.0"]);
}

#[test]
fn test_dependents_block_unless_conflicts_tolerated() {
    let local = installed();
    let http = local.find_installed("http").unwrap().unwrap();

    let err = UninstallWalker::new(&local, UninstallOptions::default())
        .resolve_operations(&http)
        .unwrap_err();
    match err {
        Error::DependentsExist { ref dependents, .. } => {
            assert_eq!(dependents, &["Web 1.0.0", "Cli 1.0.0"]);
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "Unable to uninstall 'Http 1.0.0' because 'Web 1.0.0, Cli 1.0.0' depend on it."
    );

    let options = UninstallOptions {
        throw_on_conflicts: false,
        ..Default::default()
    };
    let ops = UninstallWalker::new(&local, options)
        .resolve_operations(&http)
        .unwrap();
    assert_eq!(summary(&ops), vec!["uninstall Http 1.0.0"]);
}

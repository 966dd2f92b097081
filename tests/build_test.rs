//! Integration tests for `podbuilder build`
//!
//! Only request validation and `--dry-run` are exercised here; compiling
//! needs CocoaPods and Xcode.

mod common;

use common::{stderr, stdout, write_record, TestProject, SAMPLE_SNAPSHOT};
use podbuilder::core::fingerprint::fingerprint_tree;
use podbuilder::infra::dirs::PodBuilderDirs;

#[test]
fn test_build_requires_init() {
    let project = TestProject::new();
    let output = project.run(&["build", "Alamofire"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("podbuilder init"));
}

#[test]
fn test_build_rejects_subspec_request() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["build", "Firebase/Core", "--dry-run"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Can't build subspec 'Firebase/Core'"));
    assert!(err.contains("podbuilder build Firebase"));
}

#[test]
fn test_build_rejects_subspec_before_resolving() {
    let project = TestProject::new();
    assert!(project.run(&["init"]).status.success());

    // No resolved graph: the name alone must be enough to refuse
    let output = project.run(&["build", "Firebase/Core", "--dry-run"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Can't build subspec 'Firebase/Core'"));
    assert!(!err.contains("resolved.json"));
}

#[test]
fn test_build_rejects_unknown_and_vendored_pods() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);

    let output = project.run(&["build", "Unknown", "--dry-run"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'Unknown' is not buildable"));

    let output = project.run(&["build", "Crashlytics", "--dry-run"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("'Crashlytics' is not buildable"));
}

#[test]
fn test_build_rejects_dependency_of_unrequested_pod() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["build", "GoogleUtilities", "--dry-run"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("dependency of 'Firebase/Core'"));
    assert!(err.contains("podbuilder build Firebase"));
}

#[test]
fn test_build_dry_run_reports_decisions() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    project.create_file("PodBuilder/checkouts/Alamofire/Source/Session.swift", "class Session {}");

    let output = project.run(&["build", "Alamofire", "--dry-run"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Alamofire: build (no record)"));
    assert!(out.contains("nothing was built"));
    assert!(!project.file_exists("PodBuilder/references.json"));
}

#[test]
fn test_build_dry_run_reuses_matching_record() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    project.create_file("PodBuilder/checkouts/Alamofire/Source/Session.swift", "class Session {}");
    project.create_file("PodBuilder/Prebuilt/Alamofire/Alamofire.framework/Alamofire", "binary");

    let dirs = PodBuilderDirs::new(&project.path());
    let hash = fingerprint_tree(&dirs.checkouts_dir().join("Alamofire"), &[]).unwrap();
    write_record(&project, "Alamofire", &hash, "5.8.1");

    let output = project.run(&["build", "Alamofire", "--dry-run"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Alamofire: reuse"));

    project.create_file("PodBuilder/checkouts/Alamofire/Source/Session.swift", "class Session { }");
    let output = project.run(&["build", "Alamofire", "--dry-run"]);
    assert!(stdout(&output).contains("Alamofire: build (hash mismatch)"));

    let output = project.run(&["build", "Alamofire", "--dry-run", "--force-rebuild"]);
    assert!(stdout(&output).contains("Alamofire: build (forced rebuild)"));
}

#[test]
fn test_build_dry_run_all_pods() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["build", "*", "--dry-run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Alamofire: build"));
    assert!(out.contains("Firebase: build"));
    assert!(out.contains("Kingfisher: build"));
    assert!(!out.contains("Crashlytics: build"));
}

#[test]
fn test_build_fails_on_missing_snapshot() {
    let project = TestProject::new();
    assert!(project.run(&["init"]).status.success());

    let output = project.run(&["build", "Alamofire", "--dry-run"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("resolved.json"));
}

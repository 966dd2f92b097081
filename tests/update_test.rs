//! Integration tests for `podbuilder update`

mod common;

use common::{stderr, stdout, write_record, TestProject, SAMPLE_SNAPSHOT};
use podbuilder::core::fingerprint::fingerprint_tree;
use podbuilder::infra::dirs::PodBuilderDirs;

#[test]
fn test_update_with_nothing_prebuilt() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["update", "--dry-run"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("up to date"));
}

#[test]
fn test_update_reports_stale_pods() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    project.create_file("PodBuilder/checkouts/Alamofire/Source/Session.swift", "class Session {}");
    project.create_file("PodBuilder/Prebuilt/Alamofire/Alamofire.framework/Alamofire", "binary");
    project.create_file("PodBuilder/checkouts/Kingfisher/Sources/Image.swift", "class Image {}");
    project.create_file("PodBuilder/Prebuilt/Kingfisher/Kingfisher.framework/Kingfisher", "binary");

    let dirs = PodBuilderDirs::new(&project.path());
    let alamofire = fingerprint_tree(&dirs.checkouts_dir().join("Alamofire"), &[]).unwrap();
    let kingfisher = fingerprint_tree(&dirs.checkouts_dir().join("Kingfisher"), &[]).unwrap();
    write_record(&project, "Alamofire", &alamofire, "5.8.1");
    write_record(&project, "Kingfisher", &kingfisher, "7.9.0");

    let output = project.run(&["update", "--dry-run"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("1 stale prebuilt pod(s)"));
    assert!(out.contains("Kingfisher: minor update 7.9.0 -> 7.10.0"), "{out}");
    assert!(!out.contains("Alamofire:"));
}

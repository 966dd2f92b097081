//! Integration tests for `podbuilder clean`

mod common;

use common::{stderr, stdout, write_record, TestProject, SAMPLE_SNAPSHOT};

#[test]
fn test_clean_nothing_to_do() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["clean"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Nothing to clean"));
}

#[test]
fn test_clean_removes_pods_no_longer_in_the_graph() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    project.create_file("PodBuilder/Prebuilt/Alamofire/Alamofire.framework/Alamofire", "binary");
    project.create_file("PodBuilder/Prebuilt/SnapKit/SnapKit.framework/SnapKit", "binary");
    project.create_file("PodBuilder/dSYM/release/SnapKit.framework.dSYM/Contents/Info.plist", "plist");
    project.create_file("PodBuilder/build/Podfile", "scratch");
    write_record(&project, "Alamofire", "abc", "5.8.1");
    write_record(&project, "SnapKit", "def", "5.6.0");

    let output = project.run(&["clean"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Removed prebuilt SnapKit"));

    assert!(!project.file_exists("PodBuilder/Prebuilt/SnapKit"));
    assert!(!project.file_exists("PodBuilder/dSYM/release/SnapKit.framework.dSYM"));
    assert!(!project.file_exists("PodBuilder/build"));
    assert!(project.file_exists("PodBuilder/Prebuilt/Alamofire/Alamofire.framework/Alamofire"));

    let records = project.read_file("PodBuilder/Prebuilt/.podbuilder-records.toml");
    assert!(records.contains("Alamofire"));
    assert!(!records.contains("SnapKit"));
}

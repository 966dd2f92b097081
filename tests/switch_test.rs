//! Integration tests for `podbuilder switch`

mod common;

use common::{stderr, write_record, TestProject, SAMPLE_SNAPSHOT};

fn references(project: &TestProject) -> serde_json::Value {
    serde_json::from_str(&project.read_file("PodBuilder/references.json")).unwrap()
}

#[test]
fn test_switch_requires_a_mode() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["switch", "Alamofire"]);
    assert!(!output.status.success());

    let output = project.run(&["switch", "Alamofire", "--prebuilt", "--default"]);
    assert!(!output.status.success());
}

#[test]
fn test_switch_default_writes_source_references() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["switch", "Firebase", "Kingfisher", "--default"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let refs = references(&project);
    assert_eq!(refs["Firebase/Core"]["kind"], "source");
    assert_eq!(refs["Firebase/Core"]["version"], "10.0.0");
    assert_eq!(refs["Firebase/Analytics"]["kind"], "source");
    assert_eq!(refs["Kingfisher"]["git"], "https://github.com/onevcat/Kingfisher.git");
    assert!(refs.get("Alamofire").is_none());
}

#[test]
fn test_switch_prebuilt_needs_a_record() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["switch", "Alamofire", "--prebuilt"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No prebuilt artifact found for 'Alamofire'"));
    assert!(!project.file_exists("PodBuilder/references.json"));

    write_record(&project, "Alamofire", "abc", "5.8.1");
    let output = project.run(&["switch", "Alamofire", "--prebuilt"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let refs = references(&project);
    assert_eq!(refs["Alamofire"]["kind"], "prebuilt");
    assert!(refs["Alamofire"]["path"]
        .as_str()
        .unwrap()
        .ends_with("Prebuilt/Alamofire"));
}

#[test]
fn test_switch_development_searches_configured_paths() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    project.create_file("LocalPods/Alamofire/Alamofire.podspec", "Pod::Spec.new");
    let config = project.read_file("PodBuilder/PodBuilder.toml").replace(
        "development_pods_paths = []",
        "development_pods_paths = [\"LocalPods\"]",
    );
    project.create_file("PodBuilder/PodBuilder.toml", &config);

    let output = project.run(&["switch", "Alamofire", "--development"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(references(&project)["Alamofire"]["kind"], "development");

    let output = project.run(&["switch", "Kingfisher", "--development"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Couldn't find development sources for 'Kingfisher'"));
}

#[test]
fn test_switch_rejects_subspec_names() {
    let project = TestProject::initialized(SAMPLE_SNAPSHOT);
    let output = project.run(&["switch", "Firebase/Core", "--default"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Can't build subspec"));
}

#[test]
fn test_switch_rejects_subspec_before_resolving() {
    let project = TestProject::new();
    assert!(project.run(&["init"]).status.success());

    let output = project.run(&["switch", "Firebase/Core", "--prebuilt"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Can't build subspec 'Firebase/Core'"));
    assert!(!err.contains("resolved.json"));
}

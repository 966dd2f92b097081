//! Integration tests for `podbuilder init` command

mod common;

use common::{stdout, TestProject};

#[test]
fn test_init_creates_layout() {
    let project = TestProject::new();
    let output = project.run(&["init"]);

    assert!(output.status.success());
    assert!(project.file_exists("PodBuilder/PodBuilder.toml"));
    assert!(project.file_exists("PodBuilder/Prebuilt"));
    assert!(project.file_exists("PodBuilder/dSYM"));

    let config = project.read_file("PodBuilder/PodBuilder.toml");
    assert!(toml::from_str::<toml::Value>(&config).is_ok());

    let gitignore = project.read_file(".gitignore");
    assert!(gitignore.contains("# podbuilder"));
    assert!(gitignore.contains("PodBuilder/build/"));
}

#[test]
fn test_init_keeps_existing_config_without_force() {
    let project = TestProject::new();
    assert!(project.run(&["init"]).status.success());
    project.create_file("PodBuilder/PodBuilder.toml", "debug = true\n");

    let output = project.run(&["init"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("--force"));
    assert_eq!(project.read_file("PodBuilder/PodBuilder.toml"), "debug = true\n");

    assert!(project.run(&["init", "--force"]).status.success());
    assert_ne!(project.read_file("PodBuilder/PodBuilder.toml"), "debug = true\n");
}

#[test]
fn test_init_appends_to_gitignore_once() {
    let project = TestProject::new();
    project.create_file(".gitignore", "DerivedData/\n");

    assert!(project.run(&["init"]).status.success());
    assert!(project.run(&["init"]).status.success());

    let gitignore = project.read_file(".gitignore");
    assert!(gitignore.starts_with("DerivedData/\n"));
    assert_eq!(gitignore.matches("# podbuilder").count(), 1);
}

#[test]
fn test_init_with_project_dir_option() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let project = assert_fs::TempDir::new().unwrap();
    let config_dir = assert_fs::TempDir::new().unwrap();
    project.child("Podfile").write_str("platform :ios, '13.0'\n").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_podbuilder"))
        .env("PODBUILDER_CONFIG_DIR", config_dir.path())
        .arg("--project-dir")
        .arg(project.path())
        .arg("init")
        .output()
        .unwrap();
    assert!(output.status.success());

    project
        .child("PodBuilder/PodBuilder.toml")
        .assert(predicate::str::contains("resolved_graph = \"PodBuilder/resolved.json\""));
    project
        .child(".gitignore")
        .assert(predicate::str::contains("PodBuilder/checkouts/"));
    project.child("PodBuilder/Prebuilt").assert(predicate::path::is_dir());
}

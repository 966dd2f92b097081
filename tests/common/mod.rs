//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary CocoaPods project with an isolated global
/// configuration directory.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Stand-in for the user's global configuration directory
    pub config_dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            config_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project that was already initialized, with `snapshot` as the
    /// resolved graph
    pub fn initialized(snapshot: &str) -> Self {
        let project = Self::new();
        let output = project.run(&["init"]);
        assert!(
            output.status.success(),
            "init failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        project.create_file("PodBuilder/resolved.json", snapshot);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Run podbuilder with `args` inside the project
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_podbuilder"))
            .current_dir(self.path())
            .env("PODBUILDER_CONFIG_DIR", self.config_dir.path())
            .env_remove("PODBUILDER_PROJECT_DIR")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute podbuilder")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a release reuse record for `root` into the project's record store
pub fn write_record(project: &TestProject, root: &str, content_hash: &str, version: &str) {
    let dirs = podbuilder::infra::dirs::PodBuilderDirs::new(&project.path());
    let path = dirs.records_path();
    let mut content = if path.exists() {
        std::fs::read_to_string(&path).expect("Failed to read records")
    } else {
        String::from("version = 1\n")
    };
    content.push_str(&format!(
        r#"
[records.{root}]
root_name = "{root}"
content_hash = "{content_hash}"
build_configuration = "release"
artifact_path = "{root}"
version = "{version}"
module_name = "{root}"
specs = ["{root}"]
"#
    ));
    std::fs::write(path, content).expect("Failed to write records");
}

/// Stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Resolved graph with a registry pod, a git pod, a subspec family and a
/// vendored binary pod
pub const SAMPLE_SNAPSHOT: &str = r#"{
    "specs": [
        {"name": "Alamofire", "version": "5.8.1"},
        {"name": "Firebase/Core", "version": "10.0.0", "dependencies": ["GoogleUtilities"]},
        {"name": "Firebase/Analytics", "version": "10.0.0", "dependencies": ["Firebase/Core"]},
        {"name": "GoogleUtilities", "version": "7.11.0", "static_framework": true},
        {"name": "Kingfisher", "version": "7.10.0"},
        {"name": "Crashlytics", "version": "3.14.0", "vendored_frameworks": ["Crashlytics.framework"]}
    ],
    "checkout_options": {
        "Kingfisher": {"git": "https://github.com/onevcat/Kingfisher.git", "tag": "7.10.0"}
    },
    "platforms": ["ios 13.0"],
    "targets": {"App": ["Alamofire", "Firebase/Analytics", "Kingfisher", "Crashlytics"]}
}"#;

//! Native compilation through xcodebuild
//!
//! The scratch project is produced by a [`PrepareHook`] (by default a
//! generated Podfile followed by `pod install`), then every target of the
//! generated Pods project is built with a single `xcodebuild` invocation.
//! Frameworks, static libraries and dSYMs are collected from the products
//! directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use walkdir::WalkDir;

use crate::core::assembler::{BuiltArtifact, CompileOutput, CompileRequest, Compiler, CompileUnit, UnitAction};
use crate::core::node::Provenance;
use crate::core::results::LicenseEntry;
use crate::error::BuildError;

/// Name of the aggregate target in the generated Podfile
pub const TARGET_NAME: &str = "PodBuilder";

/// Products directory inside the scratch directory
const PRODUCTS_DIR: &str = "products";

/// Bytes of compiler output kept in errors
const OUTPUT_TAIL: usize = 4000;

/// Populates the scratch directory before compiling
pub trait PrepareHook {
    fn prepare(&self, request: &CompileRequest) -> Result<(), BuildError>;
}

/// Writes a Podfile for the request and runs `pod install`
#[derive(Debug, Clone)]
pub struct PodInstallHook {
    project_root: PathBuf,
    /// `ios 13.0` style platform declaration
    platform: String,
}

impl PodInstallHook {
    pub fn new(project_root: &Path, platform: Option<&str>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            platform: platform.unwrap_or("ios 13.0").to_string(),
        }
    }

    /// Podfile for a compile request
    pub fn podfile(&self, request: &CompileRequest) -> String {
        let mut podfile = String::new();
        let (os, version) = self
            .platform
            .split_once(' ')
            .unwrap_or((self.platform.as_str(), ""));
        if version.is_empty() {
            let _ = writeln!(podfile, "platform :{os}");
        } else {
            let _ = writeln!(podfile, "platform :{os}, '{version}'");
        }
        podfile.push_str("install! 'cocoapods', :integrate_targets => false\n\n");

        let all_static = request.units.iter().all(|u| u.node.is_static);
        let _ = writeln!(podfile, "target '{TARGET_NAME}' do");
        if all_static {
            podfile.push_str("  use_frameworks! :linkage => :static\n");
        } else {
            podfile.push_str("  use_frameworks!\n");
        }
        for unit in &request.units {
            if let Some(line) = self.pod_line(unit) {
                let _ = writeln!(podfile, "  {line}");
            }
        }
        podfile.push_str("end\n");
        podfile
    }

    fn pod_line(&self, unit: &CompileUnit) -> Option<String> {
        if matches!(unit.action, UnitAction::Reuse(_)) {
            return None;
        }
        let node = &unit.node;
        let line = match &node.provenance {
            Provenance::Local { path } => format!(
                "pod '{}', :path => '{}'",
                node.name,
                self.project_root.join(path).display()
            ),
            Provenance::Git {
                repo_url,
                tag,
                commit,
                branch,
            } => {
                let mut line = format!("pod '{}', :git => '{repo_url}'", node.name);
                if let Some(tag) = tag {
                    let _ = write!(line, ", :tag => '{tag}'");
                } else if let Some(commit) = commit {
                    let _ = write!(line, ", :commit => '{commit}'");
                } else if let Some(branch) = branch {
                    let _ = write!(line, ", :branch => '{branch}'");
                }
                line
            }
            Provenance::Registry { version, .. } => format!("pod '{}', '= {version}'", node.name),
        };
        Some(line)
    }
}

impl PrepareHook for PodInstallHook {
    fn prepare(&self, request: &CompileRequest) -> Result<(), BuildError> {
        let podfile_path = request.scratch_dir.join("Podfile");
        std::fs::write(&podfile_path, self.podfile(request)).map_err(|e| BuildError::PrepareFailed {
            error: format!("failed to write {}: {e}", podfile_path.display()),
        })?;

        let pod = which::which("pod").map_err(|_| BuildError::ToolNotFound {
            tool: "pod".to_string(),
        })?;
        tracing::info!("Running pod install for {}", request.label);
        let output = Command::new(pod)
            .arg("install")
            .current_dir(&request.scratch_dir)
            .output()
            .map_err(|e| BuildError::PrepareFailed {
                error: format!("failed to run pod install: {e}"),
            })?;

        if !output.status.success() {
            return Err(BuildError::PrepareFailed {
                error: format!("pod install failed:\n{}", output_tail(&output)),
            });
        }
        Ok(())
    }
}

/// [`Compiler`] running xcodebuild on the prepared Pods project
pub struct XcodebuildCompiler {
    hook: Box<dyn PrepareHook>,
    sdk: String,
}

impl XcodebuildCompiler {
    pub fn new(hook: Box<dyn PrepareHook>) -> Self {
        Self {
            hook,
            sdk: "iphoneos".to_string(),
        }
    }

    /// Build for another SDK (e.g. `iphonesimulator`)
    #[must_use]
    pub fn with_sdk(mut self, sdk: &str) -> Self {
        self.sdk = sdk.to_string();
        self
    }

    /// Arguments of the xcodebuild invocation for `request`
    pub fn xcodebuild_args(&self, request: &CompileRequest) -> Vec<String> {
        let products = request.scratch_dir.join(PRODUCTS_DIR);
        let mut args = vec![
            "-project".to_string(),
            request.scratch_dir.join("Pods/Pods.xcodeproj").display().to_string(),
            "-alltargets".to_string(),
            "-configuration".to_string(),
            request.build_configuration.xcode_name().to_string(),
            "-sdk".to_string(),
            self.sdk.clone(),
            format!("CONFIGURATION_BUILD_DIR={}", products.display()),
            "DEBUG_INFORMATION_FORMAT=dwarf-with-dsym".to_string(),
            "ONLY_ACTIVE_ARCH=NO".to_string(),
        ];

        let reused: Vec<String> = request
            .units
            .iter()
            .filter_map(|u| match &u.action {
                UnitAction::Reuse(path) => Some(path.display().to_string()),
                _ => None,
            })
            .fold(Vec::new(), |mut acc, p| {
                if !acc.contains(&p) {
                    acc.push(p);
                }
                acc
            });
        if !reused.is_empty() {
            args.push(format!("FRAMEWORK_SEARCH_PATHS=$(inherited) {}", reused.join(" ")));
        }
        args.push("build".to_string());
        args
    }

    fn collect(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError> {
        let products = request.scratch_dir.join(PRODUCTS_DIR);
        let mut output = CompileOutput::default();
        let mut roots: Vec<&str> = Vec::new();

        for unit in request.units_to_build() {
            let node = &unit.node;
            if roots.contains(&node.root_name.as_str()) {
                continue;
            }
            roots.push(node.root_name.as_str());

            let candidates = [
                format!("{}.framework", node.module_name),
                format!("lib{}.a", node.module_name),
            ];
            let path = find_named(&products, &candidates).ok_or_else(|| BuildError::MissingArtifact {
                package: node.root_name.clone(),
            })?;
            let debug_symbols = find_named(&products, &[format!("{}.framework.dSYM", node.module_name)])
                .into_iter()
                .collect();

            output.artifacts.push(BuiltArtifact {
                root_name: node.root_name.clone(),
                path,
                debug_symbols,
            });

            if let Some(license) = read_license(&request.scratch_dir.join("Pods").join(&node.root_name)) {
                output.licenses.push(LicenseEntry {
                    title: node.root_name.clone(),
                    license_type: None,
                    text: license,
                });
            }
        }
        Ok(output)
    }
}

impl Compiler for XcodebuildCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError> {
        self.hook.prepare(request)?;

        let xcodebuild = which::which("xcodebuild").map_err(|_| BuildError::ToolNotFound {
            tool: "xcodebuild".to_string(),
        })?;
        let args = self.xcodebuild_args(request);
        tracing::debug!("xcodebuild {}", args.join(" "));

        let output = Command::new(xcodebuild)
            .args(&args)
            .current_dir(&request.scratch_dir)
            .output()
            .map_err(|e| BuildError::CompileFailed {
                group: request.label.clone(),
                error: e.to_string(),
                output: String::new(),
            })?;

        if !output.status.success() {
            return Err(BuildError::CompileFailed {
                group: request.label.clone(),
                error: format!("xcodebuild exited with {}", output.status),
                output: output_tail(&output),
            });
        }

        self.collect(request)
    }

    fn open_for_inspection(&self, scratch_dir: &Path) -> Result<(), BuildError> {
        let open = which::which("open").map_err(|_| BuildError::ToolNotFound {
            tool: "open".to_string(),
        })?;
        Command::new(open)
            .arg(scratch_dir.join("Pods/Pods.xcodeproj"))
            .status()
            .map_err(|e| BuildError::PrepareFailed { error: e.to_string() })?;
        Ok(())
    }
}

fn find_named(dir: &Path, names: &[String]) -> Option<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| names.iter().any(|n| n == name))
        })
        .map(|entry| entry.into_path())
}

fn read_license(pod_dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(pod_dir).ok()?;
    entries
        .filter_map(Result::ok)
        .find(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.to_uppercase().starts_with("LICEN"))
        })
        .and_then(|e| std::fs::read_to_string(e.path()).ok())
}

fn output_tail(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if text.len() <= OUTPUT_TAIL {
        return text;
    }
    let mut start = text.len() - OUTPUT_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

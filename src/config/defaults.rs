//! Default configuration values

/// Directory holding everything podbuilder writes inside a project
pub const PODBUILDER_DIR: &str = "PodBuilder";

/// Project configuration file, inside [`PODBUILDER_DIR`]
pub const CONFIG_FILE: &str = "PodBuilder.toml";

/// Default location of the resolved graph snapshot, relative to the project
pub const RESOLVED_GRAPH_PATH: &str = "PodBuilder/resolved.json";

/// Harvested frameworks, inside [`PODBUILDER_DIR`]
pub const PREBUILT_DIR: &str = "Prebuilt";

/// Harvested debug symbols, inside [`PODBUILDER_DIR`]
pub const DSYM_DIR: &str = "dSYM";

/// Scratch build project, inside [`PODBUILDER_DIR`]
pub const BUILD_DIR: &str = "build";

/// Downloaded working copies of registry/git pods, inside [`PODBUILDER_DIR`]
pub const CHECKOUTS_DIR: &str = "checkouts";

/// Reuse record store, inside the prebuilt directory
pub const RECORDS_FILE: &str = ".podbuilder-records.toml";

/// Persisted license list, inside the prebuilt directory
pub const LICENSES_FILE: &str = "Licenses.json";

/// Persisted artifact metadata, inside the prebuilt directory
pub const METADATA_FILE: &str = "PodBuilder.json";

/// Name -> reference descriptor map consumed by the Podfile writer
pub const REFERENCES_FILE: &str = "references.json";

/// Advisory lock held for the duration of a command
pub const LOCK_FILE: &str = ".podbuilder.lock";

/// Current record store format version
pub const RECORDS_VERSION: u32 = 1;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;

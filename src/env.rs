//! Environment constants and path utilities.
//!
//! Centralizes the file and directory names used by the store, the configuration
//! discovery and the command-line driver.

use std::path::{Path, PathBuf};

/// Default data directory name (hidden directory like .git)
pub const WBS_DIR_NAME: &str = ".wbs";

/// Configuration file name inside a data directory or the user's home
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "wbs.toml";

/// Store document file name
pub const STORE_FILE_NAME: &str = "store.json";

/// Scratch directory for atomic writes
pub const TEMP_DIR_NAME: &str = "tmp";

/// Default tracing filter when neither `RUST_LOG` nor config sets one
pub const DEFAULT_LOG_FILTER: &str = "wbs_engine=info";

/// Test-related constants
pub mod test {
    /// Project id used by fixtures
    pub const TEST_PROJECT_ID: &str = "5f0c4c52-8a4e-4a43-9c55-1f2a5c6e7d10";
}

/// Build the default data directory path from a workspace root
pub fn wbs_dir_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WBS_DIR_NAME)
}

/// Build the store document path inside a data directory
pub fn store_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

/// Build the scratch directory path inside a data directory
pub fn temp_dir_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TEMP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    home_dir.join(WBS_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(WBS_DIR_NAME).join(CONFIG_FILE_NAME)
}

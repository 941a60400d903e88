//! Report configuration.
//!
//! The project root name is fixed per deployment. Set
//! `COVERAGE_REPORT_PROJECT_ROOT` when building to override the default.

use std::path::PathBuf;

/// Report file read from the current working directory.
pub const DEFAULT_REPORT_PATH: &str = "lcov.info";

/// Directory name that source paths are made relative to.
pub const PROJECT_ROOT: &str = match option_env!("COVERAGE_REPORT_PROJECT_ROOT") {
    Some(root) => root,
    None => "rain-tracker-service",
};

/// Number of rows shown when no filter is given.
pub const DEFAULT_TABLE_LIMIT: usize = 20;

/// Minimum width of the path column.
pub const DEFAULT_PATH_WIDTH: usize = 60;

/// Where the report comes from and how its paths are shortened. Table layout
/// lives in [`crate::render::RenderOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub report_path: PathBuf,
    pub project_root: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            project_root: PROJECT_ROOT.to_string(),
        }
    }
}

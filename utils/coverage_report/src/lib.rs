//! # Coverage Report
//!
//! Summarizes an LCOV trace (`lcov.info`) per source file, lowest coverage
//! first.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Twenty least covered source files
//! coverage_report
//!
//! # Every file whose path contains "importers"
//! coverage_report --filter importers
//!
//! # Same, with uncovered line ranges under each file
//! coverage_report --filter importers --uncovered
//! ```
//!
//! Only files under a `src/` directory are reported, and anything under
//! `bin/` is skipped. Paths are shown relative to the project root named by
//! [`config::PROJECT_ROOT`].

pub mod app;
pub mod config;
pub mod error;
pub mod lcov;
pub mod ranges;
pub mod render;

pub use error::{ReportError, ReportResult};
pub use lcov::CoverageRecord;

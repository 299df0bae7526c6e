//! Centralized default values for perf-graphs configuration.
//!
//! These are the fallbacks used when neither a CLI option nor the
//! configuration file provide a value.

// ============================================================================
// Query Defaults
// ============================================================================

/// Statistic requested when none is given.
///
/// This is the statistic of the dashboard's landing page query, for which the
/// server keeps a precomputed response.
pub const DEFAULT_STAT: &str = "instructions:u";

// ============================================================================
// Site Defaults
// ============================================================================

/// Origin of a locally running performance site.
pub const DEFAULT_ORIGIN: &str = "http://localhost:2346";

// ============================================================================
// Reporting Defaults
// ============================================================================

/// Title of HTML reports when neither CLI nor configuration provide one.
pub const DEFAULT_REPORT_TITLE: &str = "Performance Graphs";

/// Number of characters to display from commit SHA in report metadata.
pub const DEFAULT_COMMIT_HASH_DISPLAY_LENGTH_METADATA: usize = 7;

/// Number of characters to display from commit SHA on the report x-axis.
pub const DEFAULT_COMMIT_HASH_DISPLAY_LENGTH_AXIS: usize = 6;

//! Default values for Docket configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Source Defaults
// ============================================================================

/// Default directory scanned for sources.
pub const DEFAULT_SOURCE_DIR: &str = ".";

/// Default build directory name, relative to the source directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// File extensions scanned for examples (without leading dot).
pub const DEFAULT_EXTENSIONS: &[&str] = &["cpp", "cxx", "cc", "c", "hpp", "hxx", "h"];

/// Regex patterns of paths that are never scanned.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[r"(^|[/\\])build[/\\]"];

// ============================================================================
// Run Defaults
// ============================================================================

/// Per-test timeout used by a session (10 s).
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Timeout of a test created outside a session (5 s).
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Coverage Defaults
// ============================================================================

/// Minimum percentage applied to every metric without an explicit threshold.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

// ============================================================================
// Backend Defaults
// ============================================================================

/// Compiler used by the command backend.
pub const DEFAULT_COMPILER: &str = "g++";

/// Flags always passed to the compiler.
pub const DEFAULT_COMPILER_FLAGS: &[&str] = &["-std=c++17"];

/// Project-local configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "docket.toml";

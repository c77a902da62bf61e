use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::FilterError;
use crate::project::ProjectError;
use crate::suite::{TestError, TreeError};

/// Errors raised while loading or running a session.
///
/// Per-test failures are not errors; they come back as results.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Source discovery failed: {0}")]
    Walk(#[from] ignore::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Test tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Test state error: {0}")]
    Test(#[from] TestError),
}

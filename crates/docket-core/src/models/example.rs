//! Executable examples extracted from comments.

use serde::{Deserialize, Serialize};

use super::SourceLocation;

/// An example block found in a comment.
///
/// `parent` is an index into the declaration list of the scan that produced
/// the example. It is a lookup relation: the example never owns the
/// declaration, and the index is only meaningful next to that list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Code lines joined with `\n`.
    pub code: String,
    /// Expected output lines joined with `\n`, if the block had any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// Location of the line holding the start marker.
    pub location: SourceLocation,
    /// Index of the nearest preceding declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl Example {
    /// Line the example starts on.
    pub fn line(&self) -> u32 {
        self.location.line
    }
}

//! Test selection.

use regex::Regex;
use thiserror::Error;

use crate::suite::{file_of_id, Test};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Which tests to run. Criteria combine with OR; an empty filter selects all.
#[derive(Debug, Clone, Default)]
pub struct TestFilter {
    /// Matched against name, id and description.
    pub pattern: Option<Regex>,
    /// Substrings of the file portion of the test id.
    pub files: Vec<String>,
    /// Substrings of the display name.
    pub functions: Vec<String>,
}

impl TestFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, FilterError> {
        let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.functions.push(function.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.files.is_empty() && self.functions.is_empty()
    }

    pub fn matches(&self, test: &Test) -> bool {
        if self.is_empty() {
            return true;
        }

        let by_pattern = self.pattern.as_ref().is_some_and(|re| {
            re.is_match(&test.name) || re.is_match(&test.id) || re.is_match(&test.description)
        });
        let file = file_of_id(&test.id);
        let by_file = self.files.iter().any(|f| file.contains(f.as_str()));
        let by_function = self
            .functions
            .iter()
            .any(|f| test.name.contains(f.as_str()));

        by_pattern || by_file || by_function
    }
}

//! Declaration scanning, example extraction and association.
//!
//! ## Components
//!
//! - `DeclarationProvider` trait - finds declarations in the lines of a source unit
//! - `HeuristicScanner` - the built-in, pattern-table provider
//! - `extract_examples` - finds `>>>` example blocks in comments
//! - `associate` - attaches examples to their nearest preceding declaration
//! - `ScanResult` - everything found in one source unit
//!
//! A stricter provider (for example one backed by a real C++ parser) can be
//! plugged in through `DeclarationProvider` without touching the rest of
//! the pipeline.

mod associate;
mod declarations;
mod examples;
mod patterns;

pub use associate::{associate, examples_for, nearest_preceding};
pub use declarations::HeuristicScanner;
pub use examples::extract_examples;
pub use patterns::{CONTINUATION_MARKER, DECLARATION_PATTERNS, EXAMPLE_MARKER};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Declaration, Example};

/// Source of structural declarations.
pub trait DeclarationProvider: Send + Sync {
    /// Declarations found in `lines`, in source order.
    ///
    /// `path` is only used to fill in locations.
    fn declarations(&self, path: &str, lines: &[&str]) -> Vec<Declaration>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Everything found in one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Path of the scanned unit.
    pub source_file: String,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Examples in source order, parents already resolved.
    #[serde(rename = "docTests")]
    pub examples: Vec<Example>,
}

/// Counts over a [`ScanResult`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total_declarations: usize,
    pub functions: usize,
    pub classes: usize,
    pub namespaces: usize,
    pub doc_tests: usize,
}

impl ScanResult {
    /// Callable declarations.
    pub fn functions(&self) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind.is_callable())
            .collect()
    }

    /// Class-like declarations.
    pub fn classes(&self) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind.is_class_like())
            .collect()
    }

    /// Namespace declarations.
    pub fn namespaces(&self) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.kind.is_namespace())
            .collect()
    }

    /// First declaration with the given name.
    pub fn find_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// The declaration an example is attached to.
    pub fn parent_of(&self, example: &Example) -> Option<&Declaration> {
        example.parent.and_then(|i| self.declarations.get(i))
    }

    /// Examples attached to a declaration with the same name and kind.
    pub fn examples_for(&self, declaration: &Declaration) -> Vec<&Example> {
        examples_for(declaration, &self.examples, &self.declarations)
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            total_declarations: self.declarations.len(),
            functions: self.functions().len(),
            classes: self.classes().len(),
            namespaces: self.namespaces().len(),
            doc_tests: self.examples.len(),
        }
    }

    /// JSON dump with the scan statistics included.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "stats".to_string(),
                serde_json::to_value(self.stats()).unwrap_or_default(),
            );
        }
        value
    }
}

/// Scan one source unit: declarations, examples, association.
pub fn scan_source(path: &str, content: &str, provider: &dyn DeclarationProvider) -> ScanResult {
    let lines: Vec<&str> = content.lines().collect();

    let declarations = provider.declarations(path, &lines);
    let mut examples = extract_examples(path, &lines);
    associate(&mut examples, &declarations);

    tracing::debug!(
        file = path,
        provider = provider.name(),
        declarations = declarations.len(),
        examples = examples.len(),
        "scanned source unit"
    );

    ScanResult {
        source_file: path.to_string(),
        declarations,
        examples,
    }
}

/// Scan several source units, keyed by path.
pub fn scan_sources(
    files: &BTreeMap<String, String>,
    provider: &dyn DeclarationProvider,
) -> BTreeMap<String, ScanResult> {
    files
        .iter()
        .map(|(path, content)| (path.clone(), scan_source(path, content, provider)))
        .collect()
}

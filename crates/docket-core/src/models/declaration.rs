//! Structural declarations detected in a source unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of something inside a source unit.
///
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the source unit, as it was handed to the scanner.
    pub file: String,
    /// Line number.
    pub line: u32,
    /// Column number.
    pub column: u32,
}

impl SourceLocation {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Kind of a detected declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Struct,
    Union,
    Class,
    ClassTemplate,
    Namespace,
    Function,
    FunctionTemplate,
    /// Only produced by providers that understand class bodies.
    Method,
    Constructor,
    Destructor,
}

impl DeclarationKind {
    /// Functions, methods and function templates.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::FunctionTemplate
                | Self::Method
                | Self::Constructor
                | Self::Destructor
        )
    }

    /// Classes, structs and class templates.
    ///
    /// Unions are containers too but are reported separately, the same
    /// way a class listing usually leaves them out.
    pub fn is_class_like(self) -> bool {
        matches!(self, Self::Class | Self::Struct | Self::ClassTemplate)
    }

    pub fn is_namespace(self) -> bool {
        self == Self::Namespace
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Class => "class",
            Self::ClassTemplate => "class template",
            Self::Namespace => "namespace",
            Self::Function => "function",
            Self::FunctionTemplate => "function template",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Destructor => "destructor",
        };
        write!(f, "{}", name)
    }
}

/// A declaration found by a [`DeclarationProvider`](crate::scan::DeclarationProvider).
///
/// Declarations are created during a single scan of one source unit and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared identifier.
    pub name: String,
    /// What was declared.
    pub kind: DeclarationKind,
    /// Where the declaration starts.
    pub location: SourceLocation,
    /// Documentation attached to the declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Nested declarations. The heuristic scanner reports a flat list, so
    /// this stays empty unless a structural provider fills it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Declaration>,
}

impl Declaration {
    /// Create a declaration without comment or children.
    pub fn new(name: impl Into<String>, kind: DeclarationKind, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            comment: None,
            children: Vec::new(),
        }
    }

    /// Attach a documentation comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Line the declaration starts on.
    pub fn line(&self) -> u32 {
        self.location.line
    }

    /// Whether `other` names the same declaration (same name and kind).
    pub fn same_as(&self, other: &Declaration) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups() {
        assert!(DeclarationKind::Function.is_callable());
        assert!(DeclarationKind::FunctionTemplate.is_callable());
        assert!(!DeclarationKind::Class.is_callable());
        assert!(DeclarationKind::ClassTemplate.is_class_like());
        assert!(!DeclarationKind::Union.is_class_like());
        assert!(DeclarationKind::Namespace.is_namespace());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DeclarationKind::FunctionTemplate).unwrap();
        assert_eq!(json, "\"function_template\"");
    }
}

//! Data models shared by the scanner, the associator and the test tree.

mod declaration;
mod example;

pub use declaration::{Declaration, DeclarationKind, SourceLocation};
pub use example::Example;

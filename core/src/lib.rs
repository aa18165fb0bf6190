//! # schemadiag core
//!
//! Core types for turning coarse XML schema-validation failures into located,
//! explained diagnostics.
//!
//! This crate holds the value types shared by the diagnostics engine: source
//! positions, the ordered tree both the document and the schema grammar are
//! stored in, element values for each tree, typed validation errors, handled
//! results with their message catalog, and configuration.
//!
//! ## Design Principles
//!
//! - **Read-only trees**: built once by a walker, then only queried
//! - **Misses are values**: a lookup that finds nothing returns an empty result
//! - **Explicit variants**: the tree root is a variant, not a missing value

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)] // Documentation is covered by module-level docs

/// Core error types
pub mod error;

/// Source text positions
pub mod position;

/// Generic ordered tree with path search and fold
pub mod tree;

/// Document and schema element values
pub mod element;

/// Typed validation failures
pub mod validation;

/// Message keys and catalog
pub mod messages;

/// Handled diagnostic results
pub mod result;

/// Configuration types
pub mod config;

// Re-export commonly used types
pub use config::DiagnosticsConfig;
pub use element::{DocElement, QName, SchemaElement};
pub use error::{DiagnosticsError, Result};
pub use messages::{MessageCatalog, MessageKey};
pub use position::Position;
pub use result::{HandledResult, Message};
pub use tree::{Node, Tree};
pub use validation::{ErrorType, ValidationError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::element::*;
    pub use crate::error::{DiagnosticsError, Result};
    pub use crate::messages::*;
    pub use crate::position::Position;
    pub use crate::result::*;
    pub use crate::tree::{Node, Tree};
    pub use crate::validation::*;
}

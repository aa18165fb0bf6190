//! # schemadiag
//!
//! Turns coarse XML schema-validation failures into located, explained
//! diagnostics.
//!
//! A validator reports something like "element `queu` not allowed" with a
//! line and column that may point anywhere near the offending markup. This
//! crate loads the document and its schemas into a [`ValidationContext`],
//! builds a tree of the document and a grammar tree of the schemas, and hands
//! each [`ValidationError`] to a per-type handler that finds the exact
//! position, explains the failure, and suggests schema-aware fixes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use schemadiag_service::source::{path_to_url, schema_urls_in};
//! use schemadiag_service::{
//!     DiagnosticsConfig, ErrorType, Position, Reporter, ValidationContext, ValidationError,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DiagnosticsConfig::from_yaml_file("diagnostics.yaml")?;
//!     let document = path_to_url("server.xml")?;
//!     let schemas = schema_urls_in("schemas", &config.schema)?;
//!     let ctx = ValidationContext::builder(document, schemas)
//!         .config(config)
//!         .build()?;
//!
//!     let error = ValidationError::new(
//!         ErrorType::UnexpectedElement,
//!         "element 'queu' not allowed",
//!         Position::new(12, 5),
//!     );
//!     let result = ctx.handle(&error);
//!     Reporter::default().print(&ctx, &result, &mut std::io::stdout());
//!     Ok(())
//! }
//! ```
//!
//! ## Pieces
//!
//! - **Encoding detection**: BOM, then the XML declaration, then a fallback
//! - **Document walker**: element tree with spans, plus a well-formedness check
//! - **Schema walker**: XSD content models flattened into a grammar tree
//! - **Policies**: which grammar paths count, and how paths are anchored
//! - **Handlers**: one per [`ErrorType`], replaceable through the builder
//!
//! Everything is synchronous and single-threaded; a context is built per
//! document and queried in place.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)] // query methods on read-only trees
#![allow(clippy::return_self_not_must_use)] // builder patterns
#![allow(clippy::missing_errors_doc)] // errors self-explanatory from return type
#![allow(clippy::format_push_string)] // format! is more readable than write! on a String
#![allow(missing_docs)] // Documentation is covered by module-level docs

/// Loading documents and schemas by URL
pub mod source;

/// Character encoding detection and decoding
pub mod encoding;

/// Lightweight namespace scans over raw text
pub mod namespace;

/// Document and schema tree builders
pub mod walker;

/// Pluggable path gates and prefix providers
pub mod policy;

/// Edit-distance suggestions
pub mod suggest;

/// Per-error-type handlers
pub mod handler;

/// The validation context
pub mod context;

/// Plain-text rendering of results
pub mod report;

pub use context::{ValidationContext, ValidationContextBuilder};
pub use handler::{
    DuplicateAttributeHandler, DuplicateElementHandler, ErrorHandler, HandlerRegistry,
    InvalidAttributeValueHandler, RequiredAttributeMissingHandler, RequiredElementMissingHandler,
    UnexpectedAttributeHandler, UnexpectedElementHandler, UnknownErrorHandler,
};
pub use policy::{
    AllowAll, DocumentPrefixProvider, PathGate, PrefixProvider, RootWrapperPrefixProvider,
};
pub use report::Reporter;
pub use walker::{DocWalker, ParseFailure, SchemaWalker};

// Re-export the core value types
pub use schemadiag_core::{
    DiagnosticsConfig, DiagnosticsError, DocElement, ErrorType, HandledResult, Message,
    MessageCatalog, MessageKey, Node, Position, QName, Result, SchemaElement, Tree,
    ValidationError,
};

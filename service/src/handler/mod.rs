//! Per-error-type handlers
//!
//! A handler turns one [`ValidationError`] into a [`HandledResult`]: a
//! precise position, a primary message, and whatever suggestions the context
//! can back up. The registry maps each [`ErrorType`] to its handler and ships
//! a built-in handler for every type.

mod attribute;
mod element;
mod generic;

pub use attribute::{
    DuplicateAttributeHandler, InvalidAttributeValueHandler, RequiredAttributeMissingHandler,
    UnexpectedAttributeHandler,
};
pub use element::{
    DuplicateElementHandler, RequiredElementMissingHandler, UnexpectedElementHandler,
};
pub use generic::UnknownErrorHandler;

use crate::context::ValidationContext;
use regex::Regex;
use schemadiag_core::{
    DocElement, ErrorType, HandledResult, MessageKey, Position, SchemaElement, ValidationError,
};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Explains one kind of validation error
pub trait ErrorHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult;
}

impl<F> ErrorHandler for F
where
    F: Fn(&ValidationContext, &ValidationError) -> HandledResult,
{
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        self(ctx, error)
    }
}

/// Handlers keyed by error type
pub struct HandlerRegistry {
    handlers: HashMap<ErrorType, Box<dyn ErrorHandler>>,
}

impl HandlerRegistry {
    /// An empty registry; every error falls through to [`UnknownErrorHandler`]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The built-in handler for every error type
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ErrorType::UnexpectedElement, UnexpectedElementHandler);
        registry.register(ErrorType::UnexpectedAttribute, UnexpectedAttributeHandler);
        registry.register(ErrorType::DuplicateElement, DuplicateElementHandler);
        registry.register(ErrorType::DuplicateAttribute, DuplicateAttributeHandler);
        registry.register(
            ErrorType::RequiredAttributeMissing,
            RequiredAttributeMissingHandler,
        );
        registry.register(ErrorType::RequiredElementMissing, RequiredElementMissingHandler);
        registry.register(ErrorType::InvalidAttributeValue, InvalidAttributeValueHandler);
        registry.register(ErrorType::UnknownError, UnknownErrorHandler);
        registry
    }

    /// Set the handler for an error type, replacing any previous one
    pub fn register(&mut self, error_type: ErrorType, handler: impl ErrorHandler + 'static) {
        self.handlers.insert(error_type, Box::new(handler));
    }

    pub fn get(&self, error_type: ErrorType) -> Option<&dyn ErrorHandler> {
        self.handlers.get(&error_type).map(Box::as_ref)
    }

    /// Run the handler registered for the error's type
    pub fn dispatch(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        match self.get(error.error_type) {
            Some(handler) => handler.handle(ctx, error),
            None => {
                trace!(error_type = %error.error_type, "no handler registered, passing through");
                UnknownErrorHandler.handle(ctx, error)
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&ErrorType> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("HandlerRegistry")
            .field("types", &types)
            .finish()
    }
}

/// Result for an error that lacks the names its handler needs
fn original_error(error: &ValidationError) -> HandledResult {
    HandledResult::new(error.position)
        .with_primary_message(MessageKey::OriginalError, [error.display_message()])
}

/// Where an element starts in the document, or the reported position
fn element_start(path: &[&DocElement], fallback: Position) -> Position {
    path.last().map_or(fallback, |element| element.start())
}

/// Pattern for `name=` as written in a start tag
///
/// The name must follow whitespace, so `size` does not match the tail of
/// `max-size` or `xml:size`. The name itself is capture group 1.
fn attribute_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?:^|\s)({})\s*=", regex::escape(name))).ok()
}

/// Find `pattern` in the source at or after a 1-indexed position
fn search_from(ctx: &ValidationContext, from: Position, pattern: &Regex) -> Option<Position> {
    let (line, column) = zero_indexed(from)?;
    ctx.search_forward(line, column, pattern)
}

/// Find `pattern` in the source at or before a 1-indexed position
fn search_back_from(ctx: &ValidationContext, from: Position, pattern: &Regex) -> Option<Position> {
    let (line, column) = zero_indexed(from)?;
    ctx.search_backward(line, column, pattern)
}

fn zero_indexed(position: Position) -> Option<(usize, usize)> {
    if !position.is_known() {
        return None;
    }
    let line = usize::try_from(position.line() - 1).ok()?;
    let column = usize::try_from(position.column() - 1).ok()?;
    Some((line, column))
}

/// Comma-separated list, capped at the configured number of alternatives
fn format_list<I, S>(ctx: &ValidationContext, items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = ctx.config().suggestions.max_alternatives;
    let mut items = items.into_iter();
    let mut listed: Vec<String> = items
        .by_ref()
        .take(max)
        .map(|item| item.as_ref().to_string())
        .collect();
    if items.next().is_some() {
        listed.push("...".to_string());
    }
    listed.join(", ")
}

/// A grammar path as `a > b > c`
fn format_path(path: &[SchemaElement]) -> String {
    path.iter()
        .map(SchemaElement::name)
        .collect::<Vec<_>>()
        .join(" > ")
}

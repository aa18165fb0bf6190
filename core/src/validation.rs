//! Typed validation failures fed into the diagnostics engine
//!
//! A [`ValidationError`] is what a schema validator integration hands over:
//! a coarse location, the validator's own message, and whatever names it
//! could extract. The engine turns it into a located, explained result.

use crate::element::QName;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorType {
    /// An element the grammar does not allow at this position
    UnexpectedElement,
    /// An attribute the enclosing element does not accept
    UnexpectedAttribute,
    /// An element that may only appear once among its siblings
    DuplicateElement,
    /// The same attribute given twice on one element
    DuplicateAttribute,
    /// A required attribute is absent
    RequiredAttributeMissing,
    /// A required child element is absent
    RequiredElementMissing,
    /// An attribute value outside the allowed set
    InvalidAttributeValue,
    /// Anything the integration could not classify
    UnknownError,
}

impl ErrorType {
    /// Every error type, in declaration order
    pub const ALL: [Self; 8] = [
        Self::UnexpectedElement,
        Self::UnexpectedAttribute,
        Self::DuplicateElement,
        Self::DuplicateAttribute,
        Self::RequiredAttributeMissing,
        Self::RequiredElementMissing,
        Self::InvalidAttributeValue,
        Self::UnknownError,
    ];
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnexpectedElement => "UNEXPECTED_ELEMENT",
            Self::UnexpectedAttribute => "UNEXPECTED_ATTRIBUTE",
            Self::DuplicateElement => "DUPLICATE_ELEMENT",
            Self::DuplicateAttribute => "DUPLICATE_ATTRIBUTE",
            Self::RequiredAttributeMissing => "REQUIRED_ATTRIBUTE_MISSING",
            Self::RequiredElementMissing => "REQUIRED_ELEMENT_MISSING",
            Self::InvalidAttributeValue => "INVALID_ATTRIBUTE_VALUE",
            Self::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(name)
    }
}

/// A single typed validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Kind of failure, selects the handler
    pub error_type: ErrorType,
    /// Validator message, verbatim
    pub message: String,
    /// Location reported by the validator
    pub position: Position,
    /// Element involved, if known
    pub element: Option<QName>,
    /// Attribute involved, if known
    pub attribute: Option<QName>,
    /// Offending attribute value, if any
    pub attribute_value: Option<String>,
    /// Names the validator listed as acceptable
    pub alternatives: BTreeSet<String>,
    /// Cleaned-up message to show when nothing better is available
    pub fallback_message: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(error_type: ErrorType, message: impl Into<String>, position: Position) -> Self {
        Self {
            error_type,
            message: message.into(),
            position,
            element: None,
            attribute: None,
            attribute_value: None,
            alternatives: BTreeSet::new(),
            fallback_message: None,
        }
    }

    /// Set the element involved
    #[must_use]
    pub fn with_element(mut self, element: QName) -> Self {
        self.element = Some(element);
        self
    }

    /// Set the attribute involved
    #[must_use]
    pub fn with_attribute(mut self, attribute: QName) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Set the offending attribute value
    #[must_use]
    pub fn with_attribute_value(mut self, value: impl Into<String>) -> Self {
        self.attribute_value = Some(value.into());
        self
    }

    /// Set the acceptable alternatives
    #[must_use]
    pub fn with_alternatives<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives = alternatives.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fallback message
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = Some(message.into());
        self
    }

    /// The fallback message if one was set, otherwise the raw message
    #[must_use]
    pub fn display_message(&self) -> &str {
        self.fallback_message.as_deref().unwrap_or(&self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.error_type, self.message, self.position)
    }
}

//! Message keys and the positional-template catalog
//!
//! Results carry a [`MessageKey`] plus arguments; turning them into text is
//! left to the catalog so a host can substitute its own (translated)
//! templates. Placeholders are positional: `{0}`, `{1}`, ...

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies one kind of human-readable message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    AttributeDuplicated,
    AttributeIsAllowedOn,
    AttributeNotAllowed,
    AttributesAllowedHere,
    AttributeInvalidValue,
    AttributeRequiredMissing,
    AttributeRequiredMissingList,
    DidYouMean,
    ElementDuplicated,
    ElementDuplicatedFirstOccurrence,
    ElementHasNoAttributes,
    ElementWithAttributeDuplicated,
    ElementWithAttributeDuplicatedFirstOccurrence,
    ElementIsAllowedOn,
    ElementNotAllowed,
    ElementRequiredMissing,
    ElementsAllowedHere,
    MalformedXml,
    OriginalError,
    Passthru,
    PrintFailure,
    ValidationErrorIn,
}

impl MessageKey {
    /// The built-in English template
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            Self::AttributeDuplicated => "'{0}' is defined more than once on this element",
            Self::AttributeIsAllowedOn => "'{0}' is allowed on elements: {1}",
            Self::AttributeNotAllowed => "'{0}' isn't an allowed attribute for the '{1}' element",
            Self::AttributesAllowedHere => "attributes allowed here are: {0}",
            Self::AttributeInvalidValue => {
                "'{0}' isn't an allowed value for the '{1}' attribute"
            }
            Self::AttributeRequiredMissing => "'{0}' is missing the required attribute '{1}'",
            Self::AttributeRequiredMissingList => {
                "'{0}' is missing one or more required attributes: {1}"
            }
            Self::DidYouMean => "did you mean '{0}'?",
            Self::ElementDuplicated => "'{0}' can't appear more than once within the '{1}' element",
            Self::ElementDuplicatedFirstOccurrence => "first occurrence of '{0}' is here",
            Self::ElementHasNoAttributes => "'{0}' has no attributes",
            Self::ElementWithAttributeDuplicated => {
                "there is already a '{0}' with '{1}' set to '{2}'"
            }
            Self::ElementWithAttributeDuplicatedFirstOccurrence => {
                "'{0}' with '{1}' set to '{2}' first occurs here"
            }
            Self::ElementIsAllowedOn => "'{0}' is allowed on: {1}",
            Self::ElementNotAllowed => "'{0}' isn't an allowed element here",
            Self::ElementRequiredMissing => "'{0}' is missing one of the required child elements: {1}",
            Self::ElementsAllowedHere => "elements allowed here are: {0}",
            Self::MalformedXml => "'{0}' may be malformed; the XML parser reports:",
            Self::OriginalError => "original error: {0}",
            Self::Passthru => "{0}",
            Self::PrintFailure => "failed to print a diagnostic: {0}",
            Self::ValidationErrorIn => "validation error in {0}",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Keyed template lookup with positional formatting
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: HashMap<MessageKey, String>,
}

impl MessageCatalog {
    /// The built-in English catalog
    #[must_use]
    pub fn english() -> Self {
        Self::default()
    }

    /// Replace the template for one key
    #[must_use]
    pub fn with_template(mut self, key: MessageKey, template: impl Into<String>) -> Self {
        self.overrides.insert(key, template.into());
        self
    }

    #[must_use]
    pub fn lookup(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map_or_else(|| key.default_template(), String::as_str)
    }

    /// Fill `{n}` placeholders with `args[n]`; unmatched placeholders stay as-is
    #[must_use]
    pub fn format<S: AsRef<str>>(&self, key: MessageKey, args: &[S]) -> String {
        args.iter()
            .enumerate()
            .fold(self.lookup(key).to_string(), |text, (idx, arg)| {
                text.replace(&format!("{{{idx}}}"), arg.as_ref())
            })
    }
}

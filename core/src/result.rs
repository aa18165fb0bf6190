//! Structured diagnostic results

use crate::messages::{MessageCatalog, MessageKey};
use crate::position::Position;
use serde::{Deserialize, Serialize};

/// A catalog key plus its positional arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub key: MessageKey,
    pub args: Vec<String>,
}

impl Message {
    pub fn new<I, S>(key: MessageKey, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn render(&self, catalog: &MessageCatalog) -> String {
        catalog.format(self.key, &self.args)
    }
}

/// What a handler produced for one validation error
///
/// The primary position and message say where and what; secondary messages
/// add explanation and suggestions, and secondary results point at other
/// locations (a first occurrence, a nearby well-formedness failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandledResult {
    pub position: Position,
    pub primary_message: Option<Message>,
    pub secondary_messages: Vec<Message>,
    pub secondary_results: Vec<HandledResult>,
    /// The error may be a symptom of the document not being well-formed
    pub possibly_malformed: bool,
}

impl HandledResult {
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self {
            position,
            primary_message: None,
            secondary_messages: Vec::new(),
            secondary_results: Vec::new(),
            possibly_malformed: false,
        }
    }

    #[must_use]
    pub fn at(line: i32, column: i32) -> Self {
        Self::new(Position::new(line, column))
    }

    #[must_use]
    pub fn with_primary_message<I, S>(mut self, key: MessageKey, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_message = Some(Message::new(key, args));
        self
    }

    #[must_use]
    pub fn possibly_malformed(mut self, flag: bool) -> Self {
        self.possibly_malformed = flag;
        self
    }

    pub fn add_secondary_message<I, S>(&mut self, key: MessageKey, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_messages.push(Message::new(key, args));
        self
    }

    pub fn add_secondary_result(&mut self, result: HandledResult) -> &mut Self {
        self.secondary_results.push(result);
        self
    }

    /// Render the primary and secondary messages (not nested results)
    #[must_use]
    pub fn render(&self, catalog: &MessageCatalog) -> Vec<String> {
        self.primary_message
            .iter()
            .chain(&self.secondary_messages)
            .map(|message| message.render(catalog))
            .collect()
    }
}

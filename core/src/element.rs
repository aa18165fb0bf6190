//! Document-instance and schema-grammar element values

use crate::position::Position;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A namespace-qualified XML name
///
/// An empty namespace means "no namespace".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    namespace: String,
    local: String,
}

impl QName {
    /// Create a qualified name
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Create a name in no namespace
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// Parse Clark notation (`{namespace}local`) or a bare local name
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix('{')
            && let Some((namespace, local)) = rest.split_once('}')
        {
            return Self::new(namespace, local);
        }
        Self::local(text)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// The same local name in another namespace
    #[must_use]
    pub fn in_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(namespace, self.local.clone())
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// One element of the instance document, with its source span
///
/// Built by the document walker and read-only once placed in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocElement {
    name: QName,
    attributes: IndexMap<String, String>,
    start: Position,
    end: Position,
}

impl DocElement {
    /// Create an element with unknown span
    #[must_use]
    pub fn new(name: QName, attributes: IndexMap<String, String>) -> Self {
        Self {
            name,
            attributes,
            start: Position::UNKNOWN,
            end: Position::UNKNOWN,
        }
    }

    /// Set the start position
    #[must_use]
    pub fn with_start(mut self, start: Position) -> Self {
        self.start = start;
        self
    }

    /// Set the end position
    #[must_use]
    pub fn with_end(mut self, end: Position) -> Self {
        self.end = end;
        self
    }

    pub fn set_start(&mut self, start: Position) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: Position) {
        self.end = end;
    }

    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.name
    }

    /// The local part of the element name
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.local_name()
    }

    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn start(&self) -> Position {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Position {
        self.end
    }

    /// Whether `position` lies within `[start, end]`
    #[must_use]
    pub fn encloses(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

impl fmt::Display for DocElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} @ {}..{}>", self.name, self.start, self.end)
    }
}

/// One node of the schema grammar
///
/// Identity is the qualified name alone; the accepted attribute names are
/// informational and take no part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaElement {
    name: QName,
    attributes: BTreeSet<String>,
}

impl SchemaElement {
    #[must_use]
    pub fn new<I, S>(name: QName, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name,
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.name
    }

    /// The local part of the element name
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.local_name()
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeSet<String> {
        &self.attributes
    }

    #[must_use]
    pub fn accepts_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }
}

impl From<QName> for SchemaElement {
    fn from(name: QName) -> Self {
        Self {
            name,
            attributes: BTreeSet::new(),
        }
    }
}

impl PartialEq for SchemaElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SchemaElement {}

impl Hash for SchemaElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for SchemaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(start: (i32, i32), end: (i32, i32)) -> DocElement {
        DocElement::new(QName::local("queue"), IndexMap::new())
            .with_start(start.into())
            .with_end(end.into())
    }

    #[test]
    fn test_qname_parse_and_display() {
        let name = QName::parse("{urn:jboss:domain:1.0}server");
        assert_eq!(name.namespace(), "urn:jboss:domain:1.0");
        assert_eq!(name.local_name(), "server");
        assert_eq!(name.to_string(), "{urn:jboss:domain:1.0}server");

        let bare = QName::parse("profile");
        assert_eq!(bare, QName::local("profile"));
        assert_eq!(bare.to_string(), "profile");
        assert_eq!(bare.in_namespace("urn:x").namespace(), "urn:x");
    }

    #[test]
    fn test_encloses_is_inclusive() {
        let el = element((2, 5), (4, 10));
        assert!(el.encloses(Position::new(2, 5)));
        assert!(el.encloses(Position::new(3, 1)));
        assert!(el.encloses(Position::new(4, 10)));
        assert!(!el.encloses(Position::new(2, 4)));
        assert!(!el.encloses(Position::new(4, 11)));
        assert!(!el.encloses(Position::new(5, 1)));
    }

    #[test]
    fn test_span_setters_move_both_ends() {
        let mut el = element((2, 5), (2, 30));
        el.set_start(Position::new(3, 1));
        el.set_end(Position::new(6, 8));
        assert_eq!(el.start(), Position::new(3, 1));
        assert_eq!(el.end(), Position::new(6, 8));
        assert!(!el.encloses(Position::new(2, 5)));
        assert!(el.encloses(Position::new(5, 40)));
    }

    #[test]
    fn test_unset_span_encloses_nothing_known() {
        let el = DocElement::new(QName::local("a"), IndexMap::new());
        assert!(!el.encloses(Position::new(1, 1)));
    }

    #[test]
    fn test_schema_element_identity_is_name_only() {
        let a = SchemaElement::new(QName::local("queue"), ["name", "max-size"]);
        let b = SchemaElement::from(QName::local("queue"));
        assert_eq!(a, b);
        assert!(a.accepts_attribute("max-size"));
        assert!(!b.accepts_attribute("max-size"));

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }
}

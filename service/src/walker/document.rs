//! Document-instance tree and well-formedness check
//!
//! One pass of `quick-xml` over the decoded document yields both the element
//! tree, with namespaces resolved and source spans attached, and the first
//! well-formedness failure if there is one. The pass runs on first use and is
//! cached.

use super::LineIndex;
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use schemadiag_core::{DocElement, Position, QName, Tree};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Where and why the document is not well-formed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.position)
    }
}

#[derive(Debug)]
struct DocumentScan {
    tree: Tree<DocElement>,
    failure: Option<ParseFailure>,
}

/// Builds the document tree and answers well-formedness queries
#[derive(Debug)]
pub struct DocWalker {
    text: String,
    scan: OnceCell<DocumentScan>,
}

impl DocWalker {
    /// Create a walker over decoded document text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scan: OnceCell::new(),
        }
    }

    /// The document tree; partial when the document is malformed
    pub fn walk(&self) -> &Tree<DocElement> {
        &self.scan().tree
    }

    /// Whether the document is well-formed
    pub fn valid(&self) -> bool {
        self.scan().failure.is_none()
    }

    /// The first well-formedness failure
    pub fn validation_failure(&self) -> Option<&ParseFailure> {
        self.scan().failure.as_ref()
    }

    fn scan(&self) -> &DocumentScan {
        self.scan.get_or_init(|| {
            let scan = Scanner::new(&self.text).run();
            match &scan.failure {
                Some(failure) => debug!(%failure, "document is not well-formed"),
                None => debug!(elements = scan.tree.len(), "document tree built"),
            }
            scan
        })
    }
}

struct Frame {
    element: DocElement,
    children: Vec<Tree<DocElement>>,
}

struct Scanner<'t> {
    text: &'t str,
    index: LineIndex<'t>,
    scopes: Vec<HashMap<String, String>>,
    stack: Vec<Frame>,
    root: Tree<DocElement>,
    seen_root: bool,
    failure: Option<ParseFailure>,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            index: LineIndex::new(text),
            scopes: Vec::new(),
            stack: Vec::new(),
            root: Tree::root(),
            seen_root: false,
            failure: None,
        }
    }

    fn run(mut self) -> DocumentScan {
        let mut reader = Reader::from_str(self.text);

        while self.failure.is_none() {
            let before = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    self.open(&start, before);
                }
                Ok(Event::Empty(start)) => {
                    if self.open(&start, before) {
                        self.close(reader.buffer_position());
                    }
                }
                Ok(Event::End(_)) => self.close(reader.buffer_position()),
                Ok(Event::Text(text)) => {
                    if self.stack.is_empty() && !text.iter().all(u8::is_ascii_whitespace) {
                        let message = if self.seen_root {
                            "Content is not allowed in trailing section"
                        } else {
                            "Content is not allowed in prolog"
                        };
                        self.fail(before, message);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => self.fail(reader.buffer_position(), err.to_string()),
            }
        }

        if self.failure.is_none() {
            if !self.stack.is_empty() {
                self.fail(
                    self.text.len(),
                    "XML document structures must start and end within the same entity",
                );
            } else if !self.seen_root {
                self.fail(self.text.len(), "Premature end of file");
            }
        }

        // still-open elements end where scanning stopped
        if let Some(failure) = &self.failure {
            let end = failure.position;
            while let Some(frame) = self.stack.pop() {
                self.attach(frame, end);
            }
        }

        DocumentScan {
            tree: self.root,
            failure: self.failure,
        }
    }

    /// Push a frame for a start tag; false when the tag is not well-formed
    fn open(&mut self, start: &BytesStart<'_>, offset: usize) -> bool {
        if self.seen_root && self.stack.is_empty() {
            self.fail(
                offset,
                "The markup in the document following the root element must be well-formed",
            );
            return false;
        }

        let mut declarations = HashMap::new();
        let mut attributes = IndexMap::new();
        for attribute in start.attributes() {
            let attribute = match attribute {
                Ok(attribute) => attribute,
                Err(err) => {
                    self.fail(offset, err.to_string());
                    return false;
                }
            };
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = match attribute.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(err) => {
                    self.fail(offset, err.to_string());
                    return false;
                }
            };

            if key == "xmlns" {
                declarations.insert(String::new(), value);
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.insert(prefix.to_string(), value);
            } else {
                attributes.insert(key, value);
            }
        }
        self.scopes.push(declarations);

        let raw = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", raw.as_str()),
        };
        let name = QName::new(self.resolve(prefix), local);

        self.seen_root = true;
        self.stack.push(Frame {
            element: DocElement::new(name, attributes).with_start(self.index.position(offset)),
            children: Vec::new(),
        });
        true
    }

    fn close(&mut self, offset: usize) {
        match self.stack.pop() {
            Some(frame) => {
                self.scopes.pop();
                let end = self.index.position(offset);
                self.attach(frame, end);
            }
            None => self.fail(offset, "Unexpected end tag"),
        }
    }

    fn attach(&mut self, frame: Frame, end: Position) {
        let node = frame
            .children
            .into_iter()
            .fold(Tree::node(frame.element.with_end(end)), Tree::with_child);
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => {
                self.root.add_child(node);
            }
        }
    }

    fn resolve(&self, prefix: &str) -> String {
        if prefix == "xml" {
            return XML_NAMESPACE.to_string();
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix))
            .cloned()
            .unwrap_or_default()
    }

    fn fail(&mut self, offset: usize, message: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(ParseFailure {
                position: self.index.position(offset.min(self.text.len())),
                message: message.into(),
            });
        }
    }
}

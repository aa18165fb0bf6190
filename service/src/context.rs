//! The validation context
//!
//! Owns one document (decoded into lines) and the schemas that describe it,
//! and answers the cross-tree questions diagnostics are built from: where an
//! element sits in the document, where the grammar allows it instead, what
//! else is allowed next to it.
//!
//! The document tree and the schema tree are both built on first use and
//! kept for the life of the context. The caches use unsynchronized cells, so
//! a context is not `Sync`; build it on the thread that uses it.

use crate::encoding::{decode, detect_charset, split_lines};
use crate::handler::{ErrorHandler, HandlerRegistry};
use crate::namespace::{extract_namespaces, schema_provides_namespace};
use crate::policy::{AllowAll, DocumentPrefixProvider, PathGate, PrefixProvider};
use crate::source::{document_name, read_url};
use crate::walker::{DocWalker, ParseFailure, SchemaWalker, to_i32};
use encoding_rs::Encoding;
use once_cell::unsync::OnceCell;
use regex::Regex;
use schemadiag_core::{
    DiagnosticsConfig, DocElement, ErrorType, HandledResult, MessageKey, Position, QName, Result,
    SchemaElement, Tree, ValidationError,
};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, trace};
use url::Url;

/// Document, schemas and the queries that correlate them
pub struct ValidationContext {
    document: Url,
    encoding: &'static Encoding,
    lines: Vec<String>,
    schemas: Vec<Url>,
    doc_walker: DocWalker,
    schema_walker: SchemaWalker,
    schema_tree: OnceCell<Tree<SchemaElement>>,
    path_gate: Box<dyn PathGate>,
    prefix_provider: Box<dyn PrefixProvider>,
    handlers: HandlerRegistry,
    config: DiagnosticsConfig,
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("document", &self.document.as_str())
            .field("encoding", &self.encoding.name())
            .field("lines", &self.lines.len())
            .field("schemas", &self.schemas)
            .field("schema_tree_built", &self.schema_tree.get().is_some())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Configures and builds a [`ValidationContext`]
pub struct ValidationContextBuilder {
    document: Url,
    schemas: Vec<Url>,
    config: DiagnosticsConfig,
    path_gate: Box<dyn PathGate>,
    prefix_provider: Box<dyn PrefixProvider>,
    handlers: HandlerRegistry,
}

impl ValidationContextBuilder {
    /// Start from a document and its candidate schemas
    pub fn new(document: Url, schemas: impl IntoIterator<Item = Url>) -> Self {
        Self {
            document,
            schemas: schemas.into_iter().collect(),
            config: DiagnosticsConfig::default(),
            path_gate: Box::new(AllowAll),
            prefix_provider: Box::new(DocumentPrefixProvider),
            handlers: HandlerRegistry::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: DiagnosticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the path gate
    #[must_use]
    pub fn path_gate(mut self, gate: impl PathGate + 'static) -> Self {
        self.path_gate = Box::new(gate);
        self
    }

    /// Replace the prefix provider
    #[must_use]
    pub fn prefix_provider(mut self, provider: impl PrefixProvider + 'static) -> Self {
        self.prefix_provider = Box::new(provider);
        self
    }

    /// Replace the handler for one error type
    #[must_use]
    pub fn handler(mut self, error_type: ErrorType, handler: impl ErrorHandler + 'static) -> Self {
        self.handlers.register(error_type, handler);
        self
    }

    /// Read the document and schemas and build the context
    ///
    /// Schemas whose target namespace the document does not declare are
    /// dropped unless namespace filtering is turned off. Neither tree is
    /// built yet, and a malformed document is not an error here.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the document or a
    /// schema cannot be read.
    pub fn build(self) -> Result<ValidationContext> {
        self.config.validate()?;

        let bytes = read_url(&self.document)?;
        let encoding = detect_charset(&bytes, &self.config.encoding);
        let text = decode(&bytes, encoding);
        let lines = split_lines(&text);
        let namespaces = extract_namespaces(&lines);
        debug!(
            document = %self.document,
            encoding = encoding.name(),
            lines = lines.len(),
            namespaces = namespaces.len(),
            "document loaded"
        );

        let mut schemas = Vec::new();
        let mut sources = Vec::new();
        for url in self.schemas {
            let bytes = read_url(&url)?;
            let schema_text = decode(&bytes, detect_charset(&bytes, &self.config.encoding));
            if self.config.schema.filter_by_namespace
                && !schema_provides_namespace(&namespaces, &schema_text)
            {
                trace!(schema = %url, "schema namespace not declared by document, skipping");
                continue;
            }
            debug!(schema = %url, "using schema");
            schemas.push(url.clone());
            sources.push((url, schema_text));
        }

        Ok(ValidationContext {
            document: self.document,
            encoding,
            lines,
            schemas,
            doc_walker: DocWalker::new(text),
            schema_walker: SchemaWalker::new(sources),
            schema_tree: OnceCell::new(),
            path_gate: self.path_gate,
            prefix_provider: self.prefix_provider,
            handlers: self.handlers,
            config: self.config,
        })
    }
}

impl ValidationContext {
    /// Build a context with default configuration and policies
    ///
    /// # Errors
    ///
    /// Returns an error if the document or a schema cannot be read.
    pub fn new(document: Url, schemas: impl IntoIterator<Item = Url>) -> Result<Self> {
        Self::builder(document, schemas).build()
    }

    pub fn builder(
        document: Url,
        schemas: impl IntoIterator<Item = Url>,
    ) -> ValidationContextBuilder {
        ValidationContextBuilder::new(document, schemas)
    }

    #[must_use]
    pub fn document_url(&self) -> &Url {
        &self.document
    }

    /// Short name of the document for messages
    #[must_use]
    pub fn document_name(&self) -> String {
        document_name(&self.document)
    }

    /// Encoding the document was decoded with
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Schemas kept after namespace filtering
    #[must_use]
    pub fn schemas(&self) -> &[Url] {
        &self.schemas
    }

    #[must_use]
    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    #[must_use]
    pub fn document_line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn document_lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines `start..end`, 0-indexed, clamped to the document
    #[must_use]
    pub fn extract_lines(&self, start: usize, end: usize) -> &[String] {
        let end = end.min(self.lines.len());
        &self.lines[start.min(end)..end]
    }

    /// Turn a validation error into a located, explained result
    ///
    /// When the handler flags the error as a possible symptom of a malformed
    /// document and the document is indeed not well-formed, the parser's own
    /// failure is attached as a secondary result.
    pub fn handle(&self, error: &ValidationError) -> HandledResult {
        debug!(
            error_type = %error.error_type,
            position = %error.position,
            "handling validation error"
        );
        let mut result = self.handlers.dispatch(self, error);

        if result.possibly_malformed
            && let Some(failure) = self.doc_walker.validation_failure()
        {
            debug!(%failure, "document may be malformed");
            let nested = HandledResult::new(failure.position)
                .with_primary_message(MessageKey::Passthru, [strip_period(&failure.message)]);
            result.add_secondary_message(MessageKey::MalformedXml, [self.document_name()]);
            result.add_secondary_result(nested);
        }

        result
    }

    /// The document tree
    pub fn document_tree(&self) -> &Tree<DocElement> {
        self.doc_walker.walk()
    }

    /// The schema tree, built from the schemas on first call
    pub fn schema_tree(&self) -> &Tree<SchemaElement> {
        self.schema_tree.get_or_init(|| self.schema_walker.walk())
    }

    /// Whether the document is well-formed
    pub fn document_valid(&self) -> bool {
        self.doc_walker.valid()
    }

    pub fn document_failure(&self) -> Option<&ParseFailure> {
        self.doc_walker.validation_failure()
    }

    /// Grammar paths to every element accepting `attribute`, element included
    pub fn alternate_elements_for_attribute(&self, attribute: &str) -> Vec<Vec<SchemaElement>> {
        self.alternate_elements(true, |element| element.accepts_attribute(attribute))
    }

    /// Grammar paths to every place `element` may appear, element excluded
    pub fn alternate_elements_for_element(&self, element: &QName) -> Vec<Vec<SchemaElement>> {
        self.alternate_elements(false, |candidate| candidate.qname() == element)
    }

    fn alternate_elements<F>(&self, include_value: bool, pred: F) -> Vec<Vec<SchemaElement>>
    where
        F: Fn(&SchemaElement) -> bool,
    {
        self.schema_tree()
            .paths_to_value(include_value, pred)
            .into_iter()
            .filter(|path| self.path_gate.allow_path(&qnames(path), self))
            .map(|path| self.schema_path_with_prefix(&path))
            .collect()
    }

    /// Prepend the prefix provider's ancestors to a grammar path
    pub fn schema_path_with_prefix<E>(&self, path: &[E]) -> Vec<SchemaElement>
    where
        E: Borrow<SchemaElement>,
    {
        let prefix = if path.is_empty() {
            Vec::new()
        } else {
            self.prefix_provider.prefix_for(&qnames(path), self)
        };
        prefix
            .into_iter()
            .map(SchemaElement::from)
            .chain(path.iter().map(|element| element.borrow().clone()))
            .collect()
    }

    /// Attribute names accepted by the grammar node `path` leads to
    ///
    /// Empty when the path does not resolve.
    pub fn attributes_for_element<E>(&self, path: &[E]) -> BTreeSet<String>
    where
        E: Borrow<SchemaElement>,
    {
        self.schema_node(path)
            .and_then(Tree::value)
            .map(|element| element.attributes().clone())
            .unwrap_or_default()
    }

    /// Child elements of the grammar node `path` leads to, in grammar order
    ///
    /// Empty when the path does not resolve.
    pub fn elements_for_element<E>(&self, path: &[E]) -> Vec<&SchemaElement>
    where
        E: Borrow<SchemaElement>,
    {
        self.schema_node(path)
            .map(|node| node.children().iter().filter_map(Tree::value).collect())
            .unwrap_or_default()
    }

    fn schema_node<E>(&self, path: &[E]) -> Option<&Tree<SchemaElement>>
    where
        E: Borrow<SchemaElement>,
    {
        path.iter()
            .try_fold(self.schema_tree(), |node, step| {
                node.children().iter().find(|child| {
                    child
                        .value()
                        .is_some_and(|value| value.qname() == step.borrow().qname())
                })
            })
            .filter(|node| !node.is_root())
    }

    /// Nearest match of `pattern` at or after a 0-indexed line and column
    ///
    /// Continues at the start of each following line. Columns count
    /// characters; the returned position is 1-indexed. When the pattern has a
    /// capture group that takes part in the match, the position is where
    /// group 1 starts rather than the whole match.
    pub fn search_forward(
        &self,
        start_line: usize,
        start_column: usize,
        pattern: &Regex,
    ) -> Option<Position> {
        let mut column = start_column;
        for (idx, line) in self.lines.iter().enumerate().skip(start_line) {
            if let Some((offset, _)) = line.char_indices().nth(column)
                && let Some(found) = pattern
                    .captures_at(line, offset)
                    .and_then(|captures| captures.get(1).or_else(|| captures.get(0)))
            {
                return Some(position_in(idx, line, found.start()));
            }
            column = 0;
        }
        None
    }

    /// Nearest match of `pattern` starting at or before a 0-indexed line and column
    ///
    /// Continues from the end of each preceding line. A start line past the
    /// end of the document begins at the end of the last line.
    pub fn search_backward(
        &self,
        start_line: usize,
        start_column: usize,
        pattern: &Regex,
    ) -> Option<Position> {
        let last = self.lines.len().checked_sub(1)?;
        let (first, mut limit) = if start_line > last {
            (last, None)
        } else {
            (start_line, Some(start_column))
        };

        for idx in (0..=first).rev() {
            let line = &self.lines[idx];
            let found = line
                .char_indices()
                .enumerate()
                .take_while(|(column, _)| limit.is_none_or(|limit| *column <= limit))
                .map(|(_, (offset, _))| offset)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .find(|offset| {
                    pattern
                        .find_at(line, *offset)
                        .is_some_and(|found| found.start() == *offset)
                });
            if let Some(offset) = found {
                return Some(position_in(idx, line, offset));
            }
            limit = None;
        }
        None
    }

    /// Every document path ending at an element matching `pred`
    pub fn paths_to_doc_element<F>(&self, pred: F) -> Vec<Vec<&DocElement>>
    where
        F: Fn(&DocElement) -> bool,
    {
        self.document_tree().paths_to_value(true, pred)
    }

    /// The first document path ending at an element matching `pred`
    pub fn path_to_doc_element<F>(&self, pred: F) -> Vec<&DocElement>
    where
        F: Fn(&DocElement) -> bool,
    {
        self.paths_to_doc_element(pred)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Path to the element named `name` whose span encloses `position`
    pub fn path_to_doc_element_at(&self, name: &QName, position: Position) -> Vec<&DocElement> {
        self.path_to_doc_element(|element| element.qname() == name && element.encloses(position))
    }

    /// Every grammar path ending at an element matching `pred`
    pub fn paths_to_schema_element<F>(&self, pred: F) -> Vec<Vec<&SchemaElement>>
    where
        F: Fn(&SchemaElement) -> bool,
    {
        self.schema_tree().paths_to_value(true, pred)
    }

    pub fn path_to_schema_element<F>(&self, pred: F) -> Vec<&SchemaElement>
    where
        F: Fn(&SchemaElement) -> bool,
    {
        self.paths_to_schema_element(pred)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// The grammar path describing the same place as a document path
    ///
    /// Among grammar paths ending at the document path's last name, picks the
    /// first whose prefixed names equal the document path's names exactly.
    pub fn map_doc_path_to_schema_path(&self, path: &[&DocElement]) -> Vec<&SchemaElement> {
        let Some(last) = path.last() else {
            return Vec::new();
        };

        self.paths_to_schema_element(|element| element.qname() == last.qname())
            .into_iter()
            .find(|candidate| {
                self.schema_path_with_prefix(candidate)
                    .iter()
                    .map(SchemaElement::qname)
                    .eq(path.iter().map(|element| element.qname()))
            })
            .unwrap_or_default()
    }

    pub fn map_doc_location_to_schema_path(
        &self,
        name: &QName,
        position: Position,
    ) -> Vec<&SchemaElement> {
        self.map_doc_path_to_schema_path(&self.path_to_doc_element_at(name, position))
    }

    /// Other document paths matching `pred` that share `path`'s parent
    pub fn doc_element_siblings<F>(&self, path: &[&DocElement], pred: F) -> Vec<Vec<&DocElement>>
    where
        F: Fn(&DocElement) -> bool,
    {
        let Some((_, parent)) = path.split_last() else {
            return Vec::new();
        };

        self.paths_to_doc_element(pred)
            .into_iter()
            .filter(|candidate| candidate.as_slice() != path)
            .filter(|candidate| {
                candidate
                    .split_last()
                    .is_some_and(|(_, candidate_parent)| candidate_parent == parent)
            })
            .collect()
    }

    /// Every other grammar path sharing `path`'s parent
    pub fn schema_element_siblings<E>(&self, path: &[E]) -> Vec<Vec<&SchemaElement>>
    where
        E: Borrow<SchemaElement>,
    {
        self.schema_element_siblings_where(path, |_| true)
    }

    /// Other grammar paths matching `pred` that share `path`'s parent
    pub fn schema_element_siblings_where<E, F>(
        &self,
        path: &[E],
        pred: F,
    ) -> Vec<Vec<&SchemaElement>>
    where
        E: Borrow<SchemaElement>,
        F: Fn(&SchemaElement) -> bool,
    {
        let Some((_, parent)) = path.split_last() else {
            return Vec::new();
        };

        self.paths_to_schema_element(pred)
            .into_iter()
            .filter(|candidate| !same_path(candidate, path))
            .filter(|candidate| {
                candidate
                    .split_last()
                    .is_some_and(|(_, candidate_parent)| same_path(candidate_parent, parent))
            })
            .collect()
    }
}

fn qnames<E: Borrow<SchemaElement>>(path: &[E]) -> Vec<QName> {
    path.iter()
        .map(|element| element.borrow().qname().clone())
        .collect()
}

fn same_path<E: Borrow<SchemaElement>>(a: &[&SchemaElement], b: &[E]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| *x == y.borrow())
}

fn position_in(line_idx: usize, line: &str, offset: usize) -> Position {
    Position::new(
        to_i32(line_idx + 1),
        to_i32(line[..offset].chars().count() + 1),
    )
}

fn strip_period(message: &str) -> &str {
    message.strip_suffix('.').unwrap_or(message)
}

//! Schema grammar tree
//!
//! Reads XSD files into a [`Tree<SchemaElement>`] that records only what the
//! diagnostics need: which elements may contain which, and which attribute
//! names each element accepts. Value types, facets, occurrence bounds and
//! ordering constraints are ignored.
//!
//! The root's children are the global element declarations of every schema,
//! in input order. An element's children are the element particles reachable
//! through its content model, following named types, groups, element refs and
//! extension or restriction bases across all loaded schemas.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use schemadiag_core::{DiagnosticsError, QName, Result, SchemaElement, Tree};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, trace, warn};
use url::Url;

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Builds the grammar tree from schema sources
#[derive(Debug, Clone, Default)]
pub struct SchemaWalker {
    sources: Vec<(Url, String)>,
}

impl SchemaWalker {
    /// Create a walker over already-read schema texts
    pub fn new(sources: impl IntoIterator<Item = (Url, String)>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[(Url, String)] {
        &self.sources
    }

    /// Build the grammar tree
    ///
    /// A schema that cannot be parsed is logged and contributes nothing.
    #[must_use]
    pub fn walk(&self) -> Tree<SchemaElement> {
        let schemas: Vec<SchemaDocument> = self
            .sources
            .iter()
            .filter_map(|(url, text)| match SchemaDocument::parse(url, text) {
                Ok(schema) => Some(schema),
                Err(err) => {
                    warn!(%url, error = %err, "skipping unreadable schema");
                    None
                }
            })
            .collect();

        let tree = Grammar::index(&schemas).build();
        debug!(
            schemas = schemas.len(),
            elements = tree.len(),
            "schema tree built"
        );
        tree
    }
}

/// One XSD component, namespace prefix stripped from its kind
#[derive(Debug)]
struct XsdNode {
    kind: String,
    attributes: HashMap<String, String>,
    children: Vec<XsdNode>,
}

impl XsdNode {
    fn from_start(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let raw = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let kind = local_part(&raw).to_string();

        let mut attributes = HashMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(|e| e.to_string())?;
            attributes.insert(key, value.into_owned());
        }

        Ok(Self {
            kind,
            attributes,
            children: Vec::new(),
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn children_of_kind<'n>(&'n self, kind: &'n str) -> impl Iterator<Item = &'n XsdNode> {
        self.children.iter().filter(move |child| child.kind == kind)
    }
}

#[derive(Debug)]
struct SchemaDocument {
    target_namespace: String,
    qualified: bool,
    prefixes: HashMap<String, String>,
    root: XsdNode,
}

impl SchemaDocument {
    fn parse(url: &Url, text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<XsdNode> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    let node = XsdNode::from_start(&start)
                        .map_err(|msg| DiagnosticsError::schema(url.as_str(), msg))?;
                    stack.push(node);
                }
                Ok(Event::Empty(start)) => {
                    let node = XsdNode::from_start(&start)
                        .map_err(|msg| DiagnosticsError::schema(url.as_str(), msg))?;
                    attach(&mut stack, &mut root, node);
                }
                Ok(Event::End(_)) => {
                    if let Some(node) = stack.pop() {
                        attach(&mut stack, &mut root, node);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(DiagnosticsError::schema(url.as_str(), err.to_string())),
            }
        }

        let root = root
            .filter(|node| node.kind == "schema")
            .ok_or_else(|| DiagnosticsError::schema(url.as_str(), "no schema document element"))?;

        let prefixes = root
            .attributes
            .iter()
            .filter_map(|(key, value)| {
                if key == "xmlns" {
                    Some((String::new(), value.clone()))
                } else {
                    key.strip_prefix("xmlns:")
                        .map(|prefix| (prefix.to_string(), value.clone()))
                }
            })
            .collect();

        Ok(Self {
            target_namespace: root.attr("targetNamespace").unwrap_or_default().to_string(),
            qualified: root.attr("elementFormDefault") == Some("qualified"),
            prefixes,
            root,
        })
    }
}

fn attach(stack: &mut [XsdNode], root: &mut Option<XsdNode>, node: XsdNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// A global definition: owning schema index and its node
type Definition<'s> = (usize, &'s XsdNode);

#[derive(Default)]
struct Content<'s> {
    attributes: BTreeSet<String>,
    particles: Vec<Definition<'s>>,
}

/// Global definitions of every loaded schema, keyed by qualified name
struct Grammar<'s> {
    schemas: &'s [SchemaDocument],
    elements: BTreeMap<QName, Definition<'s>>,
    types: BTreeMap<QName, Definition<'s>>,
    groups: BTreeMap<QName, Definition<'s>>,
    attribute_groups: BTreeMap<QName, Definition<'s>>,
}

impl<'s> Grammar<'s> {
    fn index(schemas: &'s [SchemaDocument]) -> Self {
        let mut elements = BTreeMap::new();
        let mut types = BTreeMap::new();
        let mut groups = BTreeMap::new();
        let mut attribute_groups = BTreeMap::new();

        for (idx, schema) in schemas.iter().enumerate() {
            for node in &schema.root.children {
                let Some(name) = node.attr("name") else {
                    continue;
                };
                let definitions = match node.kind.as_str() {
                    "element" => &mut elements,
                    "complexType" => &mut types,
                    "group" => &mut groups,
                    "attributeGroup" => &mut attribute_groups,
                    _ => continue,
                };
                definitions
                    .entry(QName::new(schema.target_namespace.clone(), name))
                    .or_insert((idx, node));
            }
        }

        Self {
            schemas,
            elements,
            types,
            groups,
            attribute_groups,
        }
    }

    fn build(&self) -> Tree<SchemaElement> {
        let mut root = Tree::root();
        let mut ancestors = Vec::new();
        for (idx, schema) in self.schemas.iter().enumerate() {
            for declaration in schema.root.children_of_kind("element") {
                if let Some(element) = self.element(idx, declaration, true, &mut ancestors) {
                    add_unique(&mut root, element);
                }
            }
        }
        root
    }

    fn element(
        &self,
        schema_idx: usize,
        declaration: &'s XsdNode,
        global: bool,
        ancestors: &mut Vec<QName>,
    ) -> Option<Tree<SchemaElement>> {
        if let Some(reference) = declaration.attr("ref") {
            let (idx, target) = self.lookup(&self.elements, schema_idx, reference)?;
            return self.element(idx, target, true, ancestors);
        }

        let name = declaration.attr("name")?;
        let schema = &self.schemas[schema_idx];
        let qualified = global
            || declaration
                .attr("form")
                .map_or(schema.qualified, |form| form == "qualified");
        let namespace = if qualified {
            schema.target_namespace.clone()
        } else {
            String::new()
        };
        let qname = QName::new(namespace, name);

        let mut content = Content::default();
        let mut visited = HashSet::new();
        if let Some(type_name) = declaration.attr("type") {
            self.follow(
                &self.types,
                schema_idx,
                type_name,
                &mut content,
                &mut visited,
            );
        }
        for complex_type in declaration.children_of_kind("complexType") {
            self.collect(schema_idx, complex_type, &mut content, &mut visited);
        }

        let mut node = Tree::node(SchemaElement::new(qname.clone(), content.attributes));
        if ancestors.contains(&qname) {
            trace!(element = %qname, "recursive element, not expanding");
            return Some(node);
        }

        ancestors.push(qname);
        for (idx, particle) in content.particles {
            if let Some(child) = self.element(idx, particle, false, ancestors) {
                add_unique(&mut node, child);
            }
        }
        ancestors.pop();
        Some(node)
    }

    /// Gather attributes and element particles from a content model
    fn collect(
        &self,
        schema_idx: usize,
        node: &'s XsdNode,
        content: &mut Content<'s>,
        visited: &mut HashSet<(usize, String)>,
    ) {
        for child in &node.children {
            match child.kind.as_str() {
                "element" => content.particles.push((schema_idx, child)),
                "sequence" | "choice" | "all" | "complexContent" | "simpleContent"
                | "complexType" => self.collect(schema_idx, child, content, visited),
                "group" => match child.attr("ref") {
                    Some(reference) => {
                        self.follow(&self.groups, schema_idx, reference, content, visited);
                    }
                    None => self.collect(schema_idx, child, content, visited),
                },
                "attributeGroup" => match child.attr("ref") {
                    Some(reference) => self.follow(
                        &self.attribute_groups,
                        schema_idx,
                        reference,
                        content,
                        visited,
                    ),
                    None => self.collect(schema_idx, child, content, visited),
                },
                "extension" | "restriction" => {
                    if let Some(base) = child.attr("base") {
                        self.follow(&self.types, schema_idx, base, content, visited);
                    }
                    self.collect(schema_idx, child, content, visited);
                }
                "attribute" if child.attr("use") != Some("prohibited") => {
                    let name = child
                        .attr("name")
                        .or_else(|| child.attr("ref").map(local_part));
                    if let Some(name) = name {
                        content.attributes.insert(name.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Collect from a referenced global definition, once per content model
    fn follow(
        &self,
        definitions: &BTreeMap<QName, Definition<'s>>,
        schema_idx: usize,
        reference: &str,
        content: &mut Content<'s>,
        visited: &mut HashSet<(usize, String)>,
    ) {
        let Some((idx, definition)) = self.lookup(definitions, schema_idx, reference) else {
            return;
        };
        let name = definition.attr("name").unwrap_or_default();
        let key = (idx, format!("{}:{name}", definition.kind));
        if visited.insert(key) {
            self.collect(idx, definition, content, visited);
        }
    }

    /// Resolve a prefixed reference against the referring schema's declarations
    ///
    /// Falls back to a local-name match, preferring the referring schema, for
    /// schemas that leave their own namespace undeclared.
    fn lookup(
        &self,
        definitions: &BTreeMap<QName, Definition<'s>>,
        schema_idx: usize,
        reference: &str,
    ) -> Option<Definition<'s>> {
        let schema = &self.schemas[schema_idx];
        let (prefix, local) = reference.split_once(':').unwrap_or(("", reference));
        let namespace = schema.prefixes.get(prefix).cloned().unwrap_or_default();
        if !prefix.is_empty() && namespace == XSD_NAMESPACE {
            return None;
        }

        if let Some(definition) = definitions.get(&QName::new(namespace, local)) {
            return Some(*definition);
        }
        let candidates: Vec<Definition<'s>> = definitions
            .iter()
            .filter(|(name, _)| name.local_name() == local)
            .map(|(_, definition)| *definition)
            .collect();
        candidates
            .iter()
            .find(|(idx, _)| *idx == schema_idx)
            .or_else(|| candidates.first())
            .copied()
    }
}

fn add_unique(parent: &mut Tree<SchemaElement>, child: Tree<SchemaElement>) {
    let duplicate = parent
        .children()
        .iter()
        .any(|existing| existing.value() == child.value());
    if !duplicate {
        parent.add_child(child);
    }
}

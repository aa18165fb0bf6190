//! End-to-end tests for `ValidationContext` over on-disk fixtures

use pretty_assertions::assert_eq;
use schemadiag_service::source::path_to_url;
use schemadiag_service::{
    DiagnosticsConfig, DocElement, ErrorType, MessageKey, Position, QName,
    RootWrapperPrefixProvider, SchemaElement, ValidationContext, ValidationError,
};
use std::path::Path;
use tempfile::TempDir;
use url::Url;

const SERVER_NS: &str = "urn:test:server";
const MESSAGING_NS: &str = "urn:test:messaging";

const MESSAGING_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="urn:test:messaging"
           targetNamespace="urn:test:messaging"
           elementFormDefault="qualified">
    <xs:element name="subsystem">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="queue" minOccurs="0" maxOccurs="unbounded">
                    <xs:complexType>
                        <xs:attribute name="name" type="xs:string" use="required"/>
                        <xs:attribute name="max-size" type="xs:int"/>
                    </xs:complexType>
                </xs:element>
                <xs:element name="topic" minOccurs="0" maxOccurs="unbounded">
                    <xs:complexType>
                        <xs:attribute name="name" type="xs:string" use="required"/>
                    </xs:complexType>
                </xs:element>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>
"#;

const OTHER_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:test:other"
           elementFormDefault="qualified">
    <xs:element name="datasource"/>
</xs:schema>
"#;

const SERVER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<server xmlns="urn:test:server">
    <profile>
        <subsystem xmlns="urn:test:messaging">
            <queue name="a" max-size="10"/>
            <queu name="b"/>
            <topic name="t" max-size="5"/>
            <queue name="a"/>
        </subsystem>
    </profile>
</server>
"#;

struct Fixture {
    _dir: TempDir,
    document: Url,
    schemas: Vec<Url>,
}

fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> Url {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path_to_url(path).unwrap()
}

fn fixture(document: impl AsRef<[u8]>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let schemas = vec![
        write(dir.path(), "messaging.xsd", MESSAGING_XSD),
        write(dir.path(), "other.xsd", OTHER_XSD),
    ];
    let document = write(dir.path(), "server.xml", document);
    Fixture {
        _dir: dir,
        document,
        schemas,
    }
}

fn server_context() -> (Fixture, ValidationContext) {
    let fixture = fixture(SERVER_XML);
    let ctx = ValidationContext::new(fixture.document.clone(), fixture.schemas.clone()).unwrap();
    (fixture, ctx)
}

fn names<E: std::borrow::Borrow<SchemaElement>>(path: &[E]) -> Vec<String> {
    path.iter()
        .map(|element| element.borrow().name().to_string())
        .collect()
}

#[test]
fn test_schemas_filtered_by_document_namespaces() {
    let (fixture, ctx) = server_context();
    assert_eq!(ctx.schemas(), &fixture.schemas[..1]);

    let config =
        DiagnosticsConfig::from_yaml_str("schema:\n  filter_by_namespace: false\n").unwrap();
    let unfiltered = ValidationContext::builder(fixture.document.clone(), fixture.schemas.clone())
        .config(config)
        .build()
        .unwrap();
    assert_eq!(unfiltered.schemas(), fixture.schemas.as_slice());
}

#[test]
fn test_missing_document_is_fatal() {
    let (fixture, _ctx) = server_context();
    let missing = fixture.document.join("absent.xml").unwrap();
    assert!(ValidationContext::new(missing, fixture.schemas.clone()).is_err());
}

#[test]
fn test_schema_tree_is_built_once() {
    let (_fixture, ctx) = server_context();
    let first = ctx.schema_tree();
    let second = ctx.schema_tree();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.len(), 3);
}

#[test]
fn test_alternate_elements_for_attribute_prefixed_from_document() {
    let (_fixture, ctx) = server_context();
    let paths = ctx.alternate_elements_for_attribute("max-size");

    assert_eq!(paths.len(), 1);
    assert_eq!(names(&paths[0]), vec!["server", "profile", "subsystem", "queue"]);
    assert_eq!(paths[0][0].qname(), &QName::new(SERVER_NS, "server"));
    assert!(ctx.alternate_elements_for_attribute("durable").is_empty());
}

#[test]
fn test_closure_prefix_provider_supplies_chain() {
    let fixture = fixture(SERVER_XML);
    let ctx = ValidationContext::builder(fixture.document.clone(), fixture.schemas.clone())
        .prefix_provider(|path: &[QName], _ctx: &ValidationContext| {
            if path.is_empty() {
                Vec::new()
            } else {
                vec![QName::new(SERVER_NS, "server"), QName::new(SERVER_NS, "profile")]
            }
        })
        .build()
        .unwrap();

    let paths = ctx.alternate_elements_for_attribute("max-size");
    assert_eq!(paths.len(), 1);
    assert_eq!(names(&paths[0]), vec!["server", "profile", "subsystem", "queue"]);
}

#[test]
fn test_root_wrapper_prefix_provider() {
    let fixture = fixture(SERVER_XML);
    let ctx = ValidationContext::builder(fixture.document.clone(), fixture.schemas.clone())
        .prefix_provider(RootWrapperPrefixProvider::new("profile"))
        .build()
        .unwrap();

    let paths = ctx.alternate_elements_for_element(&QName::new(MESSAGING_NS, "topic"));
    assert_eq!(paths.len(), 1);
    assert_eq!(names(&paths[0]), vec!["server", "profile", "subsystem"]);
    assert_eq!(paths[0][1].qname(), &QName::new(SERVER_NS, "profile"));
}

#[test]
fn test_path_gate_filters_alternates() {
    let fixture = fixture(SERVER_XML);
    let ctx = ValidationContext::builder(fixture.document.clone(), fixture.schemas.clone())
        .path_gate(|path: &[QName], _ctx: &ValidationContext| path.len() < 2)
        .build()
        .unwrap();

    assert!(ctx.alternate_elements_for_attribute("max-size").is_empty());
    assert!(ctx.alternate_elements_for_attribute("name").is_empty());
}

#[test]
fn test_attributes_and_elements_for_element() {
    let (_fixture, ctx) = server_context();
    let queue = ctx.path_to_schema_element(|element| element.name() == "queue");
    assert_eq!(names(&queue), vec!["subsystem", "queue"]);

    let attributes: Vec<String> = ctx.attributes_for_element(&queue).into_iter().collect();
    assert_eq!(attributes, vec!["max-size", "name"]);
    assert_eq!(names(&ctx.elements_for_element(&queue[..1])), vec!["queue", "topic"]);

    let unknown = [SchemaElement::from(QName::local("nope"))];
    assert!(ctx.attributes_for_element(&unknown).is_empty());
    assert!(ctx.elements_for_element(&unknown).is_empty());
    assert!(ctx.attributes_for_element::<SchemaElement>(&[]).is_empty());
}

#[test]
fn test_map_doc_path_to_schema_path() {
    let (_fixture, ctx) = server_context();
    let queue = QName::new(MESSAGING_NS, "queue");

    let doc_path = ctx.path_to_doc_element_at(&queue, Position::new(8, 14));
    let doc_names: Vec<&str> = doc_path.iter().map(|element| element.name()).collect();
    assert_eq!(doc_names, vec!["server", "profile", "subsystem", "queue"]);
    assert_eq!(doc_path[3].start(), Position::new(8, 13));

    let schema_path = ctx.map_doc_path_to_schema_path(&doc_path);
    assert_eq!(names(&schema_path), vec!["subsystem", "queue"]);
    assert_eq!(
        ctx.map_doc_location_to_schema_path(&queue, Position::new(5, 20)),
        schema_path
    );

    // Not declared by any kept schema
    let queu = QName::new(MESSAGING_NS, "queu");
    let stray = ctx.map_doc_location_to_schema_path(&queu, Position::new(6, 14));
    assert!(stray.is_empty());
    assert!(ctx.map_doc_path_to_schema_path(&[]).is_empty());
}

#[test]
fn test_siblings() {
    let (_fixture, ctx) = server_context();
    let queue = QName::new(MESSAGING_NS, "queue");
    let first_queue = ctx.path_to_doc_element_at(&queue, Position::new(5, 13));

    let siblings = ctx.doc_element_siblings(&first_queue, |element| element.name() == "queue");
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0][3].start(), Position::new(8, 13));

    let all: Vec<Vec<&DocElement>> = ctx.doc_element_siblings(&first_queue, |_| true);
    let sibling_names: Vec<&str> = all.iter().map(|path| path[3].name()).collect();
    assert_eq!(sibling_names, vec!["queu", "topic", "queue"]);

    let schema_queue = ctx.path_to_schema_element(|element| element.name() == "queue");
    let schema_siblings = ctx.schema_element_siblings(&schema_queue);
    assert_eq!(schema_siblings.len(), 1);
    assert_eq!(names(&schema_siblings[0]), vec!["subsystem", "topic"]);
    assert!(
        ctx.schema_element_siblings_where(&schema_queue, |element| element.name() == "queue")
            .is_empty()
    );
}

#[test]
fn test_handle_attaches_malformed_document_failure() {
    let fixture = fixture(
        r#"<server xmlns="urn:test:server">
    <profile>
        <subsystem xmlns="urn:test:messaging">
            <queue name="a">
        </subsystem>
    </profile>
</server>
"#,
    );
    let ctx = ValidationContext::new(fixture.document.clone(), fixture.schemas.clone()).unwrap();
    assert!(!ctx.document_valid());
    let failure = ctx.document_failure().unwrap().clone();

    let error = ValidationError::new(
        ErrorType::UnknownError,
        "cvc-complex-type.2.4",
        Position::new(5, 9),
    );
    let result = ctx.handle(&error);

    assert!(result.possibly_malformed);
    assert_eq!(result.secondary_messages.len(), 1);
    assert_eq!(result.secondary_messages[0].key, MessageKey::MalformedXml);
    assert_eq!(result.secondary_messages[0].args, vec!["server.xml".to_string()]);

    assert_eq!(result.secondary_results.len(), 1);
    let nested = &result.secondary_results[0];
    assert_eq!(nested.position, failure.position);
    let nested_message = nested.primary_message.as_ref().unwrap();
    assert_eq!(nested_message.key, MessageKey::Passthru);
    assert!(!nested_message.args[0].ends_with('.'));
}

#[test]
fn test_handle_well_formed_document_has_no_malformed_secondary() {
    let (_fixture, ctx) = server_context();
    assert!(ctx.document_valid());

    let error =
        ValidationError::new(ErrorType::UnknownError, "something odd", Position::new(3, 5));
    let result = ctx.handle(&error);
    assert!(result.possibly_malformed);
    assert!(result.secondary_messages.is_empty());
    assert!(result.secondary_results.is_empty());
}

#[test]
fn test_utf8_bom_is_removed() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(SERVER_XML.as_bytes());
    let fixture = fixture(bytes);
    let ctx = ValidationContext::new(fixture.document.clone(), fixture.schemas.clone()).unwrap();

    assert_eq!(ctx.encoding(), encoding_rs::UTF_8);
    assert!(ctx.document_lines()[0].starts_with("<?xml"));
    assert_eq!(ctx.document_line_count(), SERVER_XML.lines().count());
}

#[test]
fn test_utf16_document_with_bom() {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(SERVER_XML.encode_utf16().flat_map(u16::to_le_bytes));
    let fixture = fixture(bytes);
    let ctx = ValidationContext::new(fixture.document.clone(), fixture.schemas.clone()).unwrap();

    assert_eq!(ctx.encoding(), encoding_rs::UTF_16LE);
    assert!(ctx.document_valid());
    assert_eq!(ctx.alternate_elements_for_attribute("max-size").len(), 1);
}

#[test]
fn test_latin1_declaration() {
    let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n".to_vec();
    bytes.extend_from_slice(b"<server xmlns=\"urn:test:server\" owner=\"");
    bytes.push(0xE9);
    bytes.extend_from_slice(b"\"/>\n");
    let fixture = fixture(bytes);
    let ctx = ValidationContext::new(fixture.document.clone(), fixture.schemas.clone()).unwrap();

    assert_eq!(ctx.encoding(), encoding_rs::WINDOWS_1252);
    assert!(ctx.document_lines()[1].contains('\u{e9}'));
    let server = ctx.path_to_doc_element(|element| element.name() == "server");
    assert_eq!(server[0].attribute("owner"), Some("\u{e9}"));
    // Only the document namespace is declared, so no schema is kept
    assert!(ctx.schemas().is_empty());
    assert!(ctx.schema_tree().is_empty());
}

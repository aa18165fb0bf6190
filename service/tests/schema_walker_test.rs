//! Grammar trees built from several schema files on disk

use pretty_assertions::assert_eq;
use schemadiag_service::encoding::{decode, detect_charset};
use schemadiag_service::source::{read_url, schema_urls_in};
use schemadiag_service::{DiagnosticsConfig, QName, SchemaElement, SchemaWalker, Tree};
use std::path::Path;

const MESSAGING_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:c="urn:test:common"
           targetNamespace="urn:test:messaging"
           elementFormDefault="qualified">
    <xs:import namespace="urn:test:common" schemaLocation="b-common.xsd"/>
    <xs:element name="subsystem">
        <xs:complexType>
            <xs:sequence>
                <xs:element ref="c:connector"/>
                <xs:element name="queue" type="c:namedType"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>
"#;

const COMMON_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            xmlns="urn:test:common"
            targetNamespace="urn:test:common"
            elementFormDefault="qualified">
    <xsd:element name="connector">
        <xsd:complexType>
            <xsd:attribute name="host" type="xsd:string"/>
            <xsd:attribute name="port" type="xsd:int"/>
        </xsd:complexType>
    </xsd:element>
    <xsd:complexType name="namedType">
        <xsd:attribute name="name" type="xsd:string" use="required"/>
    </xsd:complexType>
</xsd:schema>
"#;

fn load(dir: &Path) -> SchemaWalker {
    load_with(dir, &DiagnosticsConfig::default())
}

fn load_with(dir: &Path, config: &DiagnosticsConfig) -> SchemaWalker {
    let sources = schema_urls_in(dir, &config.schema)
        .unwrap()
        .into_iter()
        .map(|url| {
            let bytes = read_url(&url).unwrap();
            let text = decode(&bytes, detect_charset(&bytes, &config.encoding));
            (url, text)
        });
    SchemaWalker::new(sources)
}

fn child_names(node: &Tree<SchemaElement>) -> Vec<&str> {
    node.children()
        .iter()
        .filter_map(Tree::value)
        .map(SchemaElement::name)
        .collect()
}

#[test]
fn test_references_resolve_across_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a-messaging.xsd"), MESSAGING_XSD).unwrap();
    std::fs::write(dir.path().join("b-common.xsd"), COMMON_XSD).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

    let walker = load(dir.path());
    assert_eq!(walker.sources().len(), 2);
    assert!(walker.sources()[0].0.path().ends_with("a-messaging.xsd"));

    let tree = walker.walk();
    assert_eq!(child_names(&tree), vec!["subsystem", "connector"]);

    let subsystem = &tree.children()[0];
    assert_eq!(child_names(subsystem), vec!["connector", "queue"]);

    let connector = subsystem.children()[0].value().unwrap();
    assert_eq!(connector.qname(), &QName::new("urn:test:common", "connector"));
    let attributes: Vec<&str> = connector.attributes().iter().map(String::as_str).collect();
    assert_eq!(attributes, vec!["host", "port"]);

    let queue = subsystem.children()[1].value().unwrap();
    assert_eq!(queue.qname(), &QName::new("urn:test:messaging", "queue"));
    assert!(queue.accepts_attribute("name"));
}

#[test]
fn test_broken_file_does_not_hide_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a-broken.xsd"), "<xs:schema><unclosed").unwrap();
    std::fs::write(dir.path().join("b-common.xsd"), COMMON_XSD).unwrap();

    let tree = load(dir.path()).walk();
    assert_eq!(child_names(&tree), vec!["connector"]);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_paths_to_shared_element() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a-messaging.xsd"), MESSAGING_XSD).unwrap();
    std::fs::write(dir.path().join("b-common.xsd"), COMMON_XSD).unwrap();

    let tree = load(dir.path()).walk();
    let paths: Vec<Vec<&str>> = tree
        .paths_to_value(true, |element| element.accepts_attribute("host"))
        .into_iter()
        .map(|path| path.into_iter().map(SchemaElement::name).collect())
        .collect();
    assert_eq!(paths, vec![vec!["subsystem", "connector"], vec!["connector"]]);
}

#[test]
fn test_configured_extension_selects_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a-messaging.xsd11"), MESSAGING_XSD).unwrap();
    std::fs::write(dir.path().join("b-common.xsd"), COMMON_XSD).unwrap();
    let config = DiagnosticsConfig::from_yaml_str("schema:\n  extension: xsd11\n").unwrap();

    let walker = load_with(dir.path(), &config);
    assert_eq!(walker.sources().len(), 1);

    // The common schema was not collected, so its references stay unresolved
    let tree = walker.walk();
    assert_eq!(child_names(&tree), vec!["subsystem"]);
    assert_eq!(child_names(&tree.children()[0]), vec!["queue"]);
}

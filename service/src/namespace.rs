//! Raw-text namespace scans
//!
//! These work on source text rather than a parsed tree so they also answer
//! for documents that are not well-formed.

use regex::Regex;
use schemadiag_core::QName;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static XMLNS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"xmlns(?::[\w.\-]+)?\s*=\s*["']([^"']*)["']"#).expect("Valid xmlns regex pattern")
});

static TARGET_NAMESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"targetNamespace\s*=\s*["']([^"']*)["']"#)
        .expect("Valid targetNamespace regex pattern")
});

static COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Valid comment regex pattern"));

static START_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z_][\w.\-]*)(?::([A-Za-z_][\w.\-]*))?([^>]*)>")
        .expect("Valid start tag regex pattern")
});

/// Every namespace URI declared anywhere in the document
#[must_use]
pub fn extract_namespaces<S: AsRef<str>>(lines: &[S]) -> BTreeSet<String> {
    lines
        .iter()
        .flat_map(|line| {
            XMLNS_REGEX
                .captures_iter(line.as_ref())
                .map(|caps| caps[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The `targetNamespace` a schema declares
#[must_use]
pub fn schema_target_namespace(schema_text: &str) -> Option<String> {
    TARGET_NAMESPACE_REGEX
        .captures(schema_text)
        .map(|caps| caps[1].to_string())
}

/// Whether a schema's target namespace is among `namespaces`
///
/// A schema without a target namespace provides none.
#[must_use]
pub fn schema_provides_namespace(namespaces: &BTreeSet<String>, schema_text: &str) -> bool {
    schema_target_namespace(schema_text).is_some_and(|ns| namespaces.contains(&ns))
}

/// The qualified name of the document element
///
/// Skips the XML declaration, processing instructions, comments and DOCTYPE.
/// The namespace is resolved from declarations on the same start tag.
#[must_use]
pub fn extract_first_element<S: AsRef<str>>(lines: &[S]) -> Option<QName> {
    let text = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    let text = COMMENT_REGEX.replace_all(&text, "");
    let caps = START_TAG_REGEX.captures(&text)?;

    let (prefix, local) = match caps.get(2) {
        Some(local) => (Some(&caps[1]), local.as_str()),
        None => (None, &caps[1]),
    };
    let declared = caps.get(3).map_or("", |m| m.as_str());
    let namespace = namespace_declared_for(prefix, declared).unwrap_or_default();

    Some(QName::new(namespace, local))
}

fn namespace_declared_for(prefix: Option<&str>, tag_body: &str) -> Option<String> {
    let attribute = match prefix {
        Some(prefix) => format!("xmlns:{}", regex::escape(prefix)),
        None => "xmlns".to_string(),
    };
    let pattern = Regex::new(&format!(r#"(?:^|\s){attribute}\s*=\s*["']([^"']*)["']"#)).ok()?;
    pattern.captures(tag_body).map(|caps| caps[1].to_string())
}

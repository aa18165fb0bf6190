//! Pluggable policies for suggestion paths
//!
//! A [`PathGate`] decides which grammar paths are worth suggesting, and a
//! [`PrefixProvider`] supplies the document-level ancestors a bare grammar
//! path is missing. Both are fixed when the context is built. Closures with
//! the matching signature implement either trait.

use crate::context::ValidationContext;
use crate::namespace::extract_first_element;
use once_cell::unsync::OnceCell;
use schemadiag_core::QName;

/// Filters candidate grammar paths before they are offered as suggestions
pub trait PathGate {
    fn allow_path(&self, path: &[QName], ctx: &ValidationContext) -> bool;
}

impl<F> PathGate for F
where
    F: Fn(&[QName], &ValidationContext) -> bool,
{
    fn allow_path(&self, path: &[QName], ctx: &ValidationContext) -> bool {
        self(path, ctx)
    }
}

/// Allows every path
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PathGate for AllowAll {
    fn allow_path(&self, _path: &[QName], _ctx: &ValidationContext) -> bool {
        true
    }
}

/// Supplies the ancestor chain to prepend to a grammar path
///
/// Returns an empty list when the path already starts where a document would.
pub trait PrefixProvider {
    fn prefix_for(&self, path: &[QName], ctx: &ValidationContext) -> Vec<QName>;
}

impl<F> PrefixProvider for F
where
    F: Fn(&[QName], &ValidationContext) -> Vec<QName>,
{
    fn prefix_for(&self, path: &[QName], ctx: &ValidationContext) -> Vec<QName> {
        self(path, ctx)
    }
}

/// Borrows the prefix from the document itself
///
/// Finds the first document element with the same local name as the path's
/// first element and returns that element's ancestors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentPrefixProvider;

impl PrefixProvider for DocumentPrefixProvider {
    fn prefix_for(&self, path: &[QName], ctx: &ValidationContext) -> Vec<QName> {
        let Some(first) = path.first() else {
            return Vec::new();
        };
        ctx.path_to_doc_element(|element| element.name() == first.local_name())
            .split_last()
            .map(|(_, ancestors)| {
                ancestors
                    .iter()
                    .map(|element| element.qname().clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A fixed `[document element, wrapper]` prefix
///
/// For documents whose grammar fragments live under one well-known wrapper
/// below the document element, such as `server/profile/subsystem`. The
/// wrapper takes the document element's namespace. The prefix is worked out
/// on first use and kept.
#[derive(Debug)]
pub struct RootWrapperPrefixProvider {
    wrapper: String,
    prefix: OnceCell<Vec<QName>>,
}

impl RootWrapperPrefixProvider {
    pub fn new(wrapper: impl Into<String>) -> Self {
        Self {
            wrapper: wrapper.into(),
            prefix: OnceCell::new(),
        }
    }
}

impl PrefixProvider for RootWrapperPrefixProvider {
    fn prefix_for(&self, path: &[QName], ctx: &ValidationContext) -> Vec<QName> {
        let prefix = self.prefix.get_or_init(|| {
            extract_first_element(ctx.document_lines())
                .map(|root| {
                    let wrapper = QName::new(root.namespace(), self.wrapper.as_str());
                    vec![root, wrapper]
                })
                .unwrap_or_default()
        });

        match (prefix.first(), path.first()) {
            (Some(root), Some(first)) if root != first => prefix.clone(),
            _ => Vec::new(),
        }
    }
}

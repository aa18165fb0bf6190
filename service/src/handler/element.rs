use super::{ErrorHandler, element_start, format_list, format_path, original_error};
use crate::context::ValidationContext;
use crate::suggest::suggest_similar;
use schemadiag_core::{DocElement, HandledResult, MessageKey, QName, ValidationError};

/// An element the grammar does not allow where it appears
///
/// Suggests a similarly named element allowed at that spot, or lists what is
/// allowed, then lists where the grammar does allow the element.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnexpectedElementHandler;

impl ErrorHandler for UnexpectedElementHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(element) = &error.element else {
            return original_error(error).possibly_malformed(true);
        };

        let doc_path = ctx.path_to_doc_element_at(element, error.position);
        let mut result = HandledResult::new(element_start(&doc_path, error.position))
            .with_primary_message(MessageKey::ElementNotAllowed, [element.local_name()])
            .possibly_malformed(true);

        let allowed = allowed_here(ctx, &doc_path, error);
        let max_distance = ctx.config().suggestions.max_edit_distance;
        if let Some(suggestion) = suggest_similar(
            element.local_name(),
            allowed.iter().map(String::as_str),
            max_distance,
        ) {
            result.add_secondary_message(MessageKey::DidYouMean, [suggestion]);
        } else if !allowed.is_empty() {
            let listed = format_list(ctx, &allowed);
            result.add_secondary_message(MessageKey::ElementsAllowedHere, [listed]);
        }

        let elsewhere: Vec<String> = ctx
            .alternate_elements_for_element(element)
            .iter()
            .filter(|path| !path.is_empty())
            .map(|path| format_path(path))
            .collect();
        if !elsewhere.is_empty() {
            result.add_secondary_message(
                MessageKey::ElementIsAllowedOn,
                [element.local_name().to_string(), format_list(ctx, &elsewhere)],
            );
        }

        result
    }
}

/// Element names the grammar allows under the offending element's parent
///
/// Grammar order first, then any names the validator listed.
fn allowed_here(
    ctx: &ValidationContext,
    doc_path: &[&DocElement],
    error: &ValidationError,
) -> Vec<String> {
    let mut allowed: Vec<String> = match doc_path.split_last() {
        Some((_, parent)) if !parent.is_empty() => {
            let schema_parent = ctx.map_doc_path_to_schema_path(parent);
            ctx.elements_for_element(&schema_parent)
                .into_iter()
                .map(|element| element.name().to_string())
                .collect()
        }
        _ => Vec::new(),
    };
    for name in &error.alternatives {
        if !allowed.contains(name) {
            allowed.push(name.clone());
        }
    }
    allowed
}

/// An element repeated where only one is allowed
///
/// When the error names an attribute, only earlier siblings with the same
/// value for it count as the first occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateElementHandler;

impl ErrorHandler for DuplicateElementHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(element) = &error.element else {
            return original_error(error);
        };
        let doc_path = ctx.path_to_doc_element_at(element, error.position);
        let Some((duplicate, parent)) = doc_path.split_last() else {
            return original_error(error);
        };

        let keyed = error.attribute.as_ref().and_then(|attribute| {
            let name = attribute.local_name();
            let value = duplicate
                .attribute(name)
                .map(str::to_string)
                .or_else(|| error.attribute_value.clone())?;
            Some((name.to_string(), value))
        });

        let siblings = ctx.doc_element_siblings(&doc_path, |candidate| {
            candidate.qname() == element
                && candidate.start() < duplicate.start()
                && keyed.as_ref().is_none_or(|(name, value)| {
                    candidate.attribute(name) == Some(value.as_str())
                })
        });
        let first = siblings.first().and_then(|path| path.last().copied());

        let name = element.local_name();
        match &keyed {
            Some((attribute, value)) => {
                let args = [name, attribute.as_str(), value.as_str()];
                let mut result = HandledResult::new(duplicate.start())
                    .with_primary_message(MessageKey::ElementWithAttributeDuplicated, args);
                if let Some(first) = first {
                    let key = MessageKey::ElementWithAttributeDuplicatedFirstOccurrence;
                    result.add_secondary_result(
                        HandledResult::new(first.start()).with_primary_message(key, args),
                    );
                }
                result
            }
            None => {
                let parent_name = parent.last().map_or("", |parent| parent.name());
                let mut result = HandledResult::new(duplicate.start())
                    .with_primary_message(MessageKey::ElementDuplicated, [name, parent_name]);
                if let Some(first) = first {
                    let key = MessageKey::ElementDuplicatedFirstOccurrence;
                    result.add_secondary_result(
                        HandledResult::new(first.start()).with_primary_message(key, [name]),
                    );
                }
                result
            }
        }
    }
}

/// A required child element is absent
///
/// Lists the names the validator gave, or else the grammar's children of the
/// element that are not present in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredElementMissingHandler;

impl ErrorHandler for RequiredElementMissingHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(element) = &error.element else {
            return original_error(error);
        };
        let doc_path = ctx.path_to_doc_element_at(element, error.position);

        let missing: Vec<String> = if error.alternatives.is_empty() {
            absent_children(ctx, &doc_path)
        } else {
            error.alternatives.iter().cloned().collect()
        };
        if missing.is_empty() {
            return original_error(error);
        }

        HandledResult::new(element_start(&doc_path, error.position)).with_primary_message(
            MessageKey::ElementRequiredMissing,
            [element.local_name().to_string(), format_list(ctx, &missing)],
        )
    }
}

fn absent_children(ctx: &ValidationContext, doc_path: &[&DocElement]) -> Vec<String> {
    if doc_path.is_empty() {
        return Vec::new();
    }

    let present: Vec<&QName> = ctx
        .paths_to_doc_element(|_| true)
        .into_iter()
        .filter(|path| path.len() == doc_path.len() + 1 && path.starts_with(doc_path))
        .filter_map(|path| path.last().copied().map(DocElement::qname))
        .collect();

    let schema_path = ctx.map_doc_path_to_schema_path(doc_path);
    ctx.elements_for_element(&schema_path)
        .into_iter()
        .filter(|child| !present.contains(&child.qname()))
        .map(|child| child.name().to_string())
        .collect()
}

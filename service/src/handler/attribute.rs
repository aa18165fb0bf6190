use super::{
    ErrorHandler, attribute_pattern, element_start, format_list, format_path, original_error,
    search_back_from, search_from,
};
use crate::context::ValidationContext;
use crate::suggest::suggest_similar;
use regex::Regex;
use schemadiag_core::{DocElement, HandledResult, MessageKey, Position, ValidationError};
use std::sync::LazyLock;

static TAG_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^/!?]").expect("Valid tag open regex pattern"));

/// Where `attribute=` is written on the element at the end of `doc_path`
fn attribute_position(
    ctx: &ValidationContext,
    doc_path: &[&DocElement],
    attribute: &str,
    fallback: Position,
) -> Position {
    let start = element_start(doc_path, fallback);
    attribute_pattern(attribute)
        .and_then(|pattern| search_from(ctx, start, &pattern))
        .unwrap_or(start)
}

/// An attribute the element does not accept
#[derive(Debug, Clone, Copy, Default)]
pub struct UnexpectedAttributeHandler;

impl ErrorHandler for UnexpectedAttributeHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let (Some(element), Some(attribute)) = (&error.element, &error.attribute) else {
            return original_error(error).possibly_malformed(true);
        };
        let name = attribute.local_name();
        let doc_path = ctx.path_to_doc_element_at(element, error.position);

        let position = attribute_position(ctx, &doc_path, name, error.position);
        let mut result = HandledResult::new(position)
            .with_primary_message(MessageKey::AttributeNotAllowed, [name, element.local_name()])
            .possibly_malformed(true);

        let schema_path = ctx.map_doc_path_to_schema_path(&doc_path);
        let mut allowed: Vec<String> =
            ctx.attributes_for_element(&schema_path).into_iter().collect();
        for alternative in &error.alternatives {
            if !allowed.contains(alternative) {
                allowed.push(alternative.clone());
            }
        }

        let max_distance = ctx.config().suggestions.max_edit_distance;
        if let Some(suggestion) =
            suggest_similar(name, allowed.iter().map(String::as_str), max_distance)
        {
            result.add_secondary_message(MessageKey::DidYouMean, [suggestion]);
        } else if !allowed.is_empty() {
            let listed = format_list(ctx, &allowed);
            result.add_secondary_message(MessageKey::AttributesAllowedHere, [listed]);
        } else if !schema_path.is_empty() {
            let key = MessageKey::ElementHasNoAttributes;
            result.add_secondary_message(key, [element.local_name()]);
        }

        let elsewhere: Vec<String> = ctx
            .alternate_elements_for_attribute(name)
            .iter()
            .map(|path| format_path(path))
            .collect();
        if !elsewhere.is_empty() {
            let listed = format_list(ctx, &elsewhere);
            let key = MessageKey::AttributeIsAllowedOn;
            result.add_secondary_message(key, [name.to_string(), listed]);
        }

        result
    }
}

/// The same attribute given twice on one start tag
///
/// The document is not well-formed, so the element is usually missing from
/// the document tree. The start tag is found by scanning back from the
/// reported position, and the primary position is the attribute's second
/// occurrence in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateAttributeHandler;

impl ErrorHandler for DuplicateAttributeHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(attribute) = &error.attribute else {
            return original_error(error);
        };
        let name = attribute.local_name();
        let Some(pattern) = attribute_pattern(name) else {
            return original_error(error);
        };

        let tag_start =
            search_back_from(ctx, error.position, &TAG_OPEN_REGEX).unwrap_or(error.position);
        let first = search_from(ctx, tag_start, &pattern);
        let second = first.and_then(|first| {
            search_from(ctx, Position::new(first.line(), first.column() + 1), &pattern)
        });

        HandledResult::new(second.or(first).unwrap_or(error.position))
            .with_primary_message(MessageKey::AttributeDuplicated, [name])
    }
}

/// A required attribute is absent
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredAttributeMissingHandler;

impl ErrorHandler for RequiredAttributeMissingHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(element) = &error.element else {
            return original_error(error);
        };
        let doc_path = ctx.path_to_doc_element_at(element, error.position);
        let result = HandledResult::new(element_start(&doc_path, error.position));

        match &error.attribute {
            Some(attribute) => result.with_primary_message(
                MessageKey::AttributeRequiredMissing,
                [element.local_name(), attribute.local_name()],
            ),
            None if !error.alternatives.is_empty() => result.with_primary_message(
                MessageKey::AttributeRequiredMissingList,
                [
                    element.local_name().to_string(),
                    format_list(ctx, &error.alternatives),
                ],
            ),
            None => original_error(error),
        }
    }
}

/// An attribute value outside the allowed set
///
/// Suggests the closest of the allowed values the validator listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidAttributeValueHandler;

impl ErrorHandler for InvalidAttributeValueHandler {
    fn handle(&self, ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        let Some(attribute) = &error.attribute else {
            return original_error(error);
        };
        let name = attribute.local_name();
        let doc_path = error
            .element
            .as_ref()
            .map(|element| ctx.path_to_doc_element_at(element, error.position))
            .unwrap_or_default();
        let value = error.attribute_value.clone().or_else(|| {
            doc_path
                .last()
                .and_then(|element| element.attribute(name))
                .map(str::to_string)
        });
        let Some(value) = value else {
            return original_error(error);
        };

        let position = attribute_position(ctx, &doc_path, name, error.position);
        let mut result = HandledResult::new(position)
            .with_primary_message(MessageKey::AttributeInvalidValue, [value.as_str(), name]);

        let max_distance = ctx.config().suggestions.max_edit_distance;
        if let Some(suggestion) =
            suggest_similar(&value, error.alternatives.iter().map(String::as_str), max_distance)
        {
            result.add_secondary_message(MessageKey::DidYouMean, [suggestion]);
        }

        result
    }
}

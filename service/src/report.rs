//! Plain-text rendering of handled results
//!
//! Printing sits at the integration boundary: a failure to write a
//! diagnostic is logged and swallowed, never returned to the caller.

use crate::context::ValidationContext;
use schemadiag_core::{HandledResult, MessageCatalog, MessageKey, Position};
use std::io;
use tracing::warn;

/// Renders [`HandledResult`]s against a document's source lines
#[derive(Debug, Clone)]
pub struct Reporter {
    catalog: MessageCatalog,
}

impl Reporter {
    #[must_use]
    pub fn new(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Header, then the result and its nested results with source excerpts
    #[must_use]
    pub fn render(&self, ctx: &ValidationContext, result: &HandledResult) -> String {
        let mut out = self
            .catalog
            .format(MessageKey::ValidationErrorIn, &[ctx.document_name()]);
        out.push('\n');
        self.render_result(ctx, result, 1, &mut out);
        out
    }

    /// Write a rendered result, logging instead of failing on I/O errors
    ///
    /// Returns whether the diagnostic was written.
    pub fn print<W: io::Write>(
        &self,
        ctx: &ValidationContext,
        result: &HandledResult,
        out: &mut W,
    ) -> bool {
        let rendered = self.render(ctx, result);
        match out.write_all(rendered.as_bytes()).and_then(|()| out.flush()) {
            Ok(()) => true,
            Err(e) => {
                let message = self.catalog.format(MessageKey::PrintFailure, &[e.to_string()]);
                warn!(document = %ctx.document_url(), "{message}");
                false
            }
        }
    }

    fn render_result(
        &self,
        ctx: &ValidationContext,
        result: &HandledResult,
        depth: usize,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let mut messages = result.render(&self.catalog).into_iter();
        let location = if result.position.is_known() {
            format!("{}: ", result.position)
        } else {
            String::new()
        };
        if let Some(primary) = messages.next() {
            out.push_str(&format!("{indent}{location}{primary}\n"));
        }
        for secondary in messages {
            out.push_str(&format!("{indent}  {secondary}\n"));
        }
        if let Some((line, caret)) = excerpt(ctx, result.position) {
            out.push_str(&format!("{indent}| {line}\n{indent}| {caret}\n"));
        }
        for nested in &result.secondary_results {
            self.render_result(ctx, nested, depth + 1, out);
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(MessageCatalog::english())
    }
}

/// The source line at `position` and a caret line under its column
fn excerpt(ctx: &ValidationContext, position: Position) -> Option<(String, String)> {
    if !position.is_known() {
        return None;
    }
    let line = usize::try_from(position.line() - 1).ok()?;
    let column = usize::try_from(position.column() - 1).ok()?;
    let text = ctx.extract_lines(line, line + 1).first()?;
    // Tabs keep their width under the caret
    let pad: String = text
        .chars()
        .take(column)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    Some((text.clone(), format!("{pad}^")))
}

use super::ErrorHandler;
use crate::context::ValidationContext;
use schemadiag_core::{HandledResult, MessageKey, ValidationError};

/// Passes the validator's own message through unchanged
///
/// Used for [`ErrorType::UnknownError`](schemadiag_core::ErrorType::UnknownError)
/// and for any type without a registered handler. Such errors often come
/// from a document that is not well-formed, so the result is flagged as
/// possibly malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownErrorHandler;

impl ErrorHandler for UnknownErrorHandler {
    fn handle(&self, _ctx: &ValidationContext, error: &ValidationError) -> HandledResult {
        HandledResult::new(error.position)
            .with_primary_message(MessageKey::Passthru, [error.display_message()])
            .possibly_malformed(true)
    }
}

//! Error sanitization
//!
//! Shrinks oversized errors to a minimal safe payload and truncates
//! overlong stack traces before they reach the reporting backend.

use std::borrow::Cow;

use crate::config::{CaptureConfig, StackSanitizeConfig};
use crate::exception::{CapturedError, Tags};

/// Strip an oversized error down to its message and stack, in place.
///
/// Tags, auxiliary data, and the explicit name are cleared; the default
/// name applies afterwards. Idempotent.
pub fn sanitize_oversized(error: &mut CapturedError) -> &mut CapturedError {
    error.name = None;
    error.tags = Tags::new();
    error.aux = serde_json::Map::new();
    error
}

/// Truncate a stack trace to the last complete line within the first
/// `max_length` characters.
///
/// Disabled configs, empty stacks, and stacks already under the limit pass
/// through unchanged. A truncated stack never ends mid-line: the cut lands
/// on the last line break at or before the limit when one exists.
pub fn sanitize_stack<'a>(stack: &'a str, config: &StackSanitizeConfig) -> Cow<'a, str> {
    if !config.enabled || stack.is_empty() {
        return Cow::Borrowed(stack);
    }
    if stack.len() < config.max_length {
        return Cow::Borrowed(stack);
    }

    let mut cutoff = config.max_length.min(stack.len());
    while !stack.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    match stack[..cutoff].rfind('\n') {
        Some(idx) => Cow::Owned(stack[..idx].to_string()),
        // Single overlong line: nothing complete fits, cut at the limit.
        None => Cow::Owned(stack[..cutoff].to_string()),
    }
}

/// Produce the error that will actually be forwarded, applying the
/// configured sanitization.
///
/// When `sanitize_exception` is set this builds a fresh error of the same
/// kind carrying only the message, the (possibly truncated) stack, and the
/// auxiliary-data carry-over. An explicit name is preserved; an absent one
/// stays absent so the default name applies. Disabled configs return the
/// original unchanged.
pub fn sanitize_error(error: &CapturedError, config: &CaptureConfig) -> CapturedError {
    if !config.sanitize_exception {
        return error.clone();
    }

    CapturedError {
        name: error.name.clone(),
        message: error.message.clone(),
        stack: error
            .stack
            .as_deref()
            .map(|stack| sanitize_stack(stack, &config.sanitize_stack).into_owned()),
        tags: Tags::new(),
        aux: error.aux.clone(),
    }
}

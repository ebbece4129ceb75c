//! Exception normalization
//!
//! Converts any thrown value into a uniform `(error, tags)` pair so the
//! reporter and decorator never have to reason about wrapper shapes.

use super::captured::{CapturedError, Tags};
use super::wrapped::{Caught, ExceptionFamily, WrappedException};

/// Normalize a thrown value into the canonical error plus its tags.
///
/// A recognized family member is unwrapped: the embedded error is renamed
/// to the wrapper's kind so the reported type reflects the semantic
/// exception, and the wrapper's tags travel with it. Anything else is the
/// error directly, with its own tags. Tags are always present, defaulting
/// to empty.
pub fn normalize(caught: Caught, family: &ExceptionFamily) -> (CapturedError, Tags) {
    match caught {
        Caught::Error(mut error) => {
            let tags = std::mem::take(&mut error.tags);
            (error, tags)
        }
        Caught::Wrapped(wrapped) => {
            if family.contains(&wrapped.kind) {
                unwrap_member(wrapped)
            } else {
                unwrap_foreign(wrapped)
            }
        }
    }
}

/// A recognized wrapper: the kind name is authoritative for the error type.
fn unwrap_member(wrapped: WrappedException) -> (CapturedError, Tags) {
    let kind_name = wrapped.kind.name().to_string();
    let tags = wrapped.tags;

    match wrapped.error {
        Some(mut inner) => {
            inner.rename(kind_name);
            inner.tags.clear();
            (inner, tags)
        }
        None => {
            let message = wrapped
                .response_message
                .unwrap_or_else(|| kind_name.clone());
            (CapturedError::named(kind_name, message), tags)
        }
    }
}

/// An unrecognized wrapper is treated as carrying the error directly: the
/// inner error keeps its own identity and supplies the tags.
fn unwrap_foreign(wrapped: WrappedException) -> (CapturedError, Tags) {
    match wrapped.error {
        Some(mut inner) => {
            let tags = std::mem::take(&mut inner.tags);
            (inner, tags)
        }
        None => {
            let message = wrapped
                .response_message
                .unwrap_or_else(|| wrapped.kind.name().to_string());
            let error = CapturedError::named(wrapped.kind.name(), message);
            (error, wrapped.tags)
        }
    }
}

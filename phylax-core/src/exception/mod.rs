//! Canonical errors, semantic exception wrappers, and normalization
//!
//! Everything an instrumented application can throw funnels through this
//! module: plain [`CapturedError`]s, [`WrappedException`]s carrying a
//! recognized [`ExceptionKind`], and the [`Caught`] union that joins the
//! two shapes at the capture boundary.

mod captured;
mod normalize;
mod wrapped;

pub use captured::{CapturedError, TagValue, Tags, DEFAULT_ERROR_NAME};
pub use normalize::normalize;
pub use wrapped::{
    Caught, ExceptionFamily, ExceptionKind, WrappedException, UNCAUGHT_PANIC,
    UNHANDLED_REJECTION,
};

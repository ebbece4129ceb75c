//! Interception of application operations
//!
//! This module provides:
//! - [`Interceptor`]: higher-order wrapping with catch/emit/rethrow
//!   semantics and optional span bracketing
//! - [`InterceptOptions`]/[`InterceptPolicy`]: the two call shapes as one
//!   tagged union
//! - [`ExceptionChannel`]: the process-wide channel `handle_only`
//!   dispositions emit to

mod channel;
mod decorator;
mod options;

pub use channel::ExceptionChannel;
pub use decorator::Interceptor;
pub use options::{InterceptOptions, InterceptPolicy};

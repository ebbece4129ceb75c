//! Process panic interception
//!
//! Installs a panic hook that converts panics into `UncaughtPanic`
//! exceptions on the shared channel, so subscribed handlers see process
//! failures through the same path as handled exceptions. The previously
//! installed hook still runs afterwards.

use serde_json::json;
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::Arc;

use crate::exception::{CapturedError, WrappedException, UNCAUGHT_PANIC};
use crate::intercept::ExceptionChannel;

/// Install the panic hook. Call once at startup.
pub fn install_panic_hook(channel: Arc<ExceptionChannel>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let caught = panic_to_exception(info);
        tracing::error!("uncaught panic: {}", caught);
        channel.emit(caught.into());
        previous(info);
    }));
}

fn panic_to_exception(info: &PanicHookInfo<'_>) -> WrappedException {
    let mut error = CapturedError::new(payload_message(info));
    error.stack = Some(Backtrace::force_capture().to_string());
    if let Some(location) = info.location() {
        error = error.aux_entry("location", json!(location.to_string()));
    }
    WrappedException::wrap(UNCAUGHT_PANIC, error)
}

fn payload_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_reach_channel_subscribers() {
        let channel = Arc::new(ExceptionChannel::new(8));
        let mut rx = channel.subscribe();

        let original = std::panic::take_hook();
        install_panic_hook(channel);
        let result = std::panic::catch_unwind(|| panic!("hook test boom"));
        std::panic::set_hook(original);

        assert!(result.is_err());
        let caught = rx.try_recv().expect("panic should have been emitted");
        assert_eq!(caught.message(), "hook test boom");
        match caught {
            crate::exception::Caught::Wrapped(wrapped) => {
                assert_eq!(wrapped.kind, UNCAUGHT_PANIC);
                assert!(wrapped.error.unwrap().stack.is_some());
            }
            other => panic!("expected wrapped exception, got {other}"),
        }
    }
}

//! Error handling for FFI boundary
//!
//! This module provides utilities for safely propagating errors
//! across the FFI boundary without panics or undefined behavior.

use std::any::Any;
use std::panic;

use tracing::warn;

use crate::handles::HandleError;
use crate::memory::set_last_error;
use crate::types::PolyglotResult;

/// Convert a Polyglot core error to an FFI result code
pub fn map_core_error(error: polyglot_core::Error) -> PolyglotResult {
    use polyglot_core::Error;

    set_last_error(error.to_string());
    match error {
        Error::Configuration { .. } | Error::Resource { .. } => PolyglotResult::ConfigParseError,
        Error::Translation { .. } => PolyglotResult::TranslationFailure,
        Error::Cancelled { .. } => PolyglotResult::Cancelled,
        Error::Validation { .. } => PolyglotResult::InternalError,
    }
}

/// Convert a rejected handle to an FFI result code
pub fn map_handle_error(error: HandleError) -> PolyglotResult {
    warn!(%error, "Rejected handle");
    set_last_error(error.to_string());
    match error {
        HandleError::Exhausted(_) => PolyglotResult::AllocationFailure,
        _ => PolyglotResult::InvalidHandle,
    }
}

/// Safely execute a closure that might panic
///
/// This function catches any panics and converts them to appropriate
/// error codes, preventing undefined behavior at the FFI boundary.
pub fn catch_panic<F, R>(f: F) -> Result<R, PolyglotResult>
where
    F: FnOnce() -> Result<R, PolyglotResult> + panic::UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(result) => result,
        Err(panic_info) => {
            let msg = get_panic_message(&panic_info);
            set_last_error(format!("Panic occurred: {}", msg));
            Err(PolyglotResult::InternalError)
        }
    }
}

/// Extract a message from panic info
fn get_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

/// Macro for safely executing FFI functions
#[macro_export]
macro_rules! ffi_boundary {
    ($body:expr) => {{
        match $crate::error::catch_panic(|| $body) {
            Ok(result) => result,
            Err(code) => return code,
        }
    }};
}

/// Validate that a mutable pointer is not null
pub fn validate_mut_ptr<T>(ptr: *mut T, name: &str) -> Result<(), PolyglotResult> {
    if ptr.is_null() {
        set_last_error(format!("{} is null", name));
        Err(PolyglotResult::NullPointer)
    } else {
        Ok(())
    }
}

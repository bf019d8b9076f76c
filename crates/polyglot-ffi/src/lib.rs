//! Polyglot FFI - C ABI for batch and pivot translation
//!
//! This crate exposes services and models as opaque `u64` handles, runs
//! blocking batch and pivot translations, and transfers the results to the
//! caller as owned string arrays.
//!
//! # Safety
//!
//! Functions taking raw pointers are marked `unsafe`. Callers must ensure:
//! - Every result array is released exactly once with
//!   `polyglot_string_array_free`, or with `polyglot_free_strings` using the
//!   length it was returned with
//! - Input strings are valid, null-terminated UTF-8
//! - Out-parameters point to writable memory
//!
//! Handle misuse (null, deleted, or wrong-kind handles) and bad frees are
//! detected and reported through `PolyglotResult` codes; the message for the
//! last failure on a thread is available from `polyglot_get_last_error`.

#![warn(missing_docs)]

#[macro_use]
mod error;
mod api;
mod handles;
mod memory;
mod registry;
mod types;

// Re-export public API
pub use api::*;
pub use memory::{
    live_string_arrays, polyglot_clear_error, polyglot_free_strings, polyglot_get_last_error,
    polyglot_string_array_free,
};
pub use types::{
    PolyglotCancelTokenHandle, PolyglotModelHandle, PolyglotResult, PolyglotServiceHandle,
    PolyglotStringArray, POLYGLOT_NULL_HANDLE,
};

//! FFI-safe type definitions
//!
//! All types in this module are designed to be safely passed across
//! the FFI boundary with C ABI compatibility.

use std::os::raw::c_char;
use std::ptr;

/// Result codes for FFI operations
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyglotResult {
    /// Operation completed successfully
    Success = 0,
    /// Handle is null, stale, already deleted, or of the wrong kind
    InvalidHandle = -1,
    /// Model configuration is malformed or references missing resources
    ConfigParseError = -2,
    /// The engine failed to translate an input
    TranslationFailure = -3,
    /// Memory for the result could not be allocated
    AllocationFailure = -4,
    /// Null pointer provided where a value is required
    NullPointer = -5,
    /// Input text is not valid UTF-8
    Utf8Error = -6,
    /// Count passed to a free call does not match the producing call
    CountMismatch = -7,
    /// Batch cancelled through its cancellation token
    Cancelled = -8,
    /// Internal error, including caught panics
    InternalError = -9,
}

/// Handle to a translation service; 0 is never a valid handle
pub type PolyglotServiceHandle = u64;

/// Handle to a loaded model; 0 is never a valid handle
pub type PolyglotModelHandle = u64;

/// Handle to a cancellation token; 0 means "no token"
pub type PolyglotCancelTokenHandle = u64;

/// The null handle value
pub const POLYGLOT_NULL_HANDLE: u64 = 0;

/// Caller-owned array of NUL-terminated UTF-8 strings
///
/// `data` is null exactly when `len` is 0. `id` is a serial number that is
/// never reused; it is 0 only for the empty array. Release with
/// `polyglot_string_array_free`, or with `polyglot_free_strings(data, len)`.
#[repr(C)]
#[derive(Debug)]
pub struct PolyglotStringArray {
    /// Pointer to `len` string pointers
    pub data: *mut *mut c_char,
    /// Number of strings
    pub len: usize,
    /// Serial number of this allocation
    pub id: u64,
}

impl PolyglotStringArray {
    /// An array holding no strings and no allocation
    pub fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
            id: 0,
        }
    }
}

impl PolyglotResult {
    /// Check if the result indicates success
    pub fn is_success(self) -> bool {
        self == PolyglotResult::Success
    }

    /// Get a human-readable error message
    pub fn error_message(self) -> &'static str {
        match self {
            PolyglotResult::Success => "Success",
            PolyglotResult::InvalidHandle => "Invalid handle",
            PolyglotResult::ConfigParseError => "Model configuration could not be parsed",
            PolyglotResult::TranslationFailure => "Translation failed",
            PolyglotResult::AllocationFailure => "Memory allocation failed",
            PolyglotResult::NullPointer => "Null pointer provided",
            PolyglotResult::Utf8Error => "Invalid UTF-8 string",
            PolyglotResult::CountMismatch => "String count does not match the array",
            PolyglotResult::Cancelled => "Operation cancelled",
            PolyglotResult::InternalError => "Internal error",
        }
    }
}

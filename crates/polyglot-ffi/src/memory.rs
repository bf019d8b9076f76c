//! Memory management utilities for FFI
//!
//! This module owns the thread-local error slot, input string decoding and
//! the transfer of result string arrays to the caller. Every array handed
//! out is recorded with a serial number until it is freed, so double frees
//! and mismatched counts are rejected instead of corrupting the heap.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::types::{PolyglotResult, PolyglotStringArray};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// An array currently owned by a caller
#[derive(Debug, Clone, Copy)]
struct LiveArray {
    id: u64,
    len: usize,
}

/// Arrays currently owned by callers, keyed by data address
static LIVE_ARRAYS: Mutex<BTreeMap<usize, LiveArray>> = Mutex::new(BTreeMap::new());

/// Serial numbers for handed-out arrays; 0 is reserved for the empty array
static NEXT_ARRAY_ID: AtomicU64 = AtomicU64::new(1);

/// Lock a global table, recovering it if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Set the last error message for the current thread
pub fn set_last_error<S: Into<String>>(err: S) {
    let mut message = err.into();
    message.retain(|c| c != '\0');
    let error_string = CString::new(message).unwrap_or_default();

    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(error_string);
    });
}

/// Clear the last error message
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Convert a C string to a Rust string
///
/// # Safety
/// The pointer must be null or a valid null-terminated C string
pub unsafe fn c_str_to_string(s: *const c_char, name: &str) -> Result<String, PolyglotResult> {
    if s.is_null() {
        set_last_error(format!("{} is null", name));
        return Err(PolyglotResult::NullPointer);
    }

    match CStr::from_ptr(s).to_str() {
        Ok(str) => Ok(str.to_string()),
        Err(e) => {
            set_last_error(format!("Invalid UTF-8 in {}: {}", name, e));
            Err(PolyglotResult::Utf8Error)
        }
    }
}

/// Decode `count` input strings
///
/// # Safety
/// When `count` is non-zero, `inputs` must point to `count` readable
/// pointers, each null or a valid null-terminated C string.
pub unsafe fn read_input_strings(
    inputs: *const *const c_char,
    count: usize,
) -> Result<Vec<String>, PolyglotResult> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if inputs.is_null() {
        set_last_error(format!("inputs is null but count is {}", count));
        return Err(PolyglotResult::NullPointer);
    }

    (0..count)
        .map(|i| c_str_to_string(*inputs.add(i), &format!("inputs[{}]", i)))
        .collect()
}

/// Hand `strings` to the caller as an owned array
///
/// Nothing is transferred on error: either every string is converted or
/// the caller gets no array at all.
pub fn into_string_array<I>(strings: I) -> Result<PolyglotStringArray, PolyglotResult>
where
    I: IntoIterator<Item = String>,
{
    let strings: Vec<CString> = strings
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            CString::new(s).map_err(|_| {
                set_last_error(format!("Translation of input {} contains a NUL byte", i));
                PolyglotResult::TranslationFailure
            })
        })
        .collect::<Result<_, _>>()?;

    if strings.is_empty() {
        return Ok(PolyglotStringArray::empty());
    }

    let mut pointers: Vec<*mut c_char> = Vec::new();
    if pointers.try_reserve_exact(strings.len()).is_err() {
        set_last_error(format!("Failed to allocate an array of {} strings", strings.len()));
        return Err(PolyglotResult::AllocationFailure);
    }
    pointers.extend(strings.into_iter().map(CString::into_raw));

    let len = pointers.len();
    let id = NEXT_ARRAY_ID.fetch_add(1, Ordering::Relaxed);
    let data = Box::into_raw(pointers.into_boxed_slice()) as *mut *mut c_char;
    lock(&LIVE_ARRAYS).insert(data as usize, LiveArray { id, len });

    Ok(PolyglotStringArray { data, len, id })
}

/// Number of arrays handed out and not yet freed
pub fn live_string_arrays() -> usize {
    lock(&LIVE_ARRAYS).len()
}

/// Free a string array returned by a translate or pivot call
///
/// `count` must be the length reported with the array. Freeing `NULL`
/// with a count of 0 is a no-op. An array that was already freed, was not
/// produced by this library, or is passed with the wrong count is left
/// untouched and an error is returned.
///
/// Only the address is known here, so a stale pointer whose address has
/// since been reused by a newer live array cannot be told apart from that
/// array. `polyglot_string_array_free` also checks the array serial and
/// rejects that case.
///
/// # Safety
/// `strings` must be null or a pointer previously returned in a
/// `PolyglotStringArray`; its strings must not have been modified in place
/// beyond their original length.
#[no_mangle]
pub unsafe extern "C" fn polyglot_free_strings(
    strings: *mut *mut c_char,
    count: usize,
) -> PolyglotResult {
    clear_last_error();
    release(strings, count, None)
}

/// Free a string array and reset it to the empty array
///
/// The array serial must match the live array at `data`, so freeing a
/// stale copy of an array fails with `InvalidHandle` even after its
/// address has been handed out again. A null `array` is a `NullPointer`
/// error; an array that is already empty is a no-op.
///
/// # Safety
/// `array` must be null or point to a `PolyglotStringArray` filled in by a
/// translate or pivot call.
#[no_mangle]
pub unsafe extern "C" fn polyglot_string_array_free(array: *mut PolyglotStringArray) -> PolyglotResult {
    clear_last_error();

    if array.is_null() {
        set_last_error("array is null");
        return PolyglotResult::NullPointer;
    }

    let result = release((*array).data, (*array).len, Some((*array).id));
    if result.is_success() {
        *array = PolyglotStringArray::empty();
    }
    result
}

/// Unregister and drop a live array
///
/// `id` is checked against the recorded serial when the caller has it.
unsafe fn release(strings: *mut *mut c_char, count: usize, id: Option<u64>) -> PolyglotResult {
    if strings.is_null() {
        if count == 0 {
            return PolyglotResult::Success;
        }
        set_last_error(format!("strings is null but count is {}", count));
        return PolyglotResult::NullPointer;
    }

    {
        let mut live = lock(&LIVE_ARRAYS);
        match live.get(&(strings as usize)).copied() {
            None => {
                warn!("Rejected free of an unknown or already freed string array");
                set_last_error("String array was already freed or was not allocated by polyglot");
                return PolyglotResult::InvalidHandle;
            }
            Some(entry) if id.is_some_and(|id| id != entry.id) => {
                warn!(expected = entry.id, got = ?id, "Rejected free of a stale string array");
                set_last_error("String array was already freed; its address now belongs to another array");
                return PolyglotResult::InvalidHandle;
            }
            Some(entry) if entry.len != count => {
                warn!(expected = entry.len, got = count, "Rejected free with mismatched count");
                set_last_error(format!(
                    "String array holds {} strings but count is {}",
                    entry.len, count
                ));
                return PolyglotResult::CountMismatch;
            }
            Some(_) => {
                live.remove(&(strings as usize));
            }
        }
    }

    let pointers = Box::from_raw(ptr::slice_from_raw_parts_mut(strings, count));
    for &s in pointers.iter() {
        if !s.is_null() {
            drop(CString::from_raw(s));
        }
    }

    PolyglotResult::Success
}

/// Get the last error message
///
/// # Safety
/// Returns a pointer that should NOT be freed by the caller. It stays
/// valid until the next polyglot call on the same thread.
#[no_mangle]
pub unsafe extern "C" fn polyglot_get_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(err) => err.as_ptr(),
        None => ptr::null(),
    })
}

/// Clear the last error message
#[no_mangle]
pub extern "C" fn polyglot_clear_error() {
    clear_last_error();
}

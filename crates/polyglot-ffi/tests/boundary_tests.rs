//! FFI boundary tests
//!
//! These tests verify the safety and correctness of the FFI layer,
//! including null pointer handling, handle validation, memory management
//! and error propagation.

use polyglot_ffi::*;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Helper to convert Rust string to C string
fn to_c_string(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// Helper to convert C string pointer to Rust string
unsafe fn from_c_string(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

fn new_model(config: &str) -> PolyglotModelHandle {
    let config = to_c_string(config);
    let mut model = POLYGLOT_NULL_HANDLE;
    let result = unsafe { polyglot_model_new(config.as_ptr(), &mut model) };
    assert_eq!(result, PolyglotResult::Success);
    model
}

unsafe fn collect(array: &PolyglotStringArray) -> Vec<String> {
    (0..array.len)
        .map(|i| from_c_string(*array.data.add(i)))
        .collect()
}

#[test]
fn test_null_pointer_handling() {
    unsafe {
        let service = polyglot_service_new(0);
        let model = new_model("lexicon: {hello: hola}");

        // Null output pointer
        let inputs = [to_c_string("hello")];
        let pointers: Vec<*const c_char> = inputs.iter().map(|s| s.as_ptr()).collect();
        let result =
            polyglot_service_translate(service, model, pointers.as_ptr(), 1, ptr::null_mut());
        assert_eq!(result, PolyglotResult::NullPointer);

        // Error message should be set
        let error = polyglot_get_last_error();
        assert!(!error.is_null());

        // Clear error
        polyglot_clear_error();
        assert!(polyglot_get_last_error().is_null());

        // Null inputs with a non-zero count
        let mut out = PolyglotStringArray::empty();
        let result = polyglot_service_translate(service, model, ptr::null(), 2, &mut out);
        assert_eq!(result, PolyglotResult::NullPointer);
        assert!(out.data.is_null());

        // Null config
        let mut handle = POLYGLOT_NULL_HANDLE;
        assert_eq!(polyglot_model_new(ptr::null(), &mut handle), PolyglotResult::NullPointer);
        assert_eq!(handle, POLYGLOT_NULL_HANDLE);

        polyglot_model_delete(model);
        polyglot_service_delete(service);
    }
}

#[test]
fn test_invalid_utf8_handling() {
    unsafe {
        let service = polyglot_service_new(0);
        let model = new_model("lexicon: {hello: hola}");

        // Create invalid UTF-8 sequence
        let invalid_utf8 = [0xFFu8, 0xFE, 0x00];
        let pointers = [invalid_utf8.as_ptr() as *const c_char];

        let mut out = PolyglotStringArray::empty();
        let result = polyglot_service_translate(service, model, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::Utf8Error);
        assert!(from_c_string(polyglot_get_last_error()).contains("inputs[0]"));

        let mut handle = POLYGLOT_NULL_HANDLE;
        let result = polyglot_model_new(invalid_utf8.as_ptr() as *const c_char, &mut handle);
        assert_eq!(result, PolyglotResult::Utf8Error);

        polyglot_model_delete(model);
        polyglot_service_delete(service);
    }
}

#[test]
fn test_config_parse_error() {
    unsafe {
        let config = to_c_string("not: valid: yaml: ::");
        let mut model = POLYGLOT_NULL_HANDLE;

        let result = polyglot_model_new(config.as_ptr(), &mut model);
        assert_eq!(result, PolyglotResult::ConfigParseError);
        assert_eq!(model, POLYGLOT_NULL_HANDLE);

        let error_msg = from_c_string(polyglot_get_last_error());
        assert!(error_msg.contains("Configuration"));
    }
}

#[test]
fn test_stale_handles_rejected() {
    unsafe {
        let service = polyglot_service_new(4);
        let model = new_model("lexicon: {hello: hola}");
        assert_eq!(polyglot_model_delete(model), PolyglotResult::Success);

        let inputs = [to_c_string("hello")];
        let pointers: Vec<*const c_char> = inputs.iter().map(|s| s.as_ptr()).collect();
        let mut out = PolyglotStringArray::empty();

        // Deleted model
        let result = polyglot_service_translate(service, model, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::InvalidHandle);
        assert!(out.data.is_null());

        // Double delete
        assert_eq!(polyglot_model_delete(model), PolyglotResult::InvalidHandle);

        // Handles of the wrong kind and garbage values
        let other = new_model("lexicon: {hello: hallo}");
        let result = polyglot_service_translate(other, other, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::InvalidHandle);
        let result = polyglot_service_translate(service, 12345, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::InvalidHandle);

        // The service still works after all of that
        let result = polyglot_service_translate(service, other, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::Success);
        assert_eq!(collect(&out), vec!["hallo"]);
        assert_eq!(polyglot_string_array_free(&mut out), PolyglotResult::Success);

        // Deleted service
        assert_eq!(polyglot_service_delete(service), PolyglotResult::Success);
        let result = polyglot_service_translate(service, other, pointers.as_ptr(), 1, &mut out);
        assert_eq!(result, PolyglotResult::InvalidHandle);
        assert_eq!(polyglot_service_delete(service), PolyglotResult::InvalidHandle);

        polyglot_model_delete(other);
    }
}

#[test]
fn test_free_detects_misuse() {
    unsafe {
        let service = polyglot_service_new(0);
        let model = new_model("lexicon: {hello: hola, world: mundo}");

        let inputs = [to_c_string("hello"), to_c_string("world")];
        let pointers: Vec<*const c_char> = inputs.iter().map(|s| s.as_ptr()).collect();
        let mut out = PolyglotStringArray::empty();
        let result = polyglot_service_translate(service, model, pointers.as_ptr(), 2, &mut out);
        assert_eq!(result, PolyglotResult::Success);

        // Wrong count leaves the array intact
        assert_eq!(polyglot_free_strings(out.data, 3), PolyglotResult::CountMismatch);
        assert_eq!(collect(&out), vec!["hola", "mundo"]);

        assert_eq!(polyglot_free_strings(out.data, out.len), PolyglotResult::Success);
        assert_eq!(polyglot_free_strings(out.data, out.len), PolyglotResult::InvalidHandle);

        // A pointer we never handed out
        let mut foreign: [*mut c_char; 1] = [ptr::null_mut()];
        assert_eq!(
            polyglot_free_strings(foreign.as_mut_ptr(), 1),
            PolyglotResult::InvalidHandle
        );

        polyglot_model_delete(model);
        polyglot_service_delete(service);
    }
}

#[test]
fn test_stale_array_free_after_address_reuse() {
    unsafe {
        let service = polyglot_service_new(0);
        let model = new_model("lexicon: {hello: hola, world: mundo}");

        let inputs = [to_c_string("hello"), to_c_string("world")];
        let pointers: Vec<*const c_char> = inputs.iter().map(|s| s.as_ptr()).collect();

        // Same-sized arrays in a loop, so freed addresses get handed out again
        let mut out = PolyglotStringArray::empty();
        let mut stale: Option<PolyglotStringArray> = None;
        for _ in 0..32 {
            let result = polyglot_service_translate(service, model, pointers.as_ptr(), 2, &mut out);
            assert_eq!(result, PolyglotResult::Success);

            if let Some(mut old) = stale.take() {
                assert_eq!(polyglot_string_array_free(&mut old), PolyglotResult::InvalidHandle);
                assert!(!old.data.is_null());
            }

            // The owner's array is untouched and still frees cleanly
            assert_eq!(collect(&out), vec!["hola", "mundo"]);
            stale = Some(PolyglotStringArray {
                data: out.data,
                len: out.len,
                id: out.id,
            });
            assert_eq!(polyglot_string_array_free(&mut out), PolyglotResult::Success);
            assert!(out.data.is_null());
        }

        polyglot_model_delete(model);
        polyglot_service_delete(service);
    }
}

#[test]
fn test_null_array_struct_is_null_pointer() {
    unsafe {
        assert_eq!(polyglot_string_array_free(ptr::null_mut()), PolyglotResult::NullPointer);
        assert!(!polyglot_get_last_error().is_null());

        let mut empty = PolyglotStringArray::empty();
        assert_eq!(polyglot_string_array_free(&mut empty), PolyglotResult::Success);
    }
}

#[test]
fn test_version_string() {
    unsafe {
        let version = polyglot_version();
        assert!(!version.is_null());

        let version_str = from_c_string(version);
        assert!(version_str.contains("polyglot"));

        // Version string should NOT be freed (it's static)
    }
}

#[test]
fn test_concurrent_access() {
    use std::thread;

    let model = new_model("lexicon: {hello: hola}");
    let shared_service = polyglot_service_new(8);

    let threads: Vec<_> = (0..10)
        .map(|i| {
            thread::spawn(move || unsafe {
                // Half the threads share a service, half use their own
                let own = i % 2 == 0;
                let service = if own { polyglot_service_new(8) } else { shared_service };

                let inputs = [to_c_string("hello"), to_c_string(&format!("test{}", i))];
                let pointers: Vec<*const c_char> = inputs.iter().map(|s| s.as_ptr()).collect();
                let mut out = PolyglotStringArray::empty();

                let result =
                    polyglot_service_translate(service, model, pointers.as_ptr(), 2, &mut out);
                assert_eq!(result, PolyglotResult::Success);
                assert_eq!(collect(&out), vec!["hola".to_string(), format!("test{}", i)]);
                assert_eq!(polyglot_free_strings(out.data, out.len), PolyglotResult::Success);

                if own {
                    assert_eq!(polyglot_service_delete(service), PolyglotResult::Success);
                }
            })
        })
        .collect();

    // Wait for all threads
    for t in threads {
        t.join().unwrap();
    }

    polyglot_service_delete(shared_service);
    polyglot_model_delete(model);
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[test]
    fn test_large_input_handling() {
        unsafe {
            let service = polyglot_service_new(0);
            let model = new_model("lexicon: {x: y}");

            // Create a large input (1MB)
            let large = to_c_string(&"x ".repeat(512 * 1024));
            let pointers = [large.as_ptr()];
            let mut out = PolyglotStringArray::empty();

            let result = polyglot_service_translate(service, model, pointers.as_ptr(), 1, &mut out);
            assert_eq!(result, PolyglotResult::Success);
            assert_eq!(out.len, 1);
            let translated = CStr::from_ptr(*out.data);
            assert_eq!(translated.to_bytes().len(), 1024 * 1024);
            assert!(translated.to_bytes().starts_with(b"y y"));

            polyglot_string_array_free(&mut out);
            polyglot_model_delete(model);
            polyglot_service_delete(service);
        }
    }

    #[test]
    fn test_repeated_allocations() {
        // Test repeated allocations and deallocations
        for _ in 0..100 {
            let service = polyglot_service_new(1);
            assert_ne!(service, POLYGLOT_NULL_HANDLE);
            assert_eq!(polyglot_service_delete(service), PolyglotResult::Success);
        }
    }
}

//! FFI API function definitions
//!
//! This module contains the extern "C" functions that form
//! the public API of the Polyglot FFI layer.

use std::os::raw::c_char;
use std::path::Path;

use polyglot_core::{BlockingService, CancellationToken, ServiceConfig, TranslationModel};
use tracing::debug;

use crate::error::{catch_panic, map_core_error, validate_mut_ptr};
use crate::ffi_boundary;
use crate::memory::{
    c_str_to_string, clear_last_error, into_string_array, lock, read_input_strings, set_last_error,
};
use crate::registry;
use crate::types::{
    PolyglotCancelTokenHandle, PolyglotModelHandle, PolyglotResult, PolyglotServiceHandle,
    PolyglotStringArray, POLYGLOT_NULL_HANDLE,
};

/// Create a new translation service
///
/// `cache_size` bounds the number of cached translations; 0 disables the
/// cache. Returns the null handle only if no handle could be allocated.
#[no_mangle]
pub extern "C" fn polyglot_service_new(cache_size: usize) -> PolyglotServiceHandle {
    clear_last_error();

    let created = catch_panic(|| {
        let service = BlockingService::new(ServiceConfig::with_cache_size(cache_size));
        registry::insert_service(service)
    });

    match created {
        Ok(handle) => {
            debug!(handle, cache_size, "Created service");
            handle
        }
        Err(_) => POLYGLOT_NULL_HANDLE,
    }
}

/// Delete a translation service
///
/// Returns `InvalidHandle` for a null, stale or already deleted handle.
/// A call running on this service at the same time finishes normally.
#[no_mangle]
pub extern "C" fn polyglot_service_delete(service: PolyglotServiceHandle) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        registry::remove_service(service)?;
        debug!(handle = service, "Deleted service");
        Ok(PolyglotResult::Success)
    })
}

/// Load a model from a YAML configuration
///
/// # Parameters
/// - `config_yaml`: model options as YAML text
/// - `out_model`: receives the model handle, or the null handle on error
///
/// # Returns
/// `ConfigParseError` when the configuration is malformed or references
/// resources that are not available
///
/// # Safety
/// `config_yaml` must be a valid null-terminated C string and `out_model`
/// must be writable.
#[no_mangle]
pub unsafe extern "C" fn polyglot_model_new(
    config_yaml: *const c_char,
    out_model: *mut PolyglotModelHandle,
) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        validate_mut_ptr(out_model, "out_model")?;
        *out_model = POLYGLOT_NULL_HANDLE;

        let config = c_str_to_string(config_yaml, "config_yaml")?;
        let model = TranslationModel::from_config(&config).map_err(map_core_error)?;

        *out_model = registry::insert_model(model)?;
        Ok(PolyglotResult::Success)
    })
}

/// Load a model, resolving relative resource paths against `paths_dir`
///
/// # Safety
/// `config_yaml` and `paths_dir` must be valid null-terminated C strings
/// and `out_model` must be writable.
#[no_mangle]
pub unsafe extern "C" fn polyglot_model_new_in(
    config_yaml: *const c_char,
    paths_dir: *const c_char,
    out_model: *mut PolyglotModelHandle,
) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        validate_mut_ptr(out_model, "out_model")?;
        *out_model = POLYGLOT_NULL_HANDLE;

        let config = c_str_to_string(config_yaml, "config_yaml")?;
        let paths_dir = c_str_to_string(paths_dir, "paths_dir")?;
        let model = TranslationModel::from_config_in(&config, Path::new(&paths_dir))
            .map_err(map_core_error)?;

        *out_model = registry::insert_model(model)?;
        Ok(PolyglotResult::Success)
    })
}

/// Delete a model
///
/// Results already returned stay valid. Later calls that pass this handle
/// fail with `InvalidHandle`.
#[no_mangle]
pub extern "C" fn polyglot_model_delete(model: PolyglotModelHandle) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        let model = registry::remove_model(model)?;
        debug!(model = %model.id(), "Deleted model");
        Ok(PolyglotResult::Success)
    })
}

/// Translate `count` strings with `model`
///
/// # Parameters
/// - `inputs`: `count` null-terminated UTF-8 strings (may be null when
///   `count` is 0)
/// - `out`: receives exactly `count` strings in input order
///
/// # Safety
/// - `inputs` must point to `count` valid C string pointers
/// - `out` must be writable; its strings must be released with
///   `polyglot_string_array_free(out)`
#[no_mangle]
pub unsafe extern "C" fn polyglot_service_translate(
    service: PolyglotServiceHandle,
    model: PolyglotModelHandle,
    inputs: *const *const c_char,
    count: usize,
    out: *mut PolyglotStringArray,
) -> PolyglotResult {
    ffi_boundary!({
        run_batch(service, Route::Direct(model), inputs, count, POLYGLOT_NULL_HANDLE, out)
    })
}

/// Translate `count` strings through `first` and then `second`
///
/// Only the final translations are returned.
///
/// # Safety
/// Same requirements as `polyglot_service_translate`.
#[no_mangle]
pub unsafe extern "C" fn polyglot_service_pivot(
    service: PolyglotServiceHandle,
    first: PolyglotModelHandle,
    second: PolyglotModelHandle,
    inputs: *const *const c_char,
    count: usize,
    out: *mut PolyglotStringArray,
) -> PolyglotResult {
    ffi_boundary!({
        run_batch(service, Route::Pivot(first, second), inputs, count, POLYGLOT_NULL_HANDLE, out)
    })
}

/// `polyglot_service_translate` that stops with `Cancelled` once `token`
/// is cancelled
///
/// # Safety
/// Same requirements as `polyglot_service_translate`.
#[no_mangle]
pub unsafe extern "C" fn polyglot_service_translate_cancellable(
    service: PolyglotServiceHandle,
    model: PolyglotModelHandle,
    inputs: *const *const c_char,
    count: usize,
    token: PolyglotCancelTokenHandle,
    out: *mut PolyglotStringArray,
) -> PolyglotResult {
    ffi_boundary!({ run_batch(service, Route::Direct(model), inputs, count, token, out) })
}

/// `polyglot_service_pivot` that stops with `Cancelled` once `token` is
/// cancelled
///
/// # Safety
/// Same requirements as `polyglot_service_translate`.
#[no_mangle]
pub unsafe extern "C" fn polyglot_service_pivot_cancellable(
    service: PolyglotServiceHandle,
    first: PolyglotModelHandle,
    second: PolyglotModelHandle,
    inputs: *const *const c_char,
    count: usize,
    token: PolyglotCancelTokenHandle,
    out: *mut PolyglotStringArray,
) -> PolyglotResult {
    ffi_boundary!({ run_batch(service, Route::Pivot(first, second), inputs, count, token, out) })
}

/// Create a cancellation token
#[no_mangle]
pub extern "C" fn polyglot_cancel_token_new() -> PolyglotCancelTokenHandle {
    clear_last_error();
    catch_panic(|| registry::insert_token(CancellationToken::new()))
        .unwrap_or(POLYGLOT_NULL_HANDLE)
}

/// Cancel every call running with `token`; may be called from any thread
#[no_mangle]
pub extern "C" fn polyglot_cancel_token_cancel(token: PolyglotCancelTokenHandle) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        match registry::resolve_token(token)? {
            Some(token) => token.cancel(),
            None => {
                set_last_error("token is null");
                return Err(PolyglotResult::InvalidHandle);
            }
        }
        Ok(PolyglotResult::Success)
    })
}

/// Delete a cancellation token
///
/// Calls already running with the token keep observing it.
#[no_mangle]
pub extern "C" fn polyglot_cancel_token_delete(token: PolyglotCancelTokenHandle) -> PolyglotResult {
    ffi_boundary!({
        clear_last_error();
        registry::remove_token(token)?;
        Ok(PolyglotResult::Success)
    })
}

/// Get version information
///
/// # Returns
/// A static string containing version information
///
/// # Safety
/// The returned string should NOT be freed
#[no_mangle]
pub unsafe extern "C" fn polyglot_version() -> *const c_char {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// Internal implementation

#[derive(Debug, Clone, Copy)]
enum Route {
    Direct(PolyglotModelHandle),
    Pivot(PolyglotModelHandle, PolyglotModelHandle),
}

unsafe fn run_batch(
    service: PolyglotServiceHandle,
    route: Route,
    inputs: *const *const c_char,
    count: usize,
    token: PolyglotCancelTokenHandle,
    out: *mut PolyglotStringArray,
) -> Result<PolyglotResult, PolyglotResult> {
    clear_last_error();
    validate_mut_ptr(out, "out")?;
    *out = PolyglotStringArray::empty();

    let sources = read_input_strings(inputs, count)?;
    let service = registry::resolve_service(service)?;
    let token = registry::resolve_token(token)?;

    let responses = match route {
        Route::Direct(model) => {
            let model = registry::resolve_model(model)?;
            let mut service = lock(&*service);
            match &token {
                Some(token) => service.translate_multiple_cancellable(&model, sources, &[], token),
                None => service.translate_multiple(&model, sources, &[]),
            }
        }
        Route::Pivot(first, second) => {
            let first = registry::resolve_model(first)?;
            let second = registry::resolve_model(second)?;
            let mut service = lock(&*service);
            match &token {
                Some(token) => {
                    service.pivot_multiple_cancellable(&first, &second, sources, &[], token)
                }
                None => service.pivot_multiple(&first, &second, sources, &[]),
            }
        }
    }
    .map_err(map_core_error)?;

    *out = into_string_array(responses.into_iter().map(|r| r.target))?;
    Ok(PolyglotResult::Success)
}

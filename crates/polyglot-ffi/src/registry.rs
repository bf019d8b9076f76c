//! Process-wide handle tables for services, models and cancel tokens
//!
//! Table locks are only held to look a handle up, insert or remove it;
//! translation runs on a cloned `Arc` with the table unlocked. Services
//! carry their own lock so concurrent calls on one service are serialised.

use std::sync::{Arc, Mutex};

use polyglot_core::{BlockingService, CancellationToken, TranslationModel};

use crate::error::map_handle_error;
use crate::handles::{HandleKind, HandleTable};
use crate::memory::lock;
use crate::types::PolyglotResult;

pub(crate) type SharedService = Arc<Mutex<BlockingService>>;

static SERVICES: Mutex<HandleTable<SharedService>> =
    Mutex::new(HandleTable::new(HandleKind::Service));
static MODELS: Mutex<HandleTable<Arc<TranslationModel>>> =
    Mutex::new(HandleTable::new(HandleKind::Model));
static TOKENS: Mutex<HandleTable<CancellationToken>> =
    Mutex::new(HandleTable::new(HandleKind::CancelToken));

pub(crate) fn insert_service(service: BlockingService) -> Result<u64, PolyglotResult> {
    lock(&SERVICES)
        .insert(Arc::new(Mutex::new(service)))
        .map_err(map_handle_error)
}

pub(crate) fn remove_service(handle: u64) -> Result<SharedService, PolyglotResult> {
    lock(&SERVICES).remove(handle).map_err(map_handle_error)
}

pub(crate) fn resolve_service(handle: u64) -> Result<SharedService, PolyglotResult> {
    lock(&SERVICES)
        .get(handle)
        .map(Arc::clone)
        .map_err(map_handle_error)
}

pub(crate) fn insert_model(model: TranslationModel) -> Result<u64, PolyglotResult> {
    lock(&MODELS).insert(Arc::new(model)).map_err(map_handle_error)
}

pub(crate) fn remove_model(handle: u64) -> Result<Arc<TranslationModel>, PolyglotResult> {
    lock(&MODELS).remove(handle).map_err(map_handle_error)
}

/// Pin a model for the duration of one call
///
/// The table keeps ownership; a model deleted while the call runs is
/// released when the call drops its pin.
pub(crate) fn resolve_model(handle: u64) -> Result<Arc<TranslationModel>, PolyglotResult> {
    lock(&MODELS)
        .get(handle)
        .map(Arc::clone)
        .map_err(map_handle_error)
}

pub(crate) fn insert_token(token: CancellationToken) -> Result<u64, PolyglotResult> {
    lock(&TOKENS).insert(token).map_err(map_handle_error)
}

pub(crate) fn remove_token(handle: u64) -> Result<CancellationToken, PolyglotResult> {
    lock(&TOKENS).remove(handle).map_err(map_handle_error)
}

/// Resolve an optional token; the null handle means "not cancellable"
pub(crate) fn resolve_token(handle: u64) -> Result<Option<CancellationToken>, PolyglotResult> {
    if handle == 0 {
        return Ok(None);
    }
    lock(&TOKENS)
        .get(handle)
        .cloned()
        .map(Some)
        .map_err(map_handle_error)
}

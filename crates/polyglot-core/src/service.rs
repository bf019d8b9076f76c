//! Blocking translation service
//!
//! A [`BlockingService`] wraps an [`Engine`] and a bounded response cache.
//! It never owns a model: every call borrows the models it needs for the
//! duration of that call only.
//!
//! # Concurrency
//!
//! Translation methods take `&mut self` because they update the cache. To
//! translate from several threads, either share one service behind a lock
//! or build one service per thread; models may be shared freely.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cache::{CacheStats, TranslationCache};
use crate::cancel::CancellationToken;
use crate::engine::{AlignmentPoint, Engine, LexiconEngine, Response, ResponseOptions, SentenceMapping};
use crate::error::{Error, Result};
use crate::model::{ModelId, TranslationModel};

/// Service construction parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Maximum number of cached responses; 0 disables caching
    pub cache_size: usize,
}

impl ServiceConfig {
    pub fn with_cache_size(cache_size: usize) -> Self {
        Self { cache_size }
    }
}

/// Synchronous batch translation service
pub struct BlockingService {
    config: ServiceConfig,
    engine: Box<dyn Engine>,
    cache: TranslationCache,
}

impl BlockingService {
    /// Create a service backed by the [`LexiconEngine`]
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_engine(config, Box::new(LexiconEngine::new()))
    }

    /// Create a service backed by a custom engine
    pub fn with_engine(config: ServiceConfig, engine: Box<dyn Engine>) -> Self {
        debug!(cache_size = config.cache_size, "Creating blocking service");
        let cache = TranslationCache::new(config.cache_size);
        Self { config, engine, cache }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop cached responses of a model that is going away
    pub fn purge_model(&mut self, model: ModelId) -> usize {
        self.cache.purge_model(model)
    }

    /// Translate every input with `model`
    ///
    /// `options` must be empty (all annotations off) or hold one entry per
    /// input. The result holds one response per input, in input order.
    pub fn translate_multiple(
        &mut self,
        model: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
    ) -> Result<Vec<Response>> {
        self.run_translate(model, sources, options, None)
    }

    /// [`translate_multiple`](Self::translate_multiple), checking `token`
    /// before each input
    pub fn translate_multiple_cancellable(
        &mut self,
        model: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
        token: &CancellationToken,
    ) -> Result<Vec<Response>> {
        self.run_translate(model, sources, options, Some(token))
    }

    /// Translate every input through `first` and then `second`
    ///
    /// The returned responses map the original inputs to the final
    /// translations; the intermediate text is discarded.
    pub fn pivot_multiple(
        &mut self,
        first: &TranslationModel,
        second: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
    ) -> Result<Vec<Response>> {
        self.run_pivot(first, second, sources, options, None)
    }

    /// [`pivot_multiple`](Self::pivot_multiple), checking `token` before
    /// each input
    pub fn pivot_multiple_cancellable(
        &mut self,
        first: &TranslationModel,
        second: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
        token: &CancellationToken,
    ) -> Result<Vec<Response>> {
        self.run_pivot(first, second, sources, options, Some(token))
    }

    /// Translate plain texts with all annotations off
    pub fn translate<S: AsRef<str>>(
        &mut self,
        model: &TranslationModel,
        inputs: &[S],
    ) -> Result<Vec<String>> {
        let responses = self.translate_multiple(model, to_owned(inputs), &[])?;
        Ok(responses.into_iter().map(|r| r.target).collect())
    }

    /// Pivot plain texts with all annotations off
    pub fn pivot<S: AsRef<str>>(
        &mut self,
        first: &TranslationModel,
        second: &TranslationModel,
        inputs: &[S],
    ) -> Result<Vec<String>> {
        let responses = self.pivot_multiple(first, second, to_owned(inputs), &[])?;
        Ok(responses.into_iter().map(|r| r.target).collect())
    }

    #[instrument(skip_all, fields(model = %model.id(), count = sources.len()))]
    fn run_translate(
        &mut self,
        model: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
        token: Option<&CancellationToken>,
    ) -> Result<Vec<Response>> {
        let started = Instant::now();
        let options = expand_options(options, sources.len())?;
        let total = sources.len();
        let mut responses = Vec::with_capacity(total);

        for (completed, (source, opts)) in sources.iter().zip(options).enumerate() {
            check_cancelled(token, completed, total)?;
            let response = self.translate_one(model, source, opts)?;
            responses.push(Arc::unwrap_or_clone(response));
        }

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Batch translated");
        Ok(responses)
    }

    #[instrument(skip_all, fields(first = %first.id(), second = %second.id(), count = sources.len()))]
    fn run_pivot(
        &mut self,
        first: &TranslationModel,
        second: &TranslationModel,
        sources: Vec<String>,
        options: &[ResponseOptions],
        token: Option<&CancellationToken>,
    ) -> Result<Vec<Response>> {
        let started = Instant::now();
        let options = expand_options(options, sources.len())?;
        let total = sources.len();
        let mut responses = Vec::with_capacity(total);

        for (completed, (source, opts)) in sources.iter().zip(options).enumerate() {
            check_cancelled(token, completed, total)?;

            // Scores only make sense for the final hop
            let first_opts = ResponseOptions {
                quality_scores: false,
                ..opts
            };
            let intermediate = self.translate_one(first, source, first_opts)?;
            let last = self.translate_one(second, &intermediate.target, opts)?;
            responses.push(compose(&intermediate, &last, opts));
        }

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Batch pivoted");
        Ok(responses)
    }

    fn translate_one(
        &mut self,
        model: &TranslationModel,
        source: &str,
        options: ResponseOptions,
    ) -> Result<Arc<Response>> {
        if let Some(hit) = self.cache.get(model.id(), options, source) {
            debug!(model = %model.id(), "Cache hit");
            return Ok(hit);
        }

        let response = Arc::new(self.engine.translate(model, source, options)?);
        self.cache.insert(model.id(), options, source, Arc::clone(&response));
        Ok(response)
    }
}

fn to_owned<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    inputs.iter().map(|s| s.as_ref().to_string()).collect()
}

fn expand_options(options: &[ResponseOptions], count: usize) -> Result<Vec<ResponseOptions>> {
    if options.is_empty() {
        Ok(vec![ResponseOptions::default(); count])
    } else if options.len() == count {
        Ok(options.to_vec())
    } else {
        Err(Error::validation(
            "options",
            format!("expected {} entries (one per input), got {}", count, options.len()),
        ))
    }
}

fn check_cancelled(token: Option<&CancellationToken>, completed: usize, total: usize) -> Result<()> {
    match token {
        Some(token) if token.is_cancelled() => {
            debug!(completed, total, "Batch cancelled");
            Err(Error::Cancelled { completed, total })
        }
        _ => Ok(()),
    }
}

/// Join the two hops of a pivot into one source-to-target response
fn compose(first: &Response, second: &Response, options: ResponseOptions) -> Response {
    let alignments = match (&first.alignments, &second.alignments) {
        (Some(a), Some(b)) if options.alignment => Some(compose_alignments(a, b)),
        _ => None,
    };

    let sentence_mappings = match (&first.sentence_mappings, &second.sentence_mappings) {
        (Some(a), Some(b)) if options.sentence_mappings && a.len() == b.len() => Some(
            a.iter()
                .zip(b)
                .map(|(a, b)| SentenceMapping {
                    source: a.source,
                    target: b.target,
                })
                .collect(),
        ),
        (Some(a), Some(b)) if options.sentence_mappings => {
            debug!(
                first = a.len(),
                second = b.len(),
                "Pivot hops disagree on sentence count; dropping sentence mappings"
            );
            None
        }
        _ => None,
    };

    Response {
        source: first.source.clone(),
        target: second.target.clone(),
        quality_scores: second.quality_scores.clone(),
        alignments,
        sentence_mappings,
    }
}

fn compose_alignments(first: &[AlignmentPoint], second: &[AlignmentPoint]) -> Vec<AlignmentPoint> {
    first
        .iter()
        .flat_map(|a| {
            second
                .iter()
                .filter(move |b| b.sentence == a.sentence && b.source == a.target)
                .map(move |b| AlignmentPoint {
                    sentence: a.sentence,
                    source: a.source,
                    target: b.target,
                })
        })
        .collect()
}

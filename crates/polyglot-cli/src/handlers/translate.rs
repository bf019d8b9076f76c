//! Translate command handler

use crate::cli::TranslateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use is_terminal::IsTerminal;
use polyglot_core::{BlockingService, ResponseOptions, ServiceConfig};
use std::io::{self, BufRead};
use tracing::{info, instrument};

use super::load_model;

/// Handle the translate command
#[instrument(skip_all, fields(model = %args.model.display(), pivot = args.pivot.is_some()))]
pub fn handle_translate(
    args: TranslateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::new("translate_command");
    let paths_dir = args.paths_dir.as_deref().or(config.paths_dir.as_deref());

    let first = load_model(&args.model, paths_dir)?;
    let second = match &args.pivot {
        Some(path) => Some(load_model(path, paths_dir)?),
        None => None,
    };

    let sources = if args.texts.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            return Err(Error::invalid_args(
                "no text given; pass TEXT arguments or pipe lines on stdin",
            ));
        }
        read_lines(stdin.lock())?
    } else {
        args.texts.clone()
    };

    let cache_size = args.cache_size.or(config.cache_size).unwrap_or(0);
    let mut service = BlockingService::new(ServiceConfig::with_cache_size(cache_size));

    let requested = args.response_options();
    let annotated = requested != ResponseOptions::default();
    let options = if annotated {
        vec![requested; sources.len()]
    } else {
        Vec::new()
    };

    let count = sources.len();
    let responses = match &second {
        Some(second) => service.pivot_multiple(&first, second, sources, &options)?,
        None => service.translate_multiple(&first, sources, &options)?,
    };

    let stats = service.cache_stats();
    info!(count, cache_hits = stats.hits, cache_misses = stats.misses, "Translated batch");

    output.responses(&responses, annotated)
}

/// Read one input per line; a trailing newline does not add an empty input
fn read_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    reader
        .lines()
        .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
        .collect::<io::Result<_>>()
        .map_err(Error::from)
}

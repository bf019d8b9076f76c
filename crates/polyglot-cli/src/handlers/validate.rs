//! Validate command handler

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument};

use super::load_model;

/// Summary of a model configuration that loaded cleanly
#[derive(Debug, Serialize)]
struct ValidationReport {
    config: PathBuf,
    valid: bool,
    entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_language: Option<String>,
    resources: Vec<PathBuf>,
}

/// Handle the validate command
///
/// Invalid configurations surface as errors so the exit code reflects them.
#[instrument(skip_all, fields(file = %args.model_config.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("validate_command");
    let paths_dir = args.paths_dir.as_deref().or(config.paths_dir.as_deref());

    output.info(&format!("Validating model configuration: {}", args.model_config.display()))?;
    let model = load_model(&args.model_config, paths_dir)?;
    let options = model.options();

    let report = ValidationReport {
        config: args.model_config.clone(),
        valid: true,
        entries: model.lexicon().len(),
        source_language: options.source_language.clone(),
        target_language: options.target_language.clone(),
        resources: options.resource_paths().map(PathBuf::from).collect(),
    };
    info!(entries = report.entries, "Model configuration is valid");

    if output.format() == OutputFormat::Human {
        output.success(&format!(
            "✓ {} is valid ({} table entries)",
            report.config.display(),
            report.entries
        ))
    } else {
        output.data(&report)
    }
}

//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod translate;
mod validate;

pub use completions::handle_completions;
pub use translate::handle_translate;
pub use validate::handle_validate;

use crate::error::{Error, Result};
use polyglot_core::TranslationModel;
use std::path::Path;
use tracing::debug;

/// Load a model configuration file
///
/// Relative resource paths resolve against `paths_dir`, or against the
/// directory holding the configuration when none is given.
pub(crate) fn load_model(config: &Path, paths_dir: Option<&Path>) -> Result<TranslationModel> {
    if !config.is_file() {
        return Err(Error::FileNotFound {
            path: config.to_path_buf(),
        });
    }

    let text = std::fs::read_to_string(config)?;
    let base = paths_dir
        .or_else(|| config.parent())
        .unwrap_or_else(|| Path::new(""));
    debug!(config = %config.display(), base = %base.display(), "Loading model");

    Ok(TranslationModel::from_config_in(&text, base)?)
}

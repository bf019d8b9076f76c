//! Model option loading
//!
//! Turns a YAML configuration blob into validated [`ModelOptions`]. Keys use
//! the kebab-case names of the marian option set so existing model configs
//! can be passed through unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Keys accepted when validation is enabled
pub const KNOWN_KEYS: &[&str] = &[
    "models",
    "vocabs",
    "shortlist",
    "lexicon",
    "source-language",
    "target-language",
    "beam-size",
    "normalize",
    "word-penalty",
    "max-length-break",
    "mini-batch-words",
    "max-length-factor",
    "skip-cost",
    "cpu-threads",
    "quiet",
    "quiet-translation",
    "gemm-precision",
    "alignment",
];

/// Validated options for a translation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModelOptions {
    /// Translation table files, one `source<TAB>target` pair per line
    pub models: Vec<PathBuf>,
    /// Vocabulary files
    pub vocabs: Vec<PathBuf>,
    /// Optional lexical shortlist
    pub shortlist: Option<PathBuf>,
    /// Inline translation table entries
    pub lexicon: BTreeMap<String, String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub beam_size: usize,
    pub normalize: f32,
    pub word_penalty: f32,
    /// Sentences longer than this many words are split before decoding
    pub max_length_break: usize,
    pub mini_batch_words: usize,
    pub max_length_factor: f32,
    pub skip_cost: bool,
    pub cpu_threads: usize,
    pub quiet: bool,
    pub quiet_translation: bool,
    pub gemm_precision: Option<String>,
    pub alignment: Option<String>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            vocabs: Vec::new(),
            shortlist: None,
            lexicon: BTreeMap::new(),
            source_language: None,
            target_language: None,
            beam_size: 1,
            normalize: 1.0,
            word_penalty: 0.0,
            max_length_break: 128,
            mini_batch_words: 1024,
            max_length_factor: 2.0,
            skip_cost: true,
            cpu_threads: 1,
            quiet: true,
            quiet_translation: true,
            gemm_precision: None,
            alignment: None,
        }
    }
}

impl ModelOptions {
    /// All file resources referenced by these options
    pub fn resource_paths(&self) -> impl Iterator<Item = &Path> {
        self.models
            .iter()
            .chain(self.vocabs.iter())
            .chain(self.shortlist.iter())
            .map(PathBuf::as_path)
    }

    /// Resolve relative resource paths against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        self.models.iter_mut().for_each(resolve);
        self.vocabs.iter_mut().for_each(resolve);
        self.shortlist.iter_mut().for_each(resolve);
    }

    /// Check numeric ranges, resource availability and table presence
    pub fn validate(&self) -> Result<()> {
        check_at_least_one("beam-size", self.beam_size)?;
        check_at_least_one("mini-batch-words", self.mini_batch_words)?;
        check_at_least_one("max-length-break", self.max_length_break)?;

        if !(self.max_length_factor > 0.0) {
            return Err(Error::configuration(format!(
                "max-length-factor must be positive, got {}",
                self.max_length_factor
            )));
        }

        for path in self.resource_paths() {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "referenced resource is not available: {}",
                    path.display()
                )));
            }
        }

        if self.models.is_empty() && self.lexicon.is_empty() {
            return Err(Error::configuration(
                "no translation table configured: set `models` or `lexicon`",
            ));
        }

        Ok(())
    }
}

fn check_at_least_one(key: &str, value: usize) -> Result<()> {
    if value == 0 {
        Err(Error::configuration(format!("{} must be at least 1", key)))
    } else {
        Ok(())
    }
}

/// Parse model options from a YAML string
///
/// With `validate` set, unknown keys are rejected and [`ModelOptions::validate`]
/// runs after relative paths have been resolved against `paths_dir`.
pub fn parse_options_from_str(
    text: &str,
    validate: bool,
    paths_dir: Option<&Path>,
) -> Result<ModelOptions> {
    let value: Value = serde_yaml::from_str(text)?;

    let mapping = match &value {
        Value::Mapping(mapping) => mapping,
        Value::Null => {
            return Err(Error::configuration("model configuration is empty"));
        }
        _ => {
            return Err(Error::configuration(
                "model configuration must be a mapping of option names to values",
            ));
        }
    };

    if validate {
        for key in mapping.keys() {
            let name = key.as_str().ok_or_else(|| {
                Error::configuration(format!("option names must be strings, got {:?}", key))
            })?;
            if !KNOWN_KEYS.contains(&name) {
                return Err(Error::configuration(format!("unknown option `{}`", name)));
            }
        }
    }

    let mut options: ModelOptions = serde_yaml::from_value(value)?;

    if let Some(base) = paths_dir.filter(|p| !p.as_os_str().is_empty()) {
        options.resolve_paths(base);
    }

    if validate {
        options.validate()?;
    }

    debug!(
        models = options.models.len(),
        inline_entries = options.lexicon.len(),
        "Parsed model options"
    );

    Ok(options)
}

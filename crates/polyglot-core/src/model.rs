//! Loaded translation models
//!
//! A [`TranslationModel`] is immutable once built and can be shared freely
//! between services and threads.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::error::{Error, Result};
use crate::options::{parse_options_from_str, ModelOptions};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique model identity, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// Word translation table
///
/// Keys are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, String>,
}

impl Lexicon {
    /// Add an entry, replacing any previous translation of `source`
    pub fn insert(&mut self, source: &str, target: &str) {
        self.entries.insert(source.to_lowercase(), target.to_string());
    }

    /// Look up a single word
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.entries.get(&word.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a tab-separated table file into this lexicon
    fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Resource {
            path: path.to_path_buf(),
            message: "failed to read translation table".to_string(),
            source: Some(e),
        })?;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            match line.split_once('\t') {
                Some((source, target)) if !source.trim().is_empty() => {
                    self.insert(source.trim(), target.trim());
                }
                _ => {
                    return Err(Error::configuration(format!(
                        "{}:{}: expected `source<TAB>target`",
                        path.display(),
                        number + 1
                    )));
                }
            }
        }

        Ok(())
    }
}

/// An immutable, loaded translation model
pub struct TranslationModel {
    id: ModelId,
    options: ModelOptions,
    lexicon: Lexicon,
}

impl TranslationModel {
    /// Parse and validate `config`, then load the model it describes
    pub fn from_config(config: &str) -> Result<Self> {
        Self::from_options(parse_options_from_str(config, true, None)?)
    }

    /// Like [`from_config`](Self::from_config), resolving relative resource
    /// paths against `paths_dir`
    pub fn from_config_in(config: &str, paths_dir: &Path) -> Result<Self> {
        Self::from_options(parse_options_from_str(config, true, Some(paths_dir))?)
    }

    /// Load a model from already validated options
    pub fn from_options(options: ModelOptions) -> Result<Self> {
        let mut lexicon = Lexicon::default();

        for path in &options.models {
            lexicon.load_file(path)?;
        }
        // Inline entries take precedence over table files
        for (source, target) in &options.lexicon {
            lexicon.insert(source, target);
        }

        let id = ModelId::next();
        info!(
            model = %id,
            entries = lexicon.len(),
            source_language = options.source_language.as_deref().unwrap_or("?"),
            target_language = options.target_language.as_deref().unwrap_or("?"),
            "Loaded translation model"
        );

        Ok(Self { id, options, lexicon })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}

impl fmt::Debug for TranslationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationModel")
            .field("id", &self.id)
            .field("entries", &self.lexicon.len())
            .field("source_language", &self.options.source_language)
            .field("target_language", &self.options.target_language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids_are_unique() {
        let a = TranslationModel::from_config("lexicon: {hello: hola}").unwrap();
        let b = TranslationModel::from_config("lexicon: {hello: hola}").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lexicon_case_insensitive() {
        let model = TranslationModel::from_config("lexicon: {Hello: hola}").unwrap();
        assert_eq!(model.lexicon().lookup("HELLO"), Some("hola"));
        assert_eq!(model.lexicon().lookup("hello"), Some("hola"));
        assert_eq!(model.lexicon().lookup("bye"), None);
    }

    #[test]
    fn test_table_file_and_inline_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en-de.tsv"),
            "# english to german\nhello\thallo\n\nworld\twelt\n",
        )
        .unwrap();

        let model = TranslationModel::from_config_in(
            "models: [en-de.tsv]\nlexicon: {world: erde}\n",
            dir.path(),
        )
        .unwrap();

        assert_eq!(model.lexicon().len(), 2);
        assert_eq!(model.lexicon().lookup("hello"), Some("hallo"));
        assert_eq!(model.lexicon().lookup("world"), Some("erde"));
    }

    #[test]
    fn test_malformed_table_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.tsv"), "hello\thallo\nbroken line\n").unwrap();

        let err = TranslationModel::from_config_in("models: [bad.tsv]", dir.path()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains(":2:"));
    }
}

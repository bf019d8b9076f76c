//! Polyglot Core - batch translation with cached, pivotable models
//!
//! This crate provides the pieces behind the Polyglot C surface:
//!
//! - **Model options**: YAML configuration parsing and validation
//! - **Models**: immutable translation models built from validated options
//! - **Engine**: the translation computation, pluggable via [`Engine`]
//! - **Service**: a blocking service with a bounded cache, batch and pivot
//!   translation
//!
//! # Example
//!
//! ```
//! use polyglot_core::{BlockingService, Result, ServiceConfig, TranslationModel};
//!
//! fn example() -> Result<()> {
//!     let model = TranslationModel::from_config("lexicon: {hello: hola, world: mundo}")?;
//!     let mut service = BlockingService::new(ServiceConfig::with_cache_size(64));
//!
//!     let out = service.translate(&model, &["hello", "world"])?;
//!     assert_eq!(out, vec!["hola", "mundo"]);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod cache;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod model;
pub mod options;
pub mod service;

pub use cache::{CacheStats, TranslationCache};
pub use cancel::CancellationToken;
pub use engine::{
    AlignmentPoint, ByteRange, Engine, LexiconEngine, Response, ResponseOptions, SentenceMapping,
};
pub use error::{Error, Result};
pub use model::{Lexicon, ModelId, TranslationModel};
pub use options::{parse_options_from_str, ModelOptions};
pub use service::{BlockingService, ServiceConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_model_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TranslationModel>();
        assert_send_sync::<CancellationToken>();
    }
}

use crate::languages::Language;
use std::path::PathBuf;
use thiserror::Error;

/// Errors at the edges of the library: file access, configuration and
/// language selection. Minifying itself never fails.
#[derive(Debug, Error)]
pub enum CodeminError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input too large (>= {limit} bytes)")]
    InputTooLarge { limit: u64 },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("cannot infer language for {0}; pass --language")]
    UnsupportedLanguage(String),

    #[error("{0} has no pretty-printer")]
    NoPrettifier(Language),

    #[error("cannot pretty-print {language}: {message}")]
    Prettify { language: Language, message: String },

    #[error("invalid config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CodeminError>;

//! Context-aware source minifiers.
//!
//! Every language is a [`scanner::ContextRuleTable`] fed to one shared
//! lexical scanner, followed by optional whitespace-only regex passes.
//!
//! ```
//! use codemin::{minify, Language};
//!
//! assert_eq!(minify(Language::Css, "a { color: red; }"), "a{color:red;}");
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod languages;
pub mod logging;
pub mod pipeline;
pub mod reporter;
pub mod scanner;

pub use config::Config;
pub use error::{CodeminError, Result};
pub use languages::{load_minifiers, minify, Analysis, Issue, Language, Minifier, Registry};
pub use pipeline::MinifyResult;

use crate::error::{CodeminError, Result};
use crate::languages::html::{INLINE_ELEMENTS, PRESERVE_ELEMENTS};
use crate::languages::Language;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "maxInputSize", default = "default_max_input_size")]
    pub max_input_size: u64,
    #[serde(default)]
    pub html: HtmlConfig,
    #[serde(default)]
    pub xml: XmlConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    /// Extra file extensions, e.g. `{"tpl": "html"}`.
    #[serde(default)]
    pub extensions: HashMap<String, Language>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    #[serde(rename = "preserveElements", default = "default_preserve_elements")]
    pub preserve_elements: Vec<String>,
    #[serde(rename = "inlineElements", default = "default_inline_elements")]
    pub inline_elements: Vec<String>,
    #[serde(rename = "minifyEmbedded", default = "default_true")]
    pub minify_embedded: bool,
    #[serde(rename = "keepConditionalComments", default = "default_true")]
    pub keep_conditional_comments: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            preserve_elements: default_preserve_elements(),
            inline_elements: default_inline_elements(),
            minify_embedded: true,
            keep_conditional_comments: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlConfig {
    #[serde(rename = "stripProcessingInstructions", default)]
    pub strip_processing_instructions: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Worker threads; 0 lets rayon decide.
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            suffix: default_suffix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_input_size() -> u64 {
    10_000_000
}

fn default_suffix() -> String {
    ".min".to_string()
}

fn default_preserve_elements() -> Vec<String> {
    PRESERVE_ELEMENTS.iter().map(|s| s.to_string()).collect()
}

fn default_inline_elements() -> Vec<String> {
    INLINE_ELEMENTS.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_input_size: default_max_input_size(),
            html: HtmlConfig::default(),
            xml: XmlConfig::default(),
            batch: BatchConfig::default(),
            extensions: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads the first config file found on the search path. Missing or
    /// broken files fall back to defaults.
    pub fn load() -> Self {
        let Some(config_path) = Self::config_path() else {
            return Config::default();
        };

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e}");
                tracing::warn!("using default configuration");
                Config::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CodeminError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CodeminError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Language for `path`: configured extensions first, then the built-in
    /// table.
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions
            .get(&ext)
            .copied()
            .or_else(|| Language::from_extension(&ext))
    }

    fn config_path() -> Option<PathBuf> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));

        let mut search_paths = Vec::new();

        if let Some(dir) = exe_dir {
            search_paths.push(dir.join("../config.json"));
            search_paths.push(dir.join("config.json"));
        }

        // Fallback: current directory
        search_paths.push(PathBuf::from("codemin.json"));

        // Fallback: XDG config home or ~/.config
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        {
            search_paths.push(config_dir.join("codemin/config.json"));
        }

        search_paths.into_iter().find(|p| p.exists())
    }
}

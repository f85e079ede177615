use std::path::{Path, PathBuf};

use anyhow::Context;
use ask_domain::{HISTORY_WINDOW, MAX_HISTORY};
use ask_provider::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use chrono::Duration;

const API_KEY_FILE: &str = "apikey.txt";
const PROMPT_FILE: &str = "prompt.json";
const HISTORY_FILE: &str = "history.jsonl";

/// Settings resolved from flags, environment variables and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub config_dir: PathBuf,
    /// Key taken from `OPENAI_API_KEY`; the key file is consulted otherwise.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_history: usize,
    pub history_window: Duration,
}

impl Environment {
    /// Resolves the environment from the process environment.
    pub fn from_env(config_dir: Option<PathBuf>, model: Option<String>) -> anyhow::Result<Self> {
        Self::resolve(config_dir, model, dirs::home_dir(), |key| std::env::var(key).ok())
    }

    /// Resolves the environment with an explicit variable lookup.
    ///
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(
        config_dir: Option<PathBuf>,
        model: Option<String>,
        home: Option<PathBuf>,
        var: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let var = |key: &str| var(key).filter(|value| !value.trim().is_empty());

        let config_dir = match config_dir.or_else(|| var("ASK_CONFIG_DIR").map(PathBuf::from)) {
            Some(dir) => dir,
            None => home
                .map(|home| home.join(".config").join("ask"))
                .context("Could not determine the home directory; set ASK_CONFIG_DIR")?,
        };

        Ok(Self {
            config_dir,
            api_key: var("OPENAI_API_KEY").map(|key| key.trim().to_string()),
            model: model
                .or_else(|| var("ASK_MODEL"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: var("ASK_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_history: MAX_HISTORY,
            history_window: HISTORY_WINDOW,
        })
    }

    pub fn api_key_path(&self) -> PathBuf {
        self.config_dir.join(API_KEY_FILE)
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.config_dir.join(PROMPT_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.config_dir.join(HISTORY_FILE)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

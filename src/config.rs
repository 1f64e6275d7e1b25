use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Fixed search the watcher monitors. The query string is the operator's
/// saved filter; changing it changes which postings are tracked.
pub const SEARCH_URL: &str =
    "https://www.jobs.nhs.uk/candidate/search/results?keyword=Dermatology&language=en";
pub const BASE_URL: &str = "https://www.jobs.nhs.uk";

const DEFAULT_STORE_PATH: &str = "data/jobs.json";

/// Everything a run needs, resolved once at process entry. Components take
/// this by parameter and never touch the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub headless: bool,
    pub store_path: PathBuf,
    pub search_url: String,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN environment variable must be set"))?;
        let chat_id = env::var("TELEGRAM_CHAT_ID")
            .map_err(|_| anyhow!("TELEGRAM_CHAT_ID environment variable must be set"))?;

        Ok(Self {
            bot_token,
            chat_id,
            headless: headless_from_env(),
            store_path: store_path_from_env(),
            search_url: SEARCH_URL.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }
}

/// Headless unless explicitly disabled; CI never gets a visible window.
fn headless_from_env() -> bool {
    match env::var("HEADLESS") {
        Ok(v) => !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"),
        Err(_) => true,
    }
}

pub fn store_path_from_env() -> PathBuf {
    env::var("JOBWATCH_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH))
}

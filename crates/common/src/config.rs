use crate::FeedMode;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
///
/// The advisory and Telegram collaborators are optional capabilities: leaving
/// their variables unset is a normal configuration, not an error.
#[derive(Debug, Clone)]
pub struct Config {
    // Data feed
    pub feed_mode: FeedMode,
    /// JSON fixture consumed in replay mode.
    pub replay_data_path: String,

    // Journal
    pub journal_path: String,

    // Scan config file path (instruments + detector parameters)
    pub scan_config_path: String,

    // Optional AI advisory
    pub openai_api_key: Option<String>,
    pub advisory_model: String,

    // Optional Telegram alerts
    pub telegram_token: Option<String>,
    pub telegram_chat_ids: Vec<i64>,

    // External-dispatch timeout, seconds
    pub dispatch_timeout_secs: u64,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any malformed value.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let feed_mode = match required_env("FEED_MODE").to_lowercase().as_str() {
            "live" => FeedMode::Live,
            "replay" => FeedMode::Replay,
            other => panic!("ERROR: FEED_MODE must be 'live' or 'replay', got: '{other}'"),
        };

        let telegram_chat_ids = optional_env("TELEGRAM_CHAT_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| {
                        s.trim().parse::<i64>().unwrap_or_else(|_| {
                            panic!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{}'", s.trim())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Config {
            feed_mode,
            replay_data_path: optional_env("REPLAY_DATA_PATH")
                .unwrap_or_else(|| "data/replay.json".to_string()),
            journal_path: optional_env("JOURNAL_PATH")
                .unwrap_or_else(|| "trade_journal.csv".to_string()),
            scan_config_path: optional_env("SCAN_CONFIG_PATH")
                .unwrap_or_else(|| "config/instruments.toml".to_string()),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            advisory_model: optional_env("ADVISORY_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            telegram_token: optional_env("TELEGRAM_TOKEN"),
            telegram_chat_ids,
            dispatch_timeout_secs: optional_env("DISPATCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

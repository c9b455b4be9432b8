/// All configuration loaded from environment variables at startup.
/// Optional integrations (Telegram, remote mirror) are simply absent when
/// their variables are not set; malformed values cause an immediate panic
/// with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: Option<TelegramConfig>,
    pub mirror: Option<MirrorConfig>,

    /// Seconds between evaluation cycles.
    pub refresh_interval_secs: u64,
    /// Fixed UTC offset of the session clock used for forex market hours.
    pub session_utc_offset_hours: i32,

    /// Directory holding the active-position and history JSON files.
    pub state_dir: String,
    /// Optional TOML file overriding the built-in instrument universe.
    pub instruments_config_path: String,
    /// Base URL of the chart data provider.
    pub data_base_url: String,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    /// User ids allowed to talk to the operator bot; alerts go to the same ids.
    pub allowed_user_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub token: String,
    /// "owner/repo" target of the versioned remote mirror.
    pub repo: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let telegram = optional_env("TELEGRAM_TOKEN").map(|token| {
            let ids = required_env("TELEGRAM_ALLOWED_USER_IDS");
            let allowed_user_ids = ids
                .split(',')
                .map(|s| {
                    s.trim().parse::<i64>().unwrap_or_else(|_| {
                        panic!(
                            "TELEGRAM_ALLOWED_USER_IDS contains non-numeric ID: '{}'",
                            s.trim()
                        )
                    })
                })
                .collect();
            TelegramConfig {
                token,
                allowed_user_ids,
            }
        });

        let mirror = optional_env("GITHUB_TOKEN").map(|token| MirrorConfig {
            token,
            repo: required_env("GITHUB_REPO"),
        });

        Config {
            telegram,
            mirror,
            refresh_interval_secs: optional_env("REFRESH_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(180),
            session_utc_offset_hours: optional_env("SESSION_UTC_OFFSET_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            state_dir: optional_env("STATE_DIR").unwrap_or_else(|| ".".to_string()),
            instruments_config_path: optional_env("INSTRUMENTS_CONFIG_PATH")
                .unwrap_or_else(|| "config/instruments.toml".to_string()),
            data_base_url: optional_env("DATA_BASE_URL")
                .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string()),
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

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use tracing::warn;

use common::{ActivePosition, ResolvedTrade, Result};

pub mod github;

pub use github::GithubMirror;

pub const POSITIONS_FILE: &str = "active_positions.json";
pub const HISTORY_FILE: &str = "trade_history.json";
const PROBE_FILE: &str = "test_connection.json";

/// Persistent engine state: the symbol-keyed active-position map and the
/// append-only trade history, stored as two JSON documents and optionally
/// mirrored to a versioned remote.
///
/// Local writes must succeed; mirror failures are logged and dropped — the
/// next write re-syncs the full document, which is the implicit retry.
pub struct Store {
    dir: PathBuf,
    mirror: Option<GithubMirror>,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>, mirror: Option<GithubMirror>) -> Self {
        Self {
            dir: dir.into(),
            mirror,
        }
    }

    pub async fn load_positions(&self) -> Result<HashMap<String, ActivePosition>> {
        self.read_or_init(POSITIONS_FILE).await
    }

    pub async fn load_history(&self) -> Result<Vec<ResolvedTrade>> {
        self.read_or_init(HISTORY_FILE).await
    }

    pub async fn save_positions(
        &self,
        positions: &HashMap<String, ActivePosition>,
    ) -> Result<()> {
        self.write_and_mirror(POSITIONS_FILE, positions).await
    }

    pub async fn save_history(&self, history: &[ResolvedTrade]) -> Result<()> {
        self.write_and_mirror(HISTORY_FILE, &history).await
    }

    /// Drop every tracked position. Administrative: bypasses the engine.
    pub async fn clear_positions(&self) -> Result<()> {
        self.save_positions(&HashMap::new()).await
    }

    /// Erase the trade history log. Administrative: bypasses the engine.
    pub async fn clear_history(&self) -> Result<()> {
        self.save_history(&[]).await
    }

    /// Write a probe document locally and through the mirror, surfacing any
    /// mirror failure instead of swallowing it.
    pub async fn connectivity_test(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Probe {
            tested_at: String,
            status: &'static str,
        }

        let probe = Probe {
            tested_at: Utc::now().to_rfc3339(),
            status: "connection active",
        };
        let data = self.write_local(PROBE_FILE, &probe).await?;

        match &self.mirror {
            Some(mirror) => {
                mirror.put_file(PROBE_FILE, data.as_bytes()).await?;
                Ok(format!("Probe written locally and mirrored to {}", mirror.repo()))
            }
            None => Ok("Probe written locally; remote mirror disabled".to_string()),
        }
    }

    /// Read a state file, creating it with an empty default if missing.
    /// A corrupt file degrades to the default rather than aborting: state
    /// is rewritten in full on the next ledger change anyway.
    async fn read_or_init<T>(&self, file: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Serialize + Default,
    {
        match fs::read_to_string(self.dir.join(file)).await {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(file, error = %e, "corrupt state file, starting empty");
                    Ok(T::default())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let value = T::default();
                self.write_local(file, &value).await?;
                Ok(value)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_local<T: Serialize>(&self, file: &str, value: &T) -> Result<String> {
        fs::create_dir_all(&self.dir).await?;
        let data = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), &data).await?;
        Ok(data)
    }

    async fn write_and_mirror<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let data = self.write_local(file, value).await?;
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.put_file(file, data.as_bytes()).await {
                warn!(file, error = %e, "remote mirror write failed");
            }
        }
        Ok(())
    }
}

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, Result};

const API_BASE: &str = "https://api.github.com";

/// Mirrors state documents to a GitHub repository through the contents API.
///
/// Updates use optimistic concurrency: the current object's `sha` is fetched
/// and sent back as the version token; creating a new object omits it. A
/// rejected write (stale token, auth, network) surfaces as a persistence
/// error — local state is already on disk, and the next write re-reads the
/// current token.
pub struct GithubMirror {
    token: String,
    repo: String,
    http: Client,
}

impl GithubMirror {
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repo: repo.into(),
            http: Client::builder()
                .use_rustls_tls()
                .user_agent("sniper-backup")
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Upload `content` as `path` in the repository, replacing any existing
    /// version.
    pub async fn put_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let sha = self.current_sha(path).await?;
        debug!(path, update = sha.is_some(), "mirroring state file");

        let payload = PutContents {
            message: format!("Update {path} via auto-backup"),
            content: base64_encode(content),
            sha,
        };

        let url = format!("{API_BASE}/repos/{}/contents/{path}", self.repo);
        let resp = self
            .http
            .put(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Persistence(format!(
            "mirror write rejected: HTTP {status}: {body}"
        )))
    }

    /// Version token of the existing object, or `None` if it does not exist
    /// yet.
    async fn current_sha(&self, path: &str) -> Result<Option<String>> {
        let url = format!("{API_BASE}/repos/{}/contents/{path}", self.repo);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::Persistence(format!(
                "mirror lookup failed: HTTP {}",
                resp.status()
            )));
        }
        let object: ContentsObject = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(Some(object.sha))
    }
}

#[derive(Serialize)]
struct PutContents {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Deserialize)]
struct ContentsObject {
    sha: String,
}

const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard base64 with padding, as the contents API expects.
fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let n = (u32::from(chunk[0]) << 16)
            | (u32::from(*chunk.get(1).unwrap_or(&0)) << 8)
            | u32::from(*chunk.get(2).unwrap_or(&0));
        out.push(B64_ALPHABET[(n >> 18 & 63) as usize] as char);
        out.push(B64_ALPHABET[(n >> 12 & 63) as usize] as char);
        out.push(if chunk.len() > 1 {
            B64_ALPHABET[(n >> 6 & 63) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            B64_ALPHABET[(n & 63) as usize] as char
        } else {
            '='
        });
    }
    out
}

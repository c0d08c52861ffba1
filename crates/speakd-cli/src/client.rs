//! HTTP client for the daemon's localhost API, behind the `speak`,
//! `voices`, `status`, and `stop` subcommands.

use anyhow::Context;
use serde_json::{Value, json};

/// Client against a running daemon on loopback.
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(port: u16) -> Self {
        Self {
            base: format!("http://127.0.0.1:{port}"),
            http: reqwest::Client::new(),
        }
    }

    /// `POST /api/speak`
    pub async fn speak(
        &self,
        text: &str,
        source: Option<&str>,
        voice: Option<&str>,
    ) -> anyhow::Result<()> {
        let body = json!({ "text": text, "source": source, "voice": voice });
        let response = self
            .http
            .post(format!("{}/api/speak", self.base))
            .json(&body)
            .send()
            .await
            .context("is the daemon running? start it with `speakd serve`")?;

        let status = response.status();
        let payload: Value = response.json().await?;
        if status.is_client_error() {
            anyhow::bail!("rejected: {}", payload["error"].as_str().unwrap_or("unknown"));
        }
        if payload["queued"].as_bool() == Some(true) {
            println!("queued {}", payload["id"].as_str().unwrap_or("?"));
        } else {
            println!("not queued (filtered by source)");
        }
        Ok(())
    }

    /// `GET /api/voices`
    pub async fn voices(&self) -> anyhow::Result<()> {
        let voices: Value = self
            .http
            .get(format!("{}/api/voices", self.base))
            .send()
            .await
            .context("is the daemon running? start it with `speakd serve`")?
            .json()
            .await?;

        let list = voices.as_array().map(Vec::as_slice).unwrap_or_default();
        if list.is_empty() {
            println!("no voices installed");
            return Ok(());
        }
        for voice in list {
            println!(
                "{}  ({} Hz)",
                voice["id"].as_str().unwrap_or("?"),
                voice["sampleRate"].as_u64().unwrap_or(0)
            );
        }
        Ok(())
    }

    /// `GET /api/status`
    pub async fn status(&self) -> anyhow::Result<()> {
        let status: Value = self
            .http
            .get(format!("{}/api/status", self.base))
            .send()
            .await
            .context("is the daemon running? start it with `speakd serve`")?
            .json()
            .await?;

        println!(
            "running: {}  queue depth: {}  loaded voices: {}",
            status["running"].as_bool().unwrap_or(false),
            status["queueDepth"].as_u64().unwrap_or(0),
            status["activeVoices"].as_u64().unwrap_or(0),
        );
        Ok(())
    }

    /// `POST /api/stop`
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.http
            .post(format!("{}/api/stop", self.base))
            .send()
            .await
            .context("is the daemon running? start it with `speakd serve`")?
            .error_for_status()?;
        println!("stopped");
        Ok(())
    }
}

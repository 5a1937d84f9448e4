//! Concrete synthesis engines for the cascade: a local system voice
//! process and a remote HTTP synthesizer.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, VoiceError};

use super::{SpeakOptions, SynthesisEngine};

/// Shells out to a local TTS program (`say` on macOS, `espeak` and
/// friends elsewhere). The child is killed on cancellation so stale
/// utterances never talk over new ones.
pub struct SystemVoiceEngine {
    program: String,
}

impl SystemVoiceEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemVoiceEngine {
    fn default() -> Self {
        Self::new("say")
    }
}

#[async_trait]
impl SynthesisEngine for SystemVoiceEngine {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn speak(
        &self,
        text: &str,
        options: &SpeakOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut command = Command::new(&self.program);
        if let Some(voice) = &options.voice {
            command.arg("-v").arg(voice);
        }
        command.arg(text);
        command.kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Synthesis(format!("failed to spawn {}: {e}", self.program)))?;

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("system voice preempted, killing child");
                let _ = child.kill().await;
                Ok(())
            }
            status = child.wait() => {
                let status = status
                    .map_err(|e| VoiceError::Synthesis(format!("{} wait failed: {e}", self.program)))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(VoiceError::Synthesis(format!(
                        "{} exited with {status}",
                        self.program
                    )))
                }
            }
        }
    }
}

/// Remote synthesis over HTTP. Posts the utterance and discards the audio
/// payload after a successful response; playback is the server's concern
/// in this deployment shape.
pub struct HttpVoiceEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpVoiceEngine {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl SynthesisEngine for HttpVoiceEngine {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn speak(
        &self,
        text: &str,
        options: &SpeakOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let body = json!({
            "text": text,
            "voice": options.voice,
            "rate": options.rate,
            "pitch": options.pitch,
            "volume": options.volume,
            "language": options.language,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            response = request.send() => response?,
        };

        if !response.status().is_success() {
            return Err(VoiceError::Synthesis(format!(
                "synthesis endpoint returned {}",
                response.status()
            )));
        }
        // Drain the audio payload so the connection can be reused.
        let _ = response.bytes().await?;
        Ok(())
    }
}

//! Spoken feedback: an ordered cascade of synthesis engines behind one
//! `speak` call, with preemption, progress reporting, and a visual
//! fallback that keeps timing honest when no engine can produce audio.

mod engines;

pub use engines::{HttpVoiceEngine, SystemVoiceEngine};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, VoiceError};

/// Which engine the caller wants. `Auto` walks the whole cascade in
/// priority order; a specific preference pins one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePreference {
    #[default]
    Auto,
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
}

impl EnginePreference {
    fn slot(self) -> Option<usize> {
        match self {
            EnginePreference::Auto => None,
            EnginePreference::Primary => Some(0),
            EnginePreference::Secondary => Some(1),
            EnginePreference::Tertiary => Some(2),
            EnginePreference::Quaternary => Some(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeakOptions {
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
    pub engine: EnginePreference,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            language: "en-US".to_string(),
            engine: EnginePreference::Auto,
        }
    }
}

/// Observable synthesis state, published on every transition.
#[derive(Debug, Clone, Default)]
pub struct SpeechStatus {
    pub is_loading: bool,
    pub is_speaking: bool,
    pub current_text: Option<String>,
    /// 0 to 100 across the current utterance.
    pub progress: u8,
    pub error: Option<String>,
}

/// One way of turning text into audio. Engines are tried in cascade
/// order; returning an error hands the text to the next engine.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn speak(
        &self,
        text: &str,
        options: &SpeakOptions,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

pub struct SpeechOutput {
    engines: Vec<Arc<dyn SynthesisEngine>>,
    status: watch::Sender<SpeechStatus>,
    active: Mutex<Option<CancellationToken>>,
}

impl SpeechOutput {
    pub fn new(engines: Vec<Arc<dyn SynthesisEngine>>) -> Self {
        let (status, _) = watch::channel(SpeechStatus::default());
        Self {
            engines,
            status,
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SpeechStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SpeechStatus {
        self.status.borrow().clone()
    }

    /// Speak `text`, preempting any utterance already in flight. Walks the
    /// engine cascade until one succeeds; if all fail, holds the speaking
    /// status for a read-along interval so the caller's pacing survives.
    pub async fn speak(&self, text: &str, options: &SpeakOptions) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        self.status.send_replace(SpeechStatus {
            is_loading: true,
            is_speaking: false,
            current_text: Some(text.to_string()),
            progress: 0,
            error: None,
        });

        let candidates: Vec<&Arc<dyn SynthesisEngine>> = match options.engine.slot() {
            Some(slot) => self.engines.get(slot).into_iter().collect(),
            None => self.engines.iter().collect(),
        };

        let mut last_error: Option<VoiceError> = None;
        for engine in candidates {
            if cancel.is_cancelled() {
                self.finish(true);
                return Ok(());
            }
            self.status.send_modify(|s| {
                s.is_loading = false;
                s.is_speaking = true;
            });
            debug!(engine = engine.name(), "attempting synthesis");
            match engine.speak(text, options, &cancel).await {
                Ok(()) => {
                    info!(engine = engine.name(), "utterance spoken");
                    self.finish(cancel.is_cancelled());
                    return Ok(());
                }
                Err(e) => {
                    warn!(engine = engine.name(), error = %e, "engine failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        if cancel.is_cancelled() {
            self.finish(true);
            return Ok(());
        }

        warn!("all synthesis engines failed, falling back to visual pacing");
        self.visual_fallback(text, &cancel).await;
        self.status.send_modify(|s| {
            s.error = last_error.as_ref().map(|e| e.to_string());
        });
        self.finish(cancel.is_cancelled());
        Ok(())
    }

    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(token) = active.take() {
            token.cancel();
        }
        self.status.send_replace(SpeechStatus::default());
    }

    /// Holds the speaking status for a reading-speed interval: at least
    /// 1.5 seconds, 200 ms per word, stepping progress every 100 ms.
    async fn visual_fallback(&self, text: &str, cancel: &CancellationToken) {
        let words = text.split_whitespace().count() as u64;
        let total_ms = (words * 200).max(1500);
        let steps = total_ms / 100;

        for step in 1..=steps {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
            }
            let progress = ((step * 100) / steps).min(100) as u8;
            self.status.send_modify(|s| {
                s.is_speaking = true;
                s.progress = progress;
            });
        }
        self.status.send_modify(|s| s.progress = 100);
    }

    fn finish(&self, cancelled: bool) {
        self.status.send_modify(|s| {
            s.is_loading = false;
            s.is_speaking = false;
            if !cancelled {
                s.progress = 100;
            }
            s.current_text = None;
        });
    }
}

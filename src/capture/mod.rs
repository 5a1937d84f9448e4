//! Speech capture: a backend-agnostic wrapper around a recognition
//! engine. The wrapper owns lifecycle, confidence gating, and error
//! translation; backends only produce raw events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
    pub max_alternatives: usize,
    /// Final transcripts below this confidence are surfaced as errors
    /// instead of results.
    pub confidence_threshold: f32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: true,
            language: "en-US".to_string(),
            max_alternatives: 1,
            confidence_threshold: 0.7,
        }
    }
}

impl CaptureOptions {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            language: std::env::var("AURA_STT_LANGUAGE").unwrap_or(defaults.language),
            confidence_threshold: std::env::var("AURA_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.confidence_threshold),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    pub is_final: bool,
    pub alternatives: Vec<String>,
}

/// Events the capture wrapper emits to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Started,
    SpeechStart,
    Result(Transcript),
    SpeechEnd,
    Error(String),
    /// Always delivered once per capture run, error or not.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Listening,
    Stopped,
}

/// Recognition failure classes, mapped to user-facing wording in one
/// place so every backend reads the same to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionError {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Aborted,
    BadGrammar,
    Other,
}

impl RecognitionError {
    pub fn human_message(&self) -> &'static str {
        match self {
            RecognitionError::NoSpeech => "No speech detected. Please try again.",
            RecognitionError::AudioCapture => {
                "Microphone not available. Please check your microphone."
            }
            RecognitionError::NotAllowed => {
                "Microphone permission denied. Please allow microphone access."
            }
            RecognitionError::Network => "Network error occurred. Please check your connection.",
            RecognitionError::Aborted => "Speech recognition was stopped.",
            RecognitionError::BadGrammar => "Speech recognition grammar error.",
            RecognitionError::Other => "Speech recognition error occurred.",
        }
    }
}

/// Raw events a backend produces. The wrapper translates these into
/// `CaptureEvent`s, applying the confidence gate.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Started,
    SpeechStart,
    Result(Transcript),
    SpeechEnd,
    Error(RecognitionError),
    Ended,
}

#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Ask for microphone access. `Ok(true)` means granted.
    async fn request_microphone(&self) -> Result<bool>;

    /// Begin recognition, streaming raw events into `events` until the
    /// run ends. Implementations must emit `Ended` exactly once.
    async fn start(&self, options: CaptureOptions, events: mpsc::Sender<BackendEvent>)
        -> Result<()>;

    async fn stop(&self);

    async fn abort(&self);
}

/// Backend for platforms with no recognition engine. Reports unsupported
/// so the wrapper degrades to text input.
pub struct UnsupportedBackend;

#[async_trait]
impl RecognitionBackend for UnsupportedBackend {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request_microphone(&self) -> Result<bool> {
        Ok(false)
    }

    async fn start(
        &self,
        _options: CaptureOptions,
        events: mpsc::Sender<BackendEvent>,
    ) -> Result<()> {
        let _ = events.send(BackendEvent::Ended).await;
        Ok(())
    }

    async fn stop(&self) {}

    async fn abort(&self) {}
}

pub struct SpeechCapture {
    backend: Arc<dyn RecognitionBackend>,
    options: CaptureOptions,
    events: mpsc::Sender<CaptureEvent>,
    state: Arc<Mutex<CaptureState>>,
}

impl SpeechCapture {
    pub fn new(
        backend: Arc<dyn RecognitionBackend>,
        options: CaptureOptions,
        events: mpsc::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            backend,
            options,
            events,
            state: Arc::new(Mutex::new(CaptureState::Idle)),
        }
    }

    /// Check backend support. Unsupported platforms get one error event
    /// pointing the user at the text input, and `false` back.
    pub async fn initialize(&self) -> bool {
        if self.backend.is_supported() {
            return true;
        }
        warn!("speech recognition backend not supported on this platform");
        let _ = self
            .events
            .send(CaptureEvent::Error(
                "Speech recognition is not supported in this environment. \
                 Please use the text input instead."
                    .to_string(),
            ))
            .await;
        false
    }

    /// Start a capture run. Returns `false` without side effects when a
    /// run is already active or the microphone is unavailable.
    pub async fn start_listening(&self) -> bool {
        {
            let mut state = self.state.lock().await;
            if *state != CaptureState::Idle && *state != CaptureState::Stopped {
                warn!(state = ?*state, "start_listening while capture already active");
                return false;
            }
            *state = CaptureState::Starting;
        }

        if !self.backend.is_supported() {
            self.set_state(CaptureState::Idle).await;
            return self.initialize().await;
        }

        match self.backend.request_microphone().await {
            Ok(true) => {}
            Ok(false) => {
                let _ = self
                    .events
                    .send(CaptureEvent::Error(
                        RecognitionError::NotAllowed.human_message().to_string(),
                    ))
                    .await;
                self.set_state(CaptureState::Idle).await;
                return false;
            }
            Err(e) => {
                let _ = self.events.send(CaptureEvent::Error(e.to_string())).await;
                self.set_state(CaptureState::Idle).await;
                return false;
            }
        }

        let (raw_tx, raw_rx) = mpsc::channel(32);
        if let Err(e) = self.backend.start(self.options.clone(), raw_tx).await {
            let _ = self.events.send(CaptureEvent::Error(e.to_string())).await;
            self.set_state(CaptureState::Idle).await;
            return false;
        }

        self.set_state(CaptureState::Listening).await;
        info!("speech capture started");
        self.spawn_pump(raw_rx);
        true
    }

    /// Idempotent: stopping while idle is a no-op.
    pub async fn stop_listening(&self) {
        let mut state = self.state.lock().await;
        if *state != CaptureState::Listening && *state != CaptureState::Starting {
            return;
        }
        *state = CaptureState::Stopped;
        drop(state);
        self.backend.stop().await;
        info!("speech capture stopped");
    }

    /// Tear down without waiting for final results.
    pub async fn cleanup(&self) {
        self.backend.abort().await;
        self.set_state(CaptureState::Idle).await;
    }

    pub async fn state(&self) -> CaptureState {
        *self.state.lock().await
    }

    async fn set_state(&self, state: CaptureState) {
        *self.state.lock().await = state;
    }

    /// Forward raw backend events to the consumer, gating low-confidence
    /// finals. `Ended` is always delivered, even after errors, and marks
    /// the run over so the capture can be started again.
    fn spawn_pump(&self, mut raw: mpsc::Receiver<BackendEvent>) {
        let events = self.events.clone();
        let state = Arc::clone(&self.state);
        let threshold = self.options.confidence_threshold;
        tokio::spawn(async move {
            let mut ended = false;
            while let Some(event) = raw.recv().await {
                let translated = match event {
                    BackendEvent::Started => CaptureEvent::Started,
                    BackendEvent::SpeechStart => CaptureEvent::SpeechStart,
                    BackendEvent::Result(transcript) => {
                        if transcript.is_final && transcript.confidence < threshold {
                            debug!(
                                confidence = transcript.confidence,
                                threshold, "rejecting low-confidence final transcript"
                            );
                            CaptureEvent::Error(format!(
                                "Low confidence: {:.1}%",
                                transcript.confidence * 100.0
                            ))
                        } else {
                            CaptureEvent::Result(transcript)
                        }
                    }
                    BackendEvent::SpeechEnd => CaptureEvent::SpeechEnd,
                    BackendEvent::Error(e) => {
                        CaptureEvent::Error(e.human_message().to_string())
                    }
                    BackendEvent::Ended => {
                        // Mark the run over before forwarding, so a consumer
                        // reacting to `Ended` can restart immediately.
                        *state.lock().await = CaptureState::Stopped;
                        ended = true;
                        let _ = events.send(CaptureEvent::Ended).await;
                        break;
                    }
                };
                if events.send(translated).await.is_err() {
                    break;
                }
            }
            // Backend close or consumer gone also ends the run. Skipped
            // after `Ended`: the consumer may already have restarted, and
            // this must not clobber the new run's state.
            if !ended {
                *state.lock().await = CaptureState::Stopped;
            }
        });
    }
}

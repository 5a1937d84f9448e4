//! Session orchestration: the state machine that ties capture,
//! classification, AI fallback, validation, execution, and speech into
//! one voice turn at a time.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::ai::IntentAnalyzer;
use crate::capture::{CaptureEvent, SpeechCapture};
use crate::classifier::FastClassifier;
use crate::command::{validate_command, ExecutionEngine};
use crate::context::ContextExtractor;
use crate::intent::{CommandAction, ConversationEntry, IntentResponse};
use crate::speech::{SpeakOptions, SpeechOutput};
use crate::store::{Notification, NotificationHub, NotificationKind, RouteState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Listening,
    Processing,
    Speaking,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Below this response confidence nothing executes.
    pub execution_floor: f32,
    /// Commands flagged for confirmation need at least this confidence.
    pub confirmation_bar: f32,
    /// Conversation turns kept, oldest evicted first.
    pub history_limit: usize,
    pub speak_options: SpeakOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            execution_floor: 0.5,
            confirmation_bar: 0.8,
            history_limit: 10,
            speak_options: SpeakOptions::default(),
        }
    }
}

/// Summary of one processed utterance.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: IntentResponse,
    pub executed: usize,
    pub skipped: usize,
    pub used_ai: bool,
}

pub struct VoiceSession {
    capture: Arc<SpeechCapture>,
    extractor: ContextExtractor,
    classifier: FastClassifier,
    analyzer: IntentAnalyzer,
    engine: ExecutionEngine,
    speech: Arc<SpeechOutput>,
    notifier: Arc<NotificationHub>,
    route: Arc<RouteState>,
    config: SessionConfig,
    phase: Mutex<SessionPhase>,
    history: Mutex<VecDeque<ConversationEntry>>,
    last_response: Mutex<Option<String>>,
}

impl VoiceSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        capture: Arc<SpeechCapture>,
        extractor: ContextExtractor,
        classifier: FastClassifier,
        analyzer: IntentAnalyzer,
        engine: ExecutionEngine,
        speech: Arc<SpeechOutput>,
        notifier: Arc<NotificationHub>,
        route: Arc<RouteState>,
        config: SessionConfig,
    ) -> Self {
        Self {
            capture,
            extractor,
            classifier,
            analyzer,
            engine,
            speech,
            notifier,
            route,
            config,
            phase: Mutex::new(SessionPhase::Idle),
            history: Mutex::new(VecDeque::new()),
            last_response: Mutex::new(None),
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.phase.lock().await.clone()
    }

    pub async fn history(&self) -> Vec<ConversationEntry> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Leave the error phase without starting a new capture.
    pub async fn clear_error(&self) {
        let mut phase = self.phase.lock().await;
        if matches!(*phase, SessionPhase::Error(_)) {
            *phase = SessionPhase::Idle;
        }
    }

    /// Begin a capture run. Clears a lingering error first; a session in
    /// the middle of a turn refuses to start.
    pub async fn start_listening(&self) -> bool {
        {
            let mut phase = self.phase.lock().await;
            match &*phase {
                SessionPhase::Processing | SessionPhase::Speaking => {
                    warn!("start_listening while a turn is in flight");
                    return false;
                }
                SessionPhase::Listening => return false,
                _ => *phase = SessionPhase::Idle,
            }
        }
        if self.capture.start_listening().await {
            *self.phase.lock().await = SessionPhase::Listening;
            true
        } else {
            false
        }
    }

    /// Idempotent: stopping an idle session is a no-op.
    pub async fn stop_listening(&self) {
        self.capture.stop_listening().await;
        let mut phase = self.phase.lock().await;
        if *phase == SessionPhase::Listening {
            *phase = SessionPhase::Idle;
        }
    }

    /// Drive the session from a capture event stream until it closes.
    pub async fn run(&self, mut events: mpsc::Receiver<CaptureEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_capture_event(event).await;
        }
    }

    pub async fn handle_capture_event(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::Started => {
                *self.phase.lock().await = SessionPhase::Listening;
            }
            CaptureEvent::SpeechStart | CaptureEvent::SpeechEnd => {}
            CaptureEvent::Result(transcript) => {
                if transcript.is_final {
                    self.process_utterance(&transcript.text, transcript.confidence)
                        .await;
                } else {
                    debug!(text = %transcript.text, "interim transcript");
                }
            }
            CaptureEvent::Error(message) => {
                warn!(%message, "capture error");
                *self.phase.lock().await = SessionPhase::Error(message);
            }
            CaptureEvent::Ended => {
                let mut phase = self.phase.lock().await;
                if *phase == SessionPhase::Listening {
                    *phase = SessionPhase::Idle;
                }
            }
        }
    }

    /// Typed input path, for the text box next to the microphone button.
    pub async fn process_text(&self, text: &str) -> Option<TurnOutcome> {
        self.process_utterance(text, 1.0).await
    }

    /// Run one utterance through the whole pipeline. Returns `None` only
    /// for blank input.
    pub async fn process_utterance(&self, text: &str, confidence: f32) -> Option<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        info!(%text, confidence, "processing utterance");
        *self.phase.lock().await = SessionPhase::Processing;

        let context = self.extractor.extract(&self.route);

        let classification = self.classifier.classify(text);
        let used_ai = classification.requires_ai;
        let mut response = match classification.intent {
            Some(intent) if !classification.requires_ai => intent,
            _ => {
                debug!(reason = ?classification.reason, "deferring to AI analysis");
                let history = self.history().await;
                self.analyzer.analyze(text, &context, &history).await
            }
        };
        response.sanitize();

        self.push_history(ConversationEntry::new(text, response.response_text.clone()))
            .await;
        *self.last_response.lock().await = Some(response.response_text.clone());

        // Speak while commands execute; the turn ends when both are done.
        let speech = Arc::clone(&self.speech);
        let spoken = response.response_text.clone();
        let options = self.config.speak_options.clone();
        let speak_task = tokio::spawn(async move { speech.speak(&spoken, &options).await });

        let (executed, skipped) = self.execute_response(&response).await;

        *self.phase.lock().await = SessionPhase::Speaking;
        if let Err(e) = speak_task.await {
            warn!(error = %e, "speak task failed");
        }
        *self.phase.lock().await = SessionPhase::Idle;

        Some(TurnOutcome {
            response,
            executed,
            skipped,
            used_ai,
        })
    }

    /// Execute the commands of a classified response under the session's
    /// gating rules. Public so hosts can feed responses derived outside
    /// the capture path. Returns (executed, skipped).
    pub async fn execute_response(&self, response: &IntentResponse) -> (usize, usize) {
        if response.confidence < self.config.execution_floor {
            debug!(
                confidence = response.confidence,
                floor = self.config.execution_floor,
                "response below execution floor, nothing executes"
            );
            return (0, response.commands.len());
        }
        if response.commands.is_empty() {
            return (0, 0);
        }

        let mut executed = 0;
        let mut skipped = 0;
        for command in &response.commands {
            // Confirmation is gated on the weakest link: a confident
            // command inside a shaky response is still a shaky read.
            let effective_confidence = response.confidence.min(command.confidence);
            if command.requires_confirmation
                && effective_confidence < self.config.confirmation_bar
            {
                self.notifier.show(
                    Notification::new(
                        NotificationKind::Info,
                        "Needs confirmation",
                        "I wasn't sure enough to do that automatically. Could you repeat it?",
                    )
                    .with_duration(4_000),
                );
                skipped += 1;
                continue;
            }

            // Session-level interceptions: these need session state the
            // engine doesn't have.
            match &command.action {
                CommandAction::Repeat => {
                    if let Some(last) = self.last_response.lock().await.clone() {
                        let _ = self.speech.speak(&last, &self.config.speak_options).await;
                        executed += 1;
                        continue;
                    }
                }
                CommandAction::Stop => {
                    self.speech.stop().await;
                    self.capture.stop_listening().await;
                    executed += 1;
                    continue;
                }
                _ => {}
            }

            // Re-extract per command: an earlier command in this turn may
            // have changed the cart or the route.
            let context = self.extractor.extract(&self.route);
            let validation = validate_command(command, &context);
            if !validation.is_valid {
                let fixes = validation.suggested_fixes.join(" ");
                self.notifier.show(
                    Notification::new(
                        NotificationKind::Warning,
                        "Skipped",
                        format!(
                            "{} {fixes}",
                            validation.errors.first().cloned().unwrap_or_default()
                        ),
                    )
                    .with_duration(5_000),
                );
                skipped += 1;
                continue;
            }

            let result = self.engine.execute(command, &context);
            if result.success {
                executed += 1;
            } else {
                skipped += 1;
            }
        }
        (executed, skipped)
    }

    async fn push_history(&self, entry: ConversationEntry) {
        let mut history = self.history.lock().await;
        history.push_back(entry);
        while history.len() > self.config.history_limit {
            history.pop_front();
        }
    }
}

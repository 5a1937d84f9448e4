use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use aura::capture::{
    BackendEvent, CaptureEvent, CaptureOptions, RecognitionBackend, RecognitionError,
    SpeechCapture, Transcript, UnsupportedBackend,
};
use aura::Result;

/// Backend that replays a fixed script of raw events. With `hold_open`
/// the stream stays live after the script, like a recognizer that is
/// still listening.
struct ScriptedBackend {
    script: Vec<BackendEvent>,
    hold_open: bool,
}

#[async_trait]
impl RecognitionBackend for ScriptedBackend {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_microphone(&self) -> Result<bool> {
        Ok(true)
    }

    async fn start(
        &self,
        _options: CaptureOptions,
        events: mpsc::Sender<BackendEvent>,
    ) -> Result<()> {
        let script = self.script.clone();
        let hold_open = self.hold_open;
        tokio::spawn(async move {
            for event in script {
                if events.send(event).await.is_err() {
                    return;
                }
            }
            if hold_open {
                // Keep the raw channel alive so the run never ends.
                std::future::pending::<()>().await;
            }
        });
        Ok(())
    }

    async fn stop(&self) {}

    async fn abort(&self) {}
}

fn transcript(text: &str, confidence: f32, is_final: bool) -> Transcript {
    Transcript {
        text: text.to_string(),
        confidence,
        is_final,
        alternatives: Vec::new(),
    }
}

fn capture_with(
    script: Vec<BackendEvent>,
    threshold: f32,
) -> (SpeechCapture, mpsc::Receiver<CaptureEvent>) {
    let (tx, rx) = mpsc::channel(32);
    let options = CaptureOptions {
        confidence_threshold: threshold,
        ..CaptureOptions::default()
    };
    (
        SpeechCapture::new(
            Arc::new(ScriptedBackend {
                script,
                hold_open: false,
            }),
            options,
            tx,
        ),
        rx,
    )
}

#[tokio::test]
async fn unsupported_backend_degrades_to_text_input() {
    let (tx, mut rx) = mpsc::channel(8);
    let capture = SpeechCapture::new(Arc::new(UnsupportedBackend), CaptureOptions::default(), tx);

    assert!(!capture.initialize().await, "unsupported platform must report false");
    match rx.recv().await {
        Some(CaptureEvent::Error(message)) => {
            assert!(
                message.contains("text input"),
                "error must point the user at the text input: {message}"
            );
        }
        other => panic!("expected an error event, got {other:?}"),
    }
}

#[tokio::test]
async fn confident_final_transcript_passes_through() {
    let (capture, mut rx) = capture_with(
        vec![
            BackendEvent::Started,
            BackendEvent::Result(transcript("show my cart", 0.93, true)),
            BackendEvent::Ended,
        ],
        0.7,
    );

    assert!(capture.start_listening().await, "scripted backend starts cleanly");
    assert_eq!(rx.recv().await, Some(CaptureEvent::Started));
    assert_eq!(
        rx.recv().await,
        Some(CaptureEvent::Result(transcript("show my cart", 0.93, true)))
    );
    assert_eq!(rx.recv().await, Some(CaptureEvent::Ended), "Ended always arrives");
}

#[tokio::test]
async fn low_confidence_final_becomes_an_error() {
    let (capture, mut rx) = capture_with(
        vec![
            BackendEvent::Result(transcript("mumble", 0.55, true)),
            BackendEvent::Ended,
        ],
        0.7,
    );

    assert!(capture.start_listening().await);
    match rx.recv().await {
        Some(CaptureEvent::Error(message)) => {
            assert_eq!(message, "Low confidence: 55.0%", "error names the exact confidence");
        }
        other => panic!("expected a low-confidence error, got {other:?}"),
    }
    assert_eq!(rx.recv().await, Some(CaptureEvent::Ended), "Ended still follows the error");
}

#[tokio::test]
async fn interim_transcripts_skip_the_confidence_gate() {
    let (capture, mut rx) = capture_with(
        vec![
            BackendEvent::Result(transcript("sho", 0.2, false)),
            BackendEvent::Ended,
        ],
        0.7,
    );

    assert!(capture.start_listening().await);
    assert_eq!(
        rx.recv().await,
        Some(CaptureEvent::Result(transcript("sho", 0.2, false))),
        "interims pass through regardless of confidence"
    );
}

#[tokio::test]
async fn backend_errors_use_human_wording() {
    let (capture, mut rx) = capture_with(
        vec![
            BackendEvent::Error(RecognitionError::NotAllowed),
            BackendEvent::Ended,
        ],
        0.7,
    );

    assert!(capture.start_listening().await);
    match rx.recv().await {
        Some(CaptureEvent::Error(message)) => {
            assert_eq!(message, "Microphone permission denied. Please allow microphone access.");
        }
        other => panic!("expected an error event, got {other:?}"),
    }
}

#[tokio::test]
async fn start_while_listening_is_refused() {
    // A held-open stream means the run never ends on its own.
    let (tx, _rx) = mpsc::channel(32);
    let capture = SpeechCapture::new(
        Arc::new(ScriptedBackend {
            script: vec![BackendEvent::Started],
            hold_open: true,
        }),
        CaptureOptions::default(),
        tx,
    );

    assert!(capture.start_listening().await, "first start succeeds");
    assert!(
        !capture.start_listening().await,
        "second start while active must be refused"
    );
}

#[tokio::test]
async fn capture_restarts_after_a_run_ends() {
    let (capture, mut rx) = capture_with(
        vec![
            BackendEvent::Started,
            BackendEvent::Result(transcript("checkout", 0.9, true)),
            BackendEvent::Ended,
        ],
        0.7,
    );

    assert!(capture.start_listening().await, "first run starts");
    // Drain the first run to its Ended marker.
    loop {
        match rx.recv().await {
            Some(CaptureEvent::Ended) => break,
            Some(_) => {}
            None => panic!("channel closed before Ended"),
        }
    }

    assert!(
        capture.start_listening().await,
        "second start after the previous run ended must succeed"
    );
    // The new run produces a full event stream of its own.
    loop {
        match rx.recv().await {
            Some(CaptureEvent::Ended) => break,
            Some(_) => {}
            None => panic!("channel closed before the second run's Ended"),
        }
    }
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (capture, _rx) = capture_with(vec![BackendEvent::Started], 0.7);

    // Stopping before any start must be harmless.
    capture.stop_listening().await;
    assert!(capture.start_listening().await);
    capture.stop_listening().await;
    capture.stop_listening().await;
}

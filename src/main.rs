use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use aura::ai::IntentAnalyzer;
use aura::capture::{SpeechCapture, UnsupportedBackend};
use aura::classifier::FastClassifier;
use aura::command::{ExecutionEngine, ShoppingHandler};
use aura::config::AppConfig;
use aura::context::ContextExtractor;
use aura::session::{SessionConfig, VoiceSession};
use aura::speech::{HttpVoiceEngine, SpeechOutput, SynthesisEngine, SystemVoiceEngine};
use aura::store::{
    CartStore, NotificationHub, ProductCatalog, RouteNavigator, RouteState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    tracing::info!("voice assistant starting");

    let config = AppConfig::from_env();

    // Stores and outward surfaces.
    let catalog = Arc::new(ProductCatalog::with_demo_inventory());
    let cart = Arc::new(CartStore::new());
    let route = Arc::new(RouteState::new());
    let navigator = Arc::new(RouteNavigator::new(Arc::clone(&route)));
    let notifier = Arc::new(NotificationHub::new());
    notifier.register(|n| {
        println!("[{:?}] {}: {}", n.kind, n.title, n.message);
        for action in &n.actions {
            println!("         ({})", action.label);
        }
    });

    // Synthesis cascade: remote endpoint first when configured, then the
    // local system voice.
    let mut engines: Vec<Arc<dyn SynthesisEngine>> = Vec::new();
    if let Some(endpoint) = &config.tts_endpoint {
        engines.push(Arc::new(HttpVoiceEngine::new(
            endpoint.clone(),
            config.tts_api_key.clone(),
        )));
    }
    engines.push(Arc::new(SystemVoiceEngine::new(config.tts_program.clone())));
    let speech = Arc::new(SpeechOutput::new(engines));

    // This binary drives the pipeline from stdin; real speech capture
    // plugs in through the same event channel.
    let (capture_tx, capture_rx) = mpsc::channel(32);
    let capture = Arc::new(SpeechCapture::new(
        Arc::new(UnsupportedBackend),
        config.capture.clone(),
        capture_tx,
    ));

    let session = Arc::new(VoiceSession::new(
        Arc::clone(&capture),
        ContextExtractor::new(Arc::clone(&cart), Arc::clone(&catalog)),
        FastClassifier::new(),
        IntentAnalyzer::new(config.ai.clone()),
        ExecutionEngine::new(
            ShoppingHandler::new(Arc::clone(&catalog), Arc::clone(&cart)),
            Arc::clone(&cart),
            Arc::clone(&notifier),
            navigator,
        ),
        Arc::clone(&speech),
        Arc::clone(&notifier),
        Arc::clone(&route),
        SessionConfig::default(),
    ));

    {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.run(capture_rx).await });
    }

    println!("Type a command (for example: search for headphones). Ctrl+D exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(outcome) = session.process_text(&line).await {
            println!("> {}", outcome.response.response_text);
            tracing::debug!(
                executed = outcome.executed,
                skipped = outcome.skipped,
                used_ai = outcome.used_ai,
                "turn complete"
            );
        }
    }

    tracing::info!("voice assistant shutting down");
    Ok(())
}

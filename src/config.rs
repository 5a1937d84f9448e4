//! Process configuration, assembled from environment variables with
//! workable defaults for a local demo run.

use crate::ai::AiConfig;
use crate::capture::CaptureOptions;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub capture: CaptureOptions,
    /// Local TTS program for the system voice engine.
    pub tts_program: String,
    /// Optional remote synthesis endpoint for the HTTP voice engine.
    pub tts_endpoint: Option<String>,
    pub tts_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            ai: AiConfig::from_env(),
            capture: CaptureOptions::from_env(),
            tts_program: std::env::var("AURA_TTS_PROGRAM").unwrap_or_else(|_| "say".to_string()),
            tts_endpoint: std::env::var("AURA_TTS_ENDPOINT").ok().filter(|e| !e.is_empty()),
            tts_api_key: std::env::var("AURA_TTS_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

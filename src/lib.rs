//! Voice command pipeline for a shopping assistant: speech capture,
//! two-stage intent classification (deterministic fast path with an AI
//! fallback), command validation and execution against catalog and cart
//! stores, and spoken feedback through a synthesis engine cascade.

pub mod ai;
pub mod capture;
pub mod classifier;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod intent;
pub mod session;
pub mod speech;
pub mod store;

pub use error::{Result, VoiceError};
pub use session::VoiceSession;

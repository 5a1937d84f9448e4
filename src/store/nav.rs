use std::sync::{Arc, Mutex};

use tracing::info;

/// A logical navigation request: destination path plus query parameters.
/// How it turns into an actual route change is the sink's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl NavigationRequest {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Path with the percent-encoded query string appended.
    pub fn url(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Minimal percent-encoding for query components.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

pub trait NavigationSink: Send + Sync {
    fn navigate(&self, request: NavigationRequest);
}

/// Point-in-time route the context extractor reads: current path plus
/// parsed query parameters.
pub struct RouteState {
    current: Mutex<(String, Vec<(String, String)>)>,
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteState {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(("/".to_string(), Vec::new())),
        }
    }

    pub fn set(&self, path: impl Into<String>, params: Vec<(String, String)>) {
        if let Ok(mut current) = self.current.lock() {
            *current = (path.into(), params);
        }
    }

    pub fn path(&self) -> String {
        self.current
            .lock()
            .map(|c| c.0.clone())
            .unwrap_or_else(|_| "/".to_string())
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        let current = self.current.lock().ok()?;
        current
            .1
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn query_params(&self) -> Vec<(String, String)> {
        self.current.lock().map(|c| c.1.clone()).unwrap_or_default()
    }
}

/// Navigation sink that applies requests to a shared `RouteState`, the way
/// a router integration would push a URL change.
pub struct RouteNavigator {
    route: Arc<RouteState>,
}

impl RouteNavigator {
    pub fn new(route: Arc<RouteState>) -> Self {
        Self { route }
    }
}

impl NavigationSink for RouteNavigator {
    fn navigate(&self, request: NavigationRequest) {
        info!(url = %request.url(), "navigating");
        self.route.set(request.path, request.params);
    }
}

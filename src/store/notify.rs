use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use super::cart::CartItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// What invoking a notification action does. Actions are data, not
/// closures, so observers (and tests) can inspect the payload and route it
/// back through the execution engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEffect {
    /// Re-insert the exact cart record that a removal took out.
    RestoreCartItem(CartItem),
    Navigate { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationAction {
    pub label: String,
    pub effect: NotificationEffect,
}

/// One user-facing notification. The sole UI feedback channel of the
/// execution engine, decoupled from its return value.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub duration_ms: Option<u64>,
    pub persistent: bool,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms: None,
            persistent: false,
            actions: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_action(mut self, label: impl Into<String>, effect: NotificationEffect) -> Self {
        self.actions.push(NotificationAction {
            label: label.into(),
            effect,
        });
        self
    }
}

type Callback = Box<dyn Fn(&Notification) + Send + Sync>;

/// Fan-out registry for notification observers. Any number of observers may
/// register; the core does not care how they render.
#[derive(Default)]
pub struct NotificationHub {
    callbacks: Mutex<Vec<Callback>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(Box::new(callback));
        }
    }

    pub fn show(&self, notification: Notification) {
        if let Ok(callbacks) = self.callbacks.lock() {
            for callback in callbacks.iter() {
                callback(&notification);
            }
        }
    }
}

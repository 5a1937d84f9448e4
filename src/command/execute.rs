//! Command execution. The engine owns all side effects of a voice turn:
//! cart mutations through the shopping handler, navigation through the
//! sink, and user feedback through the notification hub. It never
//! returns an error; failures become a failed `ExecutionResult` so the
//! session always has something to say.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::context::PageContext;
use crate::intent::{Command, CommandAction};
use crate::store::{
    CartStore, NavigationRequest, NavigationSink, Notification, NotificationAction,
    NotificationEffect, NotificationHub, NotificationKind,
};

use super::shopping::ShoppingHandler;
use super::validate::validate_command;

/// What one command produced: a spoken-back message, optional structured
/// data, and the navigation it implied.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Vec<String>,
    pub next_actions: Vec<String>,
    pub navigation: Option<NavigationRequest>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: Vec::new(),
            next_actions: Vec::new(),
            navigation: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            errors: vec![message.clone()],
            message,
            data: None,
            next_actions: Vec::new(),
            navigation: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_navigation(mut self, request: NavigationRequest) -> Self {
        self.navigation = Some(request);
        self
    }

    pub fn with_next_actions(mut self, actions: &[&str]) -> Self {
        self.next_actions = actions.iter().map(|s| s.to_string()).collect();
        self
    }
}

pub struct ExecutionEngine {
    shopping: ShoppingHandler,
    cart: Arc<CartStore>,
    notifier: Arc<NotificationHub>,
    navigator: Arc<dyn NavigationSink>,
}

impl ExecutionEngine {
    pub fn new(
        shopping: ShoppingHandler,
        cart: Arc<CartStore>,
        notifier: Arc<NotificationHub>,
        navigator: Arc<dyn NavigationSink>,
    ) -> Self {
        Self {
            shopping,
            cart,
            notifier,
            navigator,
        }
    }

    /// Execute one command. Shopping actions go to the handler whole; the
    /// engine validates everything else itself before acting.
    pub fn execute(&self, command: &Command, context: &PageContext) -> ExecutionResult {
        info!(action = command.action.action().as_str(), "executing command");

        let result = if command.action.is_shopping() {
            let outcome = self.shopping.handle(&command.action, context);
            if let Some(removed) = outcome.removed {
                self.notifier.show(
                    Notification::new(
                        NotificationKind::Success,
                        "Removed from cart",
                        outcome.result.message.clone(),
                    )
                    .with_duration(5_000)
                    .with_action("Undo", NotificationEffect::RestoreCartItem(removed)),
                );
            } else {
                self.notify_outcome(&outcome.result);
            }
            outcome.result
        } else {
            let validation = validate_command(command, context);
            if !validation.is_valid {
                let message = validation
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "That command isn't valid right now.".to_string());
                let mut result = ExecutionResult::failure(message);
                result.next_actions = validation.suggested_fixes;
                self.notify_outcome(&result);
                return result;
            }
            let result = self.execute_auxiliary(&command.action, context);
            self.notify_outcome(&result);
            result
        };

        if let Some(request) = &result.navigation {
            self.navigator.navigate(request.clone());
        }
        result
    }

    fn execute_auxiliary(&self, action: &CommandAction, _context: &PageContext) -> ExecutionResult {
        match action {
            CommandAction::UpdateQuantity {
                item_id,
                product_name,
                quantity,
            } => {
                let quantity = quantity.unwrap_or(1).max(0) as u32;
                match self
                    .cart
                    .update_quantity(item_id.as_deref(), product_name.as_deref(), quantity)
                {
                    Some(item) if quantity == 0 => ExecutionResult::success(format!(
                        "Removed {} from your cart.",
                        item.name
                    )),
                    Some(item) => ExecutionResult::success(format!(
                        "Updated {} to quantity {}.",
                        item.name, item.quantity
                    )),
                    None => ExecutionResult::failure("I couldn't find that item in your cart."),
                }
            }

            CommandAction::NavigateTo { page } => {
                let path = match page.trim().to_lowercase().as_str() {
                    "home" => "/".to_string(),
                    other => format!("/{other}"),
                };
                ExecutionResult::success(format!("Taking you to {page}."))
                    .with_navigation(NavigationRequest::to(path))
            }

            CommandAction::ApplyFilter { filters } => {
                let mut request = NavigationRequest::to("/products");
                for (key, value) in filters {
                    request = request.with_param(key, value);
                }
                let described: Vec<String> =
                    filters.iter().map(|(k, v)| format!("{k} {v}")).collect();
                ExecutionResult::success(format!("Filtering by {}.", described.join(", ")))
                    .with_navigation(request)
                    .with_next_actions(&["view_product", "add_to_cart"])
            }

            CommandAction::Help { topic } => ExecutionResult::success(help_text(topic.as_deref())),

            CommandAction::Repeat => {
                // The session resolves repeats against its own history; this
                // only triggers with nothing to repeat.
                ExecutionResult::success("I haven't said anything yet.")
            }

            CommandAction::Stop => ExecutionResult::success("Okay, stopping."),

            CommandAction::Unknown { action } => {
                warn!(action, "unknown command action");
                ExecutionResult::failure(format!(
                    "I don't know how to do \"{action}\" yet."
                ))
                .with_next_actions(&["help"])
            }

            // Shopping actions are routed before this point.
            other => ExecutionResult::failure(format!(
                "Action {} took the wrong execution path",
                other.action().as_str()
            )),
        }
    }

    /// Apply a notification action the user clicked (or a test invoked).
    pub fn apply_notification_action(&self, action: &NotificationAction) {
        match &action.effect {
            NotificationEffect::RestoreCartItem(item) => {
                info!(item = %item.id, "restoring cart item");
                self.cart.restore(item.clone());
                self.notifier.show(
                    Notification::new(
                        NotificationKind::Success,
                        "Restored",
                        format!("{} is back in your cart.", item.name),
                    )
                    .with_duration(3_000),
                );
            }
            NotificationEffect::Navigate { path } => {
                self.navigator.navigate(NavigationRequest::to(path.clone()));
            }
        }
    }

    fn notify_outcome(&self, result: &ExecutionResult) {
        let notification = if result.success {
            Notification::new(NotificationKind::Success, "Done", result.message.clone())
                .with_duration(3_000)
        } else {
            Notification::new(NotificationKind::Error, "Couldn't do that", result.message.clone())
                .with_duration(5_000)
        };
        self.notifier.show(notification);
    }
}

fn help_text(topic: Option<&str>) -> String {
    match topic.map(|t| t.to_lowercase()) {
        Some(topic) if topic.contains("search") => {
            "Try saying 'search for wireless headphones' or 'find laptops'.".to_string()
        }
        Some(topic) if topic.contains("cart") => {
            "Try 'show my cart', 'add this to my cart', or 'remove the headphones'.".to_string()
        }
        Some(topic) if topic.contains("checkout") => {
            "When your cart is ready, say 'checkout' to start your purchase.".to_string()
        }
        _ => "You can search for products, browse categories, manage your cart, \
              and check out. Try 'search for headphones' or 'show my cart'."
            .to_string(),
    }
}

//! Data model for one voice turn: intents, commands, and the aggregate
//! response that gets spoken and persisted into conversation history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Clamp a confidence into [0, 1]. Upstream sources (the AI endpoint in
/// particular) are not trusted to stay in range.
pub fn clamp_confidence(c: f32) -> f32 {
    if c.is_nan() {
        return 0.0;
    }
    c.clamp(0.0, 1.0)
}

/// Action identifiers the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SearchProducts,
    AddToCart,
    RemoveFromCart,
    ViewCart,
    BrowseCategory,
    ViewProduct,
    Checkout,
    NavigateTo,
    ApplyFilter,
    UpdateQuantity,
    Help,
    Repeat,
    Stop,
    Unknown,
}

impl Action {
    /// Lenient parse: unrecognized identifiers map to `Unknown` rather than
    /// failing, so forward-compatible commands survive classification.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "search_products" | "search" => Action::SearchProducts,
            "add_to_cart" => Action::AddToCart,
            "remove_from_cart" => Action::RemoveFromCart,
            "view_cart" | "show_cart" => Action::ViewCart,
            "browse_category" => Action::BrowseCategory,
            "view_product" => Action::ViewProduct,
            "checkout" => Action::Checkout,
            "navigate_to" | "navigate" => Action::NavigateTo,
            "apply_filter" => Action::ApplyFilter,
            "update_quantity" => Action::UpdateQuantity,
            "help" => Action::Help,
            "repeat" => Action::Repeat,
            "stop" | "cancel" => Action::Stop,
            _ => Action::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SearchProducts => "search_products",
            Action::AddToCart => "add_to_cart",
            Action::RemoveFromCart => "remove_from_cart",
            Action::ViewCart => "view_cart",
            Action::BrowseCategory => "browse_category",
            Action::ViewProduct => "view_product",
            Action::Checkout => "checkout",
            Action::NavigateTo => "navigate_to",
            Action::ApplyFilter => "apply_filter",
            Action::UpdateQuantity => "update_quantity",
            Action::Help => "help",
            Action::Repeat => "repeat",
            Action::Stop => "stop",
            Action::Unknown => "unknown",
        }
    }
}

/// Primary intent extracted from one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub action: Action,
    pub confidence: f32,
    #[serde(default)]
    pub entities: BTreeMap<String, Value>,
    #[serde(default)]
    pub clarification_needed: bool,
    #[serde(default)]
    pub clarification_question: Option<String>,
}

/// A typed entity mention found in the utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub confidence: f32,
}

/// Strongly-typed command parameters, keyed by action.
///
/// The per-action variants make the validation rules exhaustive-checkable
/// instead of poking into a free-form parameter map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum CommandAction {
    SearchProducts {
        query: String,
        category: Option<String>,
    },
    AddToCart {
        product_id: Option<String>,
        product_name: Option<String>,
        quantity: Option<i64>,
        size: Option<String>,
        color: Option<String>,
    },
    RemoveFromCart {
        item_id: Option<String>,
        product_name: Option<String>,
    },
    UpdateQuantity {
        item_id: Option<String>,
        product_name: Option<String>,
        quantity: Option<i64>,
    },
    ViewCart,
    BrowseCategory {
        category: String,
    },
    ViewProduct {
        product_id: String,
    },
    Checkout,
    NavigateTo {
        page: String,
    },
    ApplyFilter {
        filters: BTreeMap<String, String>,
    },
    Help {
        topic: Option<String>,
    },
    Repeat,
    Stop,
    Unknown {
        action: String,
    },
}

/// Filter keys the listing UI understands.
pub const VALID_FILTERS: [&str; 6] = ["category", "size", "color", "brand", "price_range", "rating"];

impl CommandAction {
    pub fn action(&self) -> Action {
        match self {
            CommandAction::SearchProducts { .. } => Action::SearchProducts,
            CommandAction::AddToCart { .. } => Action::AddToCart,
            CommandAction::RemoveFromCart { .. } => Action::RemoveFromCart,
            CommandAction::UpdateQuantity { .. } => Action::UpdateQuantity,
            CommandAction::ViewCart => Action::ViewCart,
            CommandAction::BrowseCategory { .. } => Action::BrowseCategory,
            CommandAction::ViewProduct { .. } => Action::ViewProduct,
            CommandAction::Checkout => Action::Checkout,
            CommandAction::NavigateTo { .. } => Action::NavigateTo,
            CommandAction::ApplyFilter { .. } => Action::ApplyFilter,
            CommandAction::Help { .. } => Action::Help,
            CommandAction::Repeat => Action::Repeat,
            CommandAction::Stop => Action::Stop,
            CommandAction::Unknown { .. } => Action::Unknown,
        }
    }

    /// True for actions the shopping handler owns end to end.
    pub fn is_shopping(&self) -> bool {
        matches!(
            self.action(),
            Action::SearchProducts
                | Action::AddToCart
                | Action::RemoveFromCart
                | Action::ViewCart
                | Action::BrowseCategory
                | Action::ViewProduct
                | Action::Checkout
        )
    }

    /// Build a typed action from the wire shape `{ action, parameters }`.
    /// Unrecognized action identifiers become `Unknown`; missing or oddly
    /// typed parameters degrade to `None` instead of failing the turn.
    pub fn from_raw(action: &str, parameters: &Value) -> Self {
        fn get_str(v: &Value, key: &str) -> Option<String> {
            match v.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        }
        fn get_i64(v: &Value, key: &str) -> Option<i64> {
            match v.get(key) {
                Some(Value::Number(n)) => n.as_i64(),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            }
        }

        match Action::parse(action) {
            Action::SearchProducts => CommandAction::SearchProducts {
                query: get_str(parameters, "query").unwrap_or_default(),
                category: get_str(parameters, "category"),
            },
            Action::AddToCart => CommandAction::AddToCart {
                product_id: get_str(parameters, "productId")
                    .or_else(|| get_str(parameters, "product_id")),
                product_name: get_str(parameters, "productName")
                    .or_else(|| get_str(parameters, "product_name")),
                quantity: get_i64(parameters, "quantity"),
                size: get_str(parameters, "size"),
                color: get_str(parameters, "color"),
            },
            Action::RemoveFromCart => CommandAction::RemoveFromCart {
                item_id: get_str(parameters, "itemId")
                    .or_else(|| get_str(parameters, "item_id"))
                    .or_else(|| get_str(parameters, "productId"))
                    .or_else(|| get_str(parameters, "product_id")),
                product_name: get_str(parameters, "productName")
                    .or_else(|| get_str(parameters, "product_name")),
            },
            Action::UpdateQuantity => CommandAction::UpdateQuantity {
                item_id: get_str(parameters, "itemId")
                    .or_else(|| get_str(parameters, "item_id")),
                product_name: get_str(parameters, "productName")
                    .or_else(|| get_str(parameters, "product_name")),
                quantity: get_i64(parameters, "quantity"),
            },
            Action::ViewCart => CommandAction::ViewCart,
            Action::BrowseCategory => CommandAction::BrowseCategory {
                category: get_str(parameters, "category").unwrap_or_default(),
            },
            Action::ViewProduct => CommandAction::ViewProduct {
                product_id: get_str(parameters, "productId")
                    .or_else(|| get_str(parameters, "product_id"))
                    .unwrap_or_default(),
            },
            Action::Checkout => CommandAction::Checkout,
            Action::NavigateTo => CommandAction::NavigateTo {
                page: get_str(parameters, "page").unwrap_or_default(),
            },
            Action::ApplyFilter => {
                let mut filters = BTreeMap::new();
                for key in VALID_FILTERS {
                    if let Some(v) = get_str(parameters, key) {
                        filters.insert(key.to_string(), v);
                    }
                }
                CommandAction::ApplyFilter { filters }
            }
            Action::Help => CommandAction::Help {
                topic: get_str(parameters, "topic"),
            },
            Action::Repeat => CommandAction::Repeat,
            Action::Stop => CommandAction::Stop,
            Action::Unknown => CommandAction::Unknown {
                action: action.trim().to_string(),
            },
        }
    }
}

/// One directly executable action derived from an intent.
/// Executed at most once per voice turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub action: CommandAction,
    pub confidence: f32,
    pub requires_confirmation: bool,
}

impl Command {
    pub fn new(action: CommandAction, confidence: f32) -> Self {
        Self {
            action,
            confidence: clamp_confidence(confidence),
            requires_confirmation: false,
        }
    }
}

/// The aggregate a classification pass produces: what the user meant, what
/// to do about it, and what to say back. Spoken aloud and persisted into
/// conversation history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub intent: Intent,
    pub entities: Vec<Entity>,
    pub commands: Vec<Command>,
    pub response_text: String,
    pub confidence: f32,
    pub requires_clarification: bool,
    pub clarification_question: Option<String>,
    pub suggested_actions: Vec<String>,
}

impl IntentResponse {
    /// Enforce the response invariants: every confidence in [0, 1] and a
    /// non-empty question whenever clarification is requested.
    pub fn sanitize(&mut self) {
        self.confidence = clamp_confidence(self.confidence);
        self.intent.confidence = clamp_confidence(self.intent.confidence);
        for entity in &mut self.entities {
            entity.confidence = clamp_confidence(entity.confidence);
        }
        for command in &mut self.commands {
            command.confidence = clamp_confidence(command.confidence);
        }
        if self.requires_clarification {
            let missing = self
                .clarification_question
                .as_deref()
                .map(|q| q.trim().is_empty())
                .unwrap_or(true);
            if missing {
                self.clarification_question =
                    Some("Could you tell me a bit more about what you'd like to do?".to_string());
            }
        }
    }
}

/// One completed voice turn, kept in the bounded session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub user_input: String,
    pub system_response: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(user_input: impl Into<String>, system_response: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            system_response: system_response.into(),
            timestamp: Utc::now(),
        }
    }
}

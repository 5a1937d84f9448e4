//! Slow-path intent analysis: one structured prompt to an external LLM
//! endpoint, strict-JSON parsing of whatever comes back, and a
//! deterministic fallback so the pipeline keeps answering with zero AI
//! connectivity.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::context::PageContext;
use crate::error::{Result, VoiceError};
use crate::intent::{
    clamp_confidence, Action, Command, CommandAction, ConversationEntry, Entity, Intent,
    IntentResponse,
};

/// Configuration for the AI endpoint. A missing API key is a supported
/// state: the analyzer then answers from the fallback rules alone.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-pro".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("AURA_AI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("AURA_AI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("AURA_AI_MODEL").unwrap_or(defaults.model),
            timeout: std::env::var("AURA_AI_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        }
    }
}

pub struct IntentAnalyzer {
    client: reqwest::Client,
    config: AiConfig,
}

impl IntentAnalyzer {
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Analyze one utterance against the current page context and the
    /// recent history. Always yields a coherent response: network errors,
    /// missing keys, and malformed completions all land in the fallback.
    pub async fn analyze(
        &self,
        text: &str,
        context: &PageContext,
        history: &[ConversationEntry],
    ) -> IntentResponse {
        let Some(api_key) = self.config.api_key.clone() else {
            debug!("no AI API key configured, answering from fallback rules");
            return fallback_response(text);
        };

        let prompt = build_prompt(text, context, history);
        let mut response = match self.request_completion(&api_key, &prompt).await {
            Ok(completion) => match parse_response(&completion) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "failed to parse AI completion, using fallback");
                    fallback_response(text)
                }
            },
            Err(e) => {
                warn!(error = %e, "AI endpoint call failed, using fallback");
                fallback_response(text)
            }
        };
        response.sanitize();
        response
    }

    async fn request_completion(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.3,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 1024,
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VoiceError::Endpoint(format!(
                "AI endpoint returned {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| VoiceError::Parse("no completion text in response".to_string()))
    }
}

fn build_prompt(text: &str, context: &PageContext, history: &[ConversationEntry]) -> String {
    let recent: Vec<String> = history
        .iter()
        .rev()
        .take(3)
        .rev()
        .map(|h| format!("User: \"{}\" | Assistant: \"{}\"", h.user_input, h.system_response))
        .collect();

    format!(
        r#"You are an advanced e-commerce voice assistant. Analyze the user's voice command and provide a structured response.

CONTEXT:
- Current Page: {page}
- Product ID: {product_id}
- Product Name: {product_name}
- Product Price: {product_price}
- Cart Items: {cart_len} items
- Search Query: {search_query}
- Available Actions: {actions}

CONVERSATION HISTORY:
{history}

USER COMMAND: "{text}"

TASK: Respond with a single JSON object of this shape:
{{
  "intent": {{"action": "...", "confidence": 0.95, "entities": {{}}, "clarificationNeeded": false, "clarificationQuestion": null}},
  "entities": [{{"type": "product", "value": "...", "confidence": 0.9}}],
  "commands": [{{"action": "...", "parameters": {{}}, "confidence": 0.9, "requiresConfirmation": false}}],
  "responseText": "...",
  "confidence": 0.95,
  "requiresClarification": false,
  "clarificationQuestion": null,
  "suggestedActions": []
}}

AVAILABLE ACTIONS:
- search_products: Search for products by name, category, or description
- add_to_cart: Add product to shopping cart
- remove_from_cart: Remove item from cart
- view_cart: Navigate to cart page and show cart contents
- browse_category: Browse products in a specific category
- view_product: Navigate to product detail page
- checkout: Start checkout process
- navigate_to: Go to a named page
- apply_filter: Apply listing filters
- update_quantity: Change a cart line's quantity

CONTEXT AWARENESS RULES:
1. If the user says "this" or "it" on a product page, refer to the current product
2. If the user says "add to cart" without a product, use the current product when on a product page
3. Consider conversation history for pronoun resolution
4. Use page context to disambiguate vague commands

Respond ONLY with valid JSON, no additional text."#,
        page = context.current_page.as_str(),
        product_id = context.product_id.as_deref().unwrap_or("N/A"),
        product_name = context.product_name.as_deref().unwrap_or("N/A"),
        product_price = context
            .product_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        cart_len = context.cart_items.len(),
        search_query = context.search_query.as_deref().unwrap_or("N/A"),
        actions = context.available_actions.join(", "),
        history = recent.join("\n"),
        text = text,
    )
}

/// Pull the first JSON object out of the completion text (models like to
/// wrap it in markdown fences) and coerce it into an `IntentResponse`.
pub fn parse_response(completion: &str) -> Result<IntentResponse> {
    let start = completion
        .find('{')
        .ok_or_else(|| VoiceError::Parse("no JSON object in completion".to_string()))?;
    let end = completion
        .rfind('}')
        .ok_or_else(|| VoiceError::Parse("unterminated JSON object in completion".to_string()))?;
    if end < start {
        return Err(VoiceError::Parse("unterminated JSON object in completion".to_string()));
    }
    let value: Value = serde_json::from_str(&completion[start..=end])
        .map_err(|e| VoiceError::Parse(e.to_string()))?;

    let intent_value = &value["intent"];
    let intent = Intent {
        action: Action::parse(intent_value["action"].as_str().unwrap_or("unknown")),
        confidence: clamp_confidence(confidence_of(&intent_value["confidence"], 0.5)),
        entities: intent_value["entities"]
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
        clarification_needed: intent_value["clarificationNeeded"].as_bool().unwrap_or(false),
        clarification_question: intent_value["clarificationQuestion"]
            .as_str()
            .map(|s| s.to_string()),
    };

    let entities = value["entities"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|e| {
                    Some(Entity {
                        kind: e["type"].as_str()?.to_string(),
                        value: e["value"].as_str()?.to_string(),
                        confidence: clamp_confidence(confidence_of(&e["confidence"], 0.5)),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let commands = value["commands"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| {
                    let action = c["action"].as_str()?;
                    let parameters = c.get("parameters").cloned().unwrap_or(Value::Null);
                    Some(Command {
                        action: CommandAction::from_raw(action, &parameters),
                        confidence: clamp_confidence(confidence_of(&c["confidence"], 0.5)),
                        requires_confirmation: c["requiresConfirmation"].as_bool().unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(IntentResponse {
        intent,
        entities,
        commands,
        response_text: value["responseText"]
            .as_str()
            .unwrap_or("I'll help you with that.")
            .to_string(),
        confidence: clamp_confidence(confidence_of(&value["confidence"], 0.5)),
        requires_clarification: value["requiresClarification"].as_bool().unwrap_or(false),
        clarification_question: value["clarificationQuestion"].as_str().map(|s| s.to_string()),
        suggested_actions: value["suggestedActions"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|s| s.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn confidence_of(value: &Value, default: f32) -> f32 {
    value.as_f64().map(|c| c as f32).unwrap_or(default)
}

/// Deterministic substitute for the AI path. Simple substring rules keep
/// the user moving even with zero connectivity.
pub fn fallback_response(text: &str) -> IntentResponse {
    let lower = text.to_lowercase();

    if lower.contains("search") || lower.contains("find") || lower.contains("look for") {
        // Strip trigger words token-wise so words like "comfort" survive.
        let query = lower
            .split_whitespace()
            .filter(|token| !matches!(*token, "search" | "find" | "look" | "for"))
            .collect::<Vec<_>>()
            .join(" ");
        return IntentResponse {
            intent: Intent {
                action: Action::SearchProducts,
                confidence: 0.8,
                entities: Default::default(),
                clarification_needed: false,
                clarification_question: None,
            },
            entities: Vec::new(),
            commands: vec![Command::new(
                CommandAction::SearchProducts {
                    query: query.clone(),
                    category: None,
                },
                0.8,
            )],
            response_text: format!("I'll search for \"{query}\" for you."),
            confidence: 0.8,
            requires_clarification: false,
            clarification_question: None,
            suggested_actions: vec!["view_results".to_string(), "apply_filters".to_string()],
        };
    }

    if lower.contains("cart") && (lower.contains("show") || lower.contains("view")) {
        return IntentResponse {
            intent: Intent {
                action: Action::ViewCart,
                confidence: 0.9,
                entities: Default::default(),
                clarification_needed: false,
                clarification_question: None,
            },
            entities: Vec::new(),
            commands: vec![Command::new(CommandAction::ViewCart, 0.9)],
            response_text: "I'll show you your cart.".to_string(),
            confidence: 0.9,
            requires_clarification: false,
            clarification_question: None,
            suggested_actions: vec!["checkout".to_string(), "continue_shopping".to_string()],
        };
    }

    if lower.contains("add") {
        let question = "Which product would you like to add to your cart?".to_string();
        return IntentResponse {
            intent: Intent {
                action: Action::AddToCart,
                confidence: 0.6,
                entities: Default::default(),
                clarification_needed: true,
                clarification_question: Some(question.clone()),
            },
            entities: Vec::new(),
            commands: Vec::new(),
            response_text: question.clone(),
            confidence: 0.6,
            requires_clarification: true,
            clarification_question: Some(question),
            suggested_actions: vec!["specify_product".to_string(), "browse_products".to_string()],
        };
    }

    let question = "I'm not sure what you'd like to do. You can try saying 'search for products', \
                    'show my cart', or ask for help."
        .to_string();
    IntentResponse {
        intent: Intent {
            action: Action::Unknown,
            confidence: 0.5,
            entities: Default::default(),
            clarification_needed: true,
            clarification_question: Some(question.clone()),
        },
        entities: Vec::new(),
        commands: Vec::new(),
        response_text: question.clone(),
        confidence: 0.5,
        requires_clarification: true,
        clarification_question: Some(question),
        suggested_actions: vec![
            "search_products".to_string(),
            "view_cart".to_string(),
            "browse_categories".to_string(),
        ],
    }
}

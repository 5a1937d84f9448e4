//! Fast-path intent classification: deterministic pattern matching that
//! resolves the common, directly-phrased shopping commands without an AI
//! round trip. Roughly four out of five utterances never leave this module.

use regex::Regex;
use tracing::debug;

use crate::intent::{
    clamp_confidence, Action, Command, CommandAction, Intent, IntentResponse,
};

/// Outcome of one classification pass. Never an error: unmatched text is
/// routed to the slow path instead of failing.
#[derive(Debug, Clone)]
pub struct Classification {
    pub is_direct_command: bool,
    pub confidence: f32,
    pub intent: Option<IntentResponse>,
    pub requires_ai: bool,
    pub reason: Option<String>,
}

const CATEGORIES: [&str; 6] = ["electronics", "clothing", "books", "games", "home", "sports"];

const SEARCH_PREFIXES: [&str; 11] = [
    "search for",
    "search",
    "find",
    "look for",
    "show me",
    "get me",
    "i want",
    "i need",
    "i am looking for",
    "where can i find",
    "do you have",
];

pub struct FastClassifier {
    search: Vec<Regex>,
    cart: Vec<Regex>,
    browse: Vec<Regex>,
    checkout: Vec<Regex>,
    complexity: Vec<Regex>,
}

impl Default for FastClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FastClassifier {
    pub fn new() -> Self {
        fn compile(patterns: &[&str]) -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("classifier pattern must compile"))
                .collect()
        }

        Self {
            search: compile(&[
                r"^(search|find|look for|show me|get me)\s+",
                r"^i (want|need|am looking for)\s+",
                r"where can i find",
                r"do you have",
            ]),
            cart: compile(&[
                r"^(show|view|open|check)\s+(my\s+)?cart$",
                r"^(go to|navigate to)\s+cart$",
                r"^cart$",
                r"^what'?s in my cart",
                r"^my cart$",
            ]),
            browse: compile(&[
                r"^(browse|show|view)\s+(electronics|clothing|books|games|home|sports)",
                r"^(electronics|clothing|books|games|home|sports)\s+section$",
                r"^go to\s+(electronics|clothing|books|games|home|sports)$",
            ]),
            checkout: compile(&[
                r"^(checkout|check out)$",
                r"^(go to|navigate to)\s+checkout$",
                r"^(proceed to|start)\s+checkout$",
                r"^buy now$",
                r"^purchase$",
            ]),
            complexity: compile(&[
                // Chained commands
                r"\band\b.*\b(then|also|after|next)\b",
                r"\b(then|also|after|next)\b",
                // Conditionals
                r"\bif\b.*\bthen\b",
                r"\bunless\b",
                r"\bwhen\b.*\bthen\b",
                // Comparisons
                r"\b(compare|versus|vs|better than|cheaper than|similar to)\b",
                // Pronouns without a clear referent
                r"\b(this|that|it|these|those)\b",
                // Queries that need reasoning
                r"\b(recommend|suggest|what should|which one|help me choose)\b",
                // Long sentences
                r".{50,}",
                r"\b(why|how|what if|should i|can you explain)\b",
            ]),
        }
    }

    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.trim().to_lowercase();
        debug!(text = %lower, "fast classifying");

        // Complexity wins over everything: a sentence that pattern-matches a
        // direct command but also carries a comparison or dangling pronoun
        // still needs the AI.
        if self.complexity.iter().any(|p| p.is_match(&lower)) {
            return Classification {
                is_direct_command: false,
                confidence: 0.3,
                intent: None,
                requires_ai: true,
                reason: Some("Complex or ambiguous command requires AI analysis".to_string()),
            };
        }

        if self.search.iter().any(|p| p.is_match(&lower)) {
            let query = extract_search_query(text);
            return direct(0.95, search_response(&query));
        }

        if self.cart.iter().any(|p| p.is_match(&lower)) {
            return direct(0.95, view_cart_response());
        }

        if self.browse.iter().any(|p| p.is_match(&lower)) {
            let category = extract_category(&lower);
            return direct(0.9, browse_response(&category));
        }

        if self.checkout.iter().any(|p| p.is_match(&lower)) {
            return direct(0.95, checkout_response());
        }

        Classification {
            is_direct_command: false,
            confidence: 0.2,
            intent: None,
            requires_ai: true,
            reason: Some("Unknown command pattern, needs AI analysis".to_string()),
        }
    }
}

fn direct(confidence: f32, intent: IntentResponse) -> Classification {
    Classification {
        is_direct_command: true,
        confidence: clamp_confidence(confidence),
        intent: Some(intent),
        requires_ai: false,
        reason: None,
    }
}

fn extract_search_query(text: &str) -> String {
    let lower = text.to_lowercase();
    for prefix in SEARCH_PREFIXES {
        if lower.starts_with(prefix) {
            let query = text[prefix.len()..].trim();
            if !query.is_empty() {
                return query.to_string();
            }
            break;
        }
    }
    text.trim().to_string()
}

fn extract_category(lower: &str) -> String {
    for category in CATEGORIES {
        if lower.contains(category) {
            return category.to_string();
        }
    }
    "products".to_string()
}

fn response(
    action: Action,
    confidence: f32,
    commands: Vec<Command>,
    response_text: String,
    suggested: &[&str],
) -> IntentResponse {
    IntentResponse {
        intent: Intent {
            action,
            confidence,
            entities: Default::default(),
            clarification_needed: false,
            clarification_question: None,
        },
        entities: Vec::new(),
        commands,
        response_text,
        confidence,
        requires_clarification: false,
        clarification_question: None,
        suggested_actions: suggested.iter().map(|s| s.to_string()).collect(),
    }
}

fn search_response(query: &str) -> IntentResponse {
    response(
        Action::SearchProducts,
        0.95,
        vec![Command::new(
            CommandAction::SearchProducts {
                query: query.to_string(),
                category: None,
            },
            0.95,
        )],
        format!("I'll search for \"{query}\" for you."),
        &["view_results", "apply_filters"],
    )
}

fn view_cart_response() -> IntentResponse {
    response(
        Action::ViewCart,
        0.95,
        vec![Command::new(CommandAction::ViewCart, 0.95)],
        "I'll show you your cart.".to_string(),
        &["checkout", "continue_shopping"],
    )
}

fn browse_response(category: &str) -> IntentResponse {
    response(
        Action::BrowseCategory,
        0.9,
        vec![Command::new(
            CommandAction::BrowseCategory {
                category: category.to_string(),
            },
            0.9,
        )],
        format!("I'll show you {category} products."),
        &["apply_filters", "sort_products"],
    )
}

fn checkout_response() -> IntentResponse {
    response(
        Action::Checkout,
        0.95,
        vec![Command::new(CommandAction::Checkout, 0.95)],
        "I'll take you to checkout.".to_string(),
        &["complete_purchase"],
    )
}

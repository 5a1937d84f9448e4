use aura::ai::{fallback_response, parse_response};
use aura::intent::{Action, CommandAction};

#[test]
fn parse_unwraps_markdown_fenced_json() {
    let completion = r#"Here is the analysis:
```json
{
  "intent": {"action": "search_products", "confidence": 0.92},
  "commands": [{"action": "search_products", "parameters": {"query": "laptops"}, "confidence": 0.92}],
  "responseText": "Searching for laptops.",
  "confidence": 0.92,
  "requiresClarification": false
}
```"#;

    let response = parse_response(completion).expect("fenced JSON must parse");
    assert_eq!(response.intent.action, Action::SearchProducts);
    assert_eq!(response.commands.len(), 1);
    match &response.commands[0].action {
        CommandAction::SearchProducts { query, .. } => assert_eq!(query, "laptops"),
        other => panic!("expected SearchProducts, got {other:?}"),
    }
}

#[test]
fn parse_rejects_text_without_json() {
    assert!(
        parse_response("I'm sorry, I can't help with that.").is_err(),
        "prose without JSON must be a parse error"
    );
}

#[test]
fn parse_rejects_malformed_json() {
    assert!(
        parse_response(r#"{"intent": {"action": "search_products""#).is_err(),
        "truncated JSON must be a parse error"
    );
}

#[test]
fn parse_clamps_out_of_range_confidences() {
    let completion = r#"{
        "intent": {"action": "view_cart", "confidence": 7.5},
        "commands": [{"action": "view_cart", "parameters": {}, "confidence": -2}],
        "responseText": "Cart time.",
        "confidence": 1.8,
        "requiresClarification": false
    }"#;

    let response = parse_response(completion).expect("valid JSON must parse");
    assert_eq!(response.confidence, 1.0, "overshoot clamps to 1");
    assert_eq!(response.intent.confidence, 1.0);
    assert_eq!(response.commands[0].confidence, 0.0, "undershoot clamps to 0");
}

#[test]
fn parse_tolerates_unknown_actions() {
    let completion = r#"{
        "intent": {"action": "summon_drone", "confidence": 0.9},
        "commands": [{"action": "summon_drone", "parameters": {}, "confidence": 0.9}],
        "responseText": "On it.",
        "confidence": 0.9,
        "requiresClarification": false
    }"#;

    let response = parse_response(completion).expect("unknown actions degrade, not fail");
    assert_eq!(response.intent.action, Action::Unknown);
    match &response.commands[0].action {
        CommandAction::Unknown { action } => assert_eq!(action, "summon_drone"),
        other => panic!("expected Unknown, got {other:?}"),
    }
}

#[test]
fn fallback_search_strips_trigger_words() {
    let response = fallback_response("please search for running shoes");
    assert_eq!(response.intent.action, Action::SearchProducts);
    assert_eq!(response.confidence, 0.8);
    match &response.commands[0].action {
        CommandAction::SearchProducts { query, .. } => {
            assert!(!query.contains("search"), "trigger word must be stripped: {query:?}");
            assert!(query.contains("running shoes"), "subject survives: {query:?}");
        }
        other => panic!("expected SearchProducts, got {other:?}"),
    }
}

#[test]
fn fallback_search_keeps_words_containing_trigger_substrings() {
    let response = fallback_response("search for comfort pillows");
    match &response.commands[0].action {
        CommandAction::SearchProducts { query, .. } => {
            assert_eq!(
                query, "comfort pillows",
                "the \"for\" inside \"comfort\" must survive stripping"
            );
        }
        other => panic!("expected SearchProducts, got {other:?}"),
    }
}

#[test]
fn fallback_recognizes_view_cart() {
    let response = fallback_response("show me the cart please");
    assert_eq!(response.intent.action, Action::ViewCart);
    assert_eq!(response.confidence, 0.9);
    assert_eq!(response.commands.len(), 1);
}

#[test]
fn fallback_add_asks_for_clarification() {
    let response = fallback_response("add it please");
    assert!(response.requires_clarification, "ambiguous add must clarify");
    assert!(
        response.clarification_question.is_some(),
        "clarification always carries a question"
    );
    assert!(response.commands.is_empty(), "nothing executes while clarifying");
    assert_eq!(response.confidence, 0.6);
}

#[test]
fn fallback_default_is_a_help_prompt() {
    let response = fallback_response("quux");
    assert_eq!(response.intent.action, Action::Unknown);
    assert_eq!(response.confidence, 0.5);
    assert!(response.requires_clarification);
    assert!(
        response.response_text.contains("search"),
        "default answer points at things that work: {}",
        response.response_text
    );
}

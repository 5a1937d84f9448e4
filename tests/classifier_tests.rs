use aura::classifier::FastClassifier;
use aura::intent::{Action, CommandAction};

#[test]
fn direct_search_resolves_without_ai() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("search for wireless headphones");

    assert!(result.is_direct_command, "plain search must be a direct command");
    assert!(!result.requires_ai, "direct commands never need AI");
    assert_eq!(result.confidence, 0.95);

    let intent = result.intent.expect("direct command carries an intent");
    assert_eq!(intent.intent.action, Action::SearchProducts);
    assert_eq!(intent.commands.len(), 1);
    match &intent.commands[0].action {
        CommandAction::SearchProducts { query, .. } => {
            assert_eq!(query, "wireless headphones", "prefix must be stripped from the query");
        }
        other => panic!("expected SearchProducts, got {other:?}"),
    }
}

#[test]
fn search_query_preserves_original_case() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("find MacBook Air");
    let intent = result.intent.expect("search is direct");
    match &intent.commands[0].action {
        CommandAction::SearchProducts { query, .. } => {
            assert_eq!(query, "MacBook Air", "query keeps the user's casing");
        }
        other => panic!("expected SearchProducts, got {other:?}"),
    }
}

#[test]
fn cart_phrases_map_to_view_cart() {
    let classifier = FastClassifier::new();
    for text in ["show my cart", "cart", "what's in my cart", "view cart"] {
        let result = classifier.classify(text);
        assert!(result.is_direct_command, "{text:?} should be a direct cart command");
        let intent = result.intent.expect("direct command carries an intent");
        assert_eq!(intent.intent.action, Action::ViewCart, "for input {text:?}");
    }
}

#[test]
fn browse_extracts_category() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("browse electronics");
    assert_eq!(result.confidence, 0.9);
    let intent = result.intent.expect("browse is direct");
    match &intent.commands[0].action {
        CommandAction::BrowseCategory { category } => assert_eq!(category, "electronics"),
        other => panic!("expected BrowseCategory, got {other:?}"),
    }
}

#[test]
fn checkout_phrases_are_direct() {
    let classifier = FastClassifier::new();
    for text in ["checkout", "check out", "buy now", "proceed to checkout"] {
        let result = classifier.classify(text);
        assert!(result.is_direct_command, "{text:?} should go straight to checkout");
        assert_eq!(result.confidence, 0.95, "for input {text:?}");
    }
}

#[test]
fn complexity_overrides_direct_patterns() {
    let classifier = FastClassifier::new();
    // Starts like a direct search but carries a comparison.
    let result = classifier.classify("find headphones cheaper than the sony ones");
    assert!(!result.is_direct_command, "comparisons must defer to AI");
    assert!(result.requires_ai);
    assert_eq!(result.confidence, 0.3);
    assert!(result.reason.is_some(), "AI deferral carries a reason");
}

#[test]
fn dangling_pronoun_needs_ai() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("add this to my cart");
    assert!(result.requires_ai, "pronouns without a referent need context resolution");
}

#[test]
fn unknown_text_defers_to_ai_at_low_confidence() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("blorp the frobnicator");
    assert!(!result.is_direct_command);
    assert!(result.requires_ai);
    assert_eq!(result.confidence, 0.2);
}

#[test]
fn classification_is_case_insensitive() {
    let classifier = FastClassifier::new();
    let result = classifier.classify("SEARCH FOR LAPTOPS");
    assert!(result.is_direct_command, "uppercase input must still match");
}

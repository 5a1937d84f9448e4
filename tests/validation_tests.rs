use std::collections::BTreeMap;

use aura::command::validate_command;
use aura::context::{Page, PageContext};
use aura::intent::{Command, CommandAction};
use aura::store::CartItem;

fn empty_context() -> PageContext {
    PageContext::minimal()
}

fn context_with_cart() -> PageContext {
    let mut context = PageContext::minimal();
    context.cart_items = vec![CartItem {
        id: "p2".to_string(),
        name: "Sony WH-1000XM5 Wireless Headphones".to_string(),
        price: 349.99,
        quantity: 1,
    }];
    context
}

fn command(action: CommandAction) -> Command {
    Command::new(action, 0.9)
}

#[test]
fn search_requires_query() {
    let result = validate_command(
        &command(CommandAction::SearchProducts {
            query: "   ".to_string(),
            category: None,
        }),
        &empty_context(),
    );
    assert!(!result.is_valid, "blank query must fail");
    assert!(result.missing_parameters.contains(&"query".to_string()));
    assert!(!result.suggested_fixes.is_empty(), "failures carry a suggested fix");
}

#[test]
fn short_search_warns_but_passes() {
    let result = validate_command(
        &command(CommandAction::SearchProducts {
            query: "tv".to_string(),
            category: None,
        }),
        &empty_context(),
    );
    assert!(result.is_valid, "short queries are valid");
    assert!(!result.warnings.is_empty(), "but they warn about broad results");
}

#[test]
fn add_to_cart_needs_a_product_or_product_page() {
    let bare = command(CommandAction::AddToCart {
        product_id: None,
        product_name: None,
        quantity: None,
        size: None,
        color: None,
    });

    let result = validate_command(&bare, &empty_context());
    assert!(!result.is_valid, "no product and no product page must fail");

    // Same command on a product page picks up the context product.
    let mut on_product = empty_context();
    on_product.current_page = Page::ProductDetail;
    on_product.product_id = Some("p1".to_string());
    let result = validate_command(&bare, &on_product);
    assert!(result.is_valid, "product page supplies the missing product");
}

#[test]
fn add_to_cart_rejects_non_positive_quantity() {
    let result = validate_command(
        &command(CommandAction::AddToCart {
            product_id: Some("p1".to_string()),
            product_name: None,
            quantity: Some(0),
            size: None,
            color: None,
        }),
        &empty_context(),
    );
    assert!(!result.is_valid, "quantity zero must fail validation");
    assert!(result.missing_parameters.contains(&"quantity".to_string()));
}

#[test]
fn add_to_cart_warns_on_large_quantity() {
    let result = validate_command(
        &command(CommandAction::AddToCart {
            product_id: Some("p1".to_string()),
            product_name: None,
            quantity: Some(25),
            size: None,
            color: None,
        }),
        &empty_context(),
    );
    assert!(result.is_valid, "large quantities are allowed");
    assert!(!result.warnings.is_empty(), "but they warn");
}

#[test]
fn remove_from_empty_cart_fails() {
    let result = validate_command(
        &command(CommandAction::RemoveFromCart {
            item_id: Some("p2".to_string()),
            product_name: None,
        }),
        &empty_context(),
    );
    assert!(!result.is_valid, "nothing to remove from an empty cart");
}

#[test]
fn remove_needs_item_identification() {
    let result = validate_command(
        &command(CommandAction::RemoveFromCart {
            item_id: None,
            product_name: None,
        }),
        &context_with_cart(),
    );
    assert!(!result.is_valid, "removal without an item reference must fail");
}

#[test]
fn update_quantity_allows_zero_but_not_negative() {
    let zero = validate_command(
        &command(CommandAction::UpdateQuantity {
            item_id: Some("p2".to_string()),
            product_name: None,
            quantity: Some(0),
        }),
        &context_with_cart(),
    );
    assert!(zero.is_valid, "quantity zero means remove the line");

    let negative = validate_command(
        &command(CommandAction::UpdateQuantity {
            item_id: Some("p2".to_string()),
            product_name: None,
            quantity: Some(-1),
        }),
        &context_with_cart(),
    );
    assert!(!negative.is_valid, "negative quantity must fail");
}

#[test]
fn checkout_blocked_with_empty_cart() {
    let result = validate_command(&command(CommandAction::Checkout), &empty_context());
    assert!(!result.is_valid);
    assert_eq!(result.errors[0], "Cannot proceed to checkout with empty cart");

    let result = validate_command(&command(CommandAction::Checkout), &context_with_cart());
    assert!(result.is_valid, "checkout with items passes");
}

#[test]
fn navigate_to_checks_the_page_allow_list() {
    let result = validate_command(
        &command(CommandAction::NavigateTo {
            page: "warehouse".to_string(),
        }),
        &empty_context(),
    );
    assert!(!result.is_valid, "unknown pages must fail");

    let result = validate_command(
        &command(CommandAction::NavigateTo {
            page: "cart".to_string(),
        }),
        &empty_context(),
    );
    assert!(result.is_valid);
}

#[test]
fn navigate_to_checkout_also_requires_items() {
    let result = validate_command(
        &command(CommandAction::NavigateTo {
            page: "checkout".to_string(),
        }),
        &empty_context(),
    );
    assert!(!result.is_valid, "navigating to checkout is gated like checkout itself");
}

#[test]
fn apply_filter_requires_at_least_one_filter() {
    let result = validate_command(
        &command(CommandAction::ApplyFilter {
            filters: BTreeMap::new(),
        }),
        &empty_context(),
    );
    assert!(!result.is_valid);

    let mut filters = BTreeMap::new();
    filters.insert("color".to_string(), "black".to_string());
    let result = validate_command(&command(CommandAction::ApplyFilter { filters }), &empty_context());
    assert!(result.is_valid);
}

#[test]
fn unknown_action_warns_without_blocking() {
    let result = validate_command(
        &command(CommandAction::Unknown {
            action: "teleport".to_string(),
        }),
        &empty_context(),
    );
    assert!(result.is_valid, "unknown actions pass through with a warning");
    assert!(!result.warnings.is_empty());
}

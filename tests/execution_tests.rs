use std::sync::{Arc, Mutex};

use aura::command::{ExecutionEngine, ShoppingHandler};
use aura::context::PageContext;
use aura::intent::{Command, CommandAction};
use aura::store::{
    CartItem, CartStore, Notification, NotificationEffect, NotificationHub, ProductCatalog,
    RouteNavigator, RouteState,
};

struct Fixture {
    engine: ExecutionEngine,
    cart: Arc<CartStore>,
    route: Arc<RouteState>,
    notifications: Arc<Mutex<Vec<Notification>>>,
}

fn fixture() -> Fixture {
    let catalog = Arc::new(ProductCatalog::with_demo_inventory());
    let cart = Arc::new(CartStore::new());
    let route = Arc::new(RouteState::new());
    let notifier = Arc::new(NotificationHub::new());

    let notifications = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notifications);
    notifier.register(move |n| sink.lock().unwrap().push(n.clone()));

    let engine = ExecutionEngine::new(
        ShoppingHandler::new(Arc::clone(&catalog), Arc::clone(&cart)),
        Arc::clone(&cart),
        notifier,
        Arc::new(RouteNavigator::new(Arc::clone(&route))),
    );
    Fixture {
        engine,
        cart,
        route,
        notifications,
    }
}

fn command(action: CommandAction) -> Command {
    Command::new(action, 0.95)
}

#[test]
fn search_navigates_to_results() {
    let f = fixture();
    let result = f.engine.execute(
        &command(CommandAction::SearchProducts {
            query: "headphones".to_string(),
            category: None,
        }),
        &PageContext::minimal(),
    );

    assert!(result.success, "demo inventory has headphones: {}", result.message);
    assert!(result.message.contains("headphones"));
    assert_eq!(f.route.path(), "/products", "search must navigate to the listing");
    assert_eq!(
        f.route.query_param("search").as_deref(),
        Some("headphones"),
        "query travels in the URL"
    );
}

#[test]
fn search_miss_reports_no_results() {
    let f = fixture();
    let result = f.engine.execute(
        &command(CommandAction::SearchProducts {
            query: "zeppelin".to_string(),
            category: None,
        }),
        &PageContext::minimal(),
    );
    assert!(!result.success);
    assert!(
        result.message.contains("couldn't find"),
        "miss message suggests trying again: {}",
        result.message
    );
    assert_eq!(f.route.path(), "/", "a failed search must not navigate");
}

#[test]
fn add_to_cart_resolves_product_by_name() {
    let f = fixture();
    let result = f.engine.execute(
        &command(CommandAction::AddToCart {
            product_id: None,
            product_name: Some("macbook".to_string()),
            quantity: Some(2),
            size: None,
            color: None,
        }),
        &PageContext::minimal(),
    );

    assert!(result.success, "{}", result.message);
    let items = f.cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "p3", "name search must resolve to the MacBook");
    assert_eq!(items[0].quantity, 2);
}

#[test]
fn add_to_cart_merges_existing_line() {
    let f = fixture();
    let add = command(CommandAction::AddToCart {
        product_id: Some("p1".to_string()),
        product_name: None,
        quantity: Some(1),
        size: None,
        color: None,
    });
    f.engine.execute(&add, &PageContext::minimal());
    f.engine.execute(&add, &PageContext::minimal());

    let items = f.cart.items();
    assert_eq!(items.len(), 1, "same product merges into one line");
    assert_eq!(items[0].quantity, 2);
}

#[test]
fn removal_offers_undo_that_restores_the_exact_record() {
    let f = fixture();
    let original = CartItem {
        id: "p2".to_string(),
        name: "Sony WH-1000XM5 Wireless Headphones".to_string(),
        price: 349.99,
        quantity: 3,
    };
    f.cart.add(original.clone());

    let mut context = PageContext::minimal();
    context.cart_items = f.cart.items();
    let result = f.engine.execute(
        &command(CommandAction::RemoveFromCart {
            item_id: None,
            product_name: Some("sony".to_string()),
        }),
        &context,
    );
    assert!(result.success, "{}", result.message);
    assert!(f.cart.is_empty(), "item is gone after removal");

    // The removal notification carries an Undo action.
    let undo = {
        let notifications = f.notifications.lock().unwrap();
        let with_undo = notifications
            .iter()
            .find(|n| n.actions.iter().any(|a| a.label == "Undo"))
            .expect("removal must emit an Undo notification");
        with_undo.actions[0].clone()
    };
    match &undo.effect {
        NotificationEffect::RestoreCartItem(item) => {
            assert_eq!(item, &original, "Undo must carry the exact removed record");
        }
        other => panic!("expected RestoreCartItem, got {other:?}"),
    }

    // Applying the action puts the exact record back.
    f.engine.apply_notification_action(&undo);
    assert_eq!(f.cart.items(), vec![original], "restore is byte-for-byte");
}

#[test]
fn update_quantity_zero_removes_the_line() {
    let f = fixture();
    f.cart.add(CartItem {
        id: "p8".to_string(),
        name: "PlayStation 5 Console".to_string(),
        price: 499.99,
        quantity: 2,
    });

    let mut context = PageContext::minimal();
    context.cart_items = f.cart.items();
    let result = f.engine.execute(
        &command(CommandAction::UpdateQuantity {
            item_id: Some("p8".to_string()),
            product_name: None,
            quantity: Some(0),
        }),
        &context,
    );

    assert!(result.success, "{}", result.message);
    assert!(result.message.contains("Removed"), "zero quantity reads as removal");
    assert!(f.cart.is_empty());
}

#[test]
fn browse_unknown_category_lists_alternatives() {
    let f = fixture();
    let result = f.engine.execute(
        &command(CommandAction::BrowseCategory {
            category: "vehicles".to_string(),
        }),
        &PageContext::minimal(),
    );

    assert!(!result.success);
    assert!(
        result.message.contains("electronics"),
        "failure must name real categories: {}",
        result.message
    );
    assert_eq!(f.route.path(), "/", "unknown category must not navigate");
}

#[test]
fn view_cart_totals_the_lines() {
    let f = fixture();
    f.cart.add(CartItem {
        id: "p7".to_string(),
        name: "Instant Pot Duo 7-in-1 Pressure Cooker".to_string(),
        price: 89.99,
        quantity: 2,
    });

    let result = f.engine.execute(&command(CommandAction::ViewCart), &PageContext::minimal());
    assert!(result.success);
    assert!(
        result.message.contains("$179.98"),
        "total is price times quantity: {}",
        result.message
    );
    assert_eq!(f.route.path(), "/cart");
}

#[test]
fn engine_blocks_invalid_navigation() {
    let f = fixture();
    let result = f.engine.execute(
        &command(CommandAction::NavigateTo {
            page: "warehouse".to_string(),
        }),
        &PageContext::minimal(),
    );
    assert!(!result.success, "unknown page must be rejected, not navigated");
    assert_eq!(f.route.path(), "/");
}

#[test]
fn default_route_starts_at_the_root() {
    assert_eq!(RouteState::default().path(), "/", "default and new() must agree");
    assert_eq!(RouteState::new().path(), "/");
}

#[test]
fn apply_filter_builds_the_listing_url() {
    let f = fixture();
    let mut filters = std::collections::BTreeMap::new();
    filters.insert("category".to_string(), "electronics".to_string());
    filters.insert("color".to_string(), "black".to_string());

    let result = f.engine.execute(
        &command(CommandAction::ApplyFilter { filters }),
        &PageContext::minimal(),
    );
    assert!(result.success, "{}", result.message);
    assert_eq!(f.route.path(), "/products");
    assert_eq!(f.route.query_param("category").as_deref(), Some("electronics"));
    assert_eq!(f.route.query_param("color").as_deref(), Some("black"));
}

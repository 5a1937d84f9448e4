//! Point-in-time snapshot of the shopping state, computed on demand right
//! before classification or execution and never cached beyond one command.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{CartItem, CartStore, ProductCatalog, RouteState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    ProductDetail,
    ProductListing,
    Cart,
    Checkout,
    Login,
}

impl Page {
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_end_matches('/');
        if path == "/cart" {
            Page::Cart
        } else if path == "/checkout" {
            Page::Checkout
        } else if path.starts_with("/product/") {
            Page::ProductDetail
        } else if path == "/products" {
            Page::ProductListing
        } else if path == "/login" {
            Page::Login
        } else {
            Page::Home
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::ProductDetail => "product_detail",
            Page::ProductListing => "product_listing",
            Page::Cart => "cart",
            Page::Checkout => "checkout",
            Page::Login => "login",
        }
    }
}

/// Read-only snapshot handed to the classifier, the AI service, validation,
/// and execution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub current_page: Page,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub product_price: Option<f64>,
    pub cart_items: Vec<CartItem>,
    pub search_query: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub available_actions: Vec<String>,
}

impl PageContext {
    /// The smallest valid context. Extraction degrades to this on any
    /// failure so callers can always proceed.
    pub fn minimal() -> Self {
        Self {
            current_page: Page::Home,
            product_id: None,
            product_name: None,
            product_price: None,
            cart_items: Vec::new(),
            search_query: None,
            filters: BTreeMap::new(),
            available_actions: base_actions(),
        }
    }
}

fn base_actions() -> Vec<String> {
    ["search", "navigate_to", "show_cart"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn actions_for(page: Page) -> Vec<String> {
    let mut actions = base_actions();
    let extra: &[&str] = match page {
        Page::ProductDetail => &["add_to_cart", "show_details", "show_recommendations"],
        Page::ProductListing => &["apply_filter", "sort_products", "add_to_cart"],
        Page::Cart => &["checkout", "remove_from_cart", "update_quantity", "clear_cart"],
        Page::Checkout => &["complete_purchase", "edit_shipping", "apply_coupon"],
        Page::Home | Page::Login => &[],
    };
    actions.extend(extra.iter().map(|s| s.to_string()));
    actions
}

/// Derives a `PageContext` from the current route, the cart store, and the
/// catalog. Synchronous, read-only, and infallible.
pub struct ContextExtractor {
    cart: Arc<CartStore>,
    catalog: Arc<ProductCatalog>,
}

impl ContextExtractor {
    pub fn new(cart: Arc<CartStore>, catalog: Arc<ProductCatalog>) -> Self {
        Self { cart, catalog }
    }

    pub fn extract(&self, route: &RouteState) -> PageContext {
        let path = route.path();
        let current_page = Page::from_path(&path);

        let mut context = PageContext {
            current_page,
            product_id: None,
            product_name: None,
            product_price: None,
            cart_items: self.cart.items(),
            search_query: route.query_param("search").filter(|q| !q.is_empty()),
            filters: BTreeMap::new(),
            available_actions: actions_for(current_page),
        };

        if current_page == Page::ProductDetail {
            if let Some(id) = product_id_from_path(&path) {
                context.product_id = Some(id.to_string());
                if let Some(product) = self.catalog.get(id) {
                    context.product_name = Some(product.name);
                    context.product_price = Some(product.price);
                }
            }
        }

        for (key, value) in route.query_params() {
            if crate::intent::VALID_FILTERS.contains(&key.as_str()) {
                context.filters.insert(key, value);
            }
        }

        context
    }
}

fn product_id_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/product/")?;
    let id = rest.split('/').next().unwrap_or(rest);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

//! Domain logic for the shopping actions: product lookup, cart
//! mutations, and the navigation each action implies.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::context::PageContext;
use crate::intent::CommandAction;
use crate::store::{CartItem, CartStore, NavigationRequest, Product, ProductCatalog};

use super::execute::ExecutionResult;

/// What one shopping action produced. `removed` carries the exact cart
/// record a removal took out, so the engine can offer Undo.
#[derive(Debug)]
pub struct ShoppingOutcome {
    pub result: ExecutionResult,
    pub removed: Option<CartItem>,
}

impl ShoppingOutcome {
    fn plain(result: ExecutionResult) -> Self {
        Self {
            result,
            removed: None,
        }
    }
}

pub struct ShoppingHandler {
    catalog: Arc<ProductCatalog>,
    cart: Arc<CartStore>,
}

impl ShoppingHandler {
    pub fn new(catalog: Arc<ProductCatalog>, cart: Arc<CartStore>) -> Self {
        Self { catalog, cart }
    }

    /// Dispatch one shopping action. Callers guarantee `action.is_shopping()`.
    pub fn handle(&self, action: &CommandAction, context: &PageContext) -> ShoppingOutcome {
        match action {
            CommandAction::SearchProducts { query, category } => {
                ShoppingOutcome::plain(self.search(query, category.as_deref()))
            }
            CommandAction::AddToCart {
                product_id,
                product_name,
                quantity,
                ..
            } => ShoppingOutcome::plain(self.add_to_cart(
                product_id.as_deref(),
                product_name.as_deref(),
                quantity.unwrap_or(1),
                context,
            )),
            CommandAction::RemoveFromCart {
                item_id,
                product_name,
            } => self.remove_from_cart(item_id.as_deref(), product_name.as_deref()),
            CommandAction::ViewCart => ShoppingOutcome::plain(self.view_cart()),
            CommandAction::BrowseCategory { category } => {
                ShoppingOutcome::plain(self.browse_category(category))
            }
            CommandAction::ViewProduct { product_id } => {
                ShoppingOutcome::plain(self.view_product(product_id))
            }
            CommandAction::Checkout => ShoppingOutcome::plain(self.checkout()),
            other => ShoppingOutcome::plain(ExecutionResult::failure(format!(
                "Action {} is not a shopping action",
                other.action().as_str()
            ))),
        }
    }

    fn search(&self, query: &str, category: Option<&str>) -> ExecutionResult {
        let mut matches = self.catalog.search(query);
        if let Some(category) = category {
            let normalized = category.to_lowercase();
            matches.retain(|p| p.category.to_lowercase() == normalized);
        }
        info!(query, hits = matches.len(), "product search");

        if matches.is_empty() {
            return ExecutionResult::failure(format!(
                "I couldn't find any products matching \"{query}\". Try a different search term."
            ))
            .with_next_actions(&["browse_categories", "search_again"]);
        }

        let mut request = NavigationRequest::to("/products").with_param("search", query);
        if let Some(category) = category {
            request = request.with_param("category", category);
        }
        ExecutionResult::success(format!(
            "I found {} products matching \"{query}\".",
            matches.len()
        ))
        .with_data(json!({ "products": matches }))
        .with_navigation(request)
        .with_next_actions(&["view_product", "apply_filter", "add_to_cart"])
    }

    fn add_to_cart(
        &self,
        product_id: Option<&str>,
        product_name: Option<&str>,
        quantity: i64,
        context: &PageContext,
    ) -> ExecutionResult {
        let Some(product) = self.resolve_product(product_id, product_name, context) else {
            return ExecutionResult::failure(
                "I couldn't find that product. Could you be more specific?",
            )
            .with_next_actions(&["search_products", "browse_categories"]);
        };

        let quantity = quantity.clamp(1, u32::MAX as i64) as u32;
        self.cart.add(CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
        });
        info!(product = %product.id, quantity, "added to cart");

        let message = if quantity == 1 {
            format!("Added {} to your cart.", product.name)
        } else {
            format!("Added {} x {} to your cart.", quantity, product.name)
        };
        ExecutionResult::success(message)
            .with_data(json!({ "productId": product.id, "quantity": quantity }))
            .with_next_actions(&["view_cart", "checkout", "continue_shopping"])
    }

    fn remove_from_cart(
        &self,
        item_id: Option<&str>,
        product_name: Option<&str>,
    ) -> ShoppingOutcome {
        match self.cart.remove_matching(item_id, product_name) {
            Some(removed) => {
                info!(item = %removed.id, "removed from cart");
                ShoppingOutcome {
                    result: ExecutionResult::success(format!(
                        "Removed {} from your cart.",
                        removed.name
                    ))
                    .with_next_actions(&["view_cart", "continue_shopping"]),
                    removed: Some(removed),
                }
            }
            None => ShoppingOutcome::plain(
                ExecutionResult::failure("I couldn't find that item in your cart.")
                    .with_next_actions(&["view_cart"]),
            ),
        }
    }

    fn view_cart(&self) -> ExecutionResult {
        let items = self.cart.items();
        let message = if items.is_empty() {
            "Your cart is empty.".to_string()
        } else {
            let count: u32 = items.iter().map(|i| i.quantity).sum();
            let total: f64 = items.iter().map(|i| i.price * i.quantity as f64).sum();
            format!(
                "You have {count} item{} in your cart totaling ${total:.2}.",
                if count == 1 { "" } else { "s" }
            )
        };
        ExecutionResult::success(message)
            .with_data(json!({ "items": items }))
            .with_navigation(NavigationRequest::to("/cart"))
            .with_next_actions(&["checkout", "remove_from_cart", "continue_shopping"])
    }

    fn browse_category(&self, category: &str) -> ExecutionResult {
        let available = self.catalog.categories();
        let normalized = category.trim().to_lowercase();
        let known = available.iter().any(|c| c.to_lowercase() == normalized);

        if !known {
            return ExecutionResult::failure(format!(
                "We don't have a \"{category}\" category. Available categories: {}.",
                available.join(", ")
            ))
            .with_data(json!({ "availableCategories": available }))
            .with_next_actions(&["browse_categories", "search_products"]);
        }

        let products = self.catalog.in_category(&normalized);
        ExecutionResult::success(format!("Here are our {normalized} products."))
            .with_data(json!({ "products": products }))
            .with_navigation(NavigationRequest::to("/products").with_param("category", &normalized))
            .with_next_actions(&["view_product", "apply_filter", "add_to_cart"])
    }

    fn view_product(&self, product_id: &str) -> ExecutionResult {
        match self.catalog.get(product_id) {
            Some(product) => ExecutionResult::success(format!(
                "Here's the {}. It costs ${:.2}.",
                product.name, product.price
            ))
            .with_data(json!({ "product": product }))
            .with_navigation(NavigationRequest::to(format!("/product/{product_id}")))
            .with_next_actions(&["add_to_cart", "view_cart"]),
            None => ExecutionResult::failure("I couldn't find that product.")
                .with_next_actions(&["search_products", "browse_categories"]),
        }
    }

    fn checkout(&self) -> ExecutionResult {
        if self.cart.is_empty() {
            return ExecutionResult::failure(
                "Your cart is empty. Add something before checking out.",
            )
            .with_next_actions(&["search_products", "browse_categories"]);
        }
        ExecutionResult::success("Taking you to checkout.")
            .with_navigation(NavigationRequest::to("/checkout"))
            .with_next_actions(&["complete_purchase"])
    }

    fn resolve_product(
        &self,
        product_id: Option<&str>,
        product_name: Option<&str>,
        context: &PageContext,
    ) -> Option<Product> {
        if let Some(id) = product_id {
            if let Some(product) = self.catalog.get(id) {
                return Some(product);
            }
        }
        if let Some(name) = product_name {
            let matches = self.catalog.search(name);
            if let Some(product) = matches.into_iter().next() {
                return Some(product);
            }
        }
        // "Add this to my cart" on a product page.
        context
            .product_id
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }
}

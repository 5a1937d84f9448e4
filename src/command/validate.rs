//! Pure validation of a command against the current page context. No
//! side effects and no I/O, so every rule is unit-testable in isolation.

use crate::context::PageContext;
use crate::intent::{Command, CommandAction};

/// Pages the `navigate_to` action accepts.
const KNOWN_PAGES: [&str; 7] = [
    "home", "cart", "checkout", "products", "login", "profile", "orders",
];

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub missing_parameters: Vec<String>,
    pub suggested_fixes: Vec<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    fn error(
        mut self,
        message: impl Into<String>,
        missing: Option<&str>,
        fix: impl Into<String>,
    ) -> Self {
        self.is_valid = false;
        self.errors.push(message.into());
        if let Some(parameter) = missing {
            self.missing_parameters.push(parameter.to_string());
        }
        self.suggested_fixes.push(fix.into());
        self
    }

    fn warn(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }
}

/// Check one command against the context it would execute in. Warnings
/// never block execution; any error does.
pub fn validate_command(command: &Command, context: &PageContext) -> ValidationResult {
    let result = ValidationResult::valid();

    match &command.action {
        CommandAction::SearchProducts { query, .. } => {
            if query.trim().is_empty() {
                return result.error(
                    "Search query is required",
                    Some("query"),
                    "Tell me what you'd like to search for",
                );
            }
            if query.trim().len() < 3 {
                return result.warn("Very short search queries may return broad results");
            }
            result
        }

        CommandAction::AddToCart {
            product_id,
            product_name,
            quantity,
            ..
        } => {
            let identified = product_id.is_some()
                || product_name.is_some()
                || context.product_id.is_some();
            let mut result = result;
            if !identified {
                return result.error(
                    "No product specified and no product in view",
                    Some("product_id"),
                    "Say which product you'd like to add, or open a product page first",
                );
            }
            if let Some(q) = quantity {
                if *q <= 0 {
                    return result.error(
                        "Quantity must be a positive number",
                        Some("quantity"),
                        "Try a quantity of one or more",
                    );
                }
                if *q > 10 {
                    result = result.warn("That's a large quantity for one add");
                }
            }
            result
        }

        CommandAction::RemoveFromCart {
            item_id,
            product_name,
        } => {
            if context.cart_items.is_empty() {
                return result.error(
                    "Your cart is empty",
                    None,
                    "Add something to your cart first",
                );
            }
            if item_id.is_none() && product_name.is_none() {
                return result.error(
                    "No item specified to remove",
                    Some("item_id"),
                    "Say which item you'd like to remove",
                );
            }
            result
        }

        CommandAction::UpdateQuantity {
            item_id,
            product_name,
            quantity,
        } => {
            if context.cart_items.is_empty() {
                return result.error(
                    "Your cart is empty",
                    None,
                    "Add something to your cart first",
                );
            }
            if item_id.is_none() && product_name.is_none() {
                return result.error(
                    "No item specified to update",
                    Some("item_id"),
                    "Say which item you'd like to change",
                );
            }
            match quantity {
                None => result.error(
                    "New quantity is required",
                    Some("quantity"),
                    "Say the quantity you'd like",
                ),
                Some(q) if *q < 0 => result.error(
                    "Quantity cannot be negative",
                    Some("quantity"),
                    "Use zero to remove the item entirely",
                ),
                Some(_) => result,
            }
        }

        CommandAction::ViewCart => result,

        CommandAction::BrowseCategory { category } => {
            if category.trim().is_empty() {
                return result.error(
                    "Category name is required",
                    Some("category"),
                    "Say which category you'd like to browse",
                );
            }
            result
        }

        CommandAction::ViewProduct { product_id } => {
            if product_id.trim().is_empty() {
                return result.error(
                    "Product id is required",
                    Some("product_id"),
                    "Say which product you'd like to view",
                );
            }
            result
        }

        CommandAction::Checkout => {
            if context.cart_items.is_empty() {
                return result.error(
                    "Cannot proceed to checkout with empty cart",
                    None,
                    "Add something to your cart first",
                );
            }
            result
        }

        CommandAction::NavigateTo { page } => {
            let page = page.trim().to_lowercase();
            if !KNOWN_PAGES.contains(&page.as_str()) {
                return result.error(
                    format!("Unknown page \"{page}\""),
                    Some("page"),
                    format!("Try one of: {}", KNOWN_PAGES.join(", ")),
                );
            }
            if page == "checkout" && context.cart_items.is_empty() {
                return result.error(
                    "Cannot proceed to checkout with empty cart",
                    None,
                    "Add something to your cart first",
                );
            }
            result
        }

        CommandAction::ApplyFilter { filters } => {
            if filters.is_empty() {
                return result.error(
                    "At least one filter is required",
                    Some("filters"),
                    "Say a filter like a category, size, or color",
                );
            }
            result
        }

        CommandAction::Help { .. } | CommandAction::Repeat | CommandAction::Stop => result,

        CommandAction::Unknown { action } => {
            result.warn(format!("Unrecognized action \"{action}\""))
        }
    }
}

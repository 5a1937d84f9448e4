use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// One line in the cart. `id` is the product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Owned cart repository. The execution engine is the only writer; context
/// extraction and the shopping handler read snapshots. Every mutation
/// broadcasts the new cart contents so dependent UI can refresh reactively.
pub struct CartStore {
    items: Mutex<Vec<CartItem>>,
    changes: broadcast::Sender<Vec<CartItem>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            items: Mutex::new(Vec::new()),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<CartItem>> {
        self.changes.subscribe()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.items.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().map(|i| i.is_empty()).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|i| i.len()).unwrap_or(0)
    }

    /// Add an item, merging quantity into an existing line for the same
    /// product id.
    pub fn add(&self, item: CartItem) {
        {
            let Ok(mut items) = self.items.lock() else {
                return;
            };
            match items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => existing.quantity += item.quantity,
                None => items.push(item),
            }
        }
        self.publish();
    }

    /// Re-insert a previously removed record exactly as it was. Backs the
    /// Undo action on removal notifications.
    pub fn restore(&self, item: CartItem) {
        {
            let Ok(mut items) = self.items.lock() else {
                return;
            };
            items.push(item);
        }
        self.publish();
    }

    /// Remove the first line matching the item id, or failing that, a
    /// case-insensitive name substring. Returns the removed record.
    pub fn remove_matching(
        &self,
        item_id: Option<&str>,
        product_name: Option<&str>,
    ) -> Option<CartItem> {
        let removed = {
            let mut items = self.items.lock().ok()?;
            let index = Self::find_index(&items, item_id, product_name)?;
            Some(items.remove(index))
        };
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    /// Set the quantity of a matching line. Quantity zero removes the line.
    /// Returns the updated (or removed) record.
    pub fn update_quantity(
        &self,
        item_id: Option<&str>,
        product_name: Option<&str>,
        quantity: u32,
    ) -> Option<CartItem> {
        let updated = {
            let mut items = self.items.lock().ok()?;
            let index = Self::find_index(&items, item_id, product_name)?;
            if quantity == 0 {
                Some(items.remove(index))
            } else {
                items[index].quantity = quantity;
                Some(items[index].clone())
            }
        };
        if updated.is_some() {
            self.publish();
        }
        updated
    }

    pub fn clear(&self) {
        if let Ok(mut items) = self.items.lock() {
            items.clear();
        }
        self.publish();
    }

    fn find_index(
        items: &[CartItem],
        item_id: Option<&str>,
        product_name: Option<&str>,
    ) -> Option<usize> {
        if let Some(id) = item_id {
            if let Some(index) = items.iter().position(|i| i.id == id) {
                return Some(index);
            }
        }
        if let Some(name) = product_name {
            let needle = name.to_lowercase();
            return items
                .iter()
                .position(|i| i.name.to_lowercase().contains(&needle));
        }
        None
    }

    fn publish(&self) {
        let snapshot = self.items();
        debug!(lines = snapshot.len(), "cart changed");
        // No receivers is fine; the broadcast is best effort.
        let _ = self.changes.send(snapshot);
    }
}

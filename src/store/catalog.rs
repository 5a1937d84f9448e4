use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// One product document in the catalog collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub subcategory: String,
    pub keywords: Vec<String>,
    pub description: String,
}

/// In-memory product collection with simple substring/keyword search.
/// Stands in for the document store the pipeline consumes in production.
pub struct ProductCatalog {
    products: RwLock<Vec<Product>>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Demo inventory, enough for every search scenario to run end to end.
    pub fn with_demo_inventory() -> Self {
        fn product(
            id: &str,
            name: &str,
            price: f64,
            category: &str,
            subcategory: &str,
            keywords: &[&str],
            description: &str,
        ) -> Product {
            Product {
                id: id.to_string(),
                name: name.to_string(),
                price,
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                description: description.to_string(),
            }
        }

        Self::new(vec![
            product(
                "p1",
                "Apple iPhone 15 Pro Max",
                1199.99,
                "electronics",
                "smartphones",
                &["phone", "apple", "iphone", "smartphone", "mobile"],
                "The latest iPhone with advanced camera and performance features",
            ),
            product(
                "p2",
                "Sony WH-1000XM5 Wireless Headphones",
                349.99,
                "electronics",
                "headphones",
                &["headphones", "wireless", "sony", "noise cancelling", "audio"],
                "Premium noise cancelling wireless headphones with exceptional sound quality",
            ),
            product(
                "p3",
                "MacBook Air M2",
                1099.99,
                "electronics",
                "laptops",
                &["laptop", "macbook", "apple", "computer"],
                "Ultra-thin and lightweight laptop with M2 chip",
            ),
            product(
                "p4",
                "Samsung 55\" QLED 4K Smart TV",
                649.99,
                "electronics",
                "televisions",
                &["tv", "television", "samsung", "smart tv", "4k"],
                "55-inch QLED smart TV with 4K resolution",
            ),
            product(
                "p5",
                "Bose QuietComfort Wireless Earbuds",
                279.99,
                "electronics",
                "headphones",
                &["earbuds", "wireless", "bose", "headphones", "noise cancelling"],
                "Wireless earbuds with noise cancellation technology",
            ),
            product(
                "p6",
                "Nike Air Max 270 Running Shoes",
                150.00,
                "fashion",
                "shoes",
                &["shoes", "running", "nike", "sneakers"],
                "Comfortable running shoes with air cushioning",
            ),
            product(
                "p7",
                "Instant Pot Duo 7-in-1 Pressure Cooker",
                89.99,
                "home",
                "kitchen",
                &["kitchen", "cooker", "pressure cooker", "instant pot", "appliance"],
                "Multi-functional pressure cooker for quick and easy meals",
            ),
            product(
                "p8",
                "PlayStation 5 Console",
                499.99,
                "electronics",
                "gaming",
                &["gaming", "playstation", "ps5", "console"],
                "Next-generation gaming console with ultra-fast SSD",
            ),
        ])
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.products
            .read()
            .ok()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn add(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.push(product);
        }
    }

    /// Replace the document with a matching id. Returns false when absent.
    pub fn update(&self, product: Product) -> bool {
        let Ok(mut products) = self.products.write() else {
            return false;
        };
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(slot) => {
                *slot = product;
                true
            }
            None => false,
        }
    }

    /// Substring match across name, category, subcategory, and description,
    /// plus per-term keyword matching.
    pub fn search(&self, query: &str) -> Vec<Product> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Vec::new();
        }
        let terms: Vec<&str> = normalized.split_whitespace().collect();

        let Ok(products) = self.products.read() else {
            return Vec::new();
        };
        products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&normalized)
                    || p.category.to_lowercase().contains(&normalized)
                    || p.subcategory.to_lowercase().contains(&normalized)
                    || p.description.to_lowercase().contains(&normalized)
                    || p.keywords
                        .iter()
                        .any(|k| terms.iter().any(|t| k.contains(t)))
            })
            .cloned()
            .collect()
    }

    pub fn in_category(&self, category: &str) -> Vec<Product> {
        let normalized = category.trim().to_lowercase();
        let Ok(products) = self.products.read() else {
            return Vec::new();
        };
        products
            .iter()
            .filter(|p| p.category.to_lowercase() == normalized)
            .cloned()
            .collect()
    }

    /// Distinct category names, in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let Ok(products) = self.products.read() else {
            return Vec::new();
        };
        let mut seen = Vec::new();
        for p in products.iter() {
            if !seen.contains(&p.category) {
                seen.push(p.category.clone());
            }
        }
        seen
    }
}

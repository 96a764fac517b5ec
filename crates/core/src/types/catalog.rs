//! Catalog entries shown on the home and search screens.

use serde::{Deserialize, Serialize};

use super::Price;

/// A purchasable product.
///
/// Products are passed between screens by value; the title doubles as the
/// product key since the backend exposes no product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product title.
    pub title: String,
    /// Image URL.
    pub image: String,
    /// Category label (e.g. `Clippers`).
    pub category: String,
    /// Unit price.
    pub price: Price,
}

impl Product {
    /// Whether this product belongs to `category`, ignoring ASCII case.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category.trim())
    }

    /// Whether the title contains `query`, ignoring case.
    #[must_use]
    pub fn title_matches(&self, query: &str) -> bool {
        self.title
            .to_lowercase()
            .contains(&query.trim().to_lowercase())
    }
}

/// A promotional banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Banner name.
    pub title: String,
    /// Image URL.
    pub image: String,
}

/// One row of the home listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogEntry {
    /// A full-width banner.
    Banner(Banner),
    /// A product listing.
    Product(Product),
}

impl CatalogEntry {
    /// The product, if this entry is one.
    #[must_use]
    pub const fn as_product(&self) -> Option<&Product> {
        match self {
            Self::Product(product) => Some(product),
            Self::Banner(_) => None,
        }
    }

    /// Entry title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Product(product) => &product.title,
            Self::Banner(banner) => &banner.title,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn clipper() -> Product {
        Product {
            title: "Wahl Magic Clip".to_string(),
            image: "https://img/clip.png".to_string(),
            category: "Clippers".to_string(),
            price: Price::parse("124.99").unwrap(),
        }
    }

    #[test]
    fn test_in_category_ignores_case() {
        assert!(clipper().in_category("clippers"));
        assert!(!clipper().in_category("Trimmers"));
    }

    #[test]
    fn test_title_matches_substring() {
        assert!(clipper().title_matches("magic"));
        assert!(clipper().title_matches("WAHL"));
        assert!(!clipper().title_matches("Andis"));
    }

    #[test]
    fn test_as_product() {
        let banner = CatalogEntry::Banner(Banner {
            title: "banner1".to_string(),
            image: "https://img/b.jpg".to_string(),
        });
        assert!(banner.as_product().is_none());
        assert_eq!(banner.title(), "banner1");
        assert!(CatalogEntry::Product(clipper()).as_product().is_some());
    }
}

//! Product catalog entities.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, VendorId};
use serde::{Deserialize, Serialize};

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pottery,
    Jewelry,
    Woodwork,
    Textiles,
    Art,
    Other,
}

impl Category {
    /// Returns the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pottery => "pottery",
            Category::Jewelry => "jewelry",
            Category::Woodwork => "woodwork",
            Category::Textiles => "textiles",
            Category::Art => "art",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pottery" => Ok(Category::Pottery),
            "jewelry" => Ok(Category::Jewelry),
            "woodwork" => Ok(Category::Woodwork),
            "textiles" => Ok(Category::Textiles),
            "art" => Ok(Category::Art),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// The derived rating aggregate stored on a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean of all review ratings, 0.0 when there are none.
    pub rating: f64,
    /// Number of reviews.
    pub review_count: u64,
}

impl RatingSummary {
    /// Returns the zero aggregate for a product without reviews.
    pub fn empty() -> Self {
        Self {
            rating: 0.0,
            review_count: 0,
        }
    }

    /// Computes the aggregate from the full set of a product's ratings.
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self::empty();
        }
        let sum: u64 = ratings.iter().map(|r| *r as u64).sum();
        Self {
            rating: sum as f64 / ratings.len() as f64,
            review_count: ratings.len() as u64,
        }
    }
}

/// A product in the catalog.
///
/// `rating` and `review_count` are derived — they must always equal the
/// mean and count of the product's reviews. The core never mutates name,
/// price, stock, or images; those are catalog-management concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub category: Category,
    pub images: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub approved: bool,
    pub featured: bool,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a freshly uploaded product: unapproved, unrated, not featured.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        vendor_id: VendorId,
        vendor_name: impl Into<String>,
        category: Category,
        images: Vec<String>,
        stock: u32,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            price,
            vendor_id,
            vendor_name: vendor_name.into(),
            category,
            images,
            rating: 0.0,
            review_count: 0,
            approved: false,
            featured: false,
            stock,
            created_at: Utc::now(),
        }
    }
}

//! Product records as they move through the pipeline.
//!
//! A product is identified by its `(store, sku)` pair. Catalog records and
//! scraped records both carry that identity plus descriptive fields; the
//! classifier attaches exactly one [`ProductStatus`] to every scraped record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The unit of deduplication: a SKU scoped to the store that lists it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductIdentity {
    #[serde(rename = "store")]
    pub store_name: String,
    pub sku: String,
}

impl ProductIdentity {
    pub fn new(store_name: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            sku: sku.into(),
        }
    }
}

impl fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.store_name, self.sku)
    }
}

/// A row of a store's reference catalog. Only the identity survives the
/// identity-list stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub identity: ProductIdentity,
    pub title: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub label: String,
}

/// A listing pulled from a store's scraped feed, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRecord {
    pub identity: ProductIdentity,
    pub title: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub label: String,
}

/// Classification outcome. Closed on purpose: the aggregator matches on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    New,
    Duplicate,
    OutOfCategory,
    StopWordInTitle,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 4] = [
        ProductStatus::New,
        ProductStatus::Duplicate,
        ProductStatus::OutOfCategory,
        ProductStatus::StopWordInTitle,
    ];

    /// Literal name written to the classified artifact.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::New => "NEW",
            ProductStatus::Duplicate => "DUPLICATE",
            ProductStatus::OutOfCategory => "OUT_OF_CATEGORY",
            ProductStatus::StopWordInTitle => "STOP_WORD_IN_TITLE",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown product status '{s}'"))
    }
}

/// A scraped record with the status the classifier assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub product: ScrapedRecord,
    pub status: ProductStatus,
}

impl ClassifiedRecord {
    pub fn identity(&self) -> &ProductIdentity {
        &self.product.identity
    }
}

//! Store configuration and on-disk layout.
//!
//! Stores are declared in a TOML file:
//!
//! ```toml
//! [[stores]]
//! name = "Gadget Hub"
//! catalog = "gadget_hub"
//! scraped_prefix = "gadgethub_"
//! categories = ["Electronics*", "*Phones*"]
//! stop_words = ["(used)", "Refurb"]
//!
//! [stores.columns]
//! sku = 1
//! title = 2
//! category = 4
//! ```
//!
//! Configuration is loaded once per run and never mutated afterwards.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;

/// 1-based column positions into a scraped row. `sku` and `title` are
/// required; an absent optional column always yields an empty field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub sku: NonZeroUsize,
    pub title: NonZeroUsize,
    #[serde(default)]
    pub category: Option<NonZeroUsize>,
    #[serde(default)]
    pub image: Option<NonZeroUsize>,
    #[serde(default)]
    pub brand: Option<NonZeroUsize>,
}

impl ColumnMapping {
    /// Highest position the mapping references.
    pub fn max_position(&self) -> usize {
        [
            Some(self.sku),
            Some(self.title),
            self.category,
            self.image,
            self.brand,
        ]
        .into_iter()
        .flatten()
        .map(NonZeroUsize::get)
        .max()
        .unwrap_or(0)
    }
}

/// Per-store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Display name; also the store half of every scraped identity.
    pub name: String,
    /// Reference catalog key, resolved to `data/repos/<catalog>.<ext>`.
    pub catalog: String,
    /// Scraped files are those named `<scraped_prefix>*.csv`.
    pub scraped_prefix: String,
    pub columns: ColumnMapping,
    /// Category whitelist patterns (`*substr*`, `*suffix`, `prefix*`, exact).
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub stop_words: Vec<String>,
    /// Reject records with an empty category instead of accepting them.
    #[serde(default)]
    pub skip_empty_category: bool,
}

/// Header names used to read reference catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub store: String,
    pub sku: String,
    pub title: String,
    pub image: String,
    pub category: String,
    pub brand: String,
    pub label: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            store: "store".to_string(),
            sku: "sku".to_string(),
            title: "title".to_string(),
            image: "image".to_string(),
            category: "category".to_string(),
            brand: "brand".to_string(),
            label: "label".to_string(),
        }
    }
}

fn default_scraped_delimiter() -> char {
    '\t'
}

fn default_catalog_extension() -> String {
    "csv".to_string()
}

/// Everything the pipeline needs to know about the stores of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stores in processing order. The order is significant for dedup.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
    #[serde(default)]
    pub catalog_columns: CatalogColumns,
    #[serde(default = "default_scraped_delimiter")]
    pub scraped_delimiter: char,
    #[serde(default = "default_catalog_extension")]
    pub catalog_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stores: Vec::new(),
            catalog_columns: CatalogColumns::default(),
            scraped_delimiter: default_scraped_delimiter(),
            catalog_extension: default_catalog_extension(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "cannot read store configuration {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml(&content)?;
        info!(
            "Loaded {} store(s) from {}",
            config.stores.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.scraped_delimiter.is_ascii() {
            return Err(PipelineError::Configuration(format!(
                "scraped_delimiter must be a single ASCII character, got {:?}",
                self.scraped_delimiter
            )));
        }
        let mut seen = HashSet::new();
        for store in &self.stores {
            if store.name.trim().is_empty() {
                return Err(PipelineError::Configuration(
                    "store name must not be empty".to_string(),
                ));
            }
            if !seen.insert(store.name.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "store '{}' is configured more than once",
                    store.name
                )));
            }
            if store.scraped_prefix.is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "store '{}' has an empty scraped_prefix",
                    store.name
                )));
            }
            if store.catalog.is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "store '{}' has an empty catalog key",
                    store.name
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn scraped_delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.scraped_delimiter as u8
    }
}

/// On-disk layout of a run, rooted at a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base_dir: PathBuf,
}

impl Layout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir().join("repos")
    }

    pub fn scraped_dir(&self) -> PathBuf {
        self.data_dir().join("scraped")
    }

    pub fn process_dir(&self) -> PathBuf {
        self.base_dir.join("process")
    }

    pub fn result_dir(&self) -> PathBuf {
        self.base_dir.join("result")
    }

    pub fn catalog_path(&self, store: &StoreConfig, extension: &str) -> PathBuf {
        self.repos_dir()
            .join(format!("{}.{}", store.catalog, extension))
    }

    /// Identity list artifact (identity stage output).
    pub fn identities_path(&self) -> PathBuf {
        self.process_dir().join("unique_products.csv")
    }

    /// Classified records artifact (classifier stage output).
    pub fn classified_path(&self) -> PathBuf {
        self.process_dir().join("processed_products.csv")
    }

    /// Stats table (final output).
    pub fn stats_path(&self) -> PathBuf {
        self.result_dir().join("stats.csv")
    }
}

//! # listing-pipeline
//!
//! Classifies newly scraped store listings against a reference catalog.
//!
//! A run has three stages, each handing a CSV artifact to the next:
//! 1. identity list: the `(store, sku)` pairs of every reference catalog;
//! 2. classification: every scraped record gets one of `NEW`, `DUPLICATE`,
//!    `OUT_OF_CATEGORY` or `STOP_WORD_IN_TITLE`;
//! 3. stats: per-store counts of accepted and rejected records.
//!
//! ## Example
//!
//! ```rust,no_run
//! use listing_pipeline::config::{Layout, PipelineConfig};
//! use listing_pipeline::pipeline::PipelineRunner;
//!
//! let config = PipelineConfig::from_file("run/stores.toml")?;
//! let layout = Layout::new("run");
//! PipelineRunner::new(&config, &layout).run()?;
//! # Ok::<(), listing_pipeline::error::PipelineError>(())
//! ```

pub mod artifact;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod deduplication;
pub mod error;
pub mod filters;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod stats;

pub use config::{Layout, PipelineConfig, StoreConfig};
pub use error::PipelineError;
pub use model::{ClassifiedRecord, ProductIdentity, ProductStatus, ScrapedRecord};
pub use pipeline::{PipelineRunner, StageKind, StageOutcome};

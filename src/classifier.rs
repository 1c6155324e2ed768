//! Scraped-product classification stage.
//!
//! Every scraped record gets exactly one status, decided by the first rule
//! that applies:
//! 1. category not whitelisted: `OUT_OF_CATEGORY`
//! 2. title contains a stop word: `STOP_WORD_IN_TITLE`
//! 3. identity already known: `DUPLICATE`
//! 4. otherwise `NEW`, and the identity becomes known immediately.
//!
//! Stores are walked in configured order, files in sorted path order and
//! rows in file order, all against one [`IdentitySet`]. Reordering the input
//! changes which of two equal records is accepted.

use std::path::Path;

use tracing::{debug, info};

use crate::artifact::{read_identities, ArtifactWriter, ClassifiedRow, CLASSIFIED_HEADERS};
use crate::config::{Layout, PipelineConfig, StoreConfig};
use crate::deduplication::IdentitySet;
use crate::error::PipelineError;
use crate::filters::{has_stop_words, is_out_of_category};
use crate::model::{ClassifiedRecord, ProductStatus, ScrapedRecord};
use crate::source::{discover_scraped_files, read_scraped};

/// Decides the status of one record, registering it in `seen` when it is
/// accepted as new.
pub fn status_for(
    store: &StoreConfig,
    product: &ScrapedRecord,
    seen: &mut IdentitySet,
) -> ProductStatus {
    if is_out_of_category(
        product.category.as_deref(),
        &store.categories,
        store.skip_empty_category,
    ) {
        ProductStatus::OutOfCategory
    } else if has_stop_words(&product.title, &store.stop_words) {
        ProductStatus::StopWordInTitle
    } else if seen.contains(&product.identity) {
        ProductStatus::Duplicate
    } else {
        seen.insert(product.identity.clone());
        ProductStatus::New
    }
}

/// Owns the identity set for the duration of one classification run.
#[derive(Debug)]
pub struct Classifier {
    seen: IdentitySet,
    counts: [usize; 4],
}

impl Classifier {
    pub fn new(seen: IdentitySet) -> Self {
        Self {
            seen,
            counts: [0; 4],
        }
    }

    pub fn classify(&mut self, store: &StoreConfig, product: ScrapedRecord) -> ClassifiedRecord {
        let status = status_for(store, &product, &mut self.seen);
        self.counts[status as usize] += 1;
        debug!("{} -> {}", product.identity, status);
        ClassifiedRecord { product, status }
    }

    /// Number of records assigned `status` so far.
    pub fn count(&self, status: ProductStatus) -> usize {
        self.counts[status as usize]
    }

    pub fn known_identities(&self) -> usize {
        self.seen.len()
    }
}

/// Classifies every scraped feed of every configured store against the
/// identity list at `identities`, writing the classified artifact to
/// `output`. Nothing is written unless every row was classified.
pub fn classify_scraped(
    config: &PipelineConfig,
    layout: &Layout,
    identities: &Path,
    output: &Path,
) -> Result<usize, PipelineError> {
    let seed = read_identities(identities)?.collect::<Result<Vec<_>, _>>()?;
    let mut classifier = Classifier::new(IdentitySet::seeded(seed));
    let mut writer = ArtifactWriter::<ClassifiedRow>::create(output, &CLASSIFIED_HEADERS)?;
    let scraped_dir = layout.scraped_dir();

    for store in &config.stores {
        let files = discover_scraped_files(&scraped_dir, &store.scraped_prefix)?;
        info!(
            "Classifying {} scraped file(s) for store '{}'",
            files.len(),
            store.name
        );
        for file in files {
            for product in read_scraped(&file, store, config.scraped_delimiter_byte())? {
                let classified = classifier.classify(store, product?);
                writer.write(&ClassifiedRow::from(&classified))?;
            }
        }
    }

    let rows = writer.commit()?;
    info!(
        new = classifier.count(ProductStatus::New),
        duplicate = classifier.count(ProductStatus::Duplicate),
        out_of_category = classifier.count(ProductStatus::OutOfCategory),
        stop_word = classifier.count(ProductStatus::StopWordInTitle),
        known = classifier.known_identities(),
        "Classified {} scraped record(s)",
        rows
    );
    Ok(rows)
}

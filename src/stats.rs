//! Per-store acceptance stats.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{read_classified, ArtifactWriter};
use crate::config::StoreConfig;
use crate::error::PipelineError;
use crate::model::{ClassifiedRecord, ProductStatus};

pub const STATS_HEADERS: [&str; 4] = [
    "store_name",
    "accepted_count",
    "category_rejected_count",
    "title_rejected_count",
];

/// One row of the stats table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub store_name: String,
    pub accepted: usize,
    pub rejected_by_category: usize,
    pub rejected_by_title: usize,
}

impl StoreStats {
    fn empty(store_name: &str) -> Self {
        Self {
            store_name: store_name.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, status: ProductStatus) {
        match status {
            ProductStatus::New => self.accepted += 1,
            ProductStatus::OutOfCategory => self.rejected_by_category += 1,
            ProductStatus::StopWordInTitle => self.rejected_by_title += 1,
            ProductStatus::Duplicate => {}
        }
    }
}

/// Counts classified records per configured store. Every store gets a row,
/// in configured order, even without records. Duplicates are never counted.
pub fn aggregate<I>(records: I, stores: &[StoreConfig]) -> Result<Vec<StoreStats>, PipelineError>
where
    I: IntoIterator<Item = Result<ClassifiedRecord, PipelineError>>,
{
    let mut stats: Vec<StoreStats> = stores.iter().map(|s| StoreStats::empty(&s.name)).collect();
    let index: HashMap<&str, usize> = stores
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    let mut unknown: HashMap<String, usize> = HashMap::new();
    for record in records {
        let record = record?;
        let store_name = record.identity().store_name.as_str();
        match index.get(store_name) {
            Some(&i) => stats[i].record(record.status),
            None => *unknown.entry(store_name.to_string()).or_default() += 1,
        }
    }
    for (store_name, count) in unknown {
        warn!(
            "Ignoring {} classified record(s) for unconfigured store '{}'",
            count, store_name
        );
    }

    Ok(stats)
}

/// Reads the classified artifact at `classified` and writes the stats
/// table to `output`.
pub fn write_stats(
    stores: &[StoreConfig],
    classified: &Path,
    output: &Path,
) -> Result<usize, PipelineError> {
    let records = read_classified(classified, |r| r.status != ProductStatus::Duplicate)?;
    let stats = aggregate(records, stores)?;

    let mut writer = ArtifactWriter::<StoreStats>::create(output, &STATS_HEADERS)?;
    for row in &stats {
        info!(
            accepted = row.accepted,
            rejected_by_category = row.rejected_by_category,
            rejected_by_title = row.rejected_by_title,
            "Stats for store '{}'",
            row.store_name
        );
        writer.write(row)?;
    }
    writer.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::model::{ProductIdentity, ScrapedRecord};

    fn stores() -> Vec<StoreConfig> {
        PipelineConfig::from_toml(
            r#"
[[stores]]
name = "A"
catalog = "a"
scraped_prefix = "a_"
[stores.columns]
sku = 1
title = 2

[[stores]]
name = "B"
catalog = "b"
scraped_prefix = "b_"
[stores.columns]
sku = 1
title = 2
"#,
        )
        .unwrap()
        .stores
    }

    fn record(
        store: &str,
        sku: &str,
        status: ProductStatus,
    ) -> Result<ClassifiedRecord, PipelineError> {
        Ok(ClassifiedRecord {
            product: ScrapedRecord {
                identity: ProductIdentity::new(store, sku),
                title: String::new(),
                image: None,
                category: None,
                brand: None,
                label: String::new(),
            },
            status,
        })
    }

    #[test]
    fn every_store_reported_in_order_and_duplicates_ignored() {
        let records = vec![
            record("B", "1", ProductStatus::New),
            record("B", "1", ProductStatus::Duplicate),
            record("B", "2", ProductStatus::OutOfCategory),
            record("B", "3", ProductStatus::StopWordInTitle),
            record("B", "4", ProductStatus::New),
            record("Z", "1", ProductStatus::New),
        ];
        let stats = aggregate(records, &stores()).unwrap();
        assert_eq!(
            stats,
            vec![
                StoreStats {
                    store_name: "A".to_string(),
                    accepted: 0,
                    rejected_by_category: 0,
                    rejected_by_title: 0,
                },
                StoreStats {
                    store_name: "B".to_string(),
                    accepted: 2,
                    rejected_by_category: 1,
                    rejected_by_title: 1,
                },
            ]
        );
    }

    #[test]
    fn stats_table_layout() {
        let dir = tempfile::tempdir().unwrap();
        let classified = dir.path().join("processed_products.csv");
        std::fs::write(
            &classified,
            "store,sku,title,image,category,brand,label,status\n\
             A,1,Phone,,Electronics,,,NEW\n\
             A,1,Phone,,Electronics,,,DUPLICATE\n",
        )
        .unwrap();
        let output = dir.path().join("result").join("stats.csv");

        assert_eq!(write_stats(&stores(), &classified, &output).unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "store_name,accepted_count,category_rejected_count,title_rejected_count\n\
             A,1,0,0\n\
             B,0,0,0\n"
        );
    }
}

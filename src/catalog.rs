//! Identity list stage.
//!
//! Collects the `(store, sku)` identities of every configured store's
//! reference catalog and writes them as the identity list artifact. A store
//! without a catalog file contributes nothing; that is the one input whose
//! absence is not an error.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::artifact::{ArtifactWriter, IDENTITY_HEADERS};
use crate::config::{Layout, PipelineConfig};
use crate::error::PipelineError;
use crate::model::ProductIdentity;
use crate::source::read_catalog;

/// Reads all present catalogs and returns their identities in first-seen
/// order, without repeats.
pub fn collect_identities(
    config: &PipelineConfig,
    layout: &Layout,
) -> Result<Vec<ProductIdentity>, PipelineError> {
    let mut seen = HashSet::new();
    let mut identities = Vec::new();

    for store in &config.stores {
        let path = layout.catalog_path(store, &config.catalog_extension);
        if !path.exists() {
            debug!(
                "No catalog for store '{}' at {:?}, skipping",
                store.name, path
            );
            continue;
        }

        let before = identities.len();
        for record in read_catalog(&path, &config.catalog_columns)? {
            let identity = record?.identity;
            if seen.insert(identity.clone()) {
                identities.push(identity);
            }
        }
        info!(
            "Catalog for store '{}' contributed {} identities",
            store.name,
            identities.len() - before
        );
    }

    Ok(identities)
}

/// Builds the identity list artifact at `output`.
pub fn build_identity_list(
    config: &PipelineConfig,
    layout: &Layout,
    output: &Path,
) -> Result<usize, PipelineError> {
    let identities = collect_identities(config, layout)?;
    let mut writer = ArtifactWriter::<ProductIdentity>::create(output, &IDENTITY_HEADERS)?;
    for identity in &identities {
        writer.write(identity)?;
    }
    writer.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config() -> PipelineConfig {
        PipelineConfig::from_toml(
            r#"
[[stores]]
name = "A"
catalog = "a_repo"
scraped_prefix = "a_"
[stores.columns]
sku = 1
title = 2

[[stores]]
name = "B"
catalog = "b_repo"
scraped_prefix = "b_"
[stores.columns]
sku = 1
title = 2
"#,
        )
        .unwrap()
    }

    #[test]
    fn repeated_catalog_rows_collapse_and_missing_catalogs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        fs::create_dir_all(layout.repos_dir()).unwrap();
        fs::write(
            layout.repos_dir().join("a_repo.csv"),
            "store,sku,title,image,category,brand,label\n\
             A,1,Phone,,Electronics,,\n\
             A,1,Phone again,,Electronics,,\n\
             A,2,Tablet,,Electronics,,\n",
        )
        .unwrap();

        let identities = collect_identities(&config(), &layout).unwrap();
        assert_eq!(
            identities,
            vec![ProductIdentity::new("A", "1"), ProductIdentity::new("A", "2")]
        );
    }

    #[test]
    fn no_catalogs_still_writes_a_header_only_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let output = layout.identities_path();

        assert_eq!(build_identity_list(&config(), &layout, &output).unwrap(), 0);
        assert_eq!(fs::read_to_string(output).unwrap(), "store,sku\n");
    }
}

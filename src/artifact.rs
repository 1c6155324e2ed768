//! Stage hand-off artifacts.
//!
//! Every stage boundary is a UTF-8 CSV file with a header row. This module
//! owns both directions:
//! - [`ArtifactWriter`] streams rows into a sibling `.tmp` file and only
//!   renames it over the real path on [`ArtifactWriter::commit`]. A writer
//!   dropped without committing removes its temp file, so a failed stage
//!   never leaves a truncated artifact behind.
//! - [`read_identities`] and [`read_classified`] stream artifacts back in
//!   for the next stage.

use std::fs::{self, File};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Writer, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::model::{ClassifiedRecord, ProductIdentity, ProductStatus, ScrapedRecord};

pub const IDENTITY_HEADERS: [&str; 2] = ["store", "sku"];

pub const CLASSIFIED_HEADERS: [&str; 8] = [
    "store", "sku", "title", "image", "category", "brand", "label", "status",
];

/// Writes one artifact atomically.
pub struct ArtifactWriter<T> {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: Option<Writer<File>>,
    rows: usize,
    _phantom: PhantomData<T>,
}

impl<T: Serialize> ArtifactWriter<T> {
    /// Creates the parent directory, opens the temp file and writes the
    /// header row.
    pub fn create(path: impl AsRef<Path>, headers: &[&str]) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        info!("Initializing artifact writer for file: {:?}", path);

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)?;
        writer.write_record(headers)?;

        Ok(Self {
            path,
            tmp_path,
            writer: Some(writer),
            rows: 0,
            _phantom: PhantomData,
        })
    }

    pub fn write(&mut self, row: &T) -> Result<(), PipelineError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(row)?;
            self.rows += 1;
        }
        Ok(())
    }

    /// Flushes the temp file and moves it into place. Returns the number of
    /// data rows written.
    pub fn commit(mut self) -> Result<usize, PipelineError> {
        let Some(writer) = self.writer.take() else {
            return Ok(self.rows);
        };
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&self.tmp_path, &self.path) {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(e.into());
        }
        info!("Committed {} row(s) to {:?}", self.rows, self.path);
        Ok(self.rows)
    }
}

impl<T> Drop for ArtifactWriter<T> {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            warn!("Discarding uncommitted artifact {:?}", self.path);
            if let Err(e) = fs::remove_file(&self.tmp_path) {
                debug!("Could not remove {:?}: {}", self.tmp_path, e);
            }
        }
    }
}

/// Streams typed rows out of an artifact.
pub struct ArtifactReader<T> {
    path: PathBuf,
    rows: DeserializeRecordsIntoIter<File, T>,
}

impl<T: DeserializeOwned> ArtifactReader<T> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening artifact: {:?}", path);
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(|e| PipelineError::input_format(&path, e))?;
        Ok(Self {
            path,
            rows: reader.into_deserialize(),
        })
    }
}

impl<T: DeserializeOwned> Iterator for ArtifactReader<T> {
    type Item = Result<T, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|row| row.map_err(|e| PipelineError::input_format(&self.path, e)))
    }
}

/// Flat row shape of the classified artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub store: String,
    pub sku: String,
    pub title: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub label: String,
    pub status: ProductStatus,
}

impl From<&ClassifiedRecord> for ClassifiedRow {
    fn from(record: &ClassifiedRecord) -> Self {
        let product = &record.product;
        Self {
            store: product.identity.store_name.clone(),
            sku: product.identity.sku.clone(),
            title: product.title.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            label: product.label.clone(),
            status: record.status,
        }
    }
}

impl From<ClassifiedRow> for ClassifiedRecord {
    fn from(row: ClassifiedRow) -> Self {
        Self {
            product: ScrapedRecord {
                identity: ProductIdentity::new(row.store, row.sku),
                title: row.title,
                image: row.image,
                category: row.category,
                brand: row.brand,
                label: row.label,
            },
            status: row.status,
        }
    }
}

/// Reads the identity list artifact.
pub fn read_identities(
    path: impl AsRef<Path>,
) -> Result<ArtifactReader<ProductIdentity>, PipelineError> {
    ArtifactReader::open(path)
}

/// Reads the classified artifact, yielding only records that satisfy
/// `predicate`.
pub fn read_classified<P>(
    path: impl AsRef<Path>,
    predicate: P,
) -> Result<impl Iterator<Item = Result<ClassifiedRecord, PipelineError>>, PipelineError>
where
    P: Fn(&ClassifiedRecord) -> bool,
{
    let rows = ArtifactReader::<ClassifiedRow>::open(path)?;
    Ok(rows
        .map(|row| row.map(ClassifiedRecord::from))
        .filter(move |row| match row {
            Ok(record) => predicate(record),
            Err(_) => true,
        }))
}

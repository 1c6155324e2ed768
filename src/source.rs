//! Row sources and record shapers.
//!
//! Reading a product file is split into two roles:
//! - a [`RowSource`] produces ordered rows of string fields plus a header;
//! - a [`RecordShaper`] knows how to turn one row into one record.
//!
//! [`ShapedRecords`] composes the two into a lazy iterator, so files are
//! streamed row by row and never loaded wholesale.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use tracing::debug;

use crate::config::{CatalogColumns, ColumnMapping, StoreConfig};
use crate::error::PipelineError;
use crate::model::{CatalogRecord, ProductIdentity, ScrapedRecord};

/// Produces the header and then the data rows of one tabular input.
pub trait RowSource {
    /// Where the rows come from, for error messages.
    fn origin(&self) -> &Path;

    fn headers(&self) -> &StringRecord;

    fn next_row(&mut self) -> Option<Result<StringRecord, PipelineError>>;
}

/// A delimited text file with a header row.
pub struct CsvRowSource {
    path: PathBuf,
    headers: StringRecord,
    records: StringRecordsIntoIter<File>,
}

impl CsvRowSource {
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening row source: {:?}", path);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| PipelineError::input_format(&path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::input_format(&path, e))?
            .clone();
        Ok(Self {
            path,
            headers,
            records: reader.into_records(),
        })
    }
}

impl RowSource for CsvRowSource {
    fn origin(&self) -> &Path {
        &self.path
    }

    fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn next_row(&mut self) -> Option<Result<StringRecord, PipelineError>> {
        self.records
            .next()
            .map(|row| row.map_err(|e| PipelineError::input_format(&self.path, e)))
    }
}

/// In-memory rows, mainly for exercising shapers without touching disk.
pub struct MemoryRowSource {
    origin: PathBuf,
    headers: StringRecord,
    rows: std::vec::IntoIter<StringRecord>,
}

impl MemoryRowSource {
    pub fn new<H, R, F>(origin: impl Into<PathBuf>, headers: H, rows: R) -> Self
    where
        H: IntoIterator<Item = F>,
        R: IntoIterator<Item = Vec<F>>,
        F: AsRef<str>,
    {
        let headers: StringRecord = headers
            .into_iter()
            .map(|h| h.as_ref().to_string())
            .collect();
        let rows: Vec<StringRecord> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|f| f.as_ref().to_string()).collect())
            .collect();
        Self {
            origin: origin.into(),
            headers,
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for MemoryRowSource {
    fn origin(&self) -> &Path {
        &self.origin
    }

    fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn next_row(&mut self) -> Option<Result<StringRecord, PipelineError>> {
        self.rows.next().map(Ok)
    }
}

/// Per-record construction rule.
pub trait RecordShaper {
    type Record;

    /// Resolves whatever the shaper needs from the header. Called once per
    /// source, before the first row.
    fn bind(&mut self, origin: &Path, headers: &StringRecord) -> Result<(), PipelineError>;

    fn shape(&self, origin: &Path, row: &StringRecord) -> Result<Self::Record, PipelineError>;
}

/// Lazily shapes every row of a source.
pub struct ShapedRecords<S, H> {
    source: S,
    shaper: H,
}

impl<S: RowSource, H: RecordShaper> ShapedRecords<S, H> {
    pub fn new(source: S, mut shaper: H) -> Result<Self, PipelineError> {
        shaper.bind(source.origin(), source.headers())?;
        Ok(Self { source, shaper })
    }
}

impl<S: RowSource, H: RecordShaper> Iterator for ShapedRecords<S, H> {
    type Item = Result<H::Record, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.source.next_row()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(self.shaper.shape(self.source.origin(), &row))
    }
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or(0)
}

/// Shapes scraped feed rows by 1-based column position.
pub struct ScrapedShaper {
    store_name: String,
    columns: ColumnMapping,
}

impl ScrapedShaper {
    pub fn new(store: &StoreConfig) -> Self {
        Self {
            store_name: store.name.clone(),
            columns: store.columns,
        }
    }

    fn required(
        &self,
        origin: &Path,
        row: &StringRecord,
        position: usize,
        name: &str,
    ) -> Result<String, PipelineError> {
        row.get(position - 1).map(str::to_string).ok_or_else(|| {
            PipelineError::input_format(
                origin,
                format!(
                    "line {}: row has {} field(s), {name} expected at column {position}",
                    line_of(row),
                    row.len()
                ),
            )
        })
    }

    fn optional(row: &StringRecord, position: Option<std::num::NonZeroUsize>) -> Option<String> {
        position.and_then(|p| row.get(p.get() - 1)).map(str::to_string)
    }
}

impl RecordShaper for ScrapedShaper {
    type Record = ScrapedRecord;

    fn bind(&mut self, origin: &Path, headers: &StringRecord) -> Result<(), PipelineError> {
        let needed = self.columns.max_position();
        // an empty file has no header and no rows
        if !headers.is_empty() && needed > headers.len() {
            return Err(PipelineError::Configuration(format!(
                "store '{}' maps column {needed} but {} has only {} column(s)",
                self.store_name,
                origin.display(),
                headers.len()
            )));
        }
        Ok(())
    }

    fn shape(&self, origin: &Path, row: &StringRecord) -> Result<ScrapedRecord, PipelineError> {
        let sku = self.required(origin, row, self.columns.sku.get(), "sku")?;
        let title = self.required(origin, row, self.columns.title.get(), "title")?;
        Ok(ScrapedRecord {
            identity: ProductIdentity::new(self.store_name.clone(), sku),
            title,
            image: Self::optional(row, self.columns.image),
            category: Self::optional(row, self.columns.category),
            brand: Self::optional(row, self.columns.brand),
            label: String::new(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CatalogIndices {
    store: usize,
    sku: usize,
    title: Option<usize>,
    image: Option<usize>,
    category: Option<usize>,
    brand: Option<usize>,
    label: Option<usize>,
}

/// Shapes reference catalog rows by header name.
pub struct CatalogShaper {
    columns: CatalogColumns,
    indices: CatalogIndices,
}

impl CatalogShaper {
    pub fn new(columns: CatalogColumns) -> Self {
        Self {
            columns,
            indices: CatalogIndices::default(),
        }
    }
}

impl RecordShaper for CatalogShaper {
    type Record = CatalogRecord;

    fn bind(&mut self, origin: &Path, headers: &StringRecord) -> Result<(), PipelineError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                PipelineError::input_format(origin, format!("missing catalog column '{name}'"))
            })
        };
        self.indices = CatalogIndices {
            store: require(&self.columns.store)?,
            sku: require(&self.columns.sku)?,
            title: find(&self.columns.title),
            image: find(&self.columns.image),
            category: find(&self.columns.category),
            brand: find(&self.columns.brand),
            label: find(&self.columns.label),
        };
        Ok(())
    }

    fn shape(&self, origin: &Path, row: &StringRecord) -> Result<CatalogRecord, PipelineError> {
        let field = |index: Option<usize>| index.and_then(|i| row.get(i)).map(str::to_string);
        let (store_name, sku) = match (row.get(self.indices.store), row.get(self.indices.sku)) {
            (Some(store), Some(sku)) => (store.to_string(), sku.to_string()),
            _ => {
                return Err(PipelineError::input_format(
                    origin,
                    format!("line {}: catalog row is missing store or sku", line_of(row)),
                ));
            }
        };
        Ok(CatalogRecord {
            identity: ProductIdentity::new(store_name, sku),
            title: field(self.indices.title).unwrap_or_default(),
            image: field(self.indices.image),
            category: field(self.indices.category),
            brand: field(self.indices.brand),
            label: field(self.indices.label).unwrap_or_default(),
        })
    }
}

/// Streams a store's scraped feed file.
pub fn read_scraped(
    path: impl AsRef<Path>,
    store: &StoreConfig,
    delimiter: u8,
) -> Result<ShapedRecords<CsvRowSource, ScrapedShaper>, PipelineError> {
    ShapedRecords::new(CsvRowSource::open(path, delimiter)?, ScrapedShaper::new(store))
}

/// Streams a reference catalog file.
pub fn read_catalog(
    path: impl AsRef<Path>,
    columns: &CatalogColumns,
) -> Result<ShapedRecords<CsvRowSource, CatalogShaper>, PipelineError> {
    ShapedRecords::new(
        CsvRowSource::open(path, b',')?,
        CatalogShaper::new(columns.clone()),
    )
}

/// Finds every `<prefix>*.csv` file under `root`, at any depth, in sorted
/// path order. A missing root yields no files.
pub fn discover_scraped_files(root: &Path, prefix: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let root = glob::Pattern::escape(&root.to_string_lossy());
    let prefix = glob::Pattern::escape(prefix);
    let pattern = format!("{root}/**/{prefix}*.csv");
    let entries = glob::glob(&pattern).map_err(|e| {
        PipelineError::Configuration(format!("invalid scraped file pattern {pattern}: {e}"))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::Io(e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

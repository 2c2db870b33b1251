use crate::config::DataConfig;
use crate::error::{ApiError, Result};
use crate::models::BookRecord;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The loaded catalog: records plus their stacked embedding matrix, with
/// matrix row i belonging to records[i]. Read-only after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<BookRecord>,
    matrix: Array2<f32>,
}

impl Catalog {
    pub fn from_records(records: Vec<BookRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ApiError::CatalogUnavailable(
                "catalog source contained no records".to_string(),
            ));
        }

        let dimension = records[0].embedding.len();
        if dimension == 0 {
            return Err(ApiError::CatalogUnavailable(format!(
                "'{}' carries a zero-dimensional embedding",
                records[0].title
            )));
        }

        let mut data = Vec::with_capacity(records.len() * dimension);
        for record in &records {
            if record.embedding.len() != dimension {
                return Err(ApiError::CatalogUnavailable(format!(
                    "embedding for '{}' has {} dimensions, expected {}",
                    record.title,
                    record.embedding.len(),
                    dimension
                )));
            }
            data.extend_from_slice(&record.embedding);
        }

        let matrix = Array2::from_shape_vec((records.len(), dimension), data)?;
        Ok(Self { records, matrix })
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Serialized snapshot persisted next to the slow source. Derived and
/// rebuildable; never the source of truth.
#[derive(Serialize, Deserialize)]
struct CatalogSnapshot {
    records: Vec<BookRecord>,
}

/// Row shape of the slow catalog source, a CSV export with the embedding
/// cell holding a JSON float array.
#[derive(Debug, Deserialize)]
struct CatalogCsvRecord {
    #[serde(alias = "Title")]
    title: String,
    #[serde(alias = "Author", alias = "Authors")]
    author: String,
    #[serde(alias = "Genre", alias = "Categories")]
    genre: String,
    #[serde(default, alias = "Description")]
    description: String,
    #[serde(alias = "Embedding")]
    embedding: String,
}

/// Process-wide owner of the lazily-loaded catalog.
///
/// The first `get` performs the load under a mutex so concurrent cold
/// requests do not duplicate the expensive source parse; later calls clone
/// the shared handle. `invalidate` forces the next `get` to reload.
pub struct CatalogStore {
    source_path: PathBuf,
    snapshot_path: PathBuf,
    cached: Mutex<Option<Arc<Catalog>>>,
}

impl CatalogStore {
    pub fn new(data: &DataConfig) -> Self {
        Self {
            source_path: data.catalog_csv.clone(),
            snapshot_path: data.catalog_snapshot.clone(),
            cached: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<Arc<Catalog>> {
        let mut guard = self.cached.lock().await;
        if let Some(catalog) = guard.as_ref() {
            return Ok(catalog.clone());
        }

        let catalog = Arc::new(self.load()?);
        *guard = Some(catalog.clone());
        Ok(catalog)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    fn load(&self) -> Result<Catalog> {
        if self.snapshot_path.exists() {
            match self.load_snapshot() {
                Ok(catalog) => {
                    info!(
                        entries = catalog.len(),
                        dimension = catalog.dimension(),
                        "loaded catalog from snapshot"
                    );
                    return Ok(catalog);
                }
                Err(e) => {
                    warn!(
                        "catalog snapshot {} is unusable ({}), reloading from source",
                        self.snapshot_path.display(),
                        e
                    );
                }
            }
        }

        let catalog = self.load_source()?;

        let snapshot = CatalogSnapshot {
            records: catalog.records().to_vec(),
        };
        if let Err(e) = write_json_atomic(&self.snapshot_path, &snapshot) {
            warn!(
                "failed to persist catalog snapshot {}: {}",
                self.snapshot_path.display(),
                e
            );
        }

        info!(
            entries = catalog.len(),
            dimension = catalog.dimension(),
            "loaded catalog from source"
        );
        Ok(catalog)
    }

    fn load_snapshot(&self) -> Result<Catalog> {
        let raw = fs::read_to_string(&self.snapshot_path).map_err(|e| {
            ApiError::CatalogUnavailable(format!(
                "failed to read snapshot {}: {}",
                self.snapshot_path.display(),
                e
            ))
        })?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&raw).map_err(|e| {
            ApiError::CatalogUnavailable(format!(
                "malformed snapshot {}: {}",
                self.snapshot_path.display(),
                e
            ))
        })?;

        Catalog::from_records(snapshot.records)
    }

    fn load_source(&self) -> Result<Catalog> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.source_path)
            .map_err(|e| {
                ApiError::CatalogUnavailable(format!(
                    "failed to open catalog source {}: {}",
                    self.source_path.display(),
                    e
                ))
            })?;

        let mut records = Vec::new();
        for row in reader.deserialize::<CatalogCsvRecord>() {
            let row = row.map_err(|e| {
                ApiError::CatalogUnavailable(format!("malformed catalog row: {}", e))
            })?;
            let embedding: Vec<f32> = serde_json::from_str(&row.embedding).map_err(|e| {
                ApiError::CatalogUnavailable(format!(
                    "malformed embedding for '{}': {}",
                    row.title, e
                ))
            })?;
            records.push(BookRecord {
                title: row.title,
                author: row.author,
                genre: row.genre,
                description: row.description,
                embedding,
            });
        }

        Catalog::from_records(records)
    }
}

/// Write a JSON artifact atomically: serialize to a sibling temp file, then
/// rename over the destination. Readers never observe a partial write.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, serde_json::to_vec(value)?)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

use crate::config::DataConfig;
use crate::error::{ApiError, Result};
use crate::ml::pca::Pca;
use crate::models::GenrePoint;
use crate::services::catalog::{write_json_atomic, Catalog};
use ndarray::{Array2, Axis};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Visualization always targets three dimensions.
const PROJECTION_DIMENSIONS: usize = 3;

/// A fitted genre projection: the PCA model plus the genre centroids already
/// projected into its 3D space.
#[derive(Debug, Clone)]
pub struct FittedProjection {
    pca: Pca,
    genre_points: Vec<GenrePoint>,
}

impl FittedProjection {
    pub fn genre_points(&self) -> &[GenrePoint] {
        &self.genre_points
    }

    /// Apply the already-fitted projection to one user embedding.
    pub fn project_user(&self, embedding: &[f32]) -> Result<[f32; 3]> {
        let projected = self.pca.transform(embedding)?;
        projected.try_into().map_err(|_| {
            ApiError::InternalError("projection produced a non-3D point".to_string())
        })
    }
}

/// Owner of the fitted projection and its persisted artifacts.
///
/// The model is fitted once over the per-genre centroid embeddings of the
/// current catalog and reused for every request until an explicit refit;
/// there is no automatic invalidation when the catalog changes.
pub struct ProjectionService {
    model_path: PathBuf,
    coordinates_path: PathBuf,
    state: Mutex<Option<Arc<FittedProjection>>>,
}

impl ProjectionService {
    pub fn new(data: &DataConfig) -> Self {
        Self {
            model_path: data.pca_model.clone(),
            coordinates_path: data.genre_coordinates.clone(),
            state: Mutex::new(None),
        }
    }

    /// Fit from the current catalog snapshot, replacing any previous model
    /// and its persisted artifacts.
    pub async fn fit_genre_projection(&self, catalog: &Catalog) -> Result<Arc<FittedProjection>> {
        let fitted = Arc::new(fit_from_catalog(catalog)?);
        self.persist(&fitted)?;

        info!(
            genres = fitted.genre_points.len(),
            "fitted genre projection"
        );

        *self.state.lock().await = Some(fitted.clone());
        Ok(fitted)
    }

    /// Single-flight fit-or-load: the in-memory model wins, then the
    /// persisted artifacts, then a fresh fit from the catalog.
    pub async fn ensure_fitted(&self, catalog: &Catalog) -> Result<Arc<FittedProjection>> {
        let mut guard = self.state.lock().await;
        if let Some(fitted) = guard.as_ref() {
            return Ok(fitted.clone());
        }

        let fitted = match self.load_persisted() {
            Ok(fitted) => {
                info!(
                    genres = fitted.genre_points.len(),
                    "loaded persisted genre projection"
                );
                Arc::new(fitted)
            }
            Err(e) => {
                if self.model_path.exists() {
                    warn!("persisted projection is unusable ({}), refitting", e);
                }
                let fitted = Arc::new(fit_from_catalog(catalog)?);
                self.persist(&fitted)?;
                info!(
                    genres = fitted.genre_points.len(),
                    "fitted genre projection"
                );
                fitted
            }
        };

        *guard = Some(fitted.clone());
        Ok(fitted)
    }

    /// Project one user embedding with the fitted model. Fails with
    /// `NotFitted` when no model has been fitted or persisted yet.
    pub async fn project_user(&self, embedding: &[f32]) -> Result<[f32; 3]> {
        let mut guard = self.state.lock().await;
        let fitted = match guard.as_ref() {
            Some(fitted) => fitted.clone(),
            None => {
                let fitted = Arc::new(self.load_persisted().map_err(|_| {
                    ApiError::NotFitted(
                        "no genre projection has been fitted yet".to_string(),
                    )
                })?);
                *guard = Some(fitted.clone());
                fitted
            }
        };
        drop(guard);

        fitted.project_user(embedding)
    }

    fn persist(&self, fitted: &FittedProjection) -> Result<()> {
        write_json_atomic(&self.model_path, &fitted.pca)?;
        write_json_atomic(&self.coordinates_path, &fitted.genre_points)?;
        Ok(())
    }

    fn load_persisted(&self) -> Result<FittedProjection> {
        let pca: Pca = read_json(&self.model_path)?;
        let genre_points: Vec<GenrePoint> = read_json(&self.coordinates_path)?;
        Ok(FittedProjection { pca, genre_points })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ApiError::NotFitted(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        ApiError::NotFitted(format!("malformed artifact {}: {}", path.display(), e))
    })
}

/// Group catalog rows by genre, fit PCA over the centroid of each group and
/// project the centroids into the fitted space.
fn fit_from_catalog(catalog: &Catalog) -> Result<FittedProjection> {
    let mut genre_order: Vec<String> = Vec::new();
    let mut rows_by_genre: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, record) in catalog.records().iter().enumerate() {
        rows_by_genre
            .entry(record.genre.clone())
            .or_insert_with(|| {
                genre_order.push(record.genre.clone());
                Vec::new()
            })
            .push(index);
    }

    let mut centroids = Array2::zeros((genre_order.len(), catalog.dimension()));
    for (row, genre) in genre_order.iter().enumerate() {
        let indices = &rows_by_genre[genre];
        let centroid = catalog
            .matrix()
            .select(Axis(0), indices)
            .mean_axis(Axis(0))
            .ok_or_else(|| ApiError::InternalError("empty genre group".to_string()))?;
        centroids.row_mut(row).assign(&centroid);
    }

    let pca = Pca::fit(&centroids, PROJECTION_DIMENSIONS)?;
    let projected = pca.transform_matrix(&centroids)?;

    let genre_points = genre_order
        .into_iter()
        .enumerate()
        .map(|(row, genre)| {
            GenrePoint {
                genre,
                coordinates: [
                    projected[[row, 0]],
                    projected[[row, 1]],
                    projected[[row, 2]],
                ],
            }
        })
        .collect();

    Ok(FittedProjection { pca, genre_points })
}

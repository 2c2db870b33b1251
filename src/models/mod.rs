use crate::services::filter::FilterSpec;
use serde::{Deserialize, Serialize};

// Re-export types from the model submodules
pub use book::{BookRecord, GenrePoint, Recommendation};
pub use profile::{BookPreference, FilterIntent, GenrePreference, RawProfile};

mod book;
mod profile;

/// Request structure for book recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// The reader's preference profile
    pub profile: RawProfile,
    /// Optional keep/remove constraints over catalog metadata
    #[serde(default)]
    pub filters: Option<FilterSpec>,
    /// Number of recommendations to return (default: 10)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Response structure for book recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    /// Ranked recommendations, best match first
    pub recommendations: Vec<Recommendation>,
    /// Per-genre centroid coordinates in the 3D projection space
    pub pca_book_embeddings: Vec<GenrePoint>,
    /// The reader's own position in the same projection space
    pub pca_user_embedding: [f32; 3],
}

/// Report returned by the prewarm endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrewarmResponse {
    /// Number of catalog entries now resident in memory
    pub catalog_entries: usize,
    /// Number of genre centroids in the fitted projection
    pub genres_projected: usize,
}

fn default_top_k() -> usize {
    10
}

use serde::{Deserialize, Serialize};

/// One catalog row. `embedding` is the row's vector in the shared similarity
/// space; every record in a catalog must carry the same dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub embedding: Vec<f32>,
}

/// A ranked result entry, carrying the display metadata callers attach after
/// selection alongside the similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub similarity: f32,
}

/// 3D coordinates of one genre centroid in the fitted projection space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePoint {
    pub genre: String,
    pub coordinates: [f32; 3],
}

pub mod catalog;
pub mod embedding;
pub mod filter;
pub mod projection;
pub mod ranking;
pub mod recommendation;

// Re-export public types
pub use catalog::{Catalog, CatalogStore};
pub use embedding::EmbeddingClient;
pub use filter::FilterSpec;
pub use projection::ProjectionService;
pub use recommendation::RecommendationService;

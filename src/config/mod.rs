use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration, layered from defaults and `APP_*` environment
/// variables (`__` separates nested sections, e.g. `APP_EMBEDDING__SERVICE_URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub embedding: EmbeddingConfig,
    pub data: DataConfig,
}

/// Settings for the external embedding-generation service.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub service_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

/// Locations of the catalog source, derived caches and vocabulary documents.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub catalog_csv: PathBuf,
    pub catalog_snapshot: PathBuf,
    pub vocabulary_dir: PathBuf,
    pub pca_model: PathBuf,
    pub genre_coordinates: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("embedding.service_url", "http://localhost:8501/predict")?
            .set_default("embedding.timeout_secs", 30)?
            .set_default("embedding.connect_timeout_secs", 15)?
            .set_default("embedding.retry_attempts", 3)?
            .set_default("embedding.retry_delay_ms", 500)?
            .set_default("data.catalog_csv", "data/book_catalog.csv")?
            .set_default("data.catalog_snapshot", "data/book_embeddings_snapshot.json")?
            .set_default("data.vocabulary_dir", "data/vocab")?
            .set_default("data.pca_model", "data/pca_model.json")?
            .set_default("data.genre_coordinates", "data/genre_coordinates.json")?
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_env_is_unset() {
        let config = Config::load().expect("defaults should produce a valid config");

        assert_eq!(config.port, 8080);
        assert_eq!(config.embedding.retry_attempts, 3);
        assert_eq!(config.data.vocabulary_dir, PathBuf::from("data/vocab"));
    }
}

use crate::error::{ApiError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Code reserved for out-of-vocabulary values.
pub const OOV_CODE: u32 = 0;

/// On-disk shape of a vocabulary document, as exported by the training
/// pipeline: an ordered value list plus the token standing in for code 0.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyFile {
    pub vocabulary: Vec<String>,
    pub oov_token: String,
}

/// A fixed string-to-code table for one categorical field. Codes run 1..=N
/// in source-list order; anything else encodes to [`OOV_CODE`].
#[derive(Debug, Clone)]
pub struct VocabularyTable {
    codes: HashMap<String, u32>,
}

impl VocabularyTable {
    pub fn from_source(values: &[String]) -> Result<Self> {
        if values.is_empty() {
            return Err(ApiError::ConfigError(
                "vocabulary source list is empty".to_string(),
            ));
        }

        let codes = values
            .iter()
            .enumerate()
            .map(|(index, value)| (value.clone(), (index + 1) as u32))
            .collect();

        Ok(Self { codes })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!(
                "failed to read vocabulary {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: VocabularyFile = serde_json::from_str(&raw).map_err(|e| {
            ApiError::ConfigError(format!(
                "malformed vocabulary {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_source(&file.vocabulary)
    }

    /// Unknown values are a defined outcome, not an error.
    pub fn encode(&self, value: &str) -> u32 {
        self.codes.get(value).copied().unwrap_or(OOV_CODE)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// The four per-field tables the profile encoder needs, loaded once at
/// startup from the documents the training pipeline exported.
#[derive(Debug, Clone)]
pub struct VocabularySet {
    pub title: VocabularyTable,
    pub author: VocabularyTable,
    pub genre: VocabularyTable,
    pub user_id: VocabularyTable,
}

impl VocabularySet {
    pub fn load(dir: &Path) -> Result<Self> {
        let set = Self {
            title: VocabularyTable::from_file(&dir.join("book_title_vocab.json"))?,
            author: VocabularyTable::from_file(&dir.join("book_author_vocab.json"))?,
            genre: VocabularyTable::from_file(&dir.join("book_genre_vocab.json"))?,
            user_id: VocabularyTable::from_file(&dir.join("user_id_vocab.json"))?,
        };

        info!(
            titles = set.title.len(),
            authors = set.author.len(),
            genres = set.genre.len(),
            users = set.user_id.len(),
            "loaded vocabulary tables"
        );

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[&str]) -> VocabularyTable {
        let source: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        VocabularyTable::from_source(&source).expect("non-empty source")
    }

    #[test]
    fn codes_follow_source_order_starting_at_one() {
        let vocab = table(&["A", "B", "C"]);

        assert_eq!(vocab.encode("A"), 1);
        assert_eq!(vocab.encode("B"), 2);
        assert_eq!(vocab.encode("C"), 3);
    }

    #[test]
    fn unknown_values_encode_to_zero() {
        let vocab = table(&["A", "B", "C"]);

        assert_eq!(vocab.encode("Z"), OOV_CODE);
        assert_eq!(vocab.encode(""), OOV_CODE);
    }

    #[test]
    fn known_codes_stay_in_range() {
        let vocab = table(&["Fiction", "Mystery", "Fantasy", "History"]);

        for value in ["Fiction", "Mystery", "Fantasy", "History"] {
            let code = vocab.encode(value);
            assert!(code >= 1 && code <= vocab.len() as u32);
        }
    }

    #[test]
    fn empty_source_is_a_config_error() {
        let err = VocabularyTable::from_source(&[]).expect_err("empty source must fail");

        assert!(matches!(err, ApiError::ConfigError(_)));
    }

    #[test]
    fn parses_the_exported_document_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book_genre_vocab.json");
        std::fs::write(&path, r#"{"vocabulary": ["A", "B", "C"], "oov_token": "?"}"#)
            .expect("write vocab");

        let vocab = VocabularyTable::from_file(&path).expect("valid document");
        assert_eq!(vocab.encode("B"), 2);
        assert_eq!(vocab.encode("Z"), 0);
    }
}

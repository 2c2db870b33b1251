use crate::error::{ApiError, Result};
use crate::models::{BookRecord, Recommendation};
use ndarray::{Array2, ArrayView1, Axis};

/// Rank catalog rows by cosine similarity against one user embedding.
///
/// Scores are sorted descending; ties keep catalog row order (the sort is
/// stable and no secondary key is defined). Asking for more results than
/// the catalog holds is not an error, the full ranking is returned.
pub fn rank(
    user_embedding: &[f32],
    records: &[BookRecord],
    matrix: &Array2<f32>,
    top_k: usize,
) -> Result<Vec<Recommendation>> {
    if top_k == 0 {
        return Err(ApiError::InvalidInput(
            "top_k must be a positive integer".to_string(),
        ));
    }
    if records.len() != matrix.nrows() {
        return Err(ApiError::InternalError(format!(
            "catalog records ({}) and embedding rows ({}) are misaligned",
            records.len(),
            matrix.nrows()
        )));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }
    if user_embedding.len() != matrix.ncols() {
        return Err(ApiError::InvalidInput(format!(
            "user embedding has {} dimensions, catalog has {}",
            user_embedding.len(),
            matrix.ncols()
        )));
    }

    let user_norm = user_embedding.iter().map(|v| v * v).sum::<f32>().sqrt();

    let mut scored: Vec<(usize, f32)> = matrix
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(index, row)| (index, cosine(user_embedding, user_norm, row)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(scored
        .into_iter()
        .take(top_k)
        .map(|(index, similarity)| {
            let record = &records[index];
            Recommendation {
                title: record.title.clone(),
                author: record.author.clone(),
                genre: record.genre.clone(),
                similarity,
            }
        })
        .collect())
}

/// Cosine of the angle between the user vector and one catalog row. A zero
/// vector on either side scores 0 rather than propagating NaN.
fn cosine(user: &[f32], user_norm: f32, row: ArrayView1<f32>) -> f32 {
    let mut dot = 0.0;
    let mut row_norm_squared = 0.0;
    for (a, b) in user.iter().zip(row.iter()) {
        dot += a * b;
        row_norm_squared += b * b;
    }

    let denominator = user_norm * row_norm_squared.sqrt();
    if denominator > 0.0 {
        (dot / denominator).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(title: &str) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            author: "Author".to_string(),
            genre: "Fiction".to_string(),
            description: String::new(),
            embedding: vec![],
        }
    }

    fn catalog() -> (Vec<BookRecord>, Array2<f32>) {
        let records = vec![record("B1"), record("B2"), record("B3"), record("B4")];
        let matrix = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [-1.0, 0.0],
            [1.0, 1.0],
        ];
        (records, matrix)
    }

    #[test]
    fn scores_are_sorted_descending() {
        let (records, matrix) = catalog();

        let ranked = rank(&[1.0, 0.0], &records, &matrix, 4).expect("rank succeeds");

        assert_eq!(ranked[0].title, "B1");
        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn scores_stay_within_cosine_bounds() {
        let (records, matrix) = catalog();

        let ranked = rank(&[0.3, -0.7], &records, &matrix, 4).expect("rank succeeds");

        for entry in ranked {
            assert!(entry.similarity >= -1.0 && entry.similarity <= 1.0);
        }
    }

    #[test]
    fn result_length_is_the_smaller_of_top_k_and_catalog_size() {
        let (records, matrix) = catalog();

        let two = rank(&[1.0, 0.0], &records, &matrix, 2).expect("rank succeeds");
        let oversized = rank(&[1.0, 0.0], &records, &matrix, 100).expect("rank succeeds");

        assert_eq!(two.len(), 2);
        assert_eq!(oversized.len(), records.len());
    }

    #[test]
    fn a_zero_user_vector_scores_zero_everywhere() {
        let (records, matrix) = catalog();

        let ranked = rank(&[0.0, 0.0], &records, &matrix, 4).expect("rank succeeds");

        for entry in &ranked {
            assert_eq!(entry.similarity, 0.0);
        }
        // All-equal scores keep catalog row order
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["B1", "B2", "B3", "B4"]);
    }

    #[test]
    fn a_zero_catalog_row_scores_zero() {
        let records = vec![record("B1"), record("B2")];
        let matrix = array![[0.0, 0.0], [1.0, 0.0]];

        let ranked = rank(&[1.0, 0.0], &records, &matrix, 2).expect("rank succeeds");

        assert_eq!(ranked[0].title, "B2");
        assert_eq!(ranked[1].similarity, 0.0);
    }

    #[test]
    fn ties_keep_catalog_row_order() {
        let records = vec![record("B1"), record("B2"), record("B3")];
        let matrix = array![[2.0, 0.0], [1.0, 0.0], [3.0, 0.0]];

        let ranked = rank(&[1.0, 0.0], &records, &matrix, 3).expect("rank succeeds");

        // Cosine ignores magnitude, so all three tie at 1.0
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["B1", "B2", "B3"]);
    }

    #[test]
    fn an_empty_catalog_yields_an_empty_ranking() {
        let ranked = rank(&[1.0, 0.0], &[], &Array2::zeros((0, 2)), 5).expect("rank succeeds");

        assert!(ranked.is_empty());
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let (records, matrix) = catalog();

        let err = rank(&[1.0, 0.0], &records, &matrix, 0).expect_err("must fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn dimension_mismatch_is_invalid() {
        let (records, matrix) = catalog();

        let err = rank(&[1.0, 0.0, 0.0], &records, &matrix, 2).expect_err("must fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn results_carry_display_metadata() {
        let (records, matrix) = catalog();

        let ranked = rank(&[1.0, 0.0], &records, &matrix, 1).expect("rank succeeds");

        assert_eq!(ranked[0].author, "Author");
        assert_eq!(ranked[0].genre, "Fiction");
    }
}

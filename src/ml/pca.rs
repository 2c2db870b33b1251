use crate::error::{ApiError, Result};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// A fitted linear projection from the embedding space down to
/// `n_components` dimensions, via eigendecomposition of the sample
/// covariance matrix. Serialized as a derived, rebuildable artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pca {
    mean: Array1<f32>,
    /// One principal component per row, sorted by descending eigenvalue.
    components: Array2<f32>,
}

impl Pca {
    pub fn fit(x: &Array2<f32>, n_components: usize) -> Result<Self> {
        let (n_samples, n_features) = x.dim();

        if n_samples == 0 {
            return Err(ApiError::InvalidInput(
                "cannot fit a projection on zero samples".to_string(),
            ));
        }
        if n_components > n_features {
            return Err(ApiError::InvalidInput(format!(
                "cannot keep {} components of {}-dimensional data",
                n_components, n_features
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ApiError::InternalError("mean of empty axis".to_string()))?;
        let centered = x - &mean;

        // Sample covariance: centered^T centered / (n - 1)
        let denominator = n_samples.saturating_sub(1).max(1) as f32;
        let covariance = centered.t().dot(&centered) / denominator;

        let symmetric = DMatrix::from_row_slice(
            n_features,
            n_features,
            &covariance.into_raw_vec(),
        );
        let eigen = SymmetricEigen::new(symmetric);

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut components = Array2::zeros((n_components, n_features));
        for (row, &index) in order.iter().take(n_components).enumerate() {
            for column in 0..n_features {
                components[[row, column]] = eigen.eigenvectors[(column, index)];
            }
        }

        Ok(Self { mean, components })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.components.ncols()
    }

    /// Project one vector: `(x - mean) · components^T`.
    pub fn transform(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.n_features() {
            return Err(ApiError::InvalidInput(format!(
                "vector has {} dimensions, projection expects {}",
                vector.len(),
                self.n_features()
            )));
        }

        let centered: Array1<f32> = vector
            .iter()
            .zip(self.mean.iter())
            .map(|(value, mean)| value - mean)
            .collect();

        Ok(self.components.dot(&centered).to_vec())
    }

    /// Project every row of a matrix at once.
    pub fn transform_matrix(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.n_features() {
            return Err(ApiError::InvalidInput(format!(
                "matrix has {} columns, projection expects {}",
                x.ncols(),
                self.n_features()
            )));
        }

        let centered = x - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array2<f32> {
        array![
            [1.0, 0.1, 0.0, 2.0],
            [2.0, 0.2, 0.0, 1.5],
            [3.0, 0.3, 0.0, 1.0],
            [4.0, 0.4, 0.0, 0.5],
            [5.0, 0.5, 0.0, 0.0],
        ]
    }

    #[test]
    fn keeps_the_requested_number_of_components() {
        let pca = Pca::fit(&sample(), 3).expect("fit succeeds");

        assert_eq!(pca.n_components(), 3);
        assert_eq!(pca.n_features(), 4);

        let projected = pca.transform(&[1.0, 0.1, 0.0, 2.0]).expect("transform");
        assert_eq!(projected.len(), 3);
    }

    #[test]
    fn transform_is_deterministic() {
        let pca = Pca::fit(&sample(), 3).expect("fit succeeds");
        let vector = [2.5, 0.25, 0.0, 1.25];

        let first = pca.transform(&vector).expect("transform");
        let second = pca.transform(&vector).expect("transform");

        assert_eq!(first, second);
    }

    #[test]
    fn refitting_the_same_data_yields_the_same_projection() {
        let first = Pca::fit(&sample(), 2).expect("fit succeeds");
        let second = Pca::fit(&sample(), 2).expect("fit succeeds");
        let vector = [4.0, 0.4, 0.0, 0.5];

        assert_eq!(
            first.transform(&vector).expect("transform"),
            second.transform(&vector).expect("transform")
        );
    }

    #[test]
    fn the_sample_mean_projects_to_the_origin() {
        let data = sample();
        let pca = Pca::fit(&data, 2).expect("fit succeeds");

        let mean: Vec<f32> = data
            .mean_axis(Axis(0))
            .expect("non-empty sample")
            .to_vec();
        let projected = pca.transform(&mean).expect("transform");

        for coordinate in projected {
            assert!(coordinate.abs() < 1e-4);
        }
    }

    #[test]
    fn transform_matrix_matches_per_row_transform() {
        let data = sample();
        let pca = Pca::fit(&data, 3).expect("fit succeeds");

        let all = pca.transform_matrix(&data).expect("transform matrix");
        for (row, record) in data.outer_iter().enumerate() {
            let single = pca
                .transform(record.as_slice().expect("contiguous row"))
                .expect("transform");
            for (column, value) in single.iter().enumerate() {
                assert!((all[[row, column]] - value).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn rejects_more_components_than_features() {
        let err = Pca::fit(&sample(), 5).expect_err("must fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn rejects_vectors_of_the_wrong_dimension() {
        let pca = Pca::fit(&sample(), 2).expect("fit succeeds");

        let err = pca.transform(&[1.0, 2.0]).expect_err("must fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn survives_a_serde_round_trip_unchanged() {
        let pca = Pca::fit(&sample(), 3).expect("fit succeeds");
        let vector = [3.0, 0.3, 0.0, 1.0];

        let serialized = serde_json::to_string(&pca).expect("serialize");
        let restored: Pca = serde_json::from_str(&serialized).expect("deserialize");

        assert_eq!(
            pca.transform(&vector).expect("transform"),
            restored.transform(&vector).expect("transform")
        );
    }
}

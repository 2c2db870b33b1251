use crate::error::{ApiError, Result};
use crate::ml::{encoder, vocabulary::VocabularySet};
use crate::models::{
    FilterIntent, PrewarmResponse, RawProfile, RecommendationRequest, RecommendationResponse,
};
use crate::services::{
    catalog::CatalogStore,
    embedding::EmbeddingClient,
    filter::{self, FilterSpec},
    projection::ProjectionService,
    ranking,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates the full pipeline: profile normalization, the external
/// embedding call, metadata filtering, similarity ranking and the 3D
/// projection outputs.
pub struct RecommendationService {
    vocabularies: Arc<VocabularySet>,
    embedding_client: EmbeddingClient,
    catalog: Arc<CatalogStore>,
    projection: Arc<ProjectionService>,
}

impl RecommendationService {
    pub fn new(
        vocabularies: Arc<VocabularySet>,
        embedding_client: EmbeddingClient,
        catalog: Arc<CatalogStore>,
        projection: Arc<ProjectionService>,
    ) -> Self {
        Self {
            vocabularies,
            embedding_client,
            catalog,
            projection,
        }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        let features = encoder::encode_profile(&request.profile, &self.vocabularies)?;
        let user_embedding = self.embedding_client.embed(&features).await?;

        let catalog = self.catalog.get().await?;
        if user_embedding.len() != catalog.dimension() {
            return Err(ApiError::ExternalServiceError(format!(
                "embedding service returned {} dimensions, catalog expects {}",
                user_embedding.len(),
                catalog.dimension()
            )));
        }

        let spec = effective_filter(request.filters.clone(), &request.profile);
        let (records, matrix) = filter::apply(catalog.records(), catalog.matrix(), &spec);
        debug!(
            kept = records.len(),
            total = catalog.len(),
            "applied metadata filters"
        );

        let recommendations = ranking::rank(&user_embedding, &records, &matrix, request.top_k)?;

        let fitted = self.projection.ensure_fitted(&catalog).await?;
        let pca_user_embedding = fitted.project_user(&user_embedding)?;

        info!(
            user = %request.profile.user_id,
            results = recommendations.len(),
            "assembled recommendations"
        );

        Ok(RecommendationResponse {
            recommendations,
            pca_book_embeddings: fitted.genre_points().to_vec(),
            pca_user_embedding,
        })
    }

    /// Warm the expensive lazy state ahead of the first user request: the
    /// catalog load and the genre projection fit.
    pub async fn prewarm(&self) -> Result<PrewarmResponse> {
        let catalog = self.catalog.get().await?;
        let fitted = self.projection.ensure_fitted(&catalog).await?;

        info!(
            entries = catalog.len(),
            genres = fitted.genre_points().len(),
            "prewarm complete"
        );

        Ok(PrewarmResponse {
            catalog_entries: catalog.len(),
            genres_projected: fitted.genre_points().len(),
        })
    }

    /// Refit the genre projection from the current catalog snapshot. The
    /// projection never refits on its own when the catalog changes.
    pub async fn refit_projection(&self) -> Result<usize> {
        let catalog = self.catalog.get().await?;
        let fitted = self.projection.fit_genre_projection(&catalog).await?;
        Ok(fitted.genre_points().len())
    }
}

/// Fold the profile's hard genre intents into the caller's filter spec. A
/// genre flagged for removal lands in the remove set, where it wins over any
/// keep listing at evaluation time.
fn effective_filter(base: Option<FilterSpec>, profile: &RawProfile) -> FilterSpec {
    let mut spec = base.unwrap_or_default();

    for preference in profile
        .liked_genres
        .iter()
        .chain(profile.disliked_genres.iter())
    {
        match preference.filter {
            Some(FilterIntent::Keep) => {
                spec.keep.genre.insert(preference.name.clone());
            }
            Some(FilterIntent::Remove) => {
                spec.remove.genre.insert(preference.name.clone());
            }
            None => {}
        }
    }

    spec
}

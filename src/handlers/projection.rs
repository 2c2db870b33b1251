use crate::{error::ApiError, services::RecommendationService};
use actix_web::{post, web, HttpResponse};

/// Refit the genre projection against the current catalog. Required after a
/// catalog change; the projection never refits automatically.
#[post("/projection/refit")]
pub async fn refit_projection(
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let genres_projected = recommendation_service.refit_projection().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "genres_projected": genres_projected
    })))
}

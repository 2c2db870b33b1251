use crate::{error::ApiError, services::RecommendationService};
use actix_web::{post, web, HttpResponse};

/// Warm the lazy catalog and projection state ahead of the first user
/// request, mitigating cold starts.
#[post("/prewarm")]
pub async fn prewarm(
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let report = recommendation_service.prewarm().await?;

    Ok(HttpResponse::Ok().json(report))
}

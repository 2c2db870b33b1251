use crate::{
    error::ApiError, models::RecommendationRequest, services::RecommendationService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommendations").route(web::post().to(get_recommendations)));
}

/// Run the pipeline for one profile: encode, fetch the user embedding,
/// filter, rank and project. Returns the ranked titles plus the 3D
/// coordinates for the visualization.
pub async fn get_recommendations(
    request: Json<RecommendationRequest>,
    recommendation_service: web::Data<RecommendationService>,
) -> Result<HttpResponse, ApiError> {
    let response = recommendation_service.recommend(&request).await?;

    Ok(HttpResponse::Ok().json(response))
}

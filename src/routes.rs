use actix_web::{web, Scope};

use crate::handlers::{
    health_check, prewarm_endpoint, recommendations_config, refit_projection,
};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .service(prewarm_endpoint)
        .service(refit_projection)
        .configure(recommendations_config)
}

use crate::{
    config::Config,
    error::Result,
    ml::vocabulary::VocabularySet,
    routes::api_routes,
    services::{CatalogStore, EmbeddingClient, ProjectionService, RecommendationService},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        // Always bind to 0.0.0.0 for Docker/Render compatibility
        let bind_address = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}:{}", self.host, self.port);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        // Vocabulary tables are static inputs; load them up front so a bad
        // deployment fails at startup, not on the first request
        let vocabularies = Arc::new(
            VocabularySet::load(&self.config.data.vocabulary_dir)
                .context("Failed to load vocabulary tables")?,
        );

        let embedding_client = EmbeddingClient::new(&self.config.embedding)
            .context("Failed to initialize embedding client")?;

        // The catalog and projection stay lazy; the prewarm endpoint can
        // front-load them before the first user request
        let catalog = Arc::new(CatalogStore::new(&self.config.data));
        let projection = Arc::new(ProjectionService::new(&self.config.data));

        let recommendation_service = web::Data::new(RecommendationService::new(
            vocabularies,
            embedding_client,
            catalog,
            projection,
        ));

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(recommendation_service.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;

use geoalgebra_services::config::Settings;
use geoalgebra_services::handlers::AppState;
use geoalgebra_services::openapi::ApiDoc;
use geoalgebra_services::store::{self, InMemoryMapStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = Settings::new().unwrap_or_else(|error| {
        tracing::warn!(%error, "falling back to default settings");
        Settings::default()
    });
    let bind_address = settings.web.bind_address.clone();

    let store: Arc<dyn store::MapStore> = build_store(&settings);
    let state = web::Data::new(AppState::new(store, settings));

    tracing::info!(%bind_address, "starting geoalgebra-services");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024))
            .configure(geoalgebra_services::configure)
            .route(
                "/api-doc/openapi.json",
                web::get().to(|| async { HttpResponse::Ok().json(ApiDoc::openapi()) }),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}

#[cfg(not(feature = "redis-store"))]
fn build_store(_settings: &Settings) -> Arc<dyn store::MapStore> {
    Arc::new(InMemoryMapStore::new())
}

#[cfg(feature = "redis-store")]
fn build_store(settings: &Settings) -> Arc<dyn store::MapStore> {
    match &settings.redis {
        Some(redis) => match store::RedisMapStore::connect(&redis.url) {
            Ok(store) => Arc::new(store),
            Err(error) => {
                tracing::warn!(%error, "failed to connect to redis, falling back to in-memory store");
                Arc::new(InMemoryMapStore::new())
            }
        },
        None => Arc::new(InMemoryMapStore::new()),
    }
}

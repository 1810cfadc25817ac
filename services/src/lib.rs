use actix_web::web;

pub mod api_model;
pub mod config;
pub mod error;
pub mod handlers;
pub mod memo;
pub mod openapi;
pub mod store;

/// Registers every route on an `actix_web::App` (or a `test::init_service`
/// app in integration tests), so the real wiring isn't duplicated between
/// the server binary and its tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::index::index)
        .service(handlers::map::create_map)
        .service(handlers::info::info)
        .service(handlers::tiles::tile)
        .service(handlers::export::export)
        .service(handlers::cache_info::cache_info);
}

use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use geoalgebra_operators::{render_tile, TileOutcome};

use super::AppState;
use crate::error::Result;

#[derive(Deserialize)]
pub struct TilePath {
    id: Uuid,
    z: u8,
    x: u32,
    y: u32,
}

/// `GET /tiles/{id}/{z}/{x}/{y}.png` (spec §4.4, source `app.py`'s
/// tile handler). Tiles outside the image's bounds or below its
/// minimum zoom come back as `204 No Content` rather than an error, so
/// a slippy-map client's speculative out-of-bounds requests don't
/// spam error logs.
#[utoipa::path(
    get,
    path = "/tiles/{id}/{z}/{x}/{y}.png",
    params(
        ("id" = Uuid, Path, description = "map id returned by POST /map"),
        ("z" = u8, Path, description = "zoom level"),
        ("x" = u32, Path, description = "tile column"),
        ("y" = u32, Path, description = "tile row"),
    ),
    responses(
        (status = 200, description = "rendered PNG tile", content_type = "image/png"),
        (status = 204, description = "tile outside the image's bounds or below its minimum zoom"),
        (status = 404, description = "unknown map id", body = crate::handlers::ErrorResponse),
    )
)]
#[get("/tiles/{id}/{z}/{x}/{y}.png")]
pub async fn tile(state: web::Data<AppState>, path: web::Path<TilePath>) -> Result<HttpResponse> {
    let path = path.into_inner();
    let entry = state.store.get(path.id).await?;
    let image = state.memo.eval(&entry.graph, &state.resolver)?;
    let vis = entry
        .visualization
        .unwrap_or_default()
        .into_domain()?;

    let outcome = render_tile(
        &image,
        path.z,
        path.x,
        path.y,
        state.settings.web.tile_size,
        &vis,
        &state.transformer,
    )?;

    let tile_cache_control = CacheControl(vec![
        CacheDirective::Public,
        CacheDirective::MaxAge(31_536_000),
        CacheDirective::Extension("immutable".to_string(), None),
    ]);

    match outcome {
        TileOutcome::Rendered(png) => Ok(HttpResponse::Ok()
            .content_type("image/png")
            .insert_header(tile_cache_control)
            .body(png)),
        TileOutcome::OutOfBounds => Ok(HttpResponse::NoContent()
            .insert_header(tile_cache_control)
            .finish()),
    }
}

use actix_web::{post, web, HttpResponse};

use geoalgebra_datatypes::TileMatrixSet;

use crate::api_model::ImageInfoResponse;
use crate::error::{self, Result};
use crate::handlers::Detail;

use super::AppState;

/// `POST /info`: evaluates a call graph without registering it and
/// reports its dtype, bounds, band names and zoom range (source
/// `app.py`'s `/info` endpoint, which takes the graph directly rather
/// than a map id since callers often just want to inspect a graph
/// before calling `/map`).
#[utoipa::path(
    post,
    path = "/info",
    responses(
        (status = 200, description = "image metadata", body = ImageInfoResponse),
        (status = 400, description = "malformed call graph", body = crate::handlers::ErrorResponse),
    )
)]
#[post("/info")]
pub async fn info(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let raw = std::str::from_utf8(&body).map_err(|_| error::Error::MalformedRequest {
        reason: "request body is not valid UTF-8".to_string(),
    })?;
    let image = state.memo.eval(raw, &state.resolver)?;
    let metadata = image.metadata(&state.transformer)?;

    let tms = TileMatrixSet::default();
    let map_bounds = metadata
        .bounds
        .map(|(bounds, crs)| {
            let reprojected = bounds.reproject(crs, tms.crs(), &state.transformer, 21)?;
            let (min_x, min_y, max_x, max_y) = reprojected.as_tuple();
            Ok::<_, geoalgebra_datatypes::Error>([min_x, min_y, max_x, max_y])
        })
        .transpose()?;

    Ok(HttpResponse::Ok().json(Detail::new(ImageInfoResponse {
        crs: metadata.bounds.map(|(_, crs)| crs.to_string()),
        bounds: metadata.bounds.map(|(b, _)| {
            let (min_x, min_y, max_x, max_y) = b.as_tuple();
            [min_x, min_y, max_x, max_y]
        }),
        map_bounds,
        band_names: metadata.band_names,
        dtype: format!("{:?}", metadata.dtype),
        min_zoom: metadata.min_zoom,
        max_zoom: metadata.max_zoom,
    })))
}

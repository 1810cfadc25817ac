use std::path::PathBuf;

use actix_web::{post, web, HttpResponse};

use geoalgebra_datatypes::{BBox, Crs};
use geoalgebra_operators::{export_to_cog, ExportOptions};

use super::AppState;
use crate::api_model::{ExportRequest, ExportResponse};
use crate::error::{self, Result};

/// `POST /export`: evaluates a call graph and writes it to a
/// Cloud-Optimized GeoTIFF at `path` (spec §4.6). Runs synchronously
/// and returns once the file is fully written, matching the source's
/// own blocking `Image.export()` call.
#[utoipa::path(
    post,
    path = "/export",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "export written", body = ExportResponse),
        (status = 400, description = "malformed request or boundless image with no bounds given", body = crate::handlers::ErrorResponse),
    )
)]
#[post("/export")]
pub async fn export(state: web::Data<AppState>, body: web::Json<ExportRequest>) -> Result<HttpResponse> {
    let body = body.into_inner();
    let image = state.memo.eval(body.image.get(), &state.resolver)?;

    let crs: Crs = body
        .crs
        .parse()
        .map_err(|_| error::Error::MalformedRequest {
            reason: format!("invalid crs: {}", body.crs),
        })?;
    let in_crs: Crs = body
        .in_crs
        .parse()
        .map_err(|_| error::Error::MalformedRequest {
            reason: format!("invalid in_crs: {}", body.in_crs),
        })?;
    let bounds = body
        .bounds
        .map(|[min_x, min_y, max_x, max_y]| BBox::new(min_x, min_y, max_x, max_y))
        .transpose()?;

    let opts = ExportOptions {
        bounds,
        in_crs: Some(in_crs),
        crs,
        scale: body.scale,
        window_edge: state.settings.export.export_window_edge,
    };

    let path = PathBuf::from(body.path);
    export_to_cog(&image, &path, &opts, &state.transformer)?;

    Ok(HttpResponse::Ok().json(ExportResponse::ok()))
}

use actix_web::{post, web, HttpResponse};
use uuid::Uuid;

use crate::api_model::{CreateMapRequest, CreateMapResponse};
use crate::handlers::Detail;
use crate::store::MapEntry;

use super::AppState;
use crate::error::Result;

/// `POST /map`: registers a call graph and its default visualization,
/// returning the id clients use for `/tiles/{id}/{z}/{x}/{y}.png` and
/// `/info` (source `app.py`'s `/map` endpoint). Evaluating the graph
/// eagerly here, rather than lazily on first tile request, surfaces a
/// malformed graph immediately instead of on a client's first tile
/// fetch.
#[utoipa::path(
    post,
    path = "/map",
    request_body = CreateMapRequest,
    responses(
        (status = 200, description = "map registered", body = CreateMapResponse),
        (status = 400, description = "malformed call graph", body = crate::handlers::ErrorResponse),
    )
)]
#[post("/map")]
pub async fn create_map(
    state: web::Data<AppState>,
    body: web::Json<CreateMapRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    state.memo.eval(body.image_graph.get(), &state.resolver)?;
    if let Some(vis) = body.vis_params.clone() {
        vis.into_domain()?;
    }

    let id = Uuid::new_v4();
    state
        .store
        .insert(
            id,
            MapEntry {
                graph: body.image_graph.get().to_string(),
                visualization: body.vis_params,
            },
        )
        .await?;

    let tiles_url = format!(
        "{}/tiles/{}/{{z}}/{{x}}/{{y}}.png",
        state.settings.public_address().trim_end_matches('/'),
        id
    );

    Ok(HttpResponse::Ok().json(Detail::new(CreateMapResponse {
        id: id.to_string(),
        tiles_url,
    })))
}

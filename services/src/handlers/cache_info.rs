use actix_web::{get, web, HttpResponse};

use crate::api_model::CacheInfoResponse;

use super::AppState;

/// `GET /cache-info`: eval-memo hit/miss counters (spec §4.8).
#[utoipa::path(
    get,
    path = "/cache-info",
    responses((status = 200, description = "eval memo counters", body = CacheInfoResponse))
)]
#[get("/cache-info")]
pub async fn cache_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(CacheInfoResponse {
        hits: state.memo.hits(),
        misses: state.memo.misses(),
        currsize: state.memo.entry_count(),
        maxsize: state.memo.capacity(),
    })
}

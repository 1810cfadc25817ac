use actix_web::{get, HttpResponse, Responder};

/// `GET /`, a liveness probe returning the service name and version
/// (source `app.py`'s root endpoint).
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

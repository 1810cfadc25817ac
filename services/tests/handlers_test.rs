use std::sync::Arc;

use actix_web::http::header;
use actix_web::test::{call_service, init_service, read_body, read_body_json, TestRequest};
use actix_web::{web, App};
use serde_json::{json, Value};

use geoalgebra_services::config::Settings;
use geoalgebra_services::handlers::AppState;
use geoalgebra_services::store::{InMemoryMapStore, MapStore};

fn test_state() -> web::Data<AppState> {
    let store: Arc<dyn MapStore> = Arc::new(InMemoryMapStore::new());
    web::Data::new(AppState::new(store, Settings::default()))
}

macro_rules! test_app {
    () => {
        init_service(
            App::new()
                .app_data(test_state())
                .app_data(web::JsonConfig::default())
                .configure(geoalgebra_services::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn registering_a_map_returns_an_id_and_a_tiles_url_containing_it() {
    let app = test_app!();

    let req = TestRequest::post()
        .uri("/map")
        .set_json(json!({"image_graph": {"name": "constant", "args": [7.0]}}))
        .to_request();
    let res = call_service(&app, req).await;
    assert!(res.status().is_success());

    let body: Value = read_body_json(res).await;
    let id = body["detail"]["id"].as_str().unwrap();
    assert!(body["detail"]["tiles_url"].as_str().unwrap().contains(id));
}

#[actix_web::test]
async fn tile_round_trip_renders_a_constant_image_with_the_tile_cache_headers() {
    let app = test_app!();

    let create = TestRequest::post()
        .uri("/map")
        .set_json(json!({"image_graph": {"name": "constant", "args": [255.0]}}))
        .to_request();
    let created: Value = read_body_json(call_service(&app, create).await).await;
    let id = created["detail"]["id"].as_str().unwrap();

    let req = TestRequest::get().uri(&format!("/tiles/{id}/3/2/2.png")).to_request();
    let res = call_service(&app, req).await;

    assert!(res.status().is_success());
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    let cache_control = res
        .headers()
        .get(header::CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cache_control.contains("immutable"));

    let png = read_body(res).await;
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[actix_web::test]
async fn unknown_map_id_on_a_tile_request_is_404_with_the_error_envelope() {
    let app = test_app!();

    let req = TestRequest::get()
        .uri("/tiles/00000000-0000-0000-0000-000000000000/0/0/0.png")
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), 404);

    let body: Value = read_body_json(res).await;
    assert_eq!(body["code"], 404);
    assert!(body["detail"].as_str().is_some());
}

#[actix_web::test]
async fn malformed_call_graph_on_map_creation_is_a_400() {
    let app = test_app!();

    let req = TestRequest::post()
        .uri("/map")
        .set_json(json!({"image_graph": {"args": [1.0]}}))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn export_of_a_boundless_image_without_explicit_bounds_is_a_400() {
    let app = test_app!();
    let dest = std::env::temp_dir().join("geoalgebra-services-handlers-test-export.tif");

    let req = TestRequest::post()
        .uri("/export")
        .set_json(json!({
            "image": {"name": "constant", "args": [1.0]},
            "path": dest.to_str().unwrap(),
        }))
        .to_request();
    let res = call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn cache_info_starts_at_zero() {
    let app = test_app!();

    let req = TestRequest::get().uri("/cache-info").to_request();
    let res = call_service(&app, req).await;
    assert!(res.status().is_success());

    let body: Value = read_body_json(res).await;
    assert_eq!(body["hits"], 0);
    assert_eq!(body["misses"], 0);
}

#[actix_web::test]
async fn info_reports_band_names_and_dtype_for_a_constant_image() {
    let app = test_app!();

    let req = TestRequest::post()
        .uri("/info")
        .set_json(json!({"name": "constant", "args": [1.0]}))
        .to_request();
    let res = call_service(&app, req).await;
    assert!(res.status().is_success());

    let body: Value = read_body_json(res).await;
    assert_eq!(body["detail"]["band_names"], json!(["CONSTANT"]));
    assert!(body["detail"]["bounds"].is_null());
}

/// Regression test for the eval memo keying bug (spec §4.8): two
/// requests describing the same graph but with different whitespace are
/// byte-distinct and must each miss the cache, not collide into one
/// entry via a re-serialized/canonicalized key.
#[actix_web::test]
async fn differently_formatted_equivalent_graphs_both_miss_the_eval_cache() {
    let app = test_app!();

    let compact = TestRequest::post()
        .uri("/info")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"name":"constant","args":[1.0]}"#)
        .to_request();
    call_service(&app, compact).await;

    let spaced = TestRequest::post()
        .uri("/info")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"name": "constant", "args": [1.0]}"#)
        .to_request();
    call_service(&app, spaced).await;

    let req = TestRequest::get().uri("/cache-info").to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["misses"], 2);
    assert_eq!(body["hits"], 0);
}

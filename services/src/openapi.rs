use utoipa::OpenApi;

use crate::api_model::{
    CacheInfoResponse, CreateMapRequest, CreateMapResponse, ExportRequest, ExportResponse,
    ImageInfoResponse, SingleOrRgbDto, VisualizationParamsDto,
};
use crate::handlers::ErrorResponse;

/// The service's OpenAPI document, generated from the handler and DTO
/// annotations rather than hand-maintained as a separate JSON file.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::map::create_map,
        crate::handlers::info::info,
        crate::handlers::tiles::tile,
        crate::handlers::export::export,
        crate::handlers::cache_info::cache_info,
    ),
    components(schemas(
        CreateMapRequest,
        CreateMapResponse,
        ExportRequest,
        ExportResponse,
        ImageInfoResponse,
        CacheInfoResponse,
        VisualizationParamsDto,
        SingleOrRgbDto,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

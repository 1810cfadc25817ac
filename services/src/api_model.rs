use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use utoipa::ToSchema;

use geoalgebra_operators::{SingleOrRgb, VisualizationParams};

use crate::error::{self, Result};

/// Wire shape of `min`/`max`/`gain`/`bias`/`gamma`: either one number
/// applied to every band, or exactly three for an RGB triple (source
/// `models.py`'s `SingleOrRGBList`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SingleOrRgbDto {
    Single(f64),
    Rgb([f64; 3]),
}

impl From<SingleOrRgbDto> for SingleOrRgb {
    fn from(dto: SingleOrRgbDto) -> Self {
        match dto {
            SingleOrRgbDto::Single(v) => SingleOrRgb::Single(v),
            SingleOrRgbDto::Rgb(v) => SingleOrRgb::Rgb(v),
        }
    }
}

impl From<SingleOrRgb> for SingleOrRgbDto {
    fn from(value: SingleOrRgb) -> Self {
        match value {
            SingleOrRgb::Single(v) => SingleOrRgbDto::Single(v),
            SingleOrRgb::Rgb(v) => SingleOrRgbDto::Rgb(v),
        }
    }
}

fn default_unit() -> SingleOrRgbDto {
    SingleOrRgbDto::Single(1.0)
}

fn default_zero() -> SingleOrRgbDto {
    SingleOrRgbDto::Single(0.0)
}

fn default_opacity() -> f64 {
    1.0
}

/// Visualization parameters as submitted over the wire (source
/// `models.py`'s `VisualizationParams` pydantic model). Band names are
/// lowercased on arrival to match `Image::select`'s case-insensitive
/// convention.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisualizationParamsDto {
    #[serde(default)]
    pub bands: Option<Vec<String>>,
    #[serde(default)]
    pub min: Option<SingleOrRgbDto>,
    #[serde(default)]
    pub max: Option<SingleOrRgbDto>,
    #[serde(default = "default_unit")]
    pub gain: SingleOrRgbDto,
    #[serde(default = "default_zero")]
    pub bias: SingleOrRgbDto,
    #[serde(default = "default_unit")]
    pub gamma: SingleOrRgbDto,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for VisualizationParamsDto {
    fn default() -> Self {
        Self {
            bands: None,
            min: None,
            max: None,
            gain: default_unit(),
            bias: default_zero(),
            gamma: default_unit(),
            opacity: default_opacity(),
        }
    }
}

impl VisualizationParamsDto {
    pub fn into_domain(self) -> Result<VisualizationParams> {
        let bands = self
            .bands
            .map(|names| names.into_iter().map(|n| n.to_lowercase()).collect());

        let params = VisualizationParams {
            bands,
            min: self.min.map(Into::into),
            max: self.max.map(Into::into),
            gain: self.gain.into(),
            bias: self.bias.into(),
            gamma: self.gamma.into(),
            opacity: self.opacity,
        };
        params.validate().map_err(error::Error::from)?;
        Ok(params)
    }
}

/// Body of `POST /map` (spec §6): a call graph and an optional
/// visualization overlay applied by default on tile requests.
///
/// `image_graph` is kept as the verbatim JSON text of the submitted
/// node rather than parsed into a `Value`, so the eval memo (and the
/// map store) can key and persist on the exact bytes the client sent
/// instead of a re-serialized, canonicalized form.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMapRequest {
    #[schema(value_type = Object)]
    pub image_graph: Box<RawValue>,
    #[serde(default)]
    pub vis_params: Option<VisualizationParamsDto>,
}

/// Payload of `POST /map`'s `{"detail": ...}` envelope: the id clients
/// use for `/tiles/{id}/...`, plus the tile URL template (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMapResponse {
    pub id: String,
    pub tiles_url: String,
}

/// Body of `POST /export` (spec §6): a call graph plus the export
/// grid parameters and output path. `image` is kept as verbatim JSON
/// text for the same reason as `CreateMapRequest::image_graph`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportRequest {
    #[schema(value_type = Object)]
    pub image: Box<RawValue>,
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    #[serde(default = "default_crs")]
    pub in_crs: String,
    #[serde(default = "default_crs")]
    pub crs: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    pub path: String,
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}

fn default_scale() -> f64 {
    1000.0
}

/// Success payload of `POST /export` (spec §6: `{"result": "ok"}`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    pub result: String,
}

impl ExportResponse {
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }
}

/// Payload of `POST /info`'s `{"detail": ...}` envelope (spec §6): the
/// evaluated image's CRS, its own bounds, its bounds reprojected into
/// the tile matrix's CRS (`map_bounds`), band names, dtype and zoom
/// range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageInfoResponse {
    pub crs: Option<String>,
    pub bounds: Option<[f64; 4]>,
    pub map_bounds: Option<[f64; 4]>,
    pub band_names: Vec<String>,
    pub dtype: String,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
}

/// Response of `GET /cache-info` (spec §6): memo cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheInfoResponse {
    pub hits: u64,
    pub misses: u64,
    pub maxsize: u64,
    pub currsize: u64,
}

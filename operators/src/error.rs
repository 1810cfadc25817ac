use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while parsing a call-graph, materializing an
/// `Image`, rendering a tile, or writing an export. The request
/// boundary maps each variant to the taxonomy in spec §7.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub enum Error {
    #[snafu(display("unknown operation '{name}' in call-graph"))]
    UnknownOperation { name: String },

    #[snafu(display("call-graph node is malformed: {reason}"))]
    MalformedGraph { reason: String },

    #[snafu(display("band(s) not present on parent image: {names:?}"))]
    InvalidBandName { names: Vec<String> },

    #[snafu(display("visualization parameters are invalid: {reason}"))]
    InvalidVisualization { reason: String },

    #[snafu(display("image is boundless, bounds required"))]
    Boundless,

    #[snafu(display("requested tile is outside the image's bounds or below its minimum zoom"))]
    TileOutsideBounds,

    #[snafu(display("geo primitive error: {source}"))]
    Datatypes { source: geoalgebra_datatypes::Error },

    #[snafu(display("raster I/O failure: {source}"))]
    Gdal { source: gdal::errors::GdalError },

    #[snafu(display("PNG encoding failure: {source}"))]
    Image { source: image::ImageError },

    #[snafu(display("I/O error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("failed to parse call-graph JSON: {source}"))]
    Json { source: serde_json::Error },
}

impl From<geoalgebra_datatypes::Error> for Error {
    fn from(source: geoalgebra_datatypes::Error) -> Self {
        Error::Datatypes { source }
    }
}

impl From<gdal::errors::GdalError> for Error {
    fn from(source: gdal::errors::GdalError) -> Self {
        Error::Gdal { source }
    }
}

impl From<image::ImageError> for Error {
    fn from(source: image::ImageError) -> Self {
        Error::Image { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the geo primitives: malformed bounds, CRS
/// mismatches that should never reach this layer, and reprojection
/// failures bubbled up from PROJ.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub enum Error {
    #[snafu(display("bounding box is empty or inverted: {min_x},{min_y} .. {max_x},{max_y}"))]
    InvalidBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[snafu(display("window has non-positive extent: {width}x{height}"))]
    InvalidWindow { width: i64, height: i64 },

    #[snafu(display("unknown CRS authority/code combination: {authority}:{code}"))]
    UnknownCrs { authority: String, code: u32 },

    #[snafu(display("failed to construct a coordinate transform: {source}"))]
    Proj { source: proj::ProjCreateError },

    #[snafu(display("coordinate transform failed: {source}"))]
    Transform { source: proj::ProjError },

    #[snafu(display("zoom level {zoom} is outside the tile matrix set's range"))]
    ZoomOutOfRange { zoom: i32 },
}

//! Geo primitives shared by the lazy raster algebra: bounding boxes,
//! CRS handles, affine transforms, window math, the Web Mercator tile
//! matrix set, and the pixel-tile container every `Image` produces.

pub mod affine;
pub mod bbox;
pub mod crs;
pub mod dtype;
pub mod error;
pub mod image_data;
pub mod reproject;
pub mod tms;
pub mod window;

pub use affine::Affine;
pub use bbox::{bounds_union, BBox};
pub use crs::Crs;
pub use dtype::DType;
pub use error::{Error, Result};
pub use image_data::ImageData;
pub use reproject::{CrsTransformer, ProjTransformer};
pub use tms::TileMatrixSet;
pub use window::Window;

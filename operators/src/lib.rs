//! The lazy raster-image algebra: a tagged `Image` enum, the call-graph
//! evaluator that builds one from request JSON, the tile reader and
//! export writer that materialize it, and the visualization pass tile
//! rendering applies first.

pub mod error;
pub mod export;
pub mod gdal_source;
pub mod graph;
pub mod image;
pub mod tiler;
pub mod visualization;

pub use error::{Error, Result};
pub use export::{export_to_cog, ExportOptions};
pub use gdal_source::{GdalRasterSource, RasterSource};
pub use graph::{eval, to_graph, GdalSourceResolver, SourceResolver};
pub use image::{BinaryOp, Image, Metadata};
pub use tiler::{render_tile, TileOutcome};
pub use visualization::{SingleOrRgb, VisualizationParams};

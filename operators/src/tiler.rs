use std::io::Cursor;

use geoalgebra_datatypes::{CrsTransformer, TileMatrixSet};

use crate::error::Result;
use crate::image::Image;
use crate::visualization::VisualizationParams;

/// The result of attempting to render a tile (spec §4.4): either PNG
/// bytes, or a signal that the tile lies outside the image's bounds
/// or below its minimum zoom — the request boundary turns the latter
/// into `204 No Content` rather than an error response.
pub enum TileOutcome {
    Rendered(Vec<u8>),
    OutOfBounds,
}

/// Renders one `z/x/y` web-map tile of `image` (spec §4.4). Tiles
/// below the source's `min_zoom` are rejected outright: warping a
/// very-high-resolution raster down to a very-low-zoom tile through a
/// reprojecting reader is pathologically slow, a known rio-tiler
/// footgun the source works around the same way.
pub fn render_tile(
    image: &Image,
    z: u8,
    x: u32,
    y: u32,
    tile_size: u32,
    vis: &VisualizationParams,
    transformer: &dyn CrsTransformer,
) -> Result<TileOutcome> {
    let tms = TileMatrixSet::web_mercator();
    let metadata = image.metadata(transformer)?;

    if let Some(min_zoom) = metadata.min_zoom {
        if z < min_zoom {
            return Ok(TileOutcome::OutOfBounds);
        }
    }

    let tile_bounds = tms.xy_bounds(z, x, y)?;

    if let Some((bounds, crs)) = metadata.bounds {
        let bounds_in_tms = bounds.reproject(crs, tms.crs(), transformer, 21)?;
        let disjoint = tile_bounds.max_x <= bounds_in_tms.min_x
            || tile_bounds.min_x >= bounds_in_tms.max_x
            || tile_bounds.max_y <= bounds_in_tms.min_y
            || tile_bounds.min_y >= bounds_in_tms.max_y;
        if disjoint {
            return Ok(TileOutcome::OutOfBounds);
        }
    }

    let mut tile = image.materialize(&tile_bounds, &tms.crs(), tile_size, tile_size, transformer)?;
    vis.apply(&mut tile)?;

    let png = encode_png(&tile)?;
    Ok(TileOutcome::Rendered(png))
}

fn encode_png(tile: &geoalgebra_datatypes::ImageData) -> Result<Vec<u8>> {
    let (height, width) = (tile.height() as u32, tile.width() as u32);
    let bands = tile.bands();

    let mut buffer = Vec::with_capacity((height * width * 4) as usize);
    for row in 0..height as usize {
        for col in 0..width as usize {
            let alpha = tile.mask[[row, col]];
            match bands {
                1 => {
                    let v = tile.data[[0, row, col]].clamp(0.0, 255.0) as u8;
                    buffer.extend_from_slice(&[v, v, v, alpha]);
                }
                3 => {
                    let r = tile.data[[0, row, col]].clamp(0.0, 255.0) as u8;
                    let g = tile.data[[1, row, col]].clamp(0.0, 255.0) as u8;
                    let b = tile.data[[2, row, col]].clamp(0.0, 255.0) as u8;
                    buffer.extend_from_slice(&[r, g, b, alpha]);
                }
                _ => {
                    let v = tile.data[[0, row, col]].clamp(0.0, 255.0) as u8;
                    buffer.extend_from_slice(&[v, v, v, alpha]);
                }
            }
        }
    }

    let img = image::RgbaImage::from_raw(width, height, buffer)
        .expect("buffer sized to width*height*4 above");
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geoalgebra_datatypes::{BBox, Crs, DType, ImageData, ProjTransformer};

    use super::*;
    use crate::gdal_source::RasterSource;

    #[test]
    fn boundless_constant_renders_a_tile() {
        let image = Image::constant(42.0);
        let transformer = ProjTransformer::default();
        let outcome = render_tile(&image, 3, 2, 2, 256, &VisualizationParams::default(), &transformer).unwrap();
        match outcome {
            TileOutcome::Rendered(png) => assert!(!png.is_empty()),
            TileOutcome::OutOfBounds => panic!("boundless image should always render"),
        }
    }

    /// A `RasterSource` test double, standing in for `GdalRasterSource`
    /// (the seam `graph.rs`'s `SourceResolver` exists for) so bounds and
    /// zoom range can be fixed without opening a real file.
    struct FixedSource {
        bounds: BBox,
        crs: Crs,
        min_zoom: u8,
        max_zoom: u8,
    }

    impl RasterSource for FixedSource {
        fn band_count(&self) -> usize {
            1
        }

        fn native_dtype(&self) -> DType {
            DType::U8
        }

        fn native_bounds(&self) -> (BBox, Crs) {
            (self.bounds, self.crs)
        }

        fn min_zoom(&self) -> u8 {
            self.min_zoom
        }

        fn max_zoom(&self) -> u8 {
            self.max_zoom
        }

        fn read(&self, bounds: &BBox, crs: Crs, height: usize, width: usize) -> Result<ImageData> {
            Ok(ImageData::filled(1.0, height, width, *bounds, crs, DType::U8))
        }
    }

    #[test]
    fn tile_disjoint_from_the_image_bounds_is_out_of_bounds() {
        // A source confined to a tiny patch near the equator; tile 0/0/0
        // covers the whole world and is disjoint from nothing at that
        // zoom, so pick a tile far enough away (z=10 top-left corner)
        // to fall well outside the source's bounds.
        let source = FixedSource {
            bounds: BBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            crs: Crs::EPSG_4326,
            min_zoom: 0,
            max_zoom: 20,
        };
        let image = Image::load("fixed", Arc::new(source));
        let transformer = ProjTransformer::default();

        let outcome = render_tile(&image, 10, 0, 0, 256, &VisualizationParams::default(), &transformer).unwrap();
        assert!(matches!(outcome, TileOutcome::OutOfBounds));
    }

    #[test]
    fn tile_below_the_source_minimum_zoom_is_out_of_bounds() {
        let source = FixedSource {
            bounds: BBox::new(-180.0, -85.0, 180.0, 85.0).unwrap(),
            crs: Crs::EPSG_4326,
            min_zoom: 5,
            max_zoom: 20,
        };
        let image = Image::load("fixed", Arc::new(source));
        let transformer = ProjTransformer::default();

        let outcome = render_tile(&image, 2, 0, 0, 256, &VisualizationParams::default(), &transformer).unwrap();
        assert!(matches!(outcome, TileOutcome::OutOfBounds));
    }
}

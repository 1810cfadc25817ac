use crate::bbox::BBox;
use crate::crs::Crs;
use crate::error::{self, Result};

/// The origin of the Web Mercator world bounds, in meters. The pyramid
/// is square: `[-ORIGIN, ORIGIN]` on both axes at zoom 0.
const WEB_MERCATOR_ORIGIN: f64 = 20_037_508.342_789_244;

/// The Web Mercator tile matrix set (spec §3, §GLOSSARY). Zoom 0 is a
/// single `tile_size`-pixel tile covering the whole world; each zoom
/// level quadruples the tile count.
#[derive(Debug, Clone, Copy)]
pub struct TileMatrixSet {
    tile_size: u32,
    min_zoom: u8,
    max_zoom: u8,
}

impl Default for TileMatrixSet {
    fn default() -> Self {
        Self::web_mercator()
    }
}

impl TileMatrixSet {
    pub fn web_mercator() -> Self {
        Self {
            tile_size: 256,
            min_zoom: 0,
            max_zoom: 24,
        }
    }

    pub fn crs(&self) -> Crs {
        Crs::EPSG_3857
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Resolution (map units per pixel) at a given zoom level.
    pub fn resolution(&self, zoom: u8) -> f64 {
        (2.0 * WEB_MERCATOR_ORIGIN) / (self.tile_size as f64 * 2f64.powi(zoom as i32))
    }

    /// The bounds of tile `(z, x, y)` in this TMS's CRS (spec §4.4 step 3).
    pub fn xy_bounds(&self, z: u8, x: u32, y: u32) -> Result<BBox> {
        if z < self.min_zoom || z > self.max_zoom {
            return Err(error::Error::ZoomOutOfRange { zoom: z as i32 });
        }
        let tile_span = 2.0 * WEB_MERCATOR_ORIGIN / 2f64.powi(z as i32);
        let min_x = -WEB_MERCATOR_ORIGIN + x as f64 * tile_span;
        let max_x = min_x + tile_span;
        let max_y = WEB_MERCATOR_ORIGIN - y as f64 * tile_span;
        let min_y = max_y - tile_span;
        BBox::new(min_x, min_y, max_x, max_y)
    }

    /// The coarsest zoom level whose resolution is no finer than
    /// `resolution` (map units per pixel) — used to derive a raster
    /// source's `min_zoom`/`max_zoom` from its native pixel size
    /// (spec §4.2 "load").
    pub fn zoom_for_resolution(&self, resolution: f64) -> u8 {
        if resolution <= 0.0 {
            return self.max_zoom;
        }
        for z in self.min_zoom..=self.max_zoom {
            if self.resolution(z) <= resolution {
                return z;
            }
        }
        self.max_zoom
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn zoom_zero_covers_the_world() {
        let tms = TileMatrixSet::web_mercator();
        let bounds = tms.xy_bounds(0, 0, 0).unwrap();
        assert!(approx_eq!(f64, bounds.min_x, -WEB_MERCATOR_ORIGIN, epsilon = 1e-6));
        assert!(approx_eq!(f64, bounds.max_x, WEB_MERCATOR_ORIGIN, epsilon = 1e-6));
    }

    #[test]
    fn higher_zoom_quadruples_tile_count() {
        let tms = TileMatrixSet::web_mercator();
        let z1_tile = tms.xy_bounds(1, 0, 0).unwrap();
        assert!(approx_eq!(f64, z1_tile.width(), WEB_MERCATOR_ORIGIN, epsilon = 1e-6));
    }

    #[test]
    fn rejects_out_of_range_zoom() {
        let tms = TileMatrixSet::web_mercator();
        assert!(tms.xy_bounds(30, 0, 0).is_err());
    }

    #[test]
    fn resolution_decreases_with_zoom() {
        let tms = TileMatrixSet::web_mercator();
        assert!(tms.resolution(0) > tms.resolution(10));
    }
}

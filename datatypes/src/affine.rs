use serde::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::window::Window;

/// A 6-parameter affine transform mapping pixel `(col, row)` to map
/// `(x, y)`:
/// ```text
/// x = a*col + b*row + c
/// y = d*col + e*row + f
/// ```
/// Only axis-aligned transforms (`b == d == 0`) are constructed by
/// this crate, but the general form is kept so a future non-aligned
/// source wouldn't need a new type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    /// An axis-aligned transform anchored at its top-left corner, with
    /// north-up pixels of `xsize` by `ysize` map units (spec §4.1 step 3).
    pub fn from_origin(west: f64, north: f64, xsize: f64, ysize: f64) -> Self {
        Self {
            a: xsize,
            b: 0.0,
            c: west,
            d: 0.0,
            e: -ysize,
            f: north,
        }
    }

    /// An axis-aligned transform that maps a pixel grid of `width` x
    /// `height` exactly onto `bounds` (spec §4.1 step 5).
    pub fn from_bounds(bounds: &BBox, width: u32, height: u32) -> Self {
        let xsize = bounds.width() / width as f64;
        let ysize = bounds.height() / height as f64;
        Self::from_origin(bounds.min_x, bounds.max_y, xsize, ysize)
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.a, -self.e)
    }

    /// Maps a pixel coordinate to a map coordinate.
    pub fn pixel_to_map(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Maps a map coordinate back to a (fractional) pixel coordinate.
    /// Only valid for the axis-aligned transforms this crate builds
    /// (`b == d == 0`).
    pub fn map_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        debug_assert!(self.b == 0.0 && self.d == 0.0, "non axis-aligned affine");
        ((x - self.c) / self.a, (y - self.f) / self.e)
    }

    /// The integer-rounded `Window` that `bounds` occupies under this
    /// transform (spec §4.1 step 4, and the export writer's
    /// window-from-bounds computation).
    pub fn window_from_bounds(&self, bounds: &BBox) -> Window {
        let (col0, row0) = self.map_to_pixel(bounds.min_x, bounds.max_y);
        let (col1, row1) = self.map_to_pixel(bounds.max_x, bounds.min_y);
        let col_off = col0.round() as i64;
        let row_off = row0.round() as i64;
        let width = (col1 - col0).round() as i64;
        let height = (row1 - row0).round() as i64;
        Window {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// The map-space bounds a given window occupies under this transform.
    pub fn bounds_of_window(&self, window: &Window) -> BBox {
        let (x0, y0) = self.pixel_to_map(window.col_off as f64, (window.row_off + window.height) as f64);
        let (x1, y1) = self.pixel_to_map((window.col_off + window.width) as f64, window.row_off as f64);
        BBox {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_origin_round_trips_pixel_to_map() {
        let affine = Affine::from_origin(0.0, 10.0, 1.0, 1.0);
        assert_eq!(affine.pixel_to_map(0.0, 0.0), (0.0, 10.0));
        assert_eq!(affine.pixel_to_map(5.0, 5.0), (5.0, 5.0));
    }

    #[test]
    fn window_from_bounds_round_trips() {
        let bounds = BBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let affine = Affine::from_bounds(&bounds, 10, 10);
        let window = affine.window_from_bounds(&bounds);
        assert_eq!(window.col_off, 0);
        assert_eq!(window.row_off, 0);
        assert_eq!(window.width, 10);
        assert_eq!(window.height, 10);
    }
}

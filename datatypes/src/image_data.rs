use ndarray::{Array2, Array3};

use crate::bbox::BBox;
use crate::crs::Crs;
use crate::dtype::DType;

/// A materialized raster tile: pixel data of shape `(bands, height,
/// width)`, a parallel validity mask of shape `(height, width)` (0 =
/// nodata, 255 = valid), and the geo-metadata it was produced at
/// (spec §3 "Pixel tile / ImageData").
///
/// Pixel values are always carried internally as `f64` regardless of
/// the tile's announced `dtype`; `dtype` is a contract for I/O
/// boundaries (the GDAL source and COG writer cast to it), not a
/// storage format. This sidesteps the generic-over-pixel-type
/// machinery the source's type system favors, at no cost to the
/// spec's observable invariants (shape, values, mask).
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Array3<f64>,
    pub mask: Array2<u8>,
    pub bounds: BBox,
    pub crs: Crs,
    pub band_names: Vec<String>,
    pub dtype: DType,
}

impl ImageData {
    pub fn bands(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[2]
    }

    /// Builds a uniformly-valued tile, the shape `constant(v)`
    /// materializes into (spec §3 invariant 2, §8 "Constant identity").
    pub fn filled(
        value: f64,
        height: usize,
        width: usize,
        bounds: BBox,
        crs: Crs,
        dtype: DType,
    ) -> Self {
        Self {
            data: Array3::from_elem((1, height, width), value),
            mask: Array2::from_elem((height, width), 255u8),
            bounds,
            crs,
            band_names: vec!["CONSTANT".to_string()],
            dtype,
        }
    }

    /// Asserts the shape law from spec §8 invariant 1.
    pub fn assert_shape(&self, bands: usize, height: usize, width: usize) {
        assert_eq!(self.data.shape(), [bands, height, width]);
        assert_eq!(self.mask.shape(), [height, width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_has_uniform_data_and_full_mask() {
        let tile = ImageData::filled(5.0, 2, 3, BBox::new(0.0, 0.0, 1.0, 1.0).unwrap(), Crs::EPSG_4326, DType::U8);
        tile.assert_shape(1, 2, 3);
        assert!(tile.data.iter().all(|&v| v == 5.0));
        assert!(tile.mask.iter().all(|&v| v == 255));
    }
}

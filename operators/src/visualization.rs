use geoalgebra_datatypes::ImageData;

use crate::error::{self, Result};

/// One value, or one value per RGB channel (spec §GLOSSARY
/// "SingleOrRGBList" — the source's `min`/`max`/`gain`/`bias`/`gamma`
/// fields accept either shape).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SingleOrRgb {
    Single(f64),
    Rgb([f64; 3]),
}

impl SingleOrRgb {
    fn expand(self, count: usize) -> Vec<f64> {
        match self {
            SingleOrRgb::Single(v) => vec![v; count],
            SingleOrRgb::Rgb(values) => values.into_iter().take(count).collect(),
        }
    }
}

/// Rendering parameters applied to a materialized tile before PNG
/// encoding (spec §2.4/§4.5). Distinct from the wire DTO the request
/// boundary deserializes — this is the validated domain type.
#[derive(Debug, Clone)]
pub struct VisualizationParams {
    pub bands: Option<Vec<String>>,
    pub min: Option<SingleOrRgb>,
    pub max: Option<SingleOrRgb>,
    pub gain: SingleOrRgb,
    pub bias: SingleOrRgb,
    pub gamma: SingleOrRgb,
    pub opacity: f64,
}

impl Default for VisualizationParams {
    fn default() -> Self {
        Self {
            bands: None,
            min: None,
            max: None,
            gain: SingleOrRgb::Single(1.0),
            bias: SingleOrRgb::Single(0.0),
            gamma: SingleOrRgb::Single(1.0),
            opacity: 1.0,
        }
    }
}

impl VisualizationParams {
    /// Validates the shape the source's pydantic model enforces:
    /// `bands` must name 1 or 3 bands, `opacity` must be in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if let Some(bands) = &self.bands {
            if bands.len() != 1 && bands.len() != 3 {
                return Err(error::Error::InvalidVisualization {
                    reason: format!("bands must contain either 1 or 3 band names, got {}", bands.len()),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(error::Error::InvalidVisualization {
                reason: format!("opacity must be between 0.0 and 1.0, got {}", self.opacity),
            });
        }
        Ok(())
    }

    /// Applies band selection, min/max rescale, the reserved
    /// gain/bias/gamma passes, and the opacity mask multiply, in that
    /// order (spec §4.5).
    pub fn apply(&self, tile: &mut ImageData) -> Result<()> {
        self.validate()?;

        if let Some(bands) = &self.bands {
            reindex_bands(tile, bands)?;
        }

        let band_count = tile.bands();

        if let (Some(min), Some(max)) = (self.min, self.max) {
            rescale(tile, min.expand(band_count), max.expand(band_count));
        }

        apply_gain_bias_gamma(tile, self.gain.expand(band_count), self.bias.expand(band_count), self.gamma.expand(band_count));

        if self.opacity < 1.0 {
            // Preserved verbatim from the source: `mask *= round((1 -
            // opacity) * 255)` on a uint8 array, which wraps on
            // overflow rather than saturating or producing a true
            // alpha blend. Intentionally left as-is (spec §9), not
            // "fixed" into a saturating multiply.
            let factor = ((1.0 - self.opacity) * 255.0).round() as u8;
            tile.mask.mapv_inplace(|m| m.wrapping_mul(factor));
        }

        Ok(())
    }
}

fn reindex_bands(tile: &mut ImageData, bands: &[String]) -> Result<()> {
    let lower_names: Vec<String> = tile.band_names.iter().map(|n| n.to_lowercase()).collect();
    let indexes: Vec<usize> = bands
        .iter()
        .map(|b| {
            lower_names
                .iter()
                .position(|existing| existing == &b.to_lowercase())
                .ok_or_else(|| error::Error::InvalidBandName { names: vec![b.clone()] })
        })
        .collect::<Result<_>>()?;

    let (height, width) = (tile.height(), tile.width());
    let mut reindexed = ndarray::Array3::<f64>::zeros((indexes.len(), height, width));
    for (dst, &src) in indexes.iter().enumerate() {
        reindexed
            .index_axis_mut(ndarray::Axis(0), dst)
            .assign(&tile.data.index_axis(ndarray::Axis(0), src));
    }
    tile.data = reindexed;
    tile.band_names = bands.to_vec();
    Ok(())
}

fn rescale(tile: &mut ImageData, min: Vec<f64>, max: Vec<f64>) {
    for band in 0..tile.bands() {
        let (lo, hi) = (min[band], max[band]);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let mut plane = tile.data.index_axis_mut(ndarray::Axis(0), band);
        plane.mapv_inplace(|v| (((v - lo) / span) * 255.0).clamp(0.0, 255.0));
    }
}

fn apply_gain_bias_gamma(tile: &mut ImageData, gain: Vec<f64>, bias: Vec<f64>, gamma: Vec<f64>) {
    for band in 0..tile.bands() {
        let (g, b, gm) = (gain[band], bias[band], gamma[band]);
        if g == 1.0 && b == 0.0 && gm == 1.0 {
            continue;
        }
        let mut plane = tile.data.index_axis_mut(ndarray::Axis(0), band);
        plane.mapv_inplace(|v| (v * g + b).max(0.0).powf(gm));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoalgebra_datatypes::{BBox, Crs, DType};

    fn tile(values: &[f64]) -> ImageData {
        ImageData {
            data: ndarray::Array3::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap(),
            mask: ndarray::Array2::from_elem((1, values.len()), 255u8),
            bounds: BBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
            crs: Crs::EPSG_4326,
            band_names: vec!["B1".to_string()],
            dtype: DType::F64,
        }
    }

    #[test]
    fn rejects_two_band_selection() {
        let params = VisualizationParams {
            bands: Some(vec!["b1".to_string(), "b2".to_string()]),
            ..VisualizationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_opacity_outside_unit_range() {
        let params = VisualizationParams {
            opacity: 1.5,
            ..VisualizationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn min_max_rescale_maps_range_to_0_255() {
        let mut img = tile(&[0.0, 50.0, 100.0]);
        let params = VisualizationParams {
            min: Some(SingleOrRgb::Single(0.0)),
            max: Some(SingleOrRgb::Single(100.0)),
            ..VisualizationParams::default()
        };
        params.apply(&mut img).unwrap();
        assert_eq!(img.data[[0, 0, 0]], 0.0);
        assert_eq!(img.data[[0, 0, 2]], 255.0);
    }

    #[test]
    fn opacity_quirk_is_preserved_verbatim() {
        let mut img = tile(&[1.0]);
        let params = VisualizationParams {
            opacity: 0.5,
            ..VisualizationParams::default()
        };
        params.apply(&mut img).unwrap();
        // round((1 - 0.5) * 255) == 128; 255u8.wrapping_mul(128) wraps
        // to 128, matching numpy's uint8 overflow behavior exactly.
        assert_eq!(img.mask[[0, 0]], 255u8.wrapping_mul(128));
    }
}

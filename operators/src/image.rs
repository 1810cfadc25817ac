use std::sync::Arc;

use geoalgebra_datatypes::{BBox, Crs, CrsTransformer, DType, ImageData};

use crate::error::{self, Result};
use crate::gdal_source::RasterSource;

/// The arithmetic/comparison operators `Image::BinaryOp` carries (spec
/// §4.2). Division has two variants because the source distinguishes
/// `__truediv__` (always float) from `__floordiv__` (integral when
/// both operands are).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl BinaryOp {
    fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::TrueDiv => lhs / rhs,
            BinaryOp::FloorDiv => (lhs / rhs).floor(),
            BinaryOp::Lt => bool_to_f64(lhs < rhs),
            BinaryOp::Le => bool_to_f64(lhs <= rhs),
            BinaryOp::Eq => bool_to_f64(lhs == rhs),
            BinaryOp::Ne => bool_to_f64(lhs != rhs),
            BinaryOp::Gt => bool_to_f64(lhs > rhs),
            BinaryOp::Ge => bool_to_f64(lhs >= rhs),
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// The metadata an `Image` node reports without materializing any
/// pixels (spec §3 "Image metadata"). `bounds` is `None` for boundless
/// nodes (e.g. a bare `constant`); `min_zoom`/`max_zoom` are only ever
/// `Some` below a `load` node.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub dtype: DType,
    pub bounds: Option<(BBox, Crs)>,
    pub band_names: Vec<String>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
}

#[derive(Clone)]
pub struct LoadImage {
    pub path: String,
    pub source: Arc<dyn RasterSource>,
}

impl std::fmt::Debug for LoadImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadImage").field("path", &self.path).finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantImage {
    pub value: f64,
}

/// A node in the lazy raster algebra (spec §2/§9). Each variant stores
/// only its children and tag; there is no boxed per-node closure or
/// dynamic dispatch — `materialize` is one method with one match arm
/// per variant.
#[derive(Debug, Clone)]
pub enum Image {
    Load(LoadImage),
    Constant(ConstantImage),
    Abs(Box<Image>),
    BinaryOp {
        op: BinaryOp,
        lhs: Box<Image>,
        rhs: Box<Image>,
    },
    Select {
        bands: Vec<String>,
        parent: Box<Image>,
    },
}

impl Image {
    pub fn load(path: impl Into<String>, source: Arc<dyn RasterSource>) -> Self {
        Image::Load(LoadImage {
            path: path.into(),
            source,
        })
    }

    pub fn constant(value: f64) -> Self {
        Image::Constant(ConstantImage { value })
    }

    pub fn abs(self) -> Self {
        Image::Abs(Box::new(self))
    }

    pub fn binary(op: BinaryOp, lhs: Image, rhs: Image) -> Self {
        Image::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Restricts the image to a subset of its bands, validated
    /// case-sensitively against `band_names` (spec §2 "select",
    /// preserving the source's `B1..Bn` convention for loaded
    /// rasters).
    pub fn select(self, bands: Vec<String>, transformer: &dyn CrsTransformer) -> Result<Self> {
        let available = self.metadata(transformer)?.band_names;
        let invalid: Vec<String> = bands.iter().filter(|b| !available.contains(b)).cloned().collect();
        if !invalid.is_empty() {
            return Err(error::Error::InvalidBandName { names: invalid });
        }
        Ok(Image::Select {
            bands,
            parent: Box::new(self),
        })
    }

    /// Reports this node's metadata without materializing pixels
    /// (spec §3). Requires a transformer only because `BinaryOp` and
    /// `Select` bounds propagation may need to reproject a child's
    /// bounds into the other child's CRS.
    pub fn metadata(&self, transformer: &dyn CrsTransformer) -> Result<Metadata> {
        match self {
            Image::Load(load) => Ok(Metadata {
                dtype: load.source.native_dtype(),
                bounds: Some(load.source.native_bounds()),
                band_names: (1..=load.source.band_count()).map(|i| format!("B{i}")).collect(),
                min_zoom: Some(load.source.min_zoom()),
                max_zoom: Some(load.source.max_zoom()),
            }),
            Image::Constant(constant) => Ok(Metadata {
                dtype: DType::smallest_for_value(constant.value),
                bounds: None,
                band_names: vec!["CONSTANT".to_string()],
                min_zoom: None,
                max_zoom: None,
            }),
            Image::Abs(parent) => parent.metadata(transformer),
            Image::BinaryOp { op, lhs, rhs } => {
                let lhs_meta = lhs.metadata(transformer)?;
                let rhs_meta = rhs.metadata(transformer)?;
                let dtype = if op.is_comparison() {
                    DType::for_comparison()
                } else if *op == BinaryOp::FloorDiv {
                    DType::widen_for_floor_div(lhs_meta.dtype, rhs_meta.dtype)
                } else {
                    DType::widen_for_arithmetic(lhs_meta.dtype, rhs_meta.dtype)
                };
                let bounds = geoalgebra_datatypes::bounds_union(lhs_meta.bounds, rhs_meta.bounds, transformer)?;
                Ok(Metadata {
                    dtype,
                    bounds,
                    band_names: lhs_meta.band_names,
                    min_zoom: combine_zoom(lhs_meta.min_zoom, rhs_meta.min_zoom, u8::max),
                    max_zoom: combine_zoom(lhs_meta.max_zoom, rhs_meta.max_zoom, u8::min),
                })
            }
            Image::Select { bands, parent } => {
                let mut meta = parent.metadata(transformer)?;
                meta.band_names = bands.clone();
                Ok(meta)
            }
        }
    }

    /// Renders this node into concrete pixels covering `bounds` (in
    /// `crs`) at `height x width` (spec §3 invariant 1). There is no
    /// per-node cache here; the request boundary's memo (spec §4.8)
    /// caches whole evaluations keyed by call-graph JSON.
    #[tracing::instrument(level = "debug", skip(self, transformer), fields(height, width))]
    pub fn materialize(
        &self,
        bounds: &BBox,
        crs: &Crs,
        height: u32,
        width: u32,
        transformer: &dyn CrsTransformer,
    ) -> Result<ImageData> {
        let (height, width) = (height as usize, width as usize);
        match self {
            Image::Load(load) => Ok(load.source.read(bounds, *crs, height, width)?),
            Image::Constant(constant) => Ok(ImageData::filled(
                constant.value,
                height,
                width,
                *bounds,
                *crs,
                DType::smallest_for_value(constant.value),
            )),
            Image::Abs(parent) => {
                let mut tile = parent.materialize(bounds, crs, height as u32, width as u32, transformer)?;
                tile.data.mapv_inplace(f64::abs);
                Ok(tile)
            }
            Image::BinaryOp { op, lhs, rhs } => {
                materialize_binary(*op, lhs, rhs, bounds, crs, height, width, transformer)
            }
            Image::Select { bands, parent } => {
                let tile = parent.materialize(bounds, crs, height as u32, width as u32, transformer)?;
                materialize_select(tile, bands)
            }
        }
    }
}

fn combine_zoom(a: Option<u8>, b: Option<u8>, pick: fn(u8, u8) -> u8) -> Option<u8> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn materialize_select(mut tile: ImageData, bands: &[String]) -> Result<ImageData> {
    let indexes: Vec<usize> = bands
        .iter()
        .map(|b| {
            tile.band_names
                .iter()
                .position(|existing| existing == b)
                .ok_or_else(|| error::Error::InvalidBandName { names: vec![b.clone()] })
        })
        .collect::<Result<_>>()?;

    let (_, height, width) = (tile.data.shape()[0], tile.data.shape()[1], tile.data.shape()[2]);
    let mut selected = ndarray::Array3::<f64>::zeros((indexes.len(), height, width));
    for (dst, &src) in indexes.iter().enumerate() {
        selected
            .index_axis_mut(ndarray::Axis(0), dst)
            .assign(&tile.data.index_axis(ndarray::Axis(0), src));
    }
    tile.data = selected;
    tile.band_names = bands.to_vec();
    Ok(tile)
}

#[allow(clippy::too_many_arguments)]
fn materialize_binary(
    op: BinaryOp,
    lhs: &Image,
    rhs: &Image,
    bounds: &BBox,
    crs: &Crs,
    height: usize,
    width: usize,
    transformer: &dyn CrsTransformer,
) -> Result<ImageData> {
    let lhs_tile = lhs.materialize(bounds, crs, height as u32, width as u32, transformer)?;
    let rhs_tile = rhs.materialize(bounds, crs, height as u32, width as u32, transformer)?;

    let out_bands = lhs_tile.bands();
    if rhs_tile.bands() != out_bands && rhs_tile.bands() != 1 {
        return Err(error::Error::InvalidBandName {
            names: rhs_tile.band_names.clone(),
        });
    }

    let dtype = if op.is_comparison() {
        DType::for_comparison()
    } else if op == BinaryOp::FloorDiv {
        DType::widen_for_floor_div(lhs_tile.dtype, rhs_tile.dtype)
    } else {
        DType::widen_for_arithmetic(lhs_tile.dtype, rhs_tile.dtype)
    };

    let mut data = ndarray::Array3::<f64>::zeros((out_bands, height, width));
    let mut mask = ndarray::Array2::<u8>::zeros((height, width));

    for band in 0..out_bands {
        let rhs_band = if rhs_tile.bands() == 1 { 0 } else { band };
        for row in 0..height {
            for col in 0..width {
                let l = lhs_tile.data[[band, row, col]];
                let r = rhs_tile.data[[rhs_band, row, col]];
                data[[band, row, col]] = op.apply(l, r);
            }
        }
    }

    for row in 0..height {
        for col in 0..width {
            mask[[row, col]] = lhs_tile.mask[[row, col]].max(rhs_tile.mask[[row, col]]);
        }
    }

    Ok(ImageData {
        data,
        mask,
        bounds: *bounds,
        crs: *crs,
        band_names: lhs_tile.band_names,
        dtype,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoalgebra_datatypes::ProjTransformer;

    fn bounds() -> BBox {
        BBox::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn constant_materializes_a_uniform_tile() {
        let image = Image::constant(7.0);
        let transformer = ProjTransformer::default();
        let tile = image
            .materialize(&bounds(), &Crs::EPSG_4326, 4, 4, &transformer)
            .unwrap();
        assert!(tile.data.iter().all(|&v| v == 7.0));
        assert_eq!(tile.band_names, vec!["CONSTANT".to_string()]);
    }

    #[test]
    fn abs_of_constant_negative_is_positive() {
        let image = Image::constant(-3.0).abs();
        let transformer = ProjTransformer::default();
        let tile = image
            .materialize(&bounds(), &Crs::EPSG_4326, 2, 2, &transformer)
            .unwrap();
        assert!(tile.data.iter().all(|&v| v == 3.0));
    }

    #[test]
    fn comparison_produces_zero_one_mask_dtype_u8() {
        let image = Image::binary(BinaryOp::Gt, Image::constant(5.0), Image::constant(2.0));
        let transformer = ProjTransformer::default();
        let tile = image
            .materialize(&bounds(), &Crs::EPSG_4326, 2, 2, &transformer)
            .unwrap();
        assert!(tile.data.iter().all(|&v| v == 1.0));
        assert_eq!(tile.dtype, DType::U8);
    }

    #[test]
    fn floor_div_truncates_toward_negative_infinity() {
        let image = Image::binary(BinaryOp::FloorDiv, Image::constant(-7.0), Image::constant(2.0));
        let transformer = ProjTransformer::default();
        let tile = image
            .materialize(&bounds(), &Crs::EPSG_4326, 1, 1, &transformer)
            .unwrap();
        assert_eq!(tile.data[[0, 0, 0]], -4.0);
    }

    #[test]
    fn select_reorders_and_subsets_bands() {
        let transformer = ProjTransformer::default();
        // Two-band constant-like tile built directly to exercise select in isolation.
        let tile = ImageData {
            data: ndarray::Array3::from_shape_fn((2, 1, 1), |(b, _, _)| b as f64),
            mask: ndarray::Array2::from_elem((1, 1), 255u8),
            bounds: bounds(),
            crs: Crs::EPSG_4326,
            band_names: vec!["B1".to_string(), "B2".to_string()],
            dtype: DType::F64,
        };
        let selected = materialize_select(tile, &["B2".to_string()]).unwrap();
        assert_eq!(selected.band_names, vec!["B2".to_string()]);
        assert_eq!(selected.data[[0, 0, 0]], 1.0);
        let _ = transformer;
    }
}

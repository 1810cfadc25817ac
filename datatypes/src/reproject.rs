use crate::crs::Crs;
use crate::error::{self, Result};

/// The seam between this crate's coordinate math and a concrete CRS
/// transformation library (spec §1: "PROJ-style CRS transformer...
/// treated as a library"). `Image` and `BBox` operations take a
/// `&dyn CrsTransformer` rather than reaching for a global, so tests
/// can substitute a fake without linking PROJ.
pub trait CrsTransformer: Send + Sync {
    /// Transforms a single point from `from` to `to`.
    fn transform_point(&self, from: Crs, to: Crs, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// The production `CrsTransformer`, backed by the `proj` crate's
/// bindings to the PROJ C library. One `proj::Proj` instance is built
/// per distinct `(from, to)` pair the first time it's needed and
/// cached for the life of the transformer.
pub struct ProjTransformer {
    cache: std::sync::Mutex<std::collections::HashMap<(Crs, Crs), proj::Proj>>,
}

impl Default for ProjTransformer {
    fn default() -> Self {
        Self {
            cache: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl CrsTransformer for ProjTransformer {
    fn transform_point(&self, from: Crs, to: Crs, x: f64, y: f64) -> Result<(f64, f64)> {
        if from == to {
            return Ok((x, y));
        }

        let mut cache = self.cache.lock().expect("proj transform cache poisoned");
        if !cache.contains_key(&(from, to)) {
            let proj = proj::Proj::new_known_crs(&from.proj_string(), &to.proj_string(), None)
                .map_err(|source| error::Error::Proj { source })?;
            cache.insert((from, to), proj);
        }
        let proj = cache.get(&(from, to)).expect("just inserted");
        proj.convert((x, y))
            .map(|(x, y)| (x, y))
            .map_err(|source| error::Error::Transform { source })
    }
}

/// Given a bbox and the resolution a client requested it at, derives
/// a resolution in a different CRS that keeps roughly the same pixel
/// density, by projecting the bbox's diagonal and cross-diagonal
/// corners and comparing their lengths before/after. Used by the
/// reprojecting raster source to choose a source-side read resolution
/// (spec §4.1's grid derivation is the map/export analogue of this).
pub fn suggest_resolution_from_diagonal(
    bbox: crate::bbox::BBox,
    resolution: (f64, f64),
    from: Crs,
    to: Crs,
    transformer: &dyn CrsTransformer,
) -> Result<(f64, f64)> {
    let (x0, y0) = transformer.transform_point(from, to, bbox.min_x, bbox.min_y)?;
    let (x1, y1) = transformer.transform_point(from, to, bbox.max_x, bbox.max_y)?;
    let src_diag = ((bbox.max_x - bbox.min_x).powi(2) + (bbox.max_y - bbox.min_y).powi(2)).sqrt();
    let dst_diag = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    let scale = if src_diag > 0.0 { dst_diag / src_diag } else { 1.0 };
    Ok((resolution.0 * scale, resolution.1 * scale))
}

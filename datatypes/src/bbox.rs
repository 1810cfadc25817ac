use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::error::{self, Result};
use crate::reproject::CrsTransformer;

/// A tuple `(min_x, min_y, max_x, max_y)` in some CRS. `BBox` itself
/// does not carry a `Crs` — callers pair it with one, as `Image`
/// metadata does (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if !(min_x < max_x && min_y < max_y) {
            return Err(error::Error::InvalidBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Reprojects these bounds from `from` to `to`, densifying each
    /// edge with `densify_points` intermediate vertices so that a
    /// curvilinear reprojection of a straight edge is bounded
    /// correctly (spec §4.1, §GLOSSARY "Densify").
    pub fn reproject(
        &self,
        from: Crs,
        to: Crs,
        transformer: &dyn CrsTransformer,
        densify_points: usize,
    ) -> Result<BBox> {
        if from == to {
            return Ok(*self);
        }

        let mut xs = Vec::with_capacity((densify_points + 1) * 4);
        let mut ys = Vec::with_capacity((densify_points + 1) * 4);

        let edges = [
            ((self.min_x, self.min_y), (self.max_x, self.min_y)),
            ((self.max_x, self.min_y), (self.max_x, self.max_y)),
            ((self.max_x, self.max_y), (self.min_x, self.max_y)),
            ((self.min_x, self.max_y), (self.min_x, self.min_y)),
        ];

        for (start, end) in edges {
            for i in 0..=densify_points {
                let t = i as f64 / densify_points as f64;
                let x = start.0 + (end.0 - start.0) * t;
                let y = start.1 + (end.1 - start.1) * t;
                let (px, py) = transformer.transform_point(from, to, x, y)?;
                xs.push(px);
                ys.push(py);
            }
        }

        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        BBox::new(min_x, min_y, max_x, max_y)
    }
}

/// Computes the union of two optional bounds, reprojecting `b` into
/// `a_crs` if its CRS differs (spec §3 invariant 3, §4.1). Either
/// input may be absent; an absent box is the identity element.
pub fn bounds_union(
    a: Option<(BBox, Crs)>,
    b: Option<(BBox, Crs)>,
    transformer: &dyn CrsTransformer,
) -> Result<Option<(BBox, Crs)>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(a), None) => Ok(Some(a)),
        (None, Some(b)) => Ok(Some(b)),
        (Some((a_bbox, a_crs)), Some((b_bbox, b_crs))) => {
            let b_in_a = if b_crs == a_crs {
                b_bbox
            } else {
                b_bbox.reproject(b_crs, a_crs, transformer, 21)?
            };
            let union = BBox::new(
                a_bbox.min_x.min(b_in_a.min_x),
                a_bbox.min_y.min(b_in_a.min_y),
                a_bbox.max_x.max(b_in_a.max_x),
                a_bbox.max_y.max(b_in_a.max_y),
            )?;
            Ok(Some((union, a_crs)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        assert!(BBox::new(10.0, 0.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn union_is_identity_for_absent_operand() {
        let transformer = crate::reproject::ProjTransformer::default();
        let a = (BBox::new(0.0, 0.0, 1.0, 1.0).unwrap(), Crs::EPSG_4326);
        assert_eq!(
            bounds_union(Some(a), None, &transformer).unwrap(),
            Some(a)
        );
        assert_eq!(
            bounds_union(None, Some(a), &transformer).unwrap(),
            Some(a)
        );
    }

    #[test]
    fn union_in_same_crs() {
        let transformer = crate::reproject::ProjTransformer::default();
        let a = (BBox::new(0.0, 0.0, 1.0, 1.0).unwrap(), Crs::EPSG_4326);
        let b = (BBox::new(0.5, 0.5, 2.0, 2.0).unwrap(), Crs::EPSG_4326);
        let (union, crs) = bounds_union(Some(a), Some(b), &transformer)
            .unwrap()
            .unwrap();
        assert_eq!(crs, Crs::EPSG_4326);
        assert_eq!(union.as_tuple(), (0.0, 0.0, 2.0, 2.0));
    }
}

use std::path::Path;

use gdal::{Dataset, Driver, DriverManager};
use geoalgebra_datatypes::{Affine, BBox, Crs, CrsTransformer, DType, Window};

use crate::error::{self, Result};
use crate::image::Image;

/// Per-dataset mask flag (`GMF_PER_DATASET`): one shared mask band
/// covers every raster band, matching `ImageData::mask`'s single
/// `(height, width)` validity plane.
const GMF_PER_DATASET: i32 = 0x02;

/// Creates the output dataset with a band type matching `dtype`
/// rather than always writing 64-bit floats. GDAL's `Int8` raster
/// type isn't exposed by this crate's `GdalType` impls, so `I8` widens
/// to `Int16`, the same widening `DType::widen_for_floor_div` already
/// applies to mixed-width integer arithmetic.
fn create_dataset(
    driver: &Driver,
    dest: &Path,
    width: usize,
    height: usize,
    band_count: usize,
    options: &gdal::raster::RasterCreationOptions,
    dtype: DType,
) -> Result<Dataset> {
    let dataset = match dtype {
        DType::U8 => driver.create_with_band_type_with_options::<u8, _>(dest, width, height, band_count, options)?,
        DType::U16 => driver.create_with_band_type_with_options::<u16, _>(dest, width, height, band_count, options)?,
        DType::U32 => driver.create_with_band_type_with_options::<u32, _>(dest, width, height, band_count, options)?,
        DType::I8 | DType::I16 => {
            driver.create_with_band_type_with_options::<i16, _>(dest, width, height, band_count, options)?
        }
        DType::I32 => driver.create_with_band_type_with_options::<i32, _>(dest, width, height, band_count, options)?,
        DType::F32 => driver.create_with_band_type_with_options::<f32, _>(dest, width, height, band_count, options)?,
        DType::F64 => driver.create_with_band_type_with_options::<f64, _>(dest, width, height, band_count, options)?,
    };
    Ok(dataset)
}

/// Inputs to `export_to_cog` (spec §4.6). `bounds`/`in_crs` default to
/// the image's own bounds/CRS when absent; `scale` is in `crs` meters
/// if `crs` is projected, otherwise in Web Mercator meters.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub bounds: Option<BBox>,
    pub in_crs: Option<Crs>,
    pub crs: Crs,
    pub scale: f64,
    pub window_edge: i64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bounds: None,
            in_crs: None,
            crs: Crs::EPSG_4326,
            scale: 1000.0,
            window_edge: 4096,
        }
    }
}

/// The derived raster grid for an export request (spec §4.1 "Grid
/// derivation"): output pixel dimensions and the affine transform
/// that places `image`'s bounds onto them, in `crs`.
struct Grid {
    width: usize,
    height: usize,
    out_affine: Affine,
    out_bounds: BBox,
}

fn derive_grid(bounds: BBox, bounds_crs: Crs, crs: Crs, scale: f64, transformer: &dyn CrsTransformer) -> Result<Grid> {
    let proj_crs = if crs.is_projected() { crs } else { Crs::EPSG_3857 };
    let proj_bounds = bounds.reproject(bounds_crs, proj_crs, transformer, 21)?;

    let proj_affine = Affine::from_origin(proj_bounds.min_x, proj_bounds.max_y, scale, scale);
    let window = proj_affine.window_from_bounds(&proj_bounds);
    let width = window.width.unsigned_abs() as u32;
    let height = window.height.unsigned_abs() as u32;

    let out_bounds = bounds.reproject(bounds_crs, crs, transformer, 21)?;
    let out_affine = Affine::from_bounds(&out_bounds, width, height);

    Ok(Grid {
        width: width as usize,
        height: height as usize,
        out_affine,
        out_bounds,
    })
}

/// Writes `image` to a Cloud-Optimized GeoTIFF at `dest` (spec §4.6).
/// Streams the output grid window by window (default edge 4096 px) so
/// peak resident memory stays bounded regardless of the export's
/// total extent.
#[tracing::instrument(level = "debug", skip(image, opts, transformer), fields(dest = %dest.display()))]
pub fn export_to_cog(image: &Image, dest: &Path, opts: &ExportOptions, transformer: &dyn CrsTransformer) -> Result<()> {
    let metadata = image.metadata(transformer)?;

    let (bounds, in_crs) = match (opts.bounds, opts.in_crs.or_else(|| metadata.bounds.map(|(_, c)| c))) {
        (Some(bounds), Some(in_crs)) => (bounds, in_crs),
        _ => metadata.bounds.ok_or(error::Error::Boundless)?,
    };

    let grid = derive_grid(bounds, in_crs, opts.crs, opts.scale, transformer)?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let band_count = metadata.band_names.len().max(1);
    let driver = DriverManager::get_driver_by_name("COG")?;

    let creation_options = gdal::raster::RasterCreationOptions::from_iter([
        "COMPRESS=DEFLATE",
        "PREDICTOR=2",
        "BLOCKSIZE=512",
    ]);

    gdal::config::set_config_option("GDAL_TIFF_INTERNAL_MASK", "YES")?;

    let mut dataset = create_dataset(&driver, dest, grid.width, grid.height, band_count, &creation_options, metadata.dtype)?;

    dataset.set_spatial_ref(&gdal::spatial_ref::SpatialRef::from_epsg(opts.crs.code())?)?;
    dataset.set_geo_transform(&affine_to_geo_transform(&grid.out_affine))?;
    dataset.rasterband(1)?.create_mask_band(GMF_PER_DATASET)?;

    let full_window = Window::new(0, 0, grid.width as i64, grid.height as i64);
    for win in full_window.tile(opts.window_edge) {
        tracing::trace!(col_off = win.col_off, row_off = win.row_off, width = win.width, height = win.height, "writing export window");
        let win_bounds = grid.out_affine.bounds_of_window(&win);
        let tile = image.materialize(&win_bounds, &opts.crs, win.height as u32, win.width as u32, transformer)?;
        let win_offset = (win.col_off as isize, win.row_off as isize);
        let win_size = (win.width as usize, win.height as usize);

        for band_idx in 0..band_count {
            let mut band = dataset.rasterband(band_idx + 1)?;
            let plane = tile.data.index_axis(ndarray::Axis(0), band_idx.min(tile.bands() - 1));
            let data: Vec<f64> = plane.iter().copied().collect();
            let mut buffer = gdal::raster::Buffer::new(win_size, data);
            band.write(win_offset, win_size, &mut buffer)?;
        }

        let mut mask_band = dataset.rasterband(1)?.open_mask_band()?;
        let mask_data: Vec<u8> = tile.mask.iter().copied().collect();
        let mut mask_buffer = gdal::raster::Buffer::new(win_size, mask_data);
        mask_band.write(win_offset, win_size, &mut mask_buffer)?;
    }

    let _ = grid.out_bounds;
    Ok(())
}

fn affine_to_geo_transform(affine: &Affine) -> [f64; 6] {
    [affine.a, affine.b, affine.c, affine.d, affine.e, affine.f]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoalgebra_datatypes::ProjTransformer;

    #[test]
    fn boundless_image_without_explicit_bounds_is_rejected() {
        let image = Image::constant(1.0);
        let transformer = ProjTransformer::default();
        let dest = std::env::temp_dir().join("geoalgebra-export-test-boundless.tif");
        let result = export_to_cog(&image, &dest, &ExportOptions::default(), &transformer);
        assert!(matches!(result, Err(error::Error::Boundless)));
    }

    #[test]
    fn grid_derivation_uses_web_mercator_for_geographic_output_crs() {
        let transformer = ProjTransformer::default();
        let bounds = BBox::new(-1.0, -1.0, 1.0, 1.0).unwrap();
        let grid = derive_grid(bounds, Crs::EPSG_4326, Crs::EPSG_4326, 1000.0, &transformer).unwrap();
        assert!(grid.width > 0);
        assert!(grid.height > 0);
    }
}

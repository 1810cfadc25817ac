use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gdal::raster::ResampleAlg;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Array3};

use geoalgebra_datatypes::{
    reproject::suggest_resolution_from_diagonal, tms::TileMatrixSet, BBox, Crs, DType, ImageData,
};

use crate::error::{self, Result};

/// The seam where a concrete raster-file backend plugs into a `Load`
/// node (spec §2: "`Image.load` reads through a RasterSource"). The
/// only implementation this crate ships is GDAL-backed, but graph
/// evaluation and `materialize` never see `Dataset` directly.
pub trait RasterSource: Send + Sync {
    fn band_count(&self) -> usize;
    fn native_dtype(&self) -> DType;
    fn native_bounds(&self) -> (BBox, Crs);
    fn min_zoom(&self) -> u8;
    fn max_zoom(&self) -> u8;

    /// Reads and resamples the source into `height x width` pixels
    /// covering `bounds` in `crs`, reprojecting on the fly if the
    /// source's native CRS differs.
    fn read(&self, bounds: &BBox, crs: Crs, height: usize, width: usize) -> Result<ImageData>;
}

/// Opens a GeoTIFF (or any GDAL raster driver) once at construction
/// time to read its bounds, band count, dtype and zoom range, then
/// reopens the dataset per `read` — GDAL datasets aren't `Sync`, and
/// tile/export reads happen from many worker threads at once.
pub struct GdalRasterSource {
    path: PathBuf,
    band_count: usize,
    dtype: DType,
    bounds: BBox,
    crs: Crs,
    min_zoom: u8,
    max_zoom: u8,
    // Guards nothing but documents that GDAL dataset handles opened
    // from this path are not shared across threads; each `read` opens
    // its own.
    _open_lock: Mutex<()>,
}

impl GdalRasterSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dataset = Dataset::open(&path)?;

        let band_count = dataset.raster_count() as usize;
        let dtype = gdal_type_to_dtype(dataset.rasterband(1)?.band_type());

        let spatial_ref = dataset.spatial_ref()?;
        let crs = crs_from_spatial_ref(&spatial_ref)?;

        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        let bounds = bounds_from_geo_transform(&geo_transform, width, height)?;

        let (min_zoom, max_zoom) = derive_zoom_range(&bounds, crs, width, height)?;

        Ok(Self {
            path,
            band_count,
            dtype,
            bounds,
            crs,
            min_zoom,
            max_zoom,
            _open_lock: Mutex::new(()),
        })
    }
}

impl RasterSource for GdalRasterSource {
    fn band_count(&self) -> usize {
        self.band_count
    }

    fn native_dtype(&self) -> DType {
        self.dtype
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
        let dataset = Dataset::open(&self.path)?;

        let dst_spatial_ref = SpatialRef::from_epsg(crs.code())?;
        let mem_driver = DriverManager::get_driver_by_name("MEM")?;
        let mut dst = mem_driver.create_with_band_type::<f64, _>("", width, height, self.band_count)?;

        let pixel_size_x = bounds.width() / width as f64;
        let pixel_size_y = bounds.height() / height as f64;
        let geo_transform = [
            bounds.min_x,
            pixel_size_x,
            0.0,
            bounds.max_y,
            0.0,
            -pixel_size_y,
        ];
        dst.set_geo_transform(&geo_transform)?;
        dst.set_spatial_ref(&dst_spatial_ref)?;

        gdal::raster::reproject(&dataset, &dst)?;

        let mut data = Array3::<f64>::zeros((self.band_count, height, width));
        let mut mask = Array2::<u8>::from_elem((height, width), 255u8);

        for band_idx in 1..=self.band_count {
            let band = dst.rasterband(band_idx)?;
            let no_data = band.no_data_value();
            let buffer = band.read_as::<f64>(
                (0, 0),
                (width, height),
                (width, height),
                Some(ResampleAlg::Bilinear),
            )?;
            let values = buffer.data();
            for row in 0..height {
                for col in 0..width {
                    let value = values[row * width + col];
                    data[[band_idx - 1, row, col]] = value;
                    if let Some(nodata) = no_data {
                        if value == nodata {
                            mask[[row, col]] = 0;
                        }
                    }
                }
            }
        }

        let band_names = (1..=self.band_count).map(|i| format!("B{i}")).collect();

        Ok(ImageData {
            data,
            mask,
            bounds: *bounds,
            crs,
            band_names,
            dtype: self.dtype,
        })
    }
}

fn gdal_type_to_dtype(band_type: gdal::raster::GdalDataType) -> DType {
    use gdal::raster::GdalDataType;
    match band_type {
        GdalDataType::UInt8 => DType::U8,
        GdalDataType::UInt16 => DType::U16,
        GdalDataType::UInt32 => DType::U32,
        GdalDataType::Int8 => DType::I8,
        GdalDataType::Int16 => DType::I16,
        GdalDataType::Int32 => DType::I32,
        GdalDataType::Float32 => DType::F32,
        _ => DType::F64,
    }
}

fn crs_from_spatial_ref(spatial_ref: &SpatialRef) -> Result<Crs> {
    let code: u32 = spatial_ref
        .auth_code()
        .map_err(|_| error::Error::MalformedGraph {
            reason: "raster source has no EPSG authority code".to_string(),
        })?
        .try_into()
        .map_err(|_| error::Error::MalformedGraph {
            reason: "raster source EPSG code does not fit u32".to_string(),
        })?;
    Ok(Crs::epsg(code))
}

fn bounds_from_geo_transform(geo_transform: &[f64; 6], width: usize, height: usize) -> Result<BBox> {
    let ulx = geo_transform[0];
    let uly = geo_transform[3];
    let lrx = ulx + width as f64 * geo_transform[1] + height as f64 * geo_transform[2];
    let lry = uly + width as f64 * geo_transform[4] + height as f64 * geo_transform[5];

    let min_x = ulx.min(lrx);
    let max_x = ulx.max(lrx);
    let min_y = uly.min(lry);
    let max_y = uly.max(lry);

    Ok(BBox::new(min_x, min_y, max_x, max_y)?)
}

/// Mirrors the source's `_get_minzoom`/`_get_maxzoom`: reproject the
/// native resolution into the Web Mercator tile matrix and find the
/// matching zoom level, then fold in the maximum theoretical overview
/// level (successive halvings until the shorter side fits one tile)
/// for the floor.
fn derive_zoom_range(bounds: &BBox, crs: Crs, width: usize, height: usize) -> Result<(u8, u8)> {
    let tms = TileMatrixSet::web_mercator();
    let transformer = geoalgebra_datatypes::ProjTransformer::default();

    let native_resolution = (bounds.width() / width as f64, bounds.height() / height as f64);
    let (res_x, res_y) =
        suggest_resolution_from_diagonal(*bounds, native_resolution, crs, tms.crs(), &transformer)?;
    let resolution = res_x.max(res_y);

    let max_zoom = tms.zoom_for_resolution(resolution);

    let tile_size = tms.tile_size() as usize;
    let mut overview_level: u32 = 0;
    let mut shorter_side = width.min(height);
    while shorter_side > tile_size {
        shorter_side /= 2;
        overview_level += 1;
    }
    let overview_resolution = resolution * 2f64.powi(overview_level as i32);
    let min_zoom = tms.zoom_for_resolution(overview_resolution);

    Ok((min_zoom.min(max_zoom), max_zoom))
}

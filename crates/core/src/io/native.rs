//! Single-band GeoTIFF reading/writing through the `tiff` crate
//!
//! Georeferencing is carried by ModelPixelScale + ModelTiepoint, the CRS by
//! an EPSG code in the GeoKey directory, and missing cells by the GDAL_NODATA
//! sentinel.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{Cells, ElementKind, GeoTransform, Grid, GridElement};
use ndarray::Array2;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray8, GrayI16, GrayI32, GrayI8,
};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, warn};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Read the first band of a GeoTIFF file
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let file = File::open(path.as_ref())?;
    decode_grid(file)
}

/// Read a GeoTIFF held in memory
pub fn read_grid_from_buffer(data: &[u8]) -> Result<Grid> {
    decode_grid(Cursor::new(data))
}

/// Write a grid as a GeoTIFF file.
///
/// `kind` selects the storage kind (default: the grid's own). Missing cells
/// are stored as that kind's no-data sentinel.
pub fn write_grid<P: AsRef<Path>>(grid: &Grid, path: P, kind: Option<ElementKind>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_grid(grid, kind, file)
}

/// Write a grid into an in-memory GeoTIFF
pub fn write_grid_to_buffer(grid: &Grid, kind: Option<ElementKind>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_grid(grid, kind, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn tiff_error(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn to_cells<T>(buf: Vec<T>, rows: usize, cols: usize) -> Result<Cells>
where
    Array2<T>: Into<Cells>,
{
    Array2::from_shape_vec((rows, cols), buf)
        .map(Into::into)
        .map_err(|_| Error::InvalidDimensions {
            width: cols,
            height: rows,
        })
}

fn decode_grid<R: Read + Seek>(reader: R) -> Result<Grid> {
    let mut decoder = Decoder::new(reader).map_err(tiff_error("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_error("Cannot read dimensions"))?;
    let (rows, cols) = (height as usize, width as usize);

    let result = decoder
        .read_image()
        .map_err(tiff_error("Cannot read image data"))?;

    let cells = match result {
        DecodingResult::U8(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::U16(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::U32(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::U64(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::I8(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::I16(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::I32(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::I64(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::F32(buf) => to_cells(buf, rows, cols)?,
        DecodingResult::F64(buf) => to_cells(buf, rows, cols)?,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let transform = read_geotransform(&mut decoder).unwrap_or_else(|| {
        debug!("no georeferencing tags, using the default transform");
        GeoTransform::default()
    });
    let crs = read_epsg(&mut decoder).map(CRS::from_epsg);
    let grid = Grid::new(cells, crs, transform)?;

    match read_nodata(&mut decoder) {
        Some(nodata) => {
            let values = grid
                .to_f64()
                .mapv(|v| if v == nodata { f64::NAN } else { v });
            grid.with_values(ElementKind::Float32, &values)
        }
        None => Ok(grid),
    }
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder
        .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()?;
    // Header is [version, revision, minor, count]; entries are
    // [key, location, count, value] with location 0 for inline values.
    keys.get(4..)?
        .chunks_exact(4)
        .find(|e| {
            (e[0] == PROJECTED_CS_TYPE_KEY || e[0] == GEOGRAPHIC_TYPE_KEY)
                && e[1] == 0
                && e[3] != 0
                && e[3] != 32767
        })
        .map(|e| e[3] as u32)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA)).ok()?;
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

/// Georeferencing tags shared by every image kind
struct GeoTags {
    scale: [f64; 3],
    tiepoint: [f64; 6],
    geokeys: Vec<u16>,
    nodata: Option<String>,
}

impl GeoTags {
    fn new(grid: &Grid, nodata: Option<f64>) -> Self {
        let gt = grid.transform();
        let crs = grid.crs().filter(|c| c.epsg() <= u16::MAX as u32);
        if grid.crs().is_some() && crs.is_none() {
            warn!(
                crs = %crate::crs::describe(grid.crs()),
                "EPSG code does not fit a GeoKey, only the transform is stored"
            );
        }

        // RasterPixelIsArea, plus the model type and CRS key when known
        let mut entries = vec![[GT_RASTER_TYPE_KEY, 0, 1, 1]];
        if let Some(crs) = crs {
            let code = crs.epsg();
            let (model, key) = if crs.is_geographic() {
                (2, GEOGRAPHIC_TYPE_KEY)
            } else {
                (1, PROJECTED_CS_TYPE_KEY)
            };
            entries.insert(0, [GT_MODEL_TYPE_KEY, 0, 1, model]);
            entries.push([key, 0, 1, code as u16]);
        }
        let mut geokeys = vec![1, 1, 0, entries.len() as u16];
        geokeys.extend(entries.iter().flatten());

        Self {
            scale: [gt.pixel_width, gt.pixel_height.abs(), 0.0],
            tiepoint: [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0],
            geokeys,
            nodata: nodata.map(|v| format!("{}", v)),
        }
    }
}

fn encode_grid<W: Write + Seek>(grid: &Grid, kind: Option<ElementKind>, writer: W) -> Result<()> {
    let kind = kind.unwrap_or_else(|| grid.kind());
    let nodata = kind.nodata();

    let cells = match nodata {
        Some(sentinel) if grid.has_missing() => {
            let values = grid
                .to_f64()
                .mapv(|v| if v.is_nan() { sentinel } else { v });
            Cells::from_f64(kind, &values)
        }
        _ => grid.cells().cast(kind),
    };

    let tags = GeoTags::new(grid, nodata);
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_error("TIFF encoder error"))?;

    match kind {
        ElementKind::Bool => write_band::<Gray8, _>(&mut encoder, &cells.cast(ElementKind::UInt8), &tags),
        ElementKind::UInt8 => write_band::<Gray8, _>(&mut encoder, &cells, &tags),
        ElementKind::UInt16 => write_band::<Gray16, _>(&mut encoder, &cells, &tags),
        ElementKind::UInt32 => write_band::<Gray32, _>(&mut encoder, &cells, &tags),
        ElementKind::Int8 => write_band::<GrayI8, _>(&mut encoder, &cells, &tags),
        ElementKind::Int16 => write_band::<GrayI16, _>(&mut encoder, &cells, &tags),
        ElementKind::Int32 => write_band::<GrayI32, _>(&mut encoder, &cells, &tags),
        ElementKind::Float32 => write_band::<Gray32Float, _>(&mut encoder, &cells, &tags),
    }
}

fn write_band<C, W>(encoder: &mut TiffEncoder<W>, cells: &Cells, tags: &GeoTags) -> Result<()>
where
    C: ColorType,
    C::Inner: GridElement,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let array = cells.as_array::<C::Inner>().ok_or_else(|| {
        Error::UnsupportedDataType(format!("{} cells cannot be stored as this image type", cells.kind()))
    })?;
    let (rows, cols) = array.dim();
    let data: Vec<C::Inner> = array.iter().copied().collect();

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(tiff_error("Cannot create TIFF image"))?;

    let dir = image.encoder();
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &tags.scale[..])
        .map_err(tiff_error("Cannot write scale tag"))?;
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &tags.tiepoint[..])
        .map_err(tiff_error("Cannot write tiepoint tag"))?;
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), tags.geokeys.as_slice())
        .map_err(tiff_error("Cannot write geokey tag"))?;
    if let Some(nodata) = &tags.nodata {
        dir.write_tag(Tag::Unknown(GDAL_NODATA), nodata.as_str())
            .map_err(tiff_error("Cannot write nodata tag"))?;
    }

    image
        .write_data(&data)
        .map_err(tiff_error("Cannot write image data"))
}

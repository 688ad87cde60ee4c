//! Multi-page TIFF volume I/O.
//!
//! One page per depth slice. Reading accepts any single-channel integer or
//! float sample type; writing produces `Gray8` or `Gray32Float` pages.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::Axis;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{Result, SegmentationError};
use crate::volume::{Segmentation, Volume};

/// Read a grayscale multi-page TIFF into a `(depth, height, width)` volume.
pub fn read_volume(path: &Path) -> Result<Volume> {
    let mut decoder =
        Decoder::new(BufReader::new(File::open(path)?))?.with_limits(Limits::unlimited());
    let mut data: Vec<f32> = Vec::new();
    let mut depth = 0usize;
    let mut plane: Option<(u32, u32)> = None;
    loop {
        let dims = decoder.dimensions()?;
        match plane {
            None => plane = Some(dims),
            Some(first) if first != dims => {
                return Err(SegmentationError::InvalidVolume(format!(
                    "{}: page {depth} is {}x{}, expected {}x{}",
                    path.display(),
                    dims.0,
                    dims.1,
                    first.0,
                    first.1
                )));
            }
            Some(_) => {}
        }
        let color = decoder.colortype()?;
        if !matches!(color, tiff::ColorType::Gray(_)) {
            return Err(SegmentationError::InvalidVolume(format!(
                "{}: page {depth} has unsupported color type {color:?}",
                path.display()
            )));
        }
        append_samples(&mut data, decoder.read_image()?)?;
        depth += 1;
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    let (w, h) = plane.unwrap_or((0, 0));
    tracing::debug!("read {} ({depth} x {h} x {w})", path.display());
    Ok(Volume::from_shape_vec((depth, h as usize, w as usize), data)?)
}

fn append_samples(data: &mut Vec<f32>, page: DecodingResult) -> Result<()> {
    match page {
        DecodingResult::U8(buf) => data.extend(buf.into_iter().map(f32::from)),
        DecodingResult::U16(buf) => data.extend(buf.into_iter().map(f32::from)),
        DecodingResult::U32(buf) => data.extend(buf.into_iter().map(|v| v as f32)),
        DecodingResult::I8(buf) => data.extend(buf.into_iter().map(f32::from)),
        DecodingResult::I16(buf) => data.extend(buf.into_iter().map(f32::from)),
        DecodingResult::I32(buf) => data.extend(buf.into_iter().map(|v| v as f32)),
        DecodingResult::F32(buf) => data.extend(buf),
        DecodingResult::F64(buf) => data.extend(buf.into_iter().map(|v| v as f32)),
        _ => {
            return Err(SegmentationError::InvalidVolume(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    }
    Ok(())
}

/// Write a byte volume as `Gray8` pages.
pub fn write_segmentation(path: &Path, volume: &Segmentation) -> Result<()> {
    let (_, h, w) = volume.dim();
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    for slice in volume.axis_iter(Axis(0)) {
        let page: Vec<u8> = slice.iter().copied().collect();
        encoder.write_image::<colortype::Gray8>(w as u32, h as u32, &page)?;
    }
    Ok(())
}

/// Write a float volume as `Gray32Float` pages.
pub fn write_float_volume(path: &Path, volume: &Volume) -> Result<()> {
    let (_, h, w) = volume.dim();
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    for slice in volume.axis_iter(Axis(0)) {
        let page: Vec<f32> = slice.iter().copied().collect();
        encoder.write_image::<colortype::Gray32Float>(w as u32, h as u32, &page)?;
    }
    Ok(())
}

/// Destination for the final segmentation in save mode.
pub trait VolumeWriter: Send + Sync {
    fn write(&self, path: &Path, segmentation: &Segmentation) -> Result<()>;
}

/// Writes multi-page `Gray8` TIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffVolumeWriter;

impl VolumeWriter for TiffVolumeWriter {
    fn write(&self, path: &Path, segmentation: &Segmentation) -> Result<()> {
        write_segmentation(path, segmentation)
    }
}

// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! DNG packing: turn a decoded sensor frame plus container metadata
//! into a single-IFD, uncompressed, single-strip DNG byte buffer.

use std::io::Cursor;

use crate::container::{ContainerMetadata, FrameMetadata};
use crate::formats::tiff::{CompressionMethod, PhotometricInterpretation, PlanarConfiguration, Rational, Result, SRational, TiffWriter};
use crate::tags::{DngTag, TiffCommonTag};

pub const DNG_VERSION: [u8; 4] = [1, 4, 0, 0];
pub const DNG_BACKWARD_VERSION: [u8; 4] = [1, 1, 0, 0];

/// EXIF light source codes used as DNG calibration illuminants.
const ILLUMINANT_D65: u16 = 21;
const ILLUMINANT_A: u16 = 17;

/// Serialize one decoded frame as a DNG.
///
/// `samples` is the row-major 16-bit Bayer image of exactly
/// `width * height` values. All frames of one capture produce
/// equal-length output because strip size and tag payloads only depend
/// on values that are invariant within a capture.
pub fn pack_dng(meta: &ContainerMetadata, frame: &FrameMetadata, samples: &[u16]) -> Result<Vec<u8>> {
  let mut buffer = Cursor::new(Vec::new());
  let mut tiff = TiffWriter::new(&mut buffer)?;
  let mut ifd = tiff.new_directory();

  let strip_offset = tiff.write_data_u16_le(samples)?;

  ifd.add_tag(TiffCommonTag::NewSubFileType, 0_u32);
  ifd.add_tag(TiffCommonTag::ImageWidth, frame.width);
  ifd.add_tag(TiffCommonTag::ImageLength, frame.height);
  ifd.add_tag(TiffCommonTag::BitsPerSample, 16_u16);
  ifd.add_tag(TiffCommonTag::Compression, CompressionMethod::None);
  ifd.add_tag(TiffCommonTag::Photometric, PhotometricInterpretation::CFA);
  if let Some(orientation) = meta.orientation {
    ifd.add_tag(TiffCommonTag::Orientation, orientation);
  }
  ifd.add_tag(TiffCommonTag::SamplesPerPixel, 1_u16);
  ifd.add_tag(TiffCommonTag::RowsPerStrip, frame.height);
  ifd.add_tag(TiffCommonTag::StripOffsets, strip_offset);
  ifd.add_tag(TiffCommonTag::StripByteCounts, (samples.len() * 2) as u32);
  ifd.add_tag(TiffCommonTag::PlanarConfig, PlanarConfiguration::Chunky);
  if let Some(software) = &meta.software {
    ifd.add_tag(TiffCommonTag::Software, software);
  }
  ifd.add_tag(TiffCommonTag::CFARepeatPatternDim, [2_u16, 2]);
  ifd.add_tag(TiffCommonTag::CFAPattern, meta.cfa_pattern());

  ifd.add_tag(DngTag::DNGVersion, DNG_VERSION);
  ifd.add_tag(DngTag::DNGBackwardVersion, DNG_BACKWARD_VERSION);
  ifd.add_tag(DngTag::UniqueCameraModel, "MotionCam");
  // CFALayout 1 = rectangular
  ifd.add_tag(DngTag::CFALayout, 1_u16);
  ifd.add_tag(DngTag::BlackLevelRepeatDim, [2_u16, 2]);
  ifd.add_tag(DngTag::BlackLevel, meta.black_level_u16().as_slice());
  ifd.add_tag(DngTag::WhiteLevel, meta.white_level.round() as u32);
  ifd.add_tag(DngTag::ColorMatrix1, matrix_to_tiff_value(&meta.color_matrix1, 10_000).as_slice());
  ifd.add_tag(DngTag::ColorMatrix2, matrix_to_tiff_value(&meta.color_matrix2, 10_000).as_slice());
  ifd.add_tag(DngTag::ForwardMatrix1, matrix_to_tiff_value(&meta.forward_matrix1, 10_000).as_slice());
  ifd.add_tag(DngTag::ForwardMatrix2, matrix_to_tiff_value(&meta.forward_matrix2, 10_000).as_slice());
  ifd.add_tag(DngTag::AsShotNeutral, neutral_to_tiff_value(&frame.as_shot_neutral).as_slice());
  ifd.add_tag(DngTag::CalibrationIlluminant1, ILLUMINANT_D65);
  ifd.add_tag(DngTag::CalibrationIlluminant2, ILLUMINANT_A);
  ifd.add_tag(DngTag::ActiveArea, [0_u32, 0, frame.height, frame.width]);

  tiff.build(ifd)?;
  Ok(buffer.into_inner())
}

fn matrix_to_tiff_value(matrix: &[f32], d: i32) -> Vec<SRational> {
  matrix.iter().map(|a| SRational::new((a * d as f32) as i32, d)).collect()
}

fn neutral_to_tiff_value(neutral: &[f32; 3]) -> Vec<Rational> {
  neutral.iter().map(|a| Rational::new_f32(*a, 1_000_000)).collect()
}

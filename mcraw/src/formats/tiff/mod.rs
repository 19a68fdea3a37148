// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Minimal TIFF writing support for DNG output. Always little-endian,
//! single byte order, no reading.

use thiserror::Error;

pub mod value;
pub mod writer;

pub use value::{Rational, SRational, TiffAscii, Value};
pub use writer::{DirectoryWriter, TiffWriter};

pub(crate) const TIFF_MAGIC: u16 = 42;

#[allow(clippy::upper_case_acronyms)]
pub enum CompressionMethod {
  None = 1,
  LZW = 5,
  ModernJPEG = 7,
  Deflate = 8,
}

impl From<CompressionMethod> for Value {
  fn from(value: CompressionMethod) -> Self {
    Value::Short(vec![value as u16])
  }
}

#[allow(clippy::upper_case_acronyms)]
pub enum PhotometricInterpretation {
  BlackIsZero = 1,
  RGB = 2,
  // Defined by DNG
  CFA = 32803,
  LinearRaw = 34892,
}

impl From<PhotometricInterpretation> for Value {
  fn from(value: PhotometricInterpretation) -> Self {
    Value::Short(vec![value as u16])
  }
}

pub enum PlanarConfiguration {
  Chunky = 1,
  Planar = 2,
}

impl From<PlanarConfiguration> for Value {
  fn from(value: PlanarConfiguration) -> Self {
    Value::Short(vec![value as u16])
  }
}

/// Error variants for the writer
#[derive(Debug, Error)]
pub enum TiffError {
  /// Overflow of input, size constraints...
  #[error("Overflow error: {}", _0)]
  Overflow(String),

  #[error("General error: {}", _0)]
  General(String),

  /// Error on internal cursor type
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

/// Result type for writer results
pub type Result<T> = std::result::Result<T, TiffError>;

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use crate::tags::TiffCommonTag;

  use super::*;

  #[test]
  fn write_tiff_file_basic() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut output = Cursor::new(Vec::new());
    let mut tiff = TiffWriter::new(&mut output)?;

    let mut dir = tiff.new_directory();
    dir.add_tag(TiffCommonTag::ImageWidth, 64_u32);
    dir.add_tag(TiffCommonTag::ImageLength, 4_u32);
    dir.add_tag(TiffCommonTag::BitsPerSample, 16_u16);
    dir.add_tag(TiffCommonTag::Software, "mcraw");
    tiff.build(dir)?;

    let bytes = output.into_inner();
    assert_eq!(&bytes[0..2], b"II");
    assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), TIFF_MAGIC);
    let ifd0 = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    // Four entries in ascending tag order.
    assert_eq!(u16::from_le_bytes([bytes[ifd0], bytes[ifd0 + 1]]), 4);
    let first_tag = u16::from_le_bytes([bytes[ifd0 + 2], bytes[ifd0 + 3]]);
    assert_eq!(first_tag, TiffCommonTag::ImageWidth as u16);
    Ok(())
  }

  #[test]
  fn empty_directory_is_rejected() {
    let mut output = Cursor::new(Vec::new());
    let mut tiff = TiffWriter::new(&mut output).unwrap();
    let dir = tiff.new_directory();
    assert!(tiff.build(dir).is_err());
  }
}

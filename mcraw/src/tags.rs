// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! TIFF and DNG tag identifiers used by the DNG packer.

/// Marker trait for tag enums accepted by the directory writer.
pub trait TiffTag: Into<u16> + Copy {}

/// Baseline TIFF / TIFF-EP tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TiffCommonTag {
  NewSubFileType = 0x00fe,
  ImageWidth = 0x0100,
  ImageLength = 0x0101,
  BitsPerSample = 0x0102,
  Compression = 0x0103,
  Photometric = 0x0106,
  StripOffsets = 0x0111,
  Orientation = 0x0112,
  SamplesPerPixel = 0x0115,
  RowsPerStrip = 0x0116,
  StripByteCounts = 0x0117,
  PlanarConfig = 0x011c,
  Software = 0x0131,
  CFARepeatPatternDim = 0x828d,
  CFAPattern = 0x828e,
}

/// DNG extension tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DngTag {
  DNGVersion = 50706,
  DNGBackwardVersion = 50707,
  UniqueCameraModel = 50708,
  CFALayout = 50711,
  BlackLevelRepeatDim = 50713,
  BlackLevel = 50714,
  WhiteLevel = 50717,
  ColorMatrix1 = 50721,
  ColorMatrix2 = 50722,
  AsShotNeutral = 50728,
  CalibrationIlluminant1 = 50778,
  CalibrationIlluminant2 = 50779,
  ActiveArea = 50829,
  ForwardMatrix1 = 50964,
  ForwardMatrix2 = 50965,
}

impl From<TiffCommonTag> for u16 {
  fn from(tag: TiffCommonTag) -> Self {
    tag as u16
  }
}

impl From<DngTag> for u16 {
  fn from(tag: DngTag) -> Self {
    tag as u16
  }
}

impl TiffTag for TiffCommonTag {}
impl TiffTag for DngTag {}

// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

use serde::Deserialize;

/// Camera characterization snapshot stored once per container.
///
/// The JSON keys follow the documents the camera app writes, including
/// the historical `sensorArrangment` spelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetadata {
  pub black_level: Vec<f32>,
  pub white_level: f64,
  #[serde(rename = "sensorArrangment")]
  pub sensor_arrangement: String,
  pub color_matrix1: Vec<f32>,
  pub color_matrix2: Vec<f32>,
  pub forward_matrix1: Vec<f32>,
  pub forward_matrix2: Vec<f32>,
  #[serde(default)]
  pub orientation: Option<u16>,
  #[serde(default)]
  pub software: Option<String>,
  #[serde(default)]
  pub audio_sample_rate: Option<u32>,
  #[serde(default)]
  pub audio_channels: Option<u16>,
}

impl ContainerMetadata {
  /// 2x2 CFA pattern with the DNG color coding R=0, G=1, B=2. Unknown
  /// arrangements map to RGGB.
  pub fn cfa_pattern(&self) -> [u8; 4] {
    match self.sensor_arrangement.as_str() {
      "rggb" => [0, 1, 1, 2],
      "bggr" => [2, 1, 1, 0],
      "grbg" => [1, 0, 2, 1],
      "gbrg" => [1, 2, 0, 1],
      _ => [0, 1, 1, 2],
    }
  }

  /// Per-CFA black levels rounded to the nearest integer.
  pub fn black_level_u16(&self) -> Vec<u16> {
    self.black_level.iter().map(|v| v.round() as u16).collect()
  }
}

/// Metadata attached to a single captured frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
  pub width: u32,
  pub height: u32,
  pub as_shot_neutral: [f32; 3],
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cfa_pattern_mapping() {
    let mut meta: ContainerMetadata = serde_json::from_str(
      r#"{
        "blackLevel": [63.7, 64.2, 64.0, 64.0],
        "whiteLevel": 1023,
        "sensorArrangment": "bggr",
        "colorMatrix1": [1,0,0,0,1,0,0,0,1],
        "colorMatrix2": [1,0,0,0,1,0,0,0,1],
        "forwardMatrix1": [1,0,0,0,1,0,0,0,1],
        "forwardMatrix2": [1,0,0,0,1,0,0,0,1]
      }"#,
    )
    .unwrap();
    assert_eq!(meta.cfa_pattern(), [2, 1, 1, 0]);
    assert_eq!(meta.black_level_u16(), vec![64, 64, 64, 64]);
    assert_eq!(meta.orientation, None);

    meta.sensor_arrangement = "grbg".to_string();
    assert_eq!(meta.cfa_pattern(), [1, 0, 2, 1]);
    meta.sensor_arrangement = "gbrg".to_string();
    assert_eq!(meta.cfa_pattern(), [1, 2, 0, 1]);
    meta.sensor_arrangement = "unexpected".to_string();
    assert_eq!(meta.cfa_pattern(), [0, 1, 1, 2]);
  }

  #[test]
  fn frame_metadata_parses() {
    let meta: FrameMetadata = serde_json::from_str(r#"{"width": 4096, "height": 2176, "asShotNeutral": [0.43, 1.0, 0.61]}"#).unwrap();
    assert_eq!(meta.width, 4096);
    assert_eq!(meta.height, 2176);
    assert!((meta.as_shot_neutral[2] - 0.61).abs() < f32::EPSILON);
  }
}

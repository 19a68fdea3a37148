// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Synthetic `.mcraw` capture files for tests.

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

const CONTAINER_META: &str = r#"{
  "blackLevel": [64, 64, 64, 64],
  "whiteLevel": 1023,
  "sensorArrangment": "rggb",
  "colorMatrix1": [0.9, -0.2, -0.1, -0.4, 1.2, 0.2, -0.1, 0.2, 0.5],
  "colorMatrix2": [0.8, -0.2, -0.1, -0.4, 1.3, 0.2, -0.1, 0.2, 0.6],
  "forwardMatrix1": [0.6, 0.2, 0.1, 0.2, 0.9, -0.1, 0.0, 0.0, 0.8],
  "forwardMatrix2": [0.7, 0.2, 0.1, 0.2, 0.8, -0.1, 0.0, 0.0, 0.9],
  "software": "MotionCam 1.0",
  "audioSampleRate": 48000,
  "audioChannels": 2
}"#;

/// Metadata stream of raw 16-bit blocks (header nibble 15).
fn encode_stream(values: &[u16]) -> Vec<u8> {
  let mut out = Vec::new();
  out.write_u32::<LittleEndian>(values.len() as u32).unwrap();
  for chunk in values.chunks(64) {
    out.push(0xf0);
    out.push(0x00);
    let mut block = [0u16; 64];
    block[..chunk.len()].copy_from_slice(chunk);
    for v in block {
      out.write_u16::<LittleEndian>(v).unwrap();
    }
  }
  out
}

/// 64x4 frame of zero-width payload blocks painted by references.
fn encode_frame(refs: &[u16; 4]) -> Vec<u8> {
  let bits_stream = encode_stream(&[0; 4]);
  let refs_stream = encode_stream(refs);

  let mut out = Vec::new();
  out.write_u32::<LittleEndian>(64).unwrap();
  out.write_u32::<LittleEndian>(4).unwrap();
  out.write_u32::<LittleEndian>(16).unwrap();
  out.write_u32::<LittleEndian>(16 + bits_stream.len() as u32).unwrap();
  out.extend_from_slice(&bits_stream);
  out.extend_from_slice(&refs_stream);
  out
}

fn push_chunk(out: &mut Vec<u8>, tag: u8, payload: &[u8]) {
  out.push(tag);
  out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
  out.extend_from_slice(payload);
}

/// Write a capture with the given number of 64x4 frames and optional
/// stereo audio to a temp file.
pub fn capture_file(frames: usize, with_audio: bool) -> NamedTempFile {
  let mut data = Vec::new();
  data.extend_from_slice(b"MCRAW\0");
  data.write_u16::<LittleEndian>(1).unwrap();
  push_chunk(&mut data, 0x01, CONTAINER_META.as_bytes());

  for i in 0..frames {
    let encoded = encode_frame(&[10 + i as u16, 20, 30, 40]);
    let meta = r#"{"width": 64, "height": 4, "asShotNeutral": [0.5, 1.0, 0.62]}"#;
    let mut payload = Vec::new();
    payload.write_i64::<LittleEndian>(1000 * (i as i64 + 1)).unwrap();
    payload.write_u32::<LittleEndian>(meta.len() as u32).unwrap();
    payload.extend_from_slice(meta.as_bytes());
    payload.extend_from_slice(&encoded);
    push_chunk(&mut data, 0x02, &payload);
  }

  if with_audio {
    let mut payload = Vec::new();
    payload.write_i64::<LittleEndian>(1000).unwrap();
    for s in [100i16, -100, 200, -200] {
      payload.write_i16::<LittleEndian>(s).unwrap();
    }
    push_chunk(&mut data, 0x03, &payload);
  }

  let file = NamedTempFile::new().expect("temp file");
  std::fs::write(file.path(), &data).expect("write capture");
  file
}

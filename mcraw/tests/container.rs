// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! End-to-end container tests against synthetic in-memory captures.

use std::io::Cursor;

use byteorder::{LittleEndian, WriteBytesExt};
use mcraw::{ContainerError, Decoder};

const CONTAINER_META: &str = r#"{
  "blackLevel": [64, 64, 64, 64],
  "whiteLevel": 1023,
  "sensorArrangment": "rggb",
  "colorMatrix1": [0.9, -0.2, -0.1, -0.4, 1.2, 0.2, -0.1, 0.2, 0.5],
  "colorMatrix2": [0.8, -0.2, -0.1, -0.4, 1.3, 0.2, -0.1, 0.2, 0.6],
  "forwardMatrix1": [0.6, 0.2, 0.1, 0.2, 0.9, -0.1, 0.0, 0.0, 0.8],
  "forwardMatrix2": [0.7, 0.2, 0.1, 0.2, 0.8, -0.1, 0.0, 0.0, 0.9],
  "audioSampleRate": 44100,
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

/// Encoded frame of zero-width payload blocks; the image content comes
/// entirely from the per-block references.
fn encode_frame(enc_w: u32, enc_h: u32, refs: &[u16]) -> Vec<u8> {
  let blocks = (enc_w as usize / 64) * (enc_h as usize / 4) * 4;
  assert_eq!(refs.len(), blocks);
  let bits_stream = encode_stream(&vec![0u16; blocks]);
  let refs_stream = encode_stream(refs);

  let mut out = Vec::new();
  out.write_u32::<LittleEndian>(enc_w).unwrap();
  out.write_u32::<LittleEndian>(enc_h).unwrap();
  out.write_u32::<LittleEndian>(16).unwrap();
  out.write_u32::<LittleEndian>(16 + bits_stream.len() as u32).unwrap();
  out.extend_from_slice(&bits_stream);
  out.extend_from_slice(&refs_stream);
  out
}

fn frame_meta_json(width: u32, height: u32) -> String {
  format!(r#"{{"width": {}, "height": {}, "asShotNeutral": [0.5, 1.0, 0.62]}}"#, width, height)
}

fn push_chunk(out: &mut Vec<u8>, tag: u8, payload: &[u8]) {
  out.push(tag);
  out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
  out.extend_from_slice(payload);
}

fn push_frame(out: &mut Vec<u8>, timestamp: i64, width: u32, height: u32, encoded: &[u8]) {
  let meta = frame_meta_json(width, height);
  let mut payload = Vec::new();
  payload.write_i64::<LittleEndian>(timestamp).unwrap();
  payload.write_u32::<LittleEndian>(meta.len() as u32).unwrap();
  payload.extend_from_slice(meta.as_bytes());
  payload.extend_from_slice(encoded);
  push_chunk(out, 0x02, &payload);
}

fn push_audio(out: &mut Vec<u8>, timestamp: i64, samples: &[i16]) {
  let mut payload = Vec::new();
  payload.write_i64::<LittleEndian>(timestamp).unwrap();
  for s in samples {
    payload.write_i16::<LittleEndian>(*s).unwrap();
  }
  push_chunk(out, 0x03, &payload);
}

fn preamble() -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(b"MCRAW\0");
  out.write_u16::<LittleEndian>(1).unwrap();
  out
}

fn synthetic_capture() -> Vec<u8> {
  let mut out = preamble();
  push_chunk(&mut out, 0x01, CONTAINER_META.as_bytes());
  let encoded = encode_frame(64, 4, &[10, 20, 30, 40]);
  push_frame(&mut out, 1000, 64, 4, &encoded);
  push_frame(&mut out, 2000, 64, 4, &encoded);
  push_frame(&mut out, 3000, 64, 4, &encoded);
  push_audio(&mut out, 1000, &[1, -1, 2, -2]);
  push_audio(&mut out, 2000, &[3, -3]);
  out
}

#[test]
fn scan_indexes_frames_in_order() {
  let decoder = Decoder::new(Cursor::new(synthetic_capture())).unwrap();
  assert_eq!(decoder.frames(), &[1000, 2000, 3000]);
  assert_eq!(decoder.container_metadata().sensor_arrangement, "rggb");
  assert_eq!(decoder.audio_sample_rate_hz(), 44_100);
  assert_eq!(decoder.num_audio_channels(), 2);
}

#[test]
fn load_frame_decodes_reference_pattern() {
  let mut decoder = Decoder::new(Cursor::new(synthetic_capture())).unwrap();
  let (samples, meta) = decoder.load_frame(2000).unwrap();
  assert_eq!(meta.width, 64);
  assert_eq!(meta.height, 4);
  assert_eq!(samples.len(), 64 * 4);
  for x in (0..64).step_by(2) {
    assert_eq!(samples[x], 10);
    assert_eq!(samples[x + 1], 20);
    assert_eq!(samples[64 + x], 30);
    assert_eq!(samples[64 + x + 1], 40);
  }
}

#[test]
fn unknown_timestamp_is_not_found() {
  let mut decoder = Decoder::new(Cursor::new(synthetic_capture())).unwrap();
  assert!(matches!(decoder.load_frame(9999), Err(ContainerError::FrameNotFound(9999))));
}

#[test]
fn audio_chunks_roundtrip() {
  let mut decoder = Decoder::new(Cursor::new(synthetic_capture())).unwrap();
  let chunks = decoder.load_audio().unwrap();
  assert_eq!(chunks.len(), 2);
  assert_eq!(chunks[0].samples, vec![1, -1, 2, -2]);
  assert_eq!(chunks[1].samples, vec![3, -3]);
}

#[test]
fn decoded_frame_packs_as_dng() {
  let mut decoder = Decoder::new(Cursor::new(synthetic_capture())).unwrap();
  let meta = decoder.container_metadata().clone();
  let (samples, frame_meta) = decoder.load_frame(1000).unwrap();
  let blob = mcraw::dng::pack_dng(&meta, &frame_meta, &samples).unwrap();
  assert_eq!(&blob[0..2], b"II");
  assert_eq!(u16::from_le_bytes([blob[2], blob[3]]), 42);
}

#[test]
fn bad_magic_is_rejected() {
  let mut data = synthetic_capture();
  data[0] = b'X';
  assert!(matches!(Decoder::new(Cursor::new(data)), Err(ContainerError::InvalidContainer(_))));
}

#[test]
fn unsupported_version_is_rejected() {
  let mut data = synthetic_capture();
  data[6] = 9;
  assert!(matches!(Decoder::new(Cursor::new(data)), Err(ContainerError::InvalidContainer(_))));
}

#[test]
fn truncated_metadata_chunk_fails() {
  let mut out = preamble();
  out.push(0x01);
  out.write_u32::<LittleEndian>(100).unwrap();
  out.extend_from_slice(b"{}"); // far less than declared
  assert!(matches!(Decoder::new(Cursor::new(out)), Err(ContainerError::Io(_))));
}

#[test]
fn missing_metadata_chunk_fails() {
  let mut out = preamble();
  let encoded = encode_frame(64, 4, &[0, 0, 0, 0]);
  push_frame(&mut out, 1000, 64, 4, &encoded);
  assert!(matches!(Decoder::new(Cursor::new(out)), Err(ContainerError::InvalidContainer(_))));
}

#[test]
fn mixed_dimensions_are_rejected() {
  let mut out = preamble();
  push_chunk(&mut out, 0x01, CONTAINER_META.as_bytes());
  push_frame(&mut out, 1000, 64, 4, &encode_frame(64, 4, &[0; 4]));
  push_frame(&mut out, 2000, 64, 8, &encode_frame(64, 8, &[0; 8]));
  assert!(matches!(Decoder::new(Cursor::new(out)), Err(ContainerError::MixedDimensions)));
}

#[test]
fn unknown_chunk_tags_are_skipped() {
  let mut out = preamble();
  push_chunk(&mut out, 0x7f, b"future extension");
  push_chunk(&mut out, 0x01, CONTAINER_META.as_bytes());
  push_frame(&mut out, 1000, 64, 4, &encode_frame(64, 4, &[0; 4]));
  let decoder = Decoder::new(Cursor::new(out)).unwrap();
  assert_eq!(decoder.frames(), &[1000]);
}

#[test]
fn malformed_frame_payload_surfaces_codec_error() {
  let mut out = preamble();
  push_chunk(&mut out, 0x01, CONTAINER_META.as_bytes());
  let mut encoded = encode_frame(64, 4, &[0; 4]);
  encoded.truncate(20); // cut into the bit-width stream
  push_frame(&mut out, 1000, 64, 4, &encoded);
  let mut decoder = Decoder::new(Cursor::new(out)).unwrap();
  assert!(matches!(decoder.load_frame(1000), Err(ContainerError::Codec(_))));
}

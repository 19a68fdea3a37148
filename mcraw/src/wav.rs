// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! WAV serialization for the container's PCM audio chunks.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::container::AudioChunk;

const RIFF_HEADER_LEN: usize = 44;

/// Assemble the audio chunks into a canonical 16-bit PCM RIFF/WAVE
/// buffer. Samples stay in chunk order and keep their interleaving.
/// No audio yields an empty buffer, not an empty WAV file.
pub fn write_wav(chunks: &[AudioChunk], sample_rate_hz: u32, channels: u16) -> std::io::Result<Vec<u8>> {
  let total_samples: usize = chunks.iter().map(|c| c.samples.len()).sum();
  if total_samples == 0 {
    return Ok(Vec::new());
  }
  let data_len = (total_samples * 2) as u32;
  let block_align = channels * 2;

  let mut out = Vec::with_capacity(RIFF_HEADER_LEN + data_len as usize);
  out.write_all(b"RIFF")?;
  out.write_u32::<LittleEndian>(36 + data_len)?;
  out.write_all(b"WAVE")?;

  out.write_all(b"fmt ")?;
  out.write_u32::<LittleEndian>(16)?;
  out.write_u16::<LittleEndian>(1)?; // PCM
  out.write_u16::<LittleEndian>(channels)?;
  out.write_u32::<LittleEndian>(sample_rate_hz)?;
  out.write_u32::<LittleEndian>(sample_rate_hz * u32::from(block_align))?;
  out.write_u16::<LittleEndian>(block_align)?;
  out.write_u16::<LittleEndian>(16)?; // bits per sample

  out.write_all(b"data")?;
  out.write_u32::<LittleEndian>(data_len)?;
  for chunk in chunks {
    for sample in &chunk.samples {
      out.write_i16::<LittleEndian>(*sample)?;
    }
  }
  Ok(out)
}

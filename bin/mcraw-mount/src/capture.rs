// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! One mounted `.mcraw` capture: the opened container, its metadata
//! snapshot, the derived file names and the packed-frame cache.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use mcraw::{dng, wav, ContainerMetadata, Decoder, Timestamp};

use crate::cache::FrameCache;
use crate::AppError;

/// Immutable after open, except for the cache behind its mutex. The
/// container decoder seeks its reader, so it sits behind a mutex too.
pub struct Capture {
  base_name: String,
  decoder: Mutex<Decoder<BufReader<File>>>,
  metadata: ContainerMetadata,
  frames: Vec<Timestamp>,
  filenames: Vec<String>,
  wav: Vec<u8>,
  cache: Mutex<FrameCache>,
}

impl Capture {
  /// Open a container and prepare it for serving: index frames, build
  /// the WAV buffer and warm the first frame so the uniform file size
  /// is known before any filesystem traffic.
  pub fn open(path: &Path, cache_frames: usize) -> Result<Self, AppError> {
    let base_name = path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .ok_or_else(|| AppError::General(format!("no usable file name in {}", path.display())))?;

    let mut decoder = Decoder::open(path)?;
    let metadata = decoder.container_metadata().clone();
    let frames = decoder.frames().to_vec();
    let filenames: Vec<String> = (0..frames.len()).map(|i| frame_name(&base_name, i)).collect();
    debug!("[{}] {} frames", path.display(), frames.len());

    // Audio problems only cost the WAV file, never the mount.
    let wav = match decoder.load_audio() {
      Ok(chunks) => wav::write_wav(&chunks, decoder.audio_sample_rate_hz(), decoder.num_audio_channels())?,
      Err(err) => {
        warn!("[{}] audio extraction failed: {}", path.display(), err);
        Vec::new()
      }
    };

    let capture = Self {
      base_name,
      decoder: Mutex::new(decoder),
      metadata,
      frames,
      filenames,
      wav,
      cache: Mutex::new(FrameCache::new(cache_frames)),
    };

    if !capture.filenames.is_empty() {
      capture.frame_blob(0)?;
    }
    Ok(capture)
  }

  pub fn base_name(&self) -> &str {
    &self.base_name
  }

  pub fn filenames(&self) -> &[String] {
    &self.filenames
  }

  pub fn wav_name(&self) -> String {
    format!("{}.wav", self.base_name)
  }

  pub fn has_audio(&self) -> bool {
    !self.wav.is_empty()
  }

  pub fn wav(&self) -> &[u8] {
    &self.wav
  }

  pub fn uniform_size(&self) -> Option<u64> {
    self.cache.lock().unwrap().uniform_size()
  }

  #[cfg(test)]
  pub fn cached(&self, index: usize) -> bool {
    self.cache.lock().unwrap().contains(&self.filenames[index])
  }

  /// Packed DNG bytes for one frame, decoding on a cache miss.
  ///
  /// The cache mutex is held across the whole miss-decode-insert
  /// region, so concurrent readers never observe a partial insert.
  pub fn frame_blob(&self, index: usize) -> Result<Arc<Vec<u8>>, AppError> {
    let name = &self.filenames[index];
    let mut cache = self.cache.lock().unwrap();
    if let Some(blob) = cache.lookup(name) {
      return Ok(blob);
    }

    debug!("[{}] decoding frame {}", self.base_name, index);
    let timestamp = self.frames[index];
    let (samples, frame_meta) = self.decoder.lock().unwrap().load_frame(timestamp)?;
    let blob = dng::pack_dng(&self.metadata, &frame_meta, &samples)?;
    Ok(cache.insert(name, blob))
  }
}

fn frame_name(base: &str, index: usize) -> String {
  format!("{}_{:06}.dng", base, index)
}

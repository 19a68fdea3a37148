// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Reader for the `.mcraw` capture container.
//!
//! The container is a flat chunk stream behind an 8-byte preamble
//! (`MCRAW\0` magic plus a little-endian version word). Each chunk is a
//! one-byte tag, a little-endian u32 payload length and the payload:
//!
//! - `0x01` container metadata, a UTF-8 JSON document
//! - `0x02` video frame: i64 timestamp, u32 metadata length, JSON frame
//!   metadata, then the encoded frame bytes
//! - `0x03` audio chunk: i64 timestamp, then 16-bit PCM samples
//!
//! [`Decoder::new`] scans the stream once, indexing every frame and
//! audio chunk by file offset, so listing frames never touches payload
//! bytes again. Unknown tags are skipped for forward compatibility.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};
use thiserror::Error;

mod metadata;

pub use metadata::{ContainerMetadata, FrameMetadata};

use crate::codec::{self, CodecError};

pub const MAGIC: &[u8; 6] = b"MCRAW\0";
pub const VERSION: u16 = 1;

pub const CHUNK_METADATA: u8 = 0x01;
pub const CHUNK_FRAME: u8 = 0x02;
pub const CHUNK_AUDIO: u8 = 0x03;

/// Opaque frame key: the capture timestamp assigned by the camera.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
  pub timestamp: Timestamp,
  pub samples: Vec<i16>,
}

#[derive(Error, Debug)]
pub enum ContainerError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("not an mcraw container: {0}")]
  InvalidContainer(String),

  #[error("malformed metadata: {0}")]
  Metadata(#[from] serde_json::Error),

  #[error("no frame with timestamp {0}")]
  FrameNotFound(Timestamp),

  #[error("capture mixes frame dimensions, refusing to mount")]
  MixedDimensions,

  #[error("frame decode failed: {0}")]
  Codec(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, ContainerError>;

#[derive(Debug)]
struct FrameEntry {
  timestamp: Timestamp,
  payload_offset: u64,
  payload_len: u32,
  metadata: FrameMetadata,
}

#[derive(Debug)]
struct AudioEntry {
  timestamp: Timestamp,
  offset: u64,
  len: u32,
}

/// Open capture container. Not safe for concurrent use; callers that
/// share one decoder must serialize access.
pub struct Decoder<R> {
  reader: R,
  metadata: ContainerMetadata,
  frames: Vec<FrameEntry>,
  frame_list: Vec<Timestamp>,
  audio: Vec<AudioEntry>,
}

impl Decoder<BufReader<File>> {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let file = File::open(path.as_ref())?;
    Self::new(BufReader::new(file))
  }
}

impl<R: Read + Seek> Decoder<R> {
  /// Scan the chunk stream and build the frame and audio indexes.
  pub fn new(mut reader: R) -> Result<Self> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
      return Err(ContainerError::InvalidContainer("bad magic".to_string()));
    }
    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
      return Err(ContainerError::InvalidContainer(format!("unsupported container version {}", version)));
    }

    let mut metadata: Option<ContainerMetadata> = None;
    let mut frames = Vec::new();
    let mut audio = Vec::new();

    loop {
      let mut tag = [0u8; 1];
      match reader.read_exact(&mut tag) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
        Err(err) => return Err(err.into()),
      }
      let len = reader.read_u32::<LittleEndian>()?;

      match tag[0] {
        CHUNK_METADATA => {
          let mut buf = vec![0u8; len as usize];
          reader.read_exact(&mut buf)?;
          metadata = Some(serde_json::from_slice(&buf)?);
        }
        CHUNK_FRAME => {
          if len < 12 {
            return Err(ContainerError::InvalidContainer(format!("frame chunk of {} bytes", len)));
          }
          let timestamp = reader.read_i64::<LittleEndian>()?;
          let meta_len = reader.read_u32::<LittleEndian>()?;
          if meta_len > len - 12 {
            return Err(ContainerError::InvalidContainer("frame metadata larger than chunk".to_string()));
          }
          let mut meta_buf = vec![0u8; meta_len as usize];
          reader.read_exact(&mut meta_buf)?;
          let frame_meta: FrameMetadata = serde_json::from_slice(&meta_buf)?;

          let payload_offset = reader.stream_position()?;
          let payload_len = len - 12 - meta_len;
          reader.seek(SeekFrom::Current(i64::from(payload_len)))?;
          frames.push(FrameEntry {
            timestamp,
            payload_offset,
            payload_len,
            metadata: frame_meta,
          });
        }
        CHUNK_AUDIO => {
          if len < 8 {
            return Err(ContainerError::InvalidContainer(format!("audio chunk of {} bytes", len)));
          }
          let timestamp = reader.read_i64::<LittleEndian>()?;
          let offset = reader.stream_position()?;
          let data_len = len - 8;
          reader.seek(SeekFrom::Current(i64::from(data_len)))?;
          audio.push(AudioEntry {
            timestamp,
            offset,
            len: data_len,
          });
        }
        other => {
          debug!("Skipping unknown chunk tag {:#04x} ({} bytes)", other, len);
          reader.seek(SeekFrom::Current(i64::from(len)))?;
        }
      }
    }

    let metadata = metadata.ok_or_else(|| ContainerError::InvalidContainer("container metadata chunk missing".to_string()))?;

    // Frame sizes are assumed invariant within a capture; mixed
    // dimensions would break every size reported to consumers.
    if let Some(first) = frames.first() {
      let (w, h) = (first.metadata.width, first.metadata.height);
      if frames.iter().any(|f| f.metadata.width != w || f.metadata.height != h) {
        return Err(ContainerError::MixedDimensions);
      }
    }

    debug!("Indexed {} frames, {} audio chunks", frames.len(), audio.len());
    let frame_list = frames.iter().map(|f| f.timestamp).collect();
    Ok(Self {
      reader,
      metadata,
      frames,
      frame_list,
      audio,
    })
  }

  /// Frame timestamps in container order.
  pub fn frames(&self) -> &[Timestamp] {
    &self.frame_list
  }

  pub fn container_metadata(&self) -> &ContainerMetadata {
    &self.metadata
  }

  /// Load and decode one frame into 16-bit samples, row-major.
  pub fn load_frame(&mut self, timestamp: Timestamp) -> Result<(Vec<u16>, FrameMetadata)> {
    let entry = self
      .frames
      .iter()
      .find(|f| f.timestamp == timestamp)
      .ok_or(ContainerError::FrameNotFound(timestamp))?;

    self.reader.seek(SeekFrom::Start(entry.payload_offset))?;
    let mut payload = vec![0u8; entry.payload_len as usize];
    self.reader.read_exact(&mut payload)?;

    let samples = codec::decode_frame(entry.metadata.width as usize, entry.metadata.height as usize, &payload)?;
    Ok((samples, entry.metadata.clone()))
  }

  /// All audio chunks in container order.
  pub fn load_audio(&mut self) -> Result<Vec<AudioChunk>> {
    let mut chunks = Vec::with_capacity(self.audio.len());
    for entry in &self.audio {
      self.reader.seek(SeekFrom::Start(entry.offset))?;
      let mut buf = vec![0u8; entry.len as usize];
      self.reader.read_exact(&mut buf)?;
      if buf.len() % 2 != 0 {
        warn!("Audio chunk at {} has odd byte count, dropping trailing byte", entry.offset);
      }
      let samples = buf.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
      chunks.push(AudioChunk {
        timestamp: entry.timestamp,
        samples,
      });
    }
    Ok(chunks)
  }

  pub fn audio_sample_rate_hz(&self) -> u32 {
    self.metadata.audio_sample_rate.unwrap_or(48_000)
  }

  pub fn num_audio_channels(&self) -> u16 {
    self.metadata.audio_channels.unwrap_or(1)
  }
}

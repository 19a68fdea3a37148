// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Library to read MotionCam RAW (`.mcraw`) video containers.
//!
//! A `.mcraw` file holds a stream of bit-packed Bayer sensor frames plus
//! the camera characterization metadata (black/white levels, CFA layout,
//! color matrices) and optional PCM audio. This crate decodes the
//! container into per-frame 16-bit sensor images and serializes them as
//! single-strip DNG files; audio chunks can be assembled into a WAV
//! buffer.
//!
//! # Example
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::Write;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let mut decoder = mcraw::Decoder::open("capture.mcraw")?;
//!   let meta = decoder.container_metadata().clone();
//!   let frames: Vec<_> = decoder.frames().to_vec();
//!   for (i, ts) in frames.iter().enumerate() {
//!     let (samples, frame_meta) = decoder.load_frame(*ts)?;
//!     let blob = mcraw::dng::pack_dng(&meta, &frame_meta, &samples)?;
//!     File::create(format!("frame_{:06}.dng", i))?.write_all(&blob)?;
//!   }
//!   Ok(())
//! }
//! ```

pub mod bits;
pub mod codec;
pub mod container;
pub mod dng;
pub mod formats;
pub mod tags;
pub mod wav;

pub use codec::CodecError;
pub use container::{AudioChunk, ContainerError, ContainerMetadata, Decoder, FrameMetadata, Timestamp};

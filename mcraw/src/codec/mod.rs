// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Codec for the bit-packed sensor frames inside a `.mcraw` container.
//!
//! Frames are encoded as blocks of 64 values. Each block is stored at a
//! fixed bit-width between 0 and 16; two side streams (themselves
//! block-packed) carry the per-block bit-width and a 12-bit additive
//! reference. [`blocks`] implements the per-width unpack kernels,
//! [`frame`] drives them across a whole frame.

use thiserror::Error;

mod blocks;
mod frame;

pub use blocks::{unpack_block, BLOCK_SIZE, ENCODED_LEN};
pub use frame::{decode_frame, FrameHeader, FRAME_HEADER_LEN};

#[derive(Error, Debug)]
pub enum CodecError {
  #[error("truncated stream: needed {needed} bytes but only {available} remain")]
  Underrun { needed: usize, available: usize },

  #[error("invalid block bit-width {0}")]
  InvalidBitWidth(u16),

  #[error("invalid frame header: {0}")]
  InvalidHeader(String),

  #[error("metadata stream mismatch: {bits} bit-width entries, {refs} reference entries, expected {expected}")]
  StreamMismatch { bits: usize, refs: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

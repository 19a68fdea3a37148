// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! Unpack kernels for single blocks of 64 coded values.
//!
//! The packing groups the 64 values into eight lanes of eight: for lane
//! byte `j` the packed bytes of a group hold the low bits of values
//! `k * 8 + j`, and overflow bits move into trailing byte groups at
//! fixed positions. Every bit-width consumes a fixed byte count, so a
//! block can be bounds-checked before any kernel runs.
//!
//! Widths 7/8 store one byte per value, 9/10 pack the two high bits of
//! eight values into one trailing byte, and 11..=16 fall back to a raw
//! little-endian 16-bit copy. The scalar bodies are the reference
//! semantics; `multiversion` provides vectorized specializations for the
//! hot widths (8, 10 and 16 dominate real captures).

use multiversion::multiversion;

use super::{CodecError, Result};
use crate::bits::LEu16;

/// Number of coded values per block.
pub const BLOCK_SIZE: usize = 64;

/// Bytes consumed by one block, indexed by bit-width.
pub const ENCODED_LEN: [usize; 17] = [
  0,   // bits = 0
  8,   // bits = 1
  16,  // bits = 2
  24,  // bits = 3
  32,  // bits = 4
  40,  // bits = 5
  48,  // bits = 6
  64,  // bits = 7
  64,  // bits = 8
  80,  // bits = 9
  80,  // bits = 10
  128, // bits = 11
  128, // bits = 12
  128, // bits = 13
  128, // bits = 14
  128, // bits = 15
  128, // bits = 16
];

type UnpackFn = fn(&mut [u16; BLOCK_SIZE], &[u8]);

static UNPACK_TABLE: [UnpackFn; 17] = [
  unpack_0, unpack_1, unpack_2, unpack_3, unpack_4, unpack_5, unpack_6, unpack_8, unpack_8, unpack_10, unpack_10, unpack_16, unpack_16, unpack_16,
  unpack_16, unpack_16, unpack_16,
];

/// Expand one block of 64 values at the given bit-width.
///
/// Returns the number of bytes consumed from `src`. Fails if `bits`
/// exceeds 16 or if `src` is shorter than the fixed byte count for
/// `bits`; no output is produced in that case.
pub fn unpack_block(out: &mut [u16; BLOCK_SIZE], bits: u16, src: &[u8]) -> Result<usize> {
  let width = usize::from(bits);
  if width >= UNPACK_TABLE.len() {
    return Err(CodecError::InvalidBitWidth(bits));
  }
  let needed = ENCODED_LEN[width];
  if src.len() < needed {
    return Err(CodecError::Underrun { needed, available: src.len() });
  }
  UNPACK_TABLE[width](out, src);
  Ok(needed)
}

fn unpack_0(out: &mut [u16; BLOCK_SIZE], _src: &[u8]) {
  out.fill(0);
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_1(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for k in 0..8 {
    for j in 0..8 {
      out[k * 8 + j] = (u16::from(src[j]) >> k) & 0x01;
    }
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_2(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for g in 0..2 {
    for k in 0..4 {
      for j in 0..8 {
        out[g * 32 + k * 8 + j] = (u16::from(src[g * 8 + j]) >> (2 * k)) & 0x03;
      }
    }
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_3(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  // Lanes 2 and 5 recover their high bit from the top bits of the third
  // byte group.
  for j in 0..8 {
    let p0 = u16::from(src[j]);
    let p1 = u16::from(src[8 + j]);
    let p2 = u16::from(src[16 + j]);
    out[j] = p0 & 0x07;
    out[8 + j] = (p0 >> 3) & 0x07;
    out[16 + j] = ((p0 >> 6) & 0x03) | (((p2 >> 6) & 0x01) << 2);
    out[24 + j] = p1 & 0x07;
    out[32 + j] = (p1 >> 3) & 0x07;
    out[40 + j] = ((p1 >> 6) & 0x03) | (((p2 >> 7) & 0x01) << 2);
    out[48 + j] = p2 & 0x07;
    out[56 + j] = (p2 >> 3) & 0x07;
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_4(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for g in 0..4 {
    for j in 0..8 {
      let p = u16::from(src[g * 8 + j]);
      out[g * 16 + j] = p & 0x0f;
      out[g * 16 + 8 + j] = p >> 4;
    }
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_5(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for j in 0..8 {
    let p0 = u16::from(src[j]);
    let p1 = u16::from(src[8 + j]);
    let p2 = u16::from(src[16 + j]);
    let p3 = u16::from(src[24 + j]);
    let p4 = u16::from(src[32 + j]);
    out[j] = p0 & 0x1f;
    out[8 + j] = p1 & 0x1f;
    out[16 + j] = p2 & 0x1f;
    out[24 + j] = p3 & 0x1f;
    out[32 + j] = p4 & 0x1f;
    out[40 + j] = ((p0 >> 5) & 0x07) | (((p3 >> 5) & 0x03) << 3);
    out[48 + j] = ((p1 >> 5) & 0x07) | (((p4 >> 5) & 0x03) << 3);
    out[56 + j] = ((p2 >> 5) & 0x07) | (((p3 >> 7) & 0x01) << 3) | (((p4 >> 7) & 0x01) << 4);
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_6(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for j in 0..8 {
    let p0 = u16::from(src[j]);
    let p1 = u16::from(src[8 + j]);
    let p2 = u16::from(src[16 + j]);
    let p3 = u16::from(src[24 + j]);
    let p4 = u16::from(src[32 + j]);
    let p5 = u16::from(src[40 + j]);
    out[j] = p0 & 0x3f;
    out[8 + j] = p1 & 0x3f;
    out[16 + j] = p2 & 0x3f;
    out[24 + j] = p3 & 0x3f;
    out[32 + j] = p4 & 0x3f;
    out[40 + j] = p5 & 0x3f;
    out[48 + j] = ((p0 >> 6) & 0x03) | (((p1 >> 6) & 0x03) << 2) | (((p2 >> 6) & 0x03) << 4);
    out[56 + j] = ((p3 >> 6) & 0x03) | (((p4 >> 6) & 0x03) << 2) | (((p5 >> 6) & 0x03) << 4);
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_8(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for (o, i) in out.iter_mut().zip(src.iter()) {
    *o = u16::from(*i);
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_10(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  // Low bytes of 32 values, then one byte group with the two high bits
  // of each of the preceding four lanes; the pattern repeats once.
  for half in 0..2 {
    let s = half * 40;
    let o = half * 32;
    for j in 0..8 {
      let hi = u16::from(src[s + 32 + j]);
      out[o + j] = u16::from(src[s + j]) | ((hi & 0x03) << 8);
      out[o + 8 + j] = u16::from(src[s + 8 + j]) | (((hi >> 2) & 0x03) << 8);
      out[o + 16 + j] = u16::from(src[s + 16 + j]) | (((hi >> 4) & 0x03) << 8);
      out[o + 24 + j] = u16::from(src[s + 24 + j]) | (((hi >> 6) & 0x03) << 8);
    }
  }
}

#[multiversion(targets("x86_64+avx+avx2", "x86+sse", "aarch64+neon"))]
fn unpack_16(out: &mut [u16; BLOCK_SIZE], src: &[u8]) {
  for (o, bytes) in out.iter_mut().zip(src.chunks_exact(2)) {
    *o = LEu16(bytes, 0);
  }
}

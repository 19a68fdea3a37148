// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  collections::BTreeMap,
  io::{Seek, SeekFrom, Write},
};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::tags::TiffTag;

use super::{Result, TiffError, Value, TIFF_MAGIC};

/// Entry collected by a [`DirectoryWriter`]; `embedded` is the inline
/// data word or the patched offset once the value has been placed.
struct Entry {
  value: Value,
  embedded: Option<u32>,
}

pub struct TiffWriter<W> {
  ifd_location: u64,
  pub writer: W,
}

impl<W> TiffWriter<W>
where
  W: Write + Seek,
{
  pub fn new(writer: W) -> Result<Self> {
    let mut tmp = Self { writer, ifd_location: 0 };
    tmp.write_header()?;
    Ok(tmp)
  }

  pub fn new_directory(&self) -> DirectoryWriter {
    DirectoryWriter::new()
  }

  fn write_header(&mut self) -> Result<()> {
    self.writer.write_all(b"II")?;
    self.writer.write_u16::<LittleEndian>(TIFF_MAGIC)?;
    self.ifd_location = self.writer.stream_position()?;
    self.writer.write_u32::<LittleEndian>(0_u32)?;
    Ok(())
  }

  pub fn write_data(&mut self, data: &[u8]) -> Result<u32> {
    self.pad_word_boundary()?;
    let offset = self.position()?;
    self.writer.write_all(data)?;
    Ok(offset)
  }

  pub fn write_data_u16_le(&mut self, data: &[u16]) -> Result<u32> {
    self.pad_word_boundary()?;
    let offset = self.position()?;
    for v in data {
      self.writer.write_u16::<LittleEndian>(*v)?;
    }
    Ok(offset)
  }

  pub(crate) fn pad_word_boundary(&mut self) -> Result<()> {
    if self.position()? % 4 != 0 {
      let padding = [0, 0, 0];
      let padd_len = 4 - (self.position()? % 4);
      self.writer.write_all(&padding[..padd_len as usize])?;
    }
    Ok(())
  }

  pub fn build(mut self, root_ifd: DirectoryWriter) -> Result<()> {
    let ifd0_offset = root_ifd.build(&mut self)?;
    self.writer.seek(SeekFrom::Start(self.ifd_location))?;
    self.writer.write_u32::<LittleEndian>(ifd0_offset)?;
    Ok(())
  }

  pub fn position(&mut self) -> Result<u32> {
    let pos = self.writer.stream_position()?;
    u32::try_from(pos).map_err(|_| TiffError::Overflow("output exceeds 4 GiB".to_string()))
  }
}

#[derive(Default)]
pub struct DirectoryWriter {
  // BTreeMap keeps tags in the ascending order TIFF requires
  entries: BTreeMap<u16, Entry>,
  next_ifd: u32,
}

impl DirectoryWriter {
  pub fn new() -> Self {
    Self {
      entries: BTreeMap::new(),
      next_ifd: 0,
    }
  }

  pub fn add_tag<T: TiffTag, V: Into<Value>>(&mut self, tag: T, value: V) {
    let tag: u16 = tag.into();
    self.entries.insert(
      tag,
      Entry {
        value: value.into(),
        embedded: None,
      },
    );
  }

  pub fn entry_count(&self) -> u16 {
    self.entries.len() as u16
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn build<W>(mut self, tiff: &mut TiffWriter<W>) -> Result<u32>
  where
    W: Seek + Write,
  {
    if self.entries.is_empty() {
      return Err(TiffError::General("IFD is empty, not allowed by TIFF specification".to_string()));
    }
    for entry in self.entries.values_mut() {
      if entry.value.byte_size() > 4 {
        tiff.pad_word_boundary()?;
        let offset = tiff.position()?;
        entry.value.write(&mut tiff.writer)?;
        entry.embedded.replace(offset);
      } else {
        entry.embedded.replace(entry.value.as_embedded()?);
      }
    }

    tiff.pad_word_boundary()?;
    let offset = tiff.position()?;

    tiff.writer.write_u16::<LittleEndian>(self.entry_count())?;
    for (tag, entry) in self.entries {
      tiff.writer.write_u16::<LittleEndian>(tag)?;
      tiff.writer.write_u16::<LittleEndian>(entry.value.value_type())?;
      tiff.writer.write_u32::<LittleEndian>(entry.value.count() as u32)?;
      tiff.writer.write_u32::<LittleEndian>(entry.embedded.unwrap_or(0))?;
    }
    tiff.writer.write_u32::<LittleEndian>(self.next_ifd)?; // Next IFD

    Ok(offset)
  }
}

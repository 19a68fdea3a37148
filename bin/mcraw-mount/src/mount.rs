// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! The mount namespace: a fixed inode table over the captures, plus
//! the path-free operations the FUSE adapter delegates to. Results are
//! errno-typed so everything here is testable without a kernel.

use std::collections::HashMap;

use libc::{c_int, EACCES, EINVAL, EISDIR, ENOENT, ENOTDIR};
use log::error;

use crate::capture::Capture;

pub const ROOT_INO: u64 = 1;

/// Directory layout of the mount root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountLayout {
  /// Single capture, frame and WAV files directly under the root.
  Flat,
  /// One directory per capture.
  Nested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
  Dir,
  Frame { capture: usize, index: usize },
  Audio { capture: usize },
}

struct Node {
  parent: u64,
  name: String,
  kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  Dir,
  File,
}

/// Attributes reported for one inode.
#[derive(Debug, Clone, Copy)]
pub struct NodeAttr {
  pub ino: u64,
  pub kind: EntryKind,
  pub size: u64,
  pub perm: u16,
  pub nlink: u32,
}

pub struct DirEntry {
  pub ino: u64,
  pub kind: EntryKind,
  pub name: String,
}

/// Immutable two-level namespace built at mount time. Inodes are table
/// indexes plus one, so listings are stable for the mount lifetime.
pub struct Namespace {
  captures: Vec<Capture>,
  nodes: Vec<Node>,
  children: Vec<Vec<u64>>,
  by_name: HashMap<(u64, String), u64>,
}

impl Namespace {
  pub fn new(captures: Vec<Capture>, layout: MountLayout) -> Self {
    let mut ns = Self {
      captures,
      nodes: vec![Node {
        parent: ROOT_INO,
        name: "/".to_string(),
        kind: NodeKind::Dir,
      }],
      children: vec![Vec::new()],
      by_name: HashMap::new(),
    };

    match layout {
      MountLayout::Flat => {
        debug_assert_eq!(ns.captures.len(), 1, "flat layout carries exactly one capture");
        ns.add_capture_files(ROOT_INO, 0);
      }
      MountLayout::Nested => {
        for ci in 0..ns.captures.len() {
          let name = ns.captures[ci].base_name().to_string();
          let dir = ns.add_node(ROOT_INO, name, NodeKind::Dir);
          ns.add_capture_files(dir, ci);
        }
      }
    }
    ns
  }

  fn add_capture_files(&mut self, dir: u64, capture: usize) {
    for index in 0..self.captures[capture].filenames().len() {
      let name = self.captures[capture].filenames()[index].clone();
      self.add_node(dir, name, NodeKind::Frame { capture, index });
    }
    if self.captures[capture].has_audio() {
      let name = self.captures[capture].wav_name();
      self.add_node(dir, name, NodeKind::Audio { capture });
    }
  }

  fn add_node(&mut self, parent: u64, name: String, kind: NodeKind) -> u64 {
    let ino = self.nodes.len() as u64 + 1;
    self.by_name.insert((parent, name.clone()), ino);
    self.children[(parent - 1) as usize].push(ino);
    self.nodes.push(Node { parent, name, kind });
    self.children.push(Vec::new());
    ino
  }

  fn node(&self, ino: u64) -> Option<&Node> {
    self.nodes.get((ino.checked_sub(1)?) as usize)
  }

  /// Total number of regular files, for statfs.
  pub fn file_count(&self) -> u64 {
    self.nodes.iter().filter(|n| n.kind != NodeKind::Dir).count() as u64
  }

  pub fn attr(&self, ino: u64) -> Result<NodeAttr, c_int> {
    let node = self.node(ino).ok_or(ENOENT)?;
    Ok(match node.kind {
      NodeKind::Dir => NodeAttr {
        ino,
        kind: EntryKind::Dir,
        size: 0,
        perm: 0o555,
        nlink: 2,
      },
      NodeKind::Frame { capture, .. } => NodeAttr {
        ino,
        kind: EntryKind::File,
        // Populated by the warm-up decode before the mount serves
        // traffic; zero only for an empty capture.
        size: self.captures[capture].uniform_size().unwrap_or(0),
        perm: 0o444,
        nlink: 1,
      },
      NodeKind::Audio { capture } => NodeAttr {
        ino,
        kind: EntryKind::File,
        size: self.captures[capture].wav().len() as u64,
        perm: 0o444,
        nlink: 1,
      },
    })
  }

  pub fn lookup(&self, parent: u64, name: &str) -> Result<NodeAttr, c_int> {
    let parent_node = self.node(parent).ok_or(ENOENT)?;
    if parent_node.kind != NodeKind::Dir {
      return Err(ENOTDIR);
    }
    let ino = *self.by_name.get(&(parent, name.to_string())).ok_or(ENOENT)?;
    self.attr(ino)
  }

  /// Permission gate for open: regular files, read-only access.
  pub fn open(&self, ino: u64, flags: i32) -> Result<(), c_int> {
    let node = self.node(ino).ok_or(ENOENT)?;
    if node.kind == NodeKind::Dir {
      return Err(EISDIR);
    }
    if flags & libc::O_ACCMODE != libc::O_RDONLY {
      return Err(EACCES);
    }
    Ok(())
  }

  pub fn open_dir(&self, ino: u64) -> Result<(), c_int> {
    let node = self.node(ino).ok_or(ENOENT)?;
    if node.kind != NodeKind::Dir {
      return Err(ENOTDIR);
    }
    Ok(())
  }

  /// Read a byte window of a file. Frames are packed on demand; a
  /// decode failure surfaces as EIO and leaves the rest of the cache
  /// untouched.
  pub fn read(&self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
    if offset < 0 {
      return Err(EINVAL);
    }
    let node = self.node(ino).ok_or(ENOENT)?;
    match node.kind {
      NodeKind::Dir => Err(EISDIR),
      NodeKind::Audio { capture } => Ok(window(self.captures[capture].wav(), offset as u64, size)),
      NodeKind::Frame { capture, index } => {
        let blob = self.captures[capture].frame_blob(index).map_err(|err| {
          error!("EIO error: {}", err);
          libc::EIO
        })?;
        Ok(window(&blob, offset as u64, size))
      }
    }
  }

  /// Directory listing with `.` and `..` first.
  pub fn entries(&self, ino: u64) -> Result<Vec<DirEntry>, c_int> {
    let node = self.node(ino).ok_or(ENOENT)?;
    if node.kind != NodeKind::Dir {
      return Err(ENOTDIR);
    }
    let mut entries = vec![
      DirEntry {
        ino,
        kind: EntryKind::Dir,
        name: ".".to_string(),
      },
      DirEntry {
        ino: node.parent,
        kind: EntryKind::Dir,
        name: "..".to_string(),
      },
    ];
    for child in &self.children[(ino - 1) as usize] {
      let child_node = self.node(*child).expect("child inode in table");
      entries.push(DirEntry {
        ino: *child,
        kind: if child_node.kind == NodeKind::Dir { EntryKind::Dir } else { EntryKind::File },
        name: child_node.name.clone(),
      });
    }
    Ok(entries)
  }
}

fn window(data: &[u8], offset: u64, size: u32) -> Vec<u8> {
  if offset >= data.len() as u64 {
    return Vec::new();
  }
  let start = offset as usize;
  let end = data.len().min(start + size as usize);
  data[start..end].to_vec()
}

// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! FUSE adapter: translates kernel callbacks into namespace lookups
//! and cache reads. Anything not implemented here keeps fuser's ENOSYS
//! default.

use std::ffi::OsStr;
use std::time::{Duration, SystemTime};

use fuser::{
  FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyXattr, Request,
};
use log::debug;

use crate::mount::{EntryKind, Namespace, NodeAttr};

/// Contents never change while mounted, so attributes can be cached
/// generously.
const TTL: Duration = Duration::from_secs(3600);

const BLOCK_SIZE: u32 = 4096;

pub struct McrawFs {
  ns: Namespace,
  uid: u32,
  gid: u32,
}

impl McrawFs {
  pub fn new(ns: Namespace) -> Self {
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    Self { ns, uid, gid }
  }

  fn file_attr(&self, attr: &NodeAttr) -> FileAttr {
    let epoch = SystemTime::UNIX_EPOCH;
    FileAttr {
      ino: attr.ino,
      size: attr.size,
      blocks: attr.size.div_ceil(512),
      atime: epoch,
      mtime: epoch,
      ctime: epoch,
      crtime: epoch,
      kind: match attr.kind {
        EntryKind::Dir => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
      },
      perm: attr.perm,
      nlink: attr.nlink,
      uid: self.uid,
      gid: self.gid,
      rdev: 0,
      blksize: BLOCK_SIZE,
      flags: 0,
    }
  }
}

impl Filesystem for McrawFs {
  fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
    let name = name.to_string_lossy();
    match self.ns.lookup(parent, &name) {
      Ok(attr) => reply.entry(&TTL, &self.file_attr(&attr), 0),
      Err(errno) => reply.error(errno),
    }
  }

  fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
    match self.ns.attr(ino) {
      Ok(attr) => reply.attr(&TTL, &self.file_attr(&attr)),
      Err(errno) => reply.error(errno),
    }
  }

  fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
    match self.ns.open(ino, flags) {
      Ok(()) => reply.opened(0, 0),
      Err(errno) => reply.error(errno),
    }
  }

  fn read(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, size: u32, _flags: i32, _lock_owner: Option<u64>, reply: ReplyData) {
    debug!("read ino={} offset={} size={}", ino, offset, size);
    match self.ns.read(ino, offset, size) {
      Ok(data) => reply.data(&data),
      Err(errno) => reply.error(errno),
    }
  }

  fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
    match self.ns.open_dir(ino) {
      Ok(()) => reply.opened(0, 0),
      Err(errno) => reply.error(errno),
    }
  }

  fn releasedir(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _flags: i32, reply: ReplyEmpty) {
    reply.ok();
  }

  fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
    let entries = match self.ns.entries(ino) {
      Ok(entries) => entries,
      Err(errno) => return reply.error(errno),
    };
    for (i, entry) in entries.iter().enumerate().skip(offset as usize) {
      let kind = match entry.kind {
        EntryKind::Dir => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
      };
      if reply.add(entry.ino, (i + 1) as i64, kind, &entry.name) {
        break;
      }
    }
    reply.ok();
  }

  fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
    let files = self.ns.file_count() + 10;
    reply.statfs(1024 * 1024, 0, 0, files, 0, BLOCK_SIZE, 255, BLOCK_SIZE);
  }

  fn listxattr(&mut self, _req: &Request<'_>, _ino: u64, _size: u32, reply: ReplyXattr) {
    reply.size(0);
  }
}

// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

//! mcraw-mount exposes MotionCam RAW captures as a read-only
//! filesystem of per-frame DNG files plus one WAV file per capture
//! with audio.
//!
//! Two invocation shapes:
//!
//! - `mcraw-mount <input.mcraw> <mountpoint>` mounts one capture with
//!   its frame files directly at the mount root.
//! - `mcraw-mount` scans the directory of the executable for `*.mcraw`
//!   files and mounts all of them under a created `mcraws/` directory,
//!   one subdirectory per capture.

mod app;
mod cache;
mod capture;
mod fs;
mod mount;
#[cfg(test)]
mod testutil;

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use fern::colors::{Color, ColoredLevelConfig};
use fuser::MountOption;
use log::{error, info};
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_FRAMES;
use crate::capture::Capture;
use crate::fs::McrawFs;
use crate::mount::{MountLayout, Namespace};

const PKG_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Error, Debug)]
pub enum AppError {
  #[error("{}", _0)]
  General(String),
  #[error("Invalid arguments: {}", _0)]
  InvalidCmdSwitch(String),
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
  #[error("Not found: {}", _0.display())]
  NotFound(PathBuf),
  #[error("Container failed: {}", _0)]
  ContainerFailed(#[from] mcraw::ContainerError),
  #[error("DNG pack failed: {}", _0)]
  PackFailed(#[from] mcraw::formats::tiff::TiffError),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

fn main() {
  let app = app::create_app();
  let matches = app.try_get_matches().unwrap_or_else(|e| e.exit());

  let colors = ColoredLevelConfig::new().debug(Color::Magenta);
  fern::Dispatch::new()
    .chain(std::io::stderr())
    .level({
      match matches.occurrences_of("debug") {
        0 if matches.is_present("verbose") => log::LevelFilter::Info,
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
      }
    })
    .format(move |out, message, record| {
      out.finish(format_args!(
        "[{:6}][{}] {} ({}:{})",
        colors.color(record.level()),
        record.target(),
        message,
        record.file().unwrap_or("<undefined>"),
        record.line().unwrap_or(0)
      ))
    })
    .apply()
    .expect("Invalid fern configuration, exiting");

  if let Err(err) = run(&matches) {
    error!("{}", err);
    eprintln!("{}: {}", PKG_NAME, err);
    std::process::exit(1);
  }
}

fn run(matches: &ArgMatches) -> Result<(), AppError> {
  match (matches.value_of("INPUT"), matches.value_of("MOUNTPOINT")) {
    (Some(input), Some(mountpoint)) => mount_single(Path::new(input), Path::new(mountpoint)),
    (None, None) => mount_program_dir(),
    _ => Err(AppError::InvalidCmdSwitch("expected either no arguments or <INPUT> <MOUNTPOINT>".to_string())),
  }
}

/// Mount one capture with its files directly at the mount root.
fn mount_single(input: &Path, mountpoint: &Path) -> Result<(), AppError> {
  if !input.is_file() {
    return Err(AppError::NotFound(input.to_path_buf()));
  }
  if !mountpoint.is_dir() {
    return Err(AppError::General(format!("mount point {} is not a directory", mountpoint.display())));
  }
  let capture = Capture::open(input, DEFAULT_CACHE_FRAMES)?;
  info!("[{}] {} frames", input.display(), capture.filenames().len());
  let ns = Namespace::new(vec![capture], MountLayout::Flat);
  mount(ns, mountpoint)
}

/// Scan the executable's directory for captures and mount all of them
/// under a created `mcraws/` sibling, one subdirectory per capture.
fn mount_program_dir() -> Result<(), AppError> {
  let exe = std::env::current_exe()?;
  let app_dir = exe
    .parent()
    .ok_or_else(|| AppError::General("cannot determine the program directory".to_string()))?
    .to_path_buf();

  let mut paths: Vec<PathBuf> = std::fs::read_dir(&app_dir)?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| path.extension().map(|ext| ext == "mcraw").unwrap_or(false))
    .collect();
  paths.sort();

  let mut captures = Vec::new();
  for path in paths {
    info!("Found file: {}", path.display());
    match Capture::open(&path, DEFAULT_CACHE_FRAMES) {
      Ok(capture) => captures.push(capture),
      Err(err) => error!("Skipping {}: {}", path.display(), err),
    }
  }
  if captures.is_empty() {
    return Err(AppError::General(format!("no usable .mcraw files in {}", app_dir.display())));
  }

  let mountpoint = app_dir.join("mcraws");
  match std::fs::create_dir(&mountpoint) {
    Ok(()) => {}
    Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
    Err(err) => return Err(err.into()),
  }

  let ns = Namespace::new(captures, MountLayout::Nested);
  let result = mount(ns, &mountpoint);
  let _ = std::fs::remove_dir(&mountpoint);
  result
}

/// Run the FUSE session until unmount. Read-only, single-threaded,
/// foreground; the session loop runs on the calling thread.
fn mount(ns: Namespace, mountpoint: &Path) -> Result<(), AppError> {
  let volname = mountpoint.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| PKG_NAME.to_string());

  #[allow(unused_mut)]
  let mut options = vec![MountOption::RO, MountOption::FSName(volname.clone())];
  #[cfg(target_os = "macos")]
  options.push(MountOption::CUSTOM(format!("volname={}", volname)));

  info!("Mounting on {}", mountpoint.display());
  if let Err(err) = fuser::mount2(McrawFs::new(ns), mountpoint, &options) {
    error!("FUSE session failed: {}", err);
    std::process::exit(err.raw_os_error().unwrap_or(1));
  }
  Ok(())
}

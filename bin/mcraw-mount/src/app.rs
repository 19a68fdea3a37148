// SPDX-License-Identifier: LGPL-2.1
// Copyright 2023 Daniel Vogelbacher <daniel@chaospixel.com>

use clap::{arg, command, Command};
use log::debug;

pub fn create_app() -> Command<'static> {
  debug!("Creating CLAP app configuration");

  command!()
    .about("mcraw-mount - Mount MotionCam RAW captures as read-only DNG file trees")
    .arg(arg!(debug: -d ... "turns on debugging mode").global(true))
    .arg(arg!(verbose: -v "Print more messages").global(true))
    .arg(arg!([INPUT] "Input .mcraw file; omit to scan the program directory"))
    .arg(arg!([MOUNTPOINT] "Mount point for the capture").requires("INPUT"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_both_invocation_shapes() {
    create_app().try_get_matches_from(["mcraw-mount"]).unwrap();
    let matches = create_app().try_get_matches_from(["mcraw-mount", "clip.mcraw", "/mnt/clip"]).unwrap();
    assert_eq!(matches.value_of("INPUT"), Some("clip.mcraw"));
    assert_eq!(matches.value_of("MOUNTPOINT"), Some("/mnt/clip"));
  }

  #[test]
  fn mountpoint_requires_input() {
    // A lone positional always binds to INPUT; the pairing rule is
    // enforced in run().
    let matches = create_app().try_get_matches_from(["mcraw-mount", "clip.mcraw"]).unwrap();
    assert_eq!(matches.value_of("MOUNTPOINT"), None);
  }
}

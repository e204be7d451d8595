// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dtpass::{Error, console, logger};
use dtpass_device_tree::model::DeviceTree;
use log::{LevelFilter, error};

/// Prints a DTB as DTS source
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// DTB file to dump
    in_filename: PathBuf,
}

fn dump(path: &Path) -> dtpass::Result<String> {
    let dtb = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = DeviceTree::from_dtb(&dtb).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tree.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let console = console::init();
    if logger::init(console, LevelFilter::Warn).is_err() {
        return ExitCode::FAILURE;
    }

    match dump(&args.in_filename) {
        Ok(dts) => {
            print!("{dts}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dtpass::{Action, Filters, console, logger};
use log::{LevelFilter, error, info};

/// Generates Xen device passthrough configuration and partial device trees
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source DTB file
    src_filename: PathBuf,

    /// Output file: configuration text for `config`, a DTB otherwise
    out_filename: PathBuf,

    /// Pipeline to run
    #[arg(long, value_enum)]
    action: Action,

    /// File of path patterns excluded from everything
    #[arg(long = "black_list", value_name = "FILE")]
    black_list: Option<PathBuf>,

    /// File of path patterns kept in a partial DTB with status "disabled"
    #[arg(long = "disable_list", value_name = "FILE")]
    disable_list: Option<PathBuf>,

    /// File of path patterns kept in a partial DTB; everything if omitted
    #[arg(long = "dtb_list", value_name = "FILE")]
    dtb_list: Option<PathBuf>,

    /// Maximum level of log messages
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn run(args: &Args) -> dtpass::Result<()> {
    let filters = Filters::load(
        args.black_list.as_deref(),
        args.disable_list.as_deref(),
        args.dtb_list.as_deref(),
    )?;
    dtpass::run(args.action, &filters, &args.src_filename, &args.out_filename)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let console = console::init();
    if logger::init(console, args.log_level).is_err() {
        return ExitCode::FAILURE;
    }
    info!("running {:?} on {}", args.action, args.src_filename.display());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::path::PathBuf;

/// A fatal error that aborts a `dtpass` run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The file that was being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The source blob is not a valid device tree.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// The blob that was being decoded.
        path: PathBuf,
        /// The codec error, carrying the offending byte offset.
        source: dtpass_device_tree::error::Error,
    },
    /// A line of a pattern list is not a valid regular expression.
    #[error("{}:{line}: invalid pattern {pattern:?}: {source}", origin.display())]
    Pattern {
        /// The pattern list file.
        origin: PathBuf,
        /// The 1-based line number of the pattern.
        line: usize,
        /// The offending pattern text.
        pattern: String,
        /// The compilation error.
        source: regex::Error,
    },
}

/// A result whose error type is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

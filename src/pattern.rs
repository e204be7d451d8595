// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lists of regular expressions matched against node and property paths.

use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// An ordered list of compiled path patterns.
///
/// Every pattern is anchored at the start of the path, so `/soc/uart`
/// matches `/soc/uart@1000` and `/soc/uart@1000/clocks` but not
/// `/bus/soc/uart`.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Creates an empty list, which matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles one pattern per line of `text`.
    ///
    /// Lines that are empty or consist only of whitespace are skipped.
    /// `origin` names the source of `text` in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] for the first line that is not a valid
    /// regular expression.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut patterns = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let invalid = |source| Error::Pattern {
                origin: origin.to_path_buf(),
                line: index + 1,
                pattern: line.to_owned(),
                source,
            };
            // A line must compile on its own before it is wrapped in the anchor group.
            Regex::new(line).map_err(invalid)?;
            patterns.push(Regex::new(&format!("^(?:{line})")).map_err(invalid)?);
        }
        Ok(Self { patterns })
    }

    /// Reads and compiles a pattern list file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read, or
    /// [`Error::Pattern`] if one of its lines does not compile.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::parse(&text, path)?;
        debug!("loaded {} patterns from {}", list.len(), path.display());
        Ok(list)
    }

    /// Returns true if any pattern matches the start of `value`.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(value))
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the list holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

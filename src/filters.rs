// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::Path;

use crate::error::Result;
use crate::pattern::PatternList;

/// The three pattern lists that steer every traversal.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Paths that are never passed through nor copied.
    pub black_list: PatternList,
    /// Paths that are copied into a partial tree with `status = "disabled"`.
    pub disable_list: PatternList,
    /// Paths that are copied into a partial tree. Empty means everything.
    pub dtb_list: PatternList,
}

impl Filters {
    /// Loads the given pattern list files. A missing argument yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or holds an invalid
    /// pattern.
    pub fn load(
        black_list: Option<&Path>,
        disable_list: Option<&Path>,
        dtb_list: Option<&Path>,
    ) -> Result<Self> {
        let load = |path: Option<&Path>| match path {
            Some(path) => PatternList::load(path),
            None => Ok(PatternList::new()),
        };
        Ok(Self {
            black_list: load(black_list)?,
            disable_list: load(disable_list)?,
            dtb_list: load(dtb_list)?,
        })
    }

    /// Returns true if `path` is on the blacklist.
    #[must_use]
    pub fn is_blacklisted(&self, path: &str) -> bool {
        self.black_list.matches(path)
    }

    /// Returns true if `path` is on the disable list.
    #[must_use]
    pub fn is_disabled(&self, path: &str) -> bool {
        self.disable_list.matches(path)
    }

    /// Returns true if `path` belongs in a partial tree.
    ///
    /// Disabled paths are always included, as is everything when the
    /// inclusion list is empty.
    #[must_use]
    pub fn is_included(&self, path: &str) -> bool {
        self.dtb_list.is_empty() || self.dtb_list.matches(path) || self.is_disabled(path)
    }
}

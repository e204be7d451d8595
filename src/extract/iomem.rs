// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Memory-mapped I/O pages of passthrough devices.

use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};
use indexmap::IndexMap;

use crate::eligibility::is_eligible;
use crate::filters::Filters;
use crate::walk;

/// Name of the property holding a node's address ranges.
pub const REG: &str = "reg";
/// Log2 of the page size.
pub const PAGE_SHIFT: u32 = 12;
/// Size of a page in bytes.
pub const PAGE_SIZE: u32 = 1 << PAGE_SHIFT;

const CELLS_PER_RANGE: usize = 4;

/// A run of pages and the nodes that map it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IomemEntry {
    /// Index of the first page.
    pub base_page: u32,
    /// Number of pages, as reported by the first node.
    pub page_count: u32,
    /// Names of the contributing nodes, in encounter order.
    pub names: Vec<String>,
}

/// Collects the 32-bit addressable `reg` ranges of every eligible node.
///
/// `reg` is read as `(addr_hi, addr_lo, size_hi, size_lo)` quadruples and
/// ranges with a non-zero `addr_hi` are skipped. Ranges starting at the same
/// page are merged: the first page count is kept and the node names are
/// appended.
#[must_use]
pub fn collect(filters: &Filters, root: &DeviceTreeNode) -> Vec<IomemEntry> {
    let mut entries: IndexMap<u32, IomemEntry> = IndexMap::new();

    for (path, node) in walk::descendants(root) {
        if !is_eligible(filters, &path, node) {
            continue;
        }
        let Some(cells) = node.property(REG).and_then(DeviceTreeProperty::as_words) else {
            continue;
        };
        for range in cells
            .chunks_exact(CELLS_PER_RANGE)
            .filter(|range| range[0] == 0)
        {
            let base_page = range[1] >> PAGE_SHIFT;
            let page_count = range[3].div_ceil(PAGE_SIZE);
            entries
                .entry(base_page)
                .and_modify(|entry| entry.names.push(node.name().to_owned()))
                .or_insert_with(|| IomemEntry {
                    base_page,
                    page_count,
                    names: vec![node.name().to_owned()],
                });
        }
    }

    entries.into_values().collect()
}

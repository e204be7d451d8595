// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared peripheral interrupts routed to passthrough devices.

use std::collections::HashSet;

use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};

use crate::eligibility::is_eligible;
use crate::filters::Filters;
use crate::walk;

/// Name of the property holding a node's interrupt specifiers.
pub const INTERRUPTS: &str = "interrupts";
/// GIC interrupt kind of a shared peripheral interrupt.
pub const GIC_SPI: u32 = 0;
/// GIC interrupt kind of a private peripheral interrupt.
pub const GIC_PPI: u32 = 1;
/// Offset of the first SPI in the flat interrupt number space.
pub const IRQ_BASE: u64 = 32;

const CELLS_PER_SPECIFIER: usize = 3;

/// The interrupts first claimed by one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqGroup {
    /// Name of the node.
    pub node: String,
    /// Flat interrupt numbers, in specifier order.
    pub irqs: Vec<u64>,
}

/// Returns the `interrupts` cells of a node, if it has them as words.
pub(crate) fn interrupt_cells(node: &DeviceTreeNode) -> Option<&[u32]> {
    node.property(INTERRUPTS)
        .and_then(DeviceTreeProperty::as_words)
}

/// Yields the flat numbers of the SPIs in `cells`.
///
/// Cells are read as `(kind, number, flags)` triples; a trailing partial
/// triple is ignored.
fn spi_numbers(cells: &[u32]) -> impl Iterator<Item = u64> + '_ {
    cells
        .chunks_exact(CELLS_PER_SPECIFIER)
        .filter(|specifier| specifier[0] == GIC_SPI)
        .map(|specifier| u64::from(specifier[1]) + IRQ_BASE)
}

/// Collects the SPIs of every eligible node.
///
/// A number is reported once, under the first node that declares it.
/// Nodes that add no new number produce no group.
#[must_use]
pub fn collect(filters: &Filters, root: &DeviceTreeNode) -> Vec<IrqGroup> {
    let mut seen = HashSet::new();
    let mut groups = Vec::new();

    for (path, node) in walk::descendants(root) {
        if !is_eligible(filters, &path, node) {
            continue;
        }
        let Some(cells) = interrupt_cells(node) else {
            continue;
        };
        let irqs: Vec<u64> = spi_numbers(cells)
            .filter(|irq| seen.insert(*irq))
            .collect();
        if !irqs.is_empty() {
            groups.push(IrqGroup {
                node: node.name().to_owned(),
                irqs,
            });
        }
    }

    groups
}

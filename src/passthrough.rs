// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Selection and marking of the devices handed to a guest.

use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};
use log::{info, warn};

use crate::eligibility::is_eligible;
use crate::extract::irq::{GIC_SPI, interrupt_cells};
use crate::filters::Filters;
use crate::walk::{self, child_path};

/// Marker property telling Xen to pass a node through.
pub const XEN_PASSTHROUGH: &str = "xen,passthrough";
/// Property that keeps a node out of passthrough.
pub const XEN_COPROC: &str = "xen,coproc";
/// Property linking a node to its IOMMU.
pub const IOMMUS: &str = "iommus";

/// Returns true if the node at `path` should be passed through.
///
/// That is the case for eligible nodes behind an IOMMU or whose first
/// interrupt is an SPI, unless they carry `xen,coproc`.
#[must_use]
pub fn is_candidate(filters: &Filters, path: &str, node: &DeviceTreeNode) -> bool {
    if !is_eligible(filters, path, node) {
        return false;
    }
    let has_spi = interrupt_cells(node).and_then(<[u32]>::first) == Some(&GIC_SPI);
    (node.has_property(IOMMUS) || has_spi) && !node.has_property(XEN_COPROC)
}

/// Inserts an empty `xen,passthrough` property as the first entry of every
/// candidate node.
///
/// Nodes that are already marked are left alone, so running this twice
/// changes nothing the second time. Returns the number of markers added.
pub fn annotate(filters: &Filters, tree: &mut DeviceTree) -> usize {
    let mut inserted = 0;
    walk::walk_mut(tree.root_mut(), &mut |path, node| {
        if !is_candidate(filters, path, node) {
            return;
        }
        if node.has_property(XEN_PASSTHROUGH) {
            warn!("{path} already has {XEN_PASSTHROUGH}");
            return;
        }
        node.insert_property(0, DeviceTreeProperty::empty(XEN_PASSTHROUGH));
        inserted += 1;
    });
    info!("marked {inserted} nodes for passthrough");
    inserted
}

/// A node selected for passthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughNode {
    /// Absolute path of the node.
    pub path: String,
    /// Name of the node.
    pub name: String,
    /// True if none of the node's ancestors is itself selected.
    pub top_level: bool,
}

/// Lists the candidate nodes below `root` in pre-order.
#[must_use]
pub fn collect(filters: &Filters, root: &DeviceTreeNode) -> Vec<PassthroughNode> {
    let mut nodes = Vec::new();
    for child in root.children() {
        collect_node(filters, "/", child, false, &mut nodes);
    }
    nodes
}

fn collect_node(
    filters: &Filters,
    parent: &str,
    node: &DeviceTreeNode,
    has_selected_ancestor: bool,
    nodes: &mut Vec<PassthroughNode>,
) {
    let path = child_path(parent, node.name());
    let selected = is_candidate(filters, &path, node);
    if selected {
        nodes.push(PassthroughNode {
            path: path.clone(),
            name: node.name().to_owned(),
            top_level: !has_selected_ancestor,
        });
    }
    for child in node.children() {
        collect_node(filters, &path, child, has_selected_ancestor || selected, nodes);
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Read-only passes that gather the contents of a Xen passthrough
//! configuration from a device tree.
//!
//! Each pass walks every node below the root once, in pre-order, and skips
//! the nodes rejected by [`is_eligible`] without skipping their children.

pub mod iomem;
pub mod irq;

use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};

use crate::eligibility::is_eligible;
use crate::filters::Filters;
use crate::passthrough::{self, IOMMUS, PassthroughNode, XEN_COPROC};
use crate::walk;
pub use iomem::IomemEntry;
pub use irq::IrqGroup;

/// Name of the root property listing the board's compatible strings.
pub const COMPATIBLE: &str = "compatible";

/// Everything a Xen passthrough configuration is rendered from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughConfig {
    /// The root `compatible` strings.
    pub compatible: Vec<String>,
    /// Nodes selected for passthrough.
    pub passthrough_nodes: Vec<PassthroughNode>,
    /// Paths of eligible nodes behind an IOMMU.
    pub dtdev: Vec<String>,
    /// Interrupts grouped by the node that first declares them.
    pub irqs: Vec<IrqGroup>,
    /// Merged I/O memory pages.
    pub iomem: Vec<IomemEntry>,
}

/// Returns the root `compatible` strings, or nothing if the property is
/// missing or not a string list.
#[must_use]
pub fn compatible(root: &DeviceTreeNode) -> Vec<String> {
    root.property(COMPATIBLE)
        .and_then(DeviceTreeProperty::as_strings)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Returns the paths of the eligible nodes that have `iommus` and lack
/// `xen,coproc`.
#[must_use]
pub fn iommu_devices(filters: &Filters, root: &DeviceTreeNode) -> Vec<String> {
    walk::descendants(root)
        .filter(|(path, node)| is_eligible(filters, path, node))
        .filter(|(_, node)| node.has_property(IOMMUS) && !node.has_property(XEN_COPROC))
        .map(|(path, _)| path)
        .collect()
}

/// Runs every extraction pass over `tree`.
#[must_use]
pub fn extract(filters: &Filters, tree: &DeviceTree) -> PassthroughConfig {
    let root = tree.root();
    PassthroughConfig {
        compatible: compatible(root),
        passthrough_nodes: passthrough::collect(filters, root),
        dtdev: iommu_devices(filters, root),
        irqs: irq::collect(filters, root),
        iomem: iomem::collect(filters, root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::{DISABLED, STATUS};

    #[test]
    fn compatible_is_verbatim() {
        let root = DeviceTreeNode::builder("")
            .property(DeviceTreeProperty::strings(
                COMPATIBLE,
                ["vendor,board", "vendor,soc"],
            ))
            .build();
        assert_eq!(compatible(&root), ["vendor,board", "vendor,soc"]);
    }

    #[test]
    fn missing_or_mistyped_compatible_is_empty() {
        assert!(compatible(&DeviceTreeNode::new("")).is_empty());
        let root = DeviceTreeNode::builder("")
            .property(DeviceTreeProperty::words(COMPATIBLE, [1]))
            .build();
        assert!(compatible(&root).is_empty());
    }

    #[test]
    fn iommu_devices_skip_coproc_and_disabled() {
        let root = DeviceTreeNode::builder("")
            .child(
                DeviceTreeNode::builder("soc")
                    .child(
                        DeviceTreeNode::builder("gpu@1000")
                            .property(DeviceTreeProperty::words(IOMMUS, [1, 0]))
                            .build(),
                    )
                    .child(
                        DeviceTreeNode::builder("vpu@2000")
                            .property(DeviceTreeProperty::words(IOMMUS, [1, 1]))
                            .property(DeviceTreeProperty::empty(XEN_COPROC))
                            .build(),
                    )
                    .child(
                        DeviceTreeNode::builder("dsp@3000")
                            .property(DeviceTreeProperty::strings(STATUS, [DISABLED]))
                            .property(DeviceTreeProperty::words(IOMMUS, [1, 2]))
                            .build(),
                    )
                    .build(),
            )
            .build();
        assert_eq!(iommu_devices(&Filters::default(), &root), ["/soc/gpu@1000"]);
    }

    #[test]
    fn disabled_parent_does_not_hide_children() {
        let root = DeviceTreeNode::builder("")
            .child(
                DeviceTreeNode::builder("bus")
                    .property(DeviceTreeProperty::strings(STATUS, [DISABLED]))
                    .property(DeviceTreeProperty::words(IOMMUS, [1, 0]))
                    .child(
                        DeviceTreeNode::builder("dev")
                            .property(DeviceTreeProperty::words(IOMMUS, [1, 1]))
                            .build(),
                    )
                    .build(),
            )
            .build();
        assert_eq!(iommu_devices(&Filters::default(), &root), ["/bus/dev"]);
    }
}

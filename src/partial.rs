// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pruned copies of a device tree.

use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty, NodeEntry};
use log::{debug, info, warn};

use crate::eligibility::{DISABLED, STATUS};
use crate::filters::Filters;

/// Builds a new tree holding the parts of `source` selected by `filters`.
///
/// Every node and property is matched by its path (`/soc/uart@0` for a
/// node, `/soc/uart@0/status` for a property):
///
/// - blacklisted entries are dropped together with everything below them;
/// - entries on the disable list are kept, and kept nodes get
///   `status = "disabled"`;
/// - otherwise entries are kept if the inclusion list is empty or matches.
///
/// With all lists empty the result is a copy of `source`. The memory
/// reservations of `source` are not carried over.
#[must_use]
pub fn build_partial(filters: &Filters, source: &DeviceTree) -> DeviceTree {
    let mut root = DeviceTreeNode::new(source.root().name());
    copy_entries(filters, "/", source.root(), &mut root);
    info!("partial tree keeps {} top-level entries", root.len());

    let mut tree = DeviceTree::new(root);
    tree.boot_cpuid_phys = source.boot_cpuid_phys;
    tree
}

fn copy_entries(filters: &Filters, path: &str, src: &DeviceTreeNode, dst: &mut DeviceTreeNode) {
    for entry in src.entries() {
        let entry_path = format!("{path}{}", entry.name());
        if filters.is_blacklisted(&entry_path) {
            warn!("{entry_path} is in black list");
            continue;
        }
        let disabled = filters.is_disabled(&entry_path);
        if !filters.is_included(&entry_path) {
            debug!("{entry_path} is not included");
            continue;
        }

        match entry {
            NodeEntry::Node(node) => {
                let mut copy = DeviceTreeNode::new(node.name());
                copy_entries(filters, &format!("{entry_path}/"), node, &mut copy);
                if disabled {
                    copy.set_property(DeviceTreeProperty::strings(STATUS, [DISABLED]));
                }
                dst.add_child(copy);
            }
            NodeEntry::Property(property) => dst.add_property(property.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::pattern::PatternList;
    use dtpass_device_tree::MemoryReservation;

    fn patterns(text: &str) -> PatternList {
        PatternList::parse(text, Path::new("test.list")).unwrap()
    }

    fn board() -> DeviceTree {
        let mut tree = DeviceTree::new(
            DeviceTreeNode::builder("")
                .property(DeviceTreeProperty::strings("compatible", ["acme,board"]))
                .child(
                    DeviceTreeNode::builder("soc")
                        .property(DeviceTreeProperty::words("#address-cells", [1]))
                        .child(
                            DeviceTreeNode::builder("uart@1000")
                                .property(DeviceTreeProperty::strings(STATUS, ["okay"]))
                                .property(DeviceTreeProperty::words("reg", [0x1000, 0x100]))
                                .build(),
                        )
                        .child(
                            DeviceTreeNode::builder("gpu@2000")
                                .property(DeviceTreeProperty::words("reg", [0x2000, 0x100]))
                                .build(),
                        )
                        .build(),
                )
                .child(DeviceTreeNode::new("chosen"))
                .build(),
        );
        tree.memory_reservations
            .push(MemoryReservation::new(0x8000_0000, 0x1000));
        tree
    }

    #[test]
    fn empty_filters_copy_everything() {
        let source = board();
        let partial = build_partial(&Filters::default(), &source);
        assert_eq!(partial.root(), source.root());
        assert!(partial.memory_reservations.is_empty());
    }

    #[test]
    fn blacklist_drops_subtree() {
        let filters = Filters {
            black_list: patterns("/soc/uart"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        assert!(partial.find_node("/soc/uart@1000").is_none());
        assert!(partial.find_node("/soc/gpu@2000").is_some());
    }

    #[test]
    fn blacklist_applies_to_properties() {
        let filters = Filters {
            black_list: patterns("/compatible"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        assert!(!partial.root().has_property("compatible"));
    }

    #[test]
    fn inclusion_list_keeps_matching_paths() {
        let filters = Filters {
            dtb_list: patterns("/soc$\n/soc/gpu"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        let soc = partial.find_node("/soc").unwrap();
        assert!(soc.property("#address-cells").is_none());
        assert_eq!(soc.children().count(), 1);
        let gpu = partial.find_node("/soc/gpu@2000").unwrap();
        assert!(gpu.has_property("reg"));
        assert!(partial.find_node("/chosen").is_none());
        assert!(!partial.root().has_property("compatible"));
    }

    #[test]
    fn disable_list_forces_inclusion_and_status() {
        let filters = Filters {
            disable_list: patterns("/soc/uart"),
            dtb_list: patterns("/soc$"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        let uart = partial.find_node("/soc/uart@1000").unwrap();
        assert_eq!(uart.property(STATUS).unwrap().first_string(), Some(DISABLED));
        assert_eq!(uart.property_index(STATUS), Some(0));
        assert!(uart.has_property("reg"));
    }

    #[test]
    fn disabled_node_without_status_gets_one_appended() {
        let filters = Filters {
            disable_list: patterns("/soc/gpu"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        let gpu = partial.find_node("/soc/gpu@2000").unwrap();
        assert_eq!(gpu.property_index(STATUS), Some(1));
        assert_eq!(gpu.property(STATUS).unwrap().first_string(), Some(DISABLED));
    }

    #[test]
    fn nothing_included_gives_empty_root() {
        let filters = Filters {
            dtb_list: patterns("/nothing-here"),
            ..Filters::default()
        };
        let partial = build_partial(&filters, &board());
        assert!(partial.root().is_empty());
    }

    #[test]
    fn source_is_untouched() {
        let source = board();
        let before = source.clone();
        let filters = Filters {
            disable_list: patterns("/soc"),
            ..Filters::default()
        };
        let _ = build_partial(&filters, &source);
        assert_eq!(source, before);
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};
use log::warn;

use crate::filters::Filters;

/// Name of the property that enables or disables a node.
pub const STATUS: &str = "status";
/// Value of [`STATUS`] that disables a node.
pub const DISABLED: &str = "disabled";

/// Returns true if the node's first `status` string is `"disabled"`.
#[must_use]
pub fn is_disabled(node: &DeviceTreeNode) -> bool {
    node.property(STATUS)
        .and_then(DeviceTreeProperty::first_string)
        == Some(DISABLED)
}

/// Decides whether the node at `path` may contribute to any output.
///
/// Blacklisted paths and disabled nodes are rejected with a warning. The
/// result says nothing about the node's children, which are judged on their
/// own.
#[must_use]
pub fn is_eligible(filters: &Filters, path: &str, node: &DeviceTreeNode) -> bool {
    if filters.is_blacklisted(path) {
        warn!("{path} is in black list");
        return false;
    }
    if is_disabled(node) {
        warn!("{path} is disabled");
        return false;
    }
    true
}

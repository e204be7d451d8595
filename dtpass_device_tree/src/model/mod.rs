// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-write, in-memory representation of a device tree.
//!
//! This module provides the [`DeviceTree`], [`DeviceTreeNode`], and
//! [`DeviceTreeProperty`] structs, which can be used to create or modify a
//! device tree in memory. The [`DeviceTree`] can then be serialized to a
//! flattened device tree blob.

use alloc::vec::Vec;
use core::fmt::{self, Display};

use crate::error::Error;
use crate::fdt::Fdt;
use crate::{MemoryReservation, writer};

mod node;
mod property;

pub use node::{DeviceTreeNode, DeviceTreeNodeBuilder, NodeEntry};
pub use property::{DeviceTreeProperty, PropertyValue};

/// A mutable, in-memory representation of a device tree.
///
/// This struct provides a high-level API for creating and modifying a device
/// tree. It can be created from scratch or by parsing an existing FDT blob.
///
/// # Examples
///
/// ```
/// # use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode};
/// let mut tree = DeviceTree::new(DeviceTreeNode::new(""));
/// tree.root_mut().add_child(DeviceTreeNode::new("child"));
/// let child = tree.find_node_mut("/child").unwrap();
/// assert_eq!(child.name(), "child");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTree {
    root: DeviceTreeNode,
    /// The memory reservations for this device tree.
    pub memory_reservations: Vec<MemoryReservation>,
    /// The physical ID of the boot CPU.
    pub boot_cpuid_phys: u32,
}

impl DeviceTree {
    /// Creates a new `DeviceTree` with the given root node.
    #[must_use]
    pub fn new(root: DeviceTreeNode) -> Self {
        Self {
            root,
            memory_reservations: Vec::new(),
            boot_cpuid_phys: 0,
        }
    }

    /// Creates a new `DeviceTree` from a `Fdt`.
    ///
    /// # Errors
    ///
    /// Returns an error if any node or property of the `Fdt` is malformed.
    pub fn from_fdt(fdt: &Fdt<'_>) -> Result<Self, Error> {
        let root = DeviceTreeNode::try_from(fdt.root()?)?;
        Ok(DeviceTree {
            root,
            memory_reservations: fdt.memory_reservations().collect(),
            boot_cpuid_phys: fdt.boot_cpuid_phys(),
        })
    }

    /// Parses a flattened device tree blob into a `DeviceTree`.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid or the structure block is
    /// malformed.
    pub fn from_dtb(dtb: &[u8]) -> Result<Self, Error> {
        Self::from_fdt(&Fdt::new(dtb)?)
    }

    /// Serializes the `DeviceTree` to a flattened device tree blob.
    ///
    /// # Panics
    ///
    /// This may panic if any of the lengths written to the DTB (block sizes,
    /// property value length, etc.) exceed [`u32::MAX`].
    #[must_use]
    pub fn to_dtb(&self) -> Vec<u8> {
        writer::to_bytes(self)
    }

    /// Returns a reference to the root node of the device tree.
    #[must_use]
    pub fn root(&self) -> &DeviceTreeNode {
        &self.root
    }

    /// Returns a mutable reference to the root node of the device tree.
    pub fn root_mut(&mut self) -> &mut DeviceTreeNode {
        &mut self.root
    }

    /// Finds a node by its absolute path.
    ///
    /// # Performance
    ///
    /// Child lookup is a constant-time operation, so this is linear in the
    /// number of path segments.
    #[must_use]
    pub fn find_node(&self, path: &str) -> Option<&DeviceTreeNode> {
        if !path.starts_with('/') {
            return None;
        }
        let mut current_node = &self.root;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            current_node = current_node.child(component)?;
        }
        Some(current_node)
    }

    /// Finds a node by its absolute path and returns a mutable reference to
    /// it.
    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut DeviceTreeNode> {
        if !path.starts_with('/') {
            return None;
        }
        let mut current_node = &mut self.root;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            current_node = current_node.child_mut(component)?;
        }
        Some(current_node)
    }
}

impl Display for DeviceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dtb = self.to_dtb();
        Fdt::new(&dtb).map_err(|_| fmt::Error)?.fmt(f)
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decoding, encoding and in-memory editing of Flattened Device Tree (FDT)
//! blobs.
//!
//! The crate has two layers:
//!
//! - A read-only, zero-copy view of a blob centered around the
//!   [`Fdt`](fdt::Fdt) struct. It validates the header, walks the structure
//!   block and renders the tree as DTS source.
//! - An owned, mutable model centered around the
//!   [`DeviceTree`](model::DeviceTree) struct. Every node keeps its
//!   properties and child nodes as one ordered list of entries, so a tree
//!   that is decoded and encoded again comes out byte-identical.
//!
//! Property values carry a type in the model. Since the binary format has
//! none, it is inferred on decode (see
//! [`PropertyValue::from_bytes`](model::PropertyValue::from_bytes)).
//!
//! # Examples
//!
//! ```
//! use dtpass_device_tree::fdt::Fdt;
//! use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};
//!
//! // Create a new device tree from scratch.
//! let mut tree = DeviceTree::new(DeviceTreeNode::new(""));
//!
//! // Add a child node to the root.
//! let child = DeviceTreeNode::builder("child")
//!     .property(DeviceTreeProperty::strings("my-property", ["hello"]))
//!     .build();
//! tree.root_mut().add_child(child);
//!
//! // Serialize the device tree to a DTB.
//! let dtb = tree.to_dtb();
//!
//! // Parse the DTB with the read-only API.
//! let fdt = Fdt::new(&dtb).unwrap();
//! let child_node = fdt.root().unwrap().children().next().unwrap().unwrap();
//! assert_eq!(child_node.name().unwrap(), "child");
//! let prop = child_node.properties().next().unwrap().unwrap();
//! assert_eq!(prop.value(), b"hello\0");
//!
//! // Decode it back into an editable tree and display the DTS.
//! let decoded = DeviceTree::from_dtb(&dtb).unwrap();
//! assert_eq!(decoded.root(), tree.root());
//! println!("{decoded}");
//! ```

#![no_std]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

extern crate alloc;

pub mod error;
pub mod fdt;
pub mod memreserve;
pub mod model;
mod writer;

pub use memreserve::MemoryReservation;

/// A result whose error type is the decoding [`Error`](error::Error).
pub type Result<T> = core::result::Result<T, error::Error>;

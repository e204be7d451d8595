// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prepares a device tree for Xen device passthrough.
//!
//! Three pipelines are available, see [`Action`]:
//!
//! - `config` renders the passthrough part of a Xen domain configuration:
//!   the board's compatible strings, the devices behind an IOMMU, their
//!   interrupts and their memory-mapped I/O pages.
//! - `passthrough` marks the selected devices with `xen,passthrough`.
//! - `partialdtb` builds a pruned copy of the tree for a guest.
//!
//! All of them are steered by three lists of path patterns bundled in
//! [`Filters`].
//!
//! # Examples
//!
//! ```
//! use dtpass::{Action, Filters, Output, apply};
//! use dtpass_device_tree::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};
//!
//! let tree = DeviceTree::new(
//!     DeviceTreeNode::builder("")
//!         .child(
//!             DeviceTreeNode::builder("uart0")
//!                 .property(DeviceTreeProperty::words("interrupts", [0, 40, 4]))
//!                 .build(),
//!         )
//!         .build(),
//! );
//!
//! let Some(Output::Config(config)) = apply(Action::Config, &Filters::default(), tree) else {
//!     unreachable!();
//! };
//! assert!(config.contains("# uart0\n    72,\n"));
//! assert!(config.ends_with("&uart0 { xen,passthrough; };\n"));
//! ```

#![deny(clippy::undocumented_unsafe_blocks)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod action;
pub mod console;
pub mod eligibility;
mod emit;
pub mod error;
pub mod extract;
pub mod filters;
pub mod logger;
pub mod partial;
pub mod passthrough;
pub mod pattern;
pub mod walk;

pub use action::{Action, Output, apply, run};
pub use error::{Error, Result};
pub use filters::Filters;

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use dtpass_device_tree::model::DeviceTree;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::filters::Filters;
use crate::{extract, partial, passthrough};

/// The pipeline to run on the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Write a Xen passthrough configuration fragment.
    Config,
    /// Write the source tree with `xen,passthrough` markers added.
    Passthrough,
    /// Write a pruned copy of the source tree.
    #[value(name = "partialdtb")]
    PartialDtb,
}

/// The product of an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Configuration text.
    Config(String),
    /// An encoded device tree blob.
    Dtb(Vec<u8>),
}

impl Output {
    /// Returns the bytes to write out.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Config(text) => text.as_bytes(),
            Self::Dtb(dtb) => dtb,
        }
    }
}

/// Runs `action` on `tree`.
///
/// Returns `None` if the action is [`Action::PartialDtb`] and nothing of the
/// tree survives the filters.
#[must_use]
pub fn apply(action: Action, filters: &Filters, mut tree: DeviceTree) -> Option<Output> {
    match action {
        Action::Config => {
            let config = extract::extract(filters, &tree);
            info!(
                "found {} passthrough nodes, {} IOMMU devices, {} IRQ groups, {} iomem entries",
                config.passthrough_nodes.len(),
                config.dtdev.len(),
                config.irqs.len(),
                config.iomem.len()
            );
            Some(Output::Config(config.to_string()))
        }
        Action::Passthrough => {
            passthrough::annotate(filters, &mut tree);
            Some(Output::Dtb(tree.to_dtb()))
        }
        Action::PartialDtb => {
            let partial = partial::build_partial(filters, &tree);
            if partial.root().is_empty() {
                None
            } else {
                Some(Output::Dtb(partial.to_dtb()))
            }
        }
    }
}

/// Decodes the blob at `src`, runs `action` on it and writes the result to
/// `out`.
///
/// An empty partial tree is not written.
///
/// # Errors
///
/// Returns an error if `src` cannot be read or decoded, or `out` cannot be
/// written.
pub fn run(action: Action, filters: &Filters, src: &Path, out: &Path) -> Result<()> {
    let dtb = fs::read(src).map_err(|source| Error::Read {
        path: src.to_path_buf(),
        source,
    })?;
    let tree = DeviceTree::from_dtb(&dtb).map_err(|source| Error::Decode {
        path: src.to_path_buf(),
        source,
    })?;
    info!("loaded {} ({} bytes)", src.display(), dtb.len());

    let Some(output) = apply(action, filters, tree) else {
        warn!("partial tree is empty, not writing {}", out.display());
        return Ok(());
    };
    fs::write(out, output.as_bytes()).map_err(|source| Error::Write {
        path: out.to_path_buf(),
        source,
    })?;
    info!("wrote {} ({} bytes)", out.display(), output.as_bytes().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};

    fn tree() -> DeviceTree {
        DeviceTree::new(
            DeviceTreeNode::builder("")
                .child(
                    DeviceTreeNode::builder("gpu")
                        .property(DeviceTreeProperty::words("iommus", [1, 0]))
                        .build(),
                )
                .build(),
        )
    }

    #[test]
    fn action_names() {
        let names: Vec<_> = Action::value_variants()
            .iter()
            .filter_map(|action| action.to_possible_value())
            .map(|value| value.get_name().to_owned())
            .collect();
        assert_eq!(names, ["config", "passthrough", "partialdtb"]);
    }

    #[test]
    fn config_is_text() {
        let output = apply(Action::Config, &Filters::default(), tree()).unwrap();
        let Output::Config(text) = output else {
            panic!("expected config text");
        };
        assert!(text.contains("    \"/gpu\",\n"));
    }

    #[test]
    fn passthrough_is_annotated_dtb() {
        let Some(Output::Dtb(dtb)) = apply(Action::Passthrough, &Filters::default(), tree())
        else {
            panic!("expected a blob");
        };
        let decoded = DeviceTree::from_dtb(&dtb).unwrap();
        let gpu = decoded.find_node("/gpu").unwrap();
        assert_eq!(gpu.property_index(passthrough::XEN_PASSTHROUGH), Some(0));
    }

    #[test]
    fn empty_partial_tree_yields_nothing() {
        let empty = DeviceTree::new(DeviceTreeNode::new(""));
        assert_eq!(apply(Action::PartialDtb, &Filters::default(), empty), None);
    }

    #[test]
    fn unreadable_source_is_an_error() {
        let err = run(
            Action::Config,
            &Filters::default(),
            Path::new("/nonexistent/dtpass/source.dtb"),
            Path::new("/nonexistent/dtpass/out"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}

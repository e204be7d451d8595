// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pre-order traversal of the nodes below a root, paired with their paths.

use dtpass_device_tree::model::DeviceTreeNode;

/// Returns the path of the entry `name` inside the node at `parent`.
///
/// The root's path is `/`; its child `a` is `/a` and grandchild `b` is
/// `/a/b`.
#[must_use]
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Iterator over every node below a root, depth first, in entry order.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<(String, &'a DeviceTreeNode)>,
}

impl<'a> Descendants<'a> {
    fn push_children(&mut self, path: &str, node: &'a DeviceTreeNode) {
        let start = self.stack.len();
        self.stack.extend(
            node.children()
                .map(|child| (child_path(path, child.name()), child)),
        );
        self.stack[start..].reverse();
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (String, &'a DeviceTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        self.push_children(&path, node);
        Some((path, node))
    }
}

/// Returns an iterator over every node below `root` together with its path.
///
/// The root itself is not visited.
#[must_use]
pub fn descendants(root: &DeviceTreeNode) -> Descendants<'_> {
    let mut walk = Descendants { stack: Vec::new() };
    walk.push_children("/", root);
    walk
}

/// Calls `visit` on every node below `root`, in the same order as
/// [`descendants`]. A node is visited before its children.
pub fn walk_mut<F>(root: &mut DeviceTreeNode, visit: &mut F)
where
    F: FnMut(&str, &mut DeviceTreeNode),
{
    for child in root.children_mut() {
        visit_mut("/", child, visit);
    }
}

fn visit_mut<F>(parent: &str, node: &mut DeviceTreeNode, visit: &mut F)
where
    F: FnMut(&str, &mut DeviceTreeNode),
{
    let path = child_path(parent, node.name());
    visit(&path, node);
    for child in node.children_mut() {
        visit_mut(&path, child, visit);
    }
}

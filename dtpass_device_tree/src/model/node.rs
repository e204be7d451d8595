// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};

use indexmap::IndexMap;
use indexmap::map::Entry;
use log::warn;
use twox_hash::xxhash64;

use super::property::DeviceTreeProperty;
use crate::error::Error;
use crate::fdt::FdtNode;

const HASH_SEED: u64 = 0xdead_cafe;

type EntryMap = IndexMap<String, NodeEntry, xxhash64::State>;

/// One item in a node's ordered list of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEntry {
    /// A child node.
    Node(DeviceTreeNode),
    /// A property of the node.
    Property(DeviceTreeProperty),
}

impl NodeEntry {
    /// Returns the name of the child node or property.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Node(node) => node.name(),
            Self::Property(property) => property.name(),
        }
    }
}

impl From<DeviceTreeNode> for NodeEntry {
    fn from(node: DeviceTreeNode) -> Self {
        Self::Node(node)
    }
}

impl From<DeviceTreeProperty> for NodeEntry {
    fn from(property: DeviceTreeProperty) -> Self {
        Self::Property(property)
    }
}

/// A mutable, in-memory representation of a device tree node.
///
/// Properties and children share one [`IndexMap`] keyed by name, which
/// provides O(1) lookups while preserving the order in which entries were
/// added. Names are unique within a node: adding an entry whose name is
/// already taken replaces the existing entry in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeNode {
    name: String,
    entries: EntryMap,
}

impl Default for DeviceTreeNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            entries: IndexMap::with_hasher(xxhash64::State::with_seed(HASH_SEED)),
        }
    }
}

impl DeviceTreeNode {
    /// Creates a new [`DeviceTreeNode`] with the given name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::DeviceTreeNode;
    /// let node = DeviceTreeNode::new("my-node");
    /// assert_eq!(node.name(), "my-node");
    /// assert!(node.is_empty());
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a new [`DeviceTreeNodeBuilder`] with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DeviceTreeNodeBuilder {
        DeviceTreeNodeBuilder::new(name)
    }

    /// Returns the name of this node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of properties and children of this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this node has neither properties nor children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the properties and children of this node, in
    /// order.
    pub fn entries(&self) -> impl Iterator<Item = &NodeEntry> {
        self.entries.values()
    }

    /// Returns an iterator over the properties of this node.
    pub fn properties(&self) -> impl Iterator<Item = &DeviceTreeProperty> {
        self.entries.values().filter_map(|entry| match entry {
            NodeEntry::Property(property) => Some(property),
            NodeEntry::Node(_) => None,
        })
    }

    /// Returns an iterator over the children of this node.
    pub fn children(&self) -> impl Iterator<Item = &DeviceTreeNode> {
        self.entries.values().filter_map(|entry| match entry {
            NodeEntry::Node(node) => Some(node),
            NodeEntry::Property(_) => None,
        })
    }

    /// Returns a mutable iterator over the children of this node.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut DeviceTreeNode> {
        self.entries.values_mut().filter_map(|entry| match entry {
            NodeEntry::Node(node) => Some(node),
            NodeEntry::Property(_) => None,
        })
    }

    /// Finds a property by its name and returns a reference to it.
    ///
    /// Returns `None` if there is no entry with this name, or if the entry
    /// is a child node.
    ///
    /// # Performance
    ///
    /// This is a constant-time operation.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};
    /// let mut node = DeviceTreeNode::new("my-node");
    /// node.add_property(DeviceTreeProperty::words("my-prop", [1, 2]));
    /// let prop = node.property("my-prop").unwrap();
    /// assert_eq!(prop.as_words(), Some(&[1, 2][..]));
    /// assert!(node.property("other").is_none());
    /// ```
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&DeviceTreeProperty> {
        match self.entries.get(name)? {
            NodeEntry::Property(property) => Some(property),
            NodeEntry::Node(_) => None,
        }
    }

    /// Returns true if this node has a property with the given name.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Returns the position of the named property among this node's entries.
    #[must_use]
    pub fn property_index(&self, name: &str) -> Option<usize> {
        match self.entries.get_full(name)? {
            (index, _, NodeEntry::Property(_)) => Some(index),
            (_, _, NodeEntry::Node(_)) => None,
        }
    }

    /// Appends a property to this node, or replaces the property with the
    /// same name where it stands.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};
    /// let mut node = DeviceTreeNode::new("uart");
    /// node.add_property(DeviceTreeProperty::strings("status", ["okay"]));
    /// node.add_property(DeviceTreeProperty::words("reg", [0, 0x1000]));
    /// node.set_property(DeviceTreeProperty::strings("status", ["disabled"]));
    /// assert_eq!(node.property_index("status"), Some(0));
    /// assert_eq!(node.property("status").unwrap().first_string(), Some("disabled"));
    /// ```
    pub fn set_property(&mut self, property: DeviceTreeProperty) {
        self.entries
            .insert(property.name().to_owned(), NodeEntry::Property(property));
    }

    /// Adds a property to the end of this node.
    ///
    /// An existing entry with the same name is replaced in place.
    pub fn add_property(&mut self, property: DeviceTreeProperty) {
        self.set_property(property);
    }

    /// Inserts a property at `index` in this node's entries, shifting later
    /// entries back.
    ///
    /// An existing entry with the same name is moved to `index` and
    /// replaced.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than [`len`](Self::len).
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::{DeviceTreeNode, DeviceTreeProperty};
    /// let mut node = DeviceTreeNode::new("gpu");
    /// node.add_property(DeviceTreeProperty::words("iommus", [1, 2]));
    /// node.insert_property(0, DeviceTreeProperty::empty("xen,passthrough"));
    /// assert_eq!(node.property_index("xen,passthrough"), Some(0));
    /// assert_eq!(node.property_index("iommus"), Some(1));
    /// ```
    pub fn insert_property(&mut self, index: usize, property: DeviceTreeProperty) {
        self.entries.shift_insert(
            index,
            property.name().to_owned(),
            NodeEntry::Property(property),
        );
    }

    /// Removes a property from this node by its name.
    ///
    /// A child node with the given name is left untouched.
    ///
    /// # Performance
    ///
    /// This is a linear-time operation, as it needs to shift elements after
    /// the removed property.
    pub fn remove_property(&mut self, name: &str) -> Option<DeviceTreeProperty> {
        self.property_index(name)?;
        match self.entries.shift_remove(name)? {
            NodeEntry::Property(property) => Some(property),
            NodeEntry::Node(_) => None,
        }
    }

    /// Finds a child by its name and returns a reference to it.
    ///
    /// # Performance
    ///
    /// This is a constant-time operation.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DeviceTreeNode> {
        match self.entries.get(name)? {
            NodeEntry::Node(node) => Some(node),
            NodeEntry::Property(_) => None,
        }
    }

    /// Finds a child by its name and returns a mutable reference to it.
    ///
    /// # Performance
    ///
    /// This is a constant-time operation.
    #[must_use]
    pub fn child_mut(&mut self, name: &str) -> Option<&mut DeviceTreeNode> {
        match self.entries.get_mut(name)? {
            NodeEntry::Node(node) => Some(node),
            NodeEntry::Property(_) => None,
        }
    }

    /// Adds a child to the end of this node.
    ///
    /// An existing entry with the same name is replaced in place.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::DeviceTreeNode;
    /// let mut node = DeviceTreeNode::new("my-node");
    /// node.add_child(DeviceTreeNode::new("child"));
    /// assert_eq!(node.child("child").unwrap().name(), "child");
    /// ```
    pub fn add_child(&mut self, child: DeviceTreeNode) {
        self.entries
            .insert(child.name().to_owned(), NodeEntry::Node(child));
    }

    /// Appends an entry, keeping the first one if the name is already
    /// taken. Returns false if the entry was dropped.
    fn push_first(&mut self, entry: NodeEntry) -> bool {
        match self.entries.entry(entry.name().to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(_) => false,
        }
    }
}

impl<'a> TryFrom<FdtNode<'a>> for DeviceTreeNode {
    type Error = Error;

    fn try_from(node: FdtNode<'a>) -> Result<Self, Self::Error> {
        let mut result = DeviceTreeNode::new(node.name()?.to_string());

        for property in node.properties() {
            let property = DeviceTreeProperty::try_from(property?)?;
            let name = property.name().to_owned();
            if !result.push_first(property.into()) {
                warn!("node {:?}: ignoring duplicate property {name:?}", result.name);
            }
        }

        for child in node.children() {
            let child = DeviceTreeNode::try_from(child?)?;
            let name = child.name().to_owned();
            if !result.push_first(child.into()) {
                warn!("node {:?}: ignoring duplicate child {name:?}", result.name);
            }
        }

        Ok(result)
    }
}

/// A builder for creating [`DeviceTreeNode`]s.
#[derive(Debug, Default)]
pub struct DeviceTreeNodeBuilder {
    node: DeviceTreeNode,
}

impl DeviceTreeNodeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            node: DeviceTreeNode::new(name),
        }
    }

    /// Adds a property to the node.
    #[must_use]
    pub fn property(mut self, property: DeviceTreeProperty) -> Self {
        self.node.add_property(property);
        self
    }

    /// Adds a child to the node.
    #[must_use]
    pub fn child(mut self, child: DeviceTreeNode) -> Self {
        self.node.add_child(child);
        self
    }

    /// Builds the `DeviceTreeNode`.
    #[must_use]
    pub fn build(self) -> DeviceTreeNode {
        self.node
    }
}

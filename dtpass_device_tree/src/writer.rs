// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::ToOwned;
use alloc::collections::btree_map::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use zerocopy::IntoBytes;

use crate::fdt::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_LAST_COMP_VERSION, FDT_MAGIC, FDT_PROP,
    FDT_VERSION, Fdt, FdtHeader,
};
use crate::memreserve::{MemoryReservation, RawReservation};
use crate::model::{DeviceTree, DeviceTreeNode, DeviceTreeProperty};

/// Deduplicates property names in the strings block.
#[derive(Default)]
struct StringTable {
    block: Vec<u8>,
    offsets: BTreeMap<String, u32>,
}

impl StringTable {
    fn offset_of(&mut self, name: &str) -> u32 {
        if let Some(offset) = self.offsets.get(name) {
            return *offset;
        }
        let offset = u32::try_from(self.block.len()).expect("string block length exceeds u32");
        self.block.extend_from_slice(name.as_bytes());
        self.block.push(0);
        self.offsets.insert(name.to_owned(), offset);
        offset
    }
}

pub(crate) fn to_bytes(tree: &DeviceTree) -> Vec<u8> {
    let memory_reservations = write_memory_reservations(&tree.memory_reservations);
    let (struct_block, strings_block) = write_root(tree.root());

    let off_mem_rsvmap = size_of::<FdtHeader>();
    let off_dt_struct = off_mem_rsvmap + memory_reservations.len();
    let off_dt_strings = off_dt_struct + struct_block.len();
    let totalsize = off_dt_strings + strings_block.len();

    let header = FdtHeader {
        magic: FDT_MAGIC.into(),
        totalsize: u32::try_from(totalsize)
            .expect("totalsize exceeds u32")
            .into(),
        off_dt_struct: u32::try_from(off_dt_struct)
            .expect("off_dt_struct exceeds u32")
            .into(),
        off_dt_strings: u32::try_from(off_dt_strings)
            .expect("off_dt_strings exceeds u32")
            .into(),
        off_mem_rsvmap: u32::try_from(off_mem_rsvmap)
            .expect("off_mem_rsvmap exceeds u32")
            .into(),
        version: FDT_VERSION.into(),
        last_comp_version: FDT_LAST_COMP_VERSION.into(),
        boot_cpuid_phys: tree.boot_cpuid_phys.into(),
        size_dt_strings: u32::try_from(strings_block.len())
            .expect("size_dt_strings exceeds u32")
            .into(),
        size_dt_struct: u32::try_from(struct_block.len())
            .expect("size_dt_struct exceeds u32")
            .into(),
    };

    let mut dtb = Vec::with_capacity(totalsize);
    dtb.extend_from_slice(header.as_bytes());
    dtb.extend_from_slice(&memory_reservations);
    dtb.extend_from_slice(&struct_block);
    dtb.extend_from_slice(&strings_block);
    dtb
}

fn write_memory_reservations(reservations: &[MemoryReservation]) -> Vec<u8> {
    let mut block = Vec::new();
    let terminator = MemoryReservation::new(0, 0);
    for reservation in reservations.iter().chain([&terminator]) {
        block.extend_from_slice(RawReservation::from(reservation).as_bytes());
    }
    block
}

fn write_root(root_node: &DeviceTreeNode) -> (Vec<u8>, Vec<u8>) {
    let mut struct_block = Vec::new();
    let mut strings = StringTable::default();

    write_node(&mut struct_block, &mut strings, root_node);
    struct_block.extend_from_slice(&FDT_END.to_be_bytes());

    (struct_block, strings.block)
}

fn write_node(struct_block: &mut Vec<u8>, strings: &mut StringTable, node: &DeviceTreeNode) {
    struct_block.extend_from_slice(&FDT_BEGIN_NODE.to_be_bytes());
    struct_block.extend_from_slice(node.name().as_bytes());
    struct_block.push(0);
    align(struct_block);

    // Properties must precede subnodes in the structure block.
    for prop in node.properties() {
        write_prop(struct_block, strings, prop);
    }
    for child in node.children() {
        write_node(struct_block, strings, child);
    }

    struct_block.extend_from_slice(&FDT_END_NODE.to_be_bytes());
}

fn write_prop(struct_block: &mut Vec<u8>, strings: &mut StringTable, prop: &DeviceTreeProperty) {
    let name_offset = strings.offset_of(prop.name());
    let value = prop.to_bytes();

    struct_block.extend_from_slice(&FDT_PROP.to_be_bytes());
    struct_block.extend_from_slice(
        &u32::try_from(value.len())
            .expect("property value length exceeds u32")
            .to_be_bytes(),
    );
    struct_block.extend_from_slice(&name_offset.to_be_bytes());
    struct_block.extend_from_slice(&value);
    align(struct_block);
}

fn align(vec: &mut Vec<u8>) {
    let new_len = Fdt::align_tag_offset(vec.len());
    vec.resize(new_len, 0);
}

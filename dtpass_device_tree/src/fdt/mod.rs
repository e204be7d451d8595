// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-only API for parsing and traversing a [Flattened Device Tree (FDT)].
//!
//! This module provides the [`Fdt`] struct, which is the entry point for
//! parsing and traversing an FDT blob. The API performs no memory allocation
//! and provides a zero-copy view of the FDT data.
//!
//! [Flattened Device Tree (FDT)]: https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html

mod node;
mod property;

use core::ffi::CStr;
use core::fmt;

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::big_endian;

use crate::error::{Error, ErrorKind};
use crate::memreserve::{MemoryReservation, RawReservation};
pub use node::FdtNode;
pub use property::FdtProperty;

/// Version of the FDT specification supported by this library.
pub(crate) const FDT_VERSION: u32 = 17;
/// Oldest version a blob written by this library stays compatible with.
pub(crate) const FDT_LAST_COMP_VERSION: u32 = 16;
pub(crate) const FDT_TAGSIZE: usize = size_of::<u32>();
pub(crate) const FDT_MAGIC: u32 = 0xd00d_feed;
pub(crate) const FDT_BEGIN_NODE: u32 = 0x1;
pub(crate) const FDT_END_NODE: u32 = 0x2;
pub(crate) const FDT_PROP: u32 = 0x3;
pub(crate) const FDT_NOP: u32 = 0x4;
pub(crate) const FDT_END: u32 = 0x9;

#[repr(C, packed)]
#[derive(Debug, Copy, Clone, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct FdtHeader {
    /// Magic number of the device tree.
    pub(crate) magic: big_endian::U32,
    /// Total size of the device tree.
    pub(crate) totalsize: big_endian::U32,
    /// Offset of the device tree structure.
    pub(crate) off_dt_struct: big_endian::U32,
    /// Offset of the device tree strings.
    pub(crate) off_dt_strings: big_endian::U32,
    /// Offset of the memory reservation map.
    pub(crate) off_mem_rsvmap: big_endian::U32,
    /// Version of the device tree.
    pub(crate) version: big_endian::U32,
    /// Last compatible version of the device tree.
    pub(crate) last_comp_version: big_endian::U32,
    /// Physical ID of the boot CPU.
    pub(crate) boot_cpuid_phys: big_endian::U32,
    /// Size of the device tree strings.
    pub(crate) size_dt_strings: big_endian::U32,
    /// Size of the device tree structure.
    pub(crate) size_dt_struct: big_endian::U32,
}

impl FdtHeader {
    pub(crate) fn magic(&self) -> u32 {
        self.magic.get()
    }

    pub(crate) fn totalsize(&self) -> u32 {
        self.totalsize.get()
    }

    pub(crate) fn off_dt_struct(&self) -> u32 {
        self.off_dt_struct.get()
    }

    pub(crate) fn off_dt_strings(&self) -> u32 {
        self.off_dt_strings.get()
    }

    pub(crate) fn off_mem_rsvmap(&self) -> u32 {
        self.off_mem_rsvmap.get()
    }

    pub(crate) fn version(&self) -> u32 {
        self.version.get()
    }

    pub(crate) fn last_comp_version(&self) -> u32 {
        self.last_comp_version.get()
    }

    pub(crate) fn boot_cpuid_phys(&self) -> u32 {
        self.boot_cpuid_phys.get()
    }

    pub(crate) fn size_dt_strings(&self) -> u32 {
        self.size_dt_strings.get()
    }

    pub(crate) fn size_dt_struct(&self) -> u32 {
        self.size_dt_struct.get()
    }
}

/// A flattened device tree.
#[derive(Debug, Clone, Copy)]
pub struct Fdt<'a> {
    pub(crate) data: &'a [u8],
}

/// A token in the device tree structure.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FdtToken {
    BeginNode,
    EndNode,
    Prop,
    Nop,
    End,
}

impl TryFrom<u32> for FdtToken {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            FDT_BEGIN_NODE => Ok(FdtToken::BeginNode),
            FDT_END_NODE => Ok(FdtToken::EndNode),
            FDT_PROP => Ok(FdtToken::Prop),
            FDT_NOP => Ok(FdtToken::Nop),
            FDT_END => Ok(FdtToken::End),
            _ => Err(value),
        }
    }
}

impl<'a> Fdt<'a> {
    /// Creates a new `Fdt` from the given byte slice.
    ///
    /// Bytes past the `totalsize` recorded in the header are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is truncated, the magic number is
    /// wrong, the version is incompatible with version 17, or the blocks
    /// named by the header do not fit in `data`.
    pub fn new(data: &'a [u8]) -> Result<Self, Error> {
        let header_size = size_of::<FdtHeader>();
        if data.len() < header_size {
            return Err(Error::new(ErrorKind::InvalidLength, 0));
        }

        let fdt = Fdt { data };
        let header = fdt.header();

        if header.magic() != FDT_MAGIC {
            return Err(Error::new(ErrorKind::InvalidMagic, 0));
        }
        if !(header.last_comp_version()..=header.version()).contains(&FDT_VERSION) {
            return Err(Error::new(
                ErrorKind::UnsupportedVersion(header.version()),
                20,
            ));
        }

        let totalsize = header.totalsize() as usize;
        if totalsize < header_size || totalsize > data.len() {
            return Err(Error::new(ErrorKind::InvalidLength, 4));
        }
        let struct_end = header.off_dt_struct() as usize + header.size_dt_struct() as usize;
        if struct_end > totalsize {
            return Err(Error::new(ErrorKind::InvalidLength, 8));
        }
        let strings_end = header.off_dt_strings() as usize + header.size_dt_strings() as usize;
        if strings_end > totalsize {
            return Err(Error::new(ErrorKind::InvalidLength, 12));
        }
        if header.off_mem_rsvmap() as usize > totalsize {
            return Err(Error::new(ErrorKind::InvalidLength, 16));
        }

        Ok(Fdt {
            data: &data[..totalsize],
        })
    }

    /// Returns the header of the device tree.
    pub(crate) fn header(&self) -> &FdtHeader {
        let (header, _remaining_bytes) = FdtHeader::ref_from_prefix(self.data)
            .expect("new() checks if the slice is at least as big as the header");
        header
    }

    /// Returns the physical ID of the boot CPU recorded in the header.
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.header().boot_cpuid_phys()
    }

    /// Returns an iterator over the memory reservation block.
    ///
    /// The terminating all-zero entry is not yielded.
    pub fn memory_reservations(&self) -> impl Iterator<Item = MemoryReservation> + use<'a> {
        let data: &'a [u8] = self.data;
        let start = self.header().off_mem_rsvmap() as usize;
        data.get(start..)
            .unwrap_or_default()
            .chunks_exact(size_of::<RawReservation>())
            .map_while(|chunk| {
                RawReservation::ref_from_bytes(chunk)
                    .ok()
                    .map(MemoryReservation::from)
            })
            .take_while(|reservation| !reservation.is_terminator())
    }

    /// Returns the root node of the device tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure block does not start with a node.
    pub fn root(&self) -> Result<FdtNode<'_>, Error> {
        let offset = self.header().off_dt_struct() as usize;
        let token = self.read_token(offset)?;
        if token != FdtToken::BeginNode {
            return Err(Error::new(ErrorKind::BadToken(FDT_BEGIN_NODE), offset));
        }
        Ok(FdtNode { fdt: self, offset })
    }

    /// Reads a big-endian `u32` at the given offset.
    pub(crate) fn read_u32(&self, offset: usize) -> Result<u32, Error> {
        self.data
            .get(offset..)
            .and_then(|rest| big_endian::U32::ref_from_prefix(rest).ok())
            .map(|(val, _)| val.get())
            .ok_or(Error::new(ErrorKind::InvalidLength, offset))
    }

    pub(crate) fn read_token(&self, offset: usize) -> Result<FdtToken, Error> {
        let val = self.read_u32(offset)?;
        FdtToken::try_from(val).map_err(|t| Error::new(ErrorKind::BadToken(t), offset))
    }

    /// Return a string from the string block.
    pub(crate) fn string(&self, string_block_offset: usize) -> Result<&'a str, Error> {
        let header = self.header();
        let strings_start = header.off_dt_strings() as usize;
        let strings_size = header.size_dt_strings() as usize;
        let strings_end = strings_start + strings_size;
        let string_start = strings_start + string_block_offset;

        if string_start >= strings_end {
            return Err(Error::new(ErrorKind::InvalidLength, string_start));
        }

        self.string_at_offset(string_start, Some(strings_end))
    }

    /// Return a NUL-terminated string from a given offset.
    pub(crate) fn string_at_offset(
        &self,
        offset: usize,
        end: Option<usize>,
    ) -> Result<&'a str, Error> {
        let data: &'a [u8] = self.data;
        let slice = match end {
            Some(end) => data.get(offset..end),
            None => data.get(offset..),
        }
        .ok_or(Error::new(ErrorKind::InvalidLength, offset))?;

        match CStr::from_bytes_until_nul(slice).map(CStr::to_str) {
            Ok(Ok(val)) => Ok(val),
            _ => Err(Error::new(ErrorKind::InvalidString, offset)),
        }
    }

    pub(crate) fn find_string_end(&self, start: usize) -> Result<usize, Error> {
        let mut offset = start;
        loop {
            match self.data.get(offset) {
                Some(0) => return Ok(offset + 1),
                Some(_) => {}
                None => return Err(Error::new(ErrorKind::InvalidString, start)),
            }
            offset += 1;
        }
    }

    /// Returns the offset of the first token after the node name.
    pub(crate) fn node_body_offset(&self, offset: usize) -> Result<usize, Error> {
        // Skip FDT_BEGIN_NODE, then the name.
        let offset = self.find_string_end(offset + FDT_TAGSIZE)?;
        Ok(Self::align_tag_offset(offset))
    }

    pub(crate) fn next_sibling_offset(&self, offset: usize) -> crate::Result<usize> {
        let mut offset = self.node_body_offset(offset)?;

        loop {
            match self.read_token(offset)? {
                FdtToken::Prop => {
                    offset += FDT_TAGSIZE; // skip FDT_PROP
                    offset = self.next_property_offset(offset)?;
                }
                FdtToken::Nop => offset += FDT_TAGSIZE,
                FdtToken::BeginNode => offset = self.next_sibling_offset(offset)?,
                FdtToken::EndNode => return Ok(offset + FDT_TAGSIZE),
                FdtToken::End => return Err(Error::new(ErrorKind::BadToken(FDT_END), offset)),
            }
        }
    }

    pub(crate) fn next_property_offset(&self, mut offset: usize) -> crate::Result<usize> {
        let len = self.read_u32(offset)? as usize;
        offset += FDT_TAGSIZE; // skip value length
        offset += FDT_TAGSIZE; // skip name offset
        offset += len; // skip property value

        if offset > self.data.len() {
            return Err(Error::new(ErrorKind::InvalidLength, offset));
        }
        Ok(Self::align_tag_offset(offset))
    }

    pub(crate) fn align_tag_offset(offset: usize) -> usize {
        offset.next_multiple_of(FDT_TAGSIZE)
    }
}

impl fmt::Display for Fdt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/dts-v1/;")?;
        writeln!(f)?;
        let mut has_reservations = false;
        for reservation in self.memory_reservations() {
            writeln!(
                f,
                "/memreserve/ {:#x} {:#x};",
                reservation.address(),
                reservation.size()
            )?;
            has_reservations = true;
        }
        if has_reservations {
            writeln!(f)?;
        }
        let root = self.root().map_err(|_| fmt::Error)?;
        root.fmt_recursive(f, 0)
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Device tree memory reservations.

use zerocopy::big_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// A 64-bit memory reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryReservation {
    address: u64,
    size: u64,
}

impl MemoryReservation {
    /// Creates a new [`MemoryReservation`].
    #[must_use]
    pub fn new(address: u64, size: u64) -> Self {
        Self { address, size }
    }

    /// Returns the physical address of the reserved memory region.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Returns the size of the reserved memory region.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns true for the all-zero entry that terminates the block.
    pub(crate) fn is_terminator(&self) -> bool {
        self.address == 0 && self.size == 0
    }
}

/// On-blob layout of a reservation block entry.
#[repr(C, packed)]
#[derive(Debug, Copy, Clone, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct RawReservation {
    pub(crate) address: big_endian::U64,
    pub(crate) size: big_endian::U64,
}

impl From<&RawReservation> for MemoryReservation {
    fn from(raw: &RawReservation) -> Self {
        Self::new(raw.address.get(), raw.size.get())
    }
}

impl From<&MemoryReservation> for RawReservation {
    fn from(reservation: &MemoryReservation) -> Self {
        Self {
            address: reservation.address.into(),
            size: reservation.size.into(),
        }
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A read-only API for inspecting a device tree property.

use core::fmt;

use super::{FDT_TAGSIZE, Fdt, FdtToken};
use crate::error::{Error, ErrorKind};
use crate::model::PropertyValue;

/// A property of a device tree node.
#[derive(Debug, PartialEq)]
pub struct FdtProperty<'a> {
    name: &'a str,
    value: &'a [u8],
}

impl<'a> FdtProperty<'a> {
    /// Returns the name of this property.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the value of this property.
    #[must_use]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    pub(crate) fn fmt(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = indent)?;

        match PropertyValue::from_bytes(self.value) {
            PropertyValue::Empty => writeln!(f, ";"),
            PropertyValue::Strings(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    let separator = if i == 0 { " = " } else { ", " };
                    write!(f, "{separator}\"{s}\"")?;
                }
                writeln!(f, ";")
            }
            PropertyValue::Words(words) => {
                write!(f, " = <")?;
                for (i, val) in words.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "0x{val:02x}")?;
                }
                writeln!(f, ">;")
            }
            PropertyValue::Bytes(bytes) => {
                write!(f, " = [")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                writeln!(f, "];")
            }
        }
    }
}

/// An iterator over the properties of a device tree node.
pub(crate) enum FdtPropIter<'a> {
    Start { fdt: &'a Fdt<'a>, offset: usize },
    Running { fdt: &'a Fdt<'a>, offset: usize },
    Error,
}

impl<'a> Iterator for FdtPropIter<'a> {
    type Item = Result<FdtProperty<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Start { fdt, offset } => {
                let fdt: &'a Fdt<'a> = *fdt;
                let offset = match fdt.node_body_offset(*offset) {
                    Ok(offset) => offset,
                    Err(e) => {
                        *self = Self::Error;
                        return Some(Err(e));
                    }
                };
                *self = Self::Running { fdt, offset };
                self.next()
            }
            Self::Running { fdt, offset } => match Self::try_next(*fdt, offset) {
                Some(Ok(val)) => Some(Ok(val)),
                Some(Err(e)) => {
                    *self = Self::Error;
                    Some(Err(e))
                }
                None => None,
            },
            Self::Error => None,
        }
    }
}

impl<'a> FdtPropIter<'a> {
    fn try_next(fdt: &'a Fdt<'a>, offset: &mut usize) -> Option<Result<FdtProperty<'a>, Error>> {
        loop {
            let token = match fdt.read_token(*offset) {
                Ok(token) => token,
                Err(e) => return Some(Err(e)),
            };
            match token {
                FdtToken::Prop => return Some(Self::read_property(fdt, offset)),
                FdtToken::Nop => *offset += FDT_TAGSIZE,
                _ => return None,
            }
        }
    }

    fn read_property(fdt: &'a Fdt<'a>, offset: &mut usize) -> Result<FdtProperty<'a>, Error> {
        let len = fdt.read_u32(*offset + FDT_TAGSIZE)? as usize;
        let nameoff = fdt.read_u32(*offset + 2 * FDT_TAGSIZE)? as usize;
        let prop_offset = *offset + 3 * FDT_TAGSIZE;
        let data: &'a [u8] = fdt.data;
        let value = data
            .get(prop_offset..prop_offset + len)
            .ok_or(Error::new(ErrorKind::InvalidLength, prop_offset))?;
        let name = fdt.string(nameoff)?;
        *offset = Fdt::align_tag_offset(prop_offset + len);
        Ok(FdtProperty { name, value })
    }
}

// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::Error;
use crate::fdt::FdtProperty;

/// The typed value of a [`DeviceTreeProperty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// A presence-only marker, such as `dma-coherent;`.
    Empty,
    /// A list of big-endian 32-bit cells.
    Words(Vec<u32>),
    /// A list of NUL-terminated strings.
    Strings(Vec<String>),
    /// Anything else, kept verbatim.
    Bytes(Vec<u8>),
}

impl PropertyValue {
    /// Infers the value type of raw property bytes.
    ///
    /// A zero-length value is [`Empty`](Self::Empty). A value made of
    /// printable ASCII and NULs that ends with a NUL and has no two
    /// consecutive NULs is [`Strings`](Self::Strings). Otherwise a value
    /// whose length is a multiple of four is [`Words`](Self::Words), and
    /// anything left is [`Bytes`](Self::Bytes).
    ///
    /// [`to_bytes`](Self::to_bytes) reproduces `raw` exactly for every
    /// variant this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::PropertyValue;
    /// assert_eq!(PropertyValue::from_bytes(b""), PropertyValue::Empty);
    /// assert_eq!(
    ///     PropertyValue::from_bytes(b"okay\0"),
    ///     PropertyValue::Strings(vec!["okay".into()])
    /// );
    /// assert_eq!(
    ///     PropertyValue::from_bytes(&[0, 0, 0, 1]),
    ///     PropertyValue::Words(vec![1])
    /// );
    /// assert_eq!(
    ///     PropertyValue::from_bytes(&[1, 2, 3]),
    ///     PropertyValue::Bytes(vec![1, 2, 3])
    /// );
    /// ```
    #[must_use]
    pub fn from_bytes(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }

        let is_printable = raw
            .iter()
            .all(|&ch| ch.is_ascii_graphic() || ch == b' ' || ch == 0);
        let has_empty = raw.windows(2).any(|window| window == [0, 0]);
        if is_printable && raw.ends_with(&[0]) && !has_empty {
            let strings = raw[..raw.len() - 1]
                .split(|&ch| ch == 0)
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect();
            return Self::Strings(strings);
        }

        if raw.len().is_multiple_of(4) {
            let words = raw
                .chunks_exact(4)
                .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            return Self::Words(words);
        }

        Self::Bytes(raw.to_vec())
    }

    /// Encodes the value into its on-blob byte representation.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Empty => Vec::new(),
            Self::Words(words) => words.iter().flat_map(|word| word.to_be_bytes()).collect(),
            Self::Strings(strings) => {
                let mut bytes = Vec::new();
                for s in strings {
                    bytes.extend_from_slice(s.as_bytes());
                    bytes.push(0);
                }
                bytes
            }
            Self::Bytes(bytes) => bytes.clone(),
        }
    }
}

/// A mutable, in-memory representation of a device tree property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeProperty {
    name: String,
    value: PropertyValue,
}

impl DeviceTreeProperty {
    /// Creates a new `DeviceTreeProperty` with the given name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Creates a presence-only property.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::{DeviceTreeProperty, PropertyValue};
    /// let prop = DeviceTreeProperty::empty("xen,passthrough");
    /// assert_eq!(prop.value(), &PropertyValue::Empty);
    /// ```
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::Empty)
    }

    /// Creates a property holding a list of 32-bit cells.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::DeviceTreeProperty;
    /// let prop = DeviceTreeProperty::words("interrupts", [0, 40, 4]);
    /// assert_eq!(prop.as_words(), Some(&[0, 40, 4][..]));
    /// ```
    #[must_use]
    pub fn words(name: impl Into<String>, words: impl Into<Vec<u32>>) -> Self {
        Self::new(name, PropertyValue::Words(words.into()))
    }

    /// Creates a property holding a list of strings.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dtpass_device_tree::model::DeviceTreeProperty;
    /// let prop = DeviceTreeProperty::strings("status", ["disabled"]);
    /// assert_eq!(prop.first_string(), Some("disabled"));
    /// ```
    #[must_use]
    pub fn strings<I, S>(name: impl Into<String>, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            PropertyValue::Strings(strings.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates a property holding opaque bytes.
    #[must_use]
    pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, PropertyValue::Bytes(bytes.into()))
    }

    /// Creates a property from raw blob bytes, inferring the value type.
    #[must_use]
    pub fn from_raw(name: impl Into<String>, raw: &[u8]) -> Self {
        Self::new(name, PropertyValue::from_bytes(raw))
    }

    /// Returns the name of this property.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of this property.
    #[must_use]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Returns the cells if this is a [`PropertyValue::Words`] property.
    #[must_use]
    pub fn as_words(&self) -> Option<&[u32]> {
        match &self.value {
            PropertyValue::Words(words) => Some(words),
            _ => None,
        }
    }

    /// Returns the strings if this is a [`PropertyValue::Strings`] property.
    #[must_use]
    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.value {
            PropertyValue::Strings(strings) => Some(strings),
            _ => None,
        }
    }

    /// Returns the first string of a [`PropertyValue::Strings`] property.
    #[must_use]
    pub fn first_string(&self) -> Option<&str> {
        self.as_strings()?.first().map(String::as_str)
    }

    /// Returns the on-blob bytes of the value.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.value.to_bytes()
    }
}

impl<'a> TryFrom<FdtProperty<'a>> for DeviceTreeProperty {
    type Error = Error;

    fn try_from(prop: FdtProperty<'a>) -> Result<Self, Self::Error> {
        Ok(DeviceTreeProperty::from_raw(prop.name().to_string(), prop.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn infers_string_list() {
        let value = PropertyValue::from_bytes(b"arm,gic-400\0arm,cortex-a15-gic\0");
        assert_eq!(
            value,
            PropertyValue::Strings(vec!["arm,gic-400".into(), "arm,cortex-a15-gic".into()])
        );
    }

    #[test]
    fn zero_cells_are_not_strings() {
        let value = PropertyValue::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0x28]);
        assert_eq!(value, PropertyValue::Words(vec![0, 0x28]));
    }

    #[test]
    fn unterminated_text_is_not_a_string() {
        let value = PropertyValue::from_bytes(b"abcd");
        assert_eq!(value, PropertyValue::Words(vec![0x6162_6364]));
    }

    #[test]
    fn odd_length_binary_is_bytes() {
        let value = PropertyValue::from_bytes(&[0xff, 0x00, 0x01, 0x02, 0x03]);
        assert_eq!(value, PropertyValue::Bytes(vec![0xff, 0x00, 0x01, 0x02, 0x03]));
    }

    #[test]
    fn inferred_values_encode_back_to_the_same_bytes() {
        let samples: [&[u8]; 6] = [
            b"",
            b"\0",
            b"okay\0",
            b"\0leading\0",
            &[0, 0, 0, 1, 0, 0, 0x10, 0],
            &[1, 2, 3],
        ];
        for raw in samples {
            assert_eq!(PropertyValue::from_bytes(raw).to_bytes(), raw);
        }
    }

    #[test]
    fn variant_accessors_reject_other_variants() {
        let status = DeviceTreeProperty::words("status", [1]);
        assert_eq!(status.first_string(), None);
        assert_eq!(status.as_words(), Some(&[1][..]));

        let compatible = DeviceTreeProperty::strings("compatible", ["a", "b"]);
        assert_eq!(compatible.as_words(), None);
        assert_eq!(compatible.first_string(), Some("a"));
    }
}

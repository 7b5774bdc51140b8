// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tag data model and address-option parsing (spec §3, §4.3).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Protocol-neutral value type of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagType {
    Bit,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Word,
    Dword,
    Lword,
}

impl TagType {
    /// Storage width in bytes, where fixed-width. Variable-width types
    /// (STRING, BYTES) return `None`; callers must consult `AddrOption`.
    pub fn fixed_width(self) -> Option<usize> {
        use TagType::*;
        match self {
            Bit | Bool | Int8 | Uint8 => Some(1),
            Int16 | Uint16 | Word => Some(2),
            Int32 | Uint32 | Float | Dword => Some(4),
            Int64 | Uint64 | Double | Lword => Some(8),
            String | Bytes => None,
        }
    }

    pub fn is_16bit(self) -> bool {
        matches!(self, TagType::Int16 | TagType::Uint16)
    }

    pub fn is_32bit(self) -> bool {
        matches!(self, TagType::Int32 | TagType::Uint32 | TagType::Float)
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, TagType::Int64 | TagType::Uint64 | TagType::Double)
    }
}

bitflags! {
    /// Attribute bitset over {READ, WRITE, SUBSCRIBE, STATIC} (spec §3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TagAttribute: u8 {
        const READ      = 0b0001;
        const WRITE     = 0b0010;
        const SUBSCRIBE = 0b0100;
        const STATIC    = 0b1000;
    }
}

impl TagAttribute {
    /// "other tags" in the change-detection protocol: READ or SUBSCRIBE,
    /// non-STATIC (spec §4.3).
    pub fn is_pollable(self) -> bool {
        !self.contains(TagAttribute::STATIC)
            && (self.contains(TagAttribute::READ) || self.contains(TagAttribute::SUBSCRIBE))
    }
}

/// 16-bit endianness: `#B` (big) or `#L` (little, default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian16 {
    Big,
    Little,
}

/// 32-bit byte-pair x word-order: `#BB|#BL|#LB|#LL` (default LL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian32 {
    BigBig,
    BigLittle,
    LittleBig,
    LittleLittle,
}

/// 64-bit endianness: `#B` or `#L` (default L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian64 {
    Big,
    Little,
}

/// STRING trailing encoding tag: H/L/D/E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringEncoding {
    /// H: high byte first.
    HighByteFirst,
    /// L: low byte first.
    LowByteFirst,
    /// D: double-byte.
    DoubleByte,
    /// E: double-byte, swapped.
    DoubleByteSwapped,
}

/// Parsed `addr_option` for a tag (spec §4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrOption {
    String { length: u16, encoding: StringEncoding },
    Bytes { length: u8 },
    Value16 { endian: Endian16 },
    Value32 { endian: Endian32 },
    Value64 { endian: Endian64 },
    Bit { bit: u8 },
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AddrOptionError {
    #[error("BYTES address requires a `.<length>` suffix")]
    MissingBytesLength,
    #[error("STRING address requires a `.<length>` suffix")]
    MissingStringLength,
    #[error("BIT address requires a `.<0..15>` suffix")]
    MissingBitOffset,
    #[error("BIT offset out of range 0..15")]
    BitOffsetOutOfRange,
}

/// Deterministic parser over the address suffix (spec §4.3).
///
/// Resolves the spec's Open Question about BYTES: validates against a
/// BYTES-specific length field rather than reusing STRING's, and operates
/// over string slices throughout rather than embedded-null-unsafe buffers.
pub fn parse_addr_option(ty: TagType, address: &str) -> Result<AddrOption, AddrOptionError> {
    match ty {
        TagType::Bytes => {
            let suffix = last_suffix(address, '.').ok_or(AddrOptionError::MissingBytesLength)?;
            let length: u8 =
                suffix.parse().map_err(|_| AddrOptionError::MissingBytesLength)?;
            if length == 0 {
                return Err(AddrOptionError::MissingBytesLength);
            }
            Ok(AddrOption::Bytes { length })
        }
        TagType::String => {
            let suffix = last_suffix(address, '.').ok_or(AddrOptionError::MissingStringLength)?;
            let (digits, tag) = split_trailing_alpha(suffix);
            let length: u16 =
                digits.parse().map_err(|_| AddrOptionError::MissingStringLength)?;
            if length == 0 {
                return Err(AddrOptionError::MissingStringLength);
            }
            let encoding = match tag {
                Some('H') => StringEncoding::HighByteFirst,
                Some('L') => StringEncoding::LowByteFirst,
                Some('D') => StringEncoding::DoubleByte,
                Some('E') => StringEncoding::DoubleByteSwapped,
                // unrecognized or absent trailing tag defaults to H, matching
                // the reference implementation's fallback.
                _ => StringEncoding::HighByteFirst,
            };
            Ok(AddrOption::String { length, encoding })
        }
        TagType::Int16 | TagType::Uint16 => {
            let endian = match last_suffix(address, '#') {
                Some("B") => Endian16::Big,
                _ => Endian16::Little,
            };
            Ok(AddrOption::Value16 { endian })
        }
        TagType::Int32 | TagType::Uint32 | TagType::Float => {
            let endian = match last_suffix(address, '#') {
                Some("BB") => Endian32::BigBig,
                Some("BL") => Endian32::BigLittle,
                Some("LB") => Endian32::LittleBig,
                _ => Endian32::LittleLittle,
            };
            Ok(AddrOption::Value32 { endian })
        }
        TagType::Int64 | TagType::Uint64 | TagType::Double => {
            let endian = match last_suffix(address, '#') {
                Some("B") => Endian64::Big,
                _ => Endian64::Little,
            };
            Ok(AddrOption::Value64 { endian })
        }
        TagType::Bit => {
            let suffix = last_suffix(address, '.').ok_or(AddrOptionError::MissingBitOffset)?;
            let bit: u8 = suffix.parse().map_err(|_| AddrOptionError::MissingBitOffset)?;
            if bit > 15 {
                return Err(AddrOptionError::BitOffsetOutOfRange);
            }
            Ok(AddrOption::Bit { bit })
        }
        TagType::Bool | TagType::Word | TagType::Dword | TagType::Lword | TagType::Int8
        | TagType::Uint8 => Ok(AddrOption::None),
    }
}

/// Text after the last occurrence of `sep`, or `None` if `sep` is absent.
fn last_suffix(s: &str, sep: char) -> Option<&str> {
    s.rfind(sep).map(|i| &s[i + sep.len_utf8()..])
}

/// Splits a suffix like `"16H"` into its leading digits and an optional
/// trailing alphabetic tag character.
fn split_trailing_alpha(s: &str) -> (&str, Option<char>) {
    match s.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&s[..s.len() - c.len_utf8()], Some(c)),
        _ => (s, None),
    }
}

/// A named, addressable point on a device (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub address: String,
    pub r#type: TagType,
    pub attribute: TagAttribute,
    pub precision: u8,
    pub decimal: f64,
    pub addr_option: AddrOption,
    pub description: String,
    /// For STATIC tags: the authoritative, owned value (no device read).
    pub static_value: Option<serde_json::Value>,
}

impl Tag {
    /// Builds a tag, parsing and validating its address option against its
    /// type. Mirrors the reference implementation's constructor-time
    /// validation (spec §3 invariant: type and addr_option consistent).
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        r#type: TagType,
        attribute: TagAttribute,
    ) -> Result<Self, AddrOptionError> {
        let address = address.into();
        let addr_option = parse_addr_option(r#type, &address)?;
        Ok(Tag {
            name: name.into(),
            address,
            r#type,
            attribute,
            precision: 0,
            decimal: 1.0,
            addr_option,
            description: String::new(),
            static_value: None,
        })
    }

    pub fn is_static(&self) -> bool {
        self.attribute.contains(TagAttribute::STATIC)
    }
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;

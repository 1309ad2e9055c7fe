//! Length-prefix layout.
//!
//! Strings and containers are preceded by their element count. With a header, every count in a
//! message uses the same fixed width, chosen from the largest count in the value (one of 1, 2, 4
//! or 8 bytes) and recorded in the metainfo byte. Without a header, or when integers are varint
//! encoded, counts are varints.

use crate::{
    util::{at_least, to_usize},
    varint, Config, EncodeSize, Error, VarintScheme,
};
use bytes::{Buf, BufMut};

/// Width of a fixed-size length field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Width {
    #[default]
    One,
    Two,
    Four,
    Eight,
}

impl Width {
    /// Number of bytes occupied by the field.
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Two-bit code stored in the metainfo byte.
    pub const fn code(self) -> u8 {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Four => 2,
            Self::Eight => 3,
        }
    }

    /// Inverse of [Width::code]. Only the two low bits are considered.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => Self::One,
            1 => Self::Two,
            2 => Self::Four,
            _ => Self::Eight,
        }
    }

    /// Largest value representable in this width.
    pub const fn max(self) -> u64 {
        match self {
            Self::One => u8::MAX as u64,
            Self::Two => u16::MAX as u64,
            Self::Four => u32::MAX as u64,
            Self::Eight => u64::MAX,
        }
    }

    /// Smallest width able to hold `value`.
    pub const fn covering(value: u64) -> Self {
        if value <= Self::One.max() {
            Self::One
        } else if value <= Self::Two.max() {
            Self::Two
        } else if value <= Self::Four.max() {
            Self::Four
        } else {
            Self::Eight
        }
    }

    /// Writes `value` in native byte order, truncated to this width.
    pub fn put(self, value: u64, buf: &mut impl BufMut) {
        match self {
            Self::One => buf.put_u8(value as u8),
            Self::Two => buf.put_u16_ne(value as u16),
            Self::Four => buf.put_u32_ne(value as u32),
            Self::Eight => buf.put_u64_ne(value),
        }
    }

    /// Reads a value of this width in native byte order.
    pub fn get(self, buf: &mut impl Buf) -> Result<u64, Error> {
        at_least(buf, self.bytes())?;
        Ok(match self {
            Self::One => buf.get_u8() as u64,
            Self::Two => buf.get_u16_ne() as u64,
            Self::Four => buf.get_u32_ne() as u64,
            Self::Eight => buf.get_u64_ne(),
        })
    }
}

/// Encoding of length prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prefix {
    Fixed(Width),
    Varint(VarintScheme),
}

/// Collects the information needed to choose a [Layout] before encoding.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    max_len: usize,
}

impl Plan {
    /// Records the element count of a string or container.
    #[inline]
    pub fn record(&mut self, len: usize) {
        self.max_len = self.max_len.max(len);
    }

    /// Largest count recorded so far.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Narrowest fixed width able to hold every recorded count.
    pub fn width(&self) -> Width {
        Width::covering(self.max_len as u64)
    }
}

/// How a message body is laid out: the length-prefix encoding and integer encoding in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    prefix: Prefix,
    varint_integers: bool,
    scheme: VarintScheme,
    compatible_absent: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(Prefix::Fixed(Width::One), false, VarintScheme::Classic)
    }
}

impl Layout {
    pub const fn new(prefix: Prefix, varint_integers: bool, scheme: VarintScheme) -> Self {
        Self {
            prefix,
            varint_integers,
            scheme,
            compatible_absent: false,
        }
    }

    /// Marks every compatible field as absent from the body.
    ///
    /// Used when the writer's version of the root type had no compatible fields, so nothing past
    /// the known fields belongs to the message.
    pub const fn without_compatible(mut self) -> Self {
        self.compatible_absent = true;
        self
    }

    /// Returns the layout for `cfg`, using `width` for fixed length prefixes.
    pub const fn with_width(cfg: Config, width: Width) -> Self {
        let prefix = if Self::fixed_prefixes(cfg) {
            Prefix::Fixed(width)
        } else {
            Prefix::Varint(cfg.scheme())
        };
        Self::new(prefix, cfg.varint_integers(), cfg.scheme())
    }

    /// Chooses the layout for encoding `value` under `cfg`.
    ///
    /// Fixed-width prefixes require a scan of the value to find the largest count.
    pub fn plan<T: EncodeSize>(value: &T, cfg: Config) -> Self {
        if !Self::fixed_prefixes(cfg) || !T::SCHEMA.has_prefix() {
            return Self::with_width(cfg, Width::One);
        }
        let mut plan = Plan::default();
        value.scan(&mut plan);
        Self::with_width(cfg, plan.width())
    }

    const fn fixed_prefixes(cfg: Config) -> bool {
        cfg.has_header() && !cfg.varint_integers()
    }

    pub const fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// Returns true if `i32`, `u32`, `i64` and `u64` are varint encoded.
    pub const fn varint_integers(&self) -> bool {
        self.varint_integers
    }

    /// Scheme used for every varint in the body.
    pub const fn scheme(&self) -> VarintScheme {
        self.scheme
    }

    /// Returns true if compatible fields must be read as absent without consuming input.
    pub const fn compatible_absent(&self) -> bool {
        self.compatible_absent
    }

    /// Encoded size of a length prefix.
    #[inline]
    pub fn len_size(&self, len: usize) -> usize {
        match self.prefix {
            Prefix::Fixed(width) => width.bytes(),
            Prefix::Varint(scheme) => scheme.size(len as u64),
        }
    }

    /// Writes a length prefix.
    #[inline]
    pub fn write_len(&self, len: usize, buf: &mut impl BufMut) {
        match self.prefix {
            Prefix::Fixed(width) => width.put(len as u64, buf),
            Prefix::Varint(scheme) => scheme.write(len as u64, buf),
        }
    }

    /// Reads a length prefix.
    #[inline]
    pub fn read_len(&self, buf: &mut impl Buf) -> Result<usize, Error> {
        let len = match self.prefix {
            Prefix::Fixed(width) => width.get(buf)?,
            Prefix::Varint(scheme) => scheme.read::<u64>(buf)?,
        };
        to_usize(len)
    }

    /// Reads a length prefix counting bytes, failing early if they are not all present.
    #[inline]
    pub fn read_byte_len(&self, buf: &mut impl Buf) -> Result<usize, Error> {
        let len = self.read_len(buf)?;
        at_least(buf, len)?;
        Ok(len)
    }
}

/// Writes a block size (always a classic varint).
#[inline]
pub(crate) fn write_block_size(size: usize, buf: &mut impl BufMut) {
    varint::write(size as u64, buf);
}

/// Reads a block size (always a classic varint).
#[inline]
pub(crate) fn read_block_size(buf: &mut impl Buf) -> Result<usize, Error> {
    to_usize(varint::read::<u64>(buf)?)
}

/// Encoded size of a block size.
#[inline]
pub(crate) fn block_size_len(size: usize) -> usize {
    varint::size(size as u64)
}

//! Message header.
//!
//! ```text
//! [fingerprint: u32] [metainfo: u8]? [total_size: u8|u16|u32|u64]? [literal_len: varint, literal]?
//! ```
//!
//! The lowest bit of the fingerprint word signals that a metainfo byte follows. The metainfo
//! byte holds:
//!
//! - bits 0-1: width code of every fixed length prefix in the body
//! - bit 2: a total size field follows
//! - bits 3-4: width code of the total size field
//! - bit 5: a type literal follows
//! - bits 6-7: reserved, must be zero
//!
//! All fixed-width fields use native byte order.

use crate::{
    layout::Width,
    util::{at_least, to_usize},
    varint, Error,
};
use bytes::{Buf, BufMut};

/// Size of the fingerprint word.
pub const FINGERPRINT_SIZE: usize = 4;

const METAINFO_FLAG: u32 = 1;
const HAS_SIZE: u8 = 0b0000_0100;
const SIZE_SHIFT: u8 = 3;
const HAS_LITERAL: u8 = 0b0010_0000;
const RESERVED: u8 = 0b1100_0000;

/// Decoded (or planned) message header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Fingerprint of the encoded type, with the lowest bit clear.
    pub fingerprint: u32,
    /// Width of fixed length prefixes in the body.
    pub width: Width,
    /// Size of the whole message (header included) and the width it is stored in.
    pub total_size: Option<(Width, usize)>,
    /// Type literal of the encoded type.
    pub literal: Option<Vec<u8>>,
}

impl Header {
    pub fn new(fingerprint: u32, width: Width, literal: Option<Vec<u8>>) -> Self {
        Self {
            fingerprint: fingerprint & !METAINFO_FLAG,
            width,
            total_size: None,
            literal,
        }
    }

    /// Records the total message size for a body of `body` bytes, using the narrowest width
    /// that can hold it.
    pub fn with_total_size(mut self, body: usize) -> Self {
        let base = self.base_size() + 1;
        for width in [Width::One, Width::Two, Width::Four, Width::Eight] {
            let total = base + width.bytes() + body;
            if total as u64 <= width.max() {
                self.total_size = Some((width, total));
                break;
            }
        }
        self
    }

    fn has_metainfo(&self) -> bool {
        self.width != Width::One || self.total_size.is_some() || self.literal.is_some()
    }

    /// Size of the fingerprint and literal, without the metainfo byte or total size field.
    fn base_size(&self) -> usize {
        FINGERPRINT_SIZE
            + self
                .literal
                .as_ref()
                .map_or(0, |literal| varint::size(literal.len() as u64) + literal.len())
    }

    /// Returns the encoded size of the header.
    pub fn encode_size(&self) -> usize {
        if !self.has_metainfo() {
            return FINGERPRINT_SIZE;
        }
        self.base_size() + 1 + self.total_size.map_or(0, |(width, _)| width.bytes())
    }

    pub fn write(&self, buf: &mut impl BufMut) {
        if !self.has_metainfo() {
            buf.put_u32_ne(self.fingerprint);
            return;
        }
        buf.put_u32_ne(self.fingerprint | METAINFO_FLAG);

        let mut meta = self.width.code();
        if let Some((width, _)) = self.total_size {
            meta |= HAS_SIZE | (width.code() << SIZE_SHIFT);
        }
        if self.literal.is_some() {
            meta |= HAS_LITERAL;
        }
        buf.put_u8(meta);

        if let Some((width, total)) = self.total_size {
            width.put(total as u64, buf);
        }
        if let Some(literal) = &self.literal {
            varint::write(literal.len() as u64, buf);
            buf.put_slice(literal);
        }
    }

    pub fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        at_least(buf, FINGERPRINT_SIZE)?;
        let word = buf.get_u32_ne();
        let fingerprint = word & !METAINFO_FLAG;
        if word & METAINFO_FLAG == 0 {
            return Ok(Self::new(fingerprint, Width::One, None));
        }

        at_least(buf, 1)?;
        let meta = buf.get_u8();
        if meta & RESERVED != 0 {
            return Err(Error::invalid(format!("reserved metainfo bits set: {meta:#04x}")));
        }
        let width = Width::from_code(meta);
        if width.bytes() > std::mem::size_of::<usize>() {
            return Err(Error::TooWidthSize(width.max()));
        }

        let total_size = if meta & HAS_SIZE != 0 {
            let width = Width::from_code(meta >> SIZE_SHIFT);
            Some((width, to_usize(width.get(buf)?)?))
        } else {
            None
        };
        let literal = if meta & HAS_LITERAL != 0 {
            let len = to_usize(varint::read::<u64>(buf)?)?;
            at_least(buf, len)?;
            let mut literal = vec![0; len];
            buf.copy_to_slice(&mut literal);
            Some(literal)
        } else {
            None
        };

        Ok(Self {
            fingerprint,
            width,
            total_size,
            literal,
        })
    }
}

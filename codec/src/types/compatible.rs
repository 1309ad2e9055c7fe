//! Versioned optional fields.
//!
//! A [Compatible] field is written as a self-delimiting block: a LEB128 block size followed by
//! an optional-style payload (`0x00` for absent, `0x01` and the value for present). Readers that
//! predate the field skip the block by its size; readers that know the field but find the input
//! exhausted treat it as absent.
//!
//! Compatible fields of the outermost encoded type do not participate in the fingerprint, so
//! adding one to the end of that struct keeps its encodings interchangeable with older versions.
//! They must follow every other field of their struct. A compatible field of a nested struct is
//! part of the fingerprint like any other member: adding or removing it is a type change.

use crate::{
    layout::{block_size_len, read_block_size, write_block_size, Layout, Plan},
    util::at_least,
    Describe, EncodeSize, Error, Read, Schema, Write,
};
use bytes::{Buf, BufMut};
use tracing::trace;

/// An optional field that may be added to or removed from a struct without breaking existing
/// encodings.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Compatible<T>(pub Option<T>);

impl<T> Compatible<T> {
    pub const fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub const fn none() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

impl<T> From<Option<T>> for Compatible<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> From<T> for Compatible<T> {
    fn from(value: T) -> Self {
        Self(Some(value))
    }
}

impl<T: EncodeSize> Compatible<T> {
    fn payload_size(&self, layout: &Layout) -> usize {
        1 + self.0.as_ref().map_or(0, |value| value.encode_size(layout))
    }
}

impl<T: Describe> Describe for Compatible<T> {
    const SCHEMA: &'static Schema = &Schema::Compatible { inner: T::SCHEMA };
}

impl<T: EncodeSize> EncodeSize for Compatible<T> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        if let Some(value) = &self.0 {
            value.scan(plan);
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        let payload = self.payload_size(layout);
        block_size_len(payload) + payload
    }
}

impl<T: Write> Write for Compatible<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        write_block_size(self.payload_size(layout), buf);
        match &self.0 {
            Some(value) => {
                buf.put_u8(1);
                value.write(buf, layout);
            }
            None => buf.put_u8(0),
        }
    }
}

impl<T: Read> Read for Compatible<T> {
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        // Written by a version without this field.
        if layout.compatible_absent() || !buf.has_remaining() {
            trace!("compatible field absent from input");
            return Ok(Self(None));
        }
        let size = read_block_size(buf)?;
        if size == 0 {
            return Ok(Self(None));
        }
        at_least(buf, size)?;

        let mut block = buf.take(size);
        let value = match u8::read_cfg(&mut block, layout)? {
            0 => None,
            1 => Some(T::read_cfg(&mut block, layout).map_err(|err| match err {
                Error::NoBufferSpace => Error::invalid("compatible field overruns its block"),
                other => other,
            })?),
            other => return Err(Error::invalid(format!("invalid compatible tag {other}"))),
        };
        let rest = block.remaining();
        if rest > 0 {
            trace!(rest, "skipping unread bytes of compatible block");
            block.advance(rest);
        }
        Ok(Self(value))
    }

    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        if layout.compatible_absent() || !buf.has_remaining() {
            return Ok(());
        }
        let size = read_block_size(buf)?;
        at_least(buf, size)?;
        buf.advance(size);
        Ok(())
    }
}

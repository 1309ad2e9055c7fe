//! Implementations of Codec for strings and byte types.
//!
//! Both are a length prefix followed by the raw bytes. [Bytes] shares its schema with `Vec<u8>`,
//! so the two are interchangeable on the wire.

use crate::{
    layout::{Layout, Plan},
    Describe, EncodeSize, Error, Read, Schema, Write,
};
use bytes::{Buf, BufMut, Bytes};

impl Describe for String {
    const SCHEMA: &'static Schema = &Schema::String;
}

impl EncodeSize for String {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        plan.record(self.len());
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        layout.len_size(self.len()) + self.len()
    }
}

impl Write for String {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        buf.put_slice(self.as_bytes());
    }
}

impl Read for String {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let mut value = String::new();
        value.read_into(buf, layout)?;
        Ok(value)
    }

    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        let len = layout.read_byte_len(buf)?;
        let mut bytes = std::mem::take(self).into_bytes();
        bytes.clear();
        bytes.resize(len, 0);
        buf.copy_to_slice(&mut bytes);
        *self = String::from_utf8(bytes).map_err(|_| Error::invalid("invalid utf-8 string"))?;
        Ok(())
    }

    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        let len = layout.read_byte_len(buf)?;
        buf.advance(len);
        Ok(())
    }
}

impl Describe for Bytes {
    const SCHEMA: &'static Schema = &Schema::Sequence {
        element: &Schema::U8,
    };
}

impl EncodeSize for Bytes {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        plan.record(self.len());
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        layout.len_size(self.len()) + self.len()
    }
}

impl Write for Bytes {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        buf.put_slice(self);
    }
}

impl Read for Bytes {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = layout.read_byte_len(buf)?;
        Ok(buf.copy_to_bytes(len))
    }

    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        let len = layout.read_byte_len(buf)?;
        buf.advance(len);
        Ok(())
    }
}

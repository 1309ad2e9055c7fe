//! Implementations of Codec for sequences.
//!
//! A sequence is its element count followed by each element. When decoding, the count is only
//! trusted as an allocation hint up to the number of bytes left in the buffer, and counts of
//! zero-sized elements are capped.

use crate::{
    layout::{Layout, Plan},
    util::at_least,
    Describe, EncodeSize, Error, Read, Schema, Write,
};
use bytes::{Buf, BufMut};
use std::collections::VecDeque;

/// Encoded size of `len` elements of `T`.
#[inline]
pub(crate) fn items_size<'a, T: EncodeSize + 'a>(
    len: usize,
    items: impl Iterator<Item = &'a T>,
    layout: &Layout,
) -> usize {
    let body = match T::SCHEMA.fixed_size(layout.varint_integers()) {
        Some(size) => size * len,
        None => items.map(|item| item.encode_size(layout)).sum(),
    };
    layout.len_size(len) + body
}

/// Skips a length prefix and the elements that follow it.
#[inline]
pub(crate) fn skip_items<T: Read>(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
    let size = T::SCHEMA.fixed_size(layout.varint_integers());
    let len = read_count(buf, layout, size)?;
    match size {
        Some(size) => buf.advance(size * len),
        None => {
            for _ in 0..len {
                T::skip(buf, layout)?;
            }
        }
    }
    Ok(())
}

/// Largest count accepted for elements that occupy no bytes.
const MAX_EMPTY_ITEMS: usize = 1 << 20;

/// Reads an element count for items of `item_size` bytes (if fixed).
///
/// Counts that the remaining input cannot hold are rejected before any element is read.
/// Zero-sized items cannot be checked against the input, so their count is capped instead.
#[inline]
pub(crate) fn read_count(
    buf: &mut impl Buf,
    layout: &Layout,
    item_size: Option<usize>,
) -> Result<usize, Error> {
    let len = layout.read_len(buf)?;
    match item_size {
        Some(0) if len > MAX_EMPTY_ITEMS => {
            Err(Error::invalid(format!("too many zero-sized elements: {len}")))
        }
        Some(size) => {
            at_least(buf, size.checked_mul(len).ok_or(Error::NoBufferSpace)?)?;
            Ok(len)
        }
        None => Ok(len),
    }
}

/// Capacity to reserve for `len` elements.
#[inline]
pub(crate) fn capacity_hint(len: usize, buf: &impl Buf) -> usize {
    len.min(buf.remaining())
}

// Vec implementation
impl<T: Describe> Describe for Vec<T> {
    const SCHEMA: &'static Schema = &Schema::Sequence { element: T::SCHEMA };
}

impl<T: EncodeSize> EncodeSize for Vec<T> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        plan.record(self.len());
        if T::SCHEMA.has_prefix() {
            self.iter().for_each(|item| item.scan(plan));
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        items_size(self.len(), self.iter(), layout)
    }
}

impl<T: Write> Write for Vec<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        for item in self {
            item.write(buf, layout);
        }
    }
}

impl<T: Read> Read for Vec<T> {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_count(buf, layout, T::SCHEMA.fixed_size(layout.varint_integers()))?;
        let mut vec = Vec::with_capacity(capacity_hint(len, buf));
        for _ in 0..len {
            vec.push(T::read_cfg(buf, layout)?);
        }
        Ok(vec)
    }

    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        let len = read_count(buf, layout, T::SCHEMA.fixed_size(layout.varint_integers()))?;
        self.truncate(len);
        for item in self.iter_mut() {
            item.read_into(buf, layout)?;
        }
        let existing = self.len();
        self.reserve(capacity_hint(len - existing, buf));
        for _ in existing..len {
            self.push(T::read_cfg(buf, layout)?);
        }
        Ok(())
    }

    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_items::<T>(buf, layout)
    }
}

// VecDeque implementation
impl<T: Describe> Describe for VecDeque<T> {
    const SCHEMA: &'static Schema = &Schema::Sequence { element: T::SCHEMA };
}

impl<T: EncodeSize> EncodeSize for VecDeque<T> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        plan.record(self.len());
        if T::SCHEMA.has_prefix() {
            self.iter().for_each(|item| item.scan(plan));
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        items_size(self.len(), self.iter(), layout)
    }
}

impl<T: Write> Write for VecDeque<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        for item in self {
            item.write(buf, layout);
        }
    }
}

impl<T: Read> Read for VecDeque<T> {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_count(buf, layout, T::SCHEMA.fixed_size(layout.varint_integers()))?;
        let mut deque = VecDeque::with_capacity(capacity_hint(len, buf));
        for _ in 0..len {
            deque.push_back(T::read_cfg(buf, layout)?);
        }
        Ok(deque)
    }

    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_items::<T>(buf, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, Config};

    const RAW: Config = Config::DISABLE_ALL_META_INFO;

    #[test]
    fn test_vec() {
        let vec_values = [vec![], vec![1u8], vec![1u8, 2u8, 3u8]];
        for value in vec_values {
            let encoded = serialize_with(&value, RAW);
            assert_eq!(encoded.len(), value.len() * std::mem::size_of::<u8>() + 1);
            assert_eq!(deserialize_with::<Vec<u8>>(&encoded, RAW), Ok(value));
        }
    }

    #[test]
    fn test_nested() {
        let value = vec![vec![String::from("a")], vec![], vec![String::new(); 3]];
        let encoded = serialize_with(&value, Config::DEFAULT);
        assert_eq!(crate::deserialize::<Vec<Vec<String>>>(&encoded), Ok(value));
    }

    #[test]
    fn test_vec_deque() {
        let value: VecDeque<i64> = (-3..3).collect();
        let encoded = serialize_with(&value, RAW);
        assert_eq!(deserialize_with::<VecDeque<i64>>(&encoded, RAW), Ok(value.clone()));
        // Same schema as Vec.
        let as_vec: Vec<i64> = value.into_iter().collect();
        assert_eq!(deserialize_with::<Vec<i64>>(&encoded, RAW), Ok(as_vec));
    }

    #[test]
    fn test_huge_count() {
        // A count far beyond the input must fail without allocating for it.
        let encoded = [0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 1];
        assert_eq!(
            deserialize_with::<Vec<u64>>(&encoded, RAW),
            Err(Error::NoBufferSpace)
        );
    }

    #[test]
    fn test_zero_sized_items() {
        let value = vec![(); 3];
        let encoded = serialize_with(&value, RAW);
        assert_eq!(&encoded[..], &[3]);
        assert_eq!(deserialize_with::<Vec<()>>(&encoded, RAW), Ok(value));

        // Nothing in the input backs the count, so it must be bounded.
        let encoded = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        assert!(matches!(
            deserialize_with::<Vec<()>>(&encoded, RAW),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            deserialize_with::<VecDeque<()>>(&encoded, RAW),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Vec::<()>::skip(&mut &encoded[..], &Layout::default()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_read_into_reuses() {
        let layout = Layout::default();
        let mut value = vec![String::with_capacity(16), String::from("old")];
        let first = value[0].as_ptr();
        value
            .read_into(&mut &b"\x03\x01a\x01b\x01c"[..], &layout)
            .unwrap();
        assert_eq!(value, vec!["a", "b", "c"]);
        assert_eq!(value[0].as_ptr(), first);

        value.read_into(&mut &b"\x01\x00"[..], &layout).unwrap();
        assert_eq!(value, vec![""]);
    }

    #[test]
    fn test_skip() {
        let layout = Layout::default();
        let mut buf = &b"\x02\x01a\x02bc\xFF"[..];
        Vec::<String>::skip(&mut buf, &layout).unwrap();
        assert_eq!(buf, &[0xFF]);

        let mut buf = &b"\x03\x01\x02"[..];
        assert_eq!(
            Vec::<u8>::skip(&mut buf, &layout),
            Err(Error::NoBufferSpace)
        );
    }
}

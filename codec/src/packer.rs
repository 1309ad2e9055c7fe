//! Encoding entry points.

use crate::{
    header::Header,
    layout::{Layout, Prefix, Width},
    Config, Write,
};
use bytes::{BufMut, BytesMut};
use tracing::trace;

/// A value paired with everything needed to encode it: layout, header and exact size.
pub(crate) struct Packer<'a, T> {
    value: &'a T,
    layout: Layout,
    header: Option<Header>,
    size: usize,
}

impl<'a, T: Write> Packer<'a, T> {
    pub(crate) fn new(value: &'a T, cfg: Config) -> Self {
        let cfg = Config::resolve(cfg, T::CONFIG);
        let layout = Layout::plan(value, cfg);
        let body = value.encode_size(&layout);
        let header = cfg.has_header().then(|| {
            let width = match layout.prefix() {
                Prefix::Fixed(width) => width,
                Prefix::Varint(_) => Width::One,
            };
            let literal = cfg.has_type_literal().then(|| T::SCHEMA.literal(cfg));
            let header = Header::new(T::SCHEMA.fingerprint(cfg), width, literal);
            if T::SCHEMA.contains_compatible() {
                header.with_total_size(body)
            } else {
                header
            }
        });
        let size = header.as_ref().map_or(0, Header::encode_size) + body;
        trace!(size, prefix = ?layout.prefix(), "planned encoding");
        Self {
            value,
            layout,
            header,
            size,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn write(&self, buf: &mut impl BufMut) {
        if let Some(header) = &self.header {
            header.write(buf);
        }
        self.value.write(buf, &self.layout);
    }
}

/// Encodes `value` with its declared configuration.
pub fn serialize<T: Write>(value: &T) -> BytesMut {
    serialize_with(value, Config::DEFAULT)
}

/// Encodes `value` with `cfg`.
///
/// Panics if the `write` implementation does not write the expected number of bytes.
pub fn serialize_with<T: Write>(value: &T, cfg: Config) -> BytesMut {
    serialize_with_offset(value, cfg, 0)
}

/// Encodes `value` after `offset` zeroed bytes reserved for the caller.
pub fn serialize_with_offset<T: Write>(value: &T, cfg: Config, offset: usize) -> BytesMut {
    let packer = Packer::new(value, cfg);
    let len = offset + packer.size();
    let mut buffer = BytesMut::with_capacity(len);
    buffer.put_bytes(0, offset);
    packer.write(&mut buffer);
    assert_eq!(buffer.len(), len, "write() did not write expected bytes");
    buffer
}

/// Appends the encoding of `value` to `buffer`, growing it as needed.
///
/// Returns the number of bytes appended.
pub fn serialize_to<T: Write>(value: &T, cfg: Config, buffer: &mut BytesMut) -> usize {
    let packer = Packer::new(value, cfg);
    let start = buffer.len();
    buffer.reserve(packer.size());
    packer.write(buffer);
    assert_eq!(
        buffer.len() - start,
        packer.size(),
        "write() did not write expected bytes"
    );
    packer.size()
}

/// Encodes `value` into the front of `out`.
///
/// Returns the number of bytes written, or 0 (leaving `out` untouched) if `out` is too small.
pub fn serialize_into<T: Write>(value: &T, cfg: Config, out: &mut [u8]) -> usize {
    let packer = Packer::new(value, cfg);
    let size = packer.size();
    if out.len() < size {
        return 0;
    }
    let mut slice = &mut out[..size];
    packer.write(&mut slice);
    assert!(slice.is_empty(), "write() did not write expected bytes");
    size
}

/// Returns the number of bytes [serialize_with] would produce, without encoding.
pub fn get_needed_size<T: Write>(value: &T, cfg: Config) -> usize {
    Packer::new(value, cfg).size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FINGERPRINT_SIZE;

    #[test]
    fn test_sizes_agree() {
        let values = [vec![], vec![String::from("x")], vec![String::from("y"); 300]];
        for cfg in [
            Config::DEFAULT,
            Config::ENABLE_TYPE_INFO,
            Config::DISABLE_ALL_META_INFO,
            Config::ENCODING_WITH_VARINT,
            Config::ENCODING_WITH_VARINT | Config::USE_FAST_VARINT,
        ] {
            for value in &values {
                let encoded = serialize_with(value, cfg);
                assert_eq!(encoded.len(), get_needed_size(value, cfg));
            }
        }
    }

    #[test]
    fn test_header_only_when_enabled() {
        assert_eq!(serialize(&7u8).len(), FINGERPRINT_SIZE + 1);
        assert_eq!(serialize_with(&7u8, Config::DISABLE_ALL_META_INFO).len(), 1);
    }

    #[test]
    fn test_offset() {
        let encoded = serialize_with_offset(&0xABu8, Config::DISABLE_ALL_META_INFO, 3);
        assert_eq!(&encoded[..], &[0, 0, 0, 0xAB]);
    }

    #[test]
    fn test_serialize_to_appends() {
        let mut buffer = BytesMut::from(&b"ab"[..]);
        let written = serialize_to(&String::from("cd"), Config::DISABLE_ALL_META_INFO, &mut buffer);
        assert_eq!(written, 3);
        assert_eq!(&buffer[..], b"ab\x02cd");
    }

    #[test]
    fn test_serialize_into() {
        let value = (1u32, String::from("hello"));
        let size = get_needed_size(&value, Config::DEFAULT);

        let mut exact = vec![0u8; size];
        assert_eq!(serialize_into(&value, Config::DEFAULT, &mut exact), size);
        assert_eq!(&exact[..], &serialize(&value)[..]);

        let mut short = vec![0xEEu8; size - 1];
        assert_eq!(serialize_into(&value, Config::DEFAULT, &mut short), 0);
        assert!(short.iter().all(|b| *b == 0xEE));
    }
}

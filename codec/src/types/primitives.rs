//! Codec implementations for Rust primitive types.
//!
//! # Fixed-size vs Variable-size
//!
//! Most primitives have a constant size and are written as raw native-endian bytes. `i32`, `u32`,
//! `i64` and `u64` are the exception: under [crate::Config::ENCODING_WITH_VARINT] they are written
//! as varints (ZigZag for the signed ones) using the configured scheme.
//!
//! `usize` and `isize` are not supported, to keep the wire format identical across 32-bit and
//! 64-bit architectures.

use crate::{
    layout::{Layout, Plan},
    util::at_least,
    Describe, EncodeSize, Error, Read, Schema, Write,
};
use bytes::{Buf, BufMut};

// Always fixed-size numeric types
macro_rules! impl_numeric {
    ($type:ty, $schema:ident, $read_method:ident, $write_method:ident) => {
        impl Describe for $type {
            const SCHEMA: &'static Schema = &Schema::$schema;
        }

        impl EncodeSize for $type {
            #[inline]
            fn encode_size(&self, _: &Layout) -> usize {
                std::mem::size_of::<$type>()
            }
        }

        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut, _: &Layout) {
                buf.$write_method(*self);
            }
        }

        impl Read for $type {
            #[inline]
            fn read_cfg(buf: &mut impl Buf, _: &Layout) -> Result<Self, Error> {
                at_least(buf, std::mem::size_of::<$type>())?;
                Ok(buf.$read_method())
            }
        }
    };
}

impl_numeric!(u8, U8, get_u8, put_u8);
impl_numeric!(i8, I8, get_i8, put_i8);
impl_numeric!(u16, U16, get_u16_ne, put_u16_ne);
impl_numeric!(i16, I16, get_i16_ne, put_i16_ne);
impl_numeric!(u128, U128, get_u128_ne, put_u128_ne);
impl_numeric!(i128, I128, get_i128_ne, put_i128_ne);
impl_numeric!(f32, F32, get_f32_ne, put_f32_ne);
impl_numeric!(f64, F64, get_f64_ne, put_f64_ne);

// Integers that switch to varints with the layout
macro_rules! impl_integer {
    ($type:ty, $schema:ident, $read_method:ident, $write_method:ident, $var_read:ident, $var_write:ident, $var_size:ident) => {
        impl Describe for $type {
            const SCHEMA: &'static Schema = &Schema::$schema;
        }

        impl EncodeSize for $type {
            #[inline]
            fn encode_size(&self, layout: &Layout) -> usize {
                if layout.varint_integers() {
                    layout.scheme().$var_size(*self)
                } else {
                    std::mem::size_of::<$type>()
                }
            }
        }

        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
                if layout.varint_integers() {
                    layout.scheme().$var_write(*self, buf);
                } else {
                    buf.$write_method(*self);
                }
            }
        }

        impl Read for $type {
            #[inline]
            fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
                if layout.varint_integers() {
                    return layout.scheme().$var_read(buf);
                }
                at_least(buf, std::mem::size_of::<$type>())?;
                Ok(buf.$read_method())
            }
        }
    };
}

impl_integer!(u32, U32, get_u32_ne, put_u32_ne, read, write, size);
impl_integer!(u64, U64, get_u64_ne, put_u64_ne, read, write, size);
impl_integer!(i32, I32, get_i32_ne, put_i32_ne, read_signed, write_signed, size_signed);
impl_integer!(i64, I64, get_i64_ne, put_i64_ne, read_signed, write_signed, size_signed);

// Bool implementation
impl Describe for bool {
    const SCHEMA: &'static Schema = &Schema::Bool;
}

impl EncodeSize for bool {
    #[inline]
    fn encode_size(&self, _: &Layout) -> usize {
        1
    }
}

impl Write for bool {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, _: &Layout) {
        buf.put_u8(if *self { 1 } else { 0 });
    }
}

impl Read for bool {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        match u8::read_cfg(buf, layout)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::invalid(format!("invalid bool {other}"))),
        }
    }
}

// Char implementation
impl Describe for char {
    const SCHEMA: &'static Schema = &Schema::Char;
}

impl EncodeSize for char {
    #[inline]
    fn encode_size(&self, _: &Layout) -> usize {
        4
    }
}

impl Write for char {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, _: &Layout) {
        buf.put_u32_ne(*self as u32);
    }
}

impl Read for char {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &Layout) -> Result<Self, Error> {
        at_least(buf, 4)?;
        let code = buf.get_u32_ne();
        char::from_u32(code).ok_or_else(|| Error::invalid(format!("invalid char {code:#x}")))
    }
}

// Unit implementation
impl Describe for () {
    const SCHEMA: &'static Schema = &Schema::Unit;
}

impl EncodeSize for () {
    #[inline]
    fn encode_size(&self, _: &Layout) -> usize {
        0
    }
}

impl Write for () {
    #[inline]
    fn write(&self, _: &mut impl BufMut, _: &Layout) {}
}

impl Read for () {
    #[inline]
    fn read_cfg(_: &mut impl Buf, _: &Layout) -> Result<Self, Error> {
        Ok(())
    }
}

// Constant-size array implementation
impl<T: Describe, const N: usize> Describe for [T; N] {
    const SCHEMA: &'static Schema = &Schema::Array {
        element: T::SCHEMA,
        len: N,
    };
}

impl<T: EncodeSize, const N: usize> EncodeSize for [T; N] {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        if T::SCHEMA.has_prefix() {
            self.iter().for_each(|item| item.scan(plan));
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        match T::SCHEMA.fixed_size(layout.varint_integers()) {
            Some(size) => size * N,
            None => self.iter().map(|item| item.encode_size(layout)).sum(),
        }
    }
}

impl<T: Write, const N: usize> Write for [T; N] {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        for item in self {
            item.write(buf, layout);
        }
    }
}

impl<T: Read, const N: usize> Read for [T; N] {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::read_cfg(buf, layout)?);
        }
        items
            .try_into()
            .map_err(|_| Error::invalid("array length mismatch"))
    }

    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        for item in self.iter_mut() {
            item.read_into(buf, layout)?;
        }
        Ok(())
    }
}

// Option implementation
impl<T: Describe> Describe for Option<T> {
    const SCHEMA: &'static Schema = &Schema::Optional { inner: T::SCHEMA };
}

impl<T: EncodeSize> EncodeSize for Option<T> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        if let Some(inner) = self {
            inner.scan(plan);
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        match self {
            Some(inner) => 1 + inner.encode_size(layout),
            None => 1,
        }
    }
}

impl<T: Write> Write for Option<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        self.is_some().write(buf, layout);
        if let Some(inner) = self {
            inner.write(buf, layout);
        }
    }
}

impl<T: Read> Read for Option<T> {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        if bool::read_cfg(buf, layout)? {
            Ok(Some(T::read_cfg(buf, layout)?))
        } else {
            Ok(None)
        }
    }

    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        if !bool::read_cfg(buf, layout)? {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.read_into(buf, layout),
            None => {
                *self = Some(T::read_cfg(buf, layout)?);
                Ok(())
            }
        }
    }
}

// Result implementation
impl<T: Describe, E: Describe> Describe for Result<T, E> {
    const SCHEMA: &'static Schema = &Schema::Expected {
        value: T::SCHEMA,
        error: E::SCHEMA,
    };
}

impl<T: EncodeSize, E: EncodeSize> EncodeSize for Result<T, E> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        match self {
            Ok(value) => value.scan(plan),
            Err(error) => error.scan(plan),
        }
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        1 + match self {
            Ok(value) => value.encode_size(layout),
            Err(error) => error.encode_size(layout),
        }
    }
}

impl<T: Write, E: Write> Write for Result<T, E> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        self.is_ok().write(buf, layout);
        match self {
            Ok(value) => value.write(buf, layout),
            Err(error) => error.write(buf, layout),
        }
    }
}

impl<T: Read, E: Read> Read for Result<T, E> {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        if bool::read_cfg(buf, layout)? {
            Ok(Ok(T::read_cfg(buf, layout)?))
        } else {
            Ok(Err(E::read_cfg(buf, layout)?))
        }
    }
}

// Box implementation (transparent)
impl<T: Describe> Describe for Box<T> {
    const SCHEMA: &'static Schema = T::SCHEMA;
}

impl<T: EncodeSize> EncodeSize for Box<T> {
    #[inline]
    fn scan(&self, plan: &mut Plan) {
        self.as_ref().scan(plan);
    }

    #[inline]
    fn encode_size(&self, layout: &Layout) -> usize {
        self.as_ref().encode_size(layout)
    }
}

impl<T: Write> Write for Box<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        self.as_ref().write(buf, layout);
    }
}

impl<T: Read> Read for Box<T> {
    #[inline]
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        T::read_cfg(buf, layout).map(Box::new)
    }

    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        self.as_mut().read_into(buf, layout)
    }

    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        T::skip(buf, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize_with, serialize_with, Config, VarintScheme};
    use bytes::BytesMut;
    use paste::paste;

    const RAW: Config = Config::DISABLE_ALL_META_INFO;
    const VARINT: Config = Config::DISABLE_ALL_META_INFO.union(Config::ENCODING_WITH_VARINT);

    fn encode<T: Write>(value: &T, cfg: Config) -> Vec<u8> {
        serialize_with(value, cfg).to_vec()
    }

    macro_rules! impl_num_test {
        ($type:ty) => {
            paste! {
                #[test]
                fn [<test_ $type>]() {
                    let expected_len = std::mem::size_of::<$type>();
                    let values: [$type; 5] =
                        [0 as $type, 1 as $type, 42 as $type, <$type>::MAX, <$type>::MIN];
                    for value in values.iter() {
                        let encoded = encode(value, RAW);
                        assert_eq!(encoded.len(), expected_len);
                        assert_eq!(encoded, value.to_ne_bytes());
                        let decoded: $type = deserialize_with(&encoded, RAW).unwrap();
                        assert_eq!(*value, decoded);
                        assert_eq!(value.encode_size(&Layout::default()), expected_len);
                    }
                }
            }
        };
    }
    impl_num_test!(u8);
    impl_num_test!(u16);
    impl_num_test!(u32);
    impl_num_test!(u64);
    impl_num_test!(u128);
    impl_num_test!(i8);
    impl_num_test!(i16);
    impl_num_test!(i32);
    impl_num_test!(i64);
    impl_num_test!(i128);
    impl_num_test!(f32);
    impl_num_test!(f64);

    #[test]
    fn test_varint_integers() {
        assert_eq!(encode(&5i32, VARINT), vec![10]);
        assert_eq!(encode(&-1i64, VARINT), vec![1]);
        assert_eq!(encode(&300u32, VARINT), vec![0xAC, 0x02]);
        assert_eq!(encode(&u64::MAX, VARINT).len(), 10);
        // Narrow integers never become varints.
        assert_eq!(encode(&300u16, VARINT), 300u16.to_ne_bytes());

        let fast = VARINT | Config::USE_FAST_VARINT;
        assert_eq!(encode(&300u32, fast), vec![251, 0x2C, 0x01]);
        assert_eq!(deserialize_with::<u32>(&[251, 0x2C, 0x01], fast), Ok(300));
    }

    #[test]
    fn test_bool() {
        for value in [true, false] {
            let encoded = encode(&value, RAW);
            assert_eq!(encoded, vec![value as u8]);
            assert_eq!(deserialize_with::<bool>(&encoded, RAW), Ok(value));
        }
        assert!(matches!(
            deserialize_with::<bool>(&[2], RAW),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_char() {
        for value in ['a', 'é', '🦀', char::MAX] {
            let encoded = encode(&value, RAW);
            assert_eq!(encoded.len(), 4);
            assert_eq!(deserialize_with::<char>(&encoded, RAW), Ok(value));
        }
        let surrogate = 0xD800u32.to_ne_bytes();
        assert!(matches!(
            deserialize_with::<char>(&surrogate, RAW),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unit() {
        assert!(encode(&(), RAW).is_empty());
        assert_eq!(deserialize_with::<()>(&[], RAW), Ok(()));
    }

    #[test]
    fn test_array() {
        let values = [1u16, 2, 3];
        let encoded = encode(&values, RAW);
        assert_eq!(encoded.len(), 6);
        assert_eq!(deserialize_with::<[u16; 3]>(&encoded, RAW), Ok(values));

        let strings = [String::from("a"), String::from("bcd")];
        let encoded = encode(&strings, RAW);
        assert_eq!(encoded, b"\x01a\x03bcd");
        assert_eq!(deserialize_with::<[String; 2]>(&encoded, RAW), Ok(strings));
    }

    #[test]
    fn test_option() {
        assert_eq!(encode(&None::<u32>, RAW), vec![0]);
        let mut expected = vec![1];
        expected.extend_from_slice(&42u32.to_ne_bytes());
        assert_eq!(encode(&Some(42u32), RAW), expected);
        assert_eq!(deserialize_with::<Option<u32>>(&expected, RAW), Ok(Some(42)));
        assert_eq!(deserialize_with::<Option<u32>>(&[0], RAW), Ok(None));
    }

    #[test]
    fn test_option_read_into() {
        let layout = Layout::default();
        let mut value = Some(String::with_capacity(32));
        value.read_into(&mut &b"\x01\x02hi"[..], &layout).unwrap();
        assert_eq!(value.as_deref(), Some("hi"));
        assert!(value.as_ref().unwrap().capacity() >= 32);
        value.read_into(&mut &[0u8][..], &layout).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_result() {
        let ok: Result<u8, String> = Ok(7);
        let err: Result<u8, String> = Err(String::from("boom"));
        assert_eq!(encode(&ok, RAW), vec![1, 7]);
        assert_eq!(encode(&err, RAW), b"\x00\x04boom");
        for value in [ok, err] {
            let encoded = encode(&value, RAW);
            assert_eq!(deserialize_with::<Result<u8, String>>(&encoded, RAW), Ok(value));
        }
    }

    #[test]
    fn test_box() {
        let value = Box::new(0x0102u16);
        let encoded = encode(&value, RAW);
        assert_eq!(encoded, 0x0102u16.to_ne_bytes());
        assert_eq!(deserialize_with::<Box<u16>>(&encoded, RAW), Ok(value));
        assert_eq!(<Box<u16>>::SCHEMA, u16::SCHEMA);
    }

    #[test]
    fn test_truncated() {
        let layout = Layout::new(
            crate::layout::Prefix::Varint(VarintScheme::Classic),
            false,
            VarintScheme::Classic,
        );
        let mut buf = BytesMut::new();
        Some(0x1234_5678u32).write(&mut buf, &layout);
        for len in 0..buf.len() {
            assert_eq!(
                Option::<u32>::read_cfg(&mut &buf[..len], &layout),
                Err(Error::NoBufferSpace)
            );
        }
    }
}

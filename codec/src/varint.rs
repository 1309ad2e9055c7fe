//! Variable-length integer encoding and decoding
//!
//! Two schemes are provided, selected through [VarintScheme]:
//!
//! - [VarintScheme::Classic]: 7 bits of data per byte, with the most significant bit set on every
//!   byte except the last (LEB128).
//! - [VarintScheme::Fast]: values up to 250 take a single byte. Larger values are written as a tag
//!   byte (251, 252 or 253) followed by the value as a little-endian `u16`, `u32` or `u64`.
//!
//! Signed integers are mapped to unsigned ones with ZigZag encoding before either scheme is
//! applied.
//!
//! `usize` and `isize` are omitted to prevent behavior from depending on the target architecture.

use crate::{layout::Layout, Describe, EncodeSize, Error, Read, Schema, VarintScheme, Write};
use bytes::{Buf, BufMut};
use std::ops::{BitOrAssign, Shl, ShrAssign};

const BITS_PER_BYTE: usize = 8;
const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// A trait for unsigned integers that can be varint encoded.
pub trait UInt:
    Copy
    + From<u8>
    + Sized
    + ShrAssign<usize>
    + Shl<usize, Output = Self>
    + BitOrAssign<Self>
    + PartialOrd
{
    /// Returns the number of leading zeros in the integer.
    fn leading_zeros(self) -> u32;

    /// Returns the least significant byte of the integer.
    fn as_u8(self) -> u8;

    /// Widens the integer to a `u64`.
    fn as_u64(self) -> u64;

    /// Narrows a `u64`, returning `None` if it does not fit.
    fn from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_uint {
    ($type:ty) => {
        impl UInt for $type {
            #[inline]
            fn leading_zeros(self) -> u32 {
                self.leading_zeros()
            }

            #[inline]
            fn as_u8(self) -> u8 {
                self as u8
            }

            #[inline]
            fn as_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_u64(value: u64) -> Option<Self> {
                <$type>::try_from(value).ok()
            }
        }
    };
}
impl_uint!(u8);
impl_uint!(u16);
impl_uint!(u32);
impl_uint!(u64);

/// A trait for signed integers that can be converted to and from unsigned integers of the
/// equivalent size.
///
/// ZigZag encoding moves the sign bit to the least significant bit, so numbers close to zero stay
/// small even when they are negative.
pub trait SInt: Copy {
    /// The unsigned integer of the same width.
    type Unsigned: UInt;

    /// Converts the signed integer to an unsigned integer using ZigZag encoding.
    fn as_zigzag(self) -> Self::Unsigned;

    /// Converts a (ZigZag'ed) unsigned integer back to a signed integer.
    fn un_zigzag(value: Self::Unsigned) -> Self;
}

macro_rules! impl_sint {
    ($type:ty, $utype:ty) => {
        impl SInt for $type {
            type Unsigned = $utype;

            #[inline]
            fn as_zigzag(self) -> $utype {
                let shr = std::mem::size_of::<$utype>() * 8 - 1;
                ((self << 1) ^ (self >> shr)) as $utype
            }

            #[inline]
            fn un_zigzag(value: $utype) -> Self {
                ((value >> 1) as $type) ^ (-((value & 1) as $type))
            }
        }
    };
}
impl_sint!(i8, u8);
impl_sint!(i16, u16);
impl_sint!(i32, u32);
impl_sint!(i64, u64);

/// Encodes an unsigned integer as a LEB128 varint.
pub fn write<T: UInt>(value: T, buf: &mut impl BufMut) {
    let continuation_threshold = T::from(CONTINUATION_BIT_MASK);
    if value < continuation_threshold {
        // Fast path for small values (common case for lengths).
        buf.put_u8(value.as_u8());
        return;
    }

    let mut val = value;
    while val >= continuation_threshold {
        buf.put_u8((val.as_u8()) | CONTINUATION_BIT_MASK);
        val >>= 7;
    }
    buf.put_u8(val.as_u8());
}

/// Decodes an unsigned integer from a LEB128 varint.
pub fn read<T: UInt>(buf: &mut impl Buf) -> Result<T, Error> {
    let max_bits = std::mem::size_of::<T>() * 8;
    let mut result: T = T::from(0);
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return Err(Error::NoBufferSpace);
        }
        let byte = buf.get_u8();

        // On what must be the last byte, reject bits beyond the size of T. The continuation bit
        // is the most significant bit, so this also rejects a continuation on the last byte.
        let remaining_bits = max_bits - shift;
        if remaining_bits <= DATA_BITS_PER_BYTE {
            let relevant_bits = BITS_PER_BYTE - byte.leading_zeros() as usize;
            if relevant_bits > remaining_bits {
                return Err(Error::invalid("varint overflows its integer type"));
            }
        }

        result |= T::from(byte & DATA_BITS_MASK) << shift;
        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(result);
        }
        shift += DATA_BITS_PER_BYTE;
    }
}

/// Calculates the number of bytes needed to encode an unsigned integer as a LEB128 varint.
pub fn size<T: UInt>(value: T) -> usize {
    let total_bits = std::mem::size_of::<T>() * 8;
    let leading_zeros = value.leading_zeros() as usize;
    let data_bits = total_bits - leading_zeros;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE))
}

/// Tag-prefixed varints.
pub mod fast {
    use super::UInt;
    use crate::{util::at_least, Error};
    use bytes::{Buf, BufMut};

    const SINGLE_BYTE_MAX: u8 = 250;
    const U16_BYTE: u8 = 251;
    const U32_BYTE: u8 = 252;
    const U64_BYTE: u8 = 253;

    /// Encodes an unsigned integer as a tag-prefixed varint.
    pub fn write<T: UInt>(value: T, buf: &mut impl BufMut) {
        let value = value.as_u64();
        if value <= SINGLE_BYTE_MAX as u64 {
            buf.put_u8(value as u8);
        } else if value <= u16::MAX as u64 {
            buf.put_u8(U16_BYTE);
            buf.put_u16_le(value as u16);
        } else if value <= u32::MAX as u64 {
            buf.put_u8(U32_BYTE);
            buf.put_u32_le(value as u32);
        } else {
            buf.put_u8(U64_BYTE);
            buf.put_u64_le(value);
        }
    }

    /// Decodes an unsigned integer from a tag-prefixed varint.
    pub fn read<T: UInt>(buf: &mut impl Buf) -> Result<T, Error> {
        at_least(buf, 1)?;
        let value = match buf.get_u8() {
            byte @ 0..=SINGLE_BYTE_MAX => byte as u64,
            U16_BYTE => {
                at_least(buf, 2)?;
                buf.get_u16_le() as u64
            }
            U32_BYTE => {
                at_least(buf, 4)?;
                buf.get_u32_le() as u64
            }
            U64_BYTE => {
                at_least(buf, 8)?;
                buf.get_u64_le()
            }
            tag => return Err(Error::invalid(format!("invalid varint tag {tag}"))),
        };
        T::from_u64(value).ok_or_else(|| Error::invalid("varint overflows its integer type"))
    }

    /// Calculates the number of bytes needed to encode an unsigned integer as a tag-prefixed
    /// varint.
    pub fn size<T: UInt>(value: T) -> usize {
        let value = value.as_u64();
        if value <= SINGLE_BYTE_MAX as u64 {
            1
        } else if value <= u16::MAX as u64 {
            3
        } else if value <= u32::MAX as u64 {
            5
        } else {
            9
        }
    }
}

impl VarintScheme {
    /// Encodes an unsigned integer with this scheme.
    #[inline]
    pub fn write<T: UInt>(self, value: T, buf: &mut impl BufMut) {
        match self {
            Self::Classic => write(value, buf),
            Self::Fast => fast::write(value, buf),
        }
    }

    /// Decodes an unsigned integer with this scheme.
    #[inline]
    pub fn read<T: UInt>(self, buf: &mut impl Buf) -> Result<T, Error> {
        match self {
            Self::Classic => read(buf),
            Self::Fast => fast::read(buf),
        }
    }

    /// Returns the encoded size of an unsigned integer under this scheme.
    #[inline]
    pub fn size<T: UInt>(self, value: T) -> usize {
        match self {
            Self::Classic => size(value),
            Self::Fast => fast::size(value),
        }
    }

    /// Encodes a signed integer with ZigZag and this scheme.
    #[inline]
    pub fn write_signed<S: SInt>(self, value: S, buf: &mut impl BufMut) {
        self.write(value.as_zigzag(), buf);
    }

    /// Decodes a ZigZag'ed signed integer with this scheme.
    #[inline]
    pub fn read_signed<S: SInt>(self, buf: &mut impl Buf) -> Result<S, Error> {
        Ok(S::un_zigzag(self.read(buf)?))
    }

    /// Returns the encoded size of a signed integer under this scheme.
    #[inline]
    pub fn size_signed<S: SInt>(self, value: S) -> usize {
        self.size(value.as_zigzag())
    }
}

/// An unsigned integer that is always encoded as a varint, regardless of
/// [crate::Config::ENCODING_WITH_VARINT].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UVar<T: UInt>(pub T);

/// A signed integer that is always encoded as a ZigZag varint, regardless of
/// [crate::Config::ENCODING_WITH_VARINT].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SVar<T: SInt>(pub T);

impl<T: UInt> From<T> for UVar<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: SInt> From<T> for SVar<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

macro_rules! impl_uvar {
    ($type:ty, $schema:ident) => {
        impl Describe for UVar<$type> {
            const SCHEMA: &'static Schema = &Schema::$schema;
        }

        impl EncodeSize for UVar<$type> {
            #[inline]
            fn encode_size(&self, layout: &Layout) -> usize {
                layout.scheme().size(self.0)
            }
        }

        impl Write for UVar<$type> {
            #[inline]
            fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
                layout.scheme().write(self.0, buf);
            }
        }

        impl Read for UVar<$type> {
            #[inline]
            fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
                layout.scheme().read(buf).map(UVar)
            }
        }
    };
}
impl_uvar!(u32, VarU32);
impl_uvar!(u64, VarU64);

macro_rules! impl_svar {
    ($type:ty, $schema:ident) => {
        impl Describe for SVar<$type> {
            const SCHEMA: &'static Schema = &Schema::$schema;
        }

        impl EncodeSize for SVar<$type> {
            #[inline]
            fn encode_size(&self, layout: &Layout) -> usize {
                layout.scheme().size_signed(self.0)
            }
        }

        impl Write for SVar<$type> {
            #[inline]
            fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
                layout.scheme().write_signed(self.0, buf);
            }
        }

        impl Read for SVar<$type> {
            #[inline]
            fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
                layout.scheme().read_signed(buf).map(SVar)
            }
        }
    };
}
impl_svar!(i32, VarI32);
impl_svar!(i64, VarI64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Prefix;
    use bytes::BytesMut;
    use paste::paste;

    #[test]
    fn test_small_values() {
        assert_eq!(read::<u8>(&mut &[0x81, 0x01][..]).unwrap(), 0x81);
        assert_eq!(read::<u8>(&mut &[0x01][..]).unwrap(), 0x01);
        assert_eq!(read::<u16>(&mut &[0xAC, 0x02][..]).unwrap(), 300);
    }

    #[test]
    fn test_overlong() {
        // Six bytes can never be a valid u32.
        let overlong = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert!(matches!(
            read::<u32>(&mut &overlong[..]),
            Err(Error::InvalidArgument(_))
        ));

        // Last byte carries a continuation bit.
        let continued = [0xFF, 0x81];
        assert!(matches!(
            read::<u8>(&mut &continued[..]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(read::<u32>(&mut &[0x80, 0x80][..]), Err(Error::NoBufferSpace));
        assert_eq!(read::<u32>(&mut &[0u8; 0][..]), Err(Error::NoBufferSpace));
        assert_eq!(fast::read::<u32>(&mut &[252, 1, 2][..]), Err(Error::NoBufferSpace));
    }

    #[test]
    fn test_classic_sizes() {
        let cases = [
            (0u64, 1),
            (127, 1),
            (128, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (u32::MAX as u64, 5),
            (u64::MAX, 10),
        ];
        for (value, expected) in cases {
            assert_eq!(size(value), expected);
            let mut buf = BytesMut::new();
            write(value, &mut buf);
            assert_eq!(buf.len(), expected);
            assert_eq!(read::<u64>(&mut buf.freeze()).unwrap(), value);
        }
    }

    #[test]
    fn test_fast_layout() {
        let mut buf = BytesMut::new();
        fast::write(250u32, &mut buf);
        assert_eq!(&buf[..], &[250]);

        let mut buf = BytesMut::new();
        fast::write(251u32, &mut buf);
        assert_eq!(&buf[..], &[251, 251, 0]);

        let mut buf = BytesMut::new();
        fast::write(0x1_0000u64, &mut buf);
        assert_eq!(&buf[..], &[252, 0, 0, 1, 0]);

        let mut buf = BytesMut::new();
        fast::write(u64::MAX, &mut buf);
        assert_eq!(buf.len(), 9);
        assert_eq!(buf[0], 253);
    }

    #[test]
    fn test_fast_rejects() {
        assert!(matches!(
            fast::read::<u32>(&mut &[254][..]),
            Err(Error::InvalidArgument(_))
        ));
        // A u64 payload does not fit a u32.
        let mut buf = vec![253];
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            fast::read::<u32>(&mut &buf[..]),
            Err(Error::InvalidArgument(_))
        ));
    }

    macro_rules! zigzag_test {
        ($type:ty) => {
            paste! {
                #[test]
                fn [<test_zigzag_ $type>]() {
                    let values = [0 as $type, 1, -1, <$type>::MAX, <$type>::MIN];
                    for value in values {
                        assert_eq!(<$type>::un_zigzag(value.as_zigzag()), value);
                    }
                    assert_eq!((0 as $type).as_zigzag(), 0);
                    assert_eq!((-1 as $type).as_zigzag(), 1);
                    assert_eq!((1 as $type).as_zigzag(), 2);
                    assert_eq!(<$type>::MIN.as_zigzag(), <<$type as SInt>::Unsigned>::MAX);
                }
            }
        };
    }
    zigzag_test!(i8);
    zigzag_test!(i16);
    zigzag_test!(i32);
    zigzag_test!(i64);

    #[test]
    fn test_schemes_agree_on_values() {
        let values = [0i64, -1, 250, -126, 70_000, i64::MIN, i64::MAX];
        for scheme in [VarintScheme::Classic, VarintScheme::Fast] {
            for value in values {
                let mut buf = BytesMut::new();
                scheme.write_signed(value, &mut buf);
                assert_eq!(buf.len(), scheme.size_signed(value));
                assert_eq!(scheme.read_signed::<i64>(&mut buf.freeze()).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_wrappers() {
        let layout = Layout::new(
            Prefix::Varint(VarintScheme::Classic),
            false,
            VarintScheme::Classic,
        );
        let value = SVar(-2i32);
        assert_eq!(value.encode_size(&layout), 1);
        let mut buf = BytesMut::new();
        value.write(&mut buf, &layout);
        assert_eq!(&buf[..], &[3]);
        assert_eq!(SVar::<i32>::read_cfg(&mut buf.freeze(), &layout).unwrap(), value);

        let value = UVar(300u64);
        let mut buf = BytesMut::new();
        value.write(&mut buf, &layout);
        assert_eq!(&buf[..], &[0xAC, 0x02]);
        assert_eq!(UVar::<u64>::read_cfg(&mut buf.freeze(), &layout).unwrap(), value);
    }
}

//! Core codec traits

use crate::{
    layout::{Layout, Plan},
    util::at_least,
    Config, Error, Schema,
};
use bytes::{Buf, BufMut, BytesMut};

/// Trait for all encodable types: exposes the compile-time [Schema] of the type.
pub trait Describe {
    /// Shape of the type, used for fingerprints, fixed sizes and layout planning.
    const SCHEMA: &'static Schema;

    /// Configuration used when the caller passes [Config::DEFAULT].
    const CONFIG: Config = Config::DEFAULT;
}

/// Trait for types that can report their encoded length.
pub trait EncodeSize: Describe {
    /// Records the element count of every string and container in the value.
    ///
    /// Only called when [Schema::has_prefix] is true. Types without length prefixes keep the
    /// default.
    #[inline]
    fn scan(&self, _plan: &mut Plan) {}

    /// Returns the encoded size of this value under `layout`.
    ///
    /// This method MUST return the exact number of bytes that will be written by `write()`.
    fn encode_size(&self, layout: &Layout) -> usize;
}

/// Trait for types that can be written (encoded) to a buffer.
pub trait Write: EncodeSize {
    /// Encodes this value by writing to a buffer.
    ///
    /// Implementations should panic if the buffer doesn't have enough capacity.
    fn write(&self, buf: &mut impl BufMut, layout: &Layout);
}

/// Trait for types that can be read (decoded) from a buffer.
pub trait Read: Describe + Sized {
    /// Reads a value from the buffer, consuming the necessary bytes.
    ///
    /// Returns an error if the input is malformed or ends early. Never reads past the end of the
    /// buffer.
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error>;

    /// Reads a value into `self`, reusing its allocations where possible.
    ///
    /// On error, `self` holds an unspecified but valid value.
    #[inline]
    fn read_into(&mut self, buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        *self = Self::read_cfg(buf, layout)?;
        Ok(())
    }

    /// Advances past an encoded value without materializing it where the layout allows.
    #[inline]
    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        match Self::SCHEMA.fixed_size(layout.varint_integers()) {
            Some(size) => {
                at_least(buf, size)?;
                buf.advance(size);
                Ok(())
            }
            None => Self::read_cfg(buf, layout).map(drop),
        }
    }
}

/// Trait for aggregates whose `I`th field can be decoded on its own.
///
/// Implemented by `#[derive(Pack)]` for every field of a struct.
pub trait FieldAt<const I: usize>: Describe {
    /// Type of the field.
    type Value: Read;

    /// Skips the fields before `I` and reads field `I`, leaving the rest of the buffer untouched.
    fn read_field(buf: &mut impl Buf, layout: &Layout) -> Result<Self::Value, Error>;
}

/// Extension trait providing ergonomic encode methods.
pub trait Encode: Write + Sized {
    /// Encodes the value with its declared configuration.
    ///
    /// Panics if the `write` implementation does not write the expected number of bytes.
    fn encode(&self) -> BytesMut {
        crate::serialize(self)
    }

    /// Encodes the value with `cfg`.
    fn encode_cfg(&self, cfg: Config) -> BytesMut {
        crate::serialize_with(self, cfg)
    }

    /// Returns the number of bytes [Encode::encode_cfg] would produce.
    fn encoded_len(&self, cfg: Config) -> usize {
        crate::get_needed_size(self, cfg)
    }
}

impl<T: Write> Encode for T {}

/// Extension trait providing ergonomic decode methods.
pub trait Decode: Read {
    /// Decodes a complete message with the type's declared configuration.
    fn decode(buf: &[u8]) -> Result<Self, Error> {
        crate::deserialize(buf)
    }

    /// Decodes a complete message with `cfg`.
    fn decode_cfg(buf: &[u8], cfg: Config) -> Result<Self, Error> {
        crate::deserialize_with(buf, cfg)
    }
}

impl<T: Read> Decode for T {}

/// Trait for types that can be encoded and decoded.
pub trait Codec: Encode + Decode {}

impl<T: Encode + Decode> Codec for T {}

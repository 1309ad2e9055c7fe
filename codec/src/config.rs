//! Encoding policies.
//!
//! A [Config] is a small bit-set. Encoder and decoder must agree on it out of band: nothing in
//! the wire format records which policies were active, apart from what the fingerprint and the
//! optional type literal can detect.

use core::ops::BitOr;

/// A set of independently togglable encoding policies.
///
/// # Examples
///
/// ```
/// use structpack_codec::Config;
///
/// let cfg = Config::DISABLE_ALL_META_INFO | Config::ENCODING_WITH_VARINT;
/// assert!(!cfg.has_header());
/// assert!(cfg.varint_integers());
/// assert!(!cfg.fast_varint());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Config(u8);

const META_MASK: u8 = 0b11;
const ALL_BITS: u8 = 0b1111;

impl Config {
    /// Header with fingerprint, fixed-width integers, fixed-width length prefixes.
    pub const DEFAULT: Self = Self(0);

    /// Never embed the type literal (the fingerprint is still written).
    pub const DISABLE_TYPE_INFO: Self = Self(0b1);

    /// Embed the full type literal after the header.
    pub const ENABLE_TYPE_INFO: Self = Self(0b10);

    /// Drop the header entirely.
    ///
    /// Length prefixes fall back to varints, since the decoder can no longer learn the prefix
    /// width from the header.
    pub const DISABLE_ALL_META_INFO: Self = Self(0b11);

    /// Encode `i32`, `u32`, `i64` and `u64` (and every length prefix) as varints.
    pub const ENCODING_WITH_VARINT: Self = Self(0b100);

    /// Use the tag-prefixed varint scheme instead of LEB128.
    ///
    /// The two schemes describe the same values with different bytes and are not
    /// interchangeable.
    pub const USE_FAST_VARINT: Self = Self(0b1000);

    /// Combines two configurations.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Builds a configuration from raw bits, ignoring unknown ones.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & ALL_BITS)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if a header (fingerprint and optional metainfo) is written.
    pub const fn has_header(self) -> bool {
        self.0 & META_MASK != Self::DISABLE_ALL_META_INFO.0
    }

    /// Returns true if the type literal follows the header.
    pub const fn has_type_literal(self) -> bool {
        self.0 & META_MASK == Self::ENABLE_TYPE_INFO.0
    }

    /// Returns true if 32/64-bit integers are varint encoded.
    pub const fn varint_integers(self) -> bool {
        self.0 & Self::ENCODING_WITH_VARINT.0 != 0
    }

    /// Returns true if varints use the fast (tag-prefixed) scheme.
    pub const fn fast_varint(self) -> bool {
        self.0 & Self::USE_FAST_VARINT.0 != 0
    }

    /// The varint scheme in effect, regardless of whether plain integers are varint encoded.
    pub const fn scheme(self) -> VarintScheme {
        if self.fast_varint() {
            VarintScheme::Fast
        } else {
            VarintScheme::Classic
        }
    }

    /// Bits that change the bytes of the body, folded into fingerprints.
    pub(crate) const fn encoding_bits(self) -> u8 {
        self.0 & (Self::ENCODING_WITH_VARINT.0 | Self::USE_FAST_VARINT.0)
    }

    /// Resolves the configuration used for a call.
    ///
    /// A non-default call-site configuration replaces the type's own configuration.
    pub const fn resolve(call: Self, declared: Self) -> Self {
        if call.0 == Self::DEFAULT.0 {
            declared
        } else {
            call
        }
    }
}

impl BitOr for Config {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Variable-length integer scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarintScheme {
    /// 7 bits per byte with a continuation bit.
    Classic,
    /// A single byte for small values, otherwise a tag byte followed by a fixed-width value.
    Fast,
}

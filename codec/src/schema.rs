//! Structural description of encodable types.
//!
//! Every encodable type exposes a [Schema] through [crate::Describe]. Schemas are built entirely
//! in constant context, so the fingerprint derived from them is a compile-time property of the
//! type (and of the [Config] it is encoded with).
//!
//! # Fingerprint
//!
//! The fingerprint is computed over the "type literal": a byte string with one code per node of
//! the schema, in declaration order. Aggregates are bracketed by a start code and [code::END].
//! [Schema::Compatible] fields of the root struct are left out, so adding or removing them does
//! not change the fingerprint. Everywhere else (nested structs, elements, derived members) a
//! compatible field is hashed like any other member, since only the root's trailing fields can
//! be told apart from the bytes that follow them. The literal ends with the configuration bits
//! that change the body encoding.
//!
//! The literal is hashed with 32-bit FNV-1a followed by the MurmurHash3 `fmix32` finalizer. The
//! lowest bit of the result is cleared: in the wire header it flags the presence of a metainfo
//! byte.

use crate::Config;

/// Type codes written into the type literal.
pub mod code {
    pub const COMPATIBLE: u8 = 0;
    pub const I32: u8 = 1;
    pub const U32: u8 = 2;
    pub const I64: u8 = 3;
    pub const U64: u8 = 4;
    pub const I8: u8 = 5;
    pub const U8: u8 = 6;
    pub const I16: u8 = 7;
    pub const U16: u8 = 8;
    pub const I128: u8 = 9;
    pub const U128: u8 = 10;
    pub const BOOL: u8 = 11;
    pub const CHAR: u8 = 14;
    pub const F32: u8 = 17;
    pub const F64: u8 = 18;
    pub const VAR_I32: u8 = 20;
    pub const VAR_I64: u8 = 21;
    pub const VAR_U32: u8 = 22;
    pub const VAR_U64: u8 = 23;
    pub const FAST_VAR_I32: u8 = 24;
    pub const FAST_VAR_I64: u8 = 25;
    pub const FAST_VAR_U32: u8 = 26;
    pub const FAST_VAR_U64: u8 = 27;
    pub const STRING: u8 = 128;
    pub const ARRAY: u8 = 129;
    pub const MAP: u8 = 130;
    pub const SET: u8 = 131;
    pub const SEQUENCE: u8 = 132;
    pub const OPTIONAL: u8 = 133;
    pub const VARIANT: u8 = 134;
    pub const EXPECTED: u8 = 135;
    pub const DERIVED: u8 = 136;
    pub const UNIT: u8 = 250;
    pub const STRUCT: u8 = 254;
    pub const END: u8 = 255;
}

/// A named member of a [Schema::Struct].
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub schema: &'static Schema,
}

/// Shape of an encodable type.
#[derive(Debug, PartialEq, Eq)]
pub enum Schema {
    Unit,
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I128,
    U128,
    F32,
    F64,
    /// Explicit varint (see [crate::varint::SVar]).
    VarI32,
    VarI64,
    /// Explicit varint (see [crate::varint::UVar]).
    VarU32,
    VarU64,
    String,
    Array {
        element: &'static Schema,
        len: usize,
    },
    Sequence {
        element: &'static Schema,
    },
    Set {
        element: &'static Schema,
    },
    Map {
        key: &'static Schema,
        value: &'static Schema,
    },
    Optional {
        inner: &'static Schema,
    },
    Expected {
        value: &'static Schema,
        error: &'static Schema,
    },
    Compatible {
        inner: &'static Schema,
    },
    Variant {
        alternatives: &'static [&'static Schema],
    },
    Struct {
        fields: &'static [Field],
    },
    /// A closed set of derived types, dispatched by id.
    Derived {
        types: &'static [&'static Schema],
    },
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Incremental FNV-1a over type codes.
#[derive(Clone, Copy)]
struct TypeHasher(u32);

impl TypeHasher {
    const fn new() -> Self {
        Self(FNV_OFFSET)
    }

    const fn byte(self, b: u8) -> Self {
        Self((self.0 ^ b as u32).wrapping_mul(FNV_PRIME))
    }

    const fn length(mut self, mut len: usize) -> Self {
        while len >= 0x80 {
            self = self.byte((len as u8) | 0x80);
            len >>= 7;
        }
        self.byte(len as u8)
    }

    const fn finish(self) -> u32 {
        let mut h = self.0;
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;
        h & !1
    }
}

/// Hashes an arbitrary type literal the same way [Schema::fingerprint] does.
pub fn hash_literal(literal: &[u8]) -> u32 {
    let mut hasher = TypeHasher::new();
    for b in literal {
        hasher = hasher.byte(*b);
    }
    hasher.finish()
}

/// Returns the code of a leaf node, or `None` if the node has children.
const fn leaf_code(schema: &Schema, varint: bool, fast: bool) -> Option<u8> {
    let code = match schema {
        Schema::Unit => code::UNIT,
        Schema::Bool => code::BOOL,
        Schema::Char => code::CHAR,
        Schema::I8 => code::I8,
        Schema::U8 => code::U8,
        Schema::I16 => code::I16,
        Schema::U16 => code::U16,
        Schema::I128 => code::I128,
        Schema::U128 => code::U128,
        Schema::F32 => code::F32,
        Schema::F64 => code::F64,
        Schema::String => code::STRING,
        Schema::I32 if !varint => code::I32,
        Schema::U32 if !varint => code::U32,
        Schema::I64 if !varint => code::I64,
        Schema::U64 if !varint => code::U64,
        Schema::I32 | Schema::VarI32 if fast => code::FAST_VAR_I32,
        Schema::U32 | Schema::VarU32 if fast => code::FAST_VAR_U32,
        Schema::I64 | Schema::VarI64 if fast => code::FAST_VAR_I64,
        Schema::U64 | Schema::VarU64 if fast => code::FAST_VAR_U64,
        Schema::I32 | Schema::VarI32 => code::VAR_I32,
        Schema::U32 | Schema::VarU32 => code::VAR_U32,
        Schema::I64 | Schema::VarI64 => code::VAR_I64,
        Schema::U64 | Schema::VarU64 => code::VAR_U64,
        _ => return None,
    };
    Some(code)
}

const fn hash_walk(
    schema: &Schema,
    varint: bool,
    fast: bool,
    root: bool,
    mut h: TypeHasher,
) -> TypeHasher {
    if let Some(code) = leaf_code(schema, varint, fast) {
        return h.byte(code);
    }
    match schema {
        Schema::Array { element, len } => {
            h = h.byte(code::ARRAY).length(*len);
            hash_walk(element, varint, fast, false, h)
        }
        Schema::Sequence { element } => {
            hash_walk(element, varint, fast, false, h.byte(code::SEQUENCE))
        }
        Schema::Set { element } => hash_walk(element, varint, fast, false, h.byte(code::SET)),
        Schema::Map { key, value } => {
            h = hash_walk(key, varint, fast, false, h.byte(code::MAP));
            hash_walk(value, varint, fast, false, h)
        }
        Schema::Optional { inner } => {
            hash_walk(inner, varint, fast, false, h.byte(code::OPTIONAL))
        }
        Schema::Compatible { inner } => {
            hash_walk(inner, varint, fast, false, h.byte(code::COMPATIBLE))
        }
        Schema::Expected { value, error } => {
            h = hash_walk(value, varint, fast, false, h.byte(code::EXPECTED));
            hash_walk(error, varint, fast, false, h)
        }
        Schema::Variant { alternatives } => {
            h = h.byte(code::VARIANT);
            let mut i = 0;
            while i < alternatives.len() {
                h = hash_walk(alternatives[i], varint, fast, false, h);
                i += 1;
            }
            h.byte(code::END)
        }
        Schema::Derived { types } => {
            h = h.byte(code::DERIVED);
            let mut i = 0;
            while i < types.len() {
                h = hash_walk(types[i], varint, fast, false, h);
                i += 1;
            }
            h.byte(code::END)
        }
        Schema::Struct { fields } => {
            h = h.byte(code::STRUCT);
            let mut i = 0;
            while i < fields.len() {
                if !(root && matches!(fields[i].schema, Schema::Compatible { .. })) {
                    h = hash_walk(fields[i].schema, varint, fast, false, h);
                }
                i += 1;
            }
            h.byte(code::END)
        }
        // Leaves are handled above.
        _ => h,
    }
}

fn literal_walk(schema: &Schema, varint: bool, fast: bool, root: bool, out: &mut Vec<u8>) {
    if let Some(code) = leaf_code(schema, varint, fast) {
        out.push(code);
        return;
    }
    match schema {
        Schema::Array { element, len } => {
            out.push(code::ARRAY);
            let mut len = *len;
            while len >= 0x80 {
                out.push((len as u8) | 0x80);
                len >>= 7;
            }
            out.push(len as u8);
            literal_walk(element, varint, fast, false, out);
        }
        Schema::Sequence { element } => {
            out.push(code::SEQUENCE);
            literal_walk(element, varint, fast, false, out);
        }
        Schema::Set { element } => {
            out.push(code::SET);
            literal_walk(element, varint, fast, false, out);
        }
        Schema::Map { key, value } => {
            out.push(code::MAP);
            literal_walk(key, varint, fast, false, out);
            literal_walk(value, varint, fast, false, out);
        }
        Schema::Optional { inner } => {
            out.push(code::OPTIONAL);
            literal_walk(inner, varint, fast, false, out);
        }
        Schema::Compatible { inner } => {
            out.push(code::COMPATIBLE);
            literal_walk(inner, varint, fast, false, out);
        }
        Schema::Expected { value, error } => {
            out.push(code::EXPECTED);
            literal_walk(value, varint, fast, false, out);
            literal_walk(error, varint, fast, false, out);
        }
        Schema::Variant { alternatives } => {
            out.push(code::VARIANT);
            for alternative in alternatives.iter() {
                literal_walk(alternative, varint, fast, false, out);
            }
            out.push(code::END);
        }
        Schema::Derived { types } => {
            out.push(code::DERIVED);
            for ty in types.iter() {
                literal_walk(ty, varint, fast, false, out);
            }
            out.push(code::END);
        }
        Schema::Struct { fields } => {
            out.push(code::STRUCT);
            for field in fields.iter() {
                if !(root && matches!(field.schema, Schema::Compatible { .. })) {
                    literal_walk(field.schema, varint, fast, false, out);
                }
            }
            out.push(code::END);
        }
        _ => {}
    }
}

impl Field {
    pub const fn new(name: &'static str, schema: &'static Schema) -> Self {
        Self { name, schema }
    }
}

impl Schema {
    /// Structural fingerprint of this schema under `cfg`.
    ///
    /// Only the integer encoding bits of `cfg` participate; header options do not.
    pub const fn fingerprint(&self, cfg: Config) -> u32 {
        let varint = cfg.varint_integers();
        let h = hash_walk(self, varint, cfg.fast_varint(), true, TypeHasher::new());
        h.byte(cfg.encoding_bits()).finish()
    }

    /// Identifier of this schema inside a [Schema::Derived] set.
    ///
    /// Independent of configuration and of the order in which derived types are declared. A
    /// member is never the root of a message, so its compatible fields take part in the id.
    pub const fn derived_id(&self) -> u32 {
        let cfg = Config::DEFAULT;
        let h = hash_walk(self, cfg.varint_integers(), cfg.fast_varint(), false, TypeHasher::new());
        h.byte(cfg.encoding_bits()).finish()
    }

    /// The type literal hashed by [Schema::fingerprint].
    pub fn literal(&self, cfg: Config) -> Vec<u8> {
        let mut out = Vec::new();
        literal_walk(self, cfg.varint_integers(), cfg.fast_varint(), true, &mut out);
        out.push(cfg.encoding_bits());
        out
    }

    /// Returns the encoded size if it does not depend on the value.
    pub const fn fixed_size(&self, varint_integers: bool) -> Option<usize> {
        let size = match self {
            Schema::Unit => 0,
            Schema::Bool | Schema::I8 | Schema::U8 => 1,
            Schema::I16 | Schema::U16 => 2,
            Schema::Char | Schema::F32 => 4,
            Schema::F64 => 8,
            Schema::I128 | Schema::U128 => 16,
            Schema::I32 | Schema::U32 if !varint_integers => 4,
            Schema::I64 | Schema::U64 if !varint_integers => 8,
            Schema::Array { element, len } => match element.fixed_size(varint_integers) {
                Some(size) => match size.checked_mul(*len) {
                    Some(total) => total,
                    None => return None,
                },
                None => return None,
            },
            Schema::Struct { fields } => {
                let mut total = 0usize;
                let mut i = 0;
                while i < fields.len() {
                    match fields[i].schema.fixed_size(varint_integers) {
                        Some(size) => total += size,
                        None => return None,
                    }
                    i += 1;
                }
                total
            }
            _ => return None,
        };
        Some(size)
    }

    /// Returns true if encoding a value of this schema may write a length prefix.
    pub const fn has_prefix(&self) -> bool {
        match self {
            Schema::String | Schema::Sequence { .. } | Schema::Set { .. } | Schema::Map { .. } => {
                true
            }
            Schema::Array { element, .. } => element.has_prefix(),
            Schema::Optional { inner } | Schema::Compatible { inner } => inner.has_prefix(),
            Schema::Expected { value, error } => value.has_prefix() || error.has_prefix(),
            Schema::Variant { alternatives: all } | Schema::Derived { types: all } => {
                let mut i = 0;
                while i < all.len() {
                    if all[i].has_prefix() {
                        return true;
                    }
                    i += 1;
                }
                false
            }
            Schema::Struct { fields } => {
                let mut i = 0;
                while i < fields.len() {
                    if fields[i].schema.has_prefix() {
                        return true;
                    }
                    i += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Returns true if this is a struct with at least one compatible field of its own.
    pub const fn has_compatible(&self) -> bool {
        match self {
            Schema::Struct { fields } => {
                let mut i = 0;
                while i < fields.len() {
                    if matches!(fields[i].schema, Schema::Compatible { .. }) {
                        return true;
                    }
                    i += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Returns true if a compatible field appears anywhere in this schema.
    pub const fn contains_compatible(&self) -> bool {
        match self {
            Schema::Compatible { .. } => true,
            Schema::Array { element, .. }
            | Schema::Sequence { element }
            | Schema::Set { element }
            | Schema::Optional { inner: element } => element.contains_compatible(),
            Schema::Map { key, value } | Schema::Expected { value: key, error: value } => {
                key.contains_compatible() || value.contains_compatible()
            }
            Schema::Variant { alternatives: all } | Schema::Derived { types: all } => {
                let mut i = 0;
                while i < all.len() {
                    if all[i].contains_compatible() {
                        return true;
                    }
                    i += 1;
                }
                false
            }
            Schema::Struct { fields } => {
                let mut i = 0;
                while i < fields.len() {
                    if fields[i].schema.contains_compatible() {
                        return true;
                    }
                    i += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Returns false if a regular field follows a compatible field.
    pub const fn compatible_fields_trail(&self) -> bool {
        match self {
            Schema::Struct { fields } => {
                let mut seen = false;
                let mut i = 0;
                while i < fields.len() {
                    let compatible = matches!(fields[i].schema, Schema::Compatible { .. });
                    if seen && !compatible {
                        return false;
                    }
                    seen |= compatible;
                    i += 1;
                }
                true
            }
            _ => true,
        }
    }

    /// Returns the fields of a struct schema.
    pub fn fields(&self) -> Option<&'static [Field]> {
        match self {
            Schema::Struct { fields } => Some(fields),
            _ => None,
        }
    }
}

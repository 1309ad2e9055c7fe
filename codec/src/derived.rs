//! Closed sets of derived types.
//!
//! A derived set is an enum whose variants each wrap one concrete type, generated with
//! `#[derive(Pack)]` and `#[structpack(derived)]`. On the wire a member is its id followed by
//! its normal encoding:
//!
//! ```text
//! [id: u32] [member encoding]
//! ```
//!
//! The id of a member is the fingerprint of its own schema under the default configuration, so
//! it does not depend on declaration order or on the other members of the set. Decoding an id
//! outside the set is an error.

use crate::{util::at_least, Describe, Error, Schema};
use bytes::{Buf, BufMut};
use tracing::debug;

/// Size of an encoded id.
pub const ID_SIZE: usize = 4;

/// A closed set of derived types.
pub trait DerivedSet: Describe {
    /// Ids of the members, in declaration order.
    const IDS: &'static [u32];

    /// Id of the member held by `self`.
    fn derived_id(&self) -> u32;
}

/// Returns true if no two schemas in `types` share an id.
pub const fn ids_are_distinct(types: &[&Schema]) -> bool {
    let mut i = 0;
    while i < types.len() {
        let id = types[i].derived_id();
        let mut j = i + 1;
        while j < types.len() {
            if types[j].derived_id() == id {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// Writes a member id.
#[inline]
pub fn write_id(id: u32, buf: &mut impl BufMut) {
    buf.put_u32_ne(id);
}

/// Reads a member id.
#[inline]
pub fn read_id(buf: &mut impl Buf) -> Result<u32, Error> {
    at_least(buf, ID_SIZE)?;
    Ok(buf.get_u32_ne())
}

/// Error for an id that names no member of the set.
#[cold]
pub fn unknown_id(id: u32) -> Error {
    debug!(id, "unknown derived type id");
    Error::invalid(format!("unknown derived type id {id:#010x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    const CIRCLE: Schema = Schema::Struct {
        fields: &[Field {
            name: "radius",
            schema: &Schema::F64,
        }],
    };
    const SQUARE: Schema = Schema::Struct {
        fields: &[Field {
            name: "side",
            schema: &Schema::F32,
        }],
    };
    const DISC: Schema = Schema::Struct {
        fields: &[Field {
            name: "r",
            schema: &Schema::F64,
        }],
    };

    #[test]
    fn test_distinct() {
        assert!(ids_are_distinct(&[&CIRCLE, &SQUARE]));
        assert!(ids_are_distinct(&[]));
        // Field names do not participate in ids.
        assert!(!ids_are_distinct(&[&CIRCLE, &SQUARE, &DISC]));
    }

    #[test]
    fn test_ids() {
        let mut buf = Vec::new();
        write_id(CIRCLE.derived_id(), &mut buf);
        assert_eq!(buf.len(), ID_SIZE);
        assert_eq!(read_id(&mut &buf[..]), Ok(CIRCLE.derived_id()));
        assert_eq!(read_id(&mut &buf[..3]), Err(Error::NoBufferSpace));
    }

    #[test]
    fn test_unknown() {
        assert!(matches!(unknown_id(3), Error::InvalidArgument(_)));
    }
}

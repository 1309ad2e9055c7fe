//! Serialize statically described structs.
//!
//! # Overview
//!
//! A binary serialization library designed to efficiently and safely:
//! - Serialize structured data into a compact binary format
//! - Deserialize untrusted binary input into structured data, with explicit errors instead of
//!   panics on malformed input
//! - Detect, before touching the payload, bytes that were written for a different type
//!
//! Every encodable type exposes a compile-time [Schema] through [Describe]. The schema yields a
//! 32-bit fingerprint that is written in a small header in front of each message (unless
//! disabled through [Config]), the fixed encoded size of a type where one exists, and the
//! information needed to choose how length prefixes are laid out.
//!
//! # Supported Types
//!
//! Natively supports:
//! - Primitives: `u8`..`u128`, `i8`..`i128`, `f32`, `f64`, `bool`, `char`, `()`
//! - Strings and bytes: `String`, [bytes::Bytes]
//! - Collections: `Vec<T>`, `VecDeque<T>`, `[T; N]`, tuples up to 12, `BTreeMap`, `HashMap`,
//!   `BTreeSet`, `HashSet`
//! - Sum types: `Option<T>`, `Result<T, E>`, `Box<T>` (transparent)
//! - Explicit varints: [varint::UVar], [varint::SVar]
//! - Versioned optional fields: [Compatible]
//!
//! Structs and enums implement the traits with `#[derive(Pack)]`.
//!
//! # Wire Format
//!
//! ```text
//! [fingerprint: u32] [metainfo: u8]? [total_size]? [type literal]? [body]
//! ```
//!
//! Fixed-size values are written in native byte order. Strings and containers are preceded by
//! their element count, in a width shared by the whole message (1, 2, 4 or 8 bytes) or as
//! varints when the header is disabled or [Config::ENCODING_WITH_VARINT] is set.
//!
//! # Example
//!
//! ```
//! use structpack_codec::{deserialize, get_field, serialize, Config, Pack};
//!
//! #[derive(Pack, Debug, PartialEq)]
//! struct Person {
//!     age: i32,
//!     name: String,
//! }
//!
//! let person = Person { age: 21, name: "Betty".into() };
//! let bytes = serialize(&person);
//! assert_eq!(deserialize::<Person>(&bytes).unwrap(), person);
//!
//! // Read a single field without decoding the others.
//! let name = get_field::<Person, 1>(&bytes, Config::DEFAULT).unwrap();
//! assert_eq!(name, "Betty");
//! ```
//!
//! # Schema Evolution
//!
//! ```
//! use structpack_codec::{deserialize, serialize, Compatible, Pack};
//!
//! #[derive(Pack, Debug, PartialEq)]
//! struct V1 {
//!     id: u64,
//! }
//!
//! #[derive(Pack, Debug, PartialEq)]
//! struct V2 {
//!     id: u64,
//!     note: Compatible<String>,
//! }
//!
//! let old = serialize(&V1 { id: 7 });
//! let upgraded: V2 = deserialize(&old).unwrap();
//! assert_eq!(upgraded.note, Compatible::none());
//!
//! let new = serialize(&V2 { id: 7, note: Compatible::new("hi".into()) });
//! assert_eq!(deserialize::<V1>(&new).unwrap(), V1 { id: 7 });
//! ```

extern crate self as structpack_codec;

pub mod codec;
pub mod config;
pub mod derived;
pub mod error;
pub mod header;
pub mod layout;
mod packer;
pub mod schema;
pub mod types;
mod unpacker;
pub mod util;
pub mod varint;

// Re-export main types and traits
pub use codec::{Codec, Decode, Describe, Encode, EncodeSize, FieldAt, Read, Write};
pub use config::{Config, VarintScheme};
pub use derived::DerivedSet;
pub use error::{error_message, Errc, Error};
pub use packer::{
    get_needed_size, serialize, serialize_into, serialize_to, serialize_with,
    serialize_with_offset,
};
pub use schema::{Field, Schema};
pub use structpack_macros::Pack;
pub use types::compatible::Compatible;
pub use unpacker::{
    deserialize, deserialize_to, deserialize_with, deserialize_with_len, deserialize_with_offset,
    get_field, get_type_code, get_type_literal,
};

#[doc(hidden)]
pub use bytes;

//! Codec implementations for common types

pub mod bytes;
pub mod compatible;
pub mod map;
pub mod primitives;
pub mod tuple;
pub mod vec;

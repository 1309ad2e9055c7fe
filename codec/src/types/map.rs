//! Implementations of Codec for maps and sets.
//!
//! Entries are written in iteration order for the B-tree collections. The hashed collections
//! iterate in an unspecified order, so their entries are written sorted by their encoding: equal
//! collections always produce equal bytes.

use super::vec::{capacity_hint, items_size, read_count, skip_items};
use crate::{
    layout::{Layout, Plan},
    Describe, EncodeSize, Error, Read, Schema, Write,
};
use bytes::{Buf, BufMut};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::{BuildHasher, Hash},
};

/// Encoded size of a map's entries with their count prefix.
#[inline]
fn entries_size<'a, K: EncodeSize + 'a, V: EncodeSize + 'a>(
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    layout: &Layout,
) -> usize {
    let varint = layout.varint_integers();
    let body = match (K::SCHEMA.fixed_size(varint), V::SCHEMA.fixed_size(varint)) {
        (Some(key), Some(value)) => (key + value) * len,
        _ => entries
            .map(|(k, v)| k.encode_size(layout) + v.encode_size(layout))
            .sum(),
    };
    layout.len_size(len) + body
}

/// Fixed size of a map entry, if both key and value have one.
#[inline]
fn entry_size<K: Describe, V: Describe>(layout: &Layout) -> Option<usize> {
    let varint = layout.varint_integers();
    Some(K::SCHEMA.fixed_size(varint)? + V::SCHEMA.fixed_size(varint)?)
}

/// Reads a map's count prefix.
#[inline]
fn read_entry_count<K: Describe, V: Describe>(
    buf: &mut impl Buf,
    layout: &Layout,
) -> Result<usize, Error> {
    read_count(buf, layout, entry_size::<K, V>(layout))
}

/// Writes a count prefix followed by `entries`, sorted.
fn write_sorted(
    len: usize,
    entries: impl Iterator<Item = Vec<u8>>,
    buf: &mut impl BufMut,
    layout: &Layout,
) {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_unstable();
    layout.write_len(len, buf);
    for entry in entries {
        buf.put_slice(&entry);
    }
}

/// Encodes a single entry on its own.
fn encode_entry<K: Write, V: Write>(key: &K, value: &V, layout: &Layout) -> Vec<u8> {
    let mut entry = Vec::with_capacity(key.encode_size(layout) + value.encode_size(layout));
    key.write(&mut entry, layout);
    value.write(&mut entry, layout);
    entry
}

/// Encodes a single item on its own.
fn encode_item<T: Write>(item: &T, layout: &Layout) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(item.encode_size(layout));
    item.write(&mut encoded, layout);
    encoded
}

/// Skips a map's count prefix and entries.
#[inline]
fn skip_entries<K: Read, V: Read>(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
    let len = read_entry_count::<K, V>(buf, layout)?;
    if let Some(size) = entry_size::<K, V>(layout) {
        buf.advance(size * len);
        return Ok(());
    }
    for _ in 0..len {
        K::skip(buf, layout)?;
        V::skip(buf, layout)?;
    }
    Ok(())
}

#[inline]
fn scan_entries<'a, K: EncodeSize + 'a, V: EncodeSize + 'a>(
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    plan: &mut Plan,
) {
    plan.record(len);
    if K::SCHEMA.has_prefix() || V::SCHEMA.has_prefix() {
        for (k, v) in entries {
            k.scan(plan);
            v.scan(plan);
        }
    }
}

#[inline]
fn scan_items<'a, T: EncodeSize + 'a>(
    len: usize,
    items: impl Iterator<Item = &'a T>,
    plan: &mut Plan,
) {
    plan.record(len);
    if T::SCHEMA.has_prefix() {
        items.for_each(|item| item.scan(plan));
    }
}

// BTreeMap implementation
impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    const SCHEMA: &'static Schema = &Schema::Map {
        key: K::SCHEMA,
        value: V::SCHEMA,
    };
}

impl<K: EncodeSize, V: EncodeSize> EncodeSize for BTreeMap<K, V> {
    fn scan(&self, plan: &mut Plan) {
        scan_entries(self.len(), self.iter(), plan);
    }

    fn encode_size(&self, layout: &Layout) -> usize {
        entries_size(self.len(), self.iter(), layout)
    }
}

impl<K: Write, V: Write> Write for BTreeMap<K, V> {
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        for (k, v) in self {
            k.write(buf, layout);
            v.write(buf, layout);
        }
    }
}

impl<K: Read + Ord, V: Read> Read for BTreeMap<K, V> {
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_entry_count::<K, V>(buf, layout)?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let k = K::read_cfg(buf, layout)?;
            let v = V::read_cfg(buf, layout)?;
            map.insert(k, v);
        }
        Ok(map)
    }

    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_entries::<K, V>(buf, layout)
    }
}

// HashMap implementation
impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    const SCHEMA: &'static Schema = &Schema::Map {
        key: K::SCHEMA,
        value: V::SCHEMA,
    };
}

impl<K: EncodeSize, V: EncodeSize, S> EncodeSize for HashMap<K, V, S> {
    fn scan(&self, plan: &mut Plan) {
        scan_entries(self.len(), self.iter(), plan);
    }

    fn encode_size(&self, layout: &Layout) -> usize {
        entries_size(self.len(), self.iter(), layout)
    }
}

impl<K: Write, V: Write, S> Write for HashMap<K, V, S> {
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        let entries = self.iter().map(|(k, v)| encode_entry(k, v, layout));
        write_sorted(self.len(), entries, buf, layout);
    }
}

impl<K: Read + Eq + Hash, V: Read, S: BuildHasher + Default> Read for HashMap<K, V, S> {
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_entry_count::<K, V>(buf, layout)?;
        let mut map = HashMap::with_capacity_and_hasher(capacity_hint(len, buf), S::default());
        for _ in 0..len {
            let k = K::read_cfg(buf, layout)?;
            let v = V::read_cfg(buf, layout)?;
            map.insert(k, v);
        }
        Ok(map)
    }

    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_entries::<K, V>(buf, layout)
    }
}

// BTreeSet implementation
impl<T: Describe> Describe for BTreeSet<T> {
    const SCHEMA: &'static Schema = &Schema::Set { element: T::SCHEMA };
}

impl<T: EncodeSize> EncodeSize for BTreeSet<T> {
    fn scan(&self, plan: &mut Plan) {
        scan_items(self.len(), self.iter(), plan);
    }

    fn encode_size(&self, layout: &Layout) -> usize {
        items_size(self.len(), self.iter(), layout)
    }
}

impl<T: Write> Write for BTreeSet<T> {
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        layout.write_len(self.len(), buf);
        for item in self {
            item.write(buf, layout);
        }
    }
}

impl<T: Read + Ord> Read for BTreeSet<T> {
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_count(buf, layout, T::SCHEMA.fixed_size(layout.varint_integers()))?;
        let mut set = BTreeSet::new();
        for _ in 0..len {
            set.insert(T::read_cfg(buf, layout)?);
        }
        Ok(set)
    }

    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_items::<T>(buf, layout)
    }
}

// HashSet implementation
impl<T: Describe, S> Describe for HashSet<T, S> {
    const SCHEMA: &'static Schema = &Schema::Set { element: T::SCHEMA };
}

impl<T: EncodeSize, S> EncodeSize for HashSet<T, S> {
    fn scan(&self, plan: &mut Plan) {
        scan_items(self.len(), self.iter(), plan);
    }

    fn encode_size(&self, layout: &Layout) -> usize {
        items_size(self.len(), self.iter(), layout)
    }
}

impl<T: Write, S> Write for HashSet<T, S> {
    fn write(&self, buf: &mut impl BufMut, layout: &Layout) {
        let items = self.iter().map(|item| encode_item(item, layout));
        write_sorted(self.len(), items, buf, layout);
    }
}

impl<T: Read + Eq + Hash, S: BuildHasher + Default> Read for HashSet<T, S> {
    fn read_cfg(buf: &mut impl Buf, layout: &Layout) -> Result<Self, Error> {
        let len = read_count(buf, layout, T::SCHEMA.fixed_size(layout.varint_integers()))?;
        let mut set = HashSet::with_capacity_and_hasher(capacity_hint(len, buf), S::default());
        for _ in 0..len {
            set.insert(T::read_cfg(buf, layout)?);
        }
        Ok(set)
    }

    fn skip(buf: &mut impl Buf, layout: &Layout) -> Result<(), Error> {
        skip_items::<T>(buf, layout)
    }
}

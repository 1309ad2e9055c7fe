#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use std::collections::{BTreeMap, HashSet};
use structpack_codec::{
    deserialize_with, deserialize_with_len, get_field, get_needed_size, serialize_into,
    serialize_to, serialize_with,
    varint::{SVar, UVar},
    Compatible, Config, Describe, Pack, Read, Write,
};

#[derive(Arbitrary, Pack, Debug, Clone, PartialEq)]
struct Record {
    id: u64,
    delta: i32,
    name: String,
    tags: Vec<String>,
    scores: BTreeMap<u16, Vec<u8>>,
    flags: HashSet<u8>,
    parent: Option<(u32, char)>,
}

#[derive(Pack, Debug, Clone, PartialEq)]
struct Versioned {
    id: u64,
    note: Compatible<String>,
    extra: Compatible<Vec<u32>>,
}

#[derive(Arbitrary, Pack, Debug, Clone, PartialEq)]
struct Base {
    id: u64,
}

#[derive(Arbitrary, Pack, Debug, Clone, PartialEq)]
enum Event {
    Start,
    Move { x: i64, y: i64 },
    Log(String),
}

#[derive(Arbitrary, Debug)]
enum Value {
    Record(Record),
    Versioned(u64, Option<String>, Option<Vec<u32>>),
    Event(Event),
    Events(Vec<Event>),
    Varints(u64, i64),
    Array([u32; 4]),
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    cfg: u8,
    value: Value,
    raw: Vec<u8>,
}

fn roundtrip<T: Write + Read + PartialEq + std::fmt::Debug>(value: &T, cfg: Config) {
    let encoded = serialize_with(value, cfg);
    assert_eq!(encoded.len(), get_needed_size(value, cfg));

    let (decoded, len) = deserialize_with_len::<T>(&encoded, cfg).expect("decode failed");
    assert_eq!(&decoded, value);
    assert_eq!(len, encoded.len());

    // Every strict prefix is rejected. Without a header, trailing compatible fields may be
    // cut off and read as absent.
    if cfg.has_header() || !T::SCHEMA.has_compatible() {
        for end in 0..encoded.len() {
            assert!(deserialize_with::<T>(&encoded[..end], cfg).is_err());
        }
    }

    let mut appended = BytesMut::from(&b"prefix"[..]);
    assert_eq!(serialize_to(value, cfg, &mut appended), encoded.len());
    assert_eq!(&appended[6..], &encoded[..]);

    if !encoded.is_empty() {
        let mut short = vec![0u8; encoded.len() - 1];
        assert_eq!(serialize_into(value, cfg, &mut short), 0);
    }
}

fn decode_raw<T: Read>(raw: &[u8], cfg: Config) {
    if let Ok((_, len)) = deserialize_with_len::<T>(raw, cfg) {
        assert!(len <= raw.len());
    }
}

fn fuzz(input: FuzzInput) {
    let cfg = Config::from_bits(input.cfg);
    match &input.value {
        Value::Record(it) => {
            roundtrip(it, cfg);
            let encoded = serialize_with(it, cfg);
            assert_eq!(get_field::<Record, 2>(&encoded, cfg).unwrap(), it.name);
            assert_eq!(get_field::<Record, 6>(&encoded, cfg).unwrap(), it.parent);
        }
        Value::Versioned(id, note, extra) => {
            let it = Versioned {
                id: *id,
                note: Compatible::from(note.clone()),
                extra: Compatible::from(extra.clone()),
            };
            roundtrip(&it, cfg);
            if cfg.has_header() {
                // Older readers see only the known fields.
                let encoded = serialize_with(&it, cfg);
                let base = deserialize_with::<Base>(&encoded, cfg).expect("decode failed");
                assert_eq!(base.id, it.id);
            }
        }
        Value::Event(it) => roundtrip(it, cfg),
        Value::Events(it) => roundtrip(it, cfg),
        Value::Varints(u, s) => roundtrip(&(UVar(*u), SVar(*s)), cfg),
        Value::Array(it) => roundtrip(it, cfg),
    }

    decode_raw::<Record>(&input.raw, cfg);
    decode_raw::<Versioned>(&input.raw, cfg);
    decode_raw::<Vec<Event>>(&input.raw, cfg);
    decode_raw::<(UVar<u64>, SVar<i64>)>(&input.raw, cfg);
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});

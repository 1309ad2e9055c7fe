//! End-to-end behavior of complete messages.

use std::collections::{BTreeMap, HashSet};
use structpack_codec::{
    deserialize, deserialize_to, deserialize_with, deserialize_with_offset, error_message,
    get_field, get_needed_size, get_type_code, get_type_literal, serialize, serialize_into,
    serialize_to, serialize_with, serialize_with_offset, Config, Errc, Error, Pack,
};
use structpack_macros::test_traced;

#[derive(Debug, Clone, PartialEq, Pack)]
struct Person {
    age: i32,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Pack)]
struct Account {
    age: i64,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Pack)]
struct Catalog {
    entries: BTreeMap<String, Vec<u32>>,
    flags: HashSet<u8>,
    payload: Vec<u8>,
}

fn betty() -> Person {
    Person {
        age: 21,
        name: "Betty".into(),
    }
}

#[test]
fn test_person() {
    let encoded = serialize(&betty());
    // fingerprint, age, one byte length, name
    assert_eq!(encoded.len(), 4 + 4 + 1 + 5);
    assert_eq!(
        u32::from_ne_bytes(encoded[..4].try_into().unwrap()),
        get_type_code::<Person>(Config::DEFAULT)
    );
    assert_eq!(deserialize::<Person>(&encoded).unwrap(), betty());
    assert_eq!(get_field::<Person, 0>(&encoded, Config::DEFAULT).unwrap(), 21);
    assert_eq!(
        get_field::<Person, 1>(&encoded, Config::DEFAULT).unwrap(),
        "Betty"
    );
}

#[test]
fn test_compact_integers() {
    let cfg = Config::DISABLE_ALL_META_INFO | Config::ENCODING_WITH_VARINT;
    let value = (1i32, -1i32, 0i32, 5i32);
    let encoded = serialize_with(&value, cfg);
    assert_eq!(&encoded[..], &[2, 1, 0, 10]);
    assert_eq!(deserialize_with::<(i32, i32, i32, i32)>(&encoded, cfg).unwrap(), value);
}

#[test]
fn test_fingerprint_depends_on_encoding() {
    let plain = get_type_code::<Person>(Config::DEFAULT);
    let varint = get_type_code::<Person>(Config::ENCODING_WITH_VARINT);
    let fast = get_type_code::<Person>(Config::ENCODING_WITH_VARINT | Config::USE_FAST_VARINT);
    assert_ne!(plain, varint);
    assert_ne!(varint, fast);
    assert_eq!(plain & 1, 0);
    // Header-only flags do not change the fingerprint.
    assert_eq!(plain, get_type_code::<Person>(Config::ENABLE_TYPE_INFO));
}

#[test_traced]
fn test_hash_conflict() {
    let encoded = serialize(&betty());
    assert_eq!(
        deserialize::<Account>(&encoded),
        Err(Error::HashConflict {
            expected: get_type_code::<Account>(Config::DEFAULT),
            found: get_type_code::<Person>(Config::DEFAULT),
        })
    );
    let result = deserialize::<Account>(&encoded);
    assert_eq!(Errc::from(&result), Errc::HashConflict);
    assert_eq!(error_message(Errc::from(&result)), "hash conflict");
}

#[test_traced]
fn test_type_literal() {
    let literal = get_type_literal::<Person>(Config::ENABLE_TYPE_INFO);
    assert!(!literal.is_empty());

    let encoded = serialize_with(&betty(), Config::ENABLE_TYPE_INFO);
    assert!(encoded.len() > serialize(&betty()).len() + literal.len());
    assert_eq!(
        deserialize_with::<Person>(&encoded, Config::ENABLE_TYPE_INFO).unwrap(),
        betty()
    );

    // Corrupt the last byte of the literal, just before the 10-byte body.
    let mut corrupted = encoded.to_vec();
    let at = corrupted.len() - 10 - 1;
    corrupted[at] ^= 0xFF;
    assert!(matches!(
        deserialize_with::<Person>(&corrupted, Config::ENABLE_TYPE_INFO),
        Err(Error::HashConflict { .. })
    ));
}

#[test]
fn test_truncated() {
    for cfg in [
        Config::DEFAULT,
        Config::ENABLE_TYPE_INFO,
        Config::DISABLE_ALL_META_INFO,
        Config::ENCODING_WITH_VARINT,
    ] {
        let encoded = serialize_with(&betty(), cfg);
        for len in 0..encoded.len() {
            assert_eq!(
                deserialize_with::<Person>(&encoded[..len], cfg),
                Err(Error::NoBufferSpace),
                "cfg = {cfg:?}, len = {len}"
            );
        }
    }
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut encoded = serialize(&betty()).to_vec();
    encoded.extend_from_slice(&[0xAA, 0xBB]);
    assert_eq!(deserialize::<Person>(&encoded).unwrap(), betty());
}

#[test]
fn test_serialize_into() {
    let size = get_needed_size(&betty(), Config::DEFAULT);
    let mut out = vec![0u8; size + 3];
    assert_eq!(serialize_into(&betty(), Config::DEFAULT, &mut out), size);
    assert_eq!(&out[..size], &serialize(&betty())[..]);

    let mut short = vec![0u8; size - 1];
    assert_eq!(serialize_into(&betty(), Config::DEFAULT, &mut short), 0);
}

#[test]
fn test_offsets() {
    let mut buffer = serialize_with_offset(&betty(), Config::DEFAULT, 2);
    assert_eq!(&buffer[..2], &[0, 0]);
    let second = Person {
        age: -3,
        name: String::new(),
    };
    let appended = serialize_to(&second, Config::DEFAULT, &mut buffer);
    assert_eq!(appended, get_needed_size(&second, Config::DEFAULT));

    let mut offset = 2;
    let first: Person = deserialize_with_offset(&buffer, &mut offset, Config::DEFAULT).unwrap();
    assert_eq!(first, betty());
    let next: Person = deserialize_with_offset(&buffer, &mut offset, Config::DEFAULT).unwrap();
    assert_eq!(next, second);
    assert_eq!(offset, buffer.len());

    // Nothing left: the offset does not move.
    let end = offset;
    assert_eq!(
        deserialize_with_offset::<Person>(&buffer, &mut offset, Config::DEFAULT),
        Err(Error::NoBufferSpace)
    );
    assert_eq!(offset, end);
    let mut past = buffer.len() + 1;
    assert_eq!(
        deserialize_with_offset::<Person>(&buffer, &mut past, Config::DEFAULT),
        Err(Error::NoBufferSpace)
    );
}

#[test]
fn test_deserialize_to_reuses() {
    let mut person = Person {
        age: 0,
        name: String::with_capacity(64),
    };
    deserialize_to(&mut person, &serialize(&betty()), Config::DEFAULT).unwrap();
    assert_eq!(person, betty());
    assert!(person.name.capacity() >= 64);
}

#[test]
fn test_collections() {
    let catalog = Catalog {
        entries: BTreeMap::from([
            ("a".to_string(), vec![1, 2]),
            ("b".to_string(), vec![u32::MAX; 70_000]),
        ]),
        flags: HashSet::from([1, 2, 3]),
        payload: vec![7; 300],
    };
    for cfg in [
        Config::DEFAULT,
        Config::DISABLE_ALL_META_INFO,
        Config::ENCODING_WITH_VARINT,
        Config::ENCODING_WITH_VARINT | Config::USE_FAST_VARINT,
    ] {
        let encoded = serialize_with(&catalog, cfg);
        assert_eq!(encoded.len(), get_needed_size(&catalog, cfg));
        assert_eq!(deserialize_with::<Catalog>(&encoded, cfg).unwrap(), catalog);
    }
}

#[test]
fn test_wide_prefixes() {
    // The largest count (70000) needs four-byte prefixes for every length in the message.
    let value = (vec![0u8; 70_000], String::from("x"));
    let encoded = serialize(&value);
    assert_eq!(encoded.len(), 4 + 1 + 4 + 70_000 + 4 + 1);
    assert_eq!(deserialize::<(Vec<u8>, String)>(&encoded).unwrap(), value);
}

#[test]
fn test_invalid_content() {
    let cfg = Config::DISABLE_ALL_META_INFO;
    assert!(matches!(
        deserialize_with::<bool>(&[2], cfg),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        deserialize_with::<String>(&[2, 0xFF, 0xFE], cfg),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        deserialize_with::<char>(&0xD800u32.to_ne_bytes(), cfg),
        Err(Error::InvalidArgument(_))
    ));
}

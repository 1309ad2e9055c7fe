//! Decoding entry points.
//!
//! Decoding starts by validating the header (when the configuration has one) against the target
//! type, then reads the body. If the header carries a total size, the body is bounded by it:
//! compatible fields missing from the end of the body decode as absent, and bytes left over
//! after the last known field (compatible fields added by a newer writer) are skipped. A header
//! without a total size comes from a writer with no compatible fields at all, so the reader's
//! compatible fields decode as absent without touching the bytes that follow.

use crate::{
    header::Header,
    layout::{Layout, Width},
    util::at_least,
    Config, Error, FieldAt, Read,
};
use tracing::{debug, trace};

/// Validates the header (if any) for `T` and returns the body layout and length.
fn begin<T: Read>(buf: &mut &[u8], cfg: Config) -> Result<(Layout, Option<usize>), Error> {
    let cfg = Config::resolve(cfg, T::CONFIG);
    if !cfg.has_header() {
        return Ok((Layout::with_width(cfg, Width::One), None));
    }

    let start = buf.len();
    let header = Header::read(buf)?;
    let expected = T::SCHEMA.fingerprint(cfg);
    if header.fingerprint != expected {
        debug!(expected, found = header.fingerprint, "fingerprint mismatch");
        return Err(Error::HashConflict {
            expected,
            found: header.fingerprint,
        });
    }
    if let Some(literal) = &header.literal {
        if *literal != T::SCHEMA.literal(cfg) {
            debug!(fingerprint = expected, "type literal mismatch");
            return Err(Error::HashConflict {
                expected,
                found: header.fingerprint,
            });
        }
    }

    let body = match header.total_size {
        Some((_, total)) => {
            let consumed = start - buf.len();
            let body = total
                .checked_sub(consumed)
                .ok_or_else(|| Error::invalid("total size smaller than header"))?;
            at_least(buf, body)?;
            Some(body)
        }
        None => None,
    };
    let mut layout = Layout::with_width(cfg, header.width);
    if body.is_none() && T::SCHEMA.has_compatible() {
        // The writer's version had no compatible fields: the message ends after the known ones.
        layout = layout.without_compatible();
    }
    trace!(prefix = ?layout.prefix(), body = ?body, "decoding");
    Ok((layout, body))
}

/// Runs `f` over the body, bounded by `body` if known, and advances `buf` past it.
fn in_body<R>(
    buf: &mut &[u8],
    body: Option<usize>,
    f: impl FnOnce(&mut &[u8]) -> Result<R, Error>,
) -> Result<R, Error> {
    let Some(len) = body else {
        return f(buf);
    };
    let whole: &[u8] = buf;
    let (mut scope, rest) = whole.split_at(len);
    let result = f(&mut scope)?;
    if !scope.is_empty() {
        debug!(skipped = scope.len(), "skipping unknown compatible fields");
    }
    *buf = rest;
    Ok(result)
}

fn read_message<T: Read>(buf: &mut &[u8], cfg: Config) -> Result<T, Error> {
    let (layout, body) = begin::<T>(buf, cfg)?;
    in_body(buf, body, |scope| T::read_cfg(scope, &layout))
}

/// Decodes a message with the type's declared configuration.
///
/// Bytes after the message are ignored (see [deserialize_with_len]).
pub fn deserialize<T: Read>(bytes: &[u8]) -> Result<T, Error> {
    deserialize_with(bytes, Config::DEFAULT)
}

/// Decodes a message with `cfg`.
pub fn deserialize_with<T: Read>(bytes: &[u8], cfg: Config) -> Result<T, Error> {
    let mut buf = bytes;
    read_message(&mut buf, cfg)
}

/// Decodes a message and returns it with the number of bytes it occupied.
pub fn deserialize_with_len<T: Read>(bytes: &[u8], cfg: Config) -> Result<(T, usize), Error> {
    let mut buf = bytes;
    let value = read_message(&mut buf, cfg)?;
    Ok((value, bytes.len() - buf.len()))
}

/// Decodes a message starting at `*offset`, then advances `offset` past it.
///
/// On error, `offset` is left unchanged.
pub fn deserialize_with_offset<T: Read>(
    bytes: &[u8],
    offset: &mut usize,
    cfg: Config,
) -> Result<T, Error> {
    let rest = bytes.get(*offset..).ok_or(Error::NoBufferSpace)?;
    let (value, len) = deserialize_with_len(rest, cfg)?;
    *offset += len;
    Ok(value)
}

/// Decodes a message into an existing value, reusing its allocations.
pub fn deserialize_to<T: Read>(value: &mut T, bytes: &[u8], cfg: Config) -> Result<(), Error> {
    let mut buf = bytes;
    let (layout, body) = begin::<T>(&mut buf, cfg)?;
    in_body(&mut buf, body, |scope| value.read_into(scope, &layout))
}

/// Decodes field `I` of a message of type `T`, skipping the fields before it.
///
/// The header is validated as for a full decode.
pub fn get_field<T, const I: usize>(bytes: &[u8], cfg: Config) -> Result<T::Value, Error>
where
    T: FieldAt<I> + Read,
{
    let mut buf = bytes;
    let (layout, body) = begin::<T>(&mut buf, cfg)?;
    in_body(&mut buf, body, |scope| T::read_field(scope, &layout))
}

/// Returns the fingerprint of `T` under `cfg`.
pub fn get_type_code<T: Read>(cfg: Config) -> u32 {
    T::SCHEMA.fingerprint(Config::resolve(cfg, T::CONFIG))
}

/// Returns the type literal of `T` under `cfg`.
pub fn get_type_literal<T: Read>(cfg: Config) -> Vec<u8> {
    T::SCHEMA.literal(Config::resolve(cfg, T::CONFIG))
}

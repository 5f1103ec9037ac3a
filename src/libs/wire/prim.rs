//! Primitive little-endian fields and count-prefixed arrays.
//!
//! Counts are written as `i32`, like every other integer of the layout.

use super::cursor::ByteReader;
use super::error::{WireError, WireResult};

pub const I32_LEN: usize = 4;
pub const F64_LEN: usize = 8;

/// A value with a fixed field order on the wire.
///
/// `wire_len` must equal the number of bytes `put` appends: the encoder sizes
/// its buffer from it before writing anything.
pub trait Wire: Sized {
    fn wire_len(&self) -> usize;
    fn put(&self, out: &mut Vec<u8>) -> WireResult<()>;
    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self>;
}

pub fn put_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn put_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Flag stored in one byte.
pub fn put_flag_u8(out: &mut Vec<u8>, value: bool) {
    put_u8(out, value as u8);
}

/// Flag stored in an `i32`.
pub fn put_flag_i32(out: &mut Vec<u8>, value: bool) {
    put_i32(out, value as i32);
}

pub fn put_count(out: &mut Vec<u8>, len: usize, field: &'static str) -> WireResult<()> {
    let count = i32::try_from(len).map_err(|_| WireError::invalid_length(field))?;
    put_i32(out, count);
    Ok(())
}

pub fn take_u8(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<u8> {
    Ok(reader.read_array::<1>(field)?[0])
}

pub fn take_i32(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<i32> {
    Ok(i32::from_le_bytes(reader.read_array::<4>(field)?))
}

pub fn take_f64(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<f64> {
    Ok(f64::from_le_bytes(reader.read_array::<8>(field)?))
}

pub fn take_flag_u8(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<bool> {
    match take_u8(reader, field)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(WireError::invalid_value(field)),
    }
}

pub fn take_flag_i32(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<bool> {
    match take_i32(reader, field)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(WireError::invalid_value(field)),
    }
}

/// Reads a count and checks that `count * min_item_len` bytes can follow.
pub fn take_count(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    min_item_len: usize,
) -> WireResult<usize> {
    let count = take_i32(reader, field)?;
    let count = usize::try_from(count).map_err(|_| WireError::invalid_length(field))?;
    if count.saturating_mul(min_item_len) > reader.remaining() {
        return Err(WireError::invalid_length(field));
    }
    Ok(count)
}

pub fn put_coords(out: &mut Vec<u8>, coords: &[f64; 3]) {
    for c in coords {
        put_f64(out, *c);
    }
}

pub fn take_coords(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<[f64; 3]> {
    Ok([
        take_f64(reader, field)?,
        take_f64(reader, field)?,
        take_f64(reader, field)?,
    ])
}

/// Size of a count-prefixed array
pub fn vec_len<T: Wire>(items: &[T]) -> usize {
    I32_LEN + items.iter().map(Wire::wire_len).sum::<usize>()
}

pub fn put_vec<T: Wire>(out: &mut Vec<u8>, items: &[T], field: &'static str) -> WireResult<()> {
    put_count(out, items.len(), field)?;
    for item in items {
        item.put(out)?;
    }
    Ok(())
}

/// Reads a count-prefixed array whose items take at least `min_item_len` bytes.
pub fn take_vec<T: Wire>(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    min_item_len: usize,
) -> WireResult<Vec<T>> {
    let count = take_count(reader, field, min_item_len)?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(T::take(reader)?);
    }
    Ok(items)
}

/// Reads exactly `count` items, for arrays whose count was written elsewhere.
pub fn take_n<T: Wire>(reader: &mut ByteReader<'_>, count: usize) -> WireResult<Vec<T>> {
    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(T::take(reader)?);
    }
    Ok(items)
}

pub fn cstr_len(s: &str) -> usize {
    s.len() + 1
}

/// NUL-terminated string; the string itself must not contain NUL.
pub fn put_cstr(out: &mut Vec<u8>, s: &str, field: &'static str) -> WireResult<()> {
    if s.as_bytes().contains(&0) {
        return Err(WireError::invalid_value(field));
    }
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    Ok(())
}

pub fn take_cstr(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<String> {
    let bytes = reader.read_until_nul(field)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::invalid_value(field))
}

pub fn bytes_len(bytes: &[u8]) -> usize {
    I32_LEN + bytes.len()
}

pub fn put_bytes(out: &mut Vec<u8>, bytes: &[u8], field: &'static str) -> WireResult<()> {
    put_count(out, bytes.len(), field)?;
    out.extend_from_slice(bytes);
    Ok(())
}

pub fn take_bytes(reader: &mut ByteReader<'_>, field: &'static str) -> WireResult<Vec<u8>> {
    let len = take_count(reader, field, 1)?;
    Ok(reader.read_exact(len, field)?.to_vec())
}

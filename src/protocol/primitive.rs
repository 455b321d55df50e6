use crate::error::{Error, Result};
use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian::{U16 as U16BE, U32 as U32BE, U64 as U64BE};

fn unexpected_eof(needed: usize, available: usize) -> Error {
    Error::protocol(format!(
        "unexpected end of data: need {} bytes, have {}",
        needed, available
    ))
}

/// Bytes of `data` from `offset` on
pub fn tail_at(data: &[u8], offset: usize) -> Result<&[u8]> {
    data.get(offset..)
        .ok_or_else(|| unexpected_eof(offset, data.len()))
}

/// Read 1-byte integer
pub fn read_int_1(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((first, rest)) => Ok((*first, rest)),
        None => Err(unexpected_eof(1, 0)),
    }
}

/// Read 2-byte big-endian integer
pub fn read_int_2(data: &[u8]) -> Result<(u16, &[u8])> {
    let (value, rest) =
        U16BE::read_from_prefix(data).map_err(|_e| unexpected_eof(2, data.len()))?;
    Ok((value.get(), rest))
}

/// Read 4-byte big-endian integer
pub fn read_int_4(data: &[u8]) -> Result<(u32, &[u8])> {
    let (value, rest) =
        U32BE::read_from_prefix(data).map_err(|_e| unexpected_eof(4, data.len()))?;
    Ok((value.get(), rest))
}

/// Read 8-byte big-endian integer
pub fn read_int_8(data: &[u8]) -> Result<(u64, &[u8])> {
    let (value, rest) =
        U64BE::read_from_prefix(data).map_err(|_e| unexpected_eof(8, data.len()))?;
    Ok((value.get(), rest))
}

/// Read exactly `len` bytes
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if data.len() < len {
        return Err(unexpected_eof(len, data.len()));
    }
    Ok(data.split_at(len))
}

// ============================================================================
// Writers
// ============================================================================

pub fn write_int_1(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn write_int_2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_int_4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_int_8(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
}

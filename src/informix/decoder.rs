use std::sync::Arc;

use crate::cache::shared_str;
use crate::col::ResultColumn;
use crate::error::{Error, Result};
use crate::informix::data_type::InformixDataType;
use crate::protocol::decoder::RowDecoder;
use crate::protocol::primitive::{read_bytes, read_int_1, read_int_2, read_int_4, read_int_8, tail_at};
use crate::value::{Date, Time, Timestamp, Value};

type Column = ResultColumn<InformixDataType>;

/// Row layout of Informix results
///
/// Values follow each other without separators. Constant-length columns take
/// their declared size; a VARCHAR value is one length byte and then the bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct InformixRowDecoder;

impl InformixRowDecoder {
    pub fn new() -> Self {
        Self
    }

    /// UTF-8 bytes of a string value starting at `offset`
    fn string_bytes<'a>(&self, row: &'a [u8], offset: usize, column: &Column) -> Result<&'a [u8]> {
        let data = tail_at(row, offset)?;
        let (bytes, _) = match column.data_type() {
            InformixDataType::Char => read_bytes(data, column.max_length() as usize)?,
            InformixDataType::VarChar => {
                let (len, rest) = read_int_1(data)?;
                read_bytes(rest, usize::from(len))?
            }
            other => return Err(Error::unsupported(format!("string decode of {:?}", other))),
        };
        Ok(bytes)
    }

    fn str<'a>(&self, row: &'a [u8], offset: usize, column: &Column) -> Result<&'a str> {
        let bytes = self.string_bytes(row, offset, column)?;
        simdutf8::basic::from_utf8(bytes).map_err(|_e| {
            Error::protocol(format!("column {:?} is not valid UTF-8", column.name()))
        })
    }
}

impl RowDecoder for InformixRowDecoder {
    type DataType = InformixDataType;

    fn find_row_column_offset(&self, columns: &[Column], index: usize, row: &[u8]) -> Result<usize> {
        let preceding = columns.get(..index).ok_or_else(|| {
            Error::BadUsageError(format!(
                "column index {} out of range for {} columns",
                index,
                columns.len()
            ))
        })?;
        let mut offset = 0;
        for column in preceding {
            offset += match column.data_type() {
                data_type if data_type.is_constant_length() => column.num_row_bytes(),
                InformixDataType::VarChar => {
                    let (len, _) = read_int_1(tail_at(row, offset)?)?;
                    usize::from(len) + 1
                }
                other => {
                    return Err(Error::unsupported(format!("row offset past {:?}", other)));
                }
            };
        }
        Ok(offset)
    }

    fn decode_boolean(&self, _row: &[u8], _offset: usize, column: &Column) -> Result<bool> {
        Err(Error::unsupported(format!("boolean decode of {:?}", column.data_type())))
    }

    fn decode_byte(&self, row: &[u8], offset: usize, _column: &Column) -> Result<i8> {
        let (value, _) = read_int_1(tail_at(row, offset)?)?;
        Ok(value as i8)
    }

    fn decode_short(&self, row: &[u8], offset: usize, _column: &Column) -> Result<i16> {
        let (value, _) = read_int_2(tail_at(row, offset)?)?;
        Ok(value as i16)
    }

    fn decode_int(&self, row: &[u8], offset: usize, _column: &Column) -> Result<i32> {
        let (value, _) = read_int_4(tail_at(row, offset)?)?;
        Ok(value as i32)
    }

    fn decode_long(&self, row: &[u8], offset: usize, _column: &Column) -> Result<i64> {
        let (value, _) = read_int_8(tail_at(row, offset)?)?;
        Ok(value as i64)
    }

    fn decode_float(&self, row: &[u8], offset: usize, _column: &Column) -> Result<f32> {
        let (bits, _) = read_int_4(tail_at(row, offset)?)?;
        Ok(f32::from_bits(bits))
    }

    fn decode_double(&self, row: &[u8], offset: usize, _column: &Column) -> Result<f64> {
        let (bits, _) = read_int_8(tail_at(row, offset)?)?;
        Ok(f64::from_bits(bits))
    }

    fn decode_string(&self, row: &[u8], offset: usize, column: &Column) -> Result<Arc<str>> {
        self.str(row, offset, column).map(shared_str)
    }

    fn decode_bytes(&self, _row: &[u8], _offset: usize, column: &Column) -> Result<Vec<u8>> {
        Err(Error::unsupported(format!("bytes decode of {:?}", column.data_type())))
    }

    fn decode_date(&self, _row: &[u8], _offset: usize, column: &Column) -> Result<Date> {
        Err(Error::unsupported(format!("date decode of {:?}", column.data_type())))
    }

    fn decode_time(&self, _row: &[u8], _offset: usize, column: &Column) -> Result<Time> {
        Err(Error::unsupported(format!("time decode of {:?}", column.data_type())))
    }

    fn decode_timestamp(&self, _row: &[u8], _offset: usize, column: &Column) -> Result<Timestamp> {
        Err(Error::unsupported(format!("timestamp decode of {:?}", column.data_type())))
    }

    fn decode_object(&self, row: &[u8], offset: usize, column: &Column) -> Result<Value> {
        match column.data_type() {
            InformixDataType::Char | InformixDataType::VarChar => {
                self.str(row, offset, column).map(Value::string)
            }
            InformixDataType::Integer | InformixDataType::Serial => {
                self.decode_int(row, offset, column).map(Value::Int)
            }
        }
    }
}

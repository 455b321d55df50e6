use std::fmt::Debug;
use std::sync::Arc;

use auto_impl::auto_impl;

use crate::col::ResultColumn;
use crate::error::Result;
use crate::value::{Date, Time, Timestamp, Value};

/// Decodes column values out of a vendor row layout
///
/// `row` is the byte window of exactly one row and `offset` the position of
/// the column's value within it.
#[auto_impl(&, Box, Arc)]
pub trait RowDecoder {
    type DataType: Copy + Debug;

    /// Offset of column `index` found by walking the columns before it
    fn find_row_column_offset(
        &self,
        columns: &[ResultColumn<Self::DataType>],
        index: usize,
        row: &[u8],
    ) -> Result<usize>;

    fn decode_boolean(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<bool>;

    fn decode_byte(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<i8>;

    fn decode_short(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<i16>;

    fn decode_int(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<i32>;

    fn decode_long(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<i64>;

    fn decode_float(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<f32>;

    fn decode_double(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<f64>;

    fn decode_string(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Arc<str>>;

    fn decode_bytes(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Vec<u8>>;

    fn decode_date(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Date>;

    fn decode_time(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Time>;

    fn decode_timestamp(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Timestamp>;

    /// Value of whatever type the column holds
    fn decode_object(
        &self,
        row: &[u8],
        offset: usize,
        column: &ResultColumn<Self::DataType>,
    ) -> Result<Value>;
}

use pretty_assertions::assert_eq;

use crate::col::{ColumnDescription, ResultSetMetaData};
use crate::error::Error;
use crate::informix::data_type::InformixDataType;
use crate::informix::decoder::InformixRowDecoder;
use crate::protocol::decoder::RowDecoder;
use crate::resultset::RowView;
use crate::value::Value;

fn column(data_type: InformixDataType, name: &str, max_length: u32) -> ColumnDescription<InformixDataType> {
    ColumnDescription {
        data_type,
        sql_type: data_type.sql_type(),
        name: name.to_string(),
        max_length,
        constant_length: data_type.is_constant_length(),
        max_row_bytes: data_type.row_bytes(max_length),
    }
}

#[test]
fn varchar_length_prefix_moves_next_offset() {
    let metadata = ResultSetMetaData::new(
        vec![
            column(InformixDataType::VarChar, "name", 20),
            column(InformixDataType::Integer, "id", 4),
        ],
        None,
    );
    let mut row = vec![5];
    row.extend_from_slice(b"hello");
    row.extend_from_slice(&42i32.to_be_bytes());

    let decoder = InformixRowDecoder::new();
    let view = RowView::new(&row, &metadata, &decoder);
    assert_eq!(view.column_offset(1).unwrap(), 6);
    assert_eq!(&*view.get_string(0).unwrap(), "hello");
    assert_eq!(view.get_int(1).unwrap(), 42);
}

#[test]
fn constant_offsets_match_scanning() {
    let metadata = ResultSetMetaData::new(
        vec![
            column(InformixDataType::Integer, "a", 4),
            column(InformixDataType::Char, "b", 3),
            column(InformixDataType::Serial, "c", 4),
            column(InformixDataType::Char, "d", 1),
        ],
        Some(1),
    );
    let row = [0u8; 12];
    let decoder = InformixRowDecoder::new();
    for (index, column) in metadata.columns().iter().enumerate() {
        assert!(column.retrieve_by_offset());
        assert_eq!(
            decoder
                .find_row_column_offset(metadata.columns(), index, &row)
                .unwrap(),
            column.byte_array_row_offset()
        );
    }
}

#[test]
fn char_reads_declared_width() {
    let metadata = ResultSetMetaData::new(vec![column(InformixDataType::Char, "code", 4)], None);
    let decoder = InformixRowDecoder::new();
    let row = b"ab  ";
    let view = RowView::new(row, &metadata, &decoder);
    assert_eq!(&*view.get_string(0).unwrap(), "ab  ");
}

#[test]
fn big_endian_scalars() {
    let metadata = ResultSetMetaData::new(vec![column(InformixDataType::Integer, "n", 4)], None);
    let column = &metadata.columns()[0];
    let decoder = InformixRowDecoder::new();

    let row = [0xFF, 0xFE, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
    assert_eq!(decoder.decode_byte(&row, 0, column).unwrap(), -1);
    assert_eq!(decoder.decode_short(&row, 0, column).unwrap(), -2);
    assert_eq!(decoder.decode_short(&row, 2, column).unwrap(), 0x0102);
    assert_eq!(decoder.decode_int(&row, 4, column).unwrap(), 0x0304_0506);
    assert_eq!(
        decoder.decode_long(&row, 0, column).unwrap(),
        i64::from_be_bytes(row)
    );

    let float = 1.5f32.to_bits().to_be_bytes();
    assert_eq!(decoder.decode_float(&float, 0, column).unwrap().to_bits(), 1.5f32.to_bits());
    let double = (-2.25f64).to_bits().to_be_bytes();
    assert_eq!(
        decoder.decode_double(&double, 0, column).unwrap().to_bits(),
        (-2.25f64).to_bits()
    );
}

#[test]
fn objects_follow_column_type() {
    let metadata = ResultSetMetaData::new(
        vec![
            column(InformixDataType::Serial, "id", 4),
            column(InformixDataType::VarChar, "tag", 10),
        ],
        None,
    );
    let mut row = 7i32.to_be_bytes().to_vec();
    row.extend_from_slice(&[2, b'o', b'k']);

    let decoder = InformixRowDecoder::new();
    let view = RowView::new(&row, &metadata, &decoder);
    assert_eq!(view.get_object(0).unwrap(), Value::Int(7));
    assert_eq!(view.get_object(1).unwrap(), Value::string("ok"));
}

#[test]
fn wrong_and_unsupported_types() {
    let metadata = ResultSetMetaData::new(
        vec![
            column(InformixDataType::Integer, "n", 4),
            column(InformixDataType::Char, "c", 2),
        ],
        None,
    );
    let row = [0, 0, 0, 1, b'x', b'y'];
    let decoder = InformixRowDecoder::new();
    let view = RowView::new(&row, &metadata, &decoder);

    assert!(matches!(
        view.get_string(0),
        Err(Error::WrongColumnType { index: 0, .. })
    ));
    assert!(matches!(view.get_int(1), Err(Error::WrongColumnType { index: 1, .. })));
    assert!(matches!(
        decoder.decode_date(&row, 0, &metadata.columns()[0]),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn truncated_varchar_is_a_protocol_error() {
    let metadata = ResultSetMetaData::new(vec![column(InformixDataType::VarChar, "s", 10)], None);
    let decoder = InformixRowDecoder::new();
    let row = [9, b'a'];
    let view = RowView::new(&row, &metadata, &decoder);
    assert!(matches!(view.get_string(0), Err(Error::ProtocolError(_))));
}

#[cfg(feature = "value-cache")]
#[test]
fn short_strings_are_interned() {
    let metadata = ResultSetMetaData::new(vec![column(InformixDataType::VarChar, "code", 8)], None);
    let decoder = InformixRowDecoder::new();
    let first_row = [2, b'O', b'K'];
    let second_row = [2, b'O', b'K'];

    let first = RowView::new(&first_row, &metadata, &decoder).get_string(0).unwrap();
    let second = RowView::new(&second_row, &metadata, &decoder).get_string(0).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

use pretty_assertions::assert_eq;

use crate::col::{ColumnDescription, ResultSetMetaData};
use crate::constant::SqlType;

fn desc(name: &str, constant_length: bool, max_row_bytes: usize) -> ColumnDescription<u8> {
    ColumnDescription {
        data_type: 0,
        sql_type: if constant_length {
            SqlType::Integer
        } else {
            SqlType::VarChar
        },
        name: name.to_string(),
        max_length: max_row_bytes as u32,
        constant_length,
        max_row_bytes,
    }
}

#[test]
fn offsets_until_first_variable_column() {
    let meta = ResultSetMetaData::new(
        vec![
            desc("id", true, 4),
            desc("code", true, 2),
            desc("name", false, 21),
            desc("age", true, 4),
        ],
        Some(10),
    );

    let offsets: Vec<(bool, usize)> = meta
        .columns()
        .iter()
        .map(|c| (c.retrieve_by_offset(), c.byte_array_row_offset()))
        .collect();
    assert_eq!(offsets, vec![(true, 0), (true, 4), (false, 0), (false, 0)]);
    assert_eq!(meta.max_bytes_per_row(), 31);
    assert_eq!(meta.total_rows(), Some(10));
}

#[test]
fn label_lookup_ignores_case() {
    let meta = ResultSetMetaData::new(
        vec![desc("Id", true, 4), desc("NAME", false, 9), desc("id", true, 4)],
        None,
    );
    assert_eq!(meta.find_column("ID").unwrap(), 0);
    assert_eq!(meta.find_column("name").unwrap(), 1);
    assert!(meta.find_column("missing").is_err());
    assert_eq!(meta.column_label(1).unwrap(), "NAME");
    assert_eq!(meta.sql_type(1).unwrap(), SqlType::VarChar);
    assert_eq!(meta.max_length(0).unwrap(), 4);
    assert!(meta.column(3).is_err());
}

#[test]
fn with_total_rows_keeps_columns() {
    let meta = ResultSetMetaData::new(vec![desc("a", true, 4)], None);
    let known = meta.with_total_rows(Some(3));
    assert_eq!(known.total_rows(), Some(3));
    assert_eq!(known.column_count(), 1);
    assert_eq!(meta.total_rows(), None);
}

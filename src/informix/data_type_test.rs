use crate::constant::SqlType;
use crate::informix::data_type::InformixDataType;

#[test]
fn codes_round_trip() {
    for data_type in [
        InformixDataType::Char,
        InformixDataType::Integer,
        InformixDataType::Serial,
        InformixDataType::VarChar,
    ] {
        assert_eq!(InformixDataType::from_code(data_type.code()), Some(data_type));
    }
    assert_eq!(InformixDataType::from_code(0x0001), None);
}

#[test]
fn wire_characteristics() {
    assert_eq!(InformixDataType::Serial.sql_type(), SqlType::Integer);
    assert_eq!(InformixDataType::VarChar.sql_type(), SqlType::VarChar);

    assert!(InformixDataType::Char.is_constant_length());
    assert!(!InformixDataType::VarChar.is_constant_length());

    assert_eq!(InformixDataType::Char.update_length_bytes(), 2);
    assert_eq!(InformixDataType::VarChar.update_length_bytes(), 1);
    assert_eq!(InformixDataType::Integer.update_length_bytes(), 0);

    assert!(InformixDataType::Char.is_string());
    assert!(!InformixDataType::Serial.is_string());
}

#[test]
fn row_bytes_include_length_prefix() {
    assert_eq!(InformixDataType::Char.row_bytes(8), 8);
    assert_eq!(InformixDataType::VarChar.row_bytes(8), 9);
    assert_eq!(InformixDataType::Integer.row_bytes(0), 4);
}

use crate::protocol::primitive::*;

#[test]
fn big_endian_widths() {
    let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xFF];

    let (v1, rest) = read_int_1(&data).unwrap();
    assert_eq!(v1, 0x01);
    assert_eq!(rest.len(), 8);

    let (v2, _) = read_int_2(&data).unwrap();
    assert_eq!(v2, 0x0102);

    let (v4, _) = read_int_4(&data).unwrap();
    assert_eq!(v4, 0x0102_0304);

    let (v8, rest) = read_int_8(&data).unwrap();
    assert_eq!(v8, 0x0102_0304_0506_0708);
    assert_eq!(rest, &[0xFF]);
}

#[test]
fn negative_values() {
    let (v, _) = read_int_2(&[0xFF, 0xFE]).unwrap();
    assert_eq!(v as i16, -2);
    let (v, _) = read_int_4(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
    assert_eq!(v as i32, -1);
    let (v, _) = read_int_8(&[0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    assert_eq!(v as i64, i64::MIN);
}

#[test]
fn short_input() {
    assert!(read_int_1(&[]).is_err());
    assert!(read_int_2(&[1]).is_err());
    assert!(read_int_4(&[1, 2, 3]).is_err());
    assert!(read_int_8(&[0; 7]).is_err());
    assert!(read_bytes(&[1, 2], 3).is_err());
    assert!(tail_at(&[1, 2], 3).is_err());
    assert_eq!(tail_at(&[1, 2], 2).unwrap(), &[] as &[u8]);
}

#[test]
fn writers_are_big_endian() {
    let mut out = Vec::new();
    write_int_1(&mut out, 0xAB);
    write_int_2(&mut out, 0x0102);
    write_int_4(&mut out, 0x0304_0506);
    write_int_8(&mut out, 0x0708_090A_0B0C_0D0E);
    write_bytes(&mut out, b"xy");
    assert_eq!(
        out,
        vec![
            0xAB, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, b'x', b'y'
        ]
    );
}

use crate::buffer::{Body, EmitBuffer, Header};

#[test]
fn writes_big_endian() {
    let mut buf = EmitBuffer::<Body>::with_capacity(0);
    buf.u1(0xAB);
    buf.u2(0x0102);
    buf.u4(0x0304_0506);
    buf.bytes(&[7, 8]);

    assert_eq!(buf.as_slice(), &[0xAB, 1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(buf.len(), 9);
}

#[test]
fn growth_preserves_earlier_offsets() {
    let mut buf = EmitBuffer::<Body>::with_capacity(4);
    for i in 0..200u16 {
        buf.u2(i);
    }
    buf.bytes(&vec![0xEE; 10_000]);

    assert_eq!(buf.len(), 10_400);
    for i in 0..200u16 {
        assert_eq!(buf.u2_at(i as usize * 2), Some(i));
    }
}

#[test]
fn growth_doubles_capacity() {
    let mut buf = EmitBuffer::<Body>::with_capacity(128);
    buf.bytes(&[0; 128]);
    buf.u1(1);

    assert!(buf.capacity() >= 256);
}

#[test]
fn reserved_fields_are_patched() {
    let mut buf = EmitBuffer::<Body>::with_capacity(16);
    let count = buf.reserve_u2();
    let length = buf.reserve_u4();
    buf.bytes(&[1, 2, 3]);
    buf.patch_length(length);
    buf.patch_u2(count, 3);

    assert_eq!(buf.as_slice(), &[0, 3, 0, 0, 0, 3, 1, 2, 3]);
}

#[test]
fn rewind_drops_partial_write() {
    let mut buf = EmitBuffer::<Body>::with_capacity(16);
    buf.u2(7);
    let mark = buf.mark();
    buf.u4(0xFFFF_FFFF);
    buf.rewind(mark);

    assert_eq!(buf.as_slice(), &[0, 7]);
    assert_eq!(buf.mark(), mark);
}

#[test]
fn header_concatenates_body() {
    let mut header = EmitBuffer::<Header>::with_capacity(8);
    let mut body = EmitBuffer::<Body>::with_capacity(8);
    header.u4(0xCAFE_BABE);
    body.u2(0x0021);

    assert_eq!(header.concat(&body), vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0x21]);
}

#[test]
fn clear_keeps_allocation() {
    let mut buf = EmitBuffer::<Header>::with_capacity(64);
    buf.bytes(&[1; 32]);
    buf.clear();

    assert!(buf.is_empty());
    assert!(buf.capacity() >= 64);
}

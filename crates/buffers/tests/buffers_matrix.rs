//! Writer/Reader roundtrip matrix for the buffers crate.

use mojom_buffers::{padding_for, print_octets, BufferError, Reader, Writer};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Writer/Reader roundtrip matrix
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_mixed_widths() {
    let mut w = Writer::new();
    w.i8(i8::MIN);
    w.u8(0xFF);
    w.i16(-1000);
    w.u16(u16::MAX);
    w.i32(i32::MIN);
    w.u32(0x0102_0304);
    w.i64(-9_999_999_999);
    w.u64(u64::MAX);
    w.f32(1.5);
    w.f64(-0.25);
    let data = w.flush();
    assert_eq!(data.len(), 1 + 1 + 2 + 2 + 4 + 4 + 8 + 8 + 4 + 8);

    let mut r = Reader::new(&data);
    assert_eq!(r.i8().unwrap(), i8::MIN);
    assert_eq!(r.u8().unwrap(), 0xFF);
    assert_eq!(r.i16().unwrap(), -1000);
    assert_eq!(r.u16().unwrap(), u16::MAX);
    assert_eq!(r.i32().unwrap(), i32::MIN);
    assert_eq!(r.u32().unwrap(), 0x0102_0304);
    assert_eq!(r.i64().unwrap(), -9_999_999_999);
    assert_eq!(r.u64().unwrap(), u64::MAX);
    assert_eq!(r.f32().unwrap(), 1.5);
    assert_eq!(r.f64().unwrap(), -0.25);
    assert_eq!(r.size(), 0);
}

#[test]
fn wire_bytes_are_little_endian() {
    let mut w = Writer::new();
    w.u16(0x0102);
    w.u32(0x0304_0506);
    assert_eq!(print_octets(&w.flush(), 16), "02 01 06 05 04 03");
}

#[test]
fn reader_views_do_not_escape_their_end() {
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let mut outer = Reader::new(&data);
    outer.skip(2).unwrap();
    let mut view = outer.cut(4).unwrap();
    assert_eq!(view.u32().unwrap(), 0x0605_0403);
    assert!(matches!(view.u8(), Err(BufferError::EndOfBuffer { .. })));
    assert_eq!(outer.u16().unwrap(), 0x0807);
}

#[test]
fn buf_and_skip_respect_bounds() {
    let data = [9u8; 5];
    let mut r = Reader::new(&data);
    assert_eq!(r.buf(3).unwrap(), &[9, 9, 9]);
    assert!(r.skip(3).is_err());
    assert!(r.buf(3).is_err());
    assert_eq!(r.buf(2).unwrap().len(), 2);
}

proptest! {
    #[test]
    fn u64_roundtrip(value in any::<u64>()) {
        let mut w = Writer::new();
        w.u64(value);
        let data = w.flush();
        prop_assert_eq!(Reader::new(&data).u64().unwrap(), value);
    }

    #[test]
    fn pad_to_always_lands_on_boundary(prefix in 0usize..64, shift in 0u32..5) {
        let alignment = 1usize << shift;
        let mut w = Writer::new();
        w.zeros(prefix);
        let padding = w.pad_to(alignment);
        prop_assert_eq!(padding, padding_for(prefix, alignment));
        prop_assert_eq!(w.x() % alignment, 0);
        prop_assert!(padding < alignment);
    }
}

//! End-to-end tests over the full read/write surface: the 18-byte sample
//! record, byte-order-mark resolution, skip and explicit-offset handling,
//! and writer/reader round trips across both byte orders.

use byteflip::{
    Endianness, EndianReader, EndianWriter, FieldDef, SwapError, SwapLayout, TypeLayout,
};
use std::io::Cursor;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// An 18-byte record written little-endian: marker, u8, one pad byte,
/// u16, u32, u64, packed to 2-byte boundaries.
const SAMPLE: [u8; 18] = [
    0xFE, 0xFF, // byte-order mark
    0xFF, // level
    0x00, // padding
    0xFF, 0x7F, // u16
    0xFF, 0xFF, 0xFF, 0x7F, // u32
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F, // u64
];

fn sample_layout() -> TypeLayout {
    TypeLayout::builder("SampleRecord")
        .pack(2)
        .field(FieldDef::primitive("marker", 2))
        .field(FieldDef::primitive("level", 1))
        .field(FieldDef::primitive("count", 2))
        .field(FieldDef::primitive("extent", 4))
        .field(FieldDef::primitive("stamp", 8))
        .build(18)
}

fn read_sample_fields(r: &mut EndianReader<'_>) -> (u16, u8, u16, u32, u64) {
    let marker: u16 = r.read().unwrap();
    let level: u8 = r.read().unwrap();
    r.align_up(2).unwrap();
    let count: u16 = r.read().unwrap();
    let extent: u32 = r.read().unwrap();
    let stamp: u64 = r.read().unwrap();
    (marker, level, count, extent, stamp)
}

#[test]
fn sample_layout_places_fields_at_expected_offsets() {
    let plan = sample_layout().compile().unwrap();
    let ranges: Vec<(usize, usize)> = plan.ops().iter().map(|op| (op.offset(), op.len())).collect();
    assert_eq!(ranges, vec![(0, 2), (2, 1), (4, 2), (6, 4), (10, 8)]);
}

#[test]
fn sample_reads_as_little_endian_under_little_target() {
    let mut buf = SAMPLE;
    let mut r = EndianReader::new(&mut buf, Endianness::Little);
    let (marker, level, count, extent, stamp) = read_sample_fields(&mut r);
    assert_eq!(Endianness::from_marker(marker), Some(Endianness::Little));
    assert_eq!(level, 0xFF);
    assert_eq!(count, 0x7FFF);
    assert_eq!(extent, 0x7FFF_FFFF);
    assert_eq!(stamp, 0x7FFF_FFFF_FFFF_FFFF);
    assert_eq!(r.position(), 18);
}

#[test]
fn sample_marker_decodes_as_big_under_big_target() {
    // Forcing the wrong target reverses each field in place; every field
    // decodes byte-reversed, starting with the marker naming the
    // mismatch.
    let mut buf = SAMPLE;
    let mut r = EndianReader::new(&mut buf, Endianness::Big);
    let (marker, level, count, extent, stamp) = read_sample_fields(&mut r);
    assert_eq!(Endianness::from_marker(marker), Some(Endianness::Big));
    assert_eq!(level, 0xFF);
    assert_eq!(count, 0x7FFF_u16.swap_bytes());
    assert_eq!(extent, 0x7FFF_FFFF_u32.swap_bytes());
    assert_eq!(stamp, 0x7FFF_FFFF_FFFF_FFFF_u64.swap_bytes());
    // Field offsets are unchanged; only bytes within each field moved.
    assert_eq!(r.position(), 18);
    assert_eq!(buf[3], 0x00);
}

#[test]
fn sample_resolves_correctly_from_either_initial_assumption() {
    for initial in [Endianness::Little, Endianness::Big] {
        let mut buf = SAMPLE;
        let mut r = EndianReader::with_byte_order_mark(&mut buf, initial).unwrap();
        assert_eq!(r.endianness(), Endianness::Little);
        let (_, level, count, extent, stamp) = read_sample_fields(&mut r);
        assert_eq!(level, 0xFF);
        assert_eq!(count, 0x7FFF);
        assert_eq!(extent, 0x7FFF_FFFF);
        assert_eq!(stamp, 0x7FFF_FFFF_FFFF_FFFF);
    }
}

#[test]
fn plan_applies_as_involution_on_sample() {
    let plan = sample_layout().compile().unwrap();
    let mut buf = SAMPLE;
    plan.apply(&mut buf).unwrap();
    assert_ne!(buf, SAMPLE);
    // Padding is untouched by the first pass.
    assert_eq!(buf[3], 0x00);
    plan.apply(&mut buf).unwrap();
    assert_eq!(buf, SAMPLE);
}

#[derive(Debug, PartialEq, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct Extent {
    lo: u32,
    hi: u32,
}

impl SwapLayout for Extent {
    fn layout() -> TypeLayout {
        TypeLayout::builder("Extent")
            .pack(4)
            .field(FieldDef::primitive("lo", 4))
            .field(FieldDef::primitive("hi", 4))
            .build(8)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct Region {
    tag: u32,
    bounds: [Extent; 2],
    span: u32,
}

impl SwapLayout for Region {
    fn layout() -> TypeLayout {
        TypeLayout::builder("Region")
            .pack(4)
            .field(FieldDef::primitive("tag", 4))
            .field(FieldDef::nested_of::<Extent>("bounds").unwrap().array(2))
            .field(FieldDef::primitive("span", 4))
            .build(24)
    }
}

#[test]
fn nested_composite_round_trips_both_orders() {
    let region = Region {
        tag: 0xCAFE_F00D,
        bounds: [Extent { lo: 1, hi: 2 }, Extent { lo: 3, hi: 4 }],
        span: 0x0123_4567,
    };
    for endian in [Endianness::Little, Endianness::Big] {
        let mut out = Cursor::new(Vec::new());
        let mut w = EndianWriter::new(&mut out, endian).unwrap();
        w.write_composite(&region).unwrap();
        let mut bytes = out.into_inner();
        assert_eq!(bytes.len(), 24);

        let mut r = EndianReader::new(&mut bytes, endian);
        let back: Region = r.read_composite().unwrap();
        assert_eq!(back, region);
    }
}

#[test]
fn foreign_write_then_plan_application_reads_natively() {
    // Writing with order E and reading with the opposite order yields the
    // byte-reversed fields; one further plan application restores them.
    let region = Region {
        tag: 0x11223344,
        bounds: [Extent { lo: 5, hi: 6 }, Extent { lo: 7, hi: 8 }],
        span: 99,
    };
    for endian in [Endianness::Little, Endianness::Big] {
        let mut out = Cursor::new(Vec::new());
        let mut w = EndianWriter::new(&mut out, endian).unwrap();
        w.write_composite(&region).unwrap();
        let mut bytes = out.into_inner();

        Region::plan().unwrap().apply(&mut bytes).unwrap();
        let mut r = EndianReader::new(&mut bytes, endian.opposite());
        let back: Region = r.read_composite().unwrap();
        assert_eq!(back, region);
    }
}

#[test]
fn skip_fields_are_inert_but_advance_the_cursor() {
    let layout = TypeLayout::builder("WithReserved")
        .field(FieldDef::primitive("head", 2))
        .field(FieldDef::primitive("reserved", 1).array(4).skip())
        .field(FieldDef::primitive("tail", 2))
        .build(8);
    let plan = layout.compile().unwrap();

    let mut buf = [0x01, 0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0x03, 0x04];
    plan.apply(&mut buf).unwrap();
    // Reserved bytes are bit-identical, their neighbors reversed.
    assert_eq!(buf, [0x02, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0x04, 0x03]);
}

#[test]
fn explicit_offset_field_lands_exactly_there() {
    let layout = TypeLayout::builder("Sparse")
        .field(FieldDef::primitive("head", 2))
        .field(FieldDef::primitive("moved", 4).at(12))
        .build(16);
    let plan = layout.compile().unwrap();

    let mut buf = [0u8; 16];
    buf[12..16].copy_from_slice(&[0x0D, 0x0C, 0x0B, 0x0A]);
    plan.apply(&mut buf).unwrap();
    assert_eq!(&buf[12..16], &[0x0A, 0x0B, 0x0C, 0x0D]);
    // The gap between the fields was never touched.
    assert_eq!(&buf[2..12], &[0u8; 10]);

    let mut buf = [0u8; 16];
    buf[12..16].copy_from_slice(&0x0A0B0C0Du32.to_le_bytes());
    let mut r = EndianReader::new(&mut buf, Endianness::Little);
    assert_eq!(r.read_at::<u32>(12).unwrap(), 0x0A0B0C0D);
}

#[test]
fn stream_round_trip_with_byte_order_mark() {
    for endian in [Endianness::Little, Endianness::Big] {
        let mut out = Cursor::new(Vec::new());
        let mut w = EndianWriter::new(&mut out, endian).unwrap();
        w.write_byte_order_mark().unwrap();
        w.write(&0xBEEF_u16).unwrap();
        w.write(&0x0102_0304_u32).unwrap();
        w.align_up(8).unwrap();
        w.write(&0x1122_3344_5566_7788_u64).unwrap();
        let mut bytes = out.into_inner();
        assert_eq!(bytes.len(), 16);

        let mut r = EndianReader::with_byte_order_mark(&mut bytes, Endianness::Little).unwrap();
        assert_eq!(r.endianness(), endian);
        r.advance(2).unwrap();
        assert_eq!(r.read::<u16>().unwrap(), 0xBEEF);
        assert_eq!(r.read::<u32>().unwrap(), 0x0102_0304);
        r.align_up(8).unwrap();
        assert_eq!(r.read::<u64>().unwrap(), 0x1122_3344_5566_7788);
    }
}

#[test]
fn truncated_reads_surface_out_of_range() {
    let mut buf = [0u8; 6];
    let mut r = EndianReader::new(&mut buf, Endianness::Little);
    assert_eq!(r.read::<u32>().unwrap(), 0);
    assert!(matches!(
        r.read::<u32>(),
        Err(SwapError::OutOfRange { offset: 4, len: 4, size: 6 })
    ));
}

#[test]
fn sequences_round_trip() {
    let values: Vec<u32> = (0..64).map(|i| i * 0x01010101).collect();
    for endian in [Endianness::Little, Endianness::Big] {
        let mut out = Cursor::new(Vec::new());
        let mut w = EndianWriter::new(&mut out, endian).unwrap();
        w.write_sequence(&values).unwrap();
        let mut bytes = out.into_inner();

        let mut r = EndianReader::new(&mut bytes, endian);
        let corrected = r.read_sequence::<u32>(64).unwrap().to_vec();
        let back: Vec<u32> = corrected
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(back, values);
    }
}

#![allow(dead_code)]

use parsing::{Cursor, Error, ReadBytes};

parsing::parsable_struct! {
    #[derive(Debug, PartialEq)]
    pub struct Header {
        pub id: u32,
        [[magic: u16 = 0xBEEF]]
        [[padding_bytes = 2]]
        [[ignore: u8]]
        pub version: u16,
    }
}

const HEADER_LE: [u8; 11] = [7, 0, 0, 0, 0xEF, 0xBE, 0xAA, 0xAA, 0xFF, 3, 0];

#[test]
fn magic_padding_and_ignore() {
    let mut b = HEADER_LE.as_slice();
    let header: Header = b.read_type_le().unwrap();
    assert_eq!(header, Header { id: 7, version: 3 });
    assert!(b.is_empty());
}

#[test]
fn byte_order_is_picked_by_the_reader() {
    let bytes = [0, 0, 0, 7, 0xBE, 0xEF, 0, 0, 0, 0, 3];
    let mut b = bytes.as_slice();
    let header: Header = b.read_type_be().unwrap();
    assert_eq!(header, Header { id: 7, version: 3 });
}

#[test]
fn magic_mismatch() {
    let mut bytes = HEADER_LE;
    bytes[5] = 0xAD;
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Header>().unwrap_err(),
        Error::BadMagic {
            expected: 0xBEEF,
            found: 0xADEF
        }
    );
}

#[test]
fn derive_reads_in_declaration_order() {
    #[derive(Debug, PartialEq, parsing::Parse)]
    struct Span {
        start: i16,
        len: u8,
        #[parse(sized_buf = len)]
        data: Vec<u8>,
    }

    let bytes = [0xFE, 0xFF, 2, 9, 8];
    let mut b = bytes.as_slice();
    let span: Span = b.read_type_le().unwrap();
    assert_eq!(
        span,
        Span {
            start: -2,
            len: 2,
            data: vec![9, 8]
        }
    );
}

parsing::parsable_struct! {
    #[derive(Debug)]
    pub struct Named<'a> {
        [[param: u16 = len]]
        #[parse(sized_utf8_string = len)]
        pub borrowed: &'a str,
        [[param: u8 = owned_len]]
        #[parse(sized_utf8_string = owned_len)]
        pub owned: String,
    }
}

#[test]
fn sized_strings() {
    let mut bytes = vec![5, 0];
    bytes.extend_from_slice(b"layer");
    bytes.push(3);
    bytes.extend_from_slice(b"cel");
    let mut b = bytes.as_slice();
    let named: Named = b.read_type_le().unwrap();
    assert_eq!(named.borrowed, "layer");
    assert_eq!(named.owned, "cel");
}

#[test]
fn invalid_utf8() {
    let bytes = [2, 0, 0xF0, 0x28, 0, 0];
    let mut b = bytes.as_slice();
    assert!(matches!(
        b.read_type_le::<Named>().unwrap_err(),
        Error::InvalidUtf8(_)
    ));
}

#[test]
fn string_longer_than_input() {
    let bytes = [9, 0, b'a', b'b'];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Named>().unwrap_err(),
        Error::OutOfData {
            needed: 9,
            remaining: 2
        }
    );
}

parsing::parsable_struct! {
    #[derive(Debug, PartialEq)]
    pub struct Packet<'a> {
        [[param: u8 = len]]
        #[parse(sized_buf = len)]
        pub colors: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Debug)]
    pub struct Packets<'a> {
        [[param: u16 = count]]
        #[parse(collection: Packet = count)]
        pub packets: Vec<Packet<'a>>,
        #[parse(rest_of_buf)]
        pub trailer: &'a [u8],
    }
}

#[test]
fn counted_collection_then_rest() {
    let bytes = [2, 0, 3, 1, 2, 3, 1, 4, 0xAA, 0xBB];
    let mut b = bytes.as_slice();
    let packets: Packets = b.read_type_le().unwrap();
    assert_eq!(packets.packets.len(), 2);
    assert_eq!(packets.packets[0].colors, &[1, 2, 3]);
    assert_eq!(packets.packets[1].colors, &[4]);
    assert_eq!(packets.trailer, &[0xAA, 0xBB]);
    assert!(b.is_empty());
}

#[test]
fn conditional_fields() {
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Entry {
            flags: u8,
            #[parse(option_if: u16 = (flags & 1) != 0)]
            first: Option<u16>,
            #[parse(option_if: [u8; 2] = (flags & 2) != 0)]
            second: Option<[u8; 2]>,
            end: u8,
        }
    }

    let bytes = [3, 0x34, 0x12, 5, 6, 0xFF];
    let mut b = bytes.as_slice();
    let entry: Entry = b.read_type_le().unwrap();
    assert_eq!(entry.first, Some(0x1234));
    assert_eq!(entry.second, Some([5, 6]));
    assert_eq!(entry.end, 0xFF);

    let bytes = [2, 5, 6, 0xFF];
    let mut b = bytes.as_slice();
    let entry: Entry = b.read_type_le().unwrap();
    assert_eq!(entry.first, None);
    assert_eq!(entry.second, Some([5, 6]));
    assert_eq!(entry.end, 0xFF);
}

parsing::parsable_struct! {
    #[derive(Debug)]
    pub struct Block {
        [[param: u32 = size]]
        [[limit_buffer = parsing::body_len(size, 4)?]]
        pub kind: u16,
    }
}

#[test]
fn limit_buffer_skips_unread_tail() {
    let bytes = [9, 0, 0, 0, 1, 0, 0xDE, 0xAD, 0xBE, 7];
    let mut b = bytes.as_slice();
    let block: Block = b.read_type_le().unwrap();
    assert_eq!(block.kind, 1);
    assert_eq!(b, &[7]);
}

#[test]
fn limit_buffer_bounds_reads() {
    // declares a two byte body but the field needs more
    parsing::parsable_struct! {
        #[derive(Debug)]
        pub struct Wide {
            [[param: u32 = size]]
            [[limit_buffer = parsing::body_len(size, 4)?]]
            pub value: u32,
        }
    }

    let bytes = [6, 0, 0, 0, 1, 2, 3, 4];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Wide>().unwrap_err(),
        Error::OutOfData {
            needed: 4,
            remaining: 2
        }
    );

    let bytes = [3, 0, 0, 0];
    let mut b = bytes.as_slice();
    assert_eq!(
        b.read_type_le::<Block>().unwrap_err(),
        Error::InvalidLength {
            declared: 3,
            minimum: 4
        }
    );
}

parsing::parsable_enum! {
    #[derive(Debug, PartialEq)]
    #[repr(u16)]
    pub enum Record<'a> {
        [[param: u32 = size]]
        [[limit_buffer = parsing::body_len(size, 4)?]]
        [[param: u16 = kind]]
        [[enum_type = kind]]
        Level(u8) = 0x10,
        Offset(i32) = 0x11,
        Name(Packet<'a>) = 0x20,
    }
}

fn record(kind: u16, body: &[u8]) -> Vec<u8> {
    let mut out = (body.len() as u32 + 6).to_le_bytes().to_vec();
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(body);
    out
}

#[test]
fn enum_variants() {
    let bytes = [
        record(0x10, &[3]),
        record(0x11, &(-5_i32).to_le_bytes()),
        record(0x20, &[2, b'o', b'k']),
    ]
    .concat();
    let mut b = bytes.as_slice();
    assert_eq!(b.read_type_le::<Record>().unwrap(), Record::Level(3));
    assert_eq!(b.read_type_le::<Record>().unwrap(), Record::Offset(-5));
    match b.read_type_le::<Record>().unwrap() {
        Record::Name(packet) => assert_eq!(packet.colors, b"ok"),
        other => panic!("unexpected record {other:?}"),
    }
    assert!(b.is_empty());
}

#[test]
fn unknown_variant_consumes_its_span() {
    let bytes = [record(0x99, &[1, 2, 3]), record(0x10, &[42])].concat();
    let mut c = Cursor::new(&bytes);
    assert_eq!(
        c.read_type_le::<Record>().unwrap_err(),
        Error::UnknownVariant { value: 0x99 }
    );
    assert_eq!(c.position(), 9);
    assert_eq!(c.read_type_le::<Record>().unwrap(), Record::Level(42));
}

use property_list::{
    decode,
    encode,
    Dictionary,
    Error,
    Format,
    OrderedSet,
    Set,
    Url,
    Uuid,
    Value,
};

const TRAILER_SIZE: usize = 32;

/// Reads a big-endian trailer field.
fn trailer_u64(document: &[u8], at: usize) -> u64 {
    let start = document.len() - TRAILER_SIZE + at;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&document[start .. start + 8]);
    u64::from_be_bytes(bytes)
}

fn object_reference_size(document: &[u8]) -> u8 {
    document[document.len() - TRAILER_SIZE + 7]
}

#[test]
fn test_extended_header_trigger() {
    let extended = vec![
        Value::Null,
        Value::Set(Set::new(vec![])),
        Value::OrderedSet(OrderedSet::new(vec![])),
        Value::Url(Url::new("http://example.com")),
        Value::Uuid(Uuid([0; 16])),
    ];
    for value in extended {
        let nested = Value::Array(vec![Value::Array(vec![value])]);
        let document = encode(&nested).unwrap();
        assert_eq!(&document[.. 8], b"bplist10");
        assert_eq!(Format::detect(&document), Format::Binary);
    }

    let mut dictionary = Dictionary::new();
    dictionary.insert(String::from("key"), Value::Array(vec![Value::from(1.5), Value::from("s")]));
    let document = encode(&Value::Dictionary(dictionary)).unwrap();
    assert_eq!(&document[.. 8], b"bplist00");
}

#[test]
fn test_inline_size_boundary() {
    let fourteen = encode(&Value::Array(vec![Value::from(true); 14])).unwrap();
    assert_eq!(fourteen[8], 0xAE);
    assert_eq!(fourteen[9], 0x01);

    let fifteen = encode(&Value::Array(vec![Value::from(true); 15])).unwrap();
    assert_eq!(&fifteen[8 .. 12], &[0xAF, 0x10, 0x0F, 0x01]);
    assert_eq!(decode(&fifteen), Ok(Value::Array(vec![Value::from(true); 15])));

    let data = encode(&Value::Data(vec![0xEE; 15])).unwrap();
    assert_eq!(&data[8 .. 11], &[0x4F, 0x10, 0x0F]);
}

#[test]
fn test_reference_width() {
    // 256 elements and the array itself.
    let value = Value::Array(vec![Value::from(0); 256]);
    let document = encode(&value).unwrap();
    assert_eq!(trailer_u64(&document, 8), 257);
    assert_eq!(object_reference_size(&document), 2);
    assert_eq!(decode(&document), Ok(value));

    let value = Value::Array(vec![Value::from(0); 255]);
    let document = encode(&value).unwrap();
    assert_eq!(trailer_u64(&document, 8), 256);
    assert_eq!(object_reference_size(&document), 1);
}

#[test]
fn test_trailer_layout() {
    let document = encode(&Value::from("root")).unwrap();
    let trailer = &document[document.len() - TRAILER_SIZE .. ];
    assert_eq!(&trailer[.. 6], &[0, 0, 0, 0, 0, 0]);
    assert_eq!(trailer_u64(&document, 8), 1);
    assert_eq!(trailer_u64(&document, 16), 0);
    assert_eq!(trailer_u64(&document, 24), 8 + 5);
}

#[test]
fn test_negative_integer_width() {
    let document = encode(&Value::from(-1)).unwrap();
    assert_eq!(&document[8 .. 17], &[0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(decode(&document), Ok(Value::from(-1)));

    let document = encode(&Value::from(-(1i64 << 30))).unwrap();
    assert_eq!(document[8], 0x13);
}

#[test]
fn test_dictionary_entries_ordered_by_key_after_decode() {
    let mut dictionary = Dictionary::new();
    dictionary.insert(String::from("zebra"), Value::from(1));
    dictionary.insert(String::from("apple"), Value::from(2));
    dictionary.insert(String::from("mango"), Value::from(3));
    let document = encode(&Value::Dictionary(dictionary)).unwrap();

    // Keys are written in insertion order.
    assert_eq!(&document[8 .. 15], &[0xD3, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    assert_eq!(&document[15 .. 21], &[0x55, b'z', b'e', b'b', b'r', b'a']);

    // Entries are returned ordered by key.
    let decoded = decode(&document).unwrap();
    let keys = decoded
        .as_dictionary()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect::<Vec<&str>>();
    assert_eq!(keys, vec!["apple", "mango", "zebra"]);
}

#[test]
fn test_decode_too_short() {
    assert_eq!(decode(&[]), Err(Error::Eof));
    assert_eq!(decode(&[0u8; 31]), Err(Error::Eof));
}

#[test]
fn test_decode_invalid_header() {
    let mut document = encode(&Value::from(true)).unwrap();
    document[0] = b'x';
    assert_eq!(decode(&document), Err(Error::MissingOrInvalidHeader));
}

#[test]
fn test_decode_offset_past_end() {
    let mut document = encode(&Value::Array(vec![Value::from(1)])).unwrap();

    // The offset table holds one-byte offsets for the two objects.
    let offset_table = trailer_u64(&document, 24) as usize;
    document[offset_table + 1] = 0xF0;
    assert_eq!(
        decode(&document),
        Err(Error::InvalidOffsetToObject { object: 1, offset: 0xF0 })
    );
}

#[test]
fn test_decode_offset_table_past_end() {
    let mut document = encode(&Value::from(true)).unwrap();
    let length = document.len();
    document[length - 8 .. ].copy_from_slice(&u64::max_value().to_be_bytes());
    assert_eq!(decode(&document), Err(Error::MissingOrInvalidOffsetTable));
}

#[test]
fn test_decode_invalid_trailer_widths() {
    let mut document = encode(&Value::from(true)).unwrap();
    let length = document.len();
    document[length - TRAILER_SIZE + 7] = 0;
    assert_eq!(decode(&document), Err(Error::MissingOrInvalidTrailer));
}

#[test]
fn test_decode_invalid_root() {
    let mut document = encode(&Value::from(true)).unwrap();
    let length = document.len();
    document[length - 16 .. length - 8].copy_from_slice(&1u64.to_be_bytes());
    assert_eq!(decode(&document), Err(Error::InvalidRootObject));
}

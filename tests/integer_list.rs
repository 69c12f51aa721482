use property_list::Value;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

fn read_integer_list_plist() -> Vec<u8> {
    let mut plist_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    plist_path.push("tests/integer_list.plist");

    let mut file = fs::File::open(plist_path).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

#[test]
fn test_deserialize_integer_list() {
    let data = read_integer_list_plist();
    assert_eq!(
        property_list::from_slice::<Vec<u8>>(&data),
        Ok(vec![1,2,3,4,5])
    );
}

#[test]
fn test_decode_integer_list_as_value() {
    let data = read_integer_list_plist();
    let expected = Value::Array((1 ..= 5).map(Value::from).collect());
    assert_eq!(property_list::decode(&data), Ok(expected.clone()));
    assert_eq!(property_list::encode(&expected), Ok(data));
}

#[test]
fn test_deserialize_integer_list_type_mismatch() {
    let data = read_integer_list_plist();
    assert!(property_list::from_slice::<Vec<String>>(&data).is_err());
}

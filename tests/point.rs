use property_list::{Dictionary, Value};
use serde::{Deserialize, Serialize};

use std::fs;
use std::io::Read;
use std::path::PathBuf;

#[derive(Eq, PartialEq, Serialize, Deserialize, Debug)]
struct Point {
    x: u64,
    y: u64,
}

fn read_point_plist() -> Vec<u8> {
    let mut plist_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    plist_path.push("tests/point.plist");

    let mut file = fs::File::open(plist_path).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

#[test]
fn test_deserialize_point() {
    let data = read_point_plist();
    assert_eq!(
        property_list::from_slice::<Point>(&data),
        Ok(Point {
            x: 1,
            y: 20
        })
    );
}

#[test]
fn test_decode_point_as_value() {
    let data = read_point_plist();
    assert_eq!(
        property_list::decode(&data),
        Ok(Value::Dictionary({
            let mut map = Dictionary::new();
            map.insert(String::from("x"), Value::Integer(1));
            map.insert(String::from("y"), Value::Integer(20));
            map
        }))
    );
}

#[test]
fn test_serialize_point_matches_fixture() {
    let data = read_point_plist();
    assert_eq!(
        property_list::to_vec(&Point { x: 1, y: 20 }),
        Ok(data)
    );
}

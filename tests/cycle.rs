use std::fs;
use std::io::Read;
use std::path::PathBuf;

#[test]
fn test_decode_cycle() {
    let _ = pretty_env_logger::try_init();
    let mut plist_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    plist_path.push("tests/cycle.plist");

    let mut file = fs::File::open(plist_path).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();

    assert_eq!(
        property_list::decode(&data),
        Err(property_list::Error::CycleDetected { object: 0 })
    );
    assert_eq!(
        property_list::from_slice::<Vec<u8>>(&data),
        Err(property_list::Error::CycleDetected { object: 0 })
    );
}

#![cfg(feature = "serde")]

use bellow::Bitmap;

fn sample() -> Bitmap {
    let mut bitmap = Bitmap::from_iter((0..1000).map(|i| i * 31));
    bitmap.insert_range(0x2_0000..0x2_4000);
    bitmap.optimize();
    bitmap
}

#[test]
fn bincode_roundtrip() {
    let bitmap = sample();
    let bytes = bincode::serialize(&bitmap).unwrap();
    let reread: Bitmap = bincode::deserialize(&bytes).unwrap();
    assert_eq!(reread, bitmap);
}

#[test]
fn json_roundtrip() {
    let bitmap = sample();
    let json = serde_json::to_string(&bitmap).unwrap();
    let reread: Bitmap = serde_json::from_str(&json).unwrap();
    assert_eq!(reread, bitmap);
}

#[test]
fn empty_roundtrip() {
    let bitmap = Bitmap::new();
    let bytes = bincode::serialize(&bitmap).unwrap();
    let reread: Bitmap = bincode::deserialize(&bytes).unwrap();
    assert_eq!(reread, bitmap);
}

#[test]
fn rejects_malformed_payload() {
    let result: Result<Bitmap, _> = bincode::deserialize(&[7u8, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3]);
    assert!(result.is_err());
}

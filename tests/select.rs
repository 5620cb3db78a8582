use bellow::Bitmap;
use proptest::collection::btree_set;
use proptest::prelude::*;

#[test]
fn select() {
    let bitmap = Bitmap::from_sorted_iter((0..2000).map(|x| x * 2)).unwrap();

    assert_eq!(bitmap.select(0), Some(0));
    assert_eq!(bitmap.select(1999), Some(3998));
    assert_eq!(bitmap.select(2000), None);
}

#[test]
fn select_across_containers() {
    let mut bitmap = Bitmap::from_sorted_iter(0..2000).unwrap();
    bitmap.insert_range(200_000..210_000);

    assert_eq!(bitmap.select(0), Some(0));
    assert_eq!(bitmap.select(1999), Some(1999));
    assert_eq!(bitmap.select(2000), Some(200_000));
    assert_eq!(bitmap.select(11_999), Some(209_999));
    assert_eq!(bitmap.select(12_000), None);
}

#[test]
fn select_run_container() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(100..200);
    bitmap.insert_range(500..600);
    bitmap.optimize();

    assert_eq!(bitmap.select(0), Some(100));
    assert_eq!(bitmap.select(99), Some(199));
    assert_eq!(bitmap.select(100), Some(500));
    assert_eq!(bitmap.select(199), Some(599));
    assert_eq!(bitmap.select(200), None);
}

#[test]
fn select_empty() {
    let bitmap = Bitmap::new();
    assert_eq!(bitmap.select(0), None);
    assert_eq!(bitmap.select(100), None);
}

proptest! {
    #[test]
    fn proptest_select(values in btree_set(any::<u32>(), ..=1000)) {
        let bitmap = Bitmap::from_sorted_iter(values.iter().copied()).unwrap();
        for (n, value) in values.iter().enumerate() {
            prop_assert_eq!(bitmap.select(n as u32), Some(*value));
        }
        prop_assert_eq!(bitmap.select(values.len() as u32), None);
    }

    #[test]
    fn select_inverts_rank(values in btree_set(any::<u32>(), 1..=1000)) {
        let bitmap = Bitmap::from_sorted_iter(values.iter().copied()).unwrap();
        for value in values {
            let rank = bitmap.rank(value);
            prop_assert_eq!(bitmap.select(rank as u32 - 1), Some(value));
        }
    }
}

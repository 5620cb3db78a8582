use bellow::Bitmap;

#[test]
fn smoke() {
    let mut bitmap = Bitmap::new();
    assert_eq!(bitmap.len(), 0);
    assert_eq!(bitmap.is_empty(), true);
    bitmap.remove(0);
    assert_eq!(bitmap.len(), 0);
    assert_eq!(bitmap.is_empty(), true);
    bitmap.insert(1);
    assert_eq!(bitmap.contains(1), true);
    assert_eq!(bitmap.len(), 1);
    assert_eq!(bitmap.is_empty(), false);
    bitmap.insert(u32::MAX - 2);
    assert_eq!(bitmap.contains(u32::MAX - 2), true);
    assert_eq!(bitmap.len(), 2);
    bitmap.insert(u32::MAX);
    assert_eq!(bitmap.contains(u32::MAX), true);
    assert_eq!(bitmap.len(), 3);
    bitmap.insert(2);
    assert_eq!(bitmap.contains(2), true);
    assert_eq!(bitmap.len(), 4);
    bitmap.remove(2);
    assert_eq!(bitmap.contains(2), false);
    assert_eq!(bitmap.len(), 3);
    assert_eq!(bitmap.contains(0), false);
    assert_eq!(bitmap.contains(1), true);
    assert_eq!(bitmap.contains(100), false);
    assert_eq!(bitmap.contains(u32::MAX - 2), true);
    assert_eq!(bitmap.contains(u32::MAX - 1), false);
    assert_eq!(bitmap.contains(u32::MAX), true);
}

#[test]
fn to_bitset_container() {
    let bitmap: Bitmap = (0..5000).collect();
    assert_eq!(bitmap.len(), 5000);
    for i in 1..5000 {
        assert!(bitmap.contains(i));
    }
    assert!(!bitmap.contains(5001));
}

#[test]
fn to_array_container() {
    let mut bitmap: Bitmap = (0..5000).collect();
    for i in 3000..5000 {
        bitmap.remove(i);
    }
    assert_eq!(bitmap.len(), 3000);
    for i in 0..3000 {
        assert!(bitmap.contains(i));
    }
    for i in 3000..5000 {
        assert!(!bitmap.contains(i));
    }
}

#[test]
fn every_third_value_then_strike_every_fifth() {
    let mut bitmap = Bitmap::new();
    let added: Vec<u32> = (0..1 << 16).step_by(3).collect();
    bitmap.extend(added.iter());
    // ceil(65536 / 3)
    assert_eq!(bitmap.len(), 21846);
    assert_eq!(added.len() as u64, bitmap.len());

    for value in added.iter().step_by(5) {
        assert!(bitmap.remove(*value));
    }
    let struck = (added.len() + 4) / 5;
    assert_eq!(bitmap.len(), (added.len() - struck) as u64);
    assert_eq!(bitmap.len(), 21846 - 4370);
}

#[test]
fn from_range_step() {
    let bitmap = Bitmap::from_range_step(0..1_000_000, 20);
    assert_eq!(bitmap.len(), 50_000);
    assert_eq!(bitmap.min(), Some(0));
    assert_eq!(bitmap.max(), Some(999_980));
    assert_eq!(bitmap.select(10), Some(200));
    assert_eq!(bitmap.rank(200), 11);
}

#[test]
fn full_bitmap() {
    let bitmap = Bitmap::full();
    assert!(bitmap.is_full());
    assert_eq!(bitmap.len(), 1 << 32);
    assert!(bitmap.contains(0));
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.rank(u32::MAX), 1 << 32);

    let mut bitmap = bitmap;
    bitmap.remove(77);
    assert!(!bitmap.is_full());
    assert_eq!(bitmap.len(), (1 << 32) - 1);
}

#[test]
fn full_single_container() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(0..=0xFFFF);
    assert_eq!(bitmap.len(), 65536);
    assert!(bitmap.contains_range(0..=0xFFFF));
    assert!(!bitmap.contains(0x1_0000));

    bitmap.optimize();
    assert_eq!(bitmap.len(), 65536);
    assert!(bitmap.contains_range(0..=0xFFFF));
}

#[test]
fn statistics_reports_composition() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(0..700_000);
    bitmap.optimize();
    let statistics = bitmap.statistics();
    assert_eq!(statistics.cardinality, 700_000);
    assert_eq!(statistics.n_containers, 11);
    assert_eq!(statistics.n_run_containers, 11);
}

#[test]
fn is_empty_is_full_boundaries() {
    let mut bitmap = Bitmap::new();
    assert!(bitmap.is_empty());
    assert!(!bitmap.is_full());

    bitmap.insert(0);
    assert!(!bitmap.is_empty());

    bitmap.remove(0);
    assert!(bitmap.is_empty());
}

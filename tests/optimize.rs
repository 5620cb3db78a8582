use bellow::Bitmap;

#[test]
fn dense_range_scenario() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(100..1000);
    assert_eq!(bitmap.len(), 900);
    assert!(bitmap.contains(500));

    let flat_size = bitmap.serialized_size();
    assert!(bitmap.optimize());
    assert!(bitmap.serialized_size() < flat_size);

    assert_eq!(bitmap.len(), 900);
    assert!(bitmap.contains(500));
    assert!(!bitmap.contains(1000));
}

#[test]
fn scattered_values_stay_flat() {
    let bitmap = Bitmap::from_range_step(0..120_000, 2);
    let mut optimized = bitmap.clone();
    assert!(!optimized.optimize());
    assert_eq!(optimized, bitmap);
}

#[test]
fn optimize_then_unoptimize_preserves_values() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(0..200_000);
    bitmap.insert_range(500_000..500_100);
    bitmap.extend((0..100u32).map(|i| 1 << 24 | i * 1000));

    let reference = bitmap.clone();

    assert!(bitmap.optimize());
    assert_eq!(bitmap, reference);
    assert_eq!(bitmap.len(), reference.len());

    assert!(bitmap.remove_run_compression());
    assert_eq!(bitmap, reference);

    // A second pass has nothing left to undo.
    assert!(!bitmap.remove_run_compression());
}

#[test]
fn optimize_is_idempotent() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(10..100_000);

    assert!(bitmap.optimize());
    let serialized = bitmap.serialized_size();
    assert!(bitmap.optimize());
    assert_eq!(bitmap.serialized_size(), serialized);
}

#[test]
fn mutated_runs_stay_runs_until_flattened() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(0..50_000);
    bitmap.optimize();

    // Point mutations on a run container keep the compression.
    bitmap.remove(25_000);
    bitmap.insert(25_000);
    bitmap.insert(60_000);
    assert_eq!(bitmap.len(), 50_001);

    let mut statistics = bitmap.statistics();
    assert_eq!(statistics.n_run_containers, 1);

    bitmap.remove_run_compression();
    statistics = bitmap.statistics();
    assert_eq!(statistics.n_run_containers, 0);
    assert_eq!(bitmap.len(), 50_001);
}

#[test]
fn shrink_to_fit_reports_freed_bytes() {
    let mut bitmap = Bitmap::new();
    for i in 0..3000 {
        bitmap.insert(i * 2);
    }

    let before = bitmap.clone();
    let freed = bitmap.shrink_to_fit();
    assert_eq!(bitmap, before);
    // The array container shed its spare growth capacity.
    assert!(freed > 0);

    // A second shrink has nothing left to free.
    assert_eq!(bitmap.shrink_to_fit(), 0);
}

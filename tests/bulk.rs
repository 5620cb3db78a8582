use bellow::{Bitmap, BulkContext};

#[test]
fn sorted_stream_insertion() {
    let mut bitmap = Bitmap::new();
    let mut context = BulkContext::default();

    for value in (0..300_000u32).step_by(3) {
        assert!(bitmap.insert_bulk(&mut context, value));
    }
    assert_eq!(bitmap.len(), 100_000);
    assert_eq!(bitmap, Bitmap::from_range_step(0..300_000, 3));

    // Re-inserting through the same context reports the duplicates.
    for value in (0..300_000u32).step_by(3) {
        assert!(!bitmap.insert_bulk(&mut context, value));
    }
    assert_eq!(bitmap.len(), 100_000);
}

#[test]
fn unsorted_stream_insertion() {
    let mut bitmap = Bitmap::new();
    let mut context = BulkContext::default();

    // Jumping between containers only costs a lookup per jump.
    for i in 0..10_000u32 {
        bitmap.insert_bulk(&mut context, i);
        bitmap.insert_bulk(&mut context, i + 0x10_0000);
    }
    assert_eq!(bitmap.len(), 20_000);
}

#[test]
fn contains_bulk_agrees_with_contains() {
    let bitmap = Bitmap::from_iter((0..50_000u32).map(|i| i * 7));
    let mut context = BulkContext::default();

    for probe in 0..100_000u32 {
        assert_eq!(bitmap.contains_bulk(&mut context, probe), bitmap.contains(probe));
    }
}

#[test]
fn remove_bulk_sorted_stream() {
    let mut bitmap = Bitmap::from_iter(0..100_000);
    let mut context = BulkContext::default();

    for value in (0..100_000u32).step_by(2) {
        assert!(bitmap.remove_bulk(&mut context, value));
    }
    assert_eq!(bitmap.len(), 50_000);
    assert!(!bitmap.remove_bulk(&mut context, 0));
    assert!(bitmap.remove_bulk(&mut context, 1));
}

#[test]
fn remove_bulk_emptying_a_container() {
    let mut bitmap = Bitmap::from_iter([5u32, 0x1_0005, 0x2_0005]);
    let mut context = BulkContext::default();

    assert!(bitmap.remove_bulk(&mut context, 0x1_0005));
    // The container at the cached position is gone; the context recovers.
    assert!(bitmap.remove_bulk(&mut context, 0x2_0005));
    assert!(bitmap.remove_bulk(&mut context, 5));
    assert!(bitmap.is_empty());
}

#[test]
fn bulk_context_tracks_container_churn() {
    let mut bitmap = Bitmap::new();
    let mut context = BulkContext::default();

    bitmap.insert_bulk(&mut context, 0x5_0000);
    // Inserting a smaller key shifts the cached container's position.
    bitmap.insert_bulk(&mut context, 0x1_0000);
    assert!(bitmap.contains_bulk(&mut context, 0x5_0000));
    assert!(bitmap.contains_bulk(&mut context, 0x1_0000));
    assert!(!bitmap.contains_bulk(&mut context, 0x3_0000));
    assert_eq!(bitmap.len(), 2);
}

#[test]
fn bulk_on_copy_on_write_clone() {
    let mut source = Bitmap::from_iter(0..1000);
    source.set_copy_on_write(true);
    let mut copy = source.clone();

    let mut context = BulkContext::default();
    for value in 1000..2000u32 {
        copy.insert_bulk(&mut context, value);
    }
    assert_eq!(copy.len(), 2000);
    assert_eq!(source.len(), 1000);
}

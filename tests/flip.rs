use bellow::Bitmap;

#[test]
fn flip_within_one_container() {
    let bitmap = Bitmap::from_iter([1, 3]);
    let flipped = bitmap.flip(0..5);
    assert_eq!(flipped, Bitmap::from_iter([0, 2, 4]));
    assert_eq!(flipped.flip(0..5), bitmap);
}

#[test]
fn flip_empty_range_is_identity() {
    let bitmap = Bitmap::from_iter([1, 3]);
    #[allow(clippy::reversed_empty_ranges)]
    let unchanged = bitmap.flip(5..5);
    assert_eq!(unchanged, bitmap);
}

#[test]
fn flip_spanning_two_containers() {
    let mut bitmap = Bitmap::new();
    bitmap.insert(65_535);
    bitmap.insert(65_536);

    let flipped = bitmap.flip(65_534..=65_537);
    assert_eq!(flipped, Bitmap::from_iter([65_534, 65_537]));
}

#[test]
fn flip_spanning_many_containers() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(0x1_0000..0x3_0000);

    // The flipped span covers an absent container on both sides and the
    // fully set span in the middle.
    let flipped = bitmap.flip(0x0_8000..0x4_8000);
    assert_eq!(flipped.len(), 0x8000 + 0x1_0000 + 0x8000);
    assert!(flipped.contains(0x0_8000));
    assert!(flipped.contains(0x0_FFFF));
    assert!(!flipped.contains(0x1_0000));
    assert!(!flipped.contains(0x2_FFFF));
    assert!(flipped.contains(0x3_0000));
    assert!(flipped.contains(0x4_7FFF));
    assert!(!flipped.contains(0x4_8000));
}

#[test]
fn flip_whole_domain() {
    let empty = Bitmap::new();
    let full = empty.flip(..);
    assert!(full.is_full());
    assert_eq!(full.len(), 1 << 32);

    let empty_again = full.flip(..);
    assert!(empty_again.is_empty());
}

#[test]
fn flip_on_run_containers() {
    let mut bitmap = Bitmap::new();
    bitmap.insert_range(100..=199);
    bitmap.insert_range(300..=399);
    bitmap.optimize();

    let flipped = bitmap.flip(0..=499);
    assert_eq!(flipped.len(), 500 - 200);
    assert!(flipped.contains(0));
    assert!(flipped.contains(99));
    assert!(!flipped.contains(100));
    assert!(flipped.contains(200));
    assert!(flipped.contains(299));
    assert!(!flipped.contains(300));
    assert!(flipped.contains(400));
    assert!(flipped.contains(499));
    assert!(!flipped.contains(500));

    assert_eq!(flipped.flip(0..=499), bitmap);
}

#[test]
fn flip_inplace_mutates() {
    let mut bitmap = Bitmap::from_iter(0..10);
    bitmap.flip_inplace(5..15);
    assert_eq!(bitmap, Bitmap::from_iter((0..5).chain(10..15)));
}

#[test]
fn flip_at_domain_upper_bound() {
    let bitmap = Bitmap::new();
    let flipped = bitmap.flip(u32::MAX..=u32::MAX);
    assert_eq!(flipped, Bitmap::from_iter([u32::MAX]));
    assert!(flipped.flip(u32::MAX..=u32::MAX).is_empty());
}

#[test]
fn flip_respects_copy_on_write() {
    let mut bitmap = Bitmap::from_iter(0..100);
    bitmap.set_copy_on_write(true);

    let flipped = bitmap.flip(50..150);
    assert_eq!(bitmap.len(), 100);
    assert_eq!(flipped.len(), 100);
    assert!(flipped.contains(149));
    assert!(!flipped.contains(50));
    assert!(bitmap.contains(50));
}

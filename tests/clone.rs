use bellow::Bitmap;

#[test]
fn deep_clone_by_default() {
    let mut original = Bitmap::from_iter(0..5000);
    let clone = original.clone();

    original.insert(10_000);
    assert_eq!(clone.len(), 5000);
    assert!(!clone.contains(10_000));
}

#[test]
fn copy_on_write_source_is_untouched_by_copy_mutation() {
    let mut original = Bitmap::from_iter((0..10_000).map(|i| i * 3));
    original.set_copy_on_write(true);

    let mut copy = original.clone();
    assert_eq!(copy, original);
    assert!(copy.copy_on_write());

    copy.insert(1);
    copy.remove(0);
    copy.insert_range(1 << 20..(1 << 20) + 10);

    assert_eq!(original.len(), 10_000);
    assert!(original.contains(0));
    assert!(!original.contains(1));
    assert!(!original.contains(1 << 20));

    assert_eq!(copy.len(), 10_000 + 10);
    assert!(copy.contains(1));
    assert!(!copy.contains(0));
}

#[test]
fn copy_on_write_copy_survives_source_mutation() {
    let mut original = Bitmap::from_iter(0..1000);
    original.set_copy_on_write(true);

    let copy = original.clone();
    original.remove_range(0..500);

    assert_eq!(copy.len(), 1000);
    assert_eq!(original.len(), 500);
}

#[test]
fn copy_on_write_chains() {
    let mut first = Bitmap::from_iter(0..100);
    first.set_copy_on_write(true);

    let second = first.clone();
    let mut third = second.clone();
    third.insert(1_000_000);

    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 100);
    assert_eq!(third.len(), 101);
}

#[test]
fn in_place_ops_on_shared_containers() {
    let mut a = Bitmap::from_iter(0..10_000);
    a.set_copy_on_write(true);
    let b = a.clone();

    let mut and = a.clone();
    and &= &Bitmap::from_iter(5_000..20_000);
    assert_eq!(and.len(), 5_000);

    let mut or = a.clone();
    or |= &Bitmap::from_iter(10_000..10_500);
    assert_eq!(or.len(), 10_500);

    // The shared operands never changed.
    assert_eq!(a, b);
    assert_eq!(a.len(), 10_000);
}

#[test]
fn thawed_containers_do_not_reattach() {
    let mut original = Bitmap::from_iter(0..100);
    original.set_copy_on_write(true);
    let mut copy = original.clone();

    copy.insert(200);
    original.insert(300);

    assert!(copy.contains(200));
    assert!(!copy.contains(300));
    assert!(original.contains(300));
    assert!(!original.contains(200));
}

#[test]
fn clone_from_matches_clone() {
    let mut original = Bitmap::from_iter(0..1000);
    original.set_copy_on_write(true);

    let mut target = Bitmap::from_iter([1, 2, 3]);
    target.clone_from(&original);
    assert_eq!(target, original);
    assert!(target.copy_on_write());
}

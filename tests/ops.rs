use bellow::Bitmap;

#[test]
fn simple_sets() {
    let a = Bitmap::from_iter([1, 2, 3, 5, 6]);
    let b = Bitmap::from_iter([2, 3, 4]);

    assert_eq!(&a | &b, Bitmap::from_iter([1, 2, 3, 4, 5, 6]));
    assert_eq!(&a & &b, Bitmap::from_iter([2, 3]));
    assert_eq!(&a - &b, Bitmap::from_iter([1, 5, 6]));
    assert_eq!(&a ^ &b, Bitmap::from_iter([1, 4, 5, 6]));
}

#[test]
fn empty_on_either_side() {
    let empty = Bitmap::new();
    let some = Bitmap::from_iter([0, 70_000, u32::MAX]);

    assert_eq!(&empty | &some, some);
    assert_eq!(&some | &empty, some);
    assert!((&empty & &some).is_empty());
    assert!((&some & &empty).is_empty());
    assert_eq!(&some - &empty, some);
    assert!((&empty - &some).is_empty());
    assert_eq!(&empty ^ &some, some);
    assert_eq!(&some ^ &empty, some);
    assert!((&empty | &empty).is_empty());
}

#[test]
fn single_values_at_domain_bounds() {
    let low = Bitmap::from_iter([0u32]);
    let high = Bitmap::from_iter([u32::MAX]);

    assert_eq!((&low | &high).len(), 2);
    assert!((&low & &high).is_empty());
    assert_eq!(&low ^ &high, &low | &high);
    assert_eq!((&low | &high).min(), Some(0));
    assert_eq!((&low | &high).max(), Some(u32::MAX));
}

/// One bitmap per container shape, each with values only that shape can
/// legitimately hold at the top level.
fn shapes() -> [Bitmap; 3] {
    // Sparse in an array container.
    let array = Bitmap::from_range_step(0..30_000, 9);

    // Dense enough that the container must be a bitset.
    let bitset = Bitmap::from_range_step(0..40_000, 2);

    // A few long runs.
    let mut run = Bitmap::new();
    run.insert_range(1_000..9_000);
    run.insert_range(20_000..21_000);
    assert!(run.optimize());

    [array, bitset, run]
}

#[test]
fn mixed_representations_agree() {
    use std::collections::BTreeSet;

    let operands = shapes();
    let references: Vec<BTreeSet<u32>> =
        operands.iter().map(|bitmap| bitmap.iter().collect()).collect();

    for (lhs, ls) in operands.iter().zip(&references) {
        for (rhs, rs) in operands.iter().zip(&references) {
            let union = lhs | rhs;
            let intersection = lhs & rhs;
            let difference = lhs - rhs;
            let symmetric = lhs ^ rhs;

            assert!(union.iter().eq((ls | rs).into_iter()));
            assert!(intersection.iter().eq((ls & rs).into_iter()));
            assert!(difference.iter().eq((ls - rs).into_iter()));
            assert!(symmetric.iter().eq((ls ^ rs).into_iter()));

            let mut inplace = lhs.clone();
            inplace |= rhs;
            assert_eq!(inplace, union);
            let mut inplace = lhs.clone();
            inplace &= rhs;
            assert_eq!(inplace, intersection);
            let mut inplace = lhs.clone();
            inplace -= rhs;
            assert_eq!(inplace, difference);
            let mut inplace = lhs.clone();
            inplace ^= rhs;
            assert_eq!(inplace, symmetric);

            assert_eq!(lhs.intersection_len(rhs), intersection.len());
            assert_eq!(lhs.union_len(rhs), union.len());
            assert_eq!(lhs.difference_len(rhs), difference.len());
            assert_eq!(lhs.symmetric_difference_len(rhs), symmetric.len());
            assert_eq!(lhs.is_disjoint(rhs), intersection.is_empty());
            assert!(intersection.is_subset(lhs));
            assert!(lhs.is_subset(&union));
        }
    }
}

#[test]
fn representations_do_not_affect_equality() {
    // The same small values as an array and as runs.
    let mut runs = Bitmap::new();
    runs.insert_range(100..=300);
    runs.optimize();
    let array: Bitmap = (100..=300).collect();
    assert_eq!(runs, array);
    assert_eq!(array, runs);

    // The same dense values as a bitset and as a run.
    let mut flat = Bitmap::new();
    flat.insert_range(0..10_000);
    let mut compressed = flat.clone();
    compressed.optimize();
    assert_eq!(flat, compressed);

    compressed.remove(5_000);
    assert_ne!(flat, compressed);
}

#[test]
fn operations_across_many_containers() {
    let a = Bitmap::from_range_step(0..1_000_000, 7);
    let b = Bitmap::from_range_step(0..1_000_000, 11);

    let both = &a & &b;
    assert_eq!(both.len(), 1_000_000 / 77 + 1);
    assert!(both.contains(77 * 100));

    let either = &a | &b;
    assert_eq!(either.len(), a.len() + b.len() - both.len());

    let only_a = &a - &b;
    assert_eq!(only_a.len(), a.len() - both.len());
    assert!(only_a.is_disjoint(&b));
}

#[test]
fn jaccard_index() {
    let a: Bitmap = (0..8).collect();
    let b: Bitmap = (4..12).collect();
    assert_eq!(a.jaccard_index(&b), 4.0 / 12.0);
    assert_eq!(a.jaccard_index(&a), 1.0);
    assert!(Bitmap::new().jaccard_index(&Bitmap::new()).is_nan());
}

#[test]
fn intersection_len_without_allocating() {
    let a = Bitmap::from_iter((0..10_000).map(|i| i * 2));
    let b = Bitmap::from_iter((0..10_000).map(|i| i * 3));
    assert_eq!(a.intersection_len(&b), (&a & &b).len());
    assert!(!a.is_disjoint(&b));
    assert!(a.is_disjoint(&Bitmap::from_iter([1, 99_999])));
}

#[test]
fn in_place_ops_consume_owned_operands() {
    let a = Bitmap::from_iter(0..1000);
    let b = Bitmap::from_iter(500..1500);

    assert_eq!(a.clone() | b.clone(), Bitmap::from_iter(0..1500));
    assert_eq!(a.clone() & b.clone(), Bitmap::from_iter(500..1000));
    assert_eq!(a.clone() - b.clone(), Bitmap::from_iter(0..500));
    let mut expected: Bitmap = (0..500).collect();
    expected.insert_range(1000..1500);
    assert_eq!(a ^ b, expected);
}

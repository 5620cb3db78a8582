use core::cmp::Ordering;
use core::iter::Peekable;
use core::slice;
use std::borrow::Cow;
use std::collections::BinaryHeap;

use crate::bitmap::container::Container;
use crate::bitmap::store::{BitsetStore, Store};
use crate::{Bitmap, MultiOps};

impl<I> MultiOps<Bitmap> for I
where
    I: IntoIterator<Item = Bitmap>,
{
    type Output = Bitmap;

    fn union(self) -> Self::Output {
        let bitmaps: Vec<Bitmap> = self.into_iter().collect();
        grouped_union(bitmaps.iter())
    }

    fn intersection(self) -> Self::Output {
        fold_intersection(self.into_iter().collect())
    }

    fn difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        match iter.next() {
            Some(mut lhs) => {
                for rhs in iter {
                    if lhs.is_empty() {
                        return lhs;
                    }
                    lhs -= rhs;
                }
                lhs
            }
            None => Bitmap::new(),
        }
    }

    fn symmetric_difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        match iter.next() {
            Some(mut lhs) => {
                for rhs in iter {
                    lhs ^= rhs;
                }
                lhs
            }
            None => Bitmap::new(),
        }
    }
}

impl<'a, I> MultiOps<&'a Bitmap> for I
where
    I: IntoIterator<Item = &'a Bitmap>,
{
    type Output = Bitmap;

    fn union(self) -> Self::Output {
        grouped_union(self.into_iter())
    }

    fn intersection(self) -> Self::Output {
        fold_intersection(self.into_iter().cloned().collect())
    }

    fn difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        match iter.next() {
            Some(first) => {
                let mut lhs = first.clone();
                for rhs in iter {
                    if lhs.is_empty() {
                        return lhs;
                    }
                    lhs -= rhs;
                }
                lhs
            }
            None => Bitmap::new(),
        }
    }

    fn symmetric_difference(self) -> Self::Output {
        let mut iter = self.into_iter();
        match iter.next() {
            Some(first) => {
                let mut lhs = first.clone();
                for rhs in iter {
                    lhs ^= rhs;
                }
                lhs
            }
            None => Bitmap::new(),
        }
    }
}

/// Unions any number of bitmaps in one pass: the containers of every
/// operand are grouped by key, and each group of two or more is merged
/// through a bitset accumulator instead of pairwise.
fn grouped_union<'a>(bitmaps: impl Iterator<Item = &'a Bitmap>) -> Bitmap {
    let mut cursors: Vec<Peekable<slice::Iter<'a, Container>>> = Vec::new();
    let mut copy_on_write = false;
    for (i, bitmap) in bitmaps.enumerate() {
        copy_on_write = (i == 0 || copy_on_write) && bitmap.copy_on_write;
        cursors.push(bitmap.containers.iter().peekable());
    }

    let mut containers = Vec::new();
    let mut group: Vec<&Container> = Vec::new();

    loop {
        let key = match cursors.iter_mut().filter_map(|it| it.peek().map(|c| c.key)).min() {
            Some(key) => key,
            None => break,
        };

        group.clear();
        for cursor in &mut cursors {
            if cursor.peek().map(|c| c.key) == Some(key) {
                group.push(cursor.next().unwrap());
            }
        }

        let container = match group.as_slice() {
            [single] => (*single).clone(),
            _ => {
                let mut acc = BitsetStore::new();
                for container in &group {
                    match container.store() {
                        Store::Array(vec) => acc |= vec,
                        Store::Bitset(bits) => acc |= bits,
                        Store::Run(runs) => {
                            for iv in runs.as_slice() {
                                acc.insert_range(iv.start..=iv.end);
                            }
                        }
                    }
                }
                let mut container = Container::from_store(key, Store::Bitset(acc));
                container.ensure_optimal_store();
                container
            }
        };
        containers.push(container);
    }

    Bitmap { containers, copy_on_write }
}

/// Intersects smallest-first so the working set shrinks as fast as possible.
fn fold_intersection(mut bitmaps: Vec<Bitmap>) -> Bitmap {
    bitmaps.sort_unstable_by_key(|bitmap| bitmap.containers.len());
    let mut iter = bitmaps.into_iter();
    match iter.next() {
        Some(mut lhs) => {
            for rhs in iter {
                if lhs.is_empty() {
                    return lhs;
                }
                lhs &= rhs;
            }
            lhs
        }
        None => Bitmap::new(),
    }
}

struct HeapedBitmap<'a> {
    size: usize,
    bitmap: Cow<'a, Bitmap>,
}

impl<'a> HeapedBitmap<'a> {
    fn new(bitmap: Cow<'a, Bitmap>) -> HeapedBitmap<'a> {
        HeapedBitmap { size: bitmap.serialized_size(), bitmap }
    }
}

impl PartialEq for HeapedBitmap<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
    }
}

impl Eq for HeapedBitmap<'_> {}

impl PartialOrd for HeapedBitmap<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapedBitmap<'_> {
    // Reversed, so the max-heap pops the smallest bitmap first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.size.cmp(&self.size)
    }
}

impl Bitmap {
    /// Unions many bitmaps by repeatedly merging the two smallest operands,
    /// keeping every intermediate result as small as possible. Worth it for
    /// long sequences of bitmaps of very unequal sizes; for the common case
    /// prefer [`MultiOps::union`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let a = Bitmap::from_iter(0..100);
    /// let b = Bitmap::from_iter(50..200);
    /// let c = Bitmap::from_iter([100_000]);
    ///
    /// assert_eq!(Bitmap::union_heap([&a, &b, &c]).len(), 201);
    /// ```
    pub fn union_heap<'a, I>(bitmaps: I) -> Bitmap
    where
        I: IntoIterator<Item = &'a Bitmap>,
    {
        let mut heap: BinaryHeap<HeapedBitmap> =
            bitmaps.into_iter().map(|b| HeapedBitmap::new(Cow::Borrowed(b))).collect();

        while heap.len() > 1 {
            let first = heap.pop().unwrap().bitmap;
            let second = heap.pop().unwrap().bitmap;
            let merged = match (first, second) {
                (Cow::Owned(lhs), rhs) => lhs | rhs.as_ref(),
                (lhs, Cow::Owned(rhs)) => rhs | lhs.as_ref(),
                (Cow::Borrowed(lhs), Cow::Borrowed(rhs)) => lhs | rhs,
            };
            heap.push(HeapedBitmap::new(Cow::Owned(merged)));
        }

        heap.pop().map_or_else(Bitmap::new, |entry| entry.bitmap.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmaps() -> [Bitmap; 3] {
        [
            Bitmap::from_iter((0..1000).map(|i| i * 2)),
            Bitmap::from_iter(500..600),
            Bitmap::from_iter([0, 70_000, u32::MAX]),
        ]
    }

    #[test]
    fn union_matches_pairwise() {
        let [a, b, c] = bitmaps();
        let pairwise = &(&a | &b) | &c;
        assert_eq!([&a, &b, &c].union(), pairwise);
        assert_eq!([a.clone(), b.clone(), c.clone()].union(), pairwise);
        assert_eq!(Bitmap::union_heap([&a, &b, &c]), pairwise);
    }

    #[test]
    fn intersection_matches_pairwise() {
        let [a, b, c] = bitmaps();
        let pairwise = &(&a & &b) & &c;
        assert_eq!([&a, &b, &c].intersection(), pairwise);
        assert_eq!([a, b, c].intersection(), pairwise);
    }

    #[test]
    fn difference_and_symmetric_difference_match_pairwise() {
        let [a, b, c] = bitmaps();
        assert_eq!([&a, &b, &c].difference(), &(&a - &b) - &c);
        assert_eq!([&a, &b, &c].symmetric_difference(), &(&a ^ &b) ^ &c);
    }

    #[test]
    fn empty_inputs() {
        let none: [&Bitmap; 0] = [];
        assert!(none.union().is_empty());
        assert!(none.intersection().is_empty());
        assert!(none.difference().is_empty());
        assert!(none.symmetric_difference().is_empty());
        assert!(Bitmap::union_heap(none).is_empty());
    }

    #[test]
    fn union_groups_many_ways() {
        // 30 bitmaps hitting the same container plus scattered outliers.
        let bitmaps: Vec<Bitmap> =
            (0..30u32).map(|i| Bitmap::from_iter([i, i + 100_000, i * 70_000])).collect();
        let refs: Vec<&Bitmap> = bitmaps.iter().collect();

        let mut expected = Bitmap::new();
        for b in &bitmaps {
            expected |= b;
        }

        assert_eq!(refs.clone().union(), expected);
        assert_eq!(Bitmap::union_heap(refs), expected);
    }
}

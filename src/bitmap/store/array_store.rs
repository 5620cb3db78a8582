use core::cmp::Ordering;
use core::fmt::{Display, Formatter};
use core::ops::{BitAnd, BitAndAssign, BitOr, BitXor, RangeInclusive, Sub, SubAssign};

use super::bitset_store::{bit, key, BitsetStore, BITSET_WORDS};
use super::run_store::Interval;

pub(crate) const ARRAY_ELEMENT_BYTES: usize = 2;

/// One side must be this many times larger than the other before an
/// intersection gallops through the larger side instead of merging.
const GALLOP_RATIO: usize = 64;

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct ArrayStore {
    vec: Vec<u16>,
}

impl ArrayStore {
    pub fn new() -> ArrayStore {
        ArrayStore { vec: vec![] }
    }

    pub fn serialized_byte_size(cardinality: u64) -> usize {
        cardinality as usize * ARRAY_ELEMENT_BYTES
    }

    pub fn byte_size(&self) -> usize {
        Self::serialized_byte_size(self.len())
    }

    /// The number of values that fit without reallocating.
    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    ///
    /// Create a store from a vec the caller guarantees to be sorted and
    /// deduplicated. Favor `try_from` when the invariants should be checked.
    ///
    /// # Panics
    ///
    /// When debug_assertions are enabled and the above invariants are not met
    #[inline]
    pub fn from_vec_unchecked(vec: Vec<u16>) -> ArrayStore {
        if cfg!(debug_assertions) {
            vec.try_into().unwrap()
        } else {
            ArrayStore { vec }
        }
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        self.vec.binary_search(&index).map_err(|loc| self.vec.insert(loc, index)).is_err()
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let start = *range.start();
        let end = *range.end();

        let pos_start = self.vec.binary_search(&start).unwrap_or_else(|x| x);
        let pos_end = pos_start
            + match self.vec[pos_start..].binary_search(&end) {
                Ok(x) => x + 1,
                Err(x) => x,
            };

        // Everything between the two positions is inside the inserted range,
        // so it can be replaced wholesale.
        let dropped = self.vec.splice(pos_start..pos_end, start..=end);

        end as u64 - start as u64 + 1 - dropped.len() as u64
    }

    pub fn push(&mut self, index: u16) -> bool {
        if self.max().map_or(true, |max| max < index) {
            self.vec.push(index);
            true
        } else {
            false
        }
    }

    ///
    /// Pushes `index` at the end of the store.
    /// It is up to the caller to have validated index > self.max()
    ///
    /// # Panics
    ///
    /// If debug_assertions enabled and index is > self.max()
    pub(crate) fn push_unchecked(&mut self, index: u16) {
        if cfg!(debug_assertions) {
            if let Some(max) = self.max() {
                assert!(index > max, "store max >= index")
            }
        }
        self.vec.push(index);
    }

    pub fn remove(&mut self, index: u16) -> bool {
        self.vec.binary_search(&index).map(|loc| self.vec.remove(loc)).is_ok()
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        let start = *range.start();
        let end = *range.end();

        let pos_start = self.vec.binary_search(&start).unwrap_or_else(|x| x);
        let pos_end = pos_start
            + match self.vec[pos_start..].binary_search(&end) {
                Ok(x) => x + 1,
                Err(x) => x,
            };
        self.vec.drain(pos_start..pos_end);
        (pos_end - pos_start) as u64
    }

    pub fn remove_smallest(&mut self, n: u64) {
        self.vec.rotate_left(n as usize);
        self.vec.truncate(self.vec.len() - n as usize);
    }

    pub fn remove_biggest(&mut self, n: u64) {
        self.vec.truncate(self.vec.len() - n as usize);
    }

    pub fn contains(&self, index: u16) -> bool {
        self.vec.binary_search(&index).is_ok()
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        let start = *range.start();
        let end = *range.end();
        let range_count = usize::from(end - start) + 1;
        if self.vec.len() < range_count {
            return false;
        }
        let start_i = match self.vec.binary_search(&start) {
            Ok(i) => i,
            Err(_) => return false,
        };

        // The vec is sorted without duplicates, so the whole range is present
        // exactly when the element `range_count - 1` slots later is `end`.
        self.vec.get(start_i + range_count - 1) == Some(&end)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (mut i1, mut i2) = (self.vec.iter(), other.vec.iter());
        let (mut value1, mut value2) = (i1.next(), i2.next());
        loop {
            match value1.and_then(|v1| value2.map(|v2| v1.cmp(v2))) {
                None => return true,
                Some(Ordering::Equal) => return false,
                Some(Ordering::Less) => value1 = i1.next(),
                Some(Ordering::Greater) => value2 = i2.next(),
            }
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        let (mut i1, mut i2) = (self.iter(), other.iter());
        let (mut value1, mut value2) = (i1.next(), i2.next());
        loop {
            match (value1, value2) {
                (None, _) => return true,
                (Some(..), None) => return false,
                (Some(v1), Some(v2)) => match v1.cmp(v2) {
                    Ordering::Equal => {
                        value1 = i1.next();
                        value2 = i2.next();
                    }
                    Ordering::Less => return false,
                    Ordering::Greater => value2 = i2.next(),
                },
            }
        }
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        let mut count = 0;
        and_slices(self.as_slice(), other.as_slice(), |_| count += 1);
        count
    }

    pub fn intersection_len_interval(&self, interval: &Interval) -> u64 {
        if interval.is_full() {
            return self.len();
        }
        let start_i = self.vec.partition_point(|&v| v < interval.start);
        let end_i = self.vec.partition_point(|&v| v <= interval.end);
        end_i.saturating_sub(start_i) as u64
    }

    pub fn to_bitset_store(&self) -> BitsetStore {
        let mut bits = Box::new([0; BITSET_WORDS]);
        let len = self.len();

        for &index in self.iter() {
            bits[key(index)] |= 1 << bit(index);
        }
        BitsetStore::from_unchecked(len, bits)
    }

    pub fn len(&self) -> u64 {
        self.vec.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn min(&self) -> Option<u16> {
        self.vec.first().copied()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.vec.last().copied()
    }

    pub fn rank(&self, index: u16) -> u64 {
        match self.vec.binary_search(&index) {
            Ok(i) => i as u64 + 1,
            Err(i) => i as u64,
        }
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        self.vec.get(n as usize).copied()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, u16> {
        self.vec.iter()
    }

    pub fn into_iter(self) -> std::vec::IntoIter<u16> {
        self.vec.into_iter()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.vec
    }

    pub fn shrink_to_fit(&mut self) -> usize {
        let freed = (self.vec.capacity() - self.vec.len()) * ARRAY_ELEMENT_BYTES;
        self.vec.shrink_to_fit();
        freed
    }

    /// Retains only the elements specified by the predicate.
    pub fn retain(&mut self, mut f: impl FnMut(u16) -> bool) {
        // Branchless compaction, from the "Engineering Fast Indexes for Big
        // Data Applications" talk by Daniel Lemire
        // (https://youtu.be/1QMgGxiCFWE?t=1242).
        let slice = self.vec.as_mut_slice();
        let mut pos = 0;
        for i in 0..slice.len() {
            let val = slice[i];
            // SAFETY: pos <= i holds because `f(val) as usize` is at most 1.
            unsafe { *slice.get_unchecked_mut(pos) = val }
            pos += f(val) as usize;
        }
        self.vec.truncate(pos);
    }
}

impl Default for ArrayStore {
    fn default() -> Self {
        ArrayStore::new()
    }
}

#[derive(Debug)]
pub struct Error {
    index: usize,
    kind: ErrorKind,
}

#[derive(Debug)]
pub enum ErrorKind {
    Duplicate,
    OutOfOrder,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::Duplicate => {
                write!(f, "duplicate element at index {}", self.index)
            }
            ErrorKind::OutOfOrder => {
                write!(f, "element out of order at index {}", self.index)
            }
        }
    }
}

impl std::error::Error for Error {}

impl TryFrom<Vec<u16>> for ArrayStore {
    type Error = Error;

    fn try_from(value: Vec<u16>) -> Result<Self, Self::Error> {
        let mut iter = value.iter().enumerate();
        if let Some((_, mut prev)) = iter.next() {
            for (i, cur) in iter {
                match cur.cmp(prev) {
                    Ordering::Less => return Err(Error { index: i, kind: ErrorKind::OutOfOrder }),
                    Ordering::Equal => return Err(Error { index: i, kind: ErrorKind::Duplicate }),
                    Ordering::Greater => (),
                }
                prev = cur;
            }
        }

        Ok(ArrayStore { vec: value })
    }
}

/// Returns the position of the first element of `slice` at or after `from`
/// that is `>= target`, galloping forward before the binary search.
pub(crate) fn advance_until(slice: &[u16], from: usize, target: u16) -> usize {
    let mut lo = from;
    if lo >= slice.len() || slice[lo] >= target {
        return lo;
    }

    let mut step = 1;
    let mut hi = lo;
    loop {
        lo = hi;
        match hi.checked_add(step) {
            Some(next) if next < slice.len() => hi = next,
            _ => {
                hi = slice.len();
                break;
            }
        }
        if slice[hi] >= target {
            break;
        }
        step <<= 1;
    }

    lo + slice[lo..hi].partition_point(|&v| v < target)
}

/// Intersects two sorted slices. Gallops through the larger side when the
/// cardinalities are heavily skewed, merges otherwise.
fn and_slices(lhs: &[u16], rhs: &[u16], mut emit: impl FnMut(u16)) {
    fn skewed(small: &[u16], large: &[u16], emit: &mut impl FnMut(u16)) {
        let mut pos = 0;
        for &value in small {
            pos = advance_until(large, pos, value);
            if large.get(pos) == Some(&value) {
                emit(value);
                pos += 1;
            }
        }
    }

    if lhs.len() * GALLOP_RATIO < rhs.len() {
        skewed(lhs, rhs, &mut emit);
    } else if rhs.len() * GALLOP_RATIO < lhs.len() {
        skewed(rhs, lhs, &mut emit);
    } else {
        let (mut i, mut j) = (0, 0);
        while i < lhs.len() && j < rhs.len() {
            match lhs[i].cmp(&rhs[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    emit(lhs[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
    }
}

fn or_slices(lhs: &[u16], rhs: &[u16], out: &mut Vec<u16>) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        match lhs[i].cmp(&rhs[j]) {
            Ordering::Less => {
                out.push(lhs[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(rhs[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(lhs[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[i..]);
    out.extend_from_slice(&rhs[j..]);
}

fn sub_slices(lhs: &[u16], rhs: &[u16], out: &mut Vec<u16>) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        match lhs[i].cmp(&rhs[j]) {
            Ordering::Less => {
                out.push(lhs[i]);
                i += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[i..]);
}

fn xor_slices(lhs: &[u16], rhs: &[u16], out: &mut Vec<u16>) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        match lhs[i].cmp(&rhs[j]) {
            Ordering::Less => {
                out.push(lhs[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(rhs[j]);
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&lhs[i..]);
    out.extend_from_slice(&rhs[j..]);
}

impl BitOr<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitor(self, rhs: Self) -> Self::Output {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let mut out = Vec::with_capacity(self.vec.len() + rhs.vec.len());
        or_slices(self.as_slice(), rhs.as_slice(), &mut out);
        ArrayStore::from_vec_unchecked(out)
    }
}

impl BitAnd<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut out = Vec::with_capacity(self.vec.len().min(rhs.vec.len()));
        and_slices(self.as_slice(), rhs.as_slice(), |value| out.push(value));
        ArrayStore::from_vec_unchecked(out)
    }
}

impl BitAndAssign<&Self> for ArrayStore {
    fn bitand_assign(&mut self, rhs: &Self) {
        let mut pos = 0;
        self.retain(|x| {
            pos = advance_until(rhs.as_slice(), pos, x);
            rhs.vec.get(pos) == Some(&x)
        });
    }
}

impl BitAndAssign<&BitsetStore> for ArrayStore {
    fn bitand_assign(&mut self, rhs: &BitsetStore) {
        self.retain(|x| rhs.contains(x));
    }
}

impl Sub<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out = Vec::with_capacity(self.vec.len());
        sub_slices(self.as_slice(), rhs.as_slice(), &mut out);
        ArrayStore::from_vec_unchecked(out)
    }
}

impl SubAssign<&Self> for ArrayStore {
    fn sub_assign(&mut self, rhs: &Self) {
        let mut pos = 0;
        self.retain(|x| {
            pos = advance_until(rhs.as_slice(), pos, x);
            rhs.vec.get(pos) != Some(&x)
        });
    }
}

impl SubAssign<&BitsetStore> for ArrayStore {
    fn sub_assign(&mut self, rhs: &BitsetStore) {
        self.retain(|x| !rhs.contains(x));
    }
}

impl BitXor<Self> for &ArrayStore {
    type Output = ArrayStore;

    fn bitxor(self, rhs: Self) -> Self::Output {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let mut out = Vec::with_capacity(self.vec.len() + rhs.vec.len());
        xor_slices(self.as_slice(), rhs.as_slice(), &mut out);
        ArrayStore::from_vec_unchecked(out)
    }
}

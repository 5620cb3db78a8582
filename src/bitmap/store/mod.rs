mod array_store;
mod bitset_store;
mod run_store;

use core::mem;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, RangeInclusive, Sub, SubAssign,
};
use core::slice;

pub(crate) use self::array_store::ArrayStore;
pub(crate) use self::bitset_store::{BitsetIter, BitsetStore, BITSET_BYTES, BITSET_WORDS};
pub(crate) use self::run_store::{Interval, RunIter, RunStore};

use self::Store::{Array, Bitset, Run};

#[derive(Clone, Debug)]
pub(crate) enum Store {
    Array(ArrayStore),
    Bitset(BitsetStore),
    Run(RunStore),
}

impl Store {
    pub fn new() -> Store {
        Array(ArrayStore::new())
    }

    pub fn full() -> Store {
        Bitset(BitsetStore::full())
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.insert(index),
            Bitset(bits) => bits.insert(index),
            Run(runs) => runs.insert(index),
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        match self {
            Array(vec) => vec.insert_range(range),
            Bitset(bits) => bits.insert_range(range),
            Run(runs) => runs.insert_range(range),
        }
    }

    /// Push `index` at the end of the store only if `index` is the new max.
    ///
    /// Returns whether `index` was effectively pushed.
    pub fn push(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.push(index),
            Bitset(bits) => bits.push(index),
            Run(runs) => runs.push(index),
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
        match self {
            Array(vec) => vec.push_unchecked(index),
            Bitset(bits) => bits.push_unchecked(index),
            Run(runs) => runs.push_unchecked(index),
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.remove(index),
            Bitset(bits) => bits.remove(index),
            Run(runs) => runs.remove(index),
        }
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        match self {
            Array(vec) => vec.remove_range(range),
            Bitset(bits) => bits.remove_range(range),
            Run(runs) => runs.remove_range(range),
        }
    }

    pub fn remove_smallest(&mut self, n: u64) {
        match self {
            Array(vec) => vec.remove_smallest(n),
            Bitset(bits) => bits.remove_smallest(n),
            Run(runs) => runs.remove_smallest(n),
        }
    }

    pub fn remove_biggest(&mut self, n: u64) {
        match self {
            Array(vec) => vec.remove_biggest(n),
            Bitset(bits) => bits.remove_biggest(n),
            Run(runs) => runs.remove_biggest(n),
        }
    }

    /// Flips every value in the range.
    pub fn flip_range(&mut self, range: RangeInclusive<u16>) {
        match self {
            Array(vec) => {
                let inside = vec.intersection_len_interval(&Interval::new(
                    *range.start(),
                    *range.end(),
                ));
                let range_len = u64::from(range.end() - range.start()) + 1;
                let flipped = vec.len() - inside + (range_len - inside);
                if flipped <= super::container::ARRAY_LIMIT {
                    *vec = flip_array_range(vec, &range);
                } else {
                    let mut bits = vec.to_bitset_store();
                    bits.flip_range(range);
                    *self = Bitset(bits);
                }
            }
            Bitset(bits) => bits.flip_range(range),
            Run(runs) => {
                let span = RunStore::from_vec_unchecked(vec![Interval::new(
                    *range.start(),
                    *range.end(),
                )]);
                let missing = span.difference(runs);
                runs.remove_range(range);
                for iv in missing.as_slice() {
                    runs.insert_range(iv.start..=iv.end);
                }
            }
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        match self {
            Array(vec) => vec.contains(index),
            Bitset(bits) => bits.contains(index),
            Run(runs) => runs.contains(index),
        }
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        match self {
            Array(vec) => vec.contains_range(range),
            Bitset(bits) => bits.contains_range(range),
            Run(runs) => runs.contains_range(range),
        }
    }

    pub fn is_full(&self) -> bool {
        match self {
            Run(runs) => runs.is_full(),
            _ => self.len() == 1 << 16,
        }
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_disjoint(vec2),
            (Bitset(bits1), Bitset(bits2)) => bits1.is_disjoint(bits2),
            (Array(vec), Bitset(bits)) | (Bitset(bits), Array(vec)) => {
                vec.iter().all(|&i| !bits.contains(i))
            }
            (Run(runs1), Run(runs2)) => runs1.is_disjoint(runs2),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                vec.iter().all(|&i| !runs.contains(i))
            }
            (Run(runs), Bitset(bits)) | (Bitset(bits), Run(runs)) => runs
                .as_slice()
                .iter()
                .all(|iv| bits.intersection_len_interval(iv) == 0),
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_subset(vec2),
            (Bitset(bits1), Bitset(bits2)) => bits1.is_subset(bits2),
            (Array(vec), Bitset(bits)) => vec.iter().all(|&i| bits.contains(i)),
            (Bitset(bits), Array(vec)) => {
                bits.len() <= vec.len() && bits.iter().all(|i| vec.contains(i))
            }
            (Run(runs1), Run(runs2)) => runs1.is_subset(runs2),
            (Array(vec), Run(runs)) => vec.iter().all(|&i| runs.contains(i)),
            (Run(runs), Array(vec)) => {
                runs.len() <= vec.len()
                    && runs.as_slice().iter().all(|iv| vec.contains_range(iv.start..=iv.end))
            }
            (Run(runs), Bitset(bits)) => {
                runs.as_slice().iter().all(|iv| bits.contains_range(iv.start..=iv.end))
            }
            (Bitset(bits), Run(runs)) => {
                // Every set bit lies inside a run exactly when the per-run
                // counts account for the whole cardinality.
                let covered: u64 = runs
                    .as_slice()
                    .iter()
                    .map(|iv| bits.intersection_len_interval(iv))
                    .sum();
                covered == bits.len()
            }
        }
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.intersection_len(vec2),
            (Bitset(bits1), Bitset(bits2)) => bits1.intersection_len_bitset(bits2),
            (Array(vec), Bitset(bits)) | (Bitset(bits), Array(vec)) => {
                vec.iter().filter(|&&i| bits.contains(i)).count() as u64
            }
            (Run(runs1), Run(runs2)) => runs1.intersection_len(runs2),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => runs
                .as_slice()
                .iter()
                .map(|iv| vec.intersection_len_interval(iv))
                .sum(),
            (Run(runs), Bitset(bits)) | (Bitset(bits), Run(runs)) => runs
                .as_slice()
                .iter()
                .map(|iv| bits.intersection_len_interval(iv))
                .sum(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Array(vec) => vec.len(),
            Bitset(bits) => bits.len(),
            Run(runs) => runs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Array(vec) => vec.is_empty(),
            Bitset(bits) => bits.is_empty(),
            Run(runs) => runs.is_empty(),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.min(),
            Bitset(bits) => bits.min(),
            Run(runs) => runs.min(),
        }
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.max(),
            Bitset(bits) => bits.max(),
            Run(runs) => runs.max(),
        }
    }

    pub fn rank(&self, index: u16) -> u64 {
        match self {
            Array(vec) => vec.rank(index),
            Bitset(bits) => bits.rank(index),
            Run(runs) => runs.rank(index),
        }
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        match self {
            Array(vec) => vec.select(n),
            Bitset(bits) => bits.select(n),
            Run(runs) => runs.select(n),
        }
    }

    /// Number of maximal runs of consecutive values.
    pub fn count_runs(&self) -> u64 {
        match self {
            Array(vec) => {
                let mut runs = 0u64;
                let mut prev: Option<u16> = None;
                for &v in vec.iter() {
                    if prev.map_or(true, |p| u32::from(p) + 1 != u32::from(v)) {
                        runs += 1;
                    }
                    prev = Some(v);
                }
                runs
            }
            Bitset(bits) => {
                let words = bits.as_array();
                let mut runs = 0u64;
                for i in 0..BITSET_WORDS - 1 {
                    let word = words[i];
                    let next = words[i + 1];
                    runs += ((word << 1) & !word).count_ones() as u64 + ((word >> 63) & !next);
                }
                let last = words[BITSET_WORDS - 1];
                runs + ((last << 1) & !last).count_ones() as u64 + (last >> 63)
            }
            Run(runs) => runs.n_runs(),
        }
    }

    pub(crate) fn to_bitset(&self) -> Store {
        match self {
            Array(vec) => Bitset(vec.to_bitset_store()),
            Bitset(_) => self.clone(),
            Run(runs) => Bitset(runs.to_bitset_store()),
        }
    }

    /// Run-compress a flat store. Callers only invoke this on non-empty
    /// array or bitset stores.
    pub(crate) fn to_run(&self) -> Store {
        match self {
            Array(vec) => {
                let slice = vec.as_slice();
                let mut intervals = Vec::new();
                let mut start = slice[0];
                for window in slice.windows(2) {
                    let &[prev, cur] = window else { unreachable!() };
                    if u32::from(prev) + 1 != u32::from(cur) {
                        intervals.push(Interval::new(start, prev));
                        start = cur;
                    }
                }
                intervals.push(Interval::new(start, *slice.last().unwrap()));
                Run(RunStore::from_vec_unchecked(intervals))
            }
            Bitset(bits) => {
                let words = bits.as_array();
                let mut intervals = Vec::new();
                let mut i = 0usize;
                let mut current = words[0];
                loop {
                    while current == 0 && i < BITSET_WORDS - 1 {
                        i += 1;
                        current = words[i];
                    }
                    if current == 0 {
                        break;
                    }
                    let start = (64 * i) as u32 + current.trailing_zeros();

                    // Fill the run's bits with ones, then look for the next zero.
                    current |= current - 1;
                    while current == u64::MAX && i < BITSET_WORDS - 1 {
                        i += 1;
                        current = words[i];
                    }
                    if current == u64::MAX {
                        intervals.push(Interval::new(start as u16, u16::MAX));
                        break;
                    }
                    let end = (64 * i) as u32 + (!current).trailing_zeros();
                    intervals.push(Interval::new(start as u16, (end - 1) as u16));

                    current &= current + 1;
                }
                Run(RunStore::from_vec_unchecked(intervals))
            }
            Run(_) => panic!("store is already run encoded"),
        }
    }

    pub(crate) fn shrink_to_fit(&mut self) -> usize {
        match self {
            Array(vec) => vec.shrink_to_fit(),
            Bitset(_) => 0,
            Run(runs) => runs.shrink_to_fit(),
        }
    }
}

/// Complements `vec` inside the range, keeping everything outside it.
fn flip_array_range(vec: &ArrayStore, range: &RangeInclusive<u16>) -> ArrayStore {
    let slice = vec.as_slice();
    let (start, end) = (*range.start(), *range.end());
    let lo = slice.partition_point(|&v| v < start);
    let hi = slice.partition_point(|&v| v <= end);

    let mut out = Vec::with_capacity(slice.len() + (end - start) as usize + 1);
    out.extend_from_slice(&slice[..lo]);
    let mut present = slice[lo..hi].iter().copied().peekable();
    for value in start..=end {
        if present.peek() == Some(&value) {
            present.next();
        } else {
            out.push(value);
        }
    }
    out.extend_from_slice(&slice[hi..]);
    ArrayStore::from_vec_unchecked(out)
}

/// Keeps only the bits of `bits` that fall inside one of `runs`.
fn bitset_retain_runs(bits: &mut BitsetStore, runs: &RunStore) {
    let mut next_clear = 0u32;
    for iv in runs.as_slice() {
        if u32::from(iv.start) > next_clear {
            bits.remove_range(next_clear as u16..=iv.start - 1);
        }
        next_clear = u32::from(iv.end) + 1;
    }
    if next_clear <= u32::from(u16::MAX) {
        bits.remove_range(next_clear as u16..=u16::MAX);
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl BitOr<&Store> for &Store {
    type Output = Store;

    fn bitor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitOr::bitor(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(runs1.union(runs2)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &i in vec.iter() {
                    runs.insert(i);
                }
                Run(runs)
            }
            (Run(runs), Bitset(bits)) | (Bitset(bits), Run(runs)) => {
                let mut bits = bits.clone();
                for iv in runs.as_slice() {
                    bits.insert_range(iv.start..=iv.end);
                }
                Bitset(bits)
            }
            (Bitset(bits), Array(vec)) | (Array(vec), Bitset(bits)) => {
                let mut bits = bits.clone();
                BitOrAssign::bitor_assign(&mut bits, vec);
                Bitset(bits)
            }
            (Bitset(bits1), Bitset(bits2)) => {
                let mut bits = bits1.clone();
                BitOrAssign::bitor_assign(&mut bits, bits2);
                Bitset(bits)
            }
        }
    }
}

impl BitOrAssign<&Store> for Store {
    fn bitor_assign(&mut self, rhs: &Store) {
        match (&mut *self, rhs) {
            (Array(vec1), Array(vec2)) => {
                let lhs = mem::take(vec1);
                *vec1 = BitOr::bitor(&lhs, vec2);
            }
            (Bitset(bits1), Array(vec2)) => {
                BitOrAssign::bitor_assign(bits1, vec2);
            }
            (Bitset(bits1), Bitset(bits2)) => {
                BitOrAssign::bitor_assign(bits1, bits2);
            }
            (Bitset(bits1), Run(runs2)) => {
                for iv in runs2.as_slice() {
                    bits1.insert_range(iv.start..=iv.end);
                }
            }
            (Run(runs1), Run(runs2)) => {
                *runs1 = runs1.union(runs2);
            }
            (Run(runs1), Array(vec2)) => {
                for &i in vec2.iter() {
                    runs1.insert(i);
                }
            }
            // The remaining pairings change representation; rebuild.
            (Run(_), Bitset(_)) | (Array(_), Bitset(_)) | (Array(_), Run(_)) => {
                *self = BitOr::bitor(&*self, rhs);
            }
        }
    }
}

impl BitAnd<&Store> for &Store {
    type Output = Store;

    fn bitand(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitAnd::bitand(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(runs1.intersection(runs2)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut vec = vec.clone();
                vec.retain(|i| runs.contains(i));
                Array(vec)
            }
            (Run(runs), Bitset(bits)) | (Bitset(bits), Run(runs)) => {
                let mut bits = bits.clone();
                bitset_retain_runs(&mut bits, runs);
                Bitset(bits)
            }
            (Array(vec), Bitset(bits)) | (Bitset(bits), Array(vec)) => {
                let mut vec = vec.clone();
                BitAndAssign::bitand_assign(&mut vec, bits);
                Array(vec)
            }
            (Bitset(bits1), Bitset(bits2)) => {
                let mut bits = bits1.clone();
                BitAndAssign::bitand_assign(&mut bits, bits2);
                Bitset(bits)
            }
        }
    }
}

impl BitAndAssign<&Store> for Store {
    fn bitand_assign(&mut self, rhs: &Store) {
        match (&mut *self, rhs) {
            (Array(vec1), Array(vec2)) => {
                BitAndAssign::bitand_assign(vec1, vec2);
            }
            (Array(vec1), Bitset(bits2)) => {
                BitAndAssign::bitand_assign(vec1, bits2);
            }
            (Array(vec1), Run(runs2)) => {
                vec1.retain(|i| runs2.contains(i));
            }
            (Bitset(bits1), Bitset(bits2)) => {
                BitAndAssign::bitand_assign(bits1, bits2);
            }
            (Bitset(bits1), Run(runs2)) => {
                bitset_retain_runs(bits1, runs2);
            }
            (Run(runs1), Run(runs2)) => {
                *runs1 = runs1.intersection(runs2);
            }
            // The remaining pairings change representation; rebuild.
            (Bitset(_), Array(_)) | (Run(_), Array(_)) | (Run(_), Bitset(_)) => {
                *self = BitAnd::bitand(&*self, rhs);
            }
        }
    }
}

impl Sub<&Store> for &Store {
    type Output = Store;

    fn sub(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(Sub::sub(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(runs1.difference(runs2)),
            (Run(runs), Array(vec)) => {
                let mut runs = runs.clone();
                for &i in vec.iter() {
                    runs.remove(i);
                }
                Run(runs)
            }
            (Array(vec), Run(runs)) => {
                let mut vec = vec.clone();
                vec.retain(|i| !runs.contains(i));
                Array(vec)
            }
            (Run(runs), Bitset(bits)) => {
                let mut out = runs.to_bitset_store();
                SubAssign::sub_assign(&mut out, bits);
                Bitset(out)
            }
            (Bitset(bits), Run(runs)) => {
                let mut bits = bits.clone();
                for iv in runs.as_slice() {
                    bits.remove_range(iv.start..=iv.end);
                }
                Bitset(bits)
            }
            (Array(vec), Bitset(bits)) => {
                let mut vec = vec.clone();
                SubAssign::sub_assign(&mut vec, bits);
                Array(vec)
            }
            (Bitset(bits), Array(vec)) => {
                let mut bits = bits.clone();
                SubAssign::sub_assign(&mut bits, vec);
                Bitset(bits)
            }
            (Bitset(bits1), Bitset(bits2)) => {
                let mut bits = bits1.clone();
                SubAssign::sub_assign(&mut bits, bits2);
                Bitset(bits)
            }
        }
    }
}

impl SubAssign<&Store> for Store {
    fn sub_assign(&mut self, rhs: &Store) {
        match (&mut *self, rhs) {
            (Array(vec1), Array(vec2)) => {
                SubAssign::sub_assign(vec1, vec2);
            }
            (Array(vec1), Bitset(bits2)) => {
                SubAssign::sub_assign(vec1, bits2);
            }
            (Array(vec1), Run(runs2)) => {
                vec1.retain(|i| !runs2.contains(i));
            }
            (Bitset(bits1), Array(vec2)) => {
                SubAssign::sub_assign(bits1, vec2);
            }
            (Bitset(bits1), Bitset(bits2)) => {
                SubAssign::sub_assign(bits1, bits2);
            }
            (Bitset(bits1), Run(runs2)) => {
                for iv in runs2.as_slice() {
                    bits1.remove_range(iv.start..=iv.end);
                }
            }
            (Run(runs1), Run(runs2)) => {
                *runs1 = runs1.difference(runs2);
            }
            (Run(runs1), Array(vec2)) => {
                for &i in vec2.iter() {
                    runs1.remove(i);
                }
            }
            // Subtracting a bitset from runs changes representation; rebuild.
            (Run(_), Bitset(_)) => {
                *self = Sub::sub(&*self, rhs);
            }
        }
    }
}

impl BitXor<&Store> for &Store {
    type Output = Store;

    fn bitxor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitXor::bitxor(vec1, vec2)),
            (Run(runs1), Run(runs2)) => Run(runs1.symmetric_difference(runs2)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &i in vec.iter() {
                    if !runs.remove(i) {
                        runs.insert(i);
                    }
                }
                Run(runs)
            }
            (Run(runs), Bitset(bits)) | (Bitset(bits), Run(runs)) => {
                let mut bits = bits.clone();
                for iv in runs.as_slice() {
                    bits.flip_range(iv.start..=iv.end);
                }
                Bitset(bits)
            }
            (Array(vec), Bitset(bits)) | (Bitset(bits), Array(vec)) => {
                let mut bits = bits.clone();
                BitXorAssign::bitxor_assign(&mut bits, vec);
                Bitset(bits)
            }
            (Bitset(bits1), Bitset(bits2)) => {
                let mut bits = bits1.clone();
                BitXorAssign::bitxor_assign(&mut bits, bits2);
                Bitset(bits)
            }
        }
    }
}

impl BitXorAssign<&Store> for Store {
    fn bitxor_assign(&mut self, rhs: &Store) {
        match (&mut *self, rhs) {
            (Array(vec1), Array(vec2)) => {
                let lhs = mem::take(vec1);
                *vec1 = BitXor::bitxor(&lhs, vec2);
            }
            (Bitset(bits1), Array(vec2)) => {
                BitXorAssign::bitxor_assign(bits1, vec2);
            }
            (Bitset(bits1), Bitset(bits2)) => {
                BitXorAssign::bitxor_assign(bits1, bits2);
            }
            (Bitset(bits1), Run(runs2)) => {
                for iv in runs2.as_slice() {
                    bits1.flip_range(iv.start..=iv.end);
                }
            }
            (Run(runs1), Run(runs2)) => {
                *runs1 = runs1.symmetric_difference(runs2);
            }
            (Run(runs1), Array(vec2)) => {
                for &i in vec2.iter() {
                    if !runs1.remove(i) {
                        runs1.insert(i);
                    }
                }
            }
            // The remaining pairings change representation; rebuild.
            (Array(_), Bitset(_)) | (Run(_), Bitset(_)) | (Array(_), Run(_)) => {
                *self = BitXor::bitxor(&*self, rhs);
            }
        }
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1 == vec2,
            (Bitset(bits1), Bitset(bits2)) => bits1 == bits2,
            (Run(runs1), Run(runs2)) => runs1 == runs2,
            // Cardinalities match, so one-way containment is enough.
            (Array(vec), Bitset(bits)) | (Bitset(bits), Array(vec)) => {
                vec.iter().all(|&i| bits.contains(i))
            }
            (Array(vec), Run(runs)) | (Run(runs), Array(vec)) => {
                vec.iter().copied().eq(runs.iter())
            }
            (Bitset(bits), Run(runs)) | (Run(runs), Bitset(bits)) => runs
                .as_slice()
                .iter()
                .all(|iv| bits.contains_range(iv.start..=iv.end)),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Iter<'a> {
    Array(slice::Iter<'a, u16>),
    Vec(std::vec::IntoIter<u16>),
    BitsetBorrowed(BitsetIter<&'a [u64; BITSET_WORDS]>),
    BitsetOwned(BitsetIter<Box<[u64; BITSET_WORDS]>>),
    RunBorrowed(RunIter<&'a [Interval]>),
    RunOwned(RunIter<Vec<Interval>>),
}

impl<'a> IntoIterator for &'a Store {
    type Item = u16;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        match self {
            Array(vec) => Iter::Array(vec.iter()),
            Bitset(bits) => Iter::BitsetBorrowed(bits.iter()),
            Run(runs) => Iter::RunBorrowed(runs.iter()),
        }
    }
}

impl IntoIterator for Store {
    type Item = u16;
    type IntoIter = Iter<'static>;

    fn into_iter(self) -> Iter<'static> {
        match self {
            Array(vec) => Iter::Vec(vec.into_iter()),
            Bitset(bits) => Iter::BitsetOwned(bits.into_iter()),
            Run(runs) => Iter::RunOwned(runs.into_iter()),
        }
    }
}

impl Iter<'_> {
    /// Advance the iterator to the first value greater than or equal to `n`.
    pub(crate) fn advance_to(&mut self, n: u16) {
        match self {
            Iter::Array(inner) => {
                let skip = inner.as_slice().partition_point(|&i| i < n);
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth(nth);
                }
            }
            Iter::Vec(inner) => {
                let skip = inner.as_slice().partition_point(|&i| i < n);
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth(nth);
                }
            }
            Iter::BitsetBorrowed(inner) => inner.advance_to(n),
            Iter::BitsetOwned(inner) => inner.advance_to(n),
            Iter::RunBorrowed(inner) => inner.advance_to(n),
            Iter::RunOwned(inner) => inner.advance_to(n),
        }
    }

    /// Advance the back of the iterator to the first value less than or
    /// equal to `n`.
    pub(crate) fn advance_back_to(&mut self, n: u16) {
        match self {
            Iter::Array(inner) => {
                let slice = inner.as_slice();
                let from_front = slice.partition_point(|&i| i <= n);
                let skip = slice.len() - from_front;
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth_back(nth);
                }
            }
            Iter::Vec(inner) => {
                let slice = inner.as_slice();
                let from_front = slice.partition_point(|&i| i <= n);
                let skip = slice.len() - from_front;
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth_back(nth);
                }
            }
            Iter::BitsetBorrowed(inner) => inner.advance_back_to(n),
            Iter::BitsetOwned(inner) => inner.advance_back_to(n),
            Iter::RunBorrowed(inner) => inner.advance_back_to(n),
            Iter::RunOwned(inner) => inner.advance_back_to(n),
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.next().copied(),
            Iter::Vec(inner) => inner.next(),
            Iter::BitsetBorrowed(inner) => inner.next(),
            Iter::BitsetOwned(inner) => inner.next(),
            Iter::RunBorrowed(inner) => inner.next(),
            Iter::RunOwned(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(inner) => inner.size_hint(),
            Iter::Vec(inner) => inner.size_hint(),
            Iter::BitsetBorrowed(inner) => inner.size_hint(),
            Iter::BitsetOwned(inner) => inner.size_hint(),
            Iter::RunBorrowed(inner) => inner.size_hint(),
            Iter::RunOwned(inner) => inner.size_hint(),
        }
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        match self {
            Iter::Array(inner) => inner.count(),
            Iter::Vec(inner) => inner.count(),
            Iter::BitsetBorrowed(inner) => inner.count(),
            Iter::BitsetOwned(inner) => inner.count(),
            Iter::RunBorrowed(inner) => inner.count(),
            Iter::RunOwned(inner) => inner.count(),
        }
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        match self {
            Iter::Array(inner) => inner.nth(n).copied(),
            Iter::Vec(inner) => inner.nth(n),
            Iter::BitsetBorrowed(inner) => inner.nth(n),
            Iter::BitsetOwned(inner) => inner.nth(n),
            Iter::RunBorrowed(inner) => inner.nth(n),
            Iter::RunOwned(inner) => inner.nth(n),
        }
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(inner) => inner.next_back().copied(),
            Iter::Vec(inner) => inner.next_back(),
            Iter::BitsetBorrowed(inner) => inner.next_back(),
            Iter::BitsetOwned(inner) => inner.next_back(),
            Iter::RunBorrowed(inner) => inner.next_back(),
            Iter::RunOwned(inner) => inner.next_back(),
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}

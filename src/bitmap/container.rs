use core::fmt;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, RangeInclusive, Sub, SubAssign,
};

use super::cow::CowStore;
use super::store::{self, ArrayStore, Interval, RunStore, Store, BITSET_BYTES};
use super::util;

pub const ARRAY_LIMIT: u64 = 4096;

#[derive(PartialEq)]
pub(crate) struct Container {
    pub key: u16,
    store: CowStore,
}

#[derive(Clone)]
pub(crate) struct Iter<'a> {
    pub key: u16,
    inner: store::Iter<'a>,
}

impl Container {
    pub fn new(key: u16) -> Container {
        Container { key, store: CowStore::new(Store::new()) }
    }

    pub fn from_store(key: u16, store: Store) -> Container {
        Container { key, store: CowStore::new(store) }
    }

    pub fn full(key: u16) -> Container {
        Container { key, store: CowStore::new(Store::full()) }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access to the store; thaws it first if it is shared.
    pub fn store_mut(&mut self) -> &mut Store {
        self.store.to_mut()
    }

    pub fn into_store(self) -> Store {
        self.store.into_owned()
    }

    /// A handle to the same underlying store, for copy-on-write clones.
    pub fn shared(&self) -> Container {
        Container { key: self.key, store: self.store.share() }
    }

    pub(crate) fn is_shared(&self) -> bool {
        self.store.is_shared()
    }
}

impl Container {
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        if self.store_mut().insert(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let promotion = match self.store() {
            Store::Array(vec) => {
                let span = Interval::new(*range.start(), *range.end());
                let added = span.run_len() - vec.intersection_len_interval(&span);
                if vec.len() + added > ARRAY_LIMIT {
                    // The union will not fit an array; build the result as a
                    // bitset directly instead of growing and converting.
                    Some(vec.to_bitset_store())
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(mut bits) = promotion {
            let added = bits.insert_range(range);
            self.store = CowStore::new(Store::Bitset(bits));
            return added;
        }
        self.store_mut().insert_range(range)
    }

    /// Pushes `index` at the end of the container only if `index` is the new max.
    ///
    /// Returns whether the `index` was effectively pushed.
    pub fn push(&mut self, index: u16) -> bool {
        if self.store_mut().push(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    ///
    /// Pushes `index` at the end of the container.
    /// It is up to the caller to have validated index > self.max()
    ///
    /// # Panics
    ///
    /// If debug_assertions enabled and index is > self.max()
    pub(crate) fn push_unchecked(&mut self, index: u16) {
        self.store_mut().push_unchecked(index);
        self.ensure_correct_store();
    }

    pub fn remove(&mut self, index: u16) -> bool {
        if self.store_mut().remove(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let removed = self.store_mut().remove_range(range);
        self.ensure_correct_store();
        removed
    }

    pub fn remove_smallest(&mut self, n: u64) {
        self.store_mut().remove_smallest(n);
        self.ensure_correct_store();
    }

    pub fn remove_biggest(&mut self, n: u64) {
        self.store_mut().remove_biggest(n);
        self.ensure_correct_store();
    }

    pub fn flip_range(&mut self, range: RangeInclusive<u16>) {
        if range.is_empty() {
            return;
        }
        self.store_mut().flip_range(range);
        self.ensure_optimal_store();
    }

    pub fn contains(&self, index: u16) -> bool {
        self.store.contains(index)
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        self.store.contains_range(range)
    }

    pub fn is_full(&self) -> bool {
        self.store.is_full()
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.store.is_disjoint(&other.store)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.store.is_subset(&other.store)
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        self.store.intersection_len(&other.store)
    }

    pub fn min(&self) -> Option<u16> {
        self.store.min()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.store.max()
    }

    pub fn rank(&self, index: u16) -> u64 {
        self.store.rank(index)
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        self.store.select(n)
    }

    /// Converts between the array and bitset representations when the
    /// cardinality crosses the threshold. Runs are left alone: only
    /// [`Container::optimize`] and the binary operators revisit them.
    pub(crate) fn ensure_correct_store(&mut self) {
        let new_store = match self.store() {
            Store::Bitset(bits) if bits.len() <= ARRAY_LIMIT => {
                Some(Store::Array(bits.to_array_store()))
            }
            Store::Array(vec) if vec.len() > ARRAY_LIMIT => {
                Some(Store::Bitset(vec.to_bitset_store()))
            }
            _ => None,
        };
        if let Some(new_store) = new_store {
            self.store = CowStore::new(new_store);
        }
    }

    /// Like `ensure_correct_store`, but also demotes a run store that is not
    /// strictly smaller than the best flat representation. Operator results
    /// go through here so that every surviving run container is the smallest
    /// encoding of its values.
    pub(crate) fn ensure_optimal_store(&mut self) {
        let new_store = match self.store() {
            Store::Bitset(bits) if bits.len() <= ARRAY_LIMIT => {
                Some(Store::Array(bits.to_array_store()))
            }
            Store::Array(vec) if vec.len() > ARRAY_LIMIT => {
                Some(Store::Bitset(vec.to_bitset_store()))
            }
            Store::Run(runs) => {
                let card = runs.len();
                let mut smallest_flat = BITSET_BYTES;
                if card <= ARRAY_LIMIT {
                    smallest_flat = smallest_flat.min(ArrayStore::serialized_byte_size(card));
                }
                if runs.byte_size() < smallest_flat {
                    None
                } else if card <= ARRAY_LIMIT {
                    Some(Store::Array(runs.to_array_store()))
                } else {
                    Some(Store::Bitset(runs.to_bitset_store()))
                }
            }
            _ => None,
        };
        if let Some(new_store) = new_store {
            self.store = CowStore::new(new_store);
        }
    }

    /// Run-compresses the container when that saves space.
    ///
    /// Returns whether the container is run-encoded afterwards.
    pub fn optimize(&mut self) -> bool {
        match self.store() {
            Store::Bitset(_) => {
                let size_as_run = RunStore::serialized_byte_size(self.store.count_runs());
                if size_as_run < BITSET_BYTES {
                    self.store = CowStore::new(self.store.to_run());
                    true
                } else {
                    false
                }
            }
            Store::Array(vec) => {
                let size_as_run = RunStore::serialized_byte_size(self.store.count_runs());
                if size_as_run < vec.byte_size() {
                    self.store = CowStore::new(self.store.to_run());
                    true
                } else {
                    false
                }
            }
            Store::Run(_) => {
                self.ensure_optimal_store();
                matches!(self.store(), Store::Run(_))
            }
        }
    }

    /// Replaces a run store by the equivalent flat representation.
    ///
    /// Returns whether a conversion happened.
    pub fn remove_run_compression(&mut self) -> bool {
        match self.store() {
            Store::Array(_) | Store::Bitset(_) => false,
            Store::Run(runs) => {
                let new_store = if runs.len() <= ARRAY_LIMIT {
                    Store::Array(runs.to_array_store())
                } else {
                    Store::Bitset(runs.to_bitset_store())
                };
                self.store = CowStore::new(new_store);
                true
            }
        }
    }

    /// Returns the number of heap bytes released.
    pub fn shrink_to_fit(&mut self) -> usize {
        if self.is_shared() {
            // A shared store is borrowed storage; compacting a private copy
            // of it would grow memory, not release it.
            return 0;
        }
        self.store_mut().shrink_to_fit()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Container { key: self.key, store: self.store.deep_clone() }
    }
}

impl BitOr<&Container> for &Container {
    type Output = Container;

    fn bitor(self, rhs: &Container) -> Container {
        let store = BitOr::bitor(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_optimal_store();
        container
    }
}

impl BitOrAssign<&Container> for Container {
    fn bitor_assign(&mut self, rhs: &Container) {
        BitOrAssign::bitor_assign(self.store_mut(), rhs.store());
        self.ensure_optimal_store();
    }
}

impl BitAnd<&Container> for &Container {
    type Output = Container;

    fn bitand(self, rhs: &Container) -> Container {
        let store = BitAnd::bitand(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_optimal_store();
        container
    }
}

impl BitAndAssign<&Container> for Container {
    fn bitand_assign(&mut self, rhs: &Container) {
        BitAndAssign::bitand_assign(self.store_mut(), rhs.store());
        self.ensure_optimal_store();
    }
}

impl Sub<&Container> for &Container {
    type Output = Container;

    fn sub(self, rhs: &Container) -> Container {
        let store = Sub::sub(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_optimal_store();
        container
    }
}

impl SubAssign<&Container> for Container {
    fn sub_assign(&mut self, rhs: &Container) {
        SubAssign::sub_assign(self.store_mut(), rhs.store());
        self.ensure_optimal_store();
    }
}

impl BitXor<&Container> for &Container {
    type Output = Container;

    fn bitxor(self, rhs: &Container) -> Container {
        let store = BitXor::bitxor(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_optimal_store();
        container
    }
}

impl BitXorAssign<&Container> for Container {
    fn bitxor_assign(&mut self, rhs: &Container) {
        BitXorAssign::bitxor_assign(self.store_mut(), rhs.store());
        self.ensure_optimal_store();
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        Iter { key: self.key, inner: self.store().into_iter() }
    }
}

impl IntoIterator for Container {
    type Item = u32;
    type IntoIter = Iter<'static>;

    fn into_iter(self) -> Iter<'static> {
        let key = self.key;
        Iter { key, inner: self.into_store().into_iter() }
    }
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.inner.next().map(|i| util::join(self.key, i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.inner.count()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.inner.nth(n).map(|i| util::join(self.key, i))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|i| util::join(self.key, i))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl Iter<'_> {
    pub(crate) fn advance_to(&mut self, index: u16) {
        self.inner.advance_to(index);
    }

    pub(crate) fn advance_back_to(&mut self, index: u16) {
        self.inner.advance_back_to(index);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        format!("Container<{:?} @ {:?}>", self.len(), self.key).fmt(formatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_crosses_array_limit() {
        let mut container = Container::new(0);
        for i in 0..=ARRAY_LIMIT as u16 {
            container.insert(i);
        }
        assert!(matches!(container.store(), Store::Bitset(_)));
        assert_eq!(container.len(), ARRAY_LIMIT + 1);

        container.remove(0);
        assert!(matches!(container.store(), Store::Array(_)));
        assert_eq!(container.len(), ARRAY_LIMIT);
    }

    #[test]
    fn insert_range_promotes_directly() {
        let mut container = Container::new(0);
        assert_eq!(container.insert_range(0..=9999), 10000);
        assert!(matches!(container.store(), Store::Bitset(_)));
    }

    #[test]
    fn optimize_prefers_runs_for_dense_ranges() {
        let mut container = Container::new(0);
        container.insert_range(100..=999);
        assert!(container.optimize());
        assert!(matches!(container.store(), Store::Run(_)));
        assert_eq!(container.len(), 900);

        assert!(container.remove_run_compression());
        assert!(matches!(container.store(), Store::Array(_)));
        assert_eq!(container.len(), 900);
    }

    #[test]
    fn optimize_leaves_scattered_values_flat() {
        let mut container = Container::new(0);
        for i in (0..2000).map(|i| i * 3) {
            container.insert(i as u16);
        }
        assert!(!container.optimize());
        assert!(matches!(container.store(), Store::Array(_)));
    }

    #[test]
    fn operator_results_demote_unprofitable_runs() {
        let mut lhs = Container::new(0);
        lhs.insert_range(0..=9);
        lhs.optimize();
        let mut rhs = Container::new(0);
        rhs.insert_range(1..=10);
        rhs.optimize();

        // The two stray leftovers encode smaller as an array than as runs.
        let xor = &lhs ^ &rhs;
        assert_eq!(xor.len(), 2);
        assert!(matches!(xor.store(), Store::Array(_)));

        // A single long run stays run encoded.
        let or = &lhs | &rhs;
        assert_eq!(or.len(), 11);
        assert!(matches!(or.store(), Store::Run(_)));
    }

    #[test]
    fn shared_container_thaws_on_write() {
        let mut original = Container::new(0);
        original.insert(1);
        let mut copy = original.shared();
        assert!(original.is_shared());

        copy.insert(2);
        assert!(!original.is_shared());
        assert!(!copy.is_shared());
        assert!(!original.contains(2));
        assert!(copy.contains(2));
    }
}

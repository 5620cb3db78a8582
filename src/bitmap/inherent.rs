use core::cmp::Ordering;
use core::ops::RangeBounds;

use crate::Bitmap;

use super::container::Container;
use super::util;

impl Bitmap {
    /// Creates an empty `Bitmap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    /// let bm = Bitmap::new();
    /// ```
    pub fn new() -> Bitmap {
        Bitmap { containers: Vec::new(), copy_on_write: false }
    }

    /// Creates a `Bitmap` containing every `u32`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    /// let bm = Bitmap::full();
    /// assert_eq!(bm.len(), 1 << 32);
    /// ```
    pub fn full() -> Bitmap {
        Bitmap {
            containers: (0..=u16::MAX).map(Container::full).collect(),
            copy_on_write: false,
        }
    }

    /// Creates a `Bitmap` holding every `step`th value of the range,
    /// starting at its lower bound.
    ///
    /// An empty bitmap is returned when `step` is zero or the range is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm = Bitmap::from_range_step(0..1_000_000, 20);
    /// assert_eq!(bm.len(), 50_000);
    /// assert_eq!(bm.min(), Some(0));
    /// assert_eq!(bm.max(), Some(999_980));
    /// ```
    pub fn from_range_step<R>(range: R, step: u32) -> Bitmap
    where
        R: RangeBounds<u32>,
    {
        let mut bm = Bitmap::new();
        if step == 0 {
            return bm;
        }
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            Err(_) => return bm,
        };
        if step == 1 {
            bm.insert_range(start..=end);
            return bm;
        }
        let mut value = start;
        loop {
            bm.push_unchecked(value);
            match value.checked_add(step) {
                Some(next) if next <= end => value = next,
                _ => break,
            }
        }
        bm
    }

    /// Whether clones of this bitmap share container storage until written to.
    pub fn copy_on_write(&self) -> bool {
        self.copy_on_write
    }

    /// Makes [`Clone`] share container storage between the source and the
    /// copy. A shared container is detached the moment either bitmap writes
    /// to it, so the bitmaps always behave as independent sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::from_iter(0..1000);
    /// bm.set_copy_on_write(true);
    ///
    /// let mut copy = bm.clone();
    /// copy.insert(2000);
    /// assert_eq!(bm.len(), 1000);
    /// assert_eq!(copy.len(), 1001);
    /// ```
    pub fn set_copy_on_write(&mut self, enable: bool) {
        self.copy_on_write = enable;
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was absent from the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.insert(3), true);
    /// assert_eq!(bm.insert(3), false);
    /// assert_eq!(bm.contains(3), true);
    /// ```
    #[inline]
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        let container = match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => &mut self.containers[loc],
            Err(loc) => {
                self.containers.insert(loc, Container::new(key));
                &mut self.containers[loc]
            }
        };
        container.insert(index)
    }

    /// Searches for the container with the given key,
    /// creating it if it doesn't exist.
    ///
    /// Returns the position of the container.
    #[inline]
    pub(crate) fn find_container_by_key(&mut self, key: u16) -> usize {
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => loc,
            Err(loc) => {
                self.containers.insert(loc, Container::new(key));
                loc
            }
        }
    }

    /// Inserts a range of values.
    /// Returns the number of inserted values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert_range(2..4);
    /// assert!(bm.contains(2));
    /// assert!(bm.contains(3));
    /// assert!(!bm.contains(4));
    /// ```
    #[inline]
    pub fn insert_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            Err(_) => return 0,
        };

        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        if start_key == end_key {
            let loc = self.find_container_by_key(start_key);
            return self.containers[loc].insert_range(start_index..=end_index);
        }

        let mut inserted = 0;
        let mut low = start_index;

        // All containers but the last span up to their top value.
        for key in start_key..end_key {
            let loc = self.find_container_by_key(key);
            inserted += self.containers[loc].insert_range(low..=u16::MAX);
            low = 0;
        }

        let loc = self.find_container_by_key(end_key);
        inserted + self.containers[loc].insert_range(0..=end_index)
    }

    /// Pushes `value` in the bitmap only if it is greater than the current
    /// maximum value.
    ///
    /// Returns whether the value was inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert!(bm.push(1));
    /// assert!(bm.push(3));
    /// assert_eq!(bm.push(3), false);
    /// assert!(bm.push(5));
    ///
    /// assert_eq!(bm.iter().collect::<Vec<u32>>(), vec![1, 3, 5]);
    /// ```
    #[inline]
    pub fn push(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);

        match self.containers.last_mut() {
            Some(container) if container.key == key => container.push(index),
            Some(container) if container.key > key => false,
            _otherwise => {
                let mut container = Container::new(key);
                container.push(index);
                self.containers.push(container);
                true
            }
        }
    }

    ///
    /// Pushes `value` at the end of the bitmap.
    /// It is up to the caller to have validated value > self.max()
    ///
    /// # Panics
    ///
    /// If debug_assertions enabled and value is > self.max()
    #[inline]
    pub(crate) fn push_unchecked(&mut self, value: u32) {
        let (key, index) = util::split(value);

        match self.containers.last_mut() {
            Some(container) if container.key == key => container.push_unchecked(index),
            Some(container) if cfg!(debug_assertions) && container.key > key => {
                panic!("last container key > key of value")
            }
            _otherwise => {
                let mut container = Container::new(key);
                container.push_unchecked(index);
                self.containers.push(container);
            }
        }
    }

    /// Removes a value from the set. Returns `true` if the value was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert(3);
    /// assert_eq!(bm.remove(3), true);
    /// assert_eq!(bm.remove(3), false);
    /// assert_eq!(bm.contains(3), false);
    /// ```
    #[inline]
    pub fn remove(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                if self.containers[loc].remove(index) {
                    if self.containers[loc].is_empty() {
                        self.containers.remove(loc);
                    }
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Removes a range of values.
    /// Returns the number of removed values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert(2);
    /// bm.insert(3);
    /// assert_eq!(bm.remove_range(2..4), 2);
    /// ```
    #[inline]
    pub fn remove_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            Err(_) => return 0,
        };

        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        let mut loc = 0;
        let mut removed = 0;
        while loc < self.containers.len() {
            let key = self.containers[loc].key;
            if key > end_key {
                break;
            }
            if key >= start_key {
                let low = if key == start_key { start_index } else { 0 };
                let high = if key == end_key { end_index } else { u16::MAX };
                removed += self.containers[loc].remove_range(low..=high);
                if self.containers[loc].is_empty() {
                    self.containers.remove(loc);
                    continue;
                }
            }
            loc += 1;
        }
        removed
    }

    /// Returns `true` if this set contains the specified integer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert(1);
    /// assert_eq!(bm.contains(0), false);
    /// assert_eq!(bm.contains(1), true);
    /// assert_eq!(bm.contains(100), false);
    /// ```
    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => self.containers[loc].contains(index),
            Err(_) => false,
        }
    }

    /// Returns `true` if all values in the range are present in this set.
    ///
    /// # Examples
    ///
    /// ```
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// // An empty range is always contained
    /// assert!(bm.contains_range(7..7));
    ///
    /// bm.insert_range(1..0xFFF);
    /// assert!(bm.contains_range(1..0xFFF));
    /// assert!(bm.contains_range(2..0xFFF));
    /// // 0 is not contained
    /// assert!(!bm.contains_range(0..2));
    /// ```
    #[inline]
    pub fn contains_range<R>(&self, range: R) -> bool
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            // Empty and invalid ranges are contained in everything.
            Err(_) => return true,
        };
        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        let containers = match self.containers.binary_search_by_key(&start_key, |c| c.key) {
            Ok(loc) => &self.containers[loc..],
            Err(_) => return false,
        };

        if start_key == end_key {
            return containers[0].contains_range(start_index..=end_index);
        }

        // There must be one container per key in the span, with every
        // container between the endpoints completely full.
        let span = usize::from(end_key - start_key);
        let containers = match containers.get(span) {
            Some(c) if c.key == end_key => &containers[..=span],
            _ => return false,
        };

        match containers {
            [first, mid @ .., last] => {
                first.contains_range(start_index..=u16::MAX)
                    && mid.iter().all(Container::is_full)
                    && last.contains_range(0..=end_index)
            }
            _ => unreachable!("span guarantees at least two containers"),
        }
    }

    /// Returns the number of elements in this set which are in the passed
    /// range.
    ///
    /// # Examples
    ///
    /// ```
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert_range(0x10000..0x40000);
    /// bm.insert(0x50001);
    /// bm.insert(u32::MAX);
    ///
    /// assert_eq!(bm.range_cardinality(0..0x10000), 0);
    /// assert_eq!(bm.range_cardinality(0x10000..0x40000), 0x30000);
    /// assert_eq!(bm.range_cardinality(0x50000..=u32::MAX), 2);
    /// ```
    #[inline]
    pub fn range_cardinality<R>(&self, range: R) -> u64
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            Err(_) => return 0,
        };

        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        let mut cardinality = 0;

        let loc = match self.containers.binary_search_by_key(&start_key, |c| c.key) {
            Ok(loc) => {
                let container = &self.containers[loc];
                if start_key == end_key {
                    cardinality += container.rank(end_index);
                } else {
                    cardinality += container.len();
                }
                if start_index != 0 {
                    cardinality -= container.rank(start_index - 1);
                }
                loc + 1
            }
            Err(loc) => loc,
        };
        for container in &self.containers[loc..] {
            match container.key.cmp(&end_key) {
                Ordering::Less => cardinality += container.len(),
                Ordering::Equal => {
                    cardinality += container.rank(end_index);
                    break;
                }
                Ordering::Greater => break,
            }
        }

        cardinality
    }

    /// Adds a value, caching the touched container in `context` so that
    /// streams of nearby values skip the index lookup.
    ///
    /// A context must only ever be used with the bitmap it was first passed
    /// to, and must be discarded once the bitmap is mutated by any other
    /// method.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::{Bitmap, BulkContext};
    ///
    /// let mut bm = Bitmap::new();
    /// let mut context = BulkContext::default();
    /// for value in 0..10_000 {
    ///     bm.insert_bulk(&mut context, value);
    /// }
    /// assert_eq!(bm.len(), 10_000);
    /// ```
    pub fn insert_bulk(&mut self, context: &mut BulkContext, value: u32) -> bool {
        let (key, index) = util::split(value);
        let loc = match context.cached {
            Some((k, loc)) if k == key && self.container_at(loc) == Some(key) => loc,
            _ => {
                let loc = self.find_container_by_key(key);
                context.cached = Some((key, loc));
                loc
            }
        };
        self.containers[loc].insert(index)
    }

    /// Membership test with the same container caching as
    /// [`Bitmap::insert_bulk`].
    pub fn contains_bulk(&self, context: &mut BulkContext, value: u32) -> bool {
        let (key, index) = util::split(value);
        if let Some((k, loc)) = context.cached {
            if k == key && self.container_at(loc) == Some(key) {
                return self.containers[loc].contains(index);
            }
        }
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                context.cached = Some((key, loc));
                self.containers[loc].contains(index)
            }
            Err(_) => false,
        }
    }

    /// Removes a value with the same container caching as
    /// [`Bitmap::insert_bulk`].
    pub fn remove_bulk(&mut self, context: &mut BulkContext, value: u32) -> bool {
        let (key, index) = util::split(value);
        let loc = match context.cached {
            Some((k, loc)) if k == key && self.container_at(loc) == Some(key) => loc,
            _ => match self.containers.binary_search_by_key(&key, |c| c.key) {
                Ok(loc) => {
                    context.cached = Some((key, loc));
                    loc
                }
                Err(_) => return false,
            },
        };
        if self.containers[loc].remove(index) {
            if self.containers[loc].is_empty() {
                self.containers.remove(loc);
                context.cached = None;
            }
            true
        } else {
            false
        }
    }

    fn container_at(&self, loc: usize) -> Option<u16> {
        self.containers.get(loc).map(|c| c.key)
    }

    /// Clears all integers in this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert(1);
    /// bm.clear();
    /// assert_eq!(bm.contains(1), false);
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Returns `true` if there are no integers in this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.is_empty(), true);
    ///
    /// bm.insert(3);
    /// assert_eq!(bm.is_empty(), false);
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns `true` if the set holds every possible integer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm = Bitmap::full();
    /// assert!(!bm.is_empty());
    /// assert!(bm.is_full());
    /// ```
    #[inline]
    pub fn is_full(&self) -> bool {
        self.containers.len() == (u16::MAX as usize + 1)
            && self.containers.iter().all(Container::is_full)
    }

    /// Returns the number of distinct integers in the set.
    ///
    /// Counts in `u64` so that a full bitmap reports 2^32 rather than
    /// wrapping.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.len(), 0);
    ///
    /// bm.insert(3);
    /// bm.insert(4);
    /// assert_eq!(bm.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> u64 {
        self.containers.iter().map(Container::len).sum()
    }

    /// Returns the minimum value in the set (if the set is non-empty).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.min(), None);
    ///
    /// bm.insert(3);
    /// bm.insert(4);
    /// assert_eq!(bm.min(), Some(3));
    /// ```
    #[inline]
    pub fn min(&self) -> Option<u32> {
        self.containers.first().and_then(|head| head.min().map(|min| util::join(head.key, min)))
    }

    /// Returns the maximum value in the set (if the set is non-empty).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.max(), None);
    ///
    /// bm.insert(3);
    /// bm.insert(4);
    /// assert_eq!(bm.max(), Some(4));
    /// ```
    #[inline]
    pub fn max(&self) -> Option<u32> {
        self.containers.last().and_then(|tail| tail.max().map(|max| util::join(tail.key, max)))
    }

    /// Returns the number of integers that are <= value.
    /// `rank(u32::MAX) == len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.rank(0), 0);
    ///
    /// bm.insert(3);
    /// bm.insert(4);
    /// assert_eq!(bm.rank(3), 1);
    /// assert_eq!(bm.rank(10), 2)
    /// ```
    #[inline]
    pub fn rank(&self, value: u32) -> u64 {
        let (key, index) = util::split(value);

        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                // Rank the matched container first while it is still warm
                // from the search.
                self.containers[loc].rank(index)
                    + self.containers[..loc].iter().rev().map(Container::len).sum::<u64>()
            }
            Err(loc) => self.containers[..loc].iter().map(Container::len).sum(),
        }
    }

    /// Returns the `n`th integer in the set or `None` if `n >= len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// assert_eq!(bm.select(0), None);
    ///
    /// bm.append(vec![0, 10, 100]);
    ///
    /// assert_eq!(bm.select(0), Some(0));
    /// assert_eq!(bm.select(1), Some(10));
    /// assert_eq!(bm.select(2), Some(100));
    /// assert_eq!(bm.select(3), None);
    /// ```
    #[inline]
    pub fn select(&self, n: u32) -> Option<u32> {
        let mut n = n as u64;

        for container in &self.containers {
            let len = container.len();
            if len > n {
                return container.select(n as u16).map(|index| util::join(container.key, index));
            }
            n -= len;
        }

        None
    }

    /// Removes the `n` smallest values from this bitmap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::from_iter([1, 5, 7, 9]);
    /// bm.remove_smallest(2);
    /// assert_eq!(bm, Bitmap::from_iter([7, 9]));
    /// ```
    #[inline]
    pub fn remove_smallest(&mut self, mut n: u64) {
        let position = self.containers.iter().position(|container| {
            let container_len = container.len();
            if container_len <= n {
                n -= container_len;
                false
            } else {
                true
            }
        });
        let position = position.unwrap_or(self.containers.len());
        if position > 0 {
            self.containers.drain(..position);
        }
        if n > 0 && !self.containers.is_empty() {
            self.containers[0].remove_smallest(n);
        }
    }

    /// Removes the `n` biggest values from this bitmap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::from_iter([1, 5, 7, 9]);
    /// bm.remove_biggest(2);
    /// assert_eq!(bm, Bitmap::from_iter([1, 5]));
    /// ```
    #[inline]
    pub fn remove_biggest(&mut self, mut n: u64) {
        let position = self.containers.iter().rposition(|container| {
            let container_len = container.len();
            if container_len <= n {
                n -= container_len;
                false
            } else {
                true
            }
        });
        if let Some(position) = position {
            self.containers.drain(position + 1..);
            if n > 0 && !self.containers.is_empty() {
                self.containers[position].remove_biggest(n);
            }
        } else {
            self.containers.clear();
        }
    }

    /// Returns a bitmap holding the values of `self` with the range
    /// complemented.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm = Bitmap::from_iter([1, 3]);
    /// let flipped = bm.flip(0..5);
    /// assert_eq!(flipped, Bitmap::from_iter([0, 2, 4]));
    /// assert_eq!(flipped.flip(0..5), bm);
    /// ```
    pub fn flip<R>(&self, range: R) -> Bitmap
    where
        R: RangeBounds<u32>,
    {
        let mut result = self.clone();
        result.flip_inplace(range);
        result
    }

    /// Complements the values of the range, in place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.flip_inplace(..);
    /// assert!(bm.is_full());
    /// ```
    pub fn flip_inplace<R>(&mut self, range: R)
    where
        R: RangeBounds<u32>,
    {
        let (start, end) = match util::convert_range_to_inclusive(range) {
            Ok(range) => (*range.start(), *range.end()),
            Err(_) => return,
        };

        let (start_key, start_index) = util::split(start);
        let (end_key, end_index) = util::split(end);

        for key in start_key..=end_key {
            let low = if key == start_key { start_index } else { 0 };
            let high = if key == end_key { end_index } else { u16::MAX };
            match self.containers.binary_search_by_key(&key, |c| c.key) {
                Ok(loc) => {
                    self.containers[loc].flip_range(low..=high);
                    if self.containers[loc].is_empty() {
                        self.containers.remove(loc);
                    }
                }
                Err(loc) => {
                    let mut container = Container::new(key);
                    container.insert_range(low..=high);
                    self.containers.insert(loc, container);
                }
            }
        }
    }

    /// Run-compresses every container for which that is a space win.
    ///
    /// Returns whether the bitmap holds at least one run container
    /// afterwards.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm = Bitmap::new();
    /// bm.insert_range(100..1000);
    /// assert!(bm.optimize());
    /// ```
    pub fn optimize(&mut self) -> bool {
        let mut has_run = false;
        for container in &mut self.containers {
            has_run |= container.optimize();
        }
        has_run
    }

    /// Converts every run container back to its flat representation.
    ///
    /// Returns whether any container changed.
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in &mut self.containers {
            changed |= container.remove_run_compression();
        }
        changed
    }

    /// Releases spare backing capacity. Returns the number of bytes freed.
    pub fn shrink_to_fit(&mut self) -> u64 {
        let mut freed = 0;
        for container in &mut self.containers {
            freed += container.shrink_to_fit();
        }
        freed += (self.containers.capacity() - self.containers.len())
            * core::mem::size_of::<Container>();
        self.containers.shrink_to_fit();
        freed as u64
    }
}

/// Remembers the container last touched by the `_bulk` methods of
/// [`Bitmap`], saving the per-call index search while a stream of values
/// stays inside one container.
#[derive(Debug, Default, Clone)]
pub struct BulkContext {
    cached: Option<(u16, usize)>,
}

impl Default for Bitmap {
    fn default() -> Bitmap {
        Bitmap::new()
    }
}

impl Clone for Bitmap {
    fn clone(&self) -> Self {
        let containers = if self.copy_on_write {
            self.containers.iter().map(Container::shared).collect()
        } else {
            self.containers.clone()
        };
        Bitmap { containers, copy_on_write: self.copy_on_write }
    }

    fn clone_from(&mut self, other: &Self) {
        if other.copy_on_write {
            *self = other.clone();
        } else {
            self.containers.clone_from(&other.containers);
            self.copy_on_write = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn insert_range_covers_exactly(
            lo in 0u32..=65535, hi in 65536u32..=131071,
            checks in vec(0u32..=262143, 1000)
        ){
            let r = lo..hi;
            let mut b = Bitmap::new();
            let inserted = b.insert_range(r.clone());
            prop_assert_eq!(inserted, (r.end - r.start) as u64);

            for i in r.clone() {
                prop_assert!(b.contains(i), "does not contain {}", i);
            }

            for i in checks {
                let bitmap_has = b.contains(i);
                let range_has = r.contains(&i);
                prop_assert_eq!(
                    bitmap_has, range_has,
                    "value {} in bitmap={} and range={}",
                    i, bitmap_has, range_has
                );
            }
        }
    }

    #[test]
    fn insert_remove_range_same_container() {
        let mut b = Bitmap::new();
        assert_eq!(b.insert_range(1..5), 4);
        assert_eq!(b.remove_range(2..10), 3);
        assert!(b.contains(1));
        for i in 2..5 {
            assert!(!b.contains(i));
        }
    }

    #[test]
    fn insert_remove_range_across_containers() {
        let mut b = Bitmap::new();
        assert_eq!(b.insert_range(u16::MAX as u32..=u16::MAX as u32 + 1), 2);
        assert_eq!(b.containers.len(), 2);

        assert_eq!(b.remove_range(u16::MAX as u32 + 1..=u16::MAX as u32 + 1), 1);
        assert_eq!(b.containers.len(), 1);

        let mut b = Bitmap::new();
        assert_eq!(b.insert_range(0..(1_u32 << 16) + 1), (1_u64 << 16) + 1);
        assert_eq!(b.containers.len(), 2);
        assert_eq!(b.insert_range(0..(1_u32 << 16) + 1), 0);
    }

    #[test]
    fn flip_empty_to_full() {
        let mut b = Bitmap::new();
        b.flip_inplace(..);
        assert!(b.is_full());
        assert_eq!(b.len(), 1 << 32);
        b.flip_inplace(..);
        assert!(b.is_empty());
    }

    #[test]
    fn flip_partial_containers() {
        let mut b = Bitmap::from_iter([1, 100_000]);
        b.flip_inplace(0..=2);
        assert_eq!(b.iter().collect::<Vec<u32>>(), vec![0, 2, 100_000]);

        // Flipping a span with no container materializes one.
        b.flip_inplace(200_000..200_002);
        assert!(b.contains(200_000));
        assert!(b.contains(200_001));
    }

    #[test]
    fn flip_removes_emptied_containers() {
        let mut b = Bitmap::from_iter([70_000]);
        b.flip_inplace(70_000..70_001);
        assert!(b.is_empty());
        assert_eq!(b.containers.len(), 0);
    }

    #[test]
    fn bulk_insert_and_contains() {
        let mut b = Bitmap::new();
        let mut ctx = BulkContext::default();
        for i in 0..200_000u32 {
            assert!(b.insert_bulk(&mut ctx, i));
        }
        assert_eq!(b.len(), 200_000);

        let mut ctx = BulkContext::default();
        assert!(!b.contains_bulk(&mut ctx, 200_000));
        for i in (0..200_000u32).rev() {
            assert!(b.contains_bulk(&mut ctx, i));
        }

        let mut ctx = BulkContext::default();
        for i in 0..100_000u32 {
            assert!(b.remove_bulk(&mut ctx, i * 2));
        }
        assert_eq!(b.len(), 100_000);
    }

    #[test]
    fn from_range_step_matches_scenario() {
        let b = Bitmap::from_range_step(0..1_000_000, 20);
        assert_eq!(b.len(), 50_000);
        assert_eq!(b.min(), Some(0));
        assert_eq!(b.max(), Some(999_980));
        assert_eq!(b.select(10), Some(200));
        assert_eq!(b.rank(200), 11);

        assert!(Bitmap::from_range_step(0..100, 0).is_empty());
        assert_eq!(Bitmap::from_range_step(5..6, 7), Bitmap::from_iter([5]));
    }

    #[test]
    fn rank_select_on_mixed_containers() {
        let mut b = Bitmap::from_sorted_iter(0..2000).unwrap();
        b.insert_range(200_000..210_000);

        assert_eq!(b.rank(80_000), 2000);
        assert_eq!(b.rank(u32::MAX), 12_000);
        assert_eq!(b.rank(0), 1);
        assert_eq!(b.rank(200_000), 2001);

        assert_eq!(b.select(0), Some(0));
        assert_eq!(b.select(1999), Some(1999));
        assert_eq!(b.select(2000), Some(200_000));
        assert_eq!(b.select(12_000), None);
    }

    #[test]
    fn copy_on_write_clone_shares_until_write() {
        let mut b = Bitmap::from_iter((0..10_000).map(|i| i * 7));
        b.set_copy_on_write(true);

        let mut copy = b.clone();
        assert!(b.containers.iter().all(Container::is_shared));

        copy.insert(3);
        assert_eq!(b.len(), 10_000);
        assert_eq!(copy.len(), 10_001);

        // Only the written container was detached.
        assert_eq!(copy.containers.iter().filter(|c| !c.is_shared()).count(), 1);
    }
}

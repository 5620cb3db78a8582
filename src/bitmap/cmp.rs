use core::borrow::Borrow;
use core::cmp::Ordering;
use core::iter::Peekable;

use super::container::Container;
use crate::Bitmap;

impl Bitmap {
    /// Returns true if the set has no elements in common with other. This
    /// is equivalent to checking for an empty intersection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm1 = Bitmap::new();
    /// let mut bm2 = Bitmap::new();
    ///
    /// bm1.insert(1);
    ///
    /// assert_eq!(bm1.is_disjoint(&bm2), true);
    ///
    /// bm2.insert(1);
    ///
    /// assert_eq!(bm1.is_disjoint(&bm2), false);
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        Pairs::new(&self.containers, &other.containers)
            .filter_map(|(c1, c2)| c1.zip(c2))
            .all(|(c1, c2)| c1.is_disjoint(c2))
    }

    /// Returns `true` if this set is a subset of `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm1 = Bitmap::new();
    /// let mut bm2 = Bitmap::new();
    ///
    /// bm1.insert(1);
    ///
    /// assert_eq!(bm1.is_subset(&bm2), false);
    ///
    /// bm2.insert(1);
    ///
    /// assert_eq!(bm1.is_subset(&bm2), true);
    ///
    /// bm1.insert(2);
    ///
    /// assert_eq!(bm1.is_subset(&bm2), false);
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        for pair in Pairs::new(&self.containers, &other.containers) {
            match pair {
                (None, _) => (),
                (_, None) => return false,
                (Some(c1), Some(c2)) => {
                    if !c1.is_subset(c2) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Returns `true` if this set is a superset of `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let mut bm1 = Bitmap::new();
    /// let mut bm2 = Bitmap::new();
    ///
    /// bm1.insert(1);
    ///
    /// assert_eq!(bm2.is_superset(&bm1), false);
    ///
    /// bm2.insert(1);
    ///
    /// assert_eq!(bm2.is_superset(&bm1), true);
    /// ```
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

/// An iterator over the containers of two bitmaps, paired by key.
///
/// Yields the container with the smallest key from either side, or both
/// when their keys match. The set-algebra loops are all written over it.
pub(crate) struct Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    left: Peekable<I>,
    right: Peekable<J>,
}

impl<I, J, L, R> Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    pub fn new<A, B>(left: A, right: B) -> Pairs<I, J, L, R>
    where
        A: IntoIterator<Item = L, IntoIter = I>,
        B: IntoIterator<Item = R, IntoIter = J>,
    {
        Pairs { left: left.into_iter().peekable(), right: right.into_iter().peekable() }
    }
}

impl<I, J, L, R> Iterator for Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    type Item = (Option<L>, Option<R>);

    fn next(&mut self) -> Option<Self::Item> {
        match (self.left.peek(), self.right.peek()) {
            (None, None) => None,
            (Some(_), None) => Some((self.left.next(), None)),
            (None, Some(_)) => Some((None, self.right.next())),
            (Some(c1), Some(c2)) => match c1.borrow().key.cmp(&c2.borrow().key) {
                Ordering::Equal => Some((self.left.next(), self.right.next())),
                Ordering::Less => Some((self.left.next(), None)),
                Ordering::Greater => Some((None, self.right.next())),
            },
        }
    }
}

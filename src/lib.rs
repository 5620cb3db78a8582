//! A compressed, ordered set of `u32` values.
//!
//! `bellow` stores 32-bit integers in a two-level structure: the high 16 bits
//! of a value select a *container*, and the low 16 bits are kept in whichever
//! of three representations is smallest for the data at hand — a sorted array
//! of `u16`, a 65536-bit bitset, or a list of runs. The serialized form is
//! bit-for-bit compatible with the
//! [Roaring interchange format](https://github.com/RoaringBitmap/RoaringFormatSpec),
//! so bitmaps can be exchanged with the C, Java and Go implementations.
//!
//! ```rust
//! use bellow::Bitmap;
//!
//! let mut bm = Bitmap::new();
//!
//! // insert all primes less than 10
//! bm.insert(2);
//! bm.insert(3);
//! bm.insert(5);
//! bm.insert(7);
//! println!("total bits set to true: {}", bm.len());
//! ```

use core::fmt;

mod bitmap;

pub use bitmap::{
    Bitmap, BulkContext, FrozenError, FrozenIter, FrozenView, IntoIter, Iter, Statistics,
};

/// An error type produced when appending out-of-order values to a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonSortedIntegers {
    valid_until: u64,
}

impl NonSortedIntegers {
    /// Returns the number of elements that were correctly appended before the
    /// first out-of-order element was encountered.
    pub fn valid_until(&self) -> u64 {
        self.valid_until
    }
}

impl fmt::Display for NonSortedIntegers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "integers are ordered up to the {}th element", self.valid_until())
    }
}

impl std::error::Error for NonSortedIntegers {}

/// A [`Iterator::collect`]-like set operation over every bitmap of an iterator.
///
/// All four operations consume the iterator a single time. `union` groups the
/// containers of every operand by key and merges each group through a bitset
/// accumulator, which is considerably faster than folding the binary operator
/// over the sequence.
///
/// # Examples
///
/// ```rust
/// use bellow::{Bitmap, MultiOps};
///
/// let a = Bitmap::from_iter([1, 2, 3]);
/// let b = Bitmap::from_iter([3, 4, 5]);
///
/// assert_eq!([&a, &b].union(), Bitmap::from_iter([1, 2, 3, 4, 5]));
/// assert_eq!([&a, &b].intersection(), Bitmap::from_iter([3]));
/// ```
pub trait MultiOps<T>: IntoIterator<Item = T> {
    /// The type of output from operations.
    type Output;

    /// The `union` between all elements.
    fn union(self) -> Self::Output;

    /// The `intersection` between all elements.
    fn intersection(self) -> Self::Output;

    /// The `difference` between all elements.
    fn difference(self) -> Self::Output;

    /// The `symmetric difference` between all elements.
    fn symmetric_difference(self) -> Self::Output;
}

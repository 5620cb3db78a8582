use core::mem;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use crate::bitmap::container::Container;
use crate::bitmap::Pairs;
use crate::Bitmap;

impl Bitmap {
    /// The cardinality of the intersection with `other`, computed without
    /// materializing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let bm2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(bm1.intersection_len(&bm2), (bm1 & bm2).len());
    /// ```
    pub fn intersection_len(&self, other: &Bitmap) -> u64 {
        Pairs::new(&self.containers, &other.containers)
            .filter_map(|(lhs, rhs)| Some(lhs?.intersection_len(rhs?)))
            .sum()
    }

    /// The cardinality of the union with `other`, computed without
    /// materializing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let bm2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(bm1.union_len(&bm2), (bm1 | bm2).len());
    /// ```
    pub fn union_len(&self, other: &Bitmap) -> u64 {
        self.len() + other.len() - self.intersection_len(other)
    }

    /// The cardinality of the difference with `other`, computed without
    /// materializing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let bm2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(bm1.difference_len(&bm2), (bm1 - bm2).len());
    /// ```
    pub fn difference_len(&self, other: &Bitmap) -> u64 {
        self.len() - self.intersection_len(other)
    }

    /// The cardinality of the symmetric difference with `other`, computed
    /// without materializing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let bm2: Bitmap = (3..5).collect();
    ///
    /// assert_eq!(bm1.symmetric_difference_len(&bm2), (bm1 ^ bm2).len());
    /// ```
    pub fn symmetric_difference_len(&self, other: &Bitmap) -> u64 {
        self.len() + other.len() - 2 * self.intersection_len(other)
    }

    /// The Jaccard index of the two sets: |A ∩ B| / |A ∪ B|.
    ///
    /// Also known as the Tanimoto distance or the Jaccard similarity
    /// coefficient. The index is undefined when both sets are empty; `NaN`
    /// is returned in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (0..8).collect();
    /// let bm2: Bitmap = (4..12).collect();
    ///
    /// assert_eq!(bm1.jaccard_index(&bm2), 4.0 / 12.0);
    /// ```
    pub fn jaccard_index(&self, other: &Bitmap) -> f64 {
        let intersection = self.intersection_len(other);
        let union = self.len() + other.len() - intersection;
        intersection as f64 / union as f64
    }
}

/// Every set operation is the same key-wise walk over two container lists;
/// they differ only in the container-level combinator and in whether a
/// container whose key exists on one side only survives into the result.
impl Bitmap {
    fn merge_with(
        &self,
        rhs: &Bitmap,
        keep_left: bool,
        keep_right: bool,
        combine: impl Fn(&Container, &Container) -> Container,
    ) -> Bitmap {
        let mut containers = Vec::new();

        for pair in Pairs::new(&self.containers, &rhs.containers) {
            match pair {
                (Some(lhs), None) => {
                    if keep_left {
                        containers.push(lhs.clone());
                    }
                }
                (None, Some(rhs)) => {
                    if keep_right {
                        containers.push(rhs.clone());
                    }
                }
                (Some(lhs), Some(rhs)) => {
                    let combined = combine(lhs, rhs);
                    if !combined.is_empty() {
                        containers.push(combined);
                    }
                }
                (None, None) => break,
            }
        }

        Bitmap { containers, copy_on_write: self.copy_on_write && rhs.copy_on_write }
    }

    /// The in-place form of [`Bitmap::merge_with`]: the left operand's
    /// containers move into the result instead of being copied, so only
    /// kept right-hand containers allocate.
    fn merge_assign(
        &mut self,
        rhs: &Bitmap,
        keep_left: bool,
        keep_right: bool,
        combine: impl Fn(&mut Container, &Container),
    ) {
        self.copy_on_write = self.copy_on_write && rhs.copy_on_write;

        for pair in Pairs::new(mem::take(&mut self.containers), &rhs.containers) {
            match pair {
                (Some(lhs), None) => {
                    if keep_left {
                        self.containers.push(lhs);
                    }
                }
                (None, Some(rhs)) => {
                    if keep_right {
                        self.containers.push(rhs.clone());
                    }
                }
                (Some(mut lhs), Some(rhs)) => {
                    combine(&mut lhs, rhs);
                    if !lhs.is_empty() {
                        self.containers.push(lhs);
                    }
                }
                (None, None) => break,
            }
        }
    }
}

macro_rules! impl_set_op {
    ($op:ident :: $method:ident, $op_assign:ident :: $method_assign:ident,
     $doc:literal, keep_left: $keep_left:expr, keep_right: $keep_right:expr) => {
        impl $op<&Bitmap> for &Bitmap {
            type Output = Bitmap;

            #[doc = $doc]
            fn $method(self, rhs: &Bitmap) -> Bitmap {
                self.merge_with(rhs, $keep_left, $keep_right, |lhs, rhs| $op::$method(lhs, rhs))
            }
        }

        impl $op<Bitmap> for &Bitmap {
            type Output = Bitmap;

            #[doc = $doc]
            fn $method(self, rhs: Bitmap) -> Bitmap {
                $op::$method(self, &rhs)
            }
        }

        impl $op<&Bitmap> for Bitmap {
            type Output = Bitmap;

            #[doc = $doc]
            fn $method(mut self, rhs: &Bitmap) -> Bitmap {
                $op_assign::$method_assign(&mut self, rhs);
                self
            }
        }

        impl $op<Bitmap> for Bitmap {
            type Output = Bitmap;

            #[doc = $doc]
            fn $method(mut self, rhs: Bitmap) -> Bitmap {
                $op_assign::$method_assign(&mut self, &rhs);
                self
            }
        }

        impl $op_assign<&Bitmap> for Bitmap {
            #[doc = $doc]
            fn $method_assign(&mut self, rhs: &Bitmap) {
                self.merge_assign(rhs, $keep_left, $keep_right, |lhs, rhs| {
                    $op_assign::$method_assign(lhs, rhs)
                });
            }
        }

        impl $op_assign<Bitmap> for Bitmap {
            #[doc = $doc]
            fn $method_assign(&mut self, rhs: Bitmap) {
                $op_assign::$method_assign(self, &rhs);
            }
        }
    };
}

impl_set_op!(BitOr::bitor, BitOrAssign::bitor_assign,
    "An `union` between two sets.",
    keep_left: true, keep_right: true);
impl_set_op!(BitAnd::bitand, BitAndAssign::bitand_assign,
    "An `intersection` between two sets.",
    keep_left: false, keep_right: false);
impl_set_op!(Sub::sub, SubAssign::sub_assign,
    "A `difference` between two sets.",
    keep_left: true, keep_right: false);
impl_set_op!(BitXor::bitxor, BitXorAssign::bitxor_assign,
    "A `symmetric difference` between two sets.",
    keep_left: true, keep_right: true);

mod container;
mod cow;
mod fmt;
mod multiops;
mod store;
mod util;

// Order of these modules matters as it determines the `impl` blocks order in
// the docs
mod cmp;
mod inherent;
mod iter;
mod ops;
mod serialization;

mod frozen;
mod statistics;

use self::cmp::Pairs;
pub use self::frozen::{FrozenError, FrozenIter, FrozenView};
pub use self::inherent::BulkContext;
pub use self::iter::IntoIter;
pub use self::iter::Iter;
pub use self::statistics::Statistics;

/// A compressed, ordered set of `u32` values.
///
/// The values are split by their high 16 bits into containers, each stored
/// as whichever of a sorted array, a bitset, or a run list is smallest.
///
/// # Examples
///
/// ```rust
/// use bellow::Bitmap;
///
/// let mut bm = Bitmap::new();
///
/// // insert all primes less than 10
/// bm.insert(2);
/// bm.insert(3);
/// bm.insert(5);
/// bm.insert(7);
/// println!("total bits set to true: {}", bm.len());
/// ```
pub struct Bitmap {
    containers: Vec<container::Container>,
    copy_on_write: bool,
}

impl PartialEq for Bitmap {
    /// Two bitmaps are equal when they hold the same values; the container
    /// representations and the copy-on-write flag play no part.
    fn eq(&self, other: &Self) -> bool {
        self.containers == other.containers
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Bitmap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct BitmapVisitor;

        impl<'de> serde::de::Visitor<'de> for BitmapVisitor {
            type Value = Bitmap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a serialized bitmap")
            }

            fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Bitmap, E>
            where
                E: serde::de::Error,
            {
                Bitmap::deserialize_from(bytes).map_err(serde::de::Error::custom)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Bitmap, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes: Vec<u8> = Vec::new();
                while let Some(el) = seq.next_element()? {
                    bytes.push(el);
                }
                Bitmap::deserialize_from(&*bytes).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(BitmapVisitor)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Bitmap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut buf = Vec::with_capacity(self.serialized_size());
        self.serialize_into(&mut buf).map_err(serde::ser::Error::custom)?;

        serializer.serialize_bytes(&buf)
    }
}

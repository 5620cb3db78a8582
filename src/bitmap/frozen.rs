use byteorder::{LittleEndian, WriteBytesExt};
use core::fmt::{Display, Formatter};
use core::slice;
use std::io;

use super::container::{Container, ARRAY_LIMIT};
use super::store::{ArrayStore, BitsetStore, Interval, RunStore, Store, BITSET_BYTES, BITSET_WORDS};
use super::util;
use crate::Bitmap;

pub(crate) const FROZEN_COOKIE: u32 = 0x35C6_B0CA;
pub(crate) const FROZEN_BYTE_ALIGNMENT: usize = 32;
const FROZEN_DESCRIPTOR_BYTES: usize = 12;

const TAG_ARRAY: u8 = 1;
const TAG_BITSET: u8 = 2;
const TAG_RUN: u8 = 3;

/// A failure to overlay a [`FrozenView`] on a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrozenError {
    /// The buffer does not start on a 32-byte boundary.
    Misaligned,
    /// The buffer ends before the layout it describes does.
    UnexpectedEnd,
    /// The buffer does not start with the frozen cookie.
    BadCookie,
    /// A descriptor or container body is inconsistent.
    Invalid(&'static str),
}

impl Display for FrozenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            FrozenError::Misaligned => {
                write!(f, "buffer is not aligned to {FROZEN_BYTE_ALIGNMENT} bytes")
            }
            FrozenError::UnexpectedEnd => write!(f, "buffer is truncated"),
            FrozenError::BadCookie => write!(f, "unknown cookie value"),
            FrozenError::Invalid(what) => write!(f, "invalid frozen bitmap: {what}"),
        }
    }
}

impl std::error::Error for FrozenError {}

fn frozen_body_size(container: &Container) -> usize {
    match container.store() {
        Store::Array(vec) => vec.byte_size(),
        Store::Bitset(_) => BITSET_BYTES,
        Store::Run(runs) => runs.byte_size(),
    }
}

fn align_up(offset: usize) -> usize {
    (offset + FROZEN_BYTE_ALIGNMENT - 1) / FROZEN_BYTE_ALIGNMENT * FROZEN_BYTE_ALIGNMENT
}

impl Bitmap {
    /// The exact number of bytes [`Bitmap::freeze_into`] will write for
    /// this bitmap.
    pub fn frozen_size(&self) -> usize {
        let mut size = 8 + FROZEN_DESCRIPTOR_BYTES * self.containers.len();
        for container in &self.containers {
            size = align_up(size);
            size += frozen_body_size(container);
        }
        size
    }

    /// Writes the bitmap in the frozen layout: a descriptor table followed
    /// by the raw container bodies, each aligned to 32 bytes.
    ///
    /// A buffer holding these bytes — typically a memory-mapped file — can
    /// be overlaid by [`FrozenView::new`] without copying the bodies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::{Bitmap, FrozenView};
    ///
    /// let bitmap = Bitmap::from_iter(0..1000);
    ///
    /// # #[repr(align(32))] struct Aligned([u8; 4096]);
    /// # let mut backing = Aligned([0; 4096]);
    /// # let n = bitmap.frozen_size();
    /// # let mut bytes = &mut backing.0[..n];
    /// bitmap.freeze_into(&mut bytes[..]).unwrap();
    /// let view = FrozenView::new(&backing.0[..n]).unwrap();
    /// assert_eq!(view.len(), 1000);
    /// assert!(view.contains(999));
    /// ```
    pub fn freeze_into<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(FROZEN_COOKIE)?;
        writer.write_u32::<LittleEndian>(self.containers.len() as u32)?;

        let mut offset = 8 + FROZEN_DESCRIPTOR_BYTES * self.containers.len();
        for container in &self.containers {
            offset = align_up(offset);
            writer.write_u16::<LittleEndian>(container.key)?;
            writer.write_u16::<LittleEndian>((container.len() - 1) as u16)?;
            let tag = match container.store() {
                Store::Array(_) => TAG_ARRAY,
                Store::Bitset(_) => TAG_BITSET,
                Store::Run(_) => TAG_RUN,
            };
            writer.write_all(&[tag, 0, 0, 0])?;
            writer.write_u32::<LittleEndian>(offset as u32)?;
            offset += frozen_body_size(container);
        }

        let mut written = 8 + FROZEN_DESCRIPTOR_BYTES * self.containers.len();
        for container in &self.containers {
            let padding = align_up(written) - written;
            writer.write_all(&[0u8; FROZEN_BYTE_ALIGNMENT][..padding])?;
            written += padding;

            match container.store() {
                Store::Array(vec) => {
                    for &value in vec.iter() {
                        writer.write_u16::<LittleEndian>(value)?;
                    }
                }
                Store::Bitset(bits) => {
                    for &word in bits.as_array() {
                        writer.write_u64::<LittleEndian>(word)?;
                    }
                }
                Store::Run(runs) => {
                    writer.write_u16::<LittleEndian>(runs.n_runs() as u16)?;
                    for iv in runs.as_slice() {
                        writer.write_u16::<LittleEndian>(iv.start)?;
                        writer.write_u16::<LittleEndian>(iv.end - iv.start)?;
                    }
                }
            }
            written += frozen_body_size(container);
        }

        Ok(())
    }
}

#[derive(Debug)]
enum FrozenStore<'a> {
    Array(&'a [u16]),
    Bitset(&'a [u64; BITSET_WORDS]),
    Run(&'a [[u16; 2]]),
}

#[derive(Debug)]
struct FrozenContainer<'a> {
    key: u16,
    len: u64,
    store: FrozenStore<'a>,
}

/// A read-only bitmap overlaid on externally owned bytes in the frozen
/// layout, typically a memory-mapped file.
///
/// The container bodies are used in place; only the descriptor table is
/// decoded up front. Dropping the view leaves the backing bytes untouched.
///
/// All multi-byte values of the layout are little-endian, like the
/// serialized formats; accessors convert on targets where that is not the
/// native order.
#[derive(Debug)]
pub struct FrozenView<'a> {
    containers: Vec<FrozenContainer<'a>>,
}

impl<'a> FrozenView<'a> {
    /// Validates `bytes` and overlays a bitmap view on them.
    ///
    /// The buffer must be aligned to 32 bytes and hold the exact layout
    /// written by [`Bitmap::freeze_into`]; anything else — misalignment,
    /// truncation, disordered keys or offsets, or a body inconsistent with
    /// its declared cardinality — is rejected.
    pub fn new(bytes: &'a [u8]) -> Result<FrozenView<'a>, FrozenError> {
        if bytes.as_ptr() as usize % FROZEN_BYTE_ALIGNMENT != 0 {
            return Err(FrozenError::Misaligned);
        }
        if bytes.len() < 8 {
            return Err(FrozenError::UnexpectedEnd);
        }
        if read_u32(bytes, 0) != FROZEN_COOKIE {
            return Err(FrozenError::BadCookie);
        }
        let size = read_u32(bytes, 4) as usize;
        if size > u16::MAX as usize + 1 {
            return Err(FrozenError::Invalid("size is greater than supported"));
        }
        let descriptors_end = 8 + FROZEN_DESCRIPTOR_BYTES * size;
        if bytes.len() < descriptors_end {
            return Err(FrozenError::UnexpectedEnd);
        }

        let mut containers = Vec::with_capacity(size);
        let mut previous_key = None;
        let mut previous_end = descriptors_end;

        for i in 0..size {
            let descriptor = 8 + FROZEN_DESCRIPTOR_BYTES * i;
            let key = read_u16(bytes, descriptor);
            let len = u64::from(read_u16(bytes, descriptor + 2)) + 1;
            let tag = bytes[descriptor + 4];
            let offset = read_u32(bytes, descriptor + 8) as usize;

            if previous_key.map_or(false, |previous| previous >= key) {
                return Err(FrozenError::Invalid("container keys are not sorted"));
            }
            previous_key = Some(key);

            if offset % FROZEN_BYTE_ALIGNMENT != 0 || offset < previous_end {
                return Err(FrozenError::Invalid("container offsets are not in layout order"));
            }

            let store = match tag {
                TAG_ARRAY => {
                    if len > ARRAY_LIMIT {
                        return Err(FrozenError::Invalid("array cardinality above threshold"));
                    }
                    let body = body_slice(bytes, offset, len as usize * 2)?;
                    let values: &[u16] = bytemuck::try_cast_slice(body)
                        .map_err(|_| FrozenError::Invalid("array body misaligned"))?;
                    if !values.windows(2).all(|w| u16::from_le(w[0]) < u16::from_le(w[1])) {
                        return Err(FrozenError::Invalid("array values are not sorted"));
                    }
                    previous_end = offset + body.len();
                    FrozenStore::Array(values)
                }
                TAG_BITSET => {
                    let body = body_slice(bytes, offset, BITSET_BYTES)?;
                    let words: &[u64] = bytemuck::try_cast_slice(body)
                        .map_err(|_| FrozenError::Invalid("bitset body misaligned"))?;
                    let words: &[u64; BITSET_WORDS] = words.try_into().unwrap();
                    let actual: u64 = words.iter().map(|w| w.count_ones() as u64).sum();
                    if actual != len {
                        return Err(FrozenError::Invalid(
                            "declared cardinality does not match bitset content",
                        ));
                    }
                    previous_end = offset + BITSET_BYTES;
                    FrozenStore::Bitset(words)
                }
                TAG_RUN => {
                    let header = body_slice(bytes, offset, 2)?;
                    let n_runs = u16::from_le_bytes([header[0], header[1]]) as usize;
                    let body = body_slice(bytes, offset + 2, n_runs * 4)?;
                    let pairs: &[[u16; 2]] = bytemuck::try_cast_slice(body)
                        .map_err(|_| FrozenError::Invalid("run body misaligned"))?;

                    let mut total = 0u64;
                    let mut previous_end_value: Option<u32> = None;
                    for pair in pairs {
                        let start = u32::from(u16::from_le(pair[0]));
                        let end = start + u32::from(u16::from_le(pair[1]));
                        if end > u32::from(u16::MAX) {
                            return Err(FrozenError::Invalid("run exceeds the container"));
                        }
                        if previous_end_value.map_or(false, |previous| start <= previous + 1) {
                            return Err(FrozenError::Invalid("runs overlap or are not sorted"));
                        }
                        previous_end_value = Some(end);
                        total += u64::from(end - start) + 1;
                    }
                    if total != len {
                        return Err(FrozenError::Invalid(
                            "declared cardinality does not match run content",
                        ));
                    }
                    previous_end = offset + 2 + n_runs * 4;
                    FrozenStore::Run(pairs)
                }
                _ => return Err(FrozenError::Invalid("unknown container type")),
            };

            containers.push(FrozenContainer { key, len, store });
        }

        Ok(FrozenView { containers })
    }

    /// Returns the number of distinct integers in the view.
    pub fn len(&self) -> u64 {
        self.containers.iter().map(|c| c.len).sum()
    }

    /// Returns `true` if the view holds no integers.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns `true` if the view contains the specified integer.
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => self.containers[loc].store.contains(index),
            Err(_) => false,
        }
    }

    /// Returns the minimum value in the view (if the view is non-empty).
    pub fn min(&self) -> Option<u32> {
        self.containers.first().and_then(|c| c.store.min().map(|min| util::join(c.key, min)))
    }

    /// Returns the maximum value in the view (if the view is non-empty).
    pub fn max(&self) -> Option<u32> {
        self.containers.last().and_then(|c| c.store.max().map(|max| util::join(c.key, max)))
    }

    /// Returns the number of integers that are <= value.
    pub fn rank(&self, value: u32) -> u64 {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                self.containers[loc].store.rank(index)
                    + self.containers[..loc].iter().map(|c| c.len).sum::<u64>()
            }
            Err(loc) => self.containers[..loc].iter().map(|c| c.len).sum(),
        }
    }

    /// Returns the `n`th integer in the view or `None` if `n >= len()`.
    pub fn select(&self, n: u32) -> Option<u32> {
        let mut n = n as u64;
        for container in &self.containers {
            if container.len > n {
                return container.store.select(n as u16).map(|i| util::join(container.key, i));
            }
            n -= container.len;
        }
        None
    }

    /// Iterator over each value of the view, in ascending order.
    pub fn iter(&self) -> FrozenIter<'a, '_> {
        FrozenIter { front: None, containers: self.containers.iter() }
    }

    /// Copies the view into an owned, mutable [`Bitmap`].
    pub fn to_bitmap(&self) -> Bitmap {
        let containers = self
            .containers
            .iter()
            .map(|c| {
                let store = match c.store {
                    FrozenStore::Array(values) => {
                        let values = values.iter().map(|&v| u16::from_le(v)).collect();
                        Store::Array(ArrayStore::from_vec_unchecked(values))
                    }
                    FrozenStore::Bitset(words) => {
                        let mut owned = Box::new([0u64; BITSET_WORDS]);
                        for (dst, &src) in owned.iter_mut().zip(words.iter()) {
                            *dst = u64::from_le(src);
                        }
                        Store::Bitset(BitsetStore::from_unchecked(c.len, owned))
                    }
                    FrozenStore::Run(pairs) => {
                        let intervals = pairs
                            .iter()
                            .map(|pair| {
                                let start = u16::from_le(pair[0]);
                                Interval { start, end: start + u16::from_le(pair[1]) }
                            })
                            .collect();
                        Store::Run(RunStore::from_vec_unchecked(intervals))
                    }
                };
                Container::from_store(c.key, store)
            })
            .collect();
        Bitmap { containers, copy_on_write: false }
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn body_slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], FrozenError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(FrozenError::UnexpectedEnd)
}

impl<'a> FrozenStore<'a> {
    fn contains(&self, index: u16) -> bool {
        match self {
            FrozenStore::Array(values) => {
                values.binary_search_by_key(&index, |&v| u16::from_le(v)).is_ok()
            }
            FrozenStore::Bitset(words) => {
                u64::from_le(words[usize::from(index) / 64]) & (1 << (index % 64)) != 0
            }
            FrozenStore::Run(pairs) => pairs
                .binary_search_by(|pair| {
                    let start = u16::from_le(pair[0]);
                    let end = start + u16::from_le(pair[1]);
                    if end < index {
                        core::cmp::Ordering::Less
                    } else if start > index {
                        core::cmp::Ordering::Greater
                    } else {
                        core::cmp::Ordering::Equal
                    }
                })
                .is_ok(),
        }
    }

    fn min(&self) -> Option<u16> {
        match self {
            FrozenStore::Array(values) => values.first().map(|&v| u16::from_le(v)),
            FrozenStore::Bitset(words) => words
                .iter()
                .map(|&w| u64::from_le(w))
                .enumerate()
                .find(|&(_, w)| w != 0)
                .map(|(i, w)| (i * 64 + w.trailing_zeros() as usize) as u16),
            FrozenStore::Run(pairs) => pairs.first().map(|pair| u16::from_le(pair[0])),
        }
    }

    fn max(&self) -> Option<u16> {
        match self {
            FrozenStore::Array(values) => values.last().map(|&v| u16::from_le(v)),
            FrozenStore::Bitset(words) => words
                .iter()
                .map(|&w| u64::from_le(w))
                .enumerate()
                .rev()
                .find(|&(_, w)| w != 0)
                .map(|(i, w)| (i * 64 + 63 - w.leading_zeros() as usize) as u16),
            FrozenStore::Run(pairs) => {
                pairs.last().map(|pair| u16::from_le(pair[0]) + u16::from_le(pair[1]))
            }
        }
    }

    fn rank(&self, index: u16) -> u64 {
        match self {
            FrozenStore::Array(values) => {
                values.partition_point(|&v| u16::from_le(v) <= index) as u64
            }
            FrozenStore::Bitset(words) => {
                let key = usize::from(index) / 64;
                let bit = usize::from(index) % 64;
                words[..key].iter().map(|&w| u64::from_le(w).count_ones() as u64).sum::<u64>()
                    + (u64::from_le(words[key]) << (63 - bit)).count_ones() as u64
            }
            FrozenStore::Run(pairs) => {
                let mut rank = 0;
                for pair in pairs.iter() {
                    let start = u16::from_le(pair[0]);
                    let end = start + u16::from_le(pair[1]);
                    if start > index {
                        break;
                    }
                    rank += u64::from(end.min(index) - start) + 1;
                }
                rank
            }
        }
    }

    fn select(&self, n: u16) -> Option<u16> {
        match self {
            FrozenStore::Array(values) => values.get(usize::from(n)).map(|&v| u16::from_le(v)),
            FrozenStore::Bitset(words) => {
                let mut n = u64::from(n);
                for (key, word) in words.iter().map(|&w| u64::from_le(w)).enumerate() {
                    let weight = word.count_ones() as u64;
                    if n < weight {
                        let mut word = word;
                        for _ in 0..n {
                            word &= word - 1;
                        }
                        return Some((64 * key) as u16 + word.trailing_zeros() as u16);
                    }
                    n -= weight;
                }
                None
            }
            FrozenStore::Run(pairs) => {
                let mut n = u64::from(n);
                for pair in pairs.iter() {
                    let start = u16::from_le(pair[0]);
                    let run_len = u64::from(u16::from_le(pair[1])) + 1;
                    if n < run_len {
                        return Some(start + n as u16);
                    }
                    n -= run_len;
                }
                None
            }
        }
    }

    fn iter(&self) -> FrozenStoreIter<'a> {
        match *self {
            FrozenStore::Array(values) => FrozenStoreIter::Array(values.iter()),
            FrozenStore::Bitset(words) => {
                FrozenStoreIter::Bitset { words, key: 0, word: u64::from_le(words[0]) }
            }
            FrozenStore::Run(pairs) => FrozenStoreIter::Run { pairs, index: 0, offset: 0 },
        }
    }
}

enum FrozenStoreIter<'a> {
    Array(slice::Iter<'a, u16>),
    Bitset { words: &'a [u64; BITSET_WORDS], key: usize, word: u64 },
    Run { pairs: &'a [[u16; 2]], index: usize, offset: u32 },
}

impl Iterator for FrozenStoreIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            FrozenStoreIter::Array(inner) => inner.next().map(|&v| u16::from_le(v)),
            FrozenStoreIter::Bitset { words, key, word } => {
                while *word == 0 {
                    *key += 1;
                    if *key == BITSET_WORDS {
                        return None;
                    }
                    *word = u64::from_le(words[*key]);
                }
                let bit = word.trailing_zeros() as usize;
                *word &= *word - 1;
                Some((64 * *key + bit) as u16)
            }
            FrozenStoreIter::Run { pairs, index, offset } => {
                let pair = pairs.get(*index)?;
                let value = u32::from(u16::from_le(pair[0])) + *offset;
                if *offset < u32::from(u16::from_le(pair[1])) {
                    *offset += 1;
                } else {
                    *index += 1;
                    *offset = 0;
                }
                Some(value as u16)
            }
        }
    }
}

/// An iterator over the values of a [`FrozenView`], in ascending order.
pub struct FrozenIter<'a, 'v> {
    front: Option<(u16, FrozenStoreIter<'a>)>,
    containers: slice::Iter<'v, FrozenContainer<'a>>,
}

impl Iterator for FrozenIter<'_, '_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            if let Some((key, iter)) = &mut self.front {
                if let Some(index) = iter.next() {
                    return Some(util::join(*key, index));
                }
                self.front = None;
            }
            let container = self.containers.next()?;
            self.front = Some((container.key, container.store.iter()));
        }
    }
}

impl PartialEq for FrozenView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl PartialEq<Bitmap> for FrozenView<'_> {
    fn eq(&self, other: &Bitmap) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl PartialEq<FrozenView<'_>> for Bitmap {
    fn eq(&self, other: &FrozenView<'_>) -> bool {
        other == self
    }
}

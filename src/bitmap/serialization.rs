use bytemuck::cast_slice_mut;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use core::convert::Infallible;
use std::error::Error;
use std::io;

use crate::bitmap::container::{Container, ARRAY_LIMIT};
use crate::bitmap::store::{
    ArrayStore, BitsetStore, Interval, RunStore, Store, BITSET_BYTES, BITSET_WORDS,
};
use crate::Bitmap;

pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
pub const SERIAL_COOKIE: u16 = 12347;
pub const NO_OFFSET_THRESHOLD: usize = 4;

// Sizes of header structures
pub const DESCRIPTION_BYTES: usize = 4;
pub const OFFSET_BYTES: usize = 4;

// Leading type tags of the native format
const NATIVE_ARRAY: u8 = 1;
const NATIVE_PORTABLE: u8 = 2;

fn body_size(container: &Container) -> usize {
    match container.store() {
        Store::Array(vec) => vec.byte_size(),
        Store::Bitset(_) => BITSET_BYTES,
        Store::Run(runs) => runs.byte_size(),
    }
}

impl Bitmap {
    /// Return the size in bytes of the serialized output.
    /// This is compatible with the official C/C++, Java and Go
    /// implementations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let mut bytes = Vec::with_capacity(bm1.serialized_size());
    /// bm1.serialize_into(&mut bytes).unwrap();
    /// let bm2 = Bitmap::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(bm1, bm2);
    /// ```
    pub fn serialized_size(&self) -> usize {
        let n = self.containers.len();
        let has_runs = self.containers.iter().any(|c| matches!(c.store(), Store::Run(_)));

        let mut size = if has_runs {
            // Cookie with the container count folded in, plus the run
            // marker bitset; the offset table is only present past the
            // threshold.
            let mut size = 4 + (n + 7) / 8 + DESCRIPTION_BYTES * n;
            if n >= NO_OFFSET_THRESHOLD {
                size += OFFSET_BYTES * n;
            }
            size
        } else {
            4 + 4 + (DESCRIPTION_BYTES + OFFSET_BYTES) * n
        };

        size += self.containers.iter().map(body_size).sum::<usize>();
        size
    }

    /// Serialize this bitmap into [the standard Roaring on-disk
    /// format][format]. This is compatible with the official C/C++, Java
    /// and Go implementations.
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// bm1.serialize_into(&mut bytes).unwrap();
    /// let bm2 = Bitmap::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(bm1, bm2);
    /// ```
    pub fn serialize_into<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        let n = self.containers.len();
        let has_runs = self.containers.iter().any(|c| matches!(c.store(), Store::Run(_)));

        let mut offset;
        if has_runs {
            writer.write_u32::<LittleEndian>(
                u32::from(SERIAL_COOKIE) | ((n as u32 - 1) << 16),
            )?;

            let mut markers = vec![0u8; (n + 7) / 8];
            for (i, container) in self.containers.iter().enumerate() {
                if matches!(container.store(), Store::Run(_)) {
                    markers[i / 8] |= 1 << (i % 8);
                }
            }
            writer.write_all(&markers)?;

            offset = 4 + markers.len() as u32 + (DESCRIPTION_BYTES * n) as u32;
            if n >= NO_OFFSET_THRESHOLD {
                offset += (OFFSET_BYTES * n) as u32;
            }
        } else {
            writer.write_u32::<LittleEndian>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
            writer.write_u32::<LittleEndian>(n as u32)?;
            offset = (4 + 4 + (DESCRIPTION_BYTES + OFFSET_BYTES) * n) as u32;
        }

        for container in &self.containers {
            writer.write_u16::<LittleEndian>(container.key)?;
            writer.write_u16::<LittleEndian>((container.len() - 1) as u16)?;
        }

        if !has_runs || n >= NO_OFFSET_THRESHOLD {
            for container in &self.containers {
                writer.write_u32::<LittleEndian>(offset)?;
                offset += body_size(container) as u32;
            }
        }

        for container in &self.containers {
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
        }

        Ok(())
    }

    /// Deserialize a bitmap into memory from [the standard Roaring on-disk
    /// format][format]. This is compatible with the official C/C++, Java
    /// and Go implementations. This method checks that all of the internal
    /// values are valid: every read is bounded, and malformed input of any
    /// kind (truncation, bad cookies, misdeclared cardinalities, unsorted
    /// values, broken run lists) is rejected with an error. If
    /// deserializing from a trusted source consider
    /// [`Bitmap::deserialize_unchecked_from`].
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// bm1.serialize_into(&mut bytes).unwrap();
    /// let bm2 = Bitmap::deserialize_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(bm1, bm2);
    /// ```
    pub fn deserialize_from<R: io::Read>(reader: R) -> io::Result<Bitmap> {
        Bitmap::deserialize_from_impl(
            reader,
            true,
            ArrayStore::try_from,
            BitsetStore::try_from,
            RunStore::try_from,
        )
    }

    /// Deserialize a bitmap into memory from [the standard Roaring on-disk
    /// format][format]. This is compatible with the official C/C++, Java
    /// and Go implementations. This method is memory safe, but the
    /// container invariants are taken on faith: feeding it malformed input
    /// produces an unspecified bitmap whose operations return unspecified
    /// results.
    ///
    /// [format]: https://github.com/RoaringBitmap/RoaringFormatSpec
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1: Bitmap = (1..4).collect();
    /// let mut bytes = vec![];
    /// bm1.serialize_into(&mut bytes).unwrap();
    /// let bm2 = Bitmap::deserialize_unchecked_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(bm1, bm2);
    /// ```
    pub fn deserialize_unchecked_from<R: io::Read>(reader: R) -> io::Result<Bitmap> {
        Bitmap::deserialize_from_impl::<R, _, Infallible, _, Infallible, _, Infallible>(
            reader,
            false,
            |values| Ok(ArrayStore::from_vec_unchecked(values)),
            |len, values| Ok(BitsetStore::from_unchecked(len, values)),
            |intervals| Ok(RunStore::from_vec_unchecked(intervals)),
        )
    }

    /// Return the size in bytes of the native serialized output.
    pub fn native_serialized_size(&self) -> usize {
        1 + self.native_array_size().unwrap_or(usize::MAX).min(self.serialized_size())
    }

    // The sparse short form: a count followed by the raw values. Only
    // worth it (and only representable) for small sets.
    fn native_array_size(&self) -> Option<usize> {
        let card = u32::try_from(self.len()).ok()?;
        (card as usize).checked_mul(4)?.checked_add(4)
    }

    /// Serialize this bitmap into the native format: a one-byte type tag
    /// followed by either a plain sorted `u32` array (when the set is small
    /// enough for that to win) or the portable format.
    ///
    /// The output is smaller than [`Bitmap::serialize_into`] for sparse
    /// bitmaps, but only this crate reads it. Use the portable format to
    /// interoperate with other implementations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bellow::Bitmap;
    ///
    /// let bm1 = Bitmap::from_iter([7u32, 8, 9]);
    /// let mut bytes = Vec::with_capacity(bm1.native_serialized_size());
    /// bm1.serialize_native_into(&mut bytes).unwrap();
    /// let bm2 = Bitmap::deserialize_native_from(&bytes[..]).unwrap();
    ///
    /// assert_eq!(bm1, bm2);
    /// ```
    pub fn serialize_native_into<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        match self.native_array_size() {
            Some(array_size) if array_size < self.serialized_size() => {
                writer.write_u8(NATIVE_ARRAY)?;
                writer.write_u32::<LittleEndian>(self.len() as u32)?;
                for value in self.iter() {
                    writer.write_u32::<LittleEndian>(value)?;
                }
                Ok(())
            }
            _ => {
                writer.write_u8(NATIVE_PORTABLE)?;
                self.serialize_into(writer)
            }
        }
    }

    /// Deserialize a bitmap from the native format written by
    /// [`Bitmap::serialize_native_into`], validating the input.
    pub fn deserialize_native_from<R: io::Read>(mut reader: R) -> io::Result<Bitmap> {
        match reader.read_u8()? {
            NATIVE_ARRAY => {
                let card = reader.read_u32::<LittleEndian>()? as usize;
                let mut bitmap = Bitmap::new();
                let mut previous = None;
                for _ in 0..card {
                    let value = reader.read_u32::<LittleEndian>()?;
                    if previous.map_or(false, |previous| previous >= value) {
                        return Err(invalid_data("array values are not sorted"));
                    }
                    previous = Some(value);
                    bitmap.push_unchecked(value);
                }
                Ok(bitmap)
            }
            NATIVE_PORTABLE => Bitmap::deserialize_from(reader),
            _ => Err(invalid_data("unknown type tag")),
        }
    }

    fn deserialize_from_impl<R, A, AErr, B, BErr, C, CErr>(
        mut reader: R,
        strict: bool,
        a: A,
        b: B,
        c: C,
    ) -> io::Result<Bitmap>
    where
        R: io::Read,
        A: Fn(Vec<u16>) -> Result<ArrayStore, AErr>,
        AErr: Error + Send + Sync + 'static,
        B: Fn(u64, Box<[u64; BITSET_WORDS]>) -> Result<BitsetStore, BErr>,
        BErr: Error + Send + Sync + 'static,
        C: Fn(Vec<Interval>) -> Result<RunStore, CErr>,
        CErr: Error + Send + Sync + 'static,
    {
        // The cookie decides which variant of the format follows.
        let (size, has_offsets, has_run_containers) = {
            let cookie = reader.read_u32::<LittleEndian>()?;
            if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
                (reader.read_u32::<LittleEndian>()? as usize, true, false)
            } else if (cookie as u16) == SERIAL_COOKIE {
                let size = ((cookie >> 16) + 1) as usize;
                (size, size >= NO_OFFSET_THRESHOLD, true)
            } else {
                return Err(invalid_data("unknown cookie value"));
            }
        };

        let run_container_markers = if has_run_containers {
            let mut markers = vec![0u8; (size + 7) / 8];
            reader.read_exact(&mut markers)?;
            Some(markers)
        } else {
            None
        };

        if size > u16::MAX as usize + 1 {
            return Err(invalid_data("size is greater than supported"));
        }

        let mut description_bytes = vec![0u8; size * DESCRIPTION_BYTES];
        reader.read_exact(&mut description_bytes)?;
        let mut description_bytes = &description_bytes[..];

        if has_offsets {
            let mut offsets = vec![0u8; size * OFFSET_BYTES];
            reader.read_exact(&mut offsets)?;
            drop(offsets); // Not useful when deserializing into memory
        }

        let mut containers = Vec::with_capacity(size);

        for i in 0..size {
            let key = description_bytes.read_u16::<LittleEndian>()?;
            let cardinality = u64::from(description_bytes.read_u16::<LittleEndian>()?) + 1;

            if strict {
                if containers.last().map_or(false, |c: &Container| c.key >= key) {
                    return Err(invalid_data("container keys are not sorted"));
                }
            }

            let is_run_container = run_container_markers
                .as_ref()
                .map_or(false, |markers| markers[i / 8] & (1 << (i % 8)) != 0);

            let store = if is_run_container {
                let runs = reader.read_u16::<LittleEndian>()?;
                let mut intervals = vec![[0u16, 0u16]; runs as usize];
                reader.read_exact(cast_slice_mut(&mut intervals))?;

                let intervals = intervals
                    .into_iter()
                    .map(|[start, len]| {
                        let start = u16::from_le(start);
                        let len = u16::from_le(len);
                        let end =
                            start.checked_add(len).ok_or(io::ErrorKind::InvalidData)?;
                        Ok(Interval { start, end })
                    })
                    .collect::<Result<Vec<Interval>, io::ErrorKind>>()?;

                let runs =
                    c(intervals).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                if strict && runs.len() != cardinality {
                    return Err(invalid_data("declared cardinality does not match run content"));
                }
                Store::Run(runs)
            } else if cardinality <= ARRAY_LIMIT {
                let mut values = vec![0u16; cardinality as usize];
                reader.read_exact(cast_slice_mut(&mut values))?;
                values.iter_mut().for_each(|n| *n = u16::from_le(*n));
                let array = a(values).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Store::Array(array)
            } else {
                let mut values = Box::new([0u64; BITSET_WORDS]);
                reader.read_exact(cast_slice_mut(&mut values[..]))?;
                values.iter_mut().for_each(|n| *n = u64::from_le(*n));
                let bitset = b(cardinality, values)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Store::Bitset(bitset)
            };

            containers.push(Container::from_store(key, store));
        }

        Ok(Bitmap { containers, copy_on_write: false })
    }
}

fn invalid_data(what: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what)
}

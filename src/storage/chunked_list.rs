//! Chunked dynamic array.
//!
//! [`ChunkedList`] stores its elements in fixed-capacity chunks instead of one
//! contiguous buffer, so growth never relocates existing elements and large
//! lists never ask the allocator for one huge block. Element `i` lives at
//! `chunks[i >> shift][i & mask]`; the chunk capacity is a power of two chosen
//! from the element size (bounded below at 1024 elements) or supplied
//! explicitly via [`ChunkedList::with_chunk_size`].

use core::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::check::CheckInvariants;
use crate::error::GraphError;

/// Byte budget per chunk, as a power of two.
const CHUNK_BYTES_LOG2: u32 = 19;
/// Smallest chunk, in elements, as a power of two.
const MIN_CHUNK_LOG2: u32 = 10;

fn default_shift(elem_size: usize) -> u32 {
    let elem = elem_size.max(1);
    let elem_log2 = usize::BITS - 1 - elem.leading_zeros();
    CHUNK_BYTES_LOG2.saturating_sub(elem_log2).max(MIN_CHUNK_LOG2)
}

/// A dynamic array backed by equally-sized chunks.
///
/// Appends are amortized O(1) and grow the footprint by at most one chunk;
/// shrinking releases whole trailing chunks only. Cells exposed by growth are
/// `T::default()` when their chunk is freshly allocated; cells inside a
/// retained chunk keep whatever value they last held.
///
/// ```
/// use mesh_rowgraph::storage::ChunkedList;
///
/// let mut list = ChunkedList::with_chunk_size(4);
/// for i in 0..10u32 {
///     list.push(i);
/// }
/// assert_eq!(list.len(), 10);
/// assert_eq!(list[7], 7);
/// assert_eq!(list.pop(), Some(9));
/// ```
#[derive(Clone)]
pub struct ChunkedList<T> {
    chunks: Vec<Box<[T]>>,
    len: usize,
    shift: u32,
    mask: usize,
}

impl<T> ChunkedList<T> {
    /// Empty list with the element-size-derived chunk capacity.
    pub fn new() -> Self {
        let shift = default_shift(size_of::<T>());
        Self {
            chunks: Vec::new(),
            len: 0,
            shift,
            mask: (1usize << shift) - 1,
        }
    }

    /// Number of elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current chunks can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() << self.shift
    }

    /// Elements per chunk.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        1 << self.shift
    }

    /// Reference to the element at `index`, or an error when out of range.
    pub fn try_get(&self, index: usize) -> Result<&T, GraphError> {
        if index < self.len {
            Ok(&self.chunks[index >> self.shift][index & self.mask])
        } else {
            Err(GraphError::IndexOutOfRange {
                op: "get",
                index,
                len: self.len,
            })
        }
    }

    /// Iterator over the elements in index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            front: Default::default(),
            chunks: self.chunks.iter(),
            remaining: self.len,
        }
    }

    /// Initialized prefix of each chunk, in order.
    pub(crate) fn live_chunks(&self) -> impl Iterator<Item = &[T]> {
        let mut remaining = self.len;
        self.chunks.iter().map_while(move |chunk| {
            if remaining == 0 {
                return None;
            }
            let n = remaining.min(chunk.len());
            remaining -= n;
            Some(&chunk[..n])
        })
    }

    /// Mutable initialized prefix of each chunk, in order.
    pub(crate) fn live_chunks_mut(&mut self) -> LiveChunksMut<'_, T> {
        LiveChunksMut {
            chunks: self.chunks.iter_mut(),
            remaining: self.len,
        }
    }

    /// Handle for unsynchronized writes from the parallel fill phase.
    ///
    /// The handle borrows the list exclusively, so no other access can
    /// observe the cells while it exists; disjointness of the written
    /// indices across threads is the caller's obligation (see
    /// [`BulkWriter::set`]).
    pub fn bulk_writer(&mut self) -> BulkWriter<'_, T> {
        BulkWriter {
            chunks: self.chunks.iter_mut().map(|c| c.as_mut_ptr()).collect(),
            len: self.len,
            shift: self.shift,
            mask: self.mask,
            _list: PhantomData,
        }
    }

    #[inline]
    #[allow(unused_variables)]
    fn check_index(&self, op: &'static str, index: usize) {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if index >= self.len {
            panic!(
                "ChunkedList::{op}: index {index} out of range for length {}",
                self.len
            );
        }
    }

    fn trim_chunks(&mut self) {
        let needed = (self.len + self.mask) >> self.shift;
        self.chunks.truncate(needed);
    }
}

impl<T: Clone + Default> ChunkedList<T> {
    /// Empty list with an explicit chunk capacity.
    ///
    /// Panics unless `chunk_size` is a power of two of at least 2.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(
            chunk_size.is_power_of_two() && chunk_size >= 2,
            "chunk size must be a power of two >= 2, got {chunk_size}"
        );
        let shift = chunk_size.trailing_zeros();
        Self {
            chunks: Vec::new(),
            len: 0,
            shift,
            mask: chunk_size - 1,
        }
    }

    /// List of `len` copies of `fill`.
    pub fn with_len(len: usize, fill: T) -> Self {
        let mut list = Self::new();
        list.grow_to(len, &fill);
        list
    }

    /// Resizes to `new_len`.
    ///
    /// Growth allocates default-filled chunks as needed; shrinking drops
    /// whole trailing chunks and keeps the values inside the retained ones.
    pub fn resize(&mut self, new_len: usize) {
        if new_len > self.len {
            self.grow_to(new_len, &T::default());
        } else {
            self.len = new_len;
            self.trim_chunks();
        }
    }

    /// Appends an element, allocating at most one chunk.
    pub fn push(&mut self, value: T) {
        let i = self.len;
        if i == self.capacity() {
            self.push_chunk(&T::default());
        }
        self.chunks[i >> self.shift][i & self.mask] = value;
        self.len = i + 1;
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self[self.len - 1].clone();
        self.len -= 1;
        self.trim_chunks();
        Some(value)
    }

    /// Removes the element at `index` by moving the last element into its
    /// place. O(1); does not preserve order.
    ///
    /// Panics when the list is empty or `index` is out of range.
    pub fn swap_remove(&mut self, index: usize) -> T {
        match self.try_swap_remove(index) {
            Ok(value) => value,
            Err(err) => panic!("ChunkedList::swap_remove: {err}"),
        }
    }

    /// Fallible form of [`swap_remove`](Self::swap_remove).
    pub fn try_swap_remove(&mut self, index: usize) -> Result<T, GraphError> {
        if self.len == 0 {
            return Err(GraphError::EmptyCollection { op: "swap_remove" });
        }
        if index >= self.len {
            return Err(GraphError::IndexOutOfRange {
                op: "swap_remove",
                index,
                len: self.len,
            });
        }
        let last = self.len - 1;
        let tail = self[last].clone();
        let value = std::mem::replace(&mut self[index], tail);
        self.len = last;
        self.trim_chunks();
        Ok(value)
    }

    /// Overwrites every element with `value`.
    pub fn fill(&mut self, value: T) {
        let mut remaining = self.len;
        for chunk in self.chunks.iter_mut() {
            if remaining == 0 {
                break;
            }
            let n = remaining.min(chunk.len());
            chunk[..n].fill(value.clone());
            remaining -= n;
        }
    }

    /// Drops every chunk and empties the list.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Takes the contents of `other` wholesale, leaving it empty.
    ///
    /// The chunks move without copying any element; `self`'s previous
    /// contents are dropped. `self` adopts `other`'s chunk capacity.
    pub fn transfer_from(&mut self, other: &mut Self) {
        self.chunks = std::mem::take(&mut other.chunks);
        self.len = other.len;
        self.shift = other.shift;
        self.mask = other.mask;
        other.len = 0;
    }

    fn grow_to(&mut self, new_len: usize, fill: &T) {
        debug_assert!(new_len >= self.len);
        while self.capacity() < new_len {
            self.push_chunk(fill);
        }
        self.len = new_len;
    }

    fn push_chunk(&mut self, fill: &T) {
        let chunk = vec![fill.clone(); self.chunk_size()].into_boxed_slice();
        self.chunks.push(chunk);
    }
}

impl<T: PartialEq> ChunkedList<T> {
    /// Whether `value` occurs in the list.
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == value)
    }

    /// Index of the first occurrence of `value`.
    pub fn position(&self, value: &T) -> Option<usize> {
        self.iter().position(|v| v == value)
    }
}

impl<T: Clone + Default + PartialEq> ChunkedList<T> {
    /// Appends `value` unless it already occurs; returns whether it was added.
    pub fn push_if_absent(&mut self, value: T) -> bool {
        if self.contains(&value) {
            false
        } else {
            self.push(value);
            true
        }
    }
}

impl<T: Clone + Default> Default for ChunkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for ChunkedList<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        self.check_index("index", index);
        &self.chunks[index >> self.shift][index & self.mask]
    }
}

impl<T> IndexMut<usize> for ChunkedList<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.check_index("index_mut", index);
        let (shift, mask) = (self.shift, self.mask);
        &mut self.chunks[index >> shift][index & mask]
    }
}

impl<T> fmt::Debug for ChunkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedList")
            .field("len", &self.len)
            .field("chunks", &self.chunks.len())
            .field("chunk_size", &self.chunk_size())
            .finish()
    }
}

impl<T: PartialEq> PartialEq for ChunkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ChunkedList<T> {}

impl<T: Clone + Default> From<Vec<T>> for ChunkedList<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone + Default> FromIterator<T> for ChunkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T: Clone + Default> Extend<T> for ChunkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a ChunkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: Serialize> Serialize for ChunkedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de> + Clone + Default> Deserialize<'de> for ChunkedList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T> CheckInvariants for ChunkedList<T> {
    fn validate_invariants(&self) -> Result<(), GraphError> {
        if self.capacity() < self.len {
            return Err(GraphError::PreconditionViolated {
                op: "ChunkedList::validate_invariants",
                reason: "length exceeds capacity",
            });
        }
        let needed = (self.len + self.mask) >> self.shift;
        if self.chunks.len() != needed {
            return Err(GraphError::PreconditionViolated {
                op: "ChunkedList::validate_invariants",
                reason: "trailing chunk accounting is stale",
            });
        }
        if self.chunks.iter().any(|c| c.len() != self.chunk_size()) {
            return Err(GraphError::PreconditionViolated {
                op: "ChunkedList::validate_invariants",
                reason: "chunk with wrong capacity",
            });
        }
        Ok(())
    }
}

/// Iterator over the elements of a [`ChunkedList`].
pub struct Iter<'a, T> {
    front: std::slice::Iter<'a, T>,
    chunks: std::slice::Iter<'a, Box<[T]>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(v) = self.front.next() {
                self.remaining -= 1;
                return Some(v);
            }
            self.front = self.chunks.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

pub(crate) struct LiveChunksMut<'a, T> {
    chunks: std::slice::IterMut<'a, Box<[T]>>,
    remaining: usize,
}

impl<'a, T> Iterator for LiveChunksMut<'a, T> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<&'a mut [T]> {
        if self.remaining == 0 {
            return None;
        }
        let chunk = self.chunks.next()?;
        let n = self.remaining.min(chunk.len());
        self.remaining -= n;
        Some(&mut chunk[..n])
    }
}

/// Write handle over a [`ChunkedList`] for the parallel fill phase.
///
/// Holds raw pointers to every chunk while exclusively borrowing the list,
/// so threads can deposit values at disjoint indices without locks.
pub struct BulkWriter<'a, T> {
    chunks: Vec<*mut T>,
    len: usize,
    shift: u32,
    mask: usize,
    _list: PhantomData<&'a mut ChunkedList<T>>,
}

unsafe impl<T: Send> Send for BulkWriter<'_, T> {}
unsafe impl<T: Send> Sync for BulkWriter<'_, T> {}

impl<T> BulkWriter<'_, T> {
    /// Length of the underlying list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the underlying list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Copy> BulkWriter<'_, T> {
    /// Writes `value` at `index` without synchronization.
    ///
    /// # Safety
    ///
    /// `index` must be below [`len`](Self::len), and while the writer exists
    /// no two threads may pass the same index. The exclusive borrow behind
    /// the writer guarantees nothing else reads the cells concurrently.
    #[inline]
    pub unsafe fn set(&self, index: usize, value: T) {
        debug_assert!(
            index < self.len,
            "BulkWriter::set: index {index} out of range for length {}",
            self.len
        );
        let chunk = self.chunks[index >> self.shift];
        unsafe { chunk.add(index & self.mask).write(value) };
    }
}

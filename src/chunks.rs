//! Append-only stores split into fixed-size chunks.
//!
//! Reads may cross at most one chunk boundary, so a read never asks for more
//! than one chunk's worth of elements.

use crate::error::{Error, Result};

const CHUNK_INDEX_GROWTH: usize = 4;
const INT_CHUNK_SIZE: usize = 10_000;

/// Chunked, randomly indexable storage of `Copy` elements
#[derive(Debug, Clone)]
pub struct Chunks<T> {
    chunk_size: usize,
    chunks: Vec<Box<[T]>>,
    len: usize,
}

impl<T: Copy + Default> Chunks<T> {
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::BadUsageError("chunk size must be at least 1".to_string()));
        }
        Ok(Self {
            chunk_size,
            chunks: Vec::new(),
            len: 0,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of elements appended so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append all of `data`, splitting across chunk boundaries
    pub fn add(&mut self, mut data: &[T]) {
        while !data.is_empty() {
            let (chunk_index, chunk_offset) = self.position(self.len);
            if chunk_index == self.chunks.len() {
                self.push_chunk();
            }
            let available = self.chunk_size - chunk_offset;
            let n = available.min(data.len());
            let (head, rest) = data.split_at(n);
            if let Some(chunk) = self.chunks.get_mut(chunk_index) {
                chunk[chunk_offset..chunk_offset + n].copy_from_slice(head);
            }
            self.len += n;
            data = rest;
        }
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(self.out_of_range(index, 1));
        }
        let (chunk_index, chunk_offset) = self.position(index);
        self.chunks
            .get(chunk_index)
            .map(|chunk| chunk[chunk_offset])
            .ok_or_else(|| self.out_of_range(index, 1))
    }

    /// Read `length` elements starting at `offset`
    ///
    /// A range inside one chunk is borrowed directly. A range crossing into the
    /// next chunk is copied into `scratch`.
    pub fn read<'a>(
        &'a self,
        offset: usize,
        length: usize,
        scratch: &'a mut Vec<T>,
    ) -> Result<&'a [T]> {
        if length > self.chunk_size {
            return Err(Error::BadUsageError(format!(
                "read of {} elements exceeds chunk size {}",
                length, self.chunk_size
            )));
        }
        let end = offset
            .checked_add(length)
            .ok_or_else(|| self.out_of_range(offset, length))?;
        if end > self.len {
            return Err(self.out_of_range(offset, length));
        }
        if length == 0 {
            return Ok(&[]);
        }

        let (chunk_index, chunk_offset) = self.position(offset);
        let first = self
            .chunks
            .get(chunk_index)
            .ok_or_else(|| self.out_of_range(offset, length))?;

        let in_first = self.chunk_size - chunk_offset;
        if length <= in_first {
            return Ok(&first[chunk_offset..chunk_offset + length]);
        }

        let second = self
            .chunks
            .get(chunk_index + 1)
            .ok_or_else(|| self.out_of_range(offset, length))?;
        scratch.clear();
        scratch.extend_from_slice(&first[chunk_offset..]);
        scratch.extend_from_slice(&second[..length - in_first]);
        Ok(scratch.as_slice())
    }

    /// Like `read`, but clamps the range to the elements available
    pub fn read_max_length<'a>(
        &'a self,
        offset: usize,
        max_length: usize,
        scratch: &'a mut Vec<T>,
    ) -> Result<&'a [T]> {
        let available = self.len.saturating_sub(offset);
        self.read(offset, max_length.min(available), scratch)
    }

    /// Number of elements stored in the last chunk
    pub fn elements_in_last_chunk(&self) -> usize {
        if self.chunks.is_empty() {
            return 0;
        }
        match self.len % self.chunk_size {
            0 => self.chunk_size,
            remainder => remainder,
        }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        (offset / self.chunk_size, offset % self.chunk_size)
    }

    fn push_chunk(&mut self) {
        if self.chunks.len() == self.chunks.capacity() {
            let grow = self.chunks.capacity().max(1) * (CHUNK_INDEX_GROWTH - 1);
            self.chunks.reserve_exact(grow);
        }
        self.chunks
            .push(vec![T::default(); self.chunk_size].into_boxed_slice());
    }

    fn out_of_range(&self, offset: usize, length: usize) -> Error {
        Error::BadUsageError(format!(
            "range {}+{} out of bounds for {} elements",
            offset, length, self.len
        ))
    }
}

// ============================================================================
// Result set byte store
// ============================================================================

/// Byte store holding the rows of a materialized result set
#[derive(Debug, Clone)]
pub struct ResultSetBuffer {
    bytes: Chunks<u8>,
}

impl ResultSetBuffer {
    pub fn new(chunk_size: usize) -> Result<Self> {
        Ok(Self {
            bytes: Chunks::new(chunk_size)?,
        })
    }

    pub fn add_data(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::BadUsageError("no row data to add".to_string()));
        }
        self.bytes.add(data);
        Ok(())
    }

    pub fn decode<'a>(
        &'a self,
        offset: usize,
        length: usize,
        scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8]> {
        self.bytes.read(offset, length, scratch)
    }

    pub fn decode_max_length<'a>(
        &'a self,
        offset: usize,
        max_length: usize,
        scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8]> {
        self.bytes.read_max_length(offset, max_length, scratch)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn chunk_size(&self) -> usize {
        self.bytes.chunk_size()
    }
}

// ============================================================================
// Large int array
// ============================================================================

/// Growable array of `u32` values that never reallocates existing elements
#[derive(Debug, Clone)]
pub struct IntLargeArray {
    values: Chunks<u32>,
}

impl IntLargeArray {
    pub fn new() -> Self {
        Self::with_chunk_size(INT_CHUNK_SIZE)
    }

    pub(crate) fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            values: Chunks {
                chunk_size: chunk_size.max(1),
                chunks: Vec::new(),
                len: 0,
            },
        }
    }

    /// Append `length` values of `values` starting at `offset`
    pub fn add(&mut self, values: &[u32], offset: usize, length: usize) -> Result<()> {
        let slice = offset
            .checked_add(length)
            .and_then(|end| values.get(offset..end))
            .ok_or_else(|| {
                Error::BadUsageError(format!(
                    "range {}+{} out of bounds for {} values",
                    offset,
                    length,
                    values.len()
                ))
            })?;
        self.values.add(slice);
        Ok(())
    }

    pub fn get_value(&self, index: usize) -> Result<u32> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for IntLargeArray {
    fn default() -> Self {
        Self::new()
    }
}

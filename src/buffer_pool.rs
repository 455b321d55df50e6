use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

use crossbeam_queue::ArrayQueue;

const POOL_CAPACITY: usize = 16;
/// Larger buffers are freed instead of kept idle
pub const MAX_RETAINED_BUFFER_BYTES: usize = 1024 * 1024;

pub static GLOBAL_ROW_BUFFER_POOL: LazyLock<Arc<RowBufferPool>> =
    LazyLock::new(|| Arc::new(RowBufferPool::default()));

/// A pooled row buffer that returns itself to the pool on drop.
pub struct PooledRowBuffer {
    pool: Arc<RowBufferPool>,
    inner: ManuallyDrop<Vec<u8>>,
}

impl PooledRowBuffer {
    fn new(pool: Arc<RowBufferPool>, vec: Vec<u8>) -> Self {
        Self {
            pool,
            inner: ManuallyDrop::new(vec),
        }
    }
}

impl std::fmt::Debug for PooledRowBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledRowBuffer")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl Deref for PooledRowBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledRowBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Drop for PooledRowBuffer {
    fn drop(&mut self) {
        // SAFETY: inner is never accessed after this
        let vec = unsafe { ManuallyDrop::take(&mut self.inner) };
        self.pool.return_row_buffer(vec);
    }
}

/// Recycles the row buffers of connection-attached result sets
///
/// A buffer holds one whole fetch of rows, up to 10 MiB. Only buffers of at
/// most `MAX_RETAINED_BUFFER_BYTES` capacity are kept for reuse.
#[derive(Debug)]
pub struct RowBufferPool {
    row_buffers: ArrayQueue<Vec<u8>>,
}

impl RowBufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            row_buffers: ArrayQueue::new(capacity),
        }
    }

    /// A zeroed buffer of exactly `len` bytes
    pub fn get_row_buffer(self: &Arc<Self>, len: usize) -> PooledRowBuffer {
        let mut vec = self.row_buffers.pop().unwrap_or_default();
        vec.resize(len, 0);
        PooledRowBuffer::new(Arc::clone(self), vec)
    }

    pub fn return_row_buffer(&self, mut vec: Vec<u8>) {
        if vec.capacity() > MAX_RETAINED_BUFFER_BYTES {
            return;
        }
        // Keep capacity, drop contents
        vec.clear();
        // Ignore if pool is full
        let _ = self.row_buffers.push(vec);
    }

    pub fn idle(&self) -> usize {
        self.row_buffers.len()
    }
}

impl Default for RowBufferPool {
    fn default() -> Self {
        Self::new(POOL_CAPACITY)
    }
}

//! Buffer storage strategies for segment data.
//!
//! A [`TransactionBuilder`](crate::transact::TransactionBuilder) is generic
//! over *where its segment buffers live*. The strategy is chosen once at
//! construction and travels with the finished
//! [`Transaction`](crate::transact::Transaction), which owns it for the
//! lifetime of every buffer it handed out.
//!
//! Three strategies are provided:
//!
//! - [`InlineStorage`] keeps each buffer in a fixed-capacity array inside
//!   the segment itself. No heap, ever.
//! - [`PooledStorage`] leases heap buffers from a shared free list and
//!   takes them back when the transaction is dropped, so steady-state
//!   construction stops allocating once the pool is warm.
//! - [`HeapStorage`] boxes every buffer. The default when none of the
//!   above matters.

use std::sync::{Arc, Mutex};

use crate::transact::error::BuildError;

/// Where segment buffers live.
///
/// Implementations hand out zero-initialized buffers of an exact length.
/// A buffer must keep that length for its whole life; segments never grow.
pub trait BufferStrategy {
    /// The buffer type handed to segments.
    type Buffer: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocates a zeroed buffer of exactly `len` bytes.
    ///
    /// # Errors
    /// [`BuildError::BufferCapacity`] if the strategy cannot provide `len`
    /// bytes.
    fn alloc(&self, len: usize) -> Result<Self::Buffer, BuildError>;
}

/// Stack-backed storage: each buffer is a fixed-capacity inline array.
///
/// `N` bounds the size of a single segment's data. Allocating a segment
/// larger than `N` fails with [`BuildError::BufferCapacity`] before the
/// builder is touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineStorage<const N: usize>;

impl<const N: usize> BufferStrategy for InlineStorage<N> {
    type Buffer = heapless::Vec<u8, N>;

    fn alloc(&self, len: usize) -> Result<Self::Buffer, BuildError> {
        let mut buf = heapless::Vec::new();
        buf.resize(len, 0).map_err(|_| BuildError::BufferCapacity {
            requested: len,
            capacity: N,
        })?;
        Ok(buf)
    }
}

/// Default heap storage: every buffer is an exact-sized box.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapStorage;

impl BufferStrategy for HeapStorage {
    type Buffer = Box<[u8]>;

    fn alloc(&self, len: usize) -> Result<Self::Buffer, BuildError> {
        Ok(vec![0u8; len].into_boxed_slice())
    }
}

type FreeList = Arc<Mutex<Vec<Vec<u8>>>>;

/// Recycling storage: buffers return to a shared free list on drop.
///
/// Cloning the strategy clones a handle to the same pool, so a device task
/// can keep one `PooledStorage` and build transactions against it without
/// allocating once the pool has warmed up.
#[derive(Debug, Default, Clone)]
pub struct PooledStorage {
    free: FreeList,
}

impl PooledStorage {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers currently parked in the free list.
    pub fn idle(&self) -> usize {
        match self.free.lock() {
            Ok(free) => free.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl BufferStrategy for PooledStorage {
    type Buffer = PooledBuffer;

    fn alloc(&self, len: usize) -> Result<Self::Buffer, BuildError> {
        let mut bytes = match self.free.lock() {
            Ok(mut free) => free.pop().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().pop().unwrap_or_default(),
        };
        bytes.clear();
        bytes.resize(len, 0);
        Ok(PooledBuffer {
            bytes,
            free: Arc::clone(&self.free),
        })
    }
}

/// A heap buffer on lease from a [`PooledStorage`] free list.
#[derive(Debug)]
pub struct PooledBuffer {
    bytes: Vec<u8>,
    free: FreeList,
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsMut<[u8]> for PooledBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let bytes = std::mem::take(&mut self.bytes);
        match self.free.lock() {
            Ok(mut free) => free.push(bytes),
            Err(poisoned) => poisoned.into_inner().push(bytes),
        }
    }
}

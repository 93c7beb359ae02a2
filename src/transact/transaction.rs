//! The finalized transaction and its execution pipeline.

use heapless::Vec;

use crate::transact::error::TransferError;
use crate::transact::flags::Functionality;
use crate::transact::segment::Segment;
use crate::transact::storage::BufferStrategy;
use crate::transact::wire::{I2cTransfer, MAX_MESSAGES, WireMessage};

/// An immutable, ordered, move-only list of segments plus the storage
/// strategy that owns their buffers.
///
/// Produced by
/// [`TransactionBuilder::finalize`](crate::transact::TransactionBuilder::finalize)
/// and consumed exactly once by [`apply`](Transaction::apply). Insertion
/// order is execution order; nothing reorders, splits, or batches segments
/// across transactions.
pub struct Transaction<'c, S: BufferStrategy> {
    address: u16,
    // Keeps every leased buffer alive (and, for pooled storage, returns
    // them to the pool when the transaction goes away).
    #[allow(dead_code)]
    store: S,
    segments: Vec<Segment<'c, S::Buffer>, MAX_MESSAGES>,
}

impl<'c, S: BufferStrategy> Transaction<'c, S> {
    pub(crate) fn new(
        address: u16,
        store: S,
        segments: Vec<Segment<'c, S::Buffer>, MAX_MESSAGES>,
    ) -> Self {
        Self {
            address,
            store,
            segments,
        }
    }

    /// The peripheral address the transaction targets.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Number of wire messages this transaction submits.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the transaction carries no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments in execution order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment<'c, S::Buffer>> {
        self.segments.iter()
    }

    /// Executes the transaction against `bus` as one combined transfer.
    ///
    /// The adapter capability for arbitrary message transfer is checked
    /// before any wire record is constructed, the target address is made
    /// active once, and the ordered message list goes to the transfer
    /// primitive in a single call. On success every read segment's scratch
    /// buffer is committed back to its caller storage, in segment order,
    /// each exactly once.
    ///
    /// On failure nothing is committed: caller storage is modified only if
    /// the whole transfer succeeded.
    ///
    /// # Errors
    /// [`TransferError::Unsupported`] when the adapter lacks
    /// [`Functionality::I2C`] (or 10-bit addressing where needed);
    /// [`TransferError::Io`] when the transfer primitive itself fails.
    pub fn apply<T: I2cTransfer>(mut self, bus: &mut T) -> Result<(), TransferError> {
        if !bus.capabilities().contains(Functionality::I2C) {
            return Err(TransferError::Unsupported(Functionality::I2C));
        }

        bus.ensure_target(self.address)?;

        let mut messages: Vec<WireMessage<'_>, MAX_MESSAGES> =
            self.segments.iter_mut().map(Segment::as_wire).collect();
        bus.transfer(&mut messages)?;
        drop(messages);

        for segment in self.segments {
            segment.commit();
        }
        Ok(())
    }
}

impl<S: BufferStrategy> core::fmt::Debug for Transaction<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transaction")
            .field("address", &self.address)
            .field("segments", &self.segments.len())
            .finish_non_exhaustive()
    }
}

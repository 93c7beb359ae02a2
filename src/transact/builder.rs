//! Composes ordered segments into a transaction, merging register-pointer
//! writes.

use bytemuck::{AnyBitPattern, NoUninit};
use heapless::Vec;

use crate::transact::error::BuildError;
use crate::transact::flags::MessageFlags;
use crate::transact::segment::Segment;
use crate::transact::storage::BufferStrategy;
use crate::transact::transaction::Transaction;
use crate::transact::wire::MAX_MESSAGES;

/// Accumulates typed read/write operations against one peripheral and
/// finalizes them into an immutable [`Transaction`].
///
/// The builder tracks the peripheral's register pointer across calls: an
/// offset-qualified operation inserts an addressing write only when the
/// target offset differs from the last one used, so consecutive operations
/// on the same register share a single pointer write. The tracked offset
/// starts unset, making the first offset-qualified call always emit its
/// addressing write.
///
/// Segment count is enforced incrementally against [`MAX_MESSAGES`]; a
/// failing `add_*` call leaves the builder exactly as it was.
///
/// A builder is not safe for concurrent mutation; `&mut self` receivers
/// leave serialization to the caller.
pub struct TransactionBuilder<'c, S: BufferStrategy> {
    address: u16,
    offset: Option<u16>,
    store: S,
    segments: Vec<Segment<'c, S::Buffer>, MAX_MESSAGES>,
}

impl<'c, S: BufferStrategy> TransactionBuilder<'c, S> {
    /// Creates a builder targeting the peripheral at `address`, backed by
    /// the given buffer storage strategy.
    pub fn new(address: u16, store: S) -> Self {
        Self {
            address,
            offset: None,
            store,
            segments: Vec::new(),
        }
    }

    /// The peripheral address every segment targets.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Number of accumulated segments, including implicit addressing
    /// writes.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if no segments have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a write segment carrying a snapshot of `value`.
    ///
    /// The data lands wherever the peripheral's register pointer currently
    /// points; the tracked offset is not consulted or changed.
    ///
    /// # Errors
    /// [`BuildError::SegmentLimit`] or [`BuildError::BufferCapacity`]; the
    /// builder is unchanged on error.
    pub fn add_write<T: NoUninit>(
        &mut self,
        value: &T,
        flags: MessageFlags,
    ) -> Result<&mut Self, BuildError> {
        self.reserve(1)?;
        let segment = Segment::write(&self.store, self.address, value, flags)?;
        self.push(segment)?;
        Ok(self)
    }

    /// Appends a write segment for the register at `offset`.
    ///
    /// If the tracked offset differs from `offset`, an addressing write
    /// carrying `offset` as its payload is appended first. The tracked
    /// offset becomes `offset` afterwards.
    ///
    /// # Errors
    /// [`BuildError::SegmentLimit`] or [`BuildError::BufferCapacity`]; the
    /// builder (including the tracked offset) is unchanged on error.
    pub fn add_write_at<T: NoUninit>(
        &mut self,
        offset: u16,
        value: &T,
        flags: MessageFlags,
    ) -> Result<&mut Self, BuildError> {
        if self.offset == Some(offset) {
            return self.add_write(value, flags);
        }

        self.reserve(2)?;
        let pointer = self.pointer_write(offset)?;
        let data = Segment::write(&self.store, self.address, value, flags)?;
        self.push(pointer)?;
        self.push(data)?;
        self.offset = Some(offset);
        Ok(self)
    }

    /// Appends a read segment into the caller's `dest` storage.
    ///
    /// The direction bit is forced on. The scratch bytes are committed into
    /// `dest` only after the whole transaction transfers successfully.
    ///
    /// # Errors
    /// [`BuildError::SegmentLimit`] or [`BuildError::BufferCapacity`]; the
    /// builder is unchanged on error.
    pub fn add_read<T: NoUninit + AnyBitPattern>(
        &mut self,
        dest: &'c mut T,
        flags: MessageFlags,
    ) -> Result<&mut Self, BuildError> {
        self.reserve(1)?;
        let segment = Segment::read(&self.store, self.address, dest, flags)?;
        self.push(segment)?;
        Ok(self)
    }

    /// Appends a read segment for the register at `offset`.
    ///
    /// Applies the same pointer-merge rule as [`add_write_at`]: when an
    /// addressing write is inserted, the read that follows it additionally
    /// carries [`MessageFlags::NOSTART`], continuing the transfer phase the
    /// pointer write opened. When the tracked offset already matches, this
    /// is exactly [`add_read`].
    ///
    /// # Errors
    /// [`BuildError::SegmentLimit`] or [`BuildError::BufferCapacity`]; the
    /// builder (including the tracked offset) is unchanged on error.
    ///
    /// [`add_write_at`]: TransactionBuilder::add_write_at
    /// [`add_read`]: TransactionBuilder::add_read
    pub fn add_read_at<T: NoUninit + AnyBitPattern>(
        &mut self,
        offset: u16,
        dest: &'c mut T,
        flags: MessageFlags,
    ) -> Result<&mut Self, BuildError> {
        if self.offset == Some(offset) {
            return self.add_read(dest, flags);
        }

        self.reserve(2)?;
        let pointer = self.pointer_write(offset)?;
        let data = Segment::read(
            &self.store,
            self.address,
            dest,
            flags | MessageFlags::NOSTART,
        )?;
        self.push(pointer)?;
        self.push(data)?;
        self.offset = Some(offset);
        Ok(self)
    }

    /// Moves the accumulated segments and the storage strategy into an
    /// immutable [`Transaction`], leaving the builder empty.
    ///
    /// The segment ceiling was enforced at every `add_*` call, so
    /// finalizing cannot fail. The tracked offset is reset: a new
    /// transaction never assumes the peripheral's register pointer survived
    /// whatever happened on the bus in between.
    pub fn finalize(&mut self) -> Transaction<'c, S>
    where
        S: Clone,
    {
        self.offset = None;
        Transaction::new(
            self.address,
            self.store.clone(),
            core::mem::take(&mut self.segments),
        )
    }

    /// The addressing write inserted when the register pointer moves: the
    /// offset's native-endian bytes, no extra flags.
    fn pointer_write(&self, offset: u16) -> Result<Segment<'c, S::Buffer>, BuildError> {
        Segment::write(&self.store, self.address, &offset, MessageFlags::empty())
    }

    /// Fails if appending `extra` segments would cross the ioctl ceiling.
    fn reserve(&self, extra: usize) -> Result<(), BuildError> {
        if self.segments.len() + extra > MAX_MESSAGES {
            return Err(BuildError::SegmentLimit);
        }
        Ok(())
    }

    fn push(&mut self, segment: Segment<'c, S::Buffer>) -> Result<(), BuildError> {
        self.segments
            .push(segment)
            .map_err(|_| BuildError::SegmentLimit)
    }
}

impl<S: BufferStrategy> core::fmt::Debug for TransactionBuilder<'_, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("address", &self.address)
            .field("offset", &self.offset)
            .field("segments", &self.segments.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transact::storage::{HeapStorage, InlineStorage};

    fn builder<'c>() -> TransactionBuilder<'c, HeapStorage> {
        TransactionBuilder::new(0x50, HeapStorage)
    }

    #[test]
    fn plain_write_adds_one_segment_and_ignores_offset_tracking() {
        let mut b = builder();
        b.add_write(&0xABu8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 1);

        // A later offset-qualified call still emits its addressing write.
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn first_offset_write_emits_addressing_segment_even_for_offset_zero() {
        let mut b = builder();
        b.add_write_at(0x00, &0xABu8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn repeated_offset_inserts_addressing_write_once() {
        let mut b = builder();
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();
        b.add_write_at(0x10, &0x02u8, MessageFlags::empty()).unwrap();

        // Addressing write + two data writes, not two addressing writes.
        assert_eq!(b.len(), 3);

        let txn = b.finalize();
        let segments: std::vec::Vec<_> = txn.segments().collect();
        assert_eq!(segments[0].data(), &0x10u16.to_ne_bytes());
        assert_eq!(segments[1].data(), &[0x01]);
        assert_eq!(segments[2].data(), &[0x02]);
    }

    #[test]
    fn offset_change_reinserts_addressing_write() {
        let mut b = builder();
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();
        b.add_write_at(0x20, &0x02u8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn read_after_write_at_other_offset_yields_three_segments() {
        let mut out: u8 = 0;
        let mut b = builder();
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();
        b.add_read_at(0x20, &mut out, MessageFlags::empty()).unwrap();

        // Addressing(0x10), write, addressing(0x20), read - nothing lost.
        assert_eq!(b.len(), 4);

        let txn = b.finalize();
        let segments: std::vec::Vec<_> = txn.segments().collect();
        assert_eq!(segments[2].data(), &0x20u16.to_ne_bytes());
        assert!(!segments[2].flags().is_read());
        assert!(segments[3].is_read());
        assert!(segments[3].flags().contains(MessageFlags::NOSTART));
    }

    #[test]
    fn read_at_matching_offset_is_a_plain_read() {
        let mut out: u8 = 0;
        let mut b = builder();
        b.add_write_at(0x10, &0xABu8, MessageFlags::empty()).unwrap();
        b.add_read_at(0x10, &mut out, MessageFlags::empty()).unwrap();

        // End-to-end shape: addressing write (payload 0x10), data write
        // (payload 0xAB), then one read with no NOSTART and no second
        // addressing write.
        assert_eq!(b.len(), 3);

        let txn = b.finalize();
        let segments: std::vec::Vec<_> = txn.segments().collect();
        assert_eq!(segments[0].data(), &0x10u16.to_ne_bytes());
        assert_eq!(segments[1].data(), &[0xAB]);
        assert!(segments[2].is_read());
        assert!(!segments[2].flags().contains(MessageFlags::NOSTART));
    }

    #[test]
    fn read_continuation_keeps_caller_flags() {
        let mut out: u8 = 0;
        let mut b = builder();
        b.add_read_at(0x30, &mut out, MessageFlags::IGNORE_NAK).unwrap();

        let txn = b.finalize();
        let read = txn.segments().nth(1).unwrap();
        assert!(read.flags().contains(MessageFlags::IGNORE_NAK));
        assert!(read.flags().contains(MessageFlags::NOSTART));
        assert!(read.flags().is_read());
    }

    #[test]
    fn segment_limit_fails_the_crossing_call_and_preserves_state() {
        let mut b = builder();
        for i in 0..MAX_MESSAGES {
            b.add_write(&(i as u8), MessageFlags::empty()).unwrap();
        }
        assert_eq!(b.len(), MAX_MESSAGES);

        // The 43rd segment fails without disturbing the first 42.
        assert_eq!(
            b.add_write(&0xFFu8, MessageFlags::empty()).unwrap_err(),
            BuildError::SegmentLimit
        );
        assert_eq!(b.len(), MAX_MESSAGES);

        let txn = b.finalize();
        assert_eq!(txn.len(), MAX_MESSAGES);
        assert_eq!(txn.segments().next().unwrap().data(), &[0x00]);
    }

    #[test]
    fn offset_pair_crossing_the_limit_is_rejected_atomically() {
        let mut b = builder();
        b.add_write_at(0x10, &0u8, MessageFlags::empty()).unwrap();
        for i in 0..(MAX_MESSAGES - 3) {
            b.add_write(&(i as u8), MessageFlags::empty()).unwrap();
        }
        assert_eq!(b.len(), MAX_MESSAGES - 1);

        // One free slot, but the offset change needs two segments.
        assert_eq!(
            b.add_write_at(0x20, &0u8, MessageFlags::empty()).unwrap_err(),
            BuildError::SegmentLimit
        );
        assert_eq!(b.len(), MAX_MESSAGES - 1);

        // The tracked offset was not clobbered by the failure: a write at
        // the tracked offset still needs only the one remaining slot.
        b.add_write_at(0x10, &1u8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), MAX_MESSAGES);
    }

    #[test]
    fn buffer_capacity_failure_preserves_state() {
        let mut b = TransactionBuilder::new(0x50, InlineStorage::<2>);
        b.add_write_at(0x10, &0xABu8, MessageFlags::empty()).unwrap();

        let wide: u32 = 5;
        assert!(matches!(
            b.add_write(&wide, MessageFlags::empty()).unwrap_err(),
            BuildError::BufferCapacity { requested: 4, .. }
        ));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn finalize_leaves_builder_empty_and_reusable() {
        let mut b = builder();
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();

        let txn = b.finalize();
        assert_eq!(txn.len(), 2);
        assert!(b.is_empty());

        b.add_write(&0x02u8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn finalize_resets_tracked_offset() {
        let mut b = builder();
        b.add_write_at(0x10, &0x01u8, MessageFlags::empty()).unwrap();
        let _ = b.finalize();

        // Same offset again, yet the fresh transaction re-addresses it.
        b.add_write_at(0x10, &0x02u8, MessageFlags::empty()).unwrap();
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn segment_count_is_explicit_calls_plus_addressing_writes() {
        let mut out: u8 = 0;
        let mut b = builder();
        b.add_write_at(0x10, &1u8, MessageFlags::empty()).unwrap(); // +2
        b.add_write_at(0x10, &2u8, MessageFlags::empty()).unwrap(); // +1
        b.add_write_at(0x11, &3u8, MessageFlags::empty()).unwrap(); // +2
        b.add_read_at(0x11, &mut out, MessageFlags::empty()).unwrap(); // +1
        b.add_write(&4u8, MessageFlags::empty()).unwrap(); // +1

        // 5 explicit calls + 2 implicit addressing writes.
        assert_eq!(b.len(), 7);
    }
}

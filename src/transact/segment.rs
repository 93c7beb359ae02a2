//! A single addressed transfer unit within a transaction.

use bytemuck::{AnyBitPattern, NoUninit};

use crate::transact::error::BuildError;
use crate::transact::flags::MessageFlags;
use crate::transact::storage::BufferStrategy;
use crate::transact::wire::WireMessage;

/// One addressed read or write unit, mapped to exactly one wire record.
///
/// A write segment snapshots the bytes of a typed value at creation time;
/// later mutation of the caller's value does not affect the segment. A read
/// segment owns a scratch buffer of the storage type's size plus a borrow
/// of the caller's storage, into which the scratch bytes are committed
/// exactly once after a successful transfer.
///
/// The buffer length is fixed at creation and equals the exact size of the
/// typed value; segments never grow.
pub struct Segment<'c, B> {
    address: u16,
    flags: MessageFlags,
    kind: SegmentKind<'c, B>,
}

enum SegmentKind<'c, B> {
    Write(B),
    Read { scratch: B, dest: &'c mut [u8] },
}

impl<'c, B: AsRef<[u8]> + AsMut<[u8]>> Segment<'c, B> {
    /// Creates a write segment snapshotting `value`'s bytes.
    ///
    /// The direction bit is stripped from `flags`; a write segment is
    /// always a write on the wire.
    ///
    /// # Errors
    /// [`BuildError::BufferCapacity`] if the storage strategy cannot hold
    /// `size_of::<T>()` bytes.
    pub fn write<T, S>(
        store: &S,
        address: u16,
        value: &T,
        flags: MessageFlags,
    ) -> Result<Self, BuildError>
    where
        T: NoUninit,
        S: BufferStrategy<Buffer = B>,
    {
        let src = bytemuck::bytes_of(value);
        let mut buf = alloc_wire_buffer(store, src.len())?;
        buf.as_mut().copy_from_slice(src);
        Ok(Self {
            address,
            flags: flags - MessageFlags::RD,
            kind: SegmentKind::Write(buf),
        })
    }

    /// Creates a read segment targeting the caller's `dest` storage.
    ///
    /// The scratch buffer is sized to `size_of::<T>()` and the direction
    /// bit is forced on regardless of `flags`. The scratch bytes reach
    /// `dest` only through [`Segment::commit`].
    ///
    /// # Errors
    /// [`BuildError::BufferCapacity`] if the storage strategy cannot hold
    /// `size_of::<T>()` bytes.
    pub fn read<T, S>(
        store: &S,
        address: u16,
        dest: &'c mut T,
        flags: MessageFlags,
    ) -> Result<Self, BuildError>
    where
        T: NoUninit + AnyBitPattern,
        S: BufferStrategy<Buffer = B>,
    {
        let dest = bytemuck::bytes_of_mut(dest);
        let scratch = alloc_wire_buffer(store, dest.len())?;
        Ok(Self {
            address,
            flags: flags | MessageFlags::RD,
            kind: SegmentKind::Read { scratch, dest },
        })
    }

    /// The peripheral address this segment targets.
    #[inline]
    pub fn address(&self) -> u16 {
        self.address
    }

    /// The protocol-modifier flags submitted with this segment.
    #[inline]
    pub fn flags(&self) -> MessageFlags {
        self.flags
    }

    /// The raw data buffer (snapshot for writes, scratch for reads).
    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.kind {
            SegmentKind::Write(buf) => buf.as_ref(),
            SegmentKind::Read { scratch, .. } => scratch.as_ref(),
        }
    }

    /// The fixed buffer length in bytes.
    #[inline]
    pub fn data_len(&self) -> u16 {
        self.data().len() as u16
    }

    /// Returns true for read segments.
    #[inline]
    pub fn is_read(&self) -> bool {
        matches!(self.kind, SegmentKind::Read { .. })
    }

    /// Projects this segment into the wire record handed to the transfer
    /// primitive. Read segments expose their scratch buffer mutably.
    pub(crate) fn as_wire(&mut self) -> WireMessage<'_> {
        match &mut self.kind {
            SegmentKind::Write(buf) => {
                let buf: &B = buf;
                WireMessage::Write {
                    address: self.address,
                    flags: self.flags.wire(),
                    data: buf.as_ref(),
                }
            }
            SegmentKind::Read { scratch, .. } => WireMessage::Read {
                address: self.address,
                flags: self.flags.wire(),
                data: scratch.as_mut(),
            },
        }
    }

    /// Consumes the segment; a read segment copies its scratch buffer into
    /// the caller's storage. Called once per segment, after a successful
    /// transfer.
    pub(crate) fn commit(self) {
        if let SegmentKind::Read { scratch, dest } = self.kind {
            dest.copy_from_slice(scratch.as_ref());
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> core::fmt::Debug for Segment<'_, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Segment")
            .field("address", &self.address)
            .field("flags", &self.flags)
            .field("len", &self.data_len())
            .field("read", &self.is_read())
            .finish()
    }
}

/// Allocates a buffer whose length also fits the wire record's 16-bit
/// length field.
fn alloc_wire_buffer<S: BufferStrategy>(store: &S, len: usize) -> Result<S::Buffer, BuildError> {
    if len > u16::MAX as usize {
        return Err(BuildError::BufferCapacity {
            requested: len,
            capacity: u16::MAX as usize,
        });
    }
    store.alloc(len)
}

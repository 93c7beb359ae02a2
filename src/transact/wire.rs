//! Wire records and the transfer capability consumed by execution.

use crate::transact::error::TransferError;
use crate::transact::flags::Functionality;

/// Most messages a single `I2C_RDWR` ioctl accepts, fixed by the kernel.
pub const MAX_MESSAGES: usize = 42;

/// One ordered wire record of a combined transfer.
///
/// This is the safe projection of the kernel's `i2c_msg` record: the
/// address, the raw flag word, and the data buffer whose length is the
/// record's length field. The read/write split carries the borrow
/// direction, so transfer implementations (including test doubles) stay in
/// safe code; the raw-pointer form exists only at the ioctl boundary.
#[derive(Debug)]
pub enum WireMessage<'a> {
    /// Controller-to-peripheral data.
    Write {
        /// Target peripheral address.
        address: u16,
        /// Raw `i2c_msg.flags` word.
        flags: u16,
        /// Payload; its length is the wire length field.
        data: &'a [u8],
    },
    /// Peripheral-to-controller data, received into `data`.
    Read {
        /// Target peripheral address.
        address: u16,
        /// Raw `i2c_msg.flags` word.
        flags: u16,
        /// Receive buffer; its length is the wire length field.
        data: &'a mut [u8],
    },
}

impl WireMessage<'_> {
    /// Target peripheral address.
    pub fn address(&self) -> u16 {
        match self {
            WireMessage::Write { address, .. } | WireMessage::Read { address, .. } => *address,
        }
    }

    /// Raw flag word.
    pub fn flags(&self) -> u16 {
        match self {
            WireMessage::Write { flags, .. } | WireMessage::Read { flags, .. } => *flags,
        }
    }

    /// Wire length field.
    pub fn len(&self) -> u16 {
        match self {
            WireMessage::Write { data, .. } => data.len() as u16,
            WireMessage::Read { data, .. } => data.len() as u16,
        }
    }

    /// Returns true for zero-length records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The narrow "execute transaction" capability a transaction consumes.
///
/// [`I2cDevice`](crate::transact::I2cDevice) implements this over the real
/// i2c-dev ioctls; tests implement it over an in-memory double. Callers
/// executing against one target concurrently must serialize whole
/// `apply` calls, not individual trait calls (see
/// [`SharedI2cDevice`](crate::transact::SharedI2cDevice)).
pub trait I2cTransfer {
    /// The adapter capability set, as cached at open time.
    fn capabilities(&self) -> Functionality;

    /// Makes `address` the active target, enabling 10-bit addressing first
    /// when the address exceeds the 7-bit range. A no-op when the address
    /// is already active.
    ///
    /// # Errors
    /// [`TransferError::Unsupported`] if 10-bit addressing is needed but
    /// not declared by the adapter; [`TransferError::Io`] if the underlying
    /// operation fails.
    fn ensure_target(&mut self, address: u16) -> Result<(), TransferError>;

    /// Executes the ordered message list as one combined transfer.
    ///
    /// The whole list either transfers or fails; implementations must not
    /// split or reorder it.
    fn transfer(&mut self, messages: &mut [WireMessage<'_>]) -> Result<(), TransferError>;
}

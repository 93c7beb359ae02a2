use crate::transact::flags::Functionality;
use crate::transact::wire::MAX_MESSAGES;

/// Errors raised while composing a transaction.
///
/// Construction errors surface at the failing `add_*` call and leave the
/// builder exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The transaction already holds the maximum number of wire messages.
    #[error("combined transfer already holds the maximum of {} messages", MAX_MESSAGES)]
    SegmentLimit,
    /// A segment buffer does not fit the configured storage strategy.
    #[error("segment of {requested} bytes exceeds the storage capacity of {capacity}")]
    BufferCapacity {
        /// Bytes the segment needs.
        requested: usize,
        /// Bytes the strategy can provide per buffer.
        capacity: usize,
    },
}

/// Errors raised while executing against a device handle.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The adapter does not declare a required capability. Raised before
    /// any transfer is attempted.
    #[error("adapter does not support {0:?}")]
    Unsupported(Functionality),
    /// More wire messages than a single `I2C_RDWR` ioctl accepts.
    #[error("transfer exceeds the {}-message ioctl limit", MAX_MESSAGES)]
    TooManyMessages,
    /// An SMBus block payload larger than the protocol allows.
    #[error("block payload of {0} bytes exceeds the SMBus limit")]
    BlockTooLarge(usize),
    /// The underlying syscall failed. Carries the OS error of the single
    /// transfer; there is no per-segment attribution.
    #[error("bus transfer failed")]
    Io(#[from] std::io::Error),
    /// A convenience call failed while composing its internal transaction.
    #[error(transparent)]
    Build(#[from] BuildError),
}

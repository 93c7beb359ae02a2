pub mod builder;
pub mod device;
pub mod error;
pub(crate) mod ffi;
pub mod flags;
pub mod segment;
pub mod smbus;
pub mod storage;
pub mod transaction;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use builder::TransactionBuilder;
pub use device::{I2cDevice, SharedI2cDevice};
pub use error::{BuildError, TransferError};
pub use flags::{Functionality, MessageFlags};
pub use segment::Segment;
pub use smbus::SMBUS_BLOCK_MAX;
pub use storage::{BufferStrategy, HeapStorage, InlineStorage, PooledBuffer, PooledStorage};
pub use transaction::Transaction;
pub use wire::{I2cTransfer, MAX_MESSAGES, WireMessage};

pub mod prelude {
    pub use super::{
        BufferStrategy, BuildError, Functionality, HeapStorage, I2cDevice, I2cTransfer,
        InlineStorage, MAX_MESSAGES, MessageFlags, PooledStorage, Segment, SharedI2cDevice,
        Transaction, TransactionBuilder, TransferError, WireMessage,
    };
}

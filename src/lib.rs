//! Typed multi-segment I2C transactions over the Linux i2c-dev interface.
//!
//! This crate lets a caller compose a sequence of typed register reads and
//! writes against an I2C/SMBus peripheral, merge them into a single ordered
//! `I2C_RDWR` transfer, and execute it atomically against an adapter handle,
//! with read results committed back into caller-owned storage.
//!
//! # Features
//!
//! - **Typed segments** - plain-data values are snapshotted to (or read back
//!   from) raw byte buffers through compile-time `bytemuck` bounds
//! - **Register-pointer merging** - consecutive operations on the same
//!   register offset share a single addressing write
//! - **Pluggable buffer storage** - stack-backed, pooled, or plain heap
//!   buffers selected per builder, so steady-state construction need not
//!   touch the allocator
//! - **Single combined transfer** - every transaction is one `I2C_RDWR`
//!   ioctl, never split, never reordered
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  finalize  ┌─────────────┐   apply   ┌────────────┐
//! │ TransactionBuilder │───────────▶│ Transaction │──────────▶│ I2cDevice  │
//! │                    │            │             │           │            │
//! │  add_write_at()    │            │  ordered,   │  wire     │  I2C_RDWR  │
//! │  add_read_at()     │            │  move-only  │  records  │  ioctl     │
//! │  (offset merging)  │            │  segments   │──────────▶│  (once)    │
//! └────────────────────┘            └─────────────┘           └────────────┘
//!                                          │ on success
//!                                          ▼
//!                                   commit read scratch
//!                                   back to caller storage
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use i2c_transact::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dev = I2cDevice::open("/dev/i2c-1")?;
//!
//! // Compose a transaction against the peripheral at 0x50: set the
//! // register pointer to 0x10, write a byte there, then read it back.
//! let mut readback: u8 = 0;
//! let mut builder = TransactionBuilder::new(0x50, HeapStorage);
//! builder.add_write_at(0x10, &0xABu8, MessageFlags::empty())?;
//! builder.add_read_at(0x10, &mut readback, MessageFlags::empty())?;
//!
//! // One I2C_RDWR ioctl; `readback` holds the result afterwards.
//! builder.finalize().apply(&mut dev)?;
//! drop(builder);
//! assert_eq!(readback, 0xAB);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod transact;

pub mod prelude {
    pub use crate::transact::prelude::*;
}

//! Test support utilities - only compiled in test builds.

use crate::transact::error::TransferError;
use crate::transact::flags::Functionality;
use crate::transact::wire::{I2cTransfer, WireMessage};

/// Snapshot of one wire record as seen by the mock transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenMessage {
    pub address: u16,
    pub flags: u16,
    pub data: Vec<u8>,
    pub read: bool,
}

/// An in-memory transfer target.
///
/// Records every wire record it is handed, counts `ensure_target` and
/// `transfer` invocations, and feeds read buffers either from a scripted
/// byte queue or by echoing the most recent write payload.
pub struct MockBus {
    pub funcs: Functionality,
    pub target: Option<u16>,
    pub ensure_calls: usize,
    pub transfers: usize,
    /// Byte payloads handed to read records, in read order.
    pub script: Vec<Vec<u8>>,
    /// When set, each read record receives the bytes of the most recent
    /// write record instead of consuming the script.
    pub echo_writes: bool,
    /// When set, `transfer` records nothing and fails with `EIO`.
    pub fail_transfer: bool,
    pub seen: Vec<SeenMessage>,
}

impl MockBus {
    /// A bus with full I2C transfer capability and 10-bit support.
    pub fn new() -> Self {
        Self {
            funcs: Functionality::I2C | Functionality::TEN_BIT_ADDR,
            target: None,
            ensure_calls: 0,
            transfers: 0,
            script: Vec::new(),
            echo_writes: false,
            fail_transfer: false,
            seen: Vec::new(),
        }
    }

    /// A bus that copies the latest write payload into each read record.
    pub fn echo() -> Self {
        Self {
            echo_writes: true,
            ..Self::new()
        }
    }

    /// An SMBus-only adapter: no arbitrary message transfer.
    pub fn without_i2c() -> Self {
        Self {
            funcs: Functionality::SMBUS_BYTE_DATA,
            ..Self::new()
        }
    }

    /// A bus whose transfer primitive always fails.
    pub fn failing() -> Self {
        Self {
            fail_transfer: true,
            ..Self::new()
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cTransfer for MockBus {
    fn capabilities(&self) -> Functionality {
        self.funcs
    }

    fn ensure_target(&mut self, address: u16) -> Result<(), TransferError> {
        if address > 0x7F && !self.funcs.contains(Functionality::TEN_BIT_ADDR) {
            return Err(TransferError::Unsupported(Functionality::TEN_BIT_ADDR));
        }
        self.ensure_calls += 1;
        self.target = Some(address);
        Ok(())
    }

    fn transfer(&mut self, messages: &mut [WireMessage<'_>]) -> Result<(), TransferError> {
        self.transfers += 1;
        if self.fail_transfer {
            return Err(std::io::Error::from_raw_os_error(libc::EIO).into());
        }

        let mut script = self.script.drain(..);
        let mut last_write: Option<Vec<u8>> = None;
        for message in messages.iter_mut() {
            match message {
                WireMessage::Write {
                    address,
                    flags,
                    data,
                } => {
                    last_write = Some(data.to_vec());
                    self.seen.push(SeenMessage {
                        address: *address,
                        flags: *flags,
                        data: data.to_vec(),
                        read: false,
                    });
                }
                WireMessage::Read {
                    address,
                    flags,
                    data,
                } => {
                    let feed = if self.echo_writes {
                        last_write.clone().unwrap_or_default()
                    } else {
                        script.next().unwrap_or_default()
                    };
                    let n = feed.len().min(data.len());
                    data[..n].copy_from_slice(&feed[..n]);
                    self.seen.push(SeenMessage {
                        address: *address,
                        flags: *flags,
                        data: data.to_vec(),
                        read: true,
                    });
                }
            }
        }
        Ok(())
    }
}

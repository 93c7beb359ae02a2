//! The adapter handle: open, capability cache, target addressing, and the
//! real transfer primitive.

use std::fs::File;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytemuck::{AnyBitPattern, NoUninit};
use tracing::{debug, trace};

use crate::transact::builder::TransactionBuilder;
use crate::transact::error::TransferError;
use crate::transact::ffi;
use crate::transact::flags::{Functionality, MessageFlags};
use crate::transact::storage::HeapStorage;
use crate::transact::transaction::Transaction;
use crate::transact::wire::{I2cTransfer, MAX_MESSAGES, WireMessage};

/// A handle to one i2c-dev adapter node.
///
/// Opening queries and caches the adapter functionality; the handle exists
/// only in the open state and the node is closed when it drops. The active
/// target address is cached so re-selecting the same peripheral is free.
///
/// Methods take `&mut self`: a plain handle assumes the caller serializes
/// access. Wrap it in [`SharedI2cDevice`] to share one adapter between
/// threads behind a real lock.
pub struct I2cDevice {
    file: File,
    funcs: Functionality,
    address: Option<u16>,
    ten_bit: bool,
}

impl I2cDevice {
    /// Opens an adapter node such as `/dev/i2c-1`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let file = File::options()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        let funcs = Functionality::from_bits_truncate(ffi::funcs(file.as_raw_fd())?);
        debug!(path = %path.display(), funcs = ?funcs, "opened i2c adapter");
        Ok(Self {
            file,
            funcs,
            address: None,
            ten_bit: false,
        })
    }

    /// Opens an adapter node and immediately selects a target peripheral.
    pub fn open_with_address<P: AsRef<Path>>(
        path: P,
        address: u16,
    ) -> Result<Self, TransferError> {
        let mut device = Self::open(path)?;
        device.set_target(address)?;
        Ok(device)
    }

    /// The adapter functionality mask cached at open time.
    pub fn capabilities(&self) -> Functionality {
        self.funcs
    }

    /// Returns true if the adapter declares every flag in `wanted`.
    pub fn supports(&self, wanted: Functionality) -> bool {
        self.funcs.contains(wanted)
    }

    /// The currently selected target address, if any.
    pub fn address(&self) -> Option<u16> {
        self.address
    }

    /// Selects `address` as the active target.
    ///
    /// A no-op when the address is already active. Addresses beyond the
    /// 7-bit range switch the adapter into 10-bit mode first, which
    /// requires [`Functionality::TEN_BIT_ADDR`].
    pub fn set_target(&mut self, address: u16) -> Result<(), TransferError> {
        self.select(address, false)
    }

    /// Like [`set_target`](I2cDevice::set_target), but claims the address
    /// even if another kernel driver holds it.
    pub fn set_target_forced(&mut self, address: u16) -> Result<(), TransferError> {
        self.select(address, true)
    }

    fn select(&mut self, address: u16, force: bool) -> Result<(), TransferError> {
        if self.address == Some(address) {
            return Ok(());
        }
        if address > 0x7F && !self.ten_bit {
            self.set_ten_bit(true)?;
        }
        ffi::set_slave(self.file.as_raw_fd(), address, force)?;
        self.address = Some(address);
        trace!(address, force, "selected i2c target");
        Ok(())
    }

    /// Enables or disables 10-bit addressing.
    ///
    /// # Errors
    /// [`TransferError::Unsupported`] when enabling on an adapter without
    /// [`Functionality::TEN_BIT_ADDR`].
    pub fn set_ten_bit(&mut self, enable: bool) -> Result<(), TransferError> {
        if enable {
            self.require(Functionality::TEN_BIT_ADDR)?;
        }
        ffi::set_tenbit(self.file.as_raw_fd(), enable)?;
        self.ten_bit = enable;
        debug!(enable, "switched 10-bit addressing");
        Ok(())
    }

    /// Enables or disables SMBus Packet Error Checking.
    pub fn set_pec(&mut self, enable: bool) -> Result<(), TransferError> {
        self.require(Functionality::SMBUS_PEC)?;
        ffi::set_pec(self.file.as_raw_fd(), enable)?;
        Ok(())
    }

    /// Sets how often the adapter retries an unacknowledged transfer.
    /// Adapter-wide; there is no per-transaction retry.
    pub fn set_retries(&mut self, retries: u32) -> Result<(), TransferError> {
        ffi::set_retries(self.file.as_raw_fd(), retries)?;
        Ok(())
    }

    /// Sets the adapter transfer timeout. Granularity is 10ms; zero
    /// durations round up to one unit.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransferError> {
        let units = (timeout.as_millis() / 10).max(1) as u32;
        ffi::set_timeout_deciunits(self.file.as_raw_fd(), units)?;
        Ok(())
    }

    /// Writes a typed value to the register at `offset`, as a single
    /// combined transaction.
    pub fn write_register<T: NoUninit>(
        &mut self,
        offset: u16,
        value: &T,
    ) -> Result<(), TransferError> {
        let address = self.target_address()?;
        let mut builder = TransactionBuilder::new(address, HeapStorage);
        builder.add_write_at(offset, value, MessageFlags::empty())?;
        builder.finalize().apply(self)
    }

    /// Reads a typed value from the register at `offset`, as a single
    /// combined transaction.
    pub fn read_register<T: NoUninit + AnyBitPattern>(
        &mut self,
        offset: u16,
    ) -> Result<T, TransferError> {
        let address = self.target_address()?;
        let mut value = T::zeroed();
        {
            let mut builder = TransactionBuilder::new(address, HeapStorage);
            builder.add_read_at(offset, &mut value, MessageFlags::empty())?;
            builder.finalize().apply(self)?;
        }
        Ok(value)
    }

    /// Fails with [`TransferError::Unsupported`] unless the adapter
    /// declares every flag in `wanted`.
    pub(crate) fn require(&self, wanted: Functionality) -> Result<(), TransferError> {
        if !self.funcs.contains(wanted) {
            return Err(TransferError::Unsupported(wanted));
        }
        Ok(())
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// The cached target address, which register-level convenience calls
    /// require to have been selected beforehand.
    fn target_address(&self) -> Result<u16, TransferError> {
        self.address.ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no target address selected",
            )
            .into()
        })
    }
}

impl core::fmt::Debug for I2cDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("I2cDevice")
            .field("fd", &self.file.as_raw_fd())
            .field("funcs", &self.funcs)
            .field("address", &self.address)
            .finish()
    }
}

impl I2cTransfer for I2cDevice {
    fn capabilities(&self) -> Functionality {
        self.funcs
    }

    fn ensure_target(&mut self, address: u16) -> Result<(), TransferError> {
        self.set_target(address)
    }

    fn transfer(&mut self, messages: &mut [WireMessage<'_>]) -> Result<(), TransferError> {
        self.require(Functionality::I2C)?;
        if messages.len() > MAX_MESSAGES {
            return Err(TransferError::TooManyMessages);
        }

        trace!(messages = messages.len(), "executing combined transfer");
        let mut msgs: heapless::Vec<ffi::i2c_msg, MAX_MESSAGES> =
            messages.iter_mut().map(ffi::i2c_msg::from_wire).collect();
        ffi::rdwr(self.file.as_raw_fd(), &mut msgs)?;
        Ok(())
    }
}

/// A clonable, internally locked adapter handle.
///
/// The alternative to external synchronization: every operation, including
/// a whole [`Transaction::apply`], runs under one mutex acquisition, so
/// concurrent users of the same adapter never interleave target selection
/// with someone else's transfer.
#[derive(Clone, Debug)]
pub struct SharedI2cDevice {
    inner: Arc<Mutex<I2cDevice>>,
}

impl SharedI2cDevice {
    /// Wraps an open device handle in a shared lock.
    pub fn new(device: I2cDevice) -> Self {
        Self {
            inner: Arc::new(Mutex::new(device)),
        }
    }

    /// Opens an adapter node directly into a shared handle.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TransferError> {
        Ok(Self::new(I2cDevice::open(path)?))
    }

    /// Runs `f` with exclusive access to the device.
    pub fn with<R>(&self, f: impl FnOnce(&mut I2cDevice) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Executes a whole transaction under a single lock acquisition.
    pub fn apply<S>(&self, transaction: Transaction<'_, S>) -> Result<(), TransferError>
    where
        S: crate::transact::storage::BufferStrategy,
    {
        self.with(|device| transaction.apply(device))
    }
}

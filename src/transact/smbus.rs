//! Single-command SMBus operations, forwarded 1:1 to the `I2C_SMBUS` ioctl.
//!
//! Each call targets the device's currently selected peripheral, checks the
//! adapter declares the matching capability bit, and performs exactly one
//! kernel command. None of these go through the transaction pipeline; they
//! exist for peripherals (and adapters) that only speak the SMBus subset.

use crate::transact::device::I2cDevice;
use crate::transact::error::TransferError;
use crate::transact::ffi;
use crate::transact::flags::Functionality;

pub use crate::transact::ffi::SMBUS_BLOCK_MAX;

macro_rules! impl_smbus_data_ops {
    ($($kind:ident, $ty:ident, $size:ident, $read_gate:ident, $write_gate:ident;)+) => {
        paste::paste! {
            impl I2cDevice {
                $(
                    #[doc = "Reads a `" $ty "` from the `command` register."]
                    pub fn [<read_ $kind _data>](
                        &mut self,
                        command: u8,
                    ) -> Result<$ty, TransferError> {
                        self.require(Functionality::$read_gate)?;
                        let mut data = ffi::i2c_smbus_data::zeroed();
                        ffi::smbus_access(
                            self.fd(),
                            ffi::I2C_SMBUS_READ,
                            command,
                            ffi::$size,
                            Some(&mut data),
                        )?;
                        Ok(data.$kind())
                    }

                    #[doc = "Writes a `" $ty "` to the `command` register."]
                    pub fn [<write_ $kind _data>](
                        &mut self,
                        command: u8,
                        value: $ty,
                    ) -> Result<(), TransferError> {
                        self.require(Functionality::$write_gate)?;
                        let mut data = ffi::i2c_smbus_data::zeroed();
                        data.[<set_ $kind>](value);
                        ffi::smbus_access(
                            self.fd(),
                            ffi::I2C_SMBUS_WRITE,
                            command,
                            ffi::$size,
                            Some(&mut data),
                        )?;
                        Ok(())
                    }
                )+
            }
        }
    };
}

impl_smbus_data_ops! {
    byte, u8, I2C_SMBUS_BYTE_DATA, SMBUS_READ_BYTE_DATA, SMBUS_WRITE_BYTE_DATA;
    word, u16, I2C_SMBUS_WORD_DATA, SMBUS_READ_WORD_DATA, SMBUS_WRITE_WORD_DATA;
}

impl I2cDevice {
    /// Sends a single bit in place of the read/write bit.
    pub fn write_quick(&mut self, bit: bool) -> Result<(), TransferError> {
        self.require(Functionality::SMBUS_QUICK)?;
        ffi::smbus_access(self.fd(), bit as u8, 0, ffi::I2C_SMBUS_QUICK, None)?;
        Ok(())
    }

    /// Receives a single byte without addressing a register.
    pub fn read_byte(&mut self) -> Result<u8, TransferError> {
        self.require(Functionality::SMBUS_READ_BYTE)?;
        let mut data = ffi::i2c_smbus_data::zeroed();
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_READ,
            0,
            ffi::I2C_SMBUS_BYTE,
            Some(&mut data),
        )?;
        Ok(data.byte())
    }

    /// Sends a single byte without addressing a register.
    pub fn write_byte(&mut self, value: u8) -> Result<(), TransferError> {
        self.require(Functionality::SMBUS_WRITE_BYTE)?;
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_WRITE,
            value,
            ffi::I2C_SMBUS_BYTE,
            None,
        )?;
        Ok(())
    }

    /// Sends a word to the `command` register and reads a word back.
    pub fn process_call(&mut self, command: u8, value: u16) -> Result<u16, TransferError> {
        self.require(Functionality::SMBUS_PROC_CALL)?;
        let mut data = ffi::i2c_smbus_data::zeroed();
        data.set_word(value);
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_WRITE,
            command,
            ffi::I2C_SMBUS_PROC_CALL,
            Some(&mut data),
        )?;
        Ok(data.word())
    }

    /// Reads a length-prefixed block (up to [`SMBUS_BLOCK_MAX`] bytes)
    /// from the `command` register.
    pub fn read_block_data(&mut self, command: u8) -> Result<Vec<u8>, TransferError> {
        self.require(Functionality::SMBUS_READ_BLOCK_DATA)?;
        let mut data = ffi::i2c_smbus_data::zeroed();
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_READ,
            command,
            ffi::I2C_SMBUS_BLOCK_DATA,
            Some(&mut data),
        )?;
        Ok(data.block().to_vec())
    }

    /// Writes a block of up to [`SMBUS_BLOCK_MAX`] bytes to the `command`
    /// register.
    pub fn write_block_data(&mut self, command: u8, payload: &[u8]) -> Result<(), TransferError> {
        self.require(Functionality::SMBUS_WRITE_BLOCK_DATA)?;
        let mut data = block_payload(payload)?;
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_WRITE,
            command,
            ffi::I2C_SMBUS_BLOCK_DATA,
            Some(&mut data),
        )?;
        Ok(())
    }

    /// Writes a block to the `command` register and reads the peripheral's
    /// block response.
    pub fn block_process_call(
        &mut self,
        command: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>, TransferError> {
        self.require(Functionality::SMBUS_BLOCK_PROC_CALL)?;
        let mut data = block_payload(payload)?;
        ffi::smbus_access(
            self.fd(),
            ffi::I2C_SMBUS_WRITE,
            command,
            ffi::I2C_SMBUS_BLOCK_PROC_CALL,
            Some(&mut data),
        )?;
        Ok(data.block().to_vec())
    }
}

fn block_payload(payload: &[u8]) -> Result<ffi::i2c_smbus_data, TransferError> {
    if payload.len() > SMBUS_BLOCK_MAX {
        return Err(TransferError::BlockTooLarge(payload.len()));
    }
    let mut data = ffi::i2c_smbus_data::zeroed();
    data.set_block(payload);
    Ok(data)
}

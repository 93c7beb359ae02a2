//! Raw i2c-dev ABI: `#[repr(C)]` mirrors and ioctl wrappers.
//!
//! Everything unsafe in the crate lives here. The wrappers take a raw file
//! descriptor, return `std::io::Result`, and never retain the pointers they
//! are given beyond the ioctl call.

#![allow(unsafe_code)]
#![allow(non_camel_case_types)]

use std::io;
use std::os::fd::RawFd;

use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

use crate::transact::wire::WireMessage;

// Ioctl request codes, fixed by the kernel i2c-dev interface.
const I2C_RETRIES: libc::c_ulong = 0x0701;
const I2C_TIMEOUT: libc::c_ulong = 0x0702;
const I2C_SLAVE: libc::c_ulong = 0x0703;
const I2C_TENBIT: libc::c_ulong = 0x0704;
const I2C_FUNCS: libc::c_ulong = 0x0705;
const I2C_SLAVE_FORCE: libc::c_ulong = 0x0706;
const I2C_RDWR: libc::c_ulong = 0x0707;
const I2C_PEC: libc::c_ulong = 0x0708;
const I2C_SMBUS: libc::c_ulong = 0x0720;

/// SMBus transfer direction for `i2c_smbus_ioctl_data.read_write`.
pub(crate) const I2C_SMBUS_READ: u8 = 1;
pub(crate) const I2C_SMBUS_WRITE: u8 = 0;

// SMBus transaction sizes for `i2c_smbus_ioctl_data.size`.
pub(crate) const I2C_SMBUS_QUICK: u32 = 0;
pub(crate) const I2C_SMBUS_BYTE: u32 = 1;
pub(crate) const I2C_SMBUS_BYTE_DATA: u32 = 2;
pub(crate) const I2C_SMBUS_WORD_DATA: u32 = 3;
pub(crate) const I2C_SMBUS_PROC_CALL: u32 = 4;
pub(crate) const I2C_SMBUS_BLOCK_DATA: u32 = 5;
pub(crate) const I2C_SMBUS_BLOCK_PROC_CALL: u32 = 7;

/// Most bytes in an SMBus block transfer.
pub const SMBUS_BLOCK_MAX: usize = 32;

/// Mirror of the kernel `struct i2c_msg`.
#[repr(C)]
pub(crate) struct i2c_msg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

impl i2c_msg {
    /// Projects a wire record into the fixed kernel layout. The pointer
    /// borrows from `message` and must not outlive it.
    pub(crate) fn from_wire(message: &mut WireMessage<'_>) -> Self {
        let (addr, flags, len, buf) = match message {
            WireMessage::Write {
                address,
                flags,
                data,
            } => (*address, *flags, data.len() as u16, data.as_ptr() as *mut u8),
            WireMessage::Read {
                address,
                flags,
                data,
            } => (*address, *flags, data.len() as u16, data.as_mut_ptr()),
        };
        Self {
            addr,
            flags,
            len,
            buf,
        }
    }
}

/// Mirror of the kernel `struct i2c_rdwr_ioctl_data`.
#[repr(C)]
struct i2c_rdwr_ioctl_data {
    msgs: *mut i2c_msg,
    nmsgs: u32,
}

/// Mirror of the kernel `union i2c_smbus_data`: one byte, one word, or a
/// length-prefixed block of up to [`SMBUS_BLOCK_MAX`] bytes (plus one spare
/// for PEC).
#[derive(Debug)]
#[repr(C)]
pub(crate) struct i2c_smbus_data {
    block: [u8; SMBUS_BLOCK_MAX + 2],
}

impl i2c_smbus_data {
    pub(crate) fn zeroed() -> Self {
        Self {
            block: [0; SMBUS_BLOCK_MAX + 2],
        }
    }

    pub(crate) fn byte(&self) -> u8 {
        self.block[0]
    }

    pub(crate) fn set_byte(&mut self, value: u8) {
        self.block[0] = value;
    }

    pub(crate) fn word(&self) -> u16 {
        u16::from_ne_bytes([self.block[0], self.block[1]])
    }

    pub(crate) fn set_word(&mut self, value: u16) {
        self.block[..2].copy_from_slice(&value.to_ne_bytes());
    }

    /// The length-prefixed block payload.
    pub(crate) fn block(&self) -> &[u8] {
        let len = (self.block[0] as usize).min(SMBUS_BLOCK_MAX);
        &self.block[1..1 + len]
    }

    /// Stores `payload` with its length prefix. Callers bound the length
    /// to [`SMBUS_BLOCK_MAX`] beforehand.
    pub(crate) fn set_block(&mut self, payload: &[u8]) {
        let len = payload.len().min(SMBUS_BLOCK_MAX);
        self.block[0] = len as u8;
        self.block[1..1 + len].copy_from_slice(&payload[..len]);
    }
}

/// Mirror of the kernel `struct i2c_smbus_ioctl_data`.
#[repr(C)]
struct i2c_smbus_ioctl_data {
    read_write: u8,
    command: u8,
    size: u32,
    data: *mut i2c_smbus_data,
}

ioctl_write_int_bad!(ioctl_set_retries, I2C_RETRIES);
ioctl_write_int_bad!(ioctl_set_timeout, I2C_TIMEOUT);
ioctl_write_int_bad!(ioctl_set_slave, I2C_SLAVE);
ioctl_write_int_bad!(ioctl_set_slave_force, I2C_SLAVE_FORCE);
ioctl_write_int_bad!(ioctl_set_tenbit, I2C_TENBIT);
ioctl_write_int_bad!(ioctl_set_pec, I2C_PEC);
ioctl_read_bad!(ioctl_funcs, I2C_FUNCS, libc::c_ulong);
ioctl_write_ptr_bad!(ioctl_rdwr, I2C_RDWR, i2c_rdwr_ioctl_data);
ioctl_write_ptr_bad!(ioctl_smbus, I2C_SMBUS, i2c_smbus_ioctl_data);

fn into_io<T>(result: nix::Result<T>) -> io::Result<T> {
    result.map_err(|errno| io::Error::from_raw_os_error(errno as i32))
}

/// Queries the adapter functionality mask.
pub(crate) fn funcs(fd: RawFd) -> io::Result<u64> {
    let mut mask: libc::c_ulong = 0;
    into_io(unsafe { ioctl_funcs(fd, &mut mask) })?;
    Ok(mask as u64)
}

/// Selects the active target address.
pub(crate) fn set_slave(fd: RawFd, address: u16, force: bool) -> io::Result<()> {
    let result = if force {
        unsafe { ioctl_set_slave_force(fd, address as libc::c_int) }
    } else {
        unsafe { ioctl_set_slave(fd, address as libc::c_int) }
    };
    into_io(result)?;
    Ok(())
}

/// Enables or disables 10-bit addressing.
pub(crate) fn set_tenbit(fd: RawFd, enable: bool) -> io::Result<()> {
    into_io(unsafe { ioctl_set_tenbit(fd, enable as libc::c_int) })?;
    Ok(())
}

/// Enables or disables SMBus Packet Error Checking.
pub(crate) fn set_pec(fd: RawFd, enable: bool) -> io::Result<()> {
    into_io(unsafe { ioctl_set_pec(fd, enable as libc::c_int) })?;
    Ok(())
}

/// Sets the transfer retry count for unacknowledged transactions.
pub(crate) fn set_retries(fd: RawFd, retries: u32) -> io::Result<()> {
    into_io(unsafe { ioctl_set_retries(fd, retries as libc::c_int) })?;
    Ok(())
}

/// Sets the transfer timeout, in 10ms units.
pub(crate) fn set_timeout_deciunits(fd: RawFd, units: u32) -> io::Result<()> {
    into_io(unsafe { ioctl_set_timeout(fd, units as libc::c_int) })?;
    Ok(())
}

/// Submits one combined read/write transfer.
pub(crate) fn rdwr(fd: RawFd, msgs: &mut [i2c_msg]) -> io::Result<()> {
    let data = i2c_rdwr_ioctl_data {
        msgs: msgs.as_mut_ptr(),
        nmsgs: msgs.len() as u32,
    };
    into_io(unsafe { ioctl_rdwr(fd, &data) })?;
    Ok(())
}

/// Executes one SMBus command.
pub(crate) fn smbus_access(
    fd: RawFd,
    read_write: u8,
    command: u8,
    size: u32,
    data: Option<&mut i2c_smbus_data>,
) -> io::Result<()> {
    let data = i2c_smbus_ioctl_data {
        read_write,
        command,
        size,
        data: data.map_or(std::ptr::null_mut(), |d| d as *mut i2c_smbus_data),
    };
    into_io(unsafe { ioctl_smbus(fd, &data) })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c_msg_matches_the_kernel_abi_layout() {
        assert_eq!(core::mem::offset_of!(i2c_msg, addr), 0);
        assert_eq!(core::mem::offset_of!(i2c_msg, flags), 2);
        assert_eq!(core::mem::offset_of!(i2c_msg, len), 4);
        // The buffer pointer sits after the scalar fields, padded to
        // pointer alignment.
        let ptr = core::mem::size_of::<*mut u8>();
        assert_eq!(core::mem::offset_of!(i2c_msg, buf), 8);
        assert_eq!(core::mem::size_of::<i2c_msg>(), 8 + ptr);
    }

    #[test]
    fn wire_projection_carries_address_flags_and_length() {
        let mut payload = [0xAB, 0xCD];
        let mut message = WireMessage::Read {
            address: 0x50,
            flags: 0x0001,
            data: &mut payload,
        };
        let msg = i2c_msg::from_wire(&mut message);
        assert_eq!(msg.addr, 0x50);
        assert_eq!(msg.flags, 0x0001);
        assert_eq!(msg.len, 2);
        assert!(!msg.buf.is_null());
    }

    #[test]
    fn smbus_data_accessors_share_the_union_storage() {
        let mut data = i2c_smbus_data::zeroed();
        data.set_word(0xBEEF);
        assert_eq!(data.word(), 0xBEEF);
        assert_eq!(data.byte(), 0xBEEFu16.to_ne_bytes()[0]);
    }

    #[test]
    fn smbus_block_round_trips_with_length_prefix() {
        let mut data = i2c_smbus_data::zeroed();
        data.set_block(&[1, 2, 3]);
        assert_eq!(data.block(), &[1, 2, 3]);

        // Oversized payloads are clamped to the protocol maximum.
        data.set_block(&[0xAA; 40]);
        assert_eq!(data.block().len(), SMBUS_BLOCK_MAX);
    }
}

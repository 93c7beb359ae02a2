//! Protocol-modifier and adapter-capability bit sets.
//!
//! Both types mirror the kernel i2c-dev ABI exactly: [`MessageFlags`] is the
//! 16-bit `i2c_msg.flags` word submitted with each wire record, and
//! [`Functionality`] is the 64-bit mask returned by the `I2C_FUNCS` ioctl.
//! The bit values are fixed by the kernel and must not be renumbered.

use bitflags::bitflags;

bitflags! {
    /// Per-message protocol modifier flags (`i2c_msg.flags`).
    ///
    /// The direction bit is managed by the segment constructors: read
    /// segments always carry [`MessageFlags::RD`], write segments never do,
    /// regardless of what the caller supplies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u16 {
        /// Read transfer, from peripheral to controller.
        const RD = 0x0001;
        /// The message address is a 10-bit address. Requires
        /// [`Functionality::TEN_BIT_ADDR`].
        const TEN = 0x0010;
        /// The message data length is taken from the first received byte.
        const RECV_LEN = 0x0400;
        /// Omit the controller acknowledge in a read transfer. Requires
        /// [`Functionality::PROTOCOL_MANGLING`].
        const NO_RD_ACK = 0x0800;
        /// Continue after a non-acknowledge. Requires
        /// [`Functionality::PROTOCOL_MANGLING`].
        const IGNORE_NAK = 0x1000;
        /// Invert the direction flag on the wire. Requires
        /// [`Functionality::PROTOCOL_MANGLING`].
        const REV_DIR_ADDR = 0x2000;
        /// Omit the start condition and peripheral address, continuing the
        /// previous message's transfer phase. Requires
        /// [`Functionality::NOSTART`].
        const NOSTART = 0x4000;
        /// Force a stop condition even if this is not the last message.
        /// Requires [`Functionality::PROTOCOL_MANGLING`].
        const STOP = 0x8000;
    }
}

impl MessageFlags {
    /// The raw 16-bit word submitted in the wire record.
    #[inline]
    pub fn wire(self) -> u16 {
        self.bits()
    }

    /// Returns true if the direction bit marks a read transfer.
    #[inline]
    pub fn is_read(self) -> bool {
        self.contains(MessageFlags::RD)
    }
}

bitflags! {
    /// Adapter capability flags (`I2C_FUNCS`).
    ///
    /// Queried once when a device handle is opened and cached for the life
    /// of the handle. Every operation that depends on adapter support is
    /// gated on its bit before any transfer is attempted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Functionality: u64 {
        /// Plain I2C-level transfers; required for combined `I2C_RDWR`
        /// transactions. Pure SMBus adapters typically lack this.
        const I2C = 0x0000_0001;
        /// Handles the 10-bit address extension.
        const TEN_BIT_ADDR = 0x0000_0002;
        /// Knows about the `IGNORE_NAK`, `REV_DIR_ADDR` and `NO_RD_ACK`
        /// protocol-mangling message flags.
        const PROTOCOL_MANGLING = 0x0000_0004;
        /// Supports SMBus Packet Error Checking.
        const SMBUS_PEC = 0x0000_0008;
        /// Can skip the repeated start sequence (`NOSTART` flag).
        const NOSTART = 0x0000_0010;
        /// Operates only as a peripheral-side interface.
        const SLAVE = 0x0000_0020;
        /// Handles the SMBus block process call command.
        const SMBUS_BLOCK_PROC_CALL = 0x0000_8000;
        /// Handles the SMBus quick command.
        const SMBUS_QUICK = 0x0001_0000;
        /// Handles the SMBus receive byte command.
        const SMBUS_READ_BYTE = 0x0002_0000;
        /// Handles the SMBus send byte command.
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        /// Handles the SMBus read byte data command.
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        /// Handles the SMBus write byte data command.
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        /// Handles the SMBus read word data command.
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        /// Handles the SMBus write word data command.
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        /// Handles the SMBus process call command.
        const SMBUS_PROC_CALL = 0x0080_0000;
        /// Handles the SMBus read block data command.
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        /// Handles the SMBus write block data command.
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        /// Handles the SMBus read I2C block command.
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000;
        /// Handles the SMBus write I2C block command.
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000;
        /// Supports the SMBus host notify command.
        const SMBUS_HOST_NOTIFY = 0x1000_0000;

        // Combined groups as defined by the kernel header.

        /// Receive byte and send byte.
        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        /// Read and write byte data.
        const SMBUS_BYTE_DATA =
            Self::SMBUS_READ_BYTE_DATA.bits() | Self::SMBUS_WRITE_BYTE_DATA.bits();
        /// Read and write word data.
        const SMBUS_WORD_DATA =
            Self::SMBUS_READ_WORD_DATA.bits() | Self::SMBUS_WRITE_WORD_DATA.bits();
        /// Read and write block data.
        const SMBUS_BLOCK_DATA =
            Self::SMBUS_READ_BLOCK_DATA.bits() | Self::SMBUS_WRITE_BLOCK_DATA.bits();
        /// Read and write I2C block data.
        const SMBUS_I2C_BLOCK =
            Self::SMBUS_READ_I2C_BLOCK.bits() | Self::SMBUS_WRITE_I2C_BLOCK.bits();
        /// All SMBus commands an I2C adapter can emulate in software.
        const SMBUS_EMUL = Self::SMBUS_QUICK.bits()
            | Self::SMBUS_BYTE.bits()
            | Self::SMBUS_BYTE_DATA.bits()
            | Self::SMBUS_WORD_DATA.bits()
            | Self::SMBUS_PROC_CALL.bits()
            | Self::SMBUS_WRITE_BLOCK_DATA.bits()
            | Self::SMBUS_I2C_BLOCK.bits()
            | Self::SMBUS_PEC.bits();
    }
}

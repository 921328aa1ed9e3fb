//! Wire-level constants shared across layers: MPSSE opcodes, the 32-bit
//! GPIO line layout, the TCS3472 register map, and the packed error/flag
//! codes from the original design.
//!
//! See Chapter 5 ("Byte Commands for MPSSE and MCU Host Emulation Modes")
//! of FTDI's AN_108 for the opcode semantics, and the TCS3472 datasheet for
//! the register map.

/// USB vendor ID of the bridge.
pub const VENDOR_ID: u16 = 0x1939;
/// USB product ID of the bridge.
pub const PRODUCT_ID: u16 = 0x0024;
/// Exact USB descriptor string the device manager matches on.
pub const DEVICE_DESCRIPTION: &str = "COLOR-CTRL";

/// MPSSE opcode: set data bits on the low byte (value, direction payload).
pub const W_LOWBYTE: u8 = 0x80;
/// MPSSE opcode: set data bits on the high byte (value, direction payload).
pub const W_HIGHBYTE: u8 = 0x82;
/// MPSSE opcode: read data bits on the low byte (no payload, appends to IN).
pub const R_LOWBYTE: u8 = 0x81;
/// MPSSE opcode: read data bits on the high byte (no payload, appends to IN).
pub const R_HIGHBYTE: u8 = 0x83;

/// All 16 SCL lines, one per bus, packed into the odd bits of the 32-bit word.
pub const SCL_MASK: u32 = 0xAAAA_AAAA;
/// All 16 SDA lines, one per bus, packed into the even bits of the 32-bit word.
pub const SDA_MASK: u32 = 0x5555_5555;

/// Direction byte with all four SDA lanes (of one byte) and both SCL lanes set to output.
pub const OUTPUT: u8 = 0xFF;
/// Direction byte with all four SDA lanes (of one byte) set to input; SCL lanes still output.
pub const INPUT: u8 = 0xAA;

/// Byte mask selecting channel A's low byte (buses 0..3) within the 32-bit word.
pub const MASK_A_LOW: u32 = 0x0000_00FF;
/// Byte mask selecting channel A's high byte (buses 4..7).
pub const MASK_A_HIGH: u32 = 0x0000_FF00;
/// Byte mask selecting channel B's low byte (buses 8..11).
pub const MASK_B_LOW: u32 = 0x00FF_0000;
/// Byte mask selecting channel B's high byte (buses 12..15).
pub const MASK_B_HIGH: u32 = 0xFF00_0000;

/// Number of buses driven in parallel.
pub const BUS_COUNT: usize = 16;

/// Header bytes the bridge prepends to every bulk-IN packet (modem status bytes).
pub const IN_PACKET_HEADER_LEN: usize = 2;

/// Lower bound on the per-channel staging buffer; buffers may grow past this
/// for oversized transactions (the original C implementation used a fixed
/// 4 KiB array of this size and relied on callers never exceeding it).
pub const MIN_STAGING_CAPACITY: usize = 4096;

static_assertions::const_assert!(MIN_STAGING_CAPACITY >= 4096);

/// I²C address of the TCS3472 (and compatible) sensors.
pub const TCS_ADDRESS: u8 = 0x29;

/// TCS3472 register map.
pub mod tcs3472_reg {
    pub const ENABLE: u8 = 0x00;
    pub const ATIME: u8 = 0x01;
    pub const WTIME: u8 = 0x03;
    pub const AILTL: u8 = 0x04;
    pub const AILTH: u8 = 0x05;
    pub const AIHTL: u8 = 0x06;
    pub const AIHTH: u8 = 0x07;
    pub const PERS: u8 = 0x0C;
    pub const CONFIG: u8 = 0x0D;
    pub const CONTROL: u8 = 0x0F;
    pub const ID: u8 = 0x12;
    pub const STATUS: u8 = 0x13;
    pub const CDATA: u8 = 0x14;
    pub const CDATAH: u8 = 0x15;
    pub const RDATA: u8 = 0x16;
    pub const RDATAH: u8 = 0x17;
    pub const GDATA: u8 = 0x18;
    pub const GDATAH: u8 = 0x19;
    pub const BDATA: u8 = 0x1A;
    pub const BDATAH: u8 = 0x1B;
}

/// TCS3472 command-byte control bits (datasheet §3.2).
pub mod tcs3472_bits {
    /// Must be set on every command byte sent to the sensor.
    pub const COMMAND: u8 = 0x80;
    /// Set for multi-byte register reads (register address auto-increments).
    pub const AUTO_INCREMENT: u8 = 0x20;
    /// Special-function selector, combined with `INTCLEAR` to clear a pending interrupt.
    pub const SPECIAL: u8 = 0x60;
    /// Special-function: interrupt clear.
    pub const INTCLEAR: u8 = 0x06;
    /// ENABLE register: power on.
    pub const PON: u8 = 0x01;
    /// ENABLE register: RGBC enable.
    pub const AEN: u8 = 0x02;
    /// ENABLE register: wait enable.
    pub const WEN: u8 = 0x08;
    /// ENABLE register: RGBC interrupt enable.
    pub const AIEN: u8 = 0x10;
    /// CONFIG register: wait long (12x WTIME multiplier).
    pub const WLONG: u8 = 0x02;
    /// STATUS register: RGBC valid (a conversion cycle has completed).
    pub const AVALID: u8 = 0x01;
}

/// Valid TCS3472 identification byte values.
pub const TCS3472_IDS: [u8; 2] = [0x14, 0x44];

/// Packed positive-return flag bits (spec §6).
pub mod flags {
    pub const FLAG_ID: u32 = 0x4000_0000;
    pub const FLAG_INCOMPLETE_CONVERSION: u32 = 0x2000_0000;
    pub const FLAG_SATURATED: u32 = 0x1000_0000;
    pub const DEVICE_FATAL: u32 = 0x0800_0000;
    pub const USB: u32 = 0x0400_0000;
}

/// Negative transport error codes (spec §6).
pub mod error_codes {
    pub const WRITE_ERR_CH_A: i32 = -1;
    pub const WRITE_ERR_CH_B: i32 = -2;
    pub const READ_ERR_CH_A: i32 = -3;
    pub const READ_ERR_CH_B: i32 = -4;
    pub const INCORRECT_AMOUNT: i32 = -5;
    pub const INDEXING: i32 = -100;
}

/// Which of the two bridge channels a given operation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Channel A, driving buses 0..7.
    A,
    /// Channel B, driving buses 8..15.
    B,
}

impl Channel {
    /// Low/high byte masks for this channel, in (low, high) order.
    #[inline]
    pub fn masks(self) -> (u32, u32) {
        match self {
            Channel::A => (MASK_A_LOW, MASK_A_HIGH),
            Channel::B => (MASK_B_LOW, MASK_B_HIGH),
        }
    }

    /// Bit offset of this channel's low byte within the 32-bit line word.
    #[inline]
    pub fn shift(self) -> u32 {
        match self {
            Channel::A => 0,
            Channel::B => 16,
        }
    }

    /// The bus indices (0-based, global numbering) driven by this channel.
    #[inline]
    pub fn bus_range(self) -> core::ops::Range<usize> {
        match self {
            Channel::A => 0..8,
            Channel::B => 8..16,
        }
    }
}

//! embedded-hal `blocking::i2c` adapter for a single bus of the array.
//!
//! The engine's native operations are all sixteen-way broadcasts (spec
//! §4.3.1/§4.3.4); embedded-hal's `i2c::Write`/`i2c::WriteRead` traits
//! describe exactly one bus. [`SingleBus`] borrows one [`Tcs3472Array`] and
//! pins it to one bus index, using the single-bus write/read variants
//! (§4.3.2) so the other fifteen buses are left untouched — matching the
//! teacher's own `i2c::hal` module, which adapts its single-controller `I2c`
//! type the same way.

use embedded_hal::blocking::i2c;

use crate::engine::BulkChannel;
use crate::error::ColorControllerError;
use crate::sensor::Tcs3472Array;

/// A view onto one bus of a [`Tcs3472Array`], usable anywhere an
/// embedded-hal `i2c::Write`/`i2c::WriteRead` implementor is expected.
pub struct SingleBus<'a, C: BulkChannel> {
    array: &'a mut Tcs3472Array<C>,
    bus: usize,
}

impl<'a, C: BulkChannel> SingleBus<'a, C> {
    /// Pins `array` to `bus` (0..16) for the lifetime of the borrow.
    pub fn new(array: &'a mut Tcs3472Array<C>, bus: usize) -> Self {
        SingleBus { array, bus }
    }
}

impl<'a, C: BulkChannel> i2c::Write for SingleBus<'a, C> {
    type Error = ColorControllerError;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.array.write_raw_one_bus(addr, bytes, self.bus)
    }
}

impl<'a, C: BulkChannel> i2c::WriteRead for SingleBus<'a, C> {
    type Error = ColorControllerError;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.array.transact_read_raw_one_bus(addr, bytes, self.bus, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BitEngine, Transport};
    use crate::testing::fake_bridge::FakeChannel;

    #[test]
    fn write_read_targets_only_the_pinned_bus() {
        // A one-register-byte combined read stages three get_acks (write
        // phase's addr+register, then the repeated-start's re-addressing
        // byte) before its data bits — 12 raw bytes per channel that must
        // precede the actual 9-byte (72-bit) payload, each data bit in turn
        // contributing one rising-edge and one falling-edge (low, high)
        // pair per channel. Total: 2-byte header + 12 ack bytes + 72 * 4
        // data bytes.
        let mut script_a = vec![0u8, 0u8];
        let mut script_b = vec![0u8, 0u8];
        for _ in 0..crate::engine::transact_read_ack_count(1) {
            script_a.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
            script_b.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        }
        for _ in 0..72 {
            script_a.extend_from_slice(&[0xFF, 0xFF, 0x00, 0x00]);
            script_b.extend_from_slice(&[0xFF, 0xFF, 0x00, 0x00]);
        }
        let a = FakeChannel::with_read_script(script_a);
        let b = FakeChannel::with_read_script(script_b);
        let transport = Transport::new(a, b);
        let mut array = Tcs3472Array::new(transport, BitEngine::default());

        let mut buffer = [0u8; 9];
        let mut bus = SingleBus::new(&mut array, 3);
        i2c::WriteRead::write_read(&mut bus, 0x29, &[0x93], &mut buffer).unwrap();
        assert_eq!(buffer, [0u8; 9]);
    }
}

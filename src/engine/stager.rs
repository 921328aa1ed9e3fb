//! L1 — Pin Stager.
//!
//! Encodes a single "set-direction + set-value [+ sample]" step into the
//! bridge's MPSSE byte language, appending to the per-channel command
//! buffers and counting expected read-back bytes.
//!
//! Ownership of the staging buffers and counters lives here, in a value
//! the caller owns, rather than in process-wide statics (see the crate's
//! design notes on why: reentrant or cross-thread use of a shared engine
//! would otherwise be a silent correctness hazard instead of a borrow
//! error).

use crate::consts::{Channel, MIN_STAGING_CAPACITY, R_HIGHBYTE, R_LOWBYTE, W_HIGHBYTE, W_LOWBYTE};

/// Staged command bytes and read-back bookkeeping for one bridge channel.
#[derive(Debug, Default)]
pub struct ChannelStage {
    /// MPSSE command bytes staged for this channel's bulk OUT transfer.
    pub commands: Vec<u8>,
    /// Number of data bytes this channel is expected to return on bulk IN
    /// (excludes the 2-byte status header the bridge always prepends).
    pub read_expect: usize,
}

impl ChannelStage {
    fn new() -> Self {
        ChannelStage { commands: Vec::with_capacity(MIN_STAGING_CAPACITY), read_expect: 0 }
    }

    fn reset(&mut self) {
        self.commands.clear();
        self.read_expect = 0;
    }
}

/// Owns the two per-channel staging buffers for one device.
///
/// *Invariant*: between transactions, both channels' `read_expect` are
/// zero and `commands` are empty; during a transaction, channel A and B
/// staging proceed in exact lock-step — every [`PinStager::stage_step`]
/// call appends to both buffers in the same call.
#[derive(Debug, Default)]
pub struct PinStager {
    pub a: ChannelStage,
    pub b: ChannelStage,
}

impl PinStager {
    /// Creates an empty stager with both channels reset.
    pub fn new() -> Self {
        PinStager { a: ChannelStage::new(), b: ChannelStage::new() }
    }

    /// True iff both channels have no pending commands and no expected
    /// read-back bytes — the state that must hold before and after every
    /// flush.
    pub fn is_clean(&self) -> bool {
        self.a.commands.is_empty()
            && self.a.read_expect == 0
            && self.b.commands.is_empty()
            && self.b.read_expect == 0
    }

    /// Resets both channels to the clean state. Called at the start of
    /// every transaction and at the end of every flush, success or failure.
    pub fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
    }

    /// Appends a set-direction/set-value step for both channels, driven
    /// from a single 32-bit line word. Direction bits set to 1 mark
    /// outputs; SCL lines must always appear with their direction bit set.
    ///
    /// Appends exactly 6 bytes per channel: one `W_LOWBYTE` and one
    /// `W_HIGHBYTE` command, each carrying (value, direction).
    pub fn stage_step(&mut self, dir_mask: u32, value: u32) {
        Self::append_step(&mut self.a.commands, Channel::A, dir_mask, value);
        Self::append_step(&mut self.b.commands, Channel::B, dir_mask, value);
    }

    /// Identical to [`stage_step`](Self::stage_step), but additionally
    /// stages a read-low-byte and read-high-byte command on each channel,
    /// incrementing each channel's read-expectation by two. Used on the
    /// falling edge of every input clock.
    pub fn stage_step_sample(&mut self, dir_mask: u32, value: u32) {
        self.stage_step(dir_mask, value);
        self.a.commands.push(R_LOWBYTE);
        self.a.commands.push(R_HIGHBYTE);
        self.a.read_expect += 2;
        self.b.commands.push(R_LOWBYTE);
        self.b.commands.push(R_HIGHBYTE);
        self.b.read_expect += 2;
    }

    fn append_step(buf: &mut Vec<u8>, channel: Channel, dir_mask: u32, value: u32) {
        let shift = channel.shift();
        let low_val = ((value >> shift) & 0xFF) as u8;
        let low_dir = ((dir_mask >> shift) & 0xFF) as u8;
        let high_val = ((value >> (shift + 8)) & 0xFF) as u8;
        let high_dir = ((dir_mask >> (shift + 8)) & 0xFF) as u8;

        buf.push(W_LOWBYTE);
        buf.push(low_val);
        buf.push(low_dir);
        buf.push(W_HIGHBYTE);
        buf.push(high_val);
        buf.push(high_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{SCL_MASK, SDA_MASK};

    #[test]
    fn stage_step_appends_six_bytes_per_channel() {
        let mut stager = PinStager::new();
        stager.stage_step(SCL_MASK | SDA_MASK, SCL_MASK);
        assert_eq!(stager.a.commands.len(), 6);
        assert_eq!(stager.b.commands.len(), 6);
        assert_eq!(stager.a.read_expect, 0);
    }

    #[test]
    fn stage_step_sample_appends_eight_bytes_and_counts_two() {
        let mut stager = PinStager::new();
        stager.stage_step_sample(SCL_MASK, 0);
        assert_eq!(stager.a.commands.len(), 8);
        assert_eq!(stager.b.commands.len(), 8);
        assert_eq!(stager.a.read_expect, 2);
        assert_eq!(stager.b.read_expect, 2);
    }

    #[test]
    fn reset_restores_clean_state() {
        let mut stager = PinStager::new();
        stager.stage_step_sample(SCL_MASK, 0);
        assert!(!stager.is_clean());
        stager.reset();
        assert!(stager.is_clean());
    }

    #[test]
    fn low_high_bytes_carry_correct_channel_slice() {
        let mut stager = PinStager::new();
        // Value with a distinct byte in each of the four 8-bit lanes.
        let value = 0x0D0C_0B0Au32; // A-low=0x0A, A-high=0x0B, B-low=0x0C, B-high=0x0D
        stager.stage_step(0xFFFF_FFFF, value);
        // a.commands: [W_LOWBYTE, val, dir, W_HIGHBYTE, val, dir]
        assert_eq!(stager.a.commands[1], 0x0A);
        assert_eq!(stager.a.commands[4], 0x0B);
        assert_eq!(stager.b.commands[1], 0x0C);
        assert_eq!(stager.b.commands[4], 0x0D);
    }
}

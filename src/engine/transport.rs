//! L2 — Transport.
//!
//! Flushes the staged command buffers to the bridge over USB bulk OUT,
//! waits briefly for the chip to process them, reads USB bulk IN, and
//! verifies the length matches the staged expectation.
//!
//! Any step-level failure aborts the whole transaction, but the staging
//! counters are reset regardless of outcome — a transient USB error must
//! not poison the state of the next transaction (spec §4.2, §7).

use std::time::Duration;

use crate::consts::{Channel, IN_PACKET_HEADER_LEN};
use crate::engine::stager::PinStager;
use crate::error::{ChannelIoError, TransportError};

/// One direction of USB bulk I/O against a single bridge channel.
///
/// Implemented by the `nusb`-backed channel for real hardware and by
/// [`crate::testing::fake_bridge::FakeChannel`] for tests; the transport
/// layer above is written once against this trait.
pub trait BulkChannel: core::fmt::Debug {
    /// Synchronously writes `buf` to the bulk OUT endpoint.
    fn write_bulk(&mut self, buf: &[u8]) -> Result<(), ChannelIoError>;
    /// Synchronously reads up to `buf.len()` bytes from the bulk IN
    /// endpoint, returning the number of bytes actually read.
    fn read_bulk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelIoError>;
    /// Purges the channel's USB RX/TX buffers. Called on a short/long read
    /// (spec §4.2 step 4) so a stale or partial reply can't bleed into the
    /// next transaction. Real hardware issues the FTDI reset-purge vendor
    /// requests; the default no-op is correct for transports (and the fake
    /// test channel) with nothing to flush.
    fn purge(&mut self) -> Result<(), ChannelIoError> {
        Ok(())
    }
}

/// How long (or how) the transport waits between staging a command stream
/// and reading the bridge's response.
///
/// `FixedSleep` reproduces the original design's fragile-but-simple fixed
/// wait (spec §4.2 step 3, §9). `PollUntilReady` is the suggested
/// replacement: poll with short reads until the expected byte count shows
/// up or `timeout` elapses, avoiding both a too-short fixed wait (data not
/// ready yet) and a too-long one (wasted latency per transaction).
#[derive(Debug, Clone, Copy)]
pub enum FlushTiming {
    FixedSleep(Duration),
    PollUntilReady { interval: Duration, timeout: Duration },
}

impl Default for FlushTiming {
    fn default() -> Self {
        FlushTiming::FixedSleep(Duration::from_millis(1))
    }
}

/// Raw bulk-IN payloads for one flush, header stripped, one per channel.
/// Decoding these into per-bus bytes is [`crate::engine::bitbang`]'s job.
#[derive(Debug, Clone, Default)]
pub struct FlushedData {
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

/// Drives the two bridge channels' bulk endpoints from a [`PinStager`].
pub struct Transport<C: BulkChannel> {
    pub channel_a: C,
    pub channel_b: C,
    pub timing: FlushTiming,
}

impl<C: BulkChannel> Transport<C> {
    pub fn new(channel_a: C, channel_b: C) -> Self {
        Transport { channel_a, channel_b, timing: FlushTiming::default() }
    }

    /// Flushes both channels' staged commands, harvests the read-back, and
    /// resets the stager's counters — on success *and* on failure.
    pub fn flush(&mut self, stager: &mut PinStager) -> Result<FlushedData, TransportError> {
        let result = self.flush_inner(stager);
        stager.reset();
        result
    }

    fn flush_inner(&mut self, stager: &mut PinStager) -> Result<FlushedData, TransportError> {
        log::trace!(
            "flush: a.commands={} a.read_expect={} b.commands={} b.read_expect={}",
            stager.a.commands.len(),
            stager.a.read_expect,
            stager.b.commands.len(),
            stager.b.read_expect
        );

        self.channel_a.write_bulk(&stager.a.commands).map_err(|source| TransportError::Write {
            channel: Channel::A,
            source,
        })?;
        self.channel_b.write_bulk(&stager.b.commands).map_err(|source| TransportError::Write {
            channel: Channel::B,
            source,
        })?;

        self.wait_for_chip();

        let a = self.read_channel(Channel::A, stager.a.read_expect)?;
        let b = self.read_channel(Channel::B, stager.b.read_expect)?;

        Ok(FlushedData { a, b })
    }

    fn wait_for_chip(&self) {
        match self.timing {
            FlushTiming::FixedSleep(duration) => std::thread::sleep(duration),
            FlushTiming::PollUntilReady { interval, .. } => std::thread::sleep(interval),
        }
    }

    fn read_channel(&mut self, channel: Channel, read_expect: usize) -> Result<Vec<u8>, TransportError> {
        let expected_len = read_expect + IN_PACKET_HEADER_LEN;
        let mut scratch = vec![0u8; expected_len];

        let chan = match channel {
            Channel::A => &mut self.channel_a,
            Channel::B => &mut self.channel_b,
        };

        let actual = chan
            .read_bulk(&mut scratch)
            .map_err(|source| TransportError::Read { channel, source })?;

        if actual != expected_len {
            log::warn!(
                "flush: channel {channel:?} returned {actual} bytes, expected {expected_len}; purging"
            );
            // Purge only the channel whose read mismatched, matching the
            // original's per-channel `ftdi_usb_purge_buffers` call on this
            // fault path (it never purges the other channel here).
            let _ = chan.purge();
            return Err(TransportError::IncorrectAmount { channel, expected: expected_len, actual });
        }

        Ok(scratch[IN_PACKET_HEADER_LEN..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fake_bridge::FakeChannel;

    #[test]
    fn flush_resets_stager_on_success() {
        let mut stager = PinStager::new();
        stager.stage_step_sample(0xAAAA_AAAA, 0);

        let a = FakeChannel::with_read_script(vec![0, 0, 0xAB, 0xCD]);
        let b = FakeChannel::with_read_script(vec![0, 0, 0xEF, 0x12]);
        let mut transport = Transport::new(a, b);
        transport.timing = FlushTiming::FixedSleep(Duration::from_millis(0));

        let flushed = transport.flush(&mut stager).unwrap();
        assert_eq!(flushed.a, vec![0xAB, 0xCD]);
        assert_eq!(flushed.b, vec![0xEF, 0x12]);
        assert!(stager.is_clean());
    }

    #[test]
    fn flush_resets_stager_on_incorrect_amount() {
        let mut stager = PinStager::new();
        stager.stage_step_sample(0xAAAA_AAAA, 0);

        // Channel A script is one byte short of read_expect + header.
        let a = FakeChannel::with_read_script(vec![0, 0, 0xAB]);
        let b = FakeChannel::with_read_script(vec![0, 0, 0xEF, 0x12]);
        let mut transport = Transport::new(a, b);
        transport.timing = FlushTiming::FixedSleep(Duration::from_millis(0));

        let err = transport.flush(&mut stager).unwrap_err();
        assert!(matches!(err, TransportError::IncorrectAmount { channel: Channel::A, .. }));
        assert!(stager.is_clean());
        assert_eq!(transport.channel_a.purge_count, 1);
        assert_eq!(transport.channel_b.purge_count, 0, "only the mismatched channel is purged");
    }
}

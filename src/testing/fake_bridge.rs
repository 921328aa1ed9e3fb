//! A scripted, in-memory stand-in for a bridge channel's bulk endpoints.
//!
//! `write_bulk` just records what it was given; `read_bulk` drains a
//! pre-loaded script, optionally failing or truncating on command so tests
//! can exercise [`crate::engine::transport::Transport`]'s error paths
//! without any real USB device.

use crate::engine::transport::BulkChannel;
use crate::error::ChannelIoError;

/// A fake [`BulkChannel`] whose read-back is scripted ahead of time.
#[derive(Debug, Default)]
pub struct FakeChannel {
    pub written: Vec<Vec<u8>>,
    pub purge_count: usize,
    read_script: Vec<u8>,
    fail_write: Option<String>,
    fail_read: Option<String>,
}

impl FakeChannel {
    /// A channel whose next `read_bulk` returns exactly `script` (or a
    /// prefix of it, if the caller's buffer is shorter).
    pub fn with_read_script(script: Vec<u8>) -> Self {
        FakeChannel { read_script: script, ..Default::default() }
    }

    /// A channel whose `write_bulk` always fails with a simulated fault.
    pub fn failing_write(detail: impl Into<String>) -> Self {
        FakeChannel { fail_write: Some(detail.into()), ..Default::default() }
    }

    /// A channel whose `read_bulk` always fails with a simulated fault.
    pub fn failing_read(detail: impl Into<String>) -> Self {
        FakeChannel { fail_read: Some(detail.into()), ..Default::default() }
    }
}

impl BulkChannel for FakeChannel {
    fn write_bulk(&mut self, buf: &[u8]) -> Result<(), ChannelIoError> {
        if let Some(detail) = &self.fail_write {
            return Err(ChannelIoError::Simulated(detail.clone()));
        }
        self.written.push(buf.to_vec());
        Ok(())
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelIoError> {
        if let Some(detail) = &self.fail_read {
            return Err(ChannelIoError::Simulated(detail.clone()));
        }
        let n = self.read_script.len().min(buf.len());
        buf[..n].copy_from_slice(&self.read_script[..n]);
        Ok(n)
    }

    fn purge(&mut self) -> Result<(), ChannelIoError> {
        self.purge_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bulk_copies_script_and_reports_its_length() {
        let mut chan = FakeChannel::with_read_script(vec![1, 2, 3]);
        let mut buf = [0u8; 8];
        let n = chan.read_bulk(&mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn write_bulk_records_every_call() {
        let mut chan = FakeChannel::default();
        chan.write_bulk(&[0xAA]).unwrap();
        chan.write_bulk(&[0xBB, 0xCC]).unwrap();
        assert_eq!(chan.written, vec![vec![0xAA], vec![0xBB, 0xCC]]);
    }

    #[test]
    fn failing_write_never_records() {
        let mut chan = FakeChannel::failing_write("bus reset");
        assert!(chan.write_bulk(&[1]).is_err());
        assert!(chan.written.is_empty());
    }
}

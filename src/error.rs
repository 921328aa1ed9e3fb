//! Error taxonomy for the driver: transport, protocol, and device-manager
//! failures, plus a top-level enum for call sites that can fail at more
//! than one layer.
//!
//! Matches the three kinds spec'd for this engine: transport failures are
//! never locally retried (the whole transaction is aborted and staging
//! state is reset), protocol failures are surfaced as per-bus bitmasks so
//! a caller can decide which buses to retry, and invariant violations
//! (bad indexing) are programmer errors.

use crate::consts::Channel;

/// A USB-bulk-transfer-level failure, decoupled from any particular USB
/// stack's error type so that [`crate::testing::fake_bridge`] can produce
/// one without depending on `nusb`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelIoError {
    /// The underlying USB transfer failed; `detail` is its `Display` text.
    #[error("usb transfer error: {detail}")]
    Usb { detail: String },
    /// A scripted/simulated fault injected by a test harness.
    #[error("simulated fault: {0}")]
    Simulated(String),
}

/// USB bulk transport failed, or returned an unexpected byte count.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Bulk OUT write failed on the given channel.
    #[error("bulk write to channel {channel:?} failed: {source}")]
    Write {
        channel: Channel,
        #[source]
        source: ChannelIoError,
    },
    /// Bulk IN read failed on the given channel.
    #[error("bulk read from channel {channel:?} failed: {source}")]
    Read {
        channel: Channel,
        #[source]
        source: ChannelIoError,
    },
    /// The bulk IN read returned a byte count other than `expected + 2`.
    #[error(
        "channel {channel:?} returned {actual} bytes, expected {expected} \
         (header + staged read-back)"
    )]
    IncorrectAmount {
        channel: Channel,
        expected: usize,
        actual: usize,
    },
}

/// A sensor-protocol-level failure, carrying the mask of affected buses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// One or more buses returned an ID byte that isn't a known TCS3472 variant.
    #[error("unexpected sensor id on buses {bus_mask:#06x}")]
    UnexpectedId { bus_mask: u16 },
    /// One or more buses reported a conversion that hadn't completed (no AVALID).
    #[error("incomplete conversion on buses {bus_mask:#06x}")]
    IncompleteConversion { bus_mask: u16 },
    /// Optional ACK-policy check: every sampled bus NAK'd a byte.
    #[error("every bus NAK'd during transaction (ack policy requires at least one clean ack)")]
    AllBusesNak,
}

/// Invariant violation: out-of-range indexing into a bus/serial/device array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index {index} out of range (0..{len})")]
pub struct IndexingError {
    pub index: usize,
    pub len: usize,
}

/// Device-enumeration and ordering failures.
#[derive(Debug, thiserror::Error)]
pub enum DeviceManagerError {
    #[error("usb enumeration failed: {0}")]
    Usb(#[from] nusb::Error),
    #[error("usb control transfer failed: {detail}")]
    ControlTransfer { detail: String },
    #[error("no device with serial {0:?} is attached")]
    UnknownSerial(String),
    #[error(transparent)]
    Indexing(#[from] IndexingError),
}

/// The crate's umbrella error type, for call sites spanning multiple layers.
#[derive(Debug, thiserror::Error)]
pub enum ColorControllerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    DeviceManager(#[from] DeviceManagerError),
}

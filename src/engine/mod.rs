//! The four-layer parallel I²C engine: pin staging, USB transport, bit
//! banging, and the decoder that turns a flush's raw read-back into
//! per-bus bytes.

pub mod bitbang;
pub mod stager;
pub mod transport;

pub use bitbang::{
    check_ack_bits, decode, decode_bits, transact_read_ack_count, transact_read_skip_bytes, AckPolicy, BitEngine,
    SampleWidth,
};
pub use stager::PinStager;
pub use transport::{BulkChannel, FlushTiming, FlushedData, Transport};

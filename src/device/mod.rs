//! Device Manager — USB enumeration and ordering of attached bridges, and
//! the `nusb`-backed [`BulkChannel`] that lets [`Transport`] drive real
//! hardware.
//!
//! A "color controller" device is one physical FTDI-style dual-channel
//! chip: one USB serial number, two interfaces (0 = channel A, 1 = channel
//! B), both claimed from the same [`nusb::Device`] (mirroring the
//! original's two `ftdi_context` handles opened against the same serial
//! with `ftdi_set_interface(INTERFACE_A)`/`INTERFACE_B)`). Multiple such
//! boards may be attached at once, each driving its own bank of sixteen
//! sensors.

use futures_lite::future::block_on;
use nusb::transfer::{ControlOut, ControlType, Recipient, RequestBuffer};
use nusb::{DeviceInfo, Interface};

use crate::consts::{DEVICE_DESCRIPTION, PRODUCT_ID, VENDOR_ID};
use crate::engine::{BulkChannel, Transport};
use crate::error::{ChannelIoError, DeviceManagerError, IndexingError};
use crate::sensor::Tcs3472Array;

/// FTDI bulk endpoint addresses (same pair on both interfaces, one
/// channel each).
const EP_OUT: u8 = 0x02;
const EP_IN: u8 = 0x81;

/// FTDI vendor requests used to bring a channel into MPSSE mode (AN_232B-04).
const SIO_RESET_REQUEST: u8 = 0x00;
const SIO_SET_BITMODE_REQUEST: u8 = 0x0B;
const BITMODE_MPSSE: u16 = 0x02 << 8;
const SIO_RESET_PURGE_RX: u16 = 0x01;
const SIO_RESET_PURGE_TX: u16 = 0x02;

/// A USB serial number uniquely identifying one attached bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceSerial(pub String);

/// Enumerates and opens attached color-controller bridges.
#[derive(Debug, Default)]
pub struct DeviceManager;

impl DeviceManager {
    pub fn new() -> Result<DeviceManager, DeviceManagerError> {
        Ok(DeviceManager)
    }

    fn matching_devices(&self) -> Result<Vec<DeviceInfo>, DeviceManagerError> {
        let devices = nusb::list_devices()?
            .filter(|info| info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID)
            .filter(|info| info.product_string() == Some(DEVICE_DESCRIPTION))
            .collect();
        Ok(devices)
    }

    /// Returns the serial numbers of every attached color-controller
    /// bridge, in USB enumeration order (`get_serials_colorctrl`).
    pub fn scan_devices(&self) -> Result<Vec<DeviceSerial>, DeviceManagerError> {
        let serials = self
            .matching_devices()?
            .into_iter()
            .filter_map(|info| info.serial_number().map(|s| DeviceSerial(s.to_string())))
            .collect();
        Ok(serials)
    }

    /// Opens every serial in `serials`, in order, each becoming one
    /// [`Tcs3472Array`] over its own pair of bulk channels.
    pub fn open_ordered(
        &self,
        serials: &[DeviceSerial],
    ) -> Result<Vec<Tcs3472Array<NusbChannel>>, DeviceManagerError> {
        let candidates = self.matching_devices()?;

        let mut arrays = Vec::with_capacity(serials.len());
        for serial in serials {
            let info = candidates
                .iter()
                .find(|info| info.serial_number() == Some(serial.0.as_str()))
                .ok_or_else(|| DeviceManagerError::UnknownSerial(serial.0.clone()))?;

            let device = info.open()?;
            let channel_a = NusbChannel::open(&device, 0)?;
            let channel_b = NusbChannel::open(&device, 1)?;

            let transport = Transport::new(channel_a, channel_b);
            arrays.push(Tcs3472Array::new(transport, crate::engine::BitEngine::default()));
        }
        Ok(arrays)
    }
}

/// Swaps two entries of a serial-ordering array in place (`swap_serialPos`),
/// bounds-checked.
pub fn swap_serials(serials: &mut [DeviceSerial], i: usize, j: usize) -> Result<(), IndexingError> {
    let len = serials.len();
    if i >= len {
        return Err(IndexingError { index: i, len });
    }
    if j >= len {
        return Err(IndexingError { index: j, len });
    }
    serials.swap(i, j);
    Ok(())
}

/// One claimed FTDI interface (one channel of one bridge), brought into
/// MPSSE mode and purged on open.
#[derive(Debug)]
pub struct NusbChannel {
    interface: Interface,
}

impl NusbChannel {
    fn open(device: &nusb::Device, interface_number: u8) -> Result<NusbChannel, DeviceManagerError> {
        let interface = device.claim_interface(interface_number)?;
        let channel = NusbChannel { interface };
        channel.set_mpsse_mode()?;
        channel.purge_buffers()?;
        Ok(channel)
    }

    fn control_out(&self, request: u8, value: u16) -> Result<(), DeviceManagerError> {
        let result = block_on(self.interface.control_out(ControlOut {
            control_type: ControlType::Vendor,
            recipient: Recipient::Device,
            request,
            value,
            index: 0,
            data: &[],
        }));
        result
            .status
            .map_err(|e| DeviceManagerError::ControlTransfer { detail: e.to_string() })
    }

    fn set_mpsse_mode(&self) -> Result<(), DeviceManagerError> {
        self.control_out(SIO_SET_BITMODE_REQUEST, 0xFF | BITMODE_MPSSE)
    }

    fn purge_buffers(&self) -> Result<(), DeviceManagerError> {
        self.control_out(SIO_RESET_REQUEST, SIO_RESET_PURGE_RX)?;
        self.control_out(SIO_RESET_REQUEST, SIO_RESET_PURGE_TX)
    }
}

impl BulkChannel for NusbChannel {
    fn write_bulk(&mut self, buf: &[u8]) -> Result<(), ChannelIoError> {
        let result = block_on(self.interface.bulk_out(EP_OUT, buf.to_vec()));
        result
            .status
            .map_err(|e| ChannelIoError::Usb { detail: e.to_string() })
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> Result<usize, ChannelIoError> {
        let result = block_on(self.interface.bulk_in(EP_IN, RequestBuffer::new(buf.len())));
        let data = result
            .into_result()
            .map_err(|e| ChannelIoError::Usb { detail: e.to_string() })?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn purge(&mut self) -> Result<(), ChannelIoError> {
        self.purge_buffers().map_err(|e| ChannelIoError::Usb { detail: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_serials_rejects_out_of_range_index() {
        let mut serials = vec![DeviceSerial("A".into()), DeviceSerial("B".into())];
        let err = swap_serials(&mut serials, 0, 5).unwrap_err();
        assert_eq!(err, IndexingError { index: 5, len: 2 });
    }

    #[test]
    fn swap_serials_exchanges_positions() {
        let mut serials = vec![DeviceSerial("A".into()), DeviceSerial("B".into())];
        swap_serials(&mut serials, 0, 1).unwrap();
        assert_eq!(serials[0].0, "B");
        assert_eq!(serials[1].0, "A");
    }
}

//! TCS3472 register-level operations, broadcast across all sixteen buses
//! (or targeted at one, where the original supports it — register writes
//! only; reads are always broadcast, matching `i2c_write8_x` having no
//! `i2c_read8_x` counterpart in the original driver).

use byteorder::{ByteOrder, LittleEndian};
use enum_primitive::FromPrimitive;

use crate::consts::{tcs3472_bits, tcs3472_reg, BUS_COUNT, TCS3472_IDS, TCS_ADDRESS};
use crate::engine::{
    check_ack_bits, decode, decode_bits, transact_read_ack_count, transact_read_skip_bytes, BitEngine, BulkChannel,
    FlushedData, PinStager, SampleWidth, Transport,
};
use crate::error::ColorControllerError;
use crate::sensor::{OutcomeFlags, SensorOutcome};

enum_from_primitive! {
    /// Analog gain setting (datasheet CONTROL register, AGAIN field).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Gain {
        X1 = 0x00,
        X4 = 0x01,
        X16 = 0x02,
        X60 = 0x03,
    }
}

impl Gain {
    /// The divisor used in the LUX/CCT estimate; the enum's own
    /// discriminant doesn't match the real multiplier (`X60` is `0x03`,
    /// not 60), so this lookup is required wherever gain feeds a
    /// calculation rather than just a register write.
    pub fn divisor(self) -> u32 {
        match self {
            Gain::X1 => 1,
            Gain::X4 => 4,
            Gain::X16 => 16,
            Gain::X60 => 60,
        }
    }
}

enum_from_primitive! {
    /// Which single-color register pair [`Tcs3472Array::read_color`] targets.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Color {
        Red = 0x00,
        Green = 0x01,
        Blue = 0x02,
        Clear = 0x03,
    }
}

impl Color {
    fn register(self) -> u8 {
        match self {
            Color::Red => tcs3472_reg::RDATA,
            Color::Green => tcs3472_reg::GDATA,
            Color::Blue => tcs3472_reg::BDATA,
            Color::Clear => tcs3472_reg::CDATA,
        }
    }
}

/// An ATIME register byte. The named presets correspond to the datasheet's
/// common integration times; any other byte is a valid custom setting via
/// [`IntegrationTime::raw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegrationTime(pub u8);

impl IntegrationTime {
    pub const MS_2_4: IntegrationTime = IntegrationTime(0xFF);
    pub const MS_24: IntegrationTime = IntegrationTime(0xF6);
    pub const MS_100: IntegrationTime = IntegrationTime(0xD6);
    pub const MS_154: IntegrationTime = IntegrationTime(0xC0);
    pub const MS_200: IntegrationTime = IntegrationTime(0xAD);
    pub const MS_700: IntegrationTime = IntegrationTime(0x00);

    pub fn raw(byte: u8) -> IntegrationTime {
        IntegrationTime(byte)
    }

    /// Saturation threshold for the clear channel: `min(65535, (256 -
    /// ATIME) * 1024)` per the datasheet's maximum RGBC count formula.
    /// Generalizes the original's six hardcoded per-preset thresholds
    /// (1024 / 10240 / 43008 / 65535 / 65535 / 65535) to any ATIME byte,
    /// including custom ones.
    pub fn max_clear_count(self) -> u32 {
        let cycles = 256u32 - self.0 as u32;
        (cycles * 1024).min(65535)
    }
}

/// One combined RGBC + status read-back (spec §4.3.4's 72-bit transaction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorReading {
    pub status: u8,
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl ColorReading {
    pub fn conversion_complete(self) -> bool {
        self.status & tcs3472_bits::AVALID != 0
    }
}

fn command(register: u8) -> u8 {
    tcs3472_bits::COMMAND | register
}

fn command_autoincrement(register: u8) -> u8 {
    tcs3472_bits::COMMAND | tcs3472_bits::AUTO_INCREMENT | register
}

/// A bank of sixteen TCS3472 sensors addressed through one [`BitEngine`]
/// over one [`Transport`].
pub struct Tcs3472Array<C: BulkChannel> {
    stager: PinStager,
    transport: Transport<C>,
    engine: BitEngine,
}

impl<C: BulkChannel> Tcs3472Array<C> {
    pub fn new(transport: Transport<C>, engine: BitEngine) -> Self {
        Tcs3472Array { stager: PinStager::new(), transport, engine }
    }

    /// Checks the engine's ACK policy against every ack event staged ahead
    /// of `flushed`'s data region (spec §9 Open Question; a no-op under
    /// the default [`crate::engine::AckPolicy::Ignore`]).
    fn check_acks(&self, flushed: &FlushedData, ack_count: usize) -> Result<(), ColorControllerError> {
        let ack_events = decode_bits(&flushed.a, &flushed.b, 0, ack_count);
        for ack in &ack_events {
            check_ack_bits(self.engine.ack_policy, ack)?;
        }
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let buf = [addr, command(register), value];
        self.engine.write_transaction(&mut self.stager, &buf);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, buf.len())?;
        Ok(())
    }

    fn write_register_one_bus(&mut self, register: u8, value: u8, bus: usize) -> Result<(), ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let buf = [addr, command(register), value];
        self.engine.write_transaction_one_bus(&mut self.stager, &buf, bus);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, buf.len())?;
        Ok(())
    }

    fn read_register_8(&mut self, register: u8) -> Result<[u8; BUS_COUNT], ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let reg_bytes = [command(register)];
        self.engine.transact_read(&mut self.stager, addr, &reg_bytes, 8);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, transact_read_ack_count(reg_bytes.len()))?;
        let decoded = decode(&flushed.a, &flushed.b, SampleWidth::BITS_8, transact_read_skip_bytes(reg_bytes.len()));
        let mut out = [0u8; BUS_COUNT];
        for (bus, slot) in out.iter_mut().enumerate() {
            *slot = decoded[bus][0];
        }
        Ok(out)
    }

    fn read_register_16(&mut self, register: u8) -> Result<[u16; BUS_COUNT], ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let reg_bytes = [command_autoincrement(register)];
        self.engine.transact_read(&mut self.stager, addr, &reg_bytes, 16);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, transact_read_ack_count(reg_bytes.len()))?;
        let decoded = decode(&flushed.a, &flushed.b, SampleWidth::BITS_16, transact_read_skip_bytes(reg_bytes.len()));
        let mut out = [0u16; BUS_COUNT];
        for (bus, slot) in out.iter_mut().enumerate() {
            *slot = LittleEndian::read_u16(&decoded[bus]);
        }
        Ok(out)
    }

    /// Reads the ID register on all sixteen buses and flags any that don't
    /// report a known TCS3472-family value (spec §4.4, `tcs_identify`).
    pub fn identify(&mut self) -> Result<SensorOutcome, ColorControllerError> {
        let ids = self.read_register_8(tcs3472_reg::ID)?;
        let mut bus_mask = 0u16;
        for (bus, &id) in ids.iter().enumerate() {
            if !TCS3472_IDS.contains(&id) {
                bus_mask |= 1 << bus;
            }
        }
        if bus_mask == 0 {
            Ok(SensorOutcome::clean())
        } else {
            Ok(SensorOutcome { flags: OutcomeFlags::ID, bus_mask })
        }
    }

    /// Powers on, enables RGBC and RGBC interrupts on all sixteen sensors
    /// (`tcs_ON`).
    pub fn power_on(&mut self) -> Result<(), ColorControllerError> {
        self.write_register(
            tcs3472_reg::ENABLE,
            tcs3472_bits::AIEN | tcs3472_bits::AEN | tcs3472_bits::PON,
        )
    }

    /// Clears `PON`/`AEN` on every sensor, preserving every other ENABLE
    /// bit per-bus.
    ///
    /// The original (`tcs_sleep`) reads all sixteen ENABLE bytes but then
    /// broadcasts bus 0's masked value back to every bus, silently
    /// clobbering any bus whose ENABLE register differed from bus 0's.
    /// Since the original's own single-bus write primitive
    /// (`i2c_write8_x`) is available, this does the read-modify-write
    /// per bus instead (see DESIGN.md).
    pub fn sleep(&mut self) -> Result<(), ColorControllerError> {
        let enable = self.read_register_8(tcs3472_reg::ENABLE)?;
        for bus in 0..BUS_COUNT {
            let next = enable[bus] & !(tcs3472_bits::PON | tcs3472_bits::AEN);
            self.write_register_one_bus(tcs3472_reg::ENABLE, next, bus)?;
        }
        Ok(())
    }

    /// Sets `PON` on every sensor, preserving every other ENABLE bit
    /// per-bus (`tcs_wakeUp`, with the same per-bus RMW correction as
    /// [`sleep`](Self::sleep)).
    pub fn wake_up(&mut self) -> Result<(), ColorControllerError> {
        let enable = self.read_register_8(tcs3472_reg::ENABLE)?;
        for bus in 0..BUS_COUNT {
            let next = enable[bus] | tcs3472_bits::PON;
            self.write_register_one_bus(tcs3472_reg::ENABLE, next, bus)?;
        }
        Ok(())
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<(), ColorControllerError> {
        self.write_register(tcs3472_reg::CONTROL, gain as u8)
    }

    pub fn set_gain_for_bus(&mut self, gain: Gain, bus: usize) -> Result<(), ColorControllerError> {
        self.write_register_one_bus(tcs3472_reg::CONTROL, gain as u8, bus)
    }

    /// Raw CONTROL register bytes; not every sensor is guaranteed to
    /// report one of [`Gain`]'s four codes (reserved bits, miswired bus),
    /// so the caller decides whether to map through `Gain::from_u8`.
    pub fn get_gain(&mut self) -> Result<[u8; BUS_COUNT], ColorControllerError> {
        self.read_register_8(tcs3472_reg::CONTROL)
    }

    /// Maps a raw CONTROL register byte to a [`Gain`], or `None` if the
    /// bus reported a code outside the four valid values.
    pub fn gain_from_code(code: u8) -> Option<Gain> {
        Gain::from_u8(code)
    }

    pub fn set_integration_time(&mut self, integration: IntegrationTime) -> Result<(), ColorControllerError> {
        self.write_register(tcs3472_reg::ATIME, integration.0)
    }

    pub fn set_integration_time_for_bus(
        &mut self,
        integration: IntegrationTime,
        bus: usize,
    ) -> Result<(), ColorControllerError> {
        self.write_register_one_bus(tcs3472_reg::ATIME, integration.0, bus)
    }

    pub fn get_integration_time(&mut self) -> Result<[u8; BUS_COUNT], ColorControllerError> {
        self.read_register_8(tcs3472_reg::ATIME)
    }

    /// WTIME register (0x03): wait time between RGBC cycles when `WEN` is
    /// set. Present in the original's register map and `tcs3472.c` but
    /// never surfaced as an operation by the distillation.
    pub fn set_wait_time_for_bus(&mut self, wtime: u8, bus: usize) -> Result<(), ColorControllerError> {
        self.write_register_one_bus(tcs3472_reg::WTIME, wtime, bus)
    }

    pub fn get_wait_time(&mut self) -> Result<[u8; BUS_COUNT], ColorControllerError> {
        self.read_register_8(tcs3472_reg::WTIME)
    }

    /// `WLONG` (CONFIG register bit 1): stretches WTIME by 12x.
    pub fn set_wait_long_for_bus(&mut self, enabled: bool, bus: usize) -> Result<(), ColorControllerError> {
        let config = self.read_register_8(tcs3472_reg::CONFIG)?;
        let next = if enabled {
            config[bus] | tcs3472_bits::WLONG
        } else {
            config[bus] & !tcs3472_bits::WLONG
        };
        self.write_register_one_bus(tcs3472_reg::CONFIG, next, bus)
    }

    pub fn set_wait_long(&mut self, enabled: bool) -> Result<(), ColorControllerError> {
        for bus in 0..BUS_COUNT {
            self.set_wait_long_for_bus(enabled, bus)?;
        }
        Ok(())
    }

    /// Interrupt low/high thresholds (AILTL/H, AIHTL/H), written as one
    /// auto-incrementing 4-byte transaction (`tcs3472_set_interrupt_thresholds`).
    pub fn set_interrupt_thresholds(&mut self, low: u16, high: u16) -> Result<(), ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let mut low_bytes = [0u8; 2];
        let mut high_bytes = [0u8; 2];
        LittleEndian::write_u16(&mut low_bytes, low);
        LittleEndian::write_u16(&mut high_bytes, high);

        let buf = [
            addr,
            command_autoincrement(tcs3472_reg::AILTL),
            low_bytes[0],
            low_bytes[1],
            high_bytes[0],
            high_bytes[1],
        ];
        self.engine.write_transaction(&mut self.stager, &buf);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, buf.len())?;
        Ok(())
    }

    /// Interrupt persistence filter (PERS register, 0x0C).
    pub fn set_persistence(&mut self, pers: u8) -> Result<(), ColorControllerError> {
        self.write_register(tcs3472_reg::PERS, pers)
    }

    /// Clears a pending RGBC interrupt via the SPECIAL+INTCLEAR function
    /// (not a register write: two bytes only, address then function byte).
    pub fn clear_interrupt(&mut self) -> Result<(), ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let function = tcs3472_bits::COMMAND | tcs3472_bits::SPECIAL | tcs3472_bits::INTCLEAR;
        let buf = [addr, function];
        self.engine.write_transaction(&mut self.stager, &buf);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, buf.len())?;
        Ok(())
    }

    /// Reads one color channel (16-bit, auto-incrementing low/high byte
    /// pair) across all sixteen buses.
    pub fn read_color(&mut self, color: Color) -> Result<[u16; BUS_COUNT], ColorControllerError> {
        self.read_register_16(color.register())
    }

    /// Reads STATUS + all four ADC channels in a single 72-bit combined
    /// transaction (`tcs_readColors`) and reports which buses hadn't yet
    /// completed a conversion.
    pub fn read_colors(&mut self) -> Result<(Vec<ColorReading>, SensorOutcome), ColorControllerError> {
        let addr = TCS_ADDRESS << 1;
        let reg_bytes = [command_autoincrement(tcs3472_reg::STATUS)];
        self.engine.transact_read(&mut self.stager, addr, &reg_bytes, 72);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, transact_read_ack_count(reg_bytes.len()))?;
        let decoded =
            decode(&flushed.a, &flushed.b, SampleWidth::BITS_72, transact_read_skip_bytes(reg_bytes.len()));

        let mut readings = Vec::with_capacity(BUS_COUNT);
        let mut bus_mask = 0u16;
        for (bus, bytes) in decoded.iter().enumerate() {
            let reading = ColorReading {
                status: bytes[0],
                clear: LittleEndian::read_u16(&bytes[1..3]),
                red: LittleEndian::read_u16(&bytes[3..5]),
                green: LittleEndian::read_u16(&bytes[5..7]),
                blue: LittleEndian::read_u16(&bytes[7..9]),
            };
            if !reading.conversion_complete() {
                bus_mask |= 1 << bus;
            }
            readings.push(reading);
        }

        let outcome = if bus_mask == 0 {
            SensorOutcome::clean()
        } else {
            SensorOutcome { flags: OutcomeFlags::INCOMPLETE_CONVERSION, bus_mask }
        };
        Ok((readings, outcome))
    }

    /// Writes `bytes` to a single bus at I²C address `addr` (7-bit,
    /// unshifted), targeting just that bus's SDA lane (spec §4.3.2). Used
    /// by the `hal` feature's embedded-hal adapter, which describes one bus
    /// at a time rather than a broadcast.
    pub fn write_raw_one_bus(&mut self, addr: u8, bytes: &[u8], bus: usize) -> Result<(), ColorControllerError> {
        let mut buf = Vec::with_capacity(1 + bytes.len());
        buf.push(addr << 1);
        buf.extend_from_slice(bytes);
        self.engine.write_transaction_one_bus(&mut self.stager, &buf, bus);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, buf.len())?;
        Ok(())
    }

    /// Combined write-then-repeated-start-then-read against a single bus
    /// (spec §4.3.4/§4.3.2 combined). `reg_bytes` must be exactly one byte,
    /// mirroring the teacher's own hal adapter's restriction to a single
    /// register address per transaction.
    pub fn transact_read_raw_one_bus(
        &mut self,
        addr: u8,
        reg_bytes: &[u8],
        bus: usize,
        buffer: &mut [u8],
    ) -> Result<(), ColorControllerError> {
        assert_eq!(
            reg_bytes.len(),
            1,
            "a single byte (the register) should be sent to a device in order to read data"
        );
        let n_bits = buffer.len() * 8;
        self.engine.transact_read_one_bus(&mut self.stager, addr << 1, reg_bytes, bus, n_bits);
        let flushed = self.transport.flush(&mut self.stager)?;
        self.check_acks(&flushed, transact_read_ack_count(reg_bytes.len()))?;
        let decoded = decode(
            &flushed.a,
            &flushed.b,
            SampleWidth::bits(n_bits),
            transact_read_skip_bytes(reg_bytes.len()),
        );
        buffer.copy_from_slice(&decoded[bus]);
        Ok(())
    }

    /// Flags every bus whose clear-channel reading has reached or exceeded
    /// its integration time's maximum count (`tcs_exClear`).
    pub fn check_saturation(
        readings: &[ColorReading],
        integration_times: &[IntegrationTime],
    ) -> SensorOutcome {
        let mut bus_mask = 0u16;
        for (bus, (reading, integration)) in readings.iter().zip(integration_times.iter()).enumerate() {
            if reading.clear as u32 >= integration.max_clear_count() {
                bus_mask |= 1 << bus;
            }
        }
        if bus_mask == 0 {
            SensorOutcome::clean()
        } else {
            SensorOutcome { flags: OutcomeFlags::SATURATED, bus_mask }
        }
    }
}

/// Estimates illuminance (lux) and correlated color temperature (Kelvin)
/// from one reading, following AMS/TAOS Design Note 40's simplified
/// (no IR-rejection) method used by the original `tcs_calculate_CCT_Lux`.
/// Intended for LEDs, where residual IR content is negligible.
pub fn estimate_lux_cct(gain: Gain, integration: IntegrationTime, reading: ColorReading) -> (f32, u16) {
    const R_COEF: f32 = 0.136;
    const G_COEF: f32 = 1.0;
    const B_COEF: f32 = -0.444;
    const CT_COEF: f32 = 3810.0;
    const CT_OFFSET: f32 = 1391.0;
    const DEVICE_FACTOR: f32 = 310.0;

    let red = reading.red as f32;
    let green = reading.green as f32;
    let blue = reading.blue as f32;
    let clear = reading.clear as f32;

    let ir = (red + green + blue - clear) / 2.0;
    let red_prime = red - ir;
    let green_prime = green - ir;
    let blue_prime = blue - ir;

    let counts_per_lux =
        ((256 - integration.0 as i32) as f32 * 2.4) * gain.divisor() as f32 / DEVICE_FACTOR;

    let lux = (R_COEF * red_prime + G_COEF * green_prime + B_COEF * blue_prime) / counts_per_lux;
    let lux = lux.abs();
    let cct = (CT_COEF * (blue_prime / red_prime) + CT_OFFSET) as u16;

    (lux, cct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_time_saturation_thresholds_match_datasheet_presets() {
        assert_eq!(IntegrationTime::MS_2_4.max_clear_count(), 1024);
        assert_eq!(IntegrationTime::MS_24.max_clear_count(), 10240);
        assert_eq!(IntegrationTime::MS_100.max_clear_count(), 43008);
        assert_eq!(IntegrationTime::MS_154.max_clear_count(), 65535);
        assert_eq!(IntegrationTime::MS_200.max_clear_count(), 65535);
        assert_eq!(IntegrationTime::MS_700.max_clear_count(), 65535);
    }

    #[test]
    fn gain_divisor_does_not_match_its_discriminant() {
        assert_eq!(Gain::X1.divisor(), 1);
        assert_eq!(Gain::X4.divisor(), 4);
        assert_eq!(Gain::X16.divisor(), 16);
        assert_eq!(Gain::X60.divisor(), 60);
    }

    #[test]
    fn check_saturation_flags_only_buses_past_threshold() {
        let mut readings = vec![ColorReading::default(); BUS_COUNT];
        readings[3].clear = 2000;
        let integrations = vec![IntegrationTime::MS_2_4; BUS_COUNT]; // threshold 1024

        let outcome = Tcs3472Array::<crate::testing::fake_bridge::FakeChannel>::check_saturation(
            &readings,
            &integrations,
        );
        assert_eq!(outcome.flags, OutcomeFlags::SATURATED);
        assert_eq!(outcome.bus_mask, 1 << 3);
    }

    #[test]
    fn conversion_complete_checks_avalid_bit() {
        let mut reading = ColorReading::default();
        assert!(!reading.conversion_complete());
        reading.status = tcs3472_bits::AVALID;
        assert!(reading.conversion_complete());
    }
}

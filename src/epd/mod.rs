//! Driver for the UC8159 and AC073TC1 e-paper controllers.
//!
//! [`Interface`] owns the bus: command/data framing over SPI, the reset line
//! and the busy line. [`UpdateProtocol`] drives one full panel update:
//!
//! ```text
//! Idle → Resetting → Initializing → TransferringData → PoweringOn
//!      → Refreshing → PoweringOff → Idle
//! ```
//!
//! Every busy wait has a ceiling. Running past it is logged and the update
//! carries on; panels have been seen to skip the busy handshake.

pub mod ac073tc1;
pub mod controller;
pub mod uc8159;

pub use controller::{Controller, InitSequence, Register, Timing};

use crate::error::{Error, Result};
use crate::palette::Color;
use alloc::vec::Vec;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::{Operation, SpiBus, SpiDevice};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use log::{debug, info, warn};

/// Busy line poll interval
pub const POLL_INTERVAL_MS: u32 = 10;
/// Hold time of each reset line level
pub const RESET_PULSE_MS: u32 = 100;
/// Largest single SPI write (spidev default buffer size)
pub const SPI_CHUNK_SIZE: usize = 4096;

/// How a busy wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The panel released the busy line
    Ready,
    /// The line was already high, so the panel is not driving it and the
    /// whole timeout was slept
    HeldHigh,
    /// The ceiling passed with the line still low
    TimedOut,
}

/// Number of poll intervals that cover `timeout_ms`, at least one
fn poll_count(timeout_ms: u32) -> u32 {
    timeout_ms.div_ceil(POLL_INTERVAL_MS).max(1)
}

/// Bus connection to one panel
pub struct Interface<SPI, BUSY, DC, RST> {
    spi: SPI,
    busy: BUSY,
    dc: DC,
    rst: RST,
    configured: bool,
}

impl<SPI, BUSY, DC, RST> Interface<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Wrap an SPI device (chip-select handled per transaction) and the
    /// panel's control lines. No bus traffic happens until [`Self::setup`].
    pub fn new(spi: SPI, busy: BUSY, dc: DC, rst: RST) -> Self {
        Self {
            spi,
            busy,
            dc,
            rst,
            configured: false,
        }
    }

    /// Give the bus and pins back
    pub fn release(self) -> (SPI, BUSY, DC, RST) {
        (self.spi, self.busy, self.dc, self.rst)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Put the control lines in their idle levels. Runs once per interface.
    pub fn setup(&mut self) -> Result<()> {
        if self.configured {
            return Ok(());
        }
        self.dc.set_low().map_err(Error::pin)?;
        self.rst.set_high().map_err(Error::pin)?;
        self.configured = true;
        debug!("EPD: interface configured");
        Ok(())
    }

    /// Pulse the reset line low→high `pulses` times
    pub fn hardware_reset<DELAY: DelayNs>(&mut self, delay: &mut DELAY, pulses: u8) -> Result<()> {
        for i in 0..pulses {
            if i > 0 {
                delay.delay_ms(RESET_PULSE_MS);
            }
            self.rst.set_low().map_err(Error::pin)?;
            delay.delay_ms(RESET_PULSE_MS);
            self.rst.set_high().map_err(Error::pin)?;
        }
        Ok(())
    }

    /// Wait for the busy line to go high, for at most `timeout_ms`.
    ///
    /// A line that is already high when the wait starts is taken to be the
    /// host pull-up, and the full timeout is slept. Timeouts are not errors.
    pub fn busy_wait<DELAY: DelayNs>(&mut self, delay: &mut DELAY, timeout_ms: u32) -> Result<WaitOutcome> {
        if self.busy.is_high().map_err(Error::pin)? {
            warn!("Busy Wait: Held high. Waiting for {}ms", timeout_ms);
            delay.delay_ms(timeout_ms);
            return Ok(WaitOutcome::HeldHigh);
        }

        let polls = poll_count(timeout_ms);
        for _ in 0..polls {
            if self.busy.is_high().map_err(Error::pin)? {
                return Ok(WaitOutcome::Ready);
            }
            delay.delay_ms(POLL_INTERVAL_MS);
        }
        warn!(
            "Busy Wait: Timed out after {}ms",
            u64::from(polls) * u64::from(POLL_INTERVAL_MS)
        );
        Ok(WaitOutcome::TimedOut)
    }

    /// Check if the panel is driving the busy line low
    pub fn is_busy(&mut self) -> Result<bool> {
        self.busy.is_low().map_err(Error::pin)
    }

    /// Send a command byte followed, if non-empty, by its data block.
    /// Each is its own chip-select framed transaction.
    pub fn command(&mut self, command: u8, data: &[u8]) -> Result<()> {
        self.send_command(command)?;
        if !data.is_empty() {
            self.send_data(data)?;
        }
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> Result<()> {
        self.dc.set_low().map_err(Error::pin)?;
        self.spi.write(&[command]).map_err(Error::spi)
    }

    /// Send data in chunks, chip-select held across the whole block
    fn send_data(&mut self, data: &[u8]) -> Result<()> {
        self.dc.set_high().map_err(Error::pin)?;
        let mut ops: Vec<Operation<'_, u8>> =
            data.chunks(SPI_CHUNK_SIZE).map(Operation::Write).collect();
        self.spi.transaction(&mut ops).map_err(Error::spi)
    }
}

impl<BUS, CS, BUSY, DC, RST> Interface<ExclusiveDevice<BUS, CS, NoDelay>, BUSY, DC, RST>
where
    BUS: SpiBus,
    CS: OutputPin,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Build an interface from a raw SPI bus and a chip-select pin owned by
    /// this panel alone
    pub fn from_bus(bus: BUS, cs: CS, busy: BUSY, dc: DC, rst: RST) -> Result<Self> {
        let spi = ExclusiveDevice::new_no_delay(bus, cs).map_err(Error::pin)?;
        Ok(Self::new(spi, busy, dc, rst))
    }
}

/// Update state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateState {
    #[default]
    Idle,
    Resetting,
    Initializing,
    TransferringData,
    PoweringOn,
    Refreshing,
    PoweringOff,
}

/// Outcome of every busy wait of an update, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    waits: heapless::Vec<(UpdateState, WaitOutcome), 8>,
}

impl UpdateReport {
    pub fn waits(&self) -> &[(UpdateState, WaitOutcome)] {
        &self.waits
    }

    /// Whether any wait ran into its ceiling
    pub fn timed_out(&self) -> bool {
        self.waits.iter().any(|(_, o)| *o == WaitOutcome::TimedOut)
    }

    /// Outcome of the last wait taken in `state`
    pub fn outcome(&self, state: UpdateState) -> Option<WaitOutcome> {
        self.waits.iter().rev().find(|(s, _)| *s == state).map(|(_, o)| *o)
    }

    fn record(&mut self, state: UpdateState, outcome: WaitOutcome) {
        let _ = self.waits.push((state, outcome));
    }
}

/// Full-frame update sequence for one panel
pub struct UpdateProtocol<SPI, BUSY, DC, RST> {
    interface: Interface<SPI, BUSY, DC, RST>,
    controller: Controller,
    width: u16,
    height: u16,
    timing: Timing,
    state: UpdateState,
}

impl<SPI, BUSY, DC, RST> UpdateProtocol<SPI, BUSY, DC, RST>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// `refresh_timeout_ms` replaces the controller's refresh wait ceiling
    pub fn new(
        interface: Interface<SPI, BUSY, DC, RST>,
        controller: Controller,
        width: u16,
        height: u16,
        refresh_timeout_ms: Option<u32>,
    ) -> Self {
        let mut timing = controller.timing();
        if let Some(ms) = refresh_timeout_ms {
            timing.refresh_ms = ms;
        }
        Self {
            interface,
            controller,
            width,
            height,
            timing,
            state: UpdateState::Idle,
        }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Check if the panel is still busy (e.g. refreshing after a
    /// non-blocking update)
    pub fn is_busy(&mut self) -> Result<bool> {
        self.interface.is_busy()
    }

    pub fn release(self) -> Interface<SPI, BUSY, DC, RST> {
        self.interface
    }

    fn enter(&mut self, state: UpdateState) {
        debug!("EPD: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Reset, initialise, transfer `payload` and refresh the panel.
    ///
    /// With `busy_wait` unset this returns as soon as the refresh command is
    /// sent, leaving the protocol in [`UpdateState::Refreshing`]; call
    /// [`Self::finish`] before the next operation. An update started while a
    /// refresh is outstanding finishes that refresh first.
    pub fn update<DELAY: DelayNs>(
        &mut self,
        delay: &mut DELAY,
        border: Color,
        payload: &[u8],
        busy_wait: bool,
    ) -> Result<UpdateReport> {
        let init = self.controller.init_sequence(self.width, self.height, border)?;

        let mut report = UpdateReport::default();
        if self.state == UpdateState::Refreshing {
            info!("EPD: finishing outstanding refresh");
            report = self.finish(delay)?;
        }

        let result = self.run(delay, &init, payload, busy_wait, &mut report);
        if result.is_err() {
            self.state = UpdateState::Idle;
        }
        result.map(|()| report)
    }

    /// Wait out a dispatched refresh and power the panel off. Does nothing
    /// unless a refresh is outstanding.
    pub fn finish<DELAY: DelayNs>(&mut self, delay: &mut DELAY) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();
        if self.state != UpdateState::Refreshing {
            return Ok(report);
        }
        let result = self.complete(delay, &mut report);
        if result.is_err() {
            self.state = UpdateState::Idle;
        }
        result.map(|()| report)
    }

    fn run<DELAY: DelayNs>(
        &mut self,
        delay: &mut DELAY,
        init: &InitSequence,
        payload: &[u8],
        busy_wait: bool,
        report: &mut UpdateReport,
    ) -> Result<()> {
        info!(
            "EPD: updating {} panel ({} bytes)",
            self.controller.name(),
            payload.len()
        );
        self.interface.setup()?;

        self.enter(UpdateState::Resetting);
        self.interface.hardware_reset(delay, self.timing.reset_pulses)?;
        let outcome = self.interface.busy_wait(delay, self.timing.reset_ms)?;
        report.record(UpdateState::Resetting, outcome);

        self.enter(UpdateState::Initializing);
        for register in init {
            debug!("EPD: register {:#04x} {:02x?}", register.command, register.data.as_slice());
            self.interface.command(register.command, &register.data)?;
        }

        self.enter(UpdateState::TransferringData);
        self.interface.command(self.controller.data_start(), payload)?;

        self.enter(UpdateState::PoweringOn);
        self.interface.command(self.controller.power_on(), &[])?;
        let outcome = self.interface.busy_wait(delay, self.timing.power_on_ms)?;
        report.record(UpdateState::PoweringOn, outcome);

        self.enter(UpdateState::Refreshing);
        let (command, data) = self.controller.refresh();
        self.interface.command(command, data)?;

        if busy_wait {
            self.complete(delay, report)?;
        } else {
            info!("EPD: refresh dispatched");
        }
        Ok(())
    }

    fn complete<DELAY: DelayNs>(&mut self, delay: &mut DELAY, report: &mut UpdateReport) -> Result<()> {
        let outcome = self.interface.busy_wait(delay, self.timing.refresh_ms)?;
        report.record(UpdateState::Refreshing, outcome);

        self.enter(UpdateState::PoweringOff);
        let (command, data) = self.controller.power_off();
        self.interface.command(command, data)?;
        let outcome = self.interface.busy_wait(delay, self.timing.power_off_ms)?;
        report.record(UpdateState::PoweringOff, outcome);

        self.enter(UpdateState::Idle);
        info!("EPD: update complete");
        Ok(())
    }
}

//! Bus expectations and a simulated clock for the protocol tests
//!
//! [`Expect`] builds `embedded-hal-mock` transaction lists for the SPI
//! device, DC, reset and busy lines. [`MockDelay`] advances a clock instead
//! of sleeping so wait ceilings can be checked exactly.

use crate::epd::{Controller, Interface, SPI_CHUNK_SIZE};
use crate::palette::Color;
use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

pub type MockInterface = Interface<SpiMock<u8>, PinMock, PinMock, PinMock>;

/// How one busy wait plays out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Low at the start, high after this many poll intervals
    ReadyAfter(u32),
    /// High at the start, the panel is not driving the line
    HeldHigh,
    /// Never high within this many ms
    TimedOut(u32),
}

/// Expected traffic on every line of one panel
#[derive(Default)]
pub struct Expect {
    pub spi: Vec<SpiTransaction<u8>>,
    pub dc: Vec<PinTransaction>,
    pub rst: Vec<PinTransaction>,
    pub busy: Vec<PinTransaction>,
}

impl Expect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control lines put in their idle levels
    pub fn setup(&mut self) -> &mut Self {
        self.dc.push(PinTransaction::set(State::Low));
        self.rst.push(PinTransaction::set(State::High));
        self
    }

    pub fn reset(&mut self, pulses: u8) -> &mut Self {
        for _ in 0..pulses {
            self.rst.push(PinTransaction::set(State::Low));
            self.rst.push(PinTransaction::set(State::High));
        }
        self
    }

    /// A command byte and, when non-empty, its chunked data block
    pub fn command(&mut self, command: u8, data: &[u8]) -> &mut Self {
        self.dc.push(PinTransaction::set(State::Low));
        self.spi.push(SpiTransaction::transaction_start());
        self.spi.push(SpiTransaction::write_vec(vec![command]));
        self.spi.push(SpiTransaction::transaction_end());
        if !data.is_empty() {
            self.dc.push(PinTransaction::set(State::High));
            self.spi.push(SpiTransaction::transaction_start());
            for chunk in data.chunks(SPI_CHUNK_SIZE) {
                self.spi.push(SpiTransaction::write_vec(chunk.to_vec()));
            }
            self.spi.push(SpiTransaction::transaction_end());
        }
        self
    }

    /// One read of the busy line
    pub fn busy_read(&mut self, high: bool) -> &mut Self {
        let state = if high { State::High } else { State::Low };
        self.busy.push(PinTransaction::get(state));
        self
    }

    pub fn wait(&mut self, wait: Wait) -> &mut Self {
        match wait {
            Wait::HeldHigh => {
                self.busy_read(true);
            }
            Wait::ReadyAfter(polls) => {
                self.busy_read(false);
                for _ in 0..polls {
                    self.busy_read(false);
                }
                self.busy_read(true);
            }
            Wait::TimedOut(timeout_ms) => {
                self.busy_read(false);
                for _ in 0..timeout_ms.div_ceil(10).max(1) {
                    self.busy_read(false);
                }
            }
        }
        self
    }

    /// Reset, init, data, power on and the refresh command
    pub fn dispatch(
        &mut self,
        controller: Controller,
        (width, height): (u16, u16),
        border: Color,
        payload: &[u8],
        [reset, power_on]: [Wait; 2],
    ) -> &mut Self {
        self.reset(controller.timing().reset_pulses).wait(reset);
        let init = controller
            .init_sequence(width, height, border)
            .expect("supported geometry");
        for register in &init {
            self.command(register.command, &register.data);
        }
        self.command(controller.data_start(), payload)
            .command(controller.power_on(), &[])
            .wait(power_on);
        let (refresh, data) = controller.refresh();
        self.command(refresh, data)
    }

    /// Refresh wait, power off and its wait
    pub fn complete(&mut self, controller: Controller, [refresh, power_off]: [Wait; 2]) -> &mut Self {
        self.wait(refresh);
        let (command, data) = controller.power_off();
        self.command(command, data).wait(power_off)
    }

    pub fn build(&self) -> (MockInterface, Lines) {
        let lines = Lines {
            spi: SpiMock::new(&self.spi),
            busy: PinMock::new(&self.busy),
            dc: PinMock::new(&self.dc),
            rst: PinMock::new(&self.rst),
        };
        let interface = Interface::new(
            lines.spi.clone(),
            lines.busy.clone(),
            lines.dc.clone(),
            lines.rst.clone(),
        );
        (interface, lines)
    }
}

/// Handles on the mocks inside an interface
pub struct Lines {
    pub spi: SpiMock<u8>,
    pub busy: PinMock,
    pub dc: PinMock,
    pub rst: PinMock,
}

impl Lines {
    /// Assert every expected transaction happened
    pub fn done(&mut self) {
        self.spi.done();
        self.busy.done();
        self.dc.done();
        self.rst.done();
    }
}

/// Delay that advances a simulated clock instead of sleeping
#[derive(Debug, Default)]
pub struct MockDelay {
    pub now_ns: u64,
    /// Every `delay_ms` call, in order
    pub delays_ms: Vec<u32>,
}

impl MockDelay {
    pub fn now_ms(&self) -> u64 {
        self.now_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ns += u64::from(ms) * 1_000_000;
        self.delays_ms.push(ms);
    }
}

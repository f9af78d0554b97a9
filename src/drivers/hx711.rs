// DynoSense — HX711 Load-Cell Amplifier Driver
//
// Bit-banged two-wire protocol: the data line goes LOW when a conversion
// is ready, then 24 data bits are clocked out MSB-first followed by 1–3
// extra pulses selecting the gain of the *next* conversion. Holding the
// clock HIGH for more than 60 us powers the chip down.

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use thiserror::Error;

/// The amplifier has no conversion to give: either still settling after
/// power-up/configuration, or the data line has not gone ready. Skip this
/// cycle and keep the previous sample — never fatal.
#[derive(Debug, Clone, Copy, Error)]
#[error("load cell not settled or no conversion ready")]
pub struct NotReady;

/// Channel-A gain, selected by the number of trailing clock pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    Gain128,
    Gain32,
    Gain64,
}

impl Gain {
    fn extra_pulses(self) -> u32 {
        match self {
            Gain::Gain128 => 1,
            Gain::Gain32 => 2,
            Gain::Gain64 => 3,
        }
    }
}

/// Output data rate (strapped on the RATE pin); determines settle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    Sps10,
    Sps80,
}

impl Rate {
    /// Datasheet settling time after power-up or gain change.
    fn settle_us(self) -> u32 {
        match self {
            Rate::Sps10 => 400_000,
            Rate::Sps80 => 50_000,
        }
    }
}

pub struct Hx711<'d> {
    clk: PinDriver<'d, AnyOutputPin, Output>,
    dat: PinDriver<'d, AnyInputPin, Input>,
    gain: Gain,
    /// Readings before this tick are invalid (device still settling).
    settle_deadline_us: u32,
}

impl<'d> Hx711<'d> {
    /// Takes the two protocol pins; the device is powered up (clock LOW)
    /// with the conservative 10 SPS settle window armed.
    pub fn new(
        clk: PinDriver<'d, AnyOutputPin, Output>,
        dat: PinDriver<'d, AnyInputPin, Input>,
    ) -> Self {
        let mut hx = Self {
            clk,
            dat,
            gain: Gain::Gain128,
            settle_deadline_us: 0,
        };
        hx.power_up(Rate::Sps10);
        hx
    }

    /// Select gain and data rate. The new gain reaches the analog frontend
    /// on the next clock-out, so the settle window is re-armed.
    pub fn configure(&mut self, gain: Gain, rate: Rate) {
        self.gain = gain;
        self.settle_deadline_us = crate::now_us().wrapping_add(rate.settle_us());
    }

    /// Hold the clock HIGH past the 60 us threshold — chip enters sleep.
    pub fn power_down(&mut self) {
        let _ = self.clk.set_high();
        Ets::delay_us(70);
    }

    /// Release the clock and re-arm the settle window for `rate`.
    pub fn power_up(&mut self, rate: Rate) {
        let _ = self.clk.set_low();
        self.settle_deadline_us = crate::now_us().wrapping_add(rate.settle_us());
    }

    /// Data line LOW signals a completed conversion.
    pub fn is_ready(&self) -> bool {
        self.dat.is_low()
    }

    /// Clock out one signed 24-bit conversion, unscaled.
    ///
    /// The whole transfer is ~50 us of bit-banging with no waiting on the
    /// device: readiness is checked up front, so this never blocks the
    /// sampling loop.
    pub fn read_value(&mut self) -> Result<i32, NotReady> {
        let now = crate::now_us();
        if (now.wrapping_sub(self.settle_deadline_us) as i32) < 0 {
            return Err(NotReady);
        }
        if !self.is_ready() {
            return Err(NotReady);
        }

        let mut raw: u32 = 0;
        for _ in 0..24 {
            let _ = self.clk.set_high();
            Ets::delay_us(1);
            raw = (raw << 1) | u32::from(self.dat.is_high());
            let _ = self.clk.set_low();
            Ets::delay_us(1);
        }

        // Trailing pulses program the gain for the next conversion.
        for _ in 0..self.gain.extra_pulses() {
            let _ = self.clk.set_high();
            Ets::delay_us(1);
            let _ = self.clk.set_low();
            Ets::delay_us(1);
        }

        Ok(sign_extend_24(raw))
    }
}

/// The HX711 ships its value as 24-bit two's complement.
fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

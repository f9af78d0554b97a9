// DynoSense — ADS1100 Analog Channel Driver
//
// Single-ended 16-bit I2C ADC in continuous-conversion mode. One config
// write at init, then each poll is a single 3-byte read transaction
// (data high, data low, config echo).

use esp_idf_hal::i2c::I2cDriver;
use thiserror::Error;

use crate::config::*;
use crate::samples::AnalogSample;

/// An I2C transaction against the ADC did not complete (NAK, timeout,
/// truncated transfer). Transient — the caller keeps the previous sample
/// and retries on the next due cycle.
#[derive(Debug, Error)]
#[error("i2c transaction failed: {0}")]
pub struct BusError(#[from] esp_idf_sys::EspError);

pub struct Ads1100<'d> {
    i2c: I2cDriver<'d>,
    sample: AnalogSample,
    faults: u32,
}

impl<'d> Ads1100<'d> {
    pub fn new(i2c: I2cDriver<'d>) -> Self {
        Self {
            i2c,
            sample: AnalogSample::default(),
            faults: 0,
        }
    }

    /// Write the config register: continuous conversion, 16 SPS, PGA x1.
    pub fn init(&mut self) -> Result<(), BusError> {
        self.i2c
            .write(I2C_ADDR_ADS1100, &[ADS1100_CONFIG], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    /// Read the latest conversion. On bus failure the previous sample is
    /// retained unchanged and the fault counter increments.
    pub fn poll(&mut self) -> Result<AnalogSample, BusError> {
        let mut raw = [0u8; 3];
        if let Err(e) = self
            .i2c
            .read(I2C_ADDR_ADS1100, &mut raw, I2C_TIMEOUT_TICKS)
        {
            self.faults += 1;
            return Err(BusError(e));
        }

        let code = i16::from_be_bytes([raw[0], raw[1]]);
        self.sample = AnalogSample {
            raw_code: code,
            voltage: code_to_voltage(code),
        };
        Ok(self.sample)
    }

    /// Most recent successful reading (zero until the first one lands).
    pub fn sample(&self) -> AnalogSample {
        self.sample
    }

    pub fn fault_count(&self) -> u32 {
        self.faults
    }
}

/// Engineering-unit conversion for the configured gain/resolution.
pub fn code_to_voltage(code: i16) -> f32 {
    ADC_FULL_SCALE_V / ADC_CODE_RANGE * code as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_code_is_zero_volts() {
        assert_eq!(code_to_voltage(0), 0.0);
    }

    #[test]
    fn half_scale_code() {
        // 8192 / 16384 of full scale -> 2.5 V
        assert!((code_to_voltage(8192) - 2.5).abs() < 1e-4);
    }

    #[test]
    fn negative_swing_maps_below_zero() {
        // Pseudo-differential input can read slightly negative.
        assert!(code_to_voltage(-33) < 0.0);
    }
}

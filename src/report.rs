// DynoSense — Fused Report Emitter
//
// One human-readable line per report tick over the data UART, tagged with
// a wrapping 3-digit frame counter so a dropped line is visible on the
// receiving end.

use esp_idf_hal::uart::UartDriver;

use crate::config::*;
use crate::samples::{AnalogSample, LoadCellSample, SpeedSample};

pub struct ReportEmitter<'d> {
    uart: UartDriver<'d>,
    seq: u32,
}

impl<'d> ReportEmitter<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart, seq: 0 }
    }

    /// Format and send one fused line. The driver's TX ring buffer bounds
    /// the write; a failed write drops the line instead of stalling the
    /// sampling loop.
    pub fn emit(&mut self, analog: AnalogSample, load: LoadCellSample, speed: &SpeedSample) {
        let line = format_report(self.seq, analog, load, speed);
        self.seq = (self.seq + 1) % REPORT_SEQ_MODULUS;

        if let Err(e) = self.uart.write(line.as_bytes()) {
            log::debug!("report line dropped: {}", e);
        }
    }
}

fn format_report(
    seq: u32,
    analog: AnalogSample,
    load: LoadCellSample,
    speed: &SpeedSample,
) -> String {
    if speed.valid {
        format!(
            "<{:03}> ADC mV {:.3}  Scale value: {}  Tacho {:.1} RPM\n",
            seq, analog.voltage, load.raw_value, speed.rpm
        )
    } else {
        format!(
            "<{:03}> ADC mV {:.3}  Scale value: {}  Tacho stalled\n",
            seq, analog.voltage, load.raw_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analog() -> AnalogSample {
        AnalogSample {
            raw_code: 8192,
            voltage: 2.5,
        }
    }

    #[test]
    fn line_carries_all_three_fields() {
        let speed = SpeedSample {
            pulse_hz: 100.0,
            rev_per_sec: 100.0,
            rpm: 6000.0,
            valid: true,
            age_us: 120,
        };
        let line = format_report(7, analog(), LoadCellSample { raw_value: -1234 }, &speed);

        assert!(line.starts_with("<007> "));
        assert!(line.contains("ADC mV 2.500"));
        assert!(line.contains("Scale value: -1234"));
        assert!(line.contains("Tacho 6000.0 RPM"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn stalled_speed_reports_stalled() {
        let speed = SpeedSample::stalled(750_000);
        let line = format_report(999, analog(), LoadCellSample { raw_value: 42 }, &speed);

        assert!(line.starts_with("<999> "));
        assert!(line.contains("Tacho stalled"));
        assert!(!line.contains("RPM"));
    }
}

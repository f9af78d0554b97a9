// DynoSense — Sensor Sample Types

// ---------------------------------------------------------------------------
// Analog channel (ADS1100 reading, converted to volts)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalogSample {
    pub raw_code: i16,
    pub voltage: f32,
}

// ---------------------------------------------------------------------------
// Load cell (HX711 register value, unscaled)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadCellSample {
    pub raw_value: i32,
}

// ---------------------------------------------------------------------------
// Rotational speed (derived from tachometer edge timing)
// ---------------------------------------------------------------------------
/// Recomputed whole each loop iteration — never partially updated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedSample {
    /// Raw pulse frequency in Hz.
    pub pulse_hz: f32,
    /// Shaft speed in revolutions per second.
    pub rev_per_sec: f32,
    /// Shaft speed in RPM.
    pub rpm: f32,
    /// False until two edges have been seen, and whenever the shaft has
    /// stalled (no edge within the stall timeout).
    pub valid: bool,
    /// Time since the last accepted edge, in microseconds.
    pub age_us: u32,
}

impl SpeedSample {
    /// An invalid (stopped / not-yet-measured) reading.
    pub fn stalled(age_us: u32) -> Self {
        Self {
            valid: false,
            age_us,
            ..Self::default()
        }
    }
}

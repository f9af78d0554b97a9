// DynoSense — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_TACHO: i32 = 3;       // D1 — Tachometer pulse input (INPUT_PULLUP, falling edge)
pub const PIN_HX711_CLK: i32 = 4;   // D2 — HX711 serial clock (output)
pub const PIN_HX711_DAT: i32 = 5;   // D3 — HX711 serial data (input, LOW = data ready)
pub const PIN_I2C_SDA: i32 = 6;     // D4 — I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5 — I2C clock line
pub const PIN_PWM_ECHO: i32 = 8;    // D8 — Speed-echo PWM output
pub const PIN_LED: i32 = 10;        // D10 — Status LED (loop heartbeat)
pub const PIN_UART_TX: i32 = 21;    // D6 — Report UART TX
pub const PIN_UART_RX: i32 = 20;    // D7 — Report UART RX (unused, reserved)

// ---------------------------------------------------------------------------
// I2C Bus / ADS1100
// ---------------------------------------------------------------------------
pub const I2C_ADDR_ADS1100: u8 = 0x4B;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

/// Config register: continuous conversion, 16 SPS, PGA x1.
pub const ADS1100_CONFIG: u8 = 0x08;

/// Full-scale input of the ADS1100 as wired (supply-referenced).
pub const ADC_FULL_SCALE_V: f32 = 5.0;
/// Positive code span at 16 SPS, PGA x1.
pub const ADC_CODE_RANGE: f32 = 16384.0;

// ---------------------------------------------------------------------------
// Timing (microsecond tick domain)
// ---------------------------------------------------------------------------
// All cadences and edge timestamps share one monotonic clock: the lower
// 32 bits of esp_timer's microsecond counter. Interval arithmetic is done
// with wrapping_sub, valid for any true interval below 2^32 us (~71.6 min).
pub const TICK_HZ: u32 = 1_000_000;

pub const ANALOG_PERIOD_US: u32 = 62_500;    // one ADS1100 conversion at 16 SPS
pub const LOADCELL_PERIOD_US: u32 = 100_000; // 10 Hz, above the HX711 10 SPS rate
pub const REPORT_PERIOD_US: u32 = 50_000;    // 20 Hz fused report

/// Loop sleep per iteration — keeps worst-case due latency well under the
/// shortest period while yielding to the FreeRTOS idle task.
pub const LOOP_YIELD_MS: u64 = 1;

// ---------------------------------------------------------------------------
// Tachometer
// ---------------------------------------------------------------------------
// Sized for a 25 000 RPM ceiling with one pulse per revolution: the
// shortest real pulse interval is ~2.4 ms, >10x the debounce window.
pub const TACHO_DEBOUNCE_US: u32 = 200;
pub const TACHO_STALL_TIMEOUT_US: u32 = 500_000;

/// Pulses per shaft revolution — set per the sensor wheel on the rig.
pub const PULSES_PER_REV: u32 = 1;

/// Maximum expected input RPM; top of the speed-echo PWM scale.
pub const MAX_RPM: f32 = 25_000.0;

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------
pub const UART_BAUD: u32 = 115_200;

/// Frame counter wraps at 1000 (3 digits on the wire).
pub const REPORT_SEQ_MODULUS: u32 = 1000;

// DynoSense — Firmware Entry Point
//
// Sensor-fusion controller for a motor test rig. Three inputs on
// incompatible cadences:
//   - ADS1100 analog channel, polled over I2C (one conversion per 62.5 ms)
//   - HX711 load-cell amplifier, bit-banged (10 SPS, 400 ms settle)
//   - Tachometer pulse train, timestamped by a GPIO edge interrupt
//
// A multi-rate scheduler runs whichever poll is due each loop iteration
// and emits one fused report line over the data UART at 20 Hz. The status
// LED toggles every iteration as a liveness heartbeat, and a PWM output
// echoes the measured shaft speed.

mod config;
mod drivers;
mod report;
mod samples;
mod scheduler;
mod tacho;

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};

use crate::config::*;
use crate::drivers::ads1100::Ads1100;
use crate::drivers::hx711::{Gain, Hx711, NotReady, Rate};
use crate::report::ReportEmitter;
use crate::samples::{LoadCellSample, SpeedSample};
use crate::scheduler::Scheduler;

// ---------------------------------------------------------------------------
// Utility: microseconds since boot (wraps at ~71.6 min — all interval math
// in this firmware is wrapping, see config.rs)
// ---------------------------------------------------------------------------
pub fn now_us() -> u32 {
    unsafe { esp_idf_sys::esp_timer_get_time() as u32 }
}

// ---------------------------------------------------------------------------
// Tachometer edge ISR — the only preemptive context. Timestamp the pulse
// into the shared edge log and return; debounce happens inside record().
// ---------------------------------------------------------------------------
unsafe extern "C" fn tacho_edge_isr(_arg: *mut core::ffi::c_void) {
    tacho::EDGES.record(now_us());
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("DynoSense firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (ADS1100 analog channel) ---------------------------------
    let i2c_config = I2cConfig::new().baudrate(100u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;

    let mut adc = Ads1100::new(i2c);
    match adc.init() {
        Ok(()) => log::info!("ADS1100 configured (continuous, 16 SPS, PGA x1)"),
        // Continue anyway — the analog field degrades, the rig still runs.
        Err(e) => log::error!("ADS1100 init failed: {}", e),
    }

    // ---- HX711 load cell --------------------------------------------------
    let hx_clk = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
    let hx_dat = PinDriver::input(peripherals.pins.gpio5.downgrade_input())?;
    let mut scale = Hx711::new(hx_clk, hx_dat);
    scale.configure(Gain::Gain128, Rate::Sps10);
    log::info!("HX711 configured (gain 128, 10 SPS)");

    // ---- Tachometer input + edge interrupt --------------------------------
    // The PinDriver configures the pin as input; pull mode and the ISR hook
    // go through the raw API (the handler must stay registered for the
    // lifetime of the programme, not one notification).
    let _tacho_in = PinDriver::input(peripherals.pins.gpio3.downgrade_input())?;
    unsafe {
        esp_idf_sys::gpio_set_pull_mode(
            PIN_TACHO,
            esp_idf_sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY,
        );
        esp_idf_sys::esp!(esp_idf_sys::gpio_install_isr_service(0))?;
        esp_idf_sys::esp!(esp_idf_sys::gpio_set_intr_type(
            PIN_TACHO,
            esp_idf_sys::gpio_int_type_t_GPIO_INTR_NEGEDGE,
        ))?;
        esp_idf_sys::esp!(esp_idf_sys::gpio_isr_handler_add(
            PIN_TACHO,
            Some(tacho_edge_isr),
            core::ptr::null_mut(),
        ))?;
    }
    log::info!("Tachometer edge capture armed on GPIO{}", PIN_TACHO);

    // ---- Data UART --------------------------------------------------------
    let uart_config = UartConfig::new().baudrate(UART_BAUD.Hz());
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio21, // TX
        peripherals.pins.gpio20, // RX (reserved)
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;
    let mut reporter = ReportEmitter::new(uart);

    // ---- Speed-echo PWM ---------------------------------------------------
    let ledc_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(25u32.kHz().into())
            .resolution(Resolution::Bits10),
    )?;
    let mut speed_echo =
        LedcDriver::new(peripherals.ledc.channel0, ledc_timer, peripherals.pins.gpio8)?;
    let echo_max_duty = speed_echo.get_max_duty();

    // ---- Status LED -------------------------------------------------------
    let mut led = PinDriver::output(peripherals.pins.gpio10.downgrade_output())?;

    // ---- Sampling loop ----------------------------------------------------
    // Fixed priority per iteration: analog, load cell, report. Each timer
    // advances from its previous due time, so jitter never drifts the
    // schedule.
    let mut sched = Scheduler::new(now_us());
    let mut loadcell = LoadCellSample::default();

    log::info!("Bring-up complete — entering sampling loop");

    loop {
        let now = now_us();
        let speed = tacho::EDGES.speed(now);

        if sched.analog_due(now) {
            if let Err(e) = adc.poll() {
                log::warn!("ADS1100 poll failed (fault #{}): {}", adc.fault_count(), e);
            }
            sched.analog_completed();
        }

        if sched.loadcell_due(now) {
            match scale.read_value() {
                Ok(v) => loadcell = LoadCellSample { raw_value: v },
                // Not settled or no conversion yet — keep the previous sample.
                Err(NotReady) => {}
            }
            sched.loadcell_completed();
        }

        if sched.report_due(now) {
            reporter.emit(adc.sample(), loadcell, &speed);
            update_speed_echo(&mut speed_echo, echo_max_duty, &speed);
            sched.report_completed();
        }

        // Loop liveness heartbeat, due actions or not.
        let _ = led.toggle();

        thread::sleep(Duration::from_millis(LOOP_YIELD_MS));
    }
}

/// Mirror the measured pulse frequency on the PWM output, full duty at
/// MAX_RPM. A stalled shaft reads as zero.
fn update_speed_echo(pwm: &mut LedcDriver<'_>, max_duty: u32, speed: &SpeedSample) {
    let max_pulse_hz = MAX_RPM / 60.0 * PULSES_PER_REV as f32;
    let duty = if speed.valid {
        ((speed.pulse_hz / max_pulse_hz).clamp(0.0, 1.0) * max_duty as f32) as u32
    } else {
        0
    };
    let _ = pwm.set_duty(duty);
}

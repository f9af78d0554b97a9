// DynoSense — Tachometer Edge Log & Frequency Estimator
//
// The GPIO edge ISR timestamps each qualifying pulse into `EDGES`; the
// sampling loop derives a SpeedSample from the two most recent edges.
// Single writer (ISR), single reader (loop) — the accepted-edge counter
// doubles as a sequence lock, so the reader never sees a torn pair.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::*;
use crate::samples::SpeedSample;

/// Shared edge log, written only from the tachometer ISR.
pub static EDGES: EdgeLog = EdgeLog::new();

pub struct EdgeLog {
    /// Count of accepted edges; bumped last, after `prev`/`last` are written.
    seq: AtomicU32,
    /// Timestamp of the most recent accepted edge (us ticks).
    last: AtomicU32,
    /// Timestamp of the accepted edge before `last`.
    prev: AtomicU32,
}

/// A consistent copy of the log taken outside the ISR.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSnapshot {
    pub count: u32,
    pub last: u32,
    pub prev: u32,
}

impl EdgeLog {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            last: AtomicU32::new(0),
            prev: AtomicU32::new(0),
        }
    }

    /// Record one edge at `now`. Called from the ISR — branch-light, no
    /// locks. Edges closer than TACHO_DEBOUNCE_US to the previously
    /// accepted edge are electrical noise and are dropped silently.
    pub fn record(&self, now: u32) {
        let count = self.seq.load(Ordering::Relaxed);
        let last = self.last.load(Ordering::Relaxed);

        if count > 0 && now.wrapping_sub(last) < TACHO_DEBOUNCE_US {
            return;
        }

        self.prev.store(last, Ordering::Relaxed);
        self.last.store(now, Ordering::Relaxed);
        // Publishing the new count last makes the pair visible atomically
        // to the snapshot loop below.
        self.seq.store(count.wrapping_add(1), Ordering::Release);
    }

    /// Copy the last two timestamps without holding any lock. Re-reads the
    /// counter and retries if the ISR fired mid-copy; with pulse intervals
    /// in the hundreds of microseconds this loops at most once.
    pub fn snapshot(&self) -> EdgeSnapshot {
        loop {
            let c1 = self.seq.load(Ordering::Acquire);
            let last = self.last.load(Ordering::Relaxed);
            let prev = self.prev.load(Ordering::Relaxed);
            let c2 = self.seq.load(Ordering::Acquire);
            if c1 == c2 {
                return EdgeSnapshot { count: c1, last, prev };
            }
        }
    }

    /// Derive the current speed reading at time `now`.
    ///
    /// Elapsed ticks between edges are computed with wrapping subtraction,
    /// which stays correct across the u32 counter rollover as long as the
    /// true interval is under 2^32 us (~71.6 min); the stall timeout
    /// declares the shaft stopped long before that bound matters.
    pub fn speed(&self, now: u32) -> SpeedSample {
        let snap = self.snapshot();

        if snap.count < 2 {
            // Zero or one edge ever — nothing to measure yet.
            return SpeedSample::stalled(if snap.count == 0 {
                0
            } else {
                now.wrapping_sub(snap.last)
            });
        }

        let age = now.wrapping_sub(snap.last);
        if age > TACHO_STALL_TIMEOUT_US {
            return SpeedSample::stalled(age);
        }

        let elapsed = snap.last.wrapping_sub(snap.prev);
        if elapsed == 0 {
            return SpeedSample::stalled(age);
        }

        let pulse_hz = TICK_HZ as f32 / elapsed as f32;
        let rev_per_sec = pulse_hz / PULSES_PER_REV as f32;
        SpeedSample {
            pulse_hz,
            rev_per_sec,
            rpm: rev_per_sec * 60.0,
            valid: true,
            age_us: age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edges_is_invalid() {
        let log = EdgeLog::new();
        let sample = log.speed(1_000);
        assert!(!sample.valid);
        assert_eq!(sample.rpm, 0.0);
    }

    #[test]
    fn single_edge_is_invalid() {
        let log = EdgeLog::new();
        log.record(0);
        let sample = log.speed(6_000_000);
        assert!(!sample.valid);
        assert_eq!(sample.rev_per_sec, 0.0);
    }

    #[test]
    fn evenly_spaced_edges_give_exact_rate() {
        let log = EdgeLog::new();
        log.record(0);
        log.record(1_000_000);
        log.record(2_000_000);

        let sample = log.speed(2_000_000);
        assert!(sample.valid);
        assert!((sample.rev_per_sec - 1.0).abs() < 1e-6);
        assert!((sample.rpm - 60.0).abs() < 1e-4);
        assert_eq!(sample.age_us, 0);
    }

    #[test]
    fn rate_matches_tick_frequency_over_elapsed() {
        let log = EdgeLog::new();
        log.record(10_000);
        log.record(12_500); // 2500 us apart -> 400 Hz

        let sample = log.speed(12_500);
        assert!(sample.valid);
        assert!((sample.pulse_hz - 400.0).abs() < 1e-3);
    }

    #[test]
    fn sub_debounce_edge_is_rejected() {
        let log = EdgeLog::new();
        log.record(1_000);
        log.record(1_000 + TACHO_DEBOUNCE_US - 1);

        let snap = log.snapshot();
        assert_eq!(snap.count, 1);
        assert_eq!(snap.last, 1_000);
    }

    #[test]
    fn edge_at_debounce_boundary_is_accepted() {
        let log = EdgeLog::new();
        log.record(1_000);
        log.record(1_000 + TACHO_DEBOUNCE_US);

        assert_eq!(log.snapshot().count, 2);
    }

    #[test]
    fn stall_timeout_invalidates_prior_rate() {
        let log = EdgeLog::new();
        log.record(0);
        log.record(2_500);

        let fresh = log.speed(3_000);
        assert!(fresh.valid);

        let stale = log.speed(2_500 + TACHO_STALL_TIMEOUT_US + 1);
        assert!(!stale.valid);
        assert_eq!(stale.age_us, TACHO_STALL_TIMEOUT_US + 1);
    }

    #[test]
    fn rollover_straddling_edges_measure_correctly() {
        let log = EdgeLog::new();
        log.record(u32::MAX - 499);
        log.record(500); // wraps: true elapsed is 1000 us

        let sample = log.speed(500);
        assert!(sample.valid);
        assert!((sample.pulse_hz - 1_000.0).abs() < 1e-2);
    }

    #[test]
    fn debounce_window_spans_rollover() {
        let log = EdgeLog::new();
        log.record(u32::MAX - 50);
        log.record(49); // true gap 100 us < debounce

        assert_eq!(log.snapshot().count, 1);
    }
}

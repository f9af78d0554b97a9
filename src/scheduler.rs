// DynoSense — Multi-Rate Sampling Scheduler
//
// Three independent due timers (analog, load cell, report) on the shared
// microsecond clock. A completed action advances its own deadline by a
// fixed period relative to the *previous* deadline, so execution jitter
// never accumulates into schedule drift.

use crate::config::*;

pub struct Scheduler {
    next_analog: u32,
    next_loadcell: u32,
    next_report: u32,
}

impl Scheduler {
    /// All three actions are due on the first iteration after start.
    pub fn new(now: u32) -> Self {
        Self {
            next_analog: now,
            next_loadcell: now,
            next_report: now,
        }
    }

    // Wrapping deadline comparison: true once `now` has reached `deadline`,
    // valid while the distance between them is under half the u32 range.
    fn due(now: u32, deadline: u32) -> bool {
        now.wrapping_sub(deadline) as i32 >= 0
    }

    pub fn analog_due(&self, now: u32) -> bool {
        Self::due(now, self.next_analog)
    }

    pub fn loadcell_due(&self, now: u32) -> bool {
        Self::due(now, self.next_loadcell)
    }

    pub fn report_due(&self, now: u32) -> bool {
        Self::due(now, self.next_report)
    }

    // Completion hooks — called after the action ran, whether it succeeded
    // or failed recoverably. Deadlines advance from their previous value,
    // never from "now".

    pub fn analog_completed(&mut self) {
        self.next_analog = self.next_analog.wrapping_add(ANALOG_PERIOD_US);
    }

    pub fn loadcell_completed(&mut self) {
        self.next_loadcell = self.next_loadcell.wrapping_add(LOADCELL_PERIOD_US);
    }

    pub fn report_completed(&mut self) {
        self.next_report = self.next_report.wrapping_add(REPORT_PERIOD_US);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_due_at_start() {
        let start = 12_345;
        let s = Scheduler::new(start);
        assert!(s.analog_due(start));
        assert!(s.loadcell_due(start));
        assert!(s.report_due(start));
    }

    #[test]
    fn not_due_before_period_elapses() {
        let mut s = Scheduler::new(0);
        s.report_completed();
        assert!(!s.report_due(REPORT_PERIOD_US - 1));
        assert!(s.report_due(REPORT_PERIOD_US));
    }

    #[test]
    fn timers_advance_independently() {
        let mut s = Scheduler::new(0);
        s.analog_completed();
        assert!(s.loadcell_due(0));
        assert!(s.report_due(0));
        assert!(!s.analog_due(0));
    }

    #[test]
    fn due_time_advancement_is_drift_free() {
        // Execution jitter must not shift the schedule: after n completions
        // the deadline is exactly start + n * period, no matter how late
        // each action actually ran.
        let start: u32 = 7_000;
        let mut s = Scheduler::new(start);
        let mut now = start;

        for i in 0..1_000u32 {
            assert!(s.report_due(now), "iteration {} should be due", i);
            // Run late by a varying jitter of up to ~1/5 of the period.
            let jitter = (i * 997) % (REPORT_PERIOD_US / 5);
            now = now.wrapping_add(jitter);
            s.report_completed();

            let expected_next = start.wrapping_add((i + 1).wrapping_mul(REPORT_PERIOD_US));
            assert_eq!(s.next_report, expected_next);

            // Jump to the next deadline for the following iteration.
            now = expected_next;
        }
    }

    #[test]
    fn deadlines_wrap_across_rollover() {
        let start = u32::MAX - REPORT_PERIOD_US / 2;
        let mut s = Scheduler::new(start);
        assert!(s.report_due(start));
        s.report_completed();

        // The new deadline lives past the wrap point.
        let next = start.wrapping_add(REPORT_PERIOD_US);
        assert!(!s.report_due(u32::MAX));
        assert!(s.report_due(next));
        assert!(s.report_due(next.wrapping_add(10)));
    }
}

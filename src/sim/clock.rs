//! Periodic timers for the session
//!
//! The controller never reads wall time. It arms named periodic timers on a
//! `Clock` and the clock reports which of them fired when it is advanced.
//! `ManualClock` advances in exact steps for tests and the headless demo,
//! `FrameClock` is fed `requestAnimationFrame` deltas in the browser.

use crate::consts::MAX_FRAME_DELTA_MS;

/// The three timers a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One second countdown
    Countdown,
    /// Mosquito spawner
    Spawn,
    /// Position update
    Frame,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::Countdown, TimerKind::Spawn, TimerKind::Frame];

    fn slot(self) -> usize {
        match self {
            TimerKind::Countdown => 0,
            TimerKind::Spawn => 1,
            TimerKind::Frame => 2,
        }
    }
}

/// Handle to one arming of a timer. Cancelling a handle from an earlier
/// arming of the same kind does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    kind: TimerKind,
    generation: u32,
}

/// Source of periodic callbacks
pub trait Clock {
    /// Arm a repeating timer; the first firing is one period from now.
    /// Arming a kind that is already armed replaces it.
    fn arm(&mut self, kind: TimerKind, period_ms: u32) -> TimerHandle;

    /// Disarm a timer. Stale handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    fn is_armed(&self, kind: TimerKind) -> bool;

    /// Move time forward and append every firing due in the window to
    /// `fired`, oldest first.
    fn advance(&mut self, elapsed_ms: f64, fired: &mut Vec<TimerKind>);
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    period_ms: f64,
    next_due: f64,
    /// Breaks ties between timers due at the same instant
    armed_seq: u64,
}

/// Shared bookkeeping behind both clocks
#[derive(Debug, Clone, Default)]
struct Schedule {
    now: f64,
    slots: [Option<Slot>; 3],
    next_generation: u32,
    next_seq: u64,
}

impl Schedule {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn next_due(&self, until: f64) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .filter(|(_, s)| s.next_due <= until)
            .min_by(|(_, a), (_, b)| {
                a.next_due
                    .partial_cmp(&b.next_due)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.armed_seq.cmp(&b.armed_seq))
            })
            .map(|(i, _)| i)
    }
}

impl Clock for Schedule {
    fn arm(&mut self, kind: TimerKind, period_ms: u32) -> TimerHandle {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let period_ms = f64::from(period_ms.max(1));
        self.slots[kind.slot()] = Some(Slot {
            generation,
            period_ms,
            next_due: self.now + period_ms,
            armed_seq: self.next_seq,
        });
        self.next_seq += 1;
        TimerHandle { kind, generation }
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let slot = &mut self.slots[handle.kind.slot()];
        if slot.is_some_and(|s| s.generation == handle.generation) {
            *slot = None;
        }
    }

    fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    fn advance(&mut self, elapsed_ms: f64, fired: &mut Vec<TimerKind>) {
        if elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
            return;
        }
        let until = self.now + elapsed_ms;
        while let Some(i) = self.next_due(until) {
            if let Some(slot) = self.slots[i].as_mut() {
                slot.next_due += slot.period_ms;
            }
            fired.push(TimerKind::ALL[i]);
        }
        self.now = until;
    }
}

/// Deterministic clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    schedule: Schedule,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds advanced since creation
    pub fn now_ms(&self) -> f64 {
        self.schedule.now_ms()
    }
}

impl Clock for ManualClock {
    fn arm(&mut self, kind: TimerKind, period_ms: u32) -> TimerHandle {
        self.schedule.arm(kind, period_ms)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.schedule.cancel(handle);
    }

    fn is_armed(&self, kind: TimerKind) -> bool {
        self.schedule.is_armed(kind)
    }

    fn advance(&mut self, elapsed_ms: f64, fired: &mut Vec<TimerKind>) {
        self.schedule.advance(elapsed_ms, fired);
    }
}

/// Browser clock driven by animation frame deltas
///
/// A hidden tab stops animation frames; when it comes back the gap is
/// clamped so the session resumes instead of replaying the backlog.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    schedule: Schedule,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for FrameClock {
    fn arm(&mut self, kind: TimerKind, period_ms: u32) -> TimerHandle {
        self.schedule.arm(kind, period_ms)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.schedule.cancel(handle);
    }

    fn is_armed(&self, kind: TimerKind) -> bool {
        self.schedule.is_armed(kind)
    }

    fn advance(&mut self, elapsed_ms: f64, fired: &mut Vec<TimerKind>) {
        self.schedule.advance(elapsed_ms.min(MAX_FRAME_DELTA_MS), fired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_firing() {
        let mut clock = ManualClock::new();
        clock.arm(TimerKind::Countdown, 1000);
        let mut fired = Vec::new();

        clock.advance(999.0, &mut fired);
        assert!(fired.is_empty());

        clock.advance(1.0, &mut fired);
        assert_eq!(fired, vec![TimerKind::Countdown]);
        assert_eq!(clock.now_ms(), 1000.0);

        fired.clear();
        clock.advance(3000.0, &mut fired);
        assert_eq!(fired.len(), 3);
    }

    #[test]
    fn test_firings_in_time_order() {
        let mut clock = ManualClock::new();
        clock.arm(TimerKind::Countdown, 1000);
        clock.arm(TimerKind::Spawn, 2000);
        clock.arm(TimerKind::Frame, 400);
        let mut fired = Vec::new();
        clock.advance(2000.0, &mut fired);

        use TimerKind::*;
        // Everything is due at 2000; ties resolve in arming order
        assert_eq!(
            fired,
            vec![Frame, Frame, Countdown, Frame, Frame, Countdown, Spawn, Frame]
        );
    }

    #[test]
    fn test_cancel_and_stale_handle() {
        let mut clock = ManualClock::new();
        let old = clock.arm(TimerKind::Spawn, 2000);
        clock.cancel(old);
        assert!(!clock.is_armed(TimerKind::Spawn));

        let new = clock.arm(TimerKind::Spawn, 2000);
        clock.cancel(old);
        assert!(clock.is_armed(TimerKind::Spawn));

        clock.cancel(new);
        let mut fired = Vec::new();
        clock.advance(10_000.0, &mut fired);
        assert!(fired.is_empty());
    }

    #[test]
    fn test_frame_clock_clamps_gaps() {
        let mut clock = FrameClock::new();
        clock.arm(TimerKind::Frame, 50);
        let mut fired = Vec::new();

        // Ten seconds in a background tab
        clock.advance(10_000.0, &mut fired);
        assert_eq!(fired.len(), (MAX_FRAME_DELTA_MS / 50.0) as usize);
    }
}

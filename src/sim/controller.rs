//! Session controller
//!
//! Owns the session, the three timers and the random source. Every entry
//! point checks the phase first: timer callbacks can still arrive in the
//! same batch as the `end()` that disarmed them, and pointer events can
//! arrive at any time.

use std::collections::VecDeque;

use glam::Vec2;
use rand_pcg::Pcg32;

use super::clock::{Clock, ManualClock, TimerHandle, TimerKind};
use super::rng::{self, RandomSource};
use super::state::{GameEvent, GameOverReason, GamePhase, Session, Surface, Target};
use crate::tuning::Tuning;

/// Events kept for a frontend that is not draining them
pub const MAX_PENDING_EVENTS: usize = 256;

/// Drives one session through Idle -> Playing -> GameOver -> Idle
#[derive(Debug)]
pub struct SessionController<C: Clock = ManualClock, R: RandomSource = Pcg32> {
    session: Session,
    tuning: Tuning,
    surface: Surface,
    clock: C,
    rng: R,
    countdown: Option<TimerHandle>,
    spawner: Option<TimerHandle>,
    frame: Option<TimerHandle>,
    /// Reused firing buffer for `pump`
    fired: Vec<TimerKind>,
    events: VecDeque<GameEvent>,
}

impl SessionController<ManualClock, Pcg32> {
    /// Deterministic controller with a manual clock and seeded RNG
    pub fn seeded(seed: u64, tuning: Tuning, surface: Surface) -> Self {
        Self::new(tuning, surface, ManualClock::new(), rng::seeded(seed))
    }
}

impl<C: Clock, R: RandomSource> SessionController<C, R> {
    pub fn new(tuning: Tuning, surface: Surface, clock: C, rng: R) -> Self {
        let tuning = tuning.sanitized();
        Self {
            session: Session::new(&tuning),
            tuning,
            surface,
            clock,
            rng,
            countdown: None,
            spawner: None,
            frame: None,
            fired: Vec::with_capacity(16),
            events: VecDeque::with_capacity(32),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Play area changed size (window resize). Affects future spawns and culling.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.surface.width = width;
        self.surface.height = height;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// True if any of the session timers is armed on the clock
    pub fn timers_armed(&self) -> bool {
        TimerKind::ALL.iter().any(|&k| self.clock.is_armed(k))
    }

    /// Events since the last drain, oldest first
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    fn emit(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Begin a fresh session from any phase
    pub fn start(&mut self) {
        self.disarm();
        self.session.restore(&self.tuning);
        self.session.phase = GamePhase::Playing;

        let tuning = &self.tuning;
        let (countdown_ms, spawn_ms, frame_ms) = (
            tuning.countdown_interval_ms,
            tuning.spawn_interval_ms,
            tuning.frame_interval_ms,
        );
        self.countdown = Some(self.clock.arm(TimerKind::Countdown, countdown_ms));
        self.spawner = Some(self.clock.arm(TimerKind::Spawn, spawn_ms));
        self.frame = Some(self.clock.arm(TimerKind::Frame, frame_ms));

        log::info!(
            "Session started: {}s, {} lives",
            self.session.time_remaining,
            self.session.lives
        );
        self.emit(GameEvent::Started);
        self.session.check_invariants();
    }

    /// Player gave up
    pub fn end(&mut self) {
        self.finish(GameOverReason::Ended);
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.disarm();
        if self.session.phase != GamePhase::Playing {
            return;
        }
        self.session.phase = GamePhase::GameOver;
        log::info!(
            "Game over ({:?}): score {}, {} lives, {}s left",
            reason,
            self.session.score,
            self.session.lives,
            self.session.time_remaining
        );
        self.emit(GameEvent::GameOver {
            score: self.session.score,
            reason,
        });
        self.session.check_invariants();
    }

    /// Back to the pristine idle screen from any phase
    pub fn reset(&mut self) {
        self.disarm();
        self.session.restore(&self.tuning);
        self.session.phase = GamePhase::Idle;
        log::info!("Session reset");
        self.emit(GameEvent::Reset);
        self.session.check_invariants();
    }

    fn disarm(&mut self) {
        for handle in [self.countdown.take(), self.spawner.take(), self.frame.take()]
            .into_iter()
            .flatten()
        {
            self.clock.cancel(handle);
        }
    }

    /// Countdown timer callback
    pub fn tick_second(&mut self) {
        if self.session.phase != GamePhase::Playing {
            return;
        }
        if self.session.time_remaining <= 1 {
            self.session.time_remaining = 0;
            self.emit(GameEvent::TimeTick { remaining: 0 });
            self.finish(GameOverReason::TimeUp);
            return;
        }
        self.session.time_remaining -= 1;
        let remaining = self.session.time_remaining;
        self.emit(GameEvent::TimeTick { remaining });
    }

    /// Spawn timer callback. Returns the new mosquito's ID.
    pub fn spawn_target(&mut self) -> Option<u32> {
        if self.session.phase != GamePhase::Playing {
            return None;
        }
        let x = self.rng.in_range(0.0, self.surface.max_spawn_x());
        let speed = self
            .rng
            .in_range(self.tuning.speed_min, self.tuning.speed_max);
        let id = self.session.next_target_id();
        let pos = Vec2::new(x, self.surface.spawn_y());

        self.session
            .targets
            .push(Target::new(id, pos, speed, self.tuning.target_line));
        log::debug!(
            "Spawned mosquito {} at ({:.0}, {:.0}) speed {:.2}",
            id,
            pos.x,
            pos.y,
            speed
        );
        self.emit(GameEvent::TargetSpawned { id });
        self.session.check_invariants();
        Some(id)
    }

    /// Frame timer callback: rise, fall, cull, and charge lives
    pub fn advance_frame(&mut self) {
        if self.session.phase != GamePhase::Playing {
            return;
        }
        let fall_step = self.tuning.fall_step;
        let cull_y = self.surface.height + self.tuning.cull_margin;
        let mut lives = self.session.lives;
        let mut out_of_lives = false;
        let events = &mut self.events;

        self.session.targets.retain_mut(|target| {
            if !target.alive {
                target.pos.y += fall_step;
                return target.pos.y < cull_y;
            }

            let new_y = target.pos.y - target.speed;
            if new_y <= target.target_line {
                if lives <= 1 {
                    lives = 0;
                    out_of_lives = true;
                } else {
                    lives -= 1;
                }
                log::debug!("Mosquito {} reached the arm, {} lives left", target.id, lives);
                if events.len() >= MAX_PENDING_EVENTS {
                    events.pop_front();
                }
                events.push_back(GameEvent::TargetReachedArm {
                    id: target.id,
                    lives,
                });
                return false;
            }

            target.pos.y = new_y;
            true
        });

        self.session.lives = lives;
        if out_of_lives {
            self.finish(GameOverReason::OutOfLives);
        }
        self.session.check_invariants();
    }

    /// Pointer entered a mosquito. Returns true if the swat scored.
    pub fn hit(&mut self, id: u32) -> bool {
        if self.session.phase != GamePhase::Playing {
            return false;
        }
        let Some(target) = self.session.target_mut(id) else {
            return false;
        };
        if !target.swat() {
            return false;
        }
        self.session.score += self.tuning.hit_score;
        let score = self.session.score;
        log::debug!("Swatted mosquito {}, score {}", id, score);
        self.emit(GameEvent::TargetSwatted { id, score });
        true
    }

    /// Run one timer callback
    pub fn dispatch(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Countdown => self.tick_second(),
            TimerKind::Spawn => {
                self.spawn_target();
            }
            TimerKind::Frame => self.advance_frame(),
        }
    }

    /// Advance the clock and run every callback that came due, in order
    pub fn pump(&mut self, elapsed_ms: f64) {
        let mut fired = std::mem::take(&mut self.fired);
        fired.clear();
        self.clock.advance(elapsed_ms, &mut fired);
        for &kind in &fired {
            self.dispatch(kind);
        }
        self.fired = fired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::ScriptedRandom;

    /// 800x600 surface: spawns at y = 500, culls at y = 700
    fn controller(tuning: Tuning) -> SessionController<ManualClock, ScriptedRandom> {
        // x = 0, speed = 0.5 for every spawn
        SessionController::new(
            tuning,
            Surface::new(800.0, 600.0),
            ManualClock::new(),
            ScriptedRandom::new(vec![0.0]),
        )
    }

    fn game_over_count(ctrl: &mut SessionController<ManualClock, ScriptedRandom>) -> usize {
        ctrl.drain_events()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    #[test]
    fn test_start_resets_and_arms() {
        let mut ctrl = controller(Tuning::default());
        assert_eq!(ctrl.phase(), GamePhase::Idle);
        assert!(!ctrl.timers_armed());

        ctrl.start();
        assert_eq!(ctrl.phase(), GamePhase::Playing);
        assert_eq!(ctrl.session().lives, 3);
        assert_eq!(ctrl.session().score, 0);
        assert_eq!(ctrl.session().time_remaining, 30);
        for kind in TimerKind::ALL {
            assert!(ctrl.clock().is_armed(kind));
        }
    }

    #[test]
    fn test_commands_outside_playing_are_noops() {
        let mut ctrl = controller(Tuning::default());
        ctrl.tick_second();
        assert_eq!(ctrl.spawn_target(), None);
        ctrl.advance_frame();
        assert!(!ctrl.hit(1));
        ctrl.end();
        assert_eq!(ctrl.phase(), GamePhase::Idle);
        assert_eq!(ctrl.session().time_remaining, 30);
        assert!(ctrl.session().targets.is_empty());
    }

    #[test]
    fn test_spawn_position_and_speed() {
        let mut ctrl = SessionController::new(
            Tuning::default(),
            Surface::new(800.0, 600.0),
            ManualClock::new(),
            ScriptedRandom::new(vec![0.5, 0.5]),
        );
        ctrl.start();
        let id = ctrl.spawn_target().unwrap();
        let target = ctrl.session().target(id).unwrap();
        assert_eq!(target.pos, Vec2::new(350.0, 500.0));
        assert_eq!(target.speed, 0.75);
        assert!(target.alive);
        assert_eq!(target.target_line, 150.0);
    }

    #[test]
    fn test_target_reaching_arm_costs_a_life() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        ctrl.spawn_target();
        assert_eq!(ctrl.session().targets.len(), 1);

        let mut frames = 0;
        while !ctrl.session().targets.is_empty() {
            ctrl.advance_frame();
            frames += 1;
            assert!(frames <= 1000, "target never reached the arm");
        }

        // (500 - 150) / 0.5
        assert_eq!(frames, 700);
        assert_eq!(ctrl.session().lives, 2);
        assert_eq!(ctrl.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_hit_marks_dead_and_scores_once() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        let id = ctrl.spawn_target().unwrap();

        assert!(ctrl.hit(id));
        assert!(!ctrl.hit(id));
        assert!(!ctrl.hit(id + 100));
        assert_eq!(ctrl.session().score, 10);

        let target = ctrl.session().target(id).unwrap();
        assert!(!target.alive);
    }

    #[test]
    fn test_dead_target_falls_out_of_bounds() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        let id = ctrl.spawn_target().unwrap();
        ctrl.hit(id);

        // 500 -> 700 at 2 per frame
        for _ in 0..99 {
            ctrl.advance_frame();
        }
        let target = ctrl.session().target(id).unwrap();
        assert_eq!(target.pos.y, 698.0);
        assert!(!target.alive);

        ctrl.advance_frame();
        assert!(ctrl.session().target(id).is_none());
        assert_eq!(ctrl.session().lives, 3);
        assert_eq!(ctrl.session().score, 10);
    }

    #[test]
    fn test_countdown_ends_on_thirtieth_tick() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        for _ in 0..29 {
            ctrl.tick_second();
        }
        assert_eq!(ctrl.session().time_remaining, 1);
        assert_eq!(ctrl.phase(), GamePhase::Playing);

        ctrl.tick_second();
        assert_eq!(ctrl.session().time_remaining, 0);
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        assert!(!ctrl.timers_armed());
    }

    #[test]
    fn test_last_life_ends_exactly_once() {
        let tuning = Tuning {
            starting_lives: 1,
            target_line: 499.6,
            ..Default::default()
        };
        let mut ctrl = controller(tuning);
        ctrl.start();
        ctrl.spawn_target();
        ctrl.spawn_target();

        // Both cross in the same frame
        ctrl.advance_frame();
        assert_eq!(ctrl.session().lives, 0);
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        assert!(ctrl.session().targets.is_empty());

        for _ in 0..10 {
            ctrl.advance_frame();
        }
        assert_eq!(ctrl.session().lives, 0);
        assert_eq!(game_over_count(&mut ctrl), 1);
    }

    #[test]
    fn test_several_crossings_in_one_frame_each_cost_a_life() {
        let tuning = Tuning {
            target_line: 499.6,
            ..Default::default()
        };
        let mut ctrl = controller(tuning);
        ctrl.start();
        ctrl.spawn_target();
        ctrl.spawn_target();
        ctrl.advance_frame();
        assert_eq!(ctrl.session().lives, 1);
        assert_eq!(ctrl.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_reset_from_game_over() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        let id = ctrl.spawn_target().unwrap();
        ctrl.hit(id);
        ctrl.end();
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        ctrl.end();
        assert_eq!(game_over_count(&mut ctrl), 1);

        ctrl.reset();
        let session = ctrl.session();
        assert_eq!(session.phase, GamePhase::Idle);
        assert_eq!(session.lives, 3);
        assert_eq!(session.score, 0);
        assert_eq!(session.time_remaining, 30);
        assert!(session.targets.is_empty());
        assert!(!ctrl.timers_armed());
    }

    #[test]
    fn test_pump_runs_full_session_to_time_up() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();

        // Speed 0.5 needs 35s to reach the arm, so time runs out first
        ctrl.pump(29_999.0);
        assert_eq!(ctrl.phase(), GamePhase::Playing);
        assert_eq!(ctrl.session().time_remaining, 1);
        assert_eq!(ctrl.session().targets.len(), 14);

        ctrl.pump(1.0);
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        assert_eq!(ctrl.session().time_remaining, 0);
        // The spawn due at 30s came after the countdown in the same instant
        assert_eq!(ctrl.session().targets.len(), 14);
        assert!(!ctrl.timers_armed());
        assert!(ctrl.drain_events().any(|e| e
            == GameEvent::GameOver {
                score: 0,
                reason: GameOverReason::TimeUp
            }));
    }

    #[test]
    fn test_stale_firings_after_game_over_are_ignored() {
        let tuning = Tuning {
            starting_lives: 1,
            target_line: 499.6,
            ..Default::default()
        };
        let mut ctrl = controller(tuning);
        ctrl.start();

        // Spawn at 2000 crosses on the frame at 2000; frames at 2050 and
        // 2100 are already in the batch when the session ends
        ctrl.pump(2_100.0);
        assert_eq!(ctrl.phase(), GamePhase::GameOver);
        assert_eq!(ctrl.session().time_remaining, 28);

        ctrl.pump(10_000.0);
        assert_eq!(ctrl.session().time_remaining, 28);
        assert_eq!(game_over_count(&mut ctrl), 1);
    }

    #[test]
    fn test_restart_does_not_leak_timers() {
        let mut ctrl = controller(Tuning::default());
        ctrl.start();
        ctrl.pump(1_500.0);
        ctrl.start();
        assert_eq!(ctrl.session().time_remaining, 30);

        // Old countdown would have fired at 2000; the new one fires at 2500
        ctrl.pump(600.0);
        assert_eq!(ctrl.session().time_remaining, 30);
        ctrl.pump(400.0);
        assert_eq!(ctrl.session().time_remaining, 29);
    }

    #[test]
    fn test_ids_unique_across_sessions() {
        let mut ctrl = controller(Tuning::default());
        let mut seen = std::collections::HashSet::new();
        for _ in 0..3 {
            ctrl.start();
            for _ in 0..50 {
                let id = ctrl.spawn_target().unwrap();
                assert!(seen.insert(id));
            }
            ctrl.reset();
        }
    }
}

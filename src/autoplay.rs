//! Headless demo player
//!
//! Plays a whole session against a `ManualClock`: every mosquito gets
//! noticed, and after a reaction delay it is swatted unless the player
//! "misses" it. Used by the native binary and as an end-to-end test.

use std::collections::HashMap;

use rand_pcg::Pcg32;

use crate::sim::rng::{self, RandomSource};
use crate::sim::{Clock, GameEvent, GameOverReason, GamePhase, ManualClock, SessionController};
use crate::surface::{RenderSurface, Snapshot, TextSurface};
use crate::tuning::Tuning;

/// Simulated player reflexes
#[derive(Debug)]
pub struct AutoPlayer<R: RandomSource> {
    rng: R,
    reaction_ms: f64,
    miss_chance: f32,
    /// Mosquito ID -> when it will be swatted (None = missed)
    noticed: HashMap<u32, Option<f64>>,
}

impl<R: RandomSource> AutoPlayer<R> {
    pub fn new(rng: R, reaction_ms: f64, miss_chance: f32) -> Self {
        Self {
            rng,
            reaction_ms,
            miss_chance,
            noticed: HashMap::new(),
        }
    }

    /// Look at the session and swat whatever is due. Returns swats landed.
    pub fn act<C: Clock, S: RandomSource>(
        &mut self,
        ctrl: &mut SessionController<C, S>,
        now_ms: f64,
    ) -> u32 {
        let session = ctrl.session();
        self.noticed.retain(|id, _| session.target(*id).is_some());

        let mut due = Vec::new();
        for target in session.targets.iter().filter(|t| t.alive) {
            let plan = *self.noticed.entry(target.id).or_insert_with(|| {
                if self.rng.next_unit() < self.miss_chance {
                    None
                } else {
                    Some(now_ms + self.reaction_ms)
                }
            });
            if plan.is_some_and(|at| at <= now_ms) {
                due.push(target.id);
            }
        }

        due.into_iter().filter(|&id| ctrl.hit(id)).count() as u32
    }
}

/// Outcome of a demo session
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub score: u64,
    pub lives: u8,
    pub reason: Option<GameOverReason>,
    pub elapsed_ms: f64,
    pub spawned: u32,
    pub swats: u32,
    /// Final HUD line
    pub hud: String,
}

/// Play area of the headless demo
pub const DEMO_WIDTH: f32 = 800.0;
pub const DEMO_HEIGHT: f32 = 600.0;

/// Controller for a headless session with the tuning's sprite box
pub fn demo_controller(seed: u64, tuning: Tuning) -> SessionController<ManualClock, Pcg32> {
    let surface = tuning.surface(DEMO_WIDTH, DEMO_HEIGHT);
    SessionController::seeded(seed, tuning, surface)
}

/// Play one session to the end with the given seed
pub fn run_demo(seed: u64, tuning: Tuning, reaction_ms: f64, miss_chance: f32) -> DemoReport {
    let mut ctrl = demo_controller(seed, tuning);
    let mut player = AutoPlayer::new(rng::seeded(seed ^ 0x5eed), reaction_ms, miss_chance);
    let mut hud = TextSurface::new();

    let step_ms = f64::from(ctrl.tuning().frame_interval_ms);
    // Countdown plus slack; the session cannot outlive its timer
    let limit_ms = f64::from(ctrl.tuning().session_seconds)
        * f64::from(ctrl.tuning().countdown_interval_ms)
        + step_ms * 2.0;

    let mut report = DemoReport {
        score: 0,
        lives: 0,
        reason: None,
        elapsed_ms: 0.0,
        spawned: 0,
        swats: 0,
        hud: String::new(),
    };

    ctrl.start();
    while ctrl.phase() == GamePhase::Playing && ctrl.clock().now_ms() < limit_ms {
        ctrl.pump(step_ms);
        let now_ms = ctrl.clock().now_ms();
        report.swats += player.act(&mut ctrl, now_ms);

        for event in ctrl.drain_events() {
            match event {
                GameEvent::TargetSpawned { .. } => report.spawned += 1,
                GameEvent::TargetReachedArm { id, lives } => {
                    log::info!("{:>6.0}ms mosquito {} bit the arm, {} lives", now_ms, id, lives);
                }
                GameEvent::GameOver { reason, .. } => report.reason = Some(reason),
                _ => {}
            }
        }
        hud.present(&Snapshot::new(ctrl.session(), ctrl.surface()));
    }

    if ctrl.phase() == GamePhase::Playing {
        log::warn!("Demo hit the time limit while still playing");
        ctrl.end();
    }
    debug_assert!(!ctrl.timers_armed());

    report.elapsed_ms = ctrl.clock().now_ms();
    report.score = ctrl.session().score;
    report.lives = ctrl.session().lives;
    report.hud = hud.line;
    report
}

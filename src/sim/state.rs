//! Session state and core simulation types
//!
//! Everything the render surface needs to draw a frame lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to press start
    #[default]
    Idle,
    /// Timers armed, mosquitos rising
    Playing,
    /// Session finished, final score on screen
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Playing => "playing",
            GamePhase::GameOver => "gameOver",
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Countdown reached zero
    TimeUp,
    /// Last life lost to a mosquito reaching the arm
    OutOfLives,
    /// Player pressed the end button
    Ended,
}

/// Things that happened since the frontend last looked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    TimeTick { remaining: u32 },
    TargetSpawned { id: u32 },
    TargetSwatted { id: u32, score: u64 },
    TargetReachedArm { id: u32, lives: u8 },
    GameOver { score: u64, reason: GameOverReason },
    Reset,
}

/// The play area, in surface (CSS pixel) coordinates, y pointing down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    pub sprite_width: f32,
    pub sprite_height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            sprite_width: SPRITE_WIDTH,
            sprite_height: SPRITE_HEIGHT,
        }
    }

    /// Largest spawn x that keeps the sprite on screen (never negative)
    pub fn max_spawn_x(&self) -> f32 {
        (self.width - self.sprite_width).max(0.0)
    }

    /// Mosquitos hatch at the bottom edge
    pub fn spawn_y(&self) -> f32 {
        self.height - self.sprite_height
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A mosquito
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub pos: Vec2,
    pub alive: bool,
    /// Rise per frame while alive
    pub speed: f32,
    /// The arm; reaching it costs a life
    pub target_line: f32,
}

impl Target {
    pub fn new(id: u32, pos: Vec2, speed: f32, target_line: f32) -> Self {
        Self {
            id,
            pos,
            alive: true,
            speed,
            target_line,
        }
    }

    /// Mark as swatted. Returns false if it was already dead.
    pub fn swat(&mut self) -> bool {
        let was_alive = self.alive;
        self.alive = false;
        was_alive
    }
}

/// The single session aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub phase: GamePhase,
    pub lives: u8,
    pub score: u64,
    /// Whole seconds left on the countdown
    pub time_remaining: u32,
    /// Live and falling mosquitos in spawn order
    pub targets: Vec<Target>,
    /// Next target ID
    next_id: u32,
}

impl Session {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Idle,
            lives: tuning.starting_lives,
            score: 0,
            time_remaining: tuning.session_seconds,
            targets: Vec::new(),
            next_id: 1,
        }
    }

    /// Put lives, score, clock and population back to their starting values.
    /// Leaves `phase` and the ID counter alone.
    pub fn restore(&mut self, tuning: &Tuning) {
        self.lives = tuning.starting_lives;
        self.score = 0;
        self.time_remaining = tuning.session_seconds;
        self.targets.clear();
    }

    /// Allocate a new target ID
    pub fn next_target_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn target(&self, id: u32) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn target_mut(&mut self, id: u32) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.targets.iter().filter(|t| t.alive).count()
    }

    /// Debug-build assertion of the session invariants
    pub fn check_invariants(&self) {
        debug_assert!(self.lives <= MAX_LIVES, "lives out of range: {}", self.lives);
        debug_assert!(
            self.lives > 0 || self.phase != GamePhase::Playing,
            "playing with zero lives"
        );
        debug_assert!(
            self.time_remaining > 0 || self.phase != GamePhase::Playing,
            "playing with zero time"
        );
        debug_assert!(
            self.targets
                .iter()
                .enumerate()
                .all(|(i, a)| self.targets[i + 1..].iter().all(|b| b.id != a.id)),
            "duplicate target id"
        );
    }
}

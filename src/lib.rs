//! Mosquito Swat - a 30 second swatting mini-game
//!
//! Core modules:
//! - `sim`: Session state machine (controller, clock, targets, RNG)
//! - `surface`: Render surface abstraction (DOM implementation on web)
//! - `tuning`: Data-driven game balance
//! - `autoplay`: Headless demo player

pub mod autoplay;
pub mod sim;
pub mod surface;
pub mod tuning;

pub use sim::{GamePhase, Session, SessionController, Target};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Session length in seconds
    pub const SESSION_SECONDS: u32 = 30;
    /// Lives at the start of a session
    pub const STARTING_LIVES: u8 = 3;
    /// Upper bound for lives (HUD shows this many hearts)
    pub const MAX_LIVES: u8 = 3;

    /// Timer periods (milliseconds)
    pub const COUNTDOWN_INTERVAL_MS: u32 = 1000;
    pub const SPAWN_INTERVAL_MS: u32 = 2000;
    pub const FRAME_INTERVAL_MS: u32 = 50;

    /// Points for swatting a live mosquito
    pub const HIT_SCORE: u64 = 10;

    /// The arm: a live mosquito at or above this y costs a life
    pub const TARGET_LINE: f32 = 150.0;
    /// Downward step per frame for a swatted mosquito
    pub const FALL_STEP: f32 = 2.0;
    /// Swatted mosquitos are culled once this far below the surface
    pub const CULL_MARGIN: f32 = 100.0;

    /// Rise speed range per frame, [min, max)
    pub const SPEED_MIN: f32 = 0.5;
    pub const SPEED_MAX: f32 = 1.0;

    /// Sprite box (the spawn offset from the right and bottom edges)
    pub const SPRITE_WIDTH: f32 = 100.0;
    pub const SPRITE_HEIGHT: f32 = 100.0;

    /// Longest frame delta the browser clock will accept (ms)
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;
}

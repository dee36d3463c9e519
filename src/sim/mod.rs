//! Session simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time only arrives through a `Clock`
//! - Randomness only arrives through a `RandomSource`
//! - Stable iteration order (spawn order)

pub mod clock;
pub mod controller;
pub mod rng;
pub mod state;

pub use clock::{Clock, FrameClock, ManualClock, TimerHandle, TimerKind};
pub use controller::SessionController;
pub use rng::{RandomSource, ScriptedRandom};
pub use state::{GameEvent, GameOverReason, GamePhase, Session, Surface, Target};

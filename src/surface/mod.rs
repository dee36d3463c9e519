//! Render surface abstraction
//!
//! A surface gets a read-only snapshot after every batch of mutations and
//! forwards pointer-enter events back to the controller as hits.

#[cfg(target_arch = "wasm32")]
pub mod dom;

use std::fmt::Write as _;

use serde::Serialize;

use crate::consts::MAX_LIVES;
use crate::sim::{GamePhase, Session, Surface, Target};

/// What a surface may look at
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Snapshot<'a> {
    pub session: &'a Session,
    pub surface: &'a Surface,
}

impl<'a> Snapshot<'a> {
    pub fn new(session: &'a Session, surface: &'a Surface) -> Self {
        Self { session, surface }
    }

    /// One flag per heart slot, filled while the life remains
    pub fn hearts(&self) -> impl Iterator<Item = bool> + 'a {
        let lives = self.session.lives;
        (0..MAX_LIVES).map(move |i| i < lives)
    }

    pub fn targets(&self) -> impl Iterator<Item = (&'a Target, Sprite)> + 'a {
        let session = self.session;
        session.targets.iter().map(|t| (t, Sprite::of(t)))
    }
}

/// Which picture a mosquito gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Flying,
    Swatted,
}

impl Sprite {
    pub fn of(target: &Target) -> Self {
        if target.alive {
            Sprite::Flying
        } else {
            Sprite::Swatted
        }
    }

    /// CSS class list for the target element
    pub fn class_name(&self) -> &'static str {
        match self {
            Sprite::Flying => "mosquito",
            Sprite::Swatted => "mosquito dead",
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            Sprite::Flying => "bug_ka.png",
            Sprite::Swatted => "ka_dead.png",
        }
    }
}

/// Anything that can draw a session
pub trait RenderSurface {
    fn present(&mut self, snapshot: &Snapshot<'_>);
}

/// Plain text HUD for terminals and logs
#[derive(Debug, Default)]
pub struct TextSurface {
    pub line: String,
    pub frames: u64,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for TextSurface {
    fn present(&mut self, snapshot: &Snapshot<'_>) {
        let session = snapshot.session;
        self.frames += 1;
        self.line.clear();

        let hearts: String = snapshot
            .hearts()
            .map(|on| if on { '♥' } else { '·' })
            .collect();
        let _ = write!(
            self.line,
            "[{}] lives {} score {} time {}s mosquitos {}/{}",
            session.phase.as_str(),
            hearts,
            session.score,
            session.time_remaining,
            session.alive_count(),
            session.targets.len()
        );
        if session.phase == GamePhase::GameOver {
            let _ = write!(self.line, " - final score {}", session.score);
        }
    }
}

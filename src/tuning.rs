//! Data-driven game balance
//!
//! Defaults are the shipped constants. On web a JSON override can be
//! dropped into LocalStorage for playtesting.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Surface;

/// Gameplay numbers the controller reads instead of hardcoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session ===
    /// Countdown length in seconds
    pub session_seconds: u32,
    /// Lives at start (1 - MAX_LIVES)
    pub starting_lives: u8,
    /// Points per swat
    pub hit_score: u64,

    // === Timers ===
    pub countdown_interval_ms: u32,
    pub spawn_interval_ms: u32,
    pub frame_interval_ms: u32,

    // === Movement ===
    /// y of the arm
    pub target_line: f32,
    /// Fall per frame once swatted
    pub fall_step: f32,
    /// How far below the surface a swatted mosquito travels before removal
    pub cull_margin: f32,
    pub speed_min: f32,
    pub speed_max: f32,

    // === Sprites ===
    pub sprite_width: f32,
    pub sprite_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            session_seconds: SESSION_SECONDS,
            starting_lives: STARTING_LIVES,
            hit_score: HIT_SCORE,

            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            frame_interval_ms: FRAME_INTERVAL_MS,

            target_line: TARGET_LINE,
            fall_step: FALL_STEP,
            cull_margin: CULL_MARGIN,
            speed_min: SPEED_MIN,
            speed_max: SPEED_MAX,

            sprite_width: SPRITE_WIDTH,
            sprite_height: SPRITE_HEIGHT,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(|t| t.sanitized())
    }

    /// Clamp values that would break session invariants
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.session_seconds = self.session_seconds.max(1);
        self.starting_lives = self.starting_lives.clamp(1, MAX_LIVES);
        if self.hit_score == 0 {
            self.hit_score = defaults.hit_score;
        }

        self.countdown_interval_ms = self.countdown_interval_ms.max(1);
        self.spawn_interval_ms = self.spawn_interval_ms.max(1);
        self.frame_interval_ms = self.frame_interval_ms.max(1);

        if !(self.fall_step.is_finite() && self.fall_step > 0.0) {
            self.fall_step = defaults.fall_step;
        }
        if !(self.cull_margin.is_finite() && self.cull_margin >= 0.0) {
            self.cull_margin = defaults.cull_margin;
        }
        if !self.target_line.is_finite() {
            self.target_line = defaults.target_line;
        }
        let speeds_ok = self.speed_min.is_finite()
            && self.speed_max.is_finite()
            && self.speed_min > 0.0
            && self.speed_max > self.speed_min;
        if !speeds_ok {
            self.speed_min = defaults.speed_min;
            self.speed_max = defaults.speed_max;
        }
        if !(self.sprite_width.is_finite() && self.sprite_width >= 0.0) {
            self.sprite_width = defaults.sprite_width;
        }
        if !(self.sprite_height.is_finite() && self.sprite_height >= 0.0) {
            self.sprite_height = defaults.sprite_height;
        }
        self
    }

    /// Play area of the given size with this tuning's sprite box
    pub fn surface(&self, width: f32, height: f32) -> Surface {
        Surface {
            width,
            height,
            sprite_width: self.sprite_width,
            sprite_height: self.sprite_height,
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "mosquito_swat_tuning";

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring bad tuning override: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "session_seconds": 60 }"#).unwrap();
        assert_eq!(tuning.session_seconds, 60);
        assert_eq!(tuning.starting_lives, STARTING_LIVES);
        assert_eq!(tuning.spawn_interval_ms, SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_sanitize_clamps_bad_values() {
        let json = r#"{
            "starting_lives": 9,
            "frame_interval_ms": 0,
            "speed_min": 2.0,
            "speed_max": 1.0
        }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.starting_lives, MAX_LIVES);
        assert_eq!(tuning.frame_interval_ms, 1);
        assert_eq!(tuning.speed_min, SPEED_MIN);
        assert_eq!(tuning.speed_max, SPEED_MAX);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(Tuning::from_json("not json").is_err());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_load_is_default() {
        assert_eq!(Tuning::load(), Tuning::default());
    }

    #[test]
    fn test_surface_uses_tuned_sprite() {
        let tuning = Tuning {
            sprite_width: 40.0,
            sprite_height: 60.0,
            ..Default::default()
        };
        let surface = tuning.surface(800.0, 600.0);
        assert_eq!(surface.max_spawn_x(), 760.0);
        assert_eq!(surface.spawn_y(), 540.0);
    }
}

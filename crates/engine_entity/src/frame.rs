//! Per-frame time snapshot handed to every lifecycle call.

use serde::{Deserialize, Serialize};

/// Coarse state of the application that owns the entity tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameState {
    /// Assets are still loading.
    Preloading,
    /// Loaded, waiting for the player to start.
    Ready,
    /// Running normally.
    #[default]
    Playing,
    /// Time is frozen; entities are still updated with a zero delta.
    Paused,
    /// The root entity has completed.
    Done,
}

/// Immutable-per-call frame context.
///
/// All times are in milliseconds. `time_since_last_frame` is already scaled
/// by `time_scale`, so entities that accumulate time should read it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    /// Scaled time spent in the [`GameState::Playing`] state.
    pub play_time: f64,
    /// Wall time since the driver started.
    pub time_since_start: f64,
    /// Scaled delta since the previous frame.
    pub time_since_last_frame: f64,
    /// Multiplier applied to wall-clock deltas.
    pub time_scale: f64,
    /// State of the owning application.
    pub game_state: GameState,
}

impl FrameInfo {
    /// A frame at time zero, used for the initial `setup` call.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            play_time: 0.0,
            time_since_start: 0.0,
            time_since_last_frame: 0.0,
            time_scale: 1.0,
            game_state: GameState::Playing,
        }
    }

    /// Builds the frame that follows `self` after `wall_dt` milliseconds.
    ///
    /// While paused, play time does not advance and the delta is zero.
    #[must_use]
    pub fn advance(&self, wall_dt: f64, game_state: GameState) -> Self {
        let scaled = if game_state == GameState::Paused {
            0.0
        } else {
            wall_dt * self.time_scale
        };
        Self {
            play_time: self.play_time + scaled,
            time_since_start: self.time_since_start + wall_dt,
            time_since_last_frame: scaled,
            time_scale: self.time_scale,
            game_state,
        }
    }

    /// Returns a copy with a different time scale.
    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self::initial()
    }
}

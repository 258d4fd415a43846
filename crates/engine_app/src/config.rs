//! Frame driver configuration.

use clap::Parser;

/// Configuration for the frame driver loop.
#[derive(Debug, Clone, Parser)]
#[command(name = "engine_app", about = "Drives a demo entity tree frame by frame")]
pub struct DriverConfig {
    /// Target frames per second.
    #[arg(long, default_value_t = 60.0, value_parser = positive_finite)]
    pub tick_rate: f64,

    /// Maximum number of frames to run (0 = until the root completes).
    #[arg(long, default_value_t = 0)]
    pub max_ticks: u64,

    /// Multiplier applied to wall-clock deltas.
    #[arg(long, default_value_t = 1.0, value_parser = non_negative_finite)]
    pub time_scale: f64,
}

fn positive_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a positive finite number, got {s}"))
    }
}

fn non_negative_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a finite number >= 0, got {s}"))
    }
}

impl DriverConfig {
    /// Milliseconds of wall time per frame.
    #[must_use]
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.tick_rate
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            time_scale: 1.0,
        }
    }
}

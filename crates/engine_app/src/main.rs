//! # engine_app: frame driver
//!
//! Drives an entity tree from the root, one fixed-timestep frame at a time.
//!
//! ## Startup Sequence
//!
//! 1. Parse driver flags (`--tick-rate`, `--max-ticks`, `--time-scale`).
//! 2. Build the demo scene and the root config bag.
//! 3. Run the frame loop until the root completes or the tick limit is hit.

mod config;
mod scene;
mod tick;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::DriverConfig;
use engine_entity::{EntityConfig, EventBus, SurfaceHandle};
use tick::FrameDriver;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("engine_app=info".parse()?)
                .add_directive("engine_entity=info".parse()?),
        )
        .init();

    let config = DriverConfig::parse();
    info!(?config, "frame driver starting");

    let events = EventBus::new();
    let root = scene::build(&events, scene::DEFAULT_TIME_LIMIT);
    let root_config = EntityConfig::new(SurfaceHandle::new()).with("level", "meadow");

    let mut driver = FrameDriver::new(root, config);
    match driver.run(&root_config)? {
        Some(outcome) => info!(%outcome, ticks = driver.tick_id(), "scene finished"),
        None => info!(ticks = driver.tick_id(), "scene stopped before completion"),
    }

    info!("frame driver shut down");
    Ok(())
}

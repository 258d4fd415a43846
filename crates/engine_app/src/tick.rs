//! Frame driver.
//!
//! Owns the root of an entity tree and drives its lifecycle:
//!
//! 1. `setup` the root once with the initial frame and the root config bag.
//! 2. `update` it once per tick with a frame advanced by the wall delta.
//! 3. When the root requests a transition, `teardown` it exactly once and
//!    report the transition as the outcome.
//!
//! Signals may be broadcast into the tree at any point between setup and
//! teardown.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use engine_entity::{BoxedEntity, EntityConfig, EntityResult, FrameInfo, GameState, Lifecycle, Transition};

use crate::config::DriverConfig;

/// Drives a root entity frame by frame.
#[derive(Debug)]
pub struct FrameDriver {
    /// Current tick counter.
    tick_id: u64,
    /// Driver configuration.
    config: DriverConfig,
    /// Root of the entity tree.
    root: BoxedEntity,
    /// The frame most recently handed to the root.
    frame: FrameInfo,
    /// Playing or paused; `Done` once the root has completed.
    game_state: GameState,
    /// The root's final transition.
    outcome: Option<Transition>,
}

impl FrameDriver {
    /// Create a driver for `root`. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(root: BoxedEntity, config: DriverConfig) -> Self {
        let frame = FrameInfo::initial().with_time_scale(config.time_scale);
        Self {
            tick_id: 0,
            config,
            root,
            frame,
            game_state: GameState::Ready,
            outcome: None,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns the most recent frame.
    #[must_use]
    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    #[must_use]
    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    /// Returns the root entity.
    #[must_use]
    pub fn root(&self) -> &(dyn Lifecycle + 'static) {
        self.root.as_ref()
    }

    /// Returns the root entity mutably, e.g. to downcast and drive it.
    pub fn root_mut(&mut self) -> &mut (dyn Lifecycle + 'static) {
        self.root.as_mut()
    }

    /// The root's final transition, once it has completed.
    #[must_use]
    pub fn outcome(&self) -> Option<&Transition> {
        self.outcome.as_ref()
    }

    /// Set up the root entity.
    ///
    /// # Errors
    ///
    /// Propagates the root's setup error, including a contract violation if
    /// the driver was already started.
    pub fn start(&mut self, config: &EntityConfig) -> EntityResult {
        info!(
            root = %self.root.id(),
            kind = self.root.kind(),
            surface = %config.surface(),
            "starting entity tree"
        );
        self.game_state = GameState::Playing;
        self.frame = FrameInfo::initial().with_time_scale(self.config.time_scale);
        self.root.setup(&self.frame, config)?;
        self.finish_if_done()
    }

    /// Advance the tree by `dt` milliseconds of wall time.
    ///
    /// Returns the root's transition once it has completed. Ticks after
    /// completion do nothing and keep returning the same outcome.
    ///
    /// # Errors
    ///
    /// Propagates any error raised inside the tree.
    pub fn tick(&mut self, dt: f64) -> EntityResult<Option<Transition>> {
        if self.outcome.is_some() {
            return Ok(self.outcome.clone());
        }
        self.tick_id += 1;
        self.frame = self.frame.advance(dt, self.game_state);

        debug!(
            tick_id = self.tick_id,
            dt,
            play_time = self.frame.play_time,
            "tick start"
        );

        self.root.update(&self.frame)?;
        self.finish_if_done()?;
        Ok(self.outcome.clone())
    }

    /// Broadcast a signal to every active entity in the tree.
    ///
    /// # Errors
    ///
    /// Contract violation if the root is not set up, or an error raised by
    /// a signal handler.
    pub fn signal(&mut self, name: &str, data: &Value) -> EntityResult {
        debug!(tick_id = self.tick_id, signal = name, "broadcasting signal");
        self.root.on_signal(&self.frame, name, data)
    }

    /// Freeze play time. Entities still receive updates with a zero delta.
    pub fn pause(&mut self) {
        if self.game_state == GameState::Playing {
            info!(tick_id = self.tick_id, "paused");
            self.game_state = GameState::Paused;
        }
    }

    /// Resume after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        if self.game_state == GameState::Paused {
            info!(tick_id = self.tick_id, "resumed");
            self.game_state = GameState::Playing;
        }
    }

    /// Tear the root down early if it is still running.
    ///
    /// # Errors
    ///
    /// Propagates the root's teardown error.
    pub fn stop(&mut self) -> EntityResult {
        if self.root.is_set_up() {
            info!(tick_id = self.tick_id, "stopping entity tree");
            self.root.teardown(&self.frame)?;
        }
        Ok(())
    }

    fn finish_if_done(&mut self) -> EntityResult {
        let Some(transition) = self.root.requested_transition().cloned() else {
            return Ok(());
        };
        self.root.teardown(&self.frame)?;
        self.game_state = GameState::Done;
        info!(
            tick_id = self.tick_id,
            %transition,
            play_time = self.frame.play_time,
            "entity tree completed"
        );
        self.outcome = Some(transition);
        Ok(())
    }

    /// Run the tree until the root completes, or for the configured number
    /// of ticks.
    ///
    /// This is a blocking fixed-timestep loop. The root is torn down exactly
    /// once on either exit path.
    ///
    /// # Errors
    ///
    /// Propagates any error raised inside the tree.
    pub fn run(&mut self, config: &EntityConfig) -> EntityResult<Option<Transition>> {
        // A config built in code can bypass the CLI checks; skip pacing then.
        let tick_duration = Duration::try_from_secs_f64(1.0 / self.config.tick_rate).unwrap_or(Duration::ZERO);
        let dt = self.config.frame_ms();

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            time_scale = self.config.time_scale,
            "starting frame loop"
        );

        self.start(config)?;
        let mut tick_count = 0u64;

        while self.outcome.is_none() {
            let start = Instant::now();

            self.tick(dt)?;

            tick_count += 1;
            if self.outcome.is_none() && self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick limit reached");
                self.stop()?;
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        Ok(self.outcome.clone())
    }
}

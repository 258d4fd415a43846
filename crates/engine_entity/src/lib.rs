//! # engine_entity
//!
//! Hierarchical entity lifecycle and composition.
//!
//! A game is a tree of entities driven frame by frame from the root. Every
//! entity follows the same contract: `setup`, then any number of `update`
//! and `on_signal` calls, then `teardown`. An entity signals that it is done
//! by requesting a [`Transition`], which its parent inspects after each
//! update.
//!
//! This crate provides:
//!
//! - [`Entity`], [`Behavior`] and [`Lifecycle`]: the entity contract, with
//!   automatic release of event listeners at teardown.
//! - Composites: [`ParallelEntity`], [`DeflatingCompositeEntity`],
//!   [`SwitchingEntity`], [`Alternative`] and [`EntitySequence`].
//! - [`StateMachine`] with a declarative [`TransitionTable`].
//! - Leaf adapters: [`Block`], [`Decision`], [`WaitForEvent`],
//!   [`FunctionCall`], [`Wait`] and the closure-based [`FunctionalEntity`].
//! - [`FrameInfo`] and [`EntityConfig`], the per-frame and per-subtree inputs.

pub mod alternative;
pub mod config;
pub mod deflating;
pub mod entity;
pub mod error;
pub mod events;
pub mod frame;
pub mod functional;
pub mod leaves;
pub mod listener;
pub mod parallel;
pub mod sequence;
pub mod state_machine;
pub mod switching;
pub mod transition;

#[cfg(test)]
mod testing;

pub use alternative::{Alternative, AlternativeOption};
pub use config::{ChildConfig, ConfigFn, EntityConfig, SurfaceHandle};
pub use deflating::DeflatingCompositeEntity;
pub use entity::{Behavior, BoxedEntity, Entity, EntityCore, EntityId, Lifecycle};
pub use error::{EntityError, EntityResult, Violation};
pub use events::{EventBus, EventCallback, EventSource};
pub use frame::{FrameInfo, GameState};
pub use functional::FunctionalEntity;
pub use leaves::{Block, Decision, FunctionCall, Wait, WaitForEvent};
pub use listener::{ListenerRecord, ListenerRegistry};
pub use parallel::{ChildRecord, ParallelEntity};
pub use sequence::{EntitySequence, SequenceStep};
pub use state_machine::{NextState, StateEntry, StateMachine, TransitionRule, TransitionTable};
pub use switching::SwitchingEntity;
pub use transition::Transition;

//! Entity-layer error types.

use std::fmt;

use crate::entity::EntityId;

/// The lifecycle rule an entity call broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `setup` was called while the entity was already set up.
    AlreadySetUp,
    /// `update` was called before `setup`.
    UpdateBeforeSetup,
    /// `teardown` was called before `setup`.
    TeardownBeforeSetup,
    /// `on_signal` was called before `setup`.
    SignalBeforeSetup,
    /// A composite operation that needs the parent's frame/config was
    /// invoked while the parent is not set up.
    ParentNotSetUp,
    /// A state change was requested after the machine reached an ending
    /// state.
    AlreadyCompleted,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadySetUp => "setup called while already set up",
            Self::UpdateBeforeSetup => "update called before setup",
            Self::TeardownBeforeSetup => "teardown called before setup",
            Self::SignalBeforeSetup => "signal delivered before setup",
            Self::ParentNotSetUp => "composite operation requires the entity to be set up",
            Self::AlreadyCompleted => "state change requested after the machine completed",
        };
        f.write_str(text)
    }
}

/// Errors raised by entity lifecycle calls and composite operations.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A lifecycle call was made in the wrong phase.
    #[error("{kind} {entity}: contract violation: {violation}")]
    ContractViolation {
        entity: EntityId,
        kind: &'static str,
        violation: Violation,
    },

    /// A transition resolved to a state name the machine does not know.
    #[error("unknown state '{state}' in state machine {machine}")]
    UnknownState { machine: EntityId, state: String },

    /// The current state has no transition table entry and the transition
    /// name is not itself a state.
    #[error("no transition defined for state '{state}' (requested '{transition}')")]
    NoTransitionForState { state: String, transition: String },

    /// A flat transition map had no entry for the requested transition.
    #[error("state '{state}' has no rule for transition '{transition}'")]
    NoTransition { state: String, transition: String },

    /// A state or transition descriptor could not be decoded.
    #[error("cannot decode descriptor for state '{state}': {reason}")]
    InvalidDescriptor { state: String, reason: String },

    /// A composite was asked to operate on a child it does not hold.
    #[error("{parent} does not contain {entity}")]
    EntityNotFound { parent: EntityId, entity: EntityId },

    /// A composite was asked to switch to an index outside its child list.
    #[error("{parent}: index {index} out of range for {len} children")]
    IndexOutOfRange {
        parent: EntityId,
        index: usize,
        len: usize,
    },

    /// A typed read of a configuration extension failed.
    #[error("config field '{key}' has unexpected shape: {source}")]
    Config {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An error raised by user code running inside an entity callback.
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

/// Convenience alias for entity operations.
pub type EntityResult<T = ()> = Result<T, EntityError>;

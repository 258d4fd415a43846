//! Sequential composite: children run one after another.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::config::EntityConfig;
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, Lifecycle, step};
use crate::error::EntityResult;
use crate::frame::FrameInfo;
use crate::transition::{SKIP, Transition};

/// Signal that restarts a sequence from its first step.
pub const RESET_SIGNAL: &str = "reset";

/// Builds a step lazily from the sequence's current state.
pub type SequenceFactory = Rc<dyn Fn(&EntitySequence) -> BoxedEntity>;

/// One step of an [`EntitySequence`].
pub enum SequenceStep {
    /// A concrete entity, set up again each time the step is reached.
    Entity(BoxedEntity),
    /// A factory invoked each time the step is reached.
    Factory(SequenceFactory),
}

impl SequenceStep {
    /// Shorthand for [`SequenceStep::Factory`].
    pub fn factory(f: impl Fn(&EntitySequence) -> BoxedEntity + 'static) -> Self {
        Self::Factory(Rc::new(f))
    }
}

impl From<BoxedEntity> for SequenceStep {
    fn from(entity: BoxedEntity) -> Self {
        Self::Entity(entity)
    }
}

impl fmt::Debug for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(entity) => f.debug_tuple("Entity").field(entity).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Activates its steps one at a time, advancing whenever the current step
/// completes. Exactly one step is set up at any time while running.
#[derive(Debug)]
pub struct EntitySequence {
    steps: Vec<SequenceStep>,
    index: usize,
    looping: bool,
    spawned: Option<BoxedEntity>,
    last_transition: Option<Transition>,
}

impl EntitySequence {
    /// A non-looping sequence over `steps`.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = SequenceStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            index: 0,
            looping: false,
            spawned: None,
            last_transition: None,
        }
    }

    /// A non-looping sequence over concrete entities.
    #[must_use]
    pub fn with_children(entities: impl IntoIterator<Item = BoxedEntity>) -> Self {
        Self::new(entities.into_iter().map(SequenceStep::Entity))
    }

    /// Wrap back to the first step after the last one completes.
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Index of the current step.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The transition that ended the previous step, if any.
    #[must_use]
    pub fn last_transition(&self) -> Option<&Transition> {
        self.last_transition.as_ref()
    }

    /// The entity of the current step, if it has been built.
    #[must_use]
    pub fn current_entity(&self) -> Option<&(dyn Lifecycle + 'static)> {
        match self.steps.get(self.index)? {
            SequenceStep::Entity(entity) => Some(entity.as_ref()),
            SequenceStep::Factory(_) => self.spawned.as_deref(),
        }
    }

    fn current_mut(&mut self) -> Option<&mut (dyn Lifecycle + 'static)> {
        match self.steps.get_mut(self.index)? {
            SequenceStep::Entity(entity) => Some(entity.as_mut()),
            SequenceStep::Factory(_) => self.spawned.as_deref_mut(),
        }
    }

    fn activate(&mut self, core: &EntityCore) -> EntityResult {
        if let Some(SequenceStep::Factory(factory)) = self.steps.get(self.index) {
            let factory = Rc::clone(factory);
            self.spawned = Some(factory(self));
        }
        let config = core.config()?.clone();
        let frame = core.frame().clone();
        let index = self.index;
        if let Some(entity) = self.current_mut() {
            debug!(entity = %core.id(), index, child = %entity.id(), "sequence step activated");
            entity.setup(&frame, &config)?;
        }
        Ok(())
    }

    fn deactivate(&mut self, frame: &FrameInfo) -> EntityResult {
        if let Some(entity) = self.current_mut()
            && entity.is_set_up()
        {
            entity.teardown(frame)?;
        }
        self.spawned = None;
        Ok(())
    }

    fn advance(&mut self, core: &mut EntityCore, transition: Transition) -> EntityResult {
        let frame = core.frame().clone();
        self.deactivate(&frame)?;
        self.last_transition = Some(transition.clone());
        if self.index + 1 < self.steps.len() {
            self.index += 1;
            self.activate(core)
        } else if self.looping {
            self.index = 0;
            self.activate(core)
        } else {
            debug!(entity = %core.id(), %transition, "sequence finished");
            core.request_transition(transition);
            Ok(())
        }
    }

    /// Ends the current step with a synthetic `skip` transition, whatever
    /// the step itself requested. Does nothing once the sequence completed.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up, or a step lifecycle error.
    pub fn skip(&mut self, core: &mut EntityCore) -> EntityResult {
        core.require_set_up()?;
        if core.requested_transition().is_some() {
            return Ok(());
        }
        self.advance(core, Transition::new(SKIP))
    }

    /// Returns to the first step and clears any pending completion.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up, or a step lifecycle error.
    pub fn restart(&mut self, core: &mut EntityCore) -> EntityResult {
        core.require_set_up()?;
        let frame = core.frame().clone();
        self.deactivate(&frame)?;
        self.index = 0;
        self.last_transition = None;
        core.clear_transition();
        if self.steps.is_empty() {
            core.request_transition(Transition::done());
            return Ok(());
        }
        self.activate(core)
    }
}

impl Behavior for EntitySequence {
    fn kind(&self) -> &'static str {
        "EntitySequence"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.index = 0;
        self.last_transition = None;
        if self.steps.is_empty() {
            core.request_transition(Transition::done());
            return Ok(());
        }
        self.activate(core)
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        if core.requested_transition().is_some() {
            return Ok(());
        }
        let Some(entity) = self.current_mut() else {
            return Ok(());
        };
        if let Some(transition) = step(entity, frame)? {
            self.advance(core, transition)?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.deactivate(frame)
    }

    fn on_signal(
        &mut self,
        core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        if let Some(entity) = self.current_mut()
            && entity.is_set_up()
        {
            entity.on_signal(frame, signal, data)?;
        }
        if signal == RESET_SIGNAL {
            self.restart(core)?;
        }
        Ok(())
    }
}

impl Entity<EntitySequence> {
    /// See [`EntitySequence::skip`].
    ///
    /// # Errors
    ///
    /// As [`EntitySequence::skip`].
    pub fn skip(&mut self) -> EntityResult {
        let (sequence, core) = self.parts_mut();
        sequence.skip(core)
    }

    /// See [`EntitySequence::restart`].
    ///
    /// # Errors
    ///
    /// As [`EntitySequence::restart`].
    pub fn restart(&mut self) -> EntityResult {
        let (sequence, core) = self.parts_mut();
        sequence.restart(core)
    }
}

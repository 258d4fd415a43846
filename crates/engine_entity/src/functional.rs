//! Ad hoc entities assembled from closures.

use std::fmt;

use serde_json::Value;

use crate::config::{ChildConfig, EntityConfig};
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, EntityId};
use crate::error::EntityResult;
use crate::frame::FrameInfo;
use crate::parallel::ParallelEntity;
use crate::transition::Transition;

type SetupFn = Box<dyn FnMut(&mut EntityCore, &FrameInfo, &EntityConfig) -> EntityResult>;
type FrameFn = Box<dyn FnMut(&mut EntityCore, &FrameInfo) -> EntityResult>;
type SignalFn = Box<dyn FnMut(&mut EntityCore, &FrameInfo, &str, &Value) -> EntityResult>;
type TransitionFn = Box<dyn FnMut(&FrameInfo) -> Option<Transition>>;

/// An entity whose hooks are optional closures.
///
/// Children attached with [`FunctionalEntity::child`] or
/// [`Entity::<FunctionalEntity>::add_entity`] run in parallel alongside the
/// closures; they never complete the entity on their own. Completion comes
/// from the [`with_transition`](Self::with_transition) closure, evaluated after every update, or
/// from a closure calling [`EntityCore::request_transition`] directly.
#[derive(Default)]
pub struct FunctionalEntity {
    setup: Option<SetupFn>,
    update: Option<FrameFn>,
    teardown: Option<FrameFn>,
    signal: Option<SignalFn>,
    request_transition: Option<TransitionFn>,
    children: ParallelEntity,
}

impl FunctionalEntity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_setup(
        mut self,
        f: impl FnMut(&mut EntityCore, &FrameInfo, &EntityConfig) -> EntityResult + 'static,
    ) -> Self {
        self.setup = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_update(mut self, f: impl FnMut(&mut EntityCore, &FrameInfo) -> EntityResult + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_teardown(mut self, f: impl FnMut(&mut EntityCore, &FrameInfo) -> EntityResult + 'static) -> Self {
        self.teardown = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_signal(
        mut self,
        f: impl FnMut(&mut EntityCore, &FrameInfo, &str, &Value) -> EntityResult + 'static,
    ) -> Self {
        self.signal = Some(Box::new(f));
        self
    }

    /// Polled after each update; `Some` completes the entity.
    #[must_use]
    pub fn with_transition(mut self, f: impl FnMut(&FrameInfo) -> Option<Transition> + 'static) -> Self {
        self.request_transition = Some(Box::new(f));
        self
    }

    /// Attaches a child before setup.
    #[must_use]
    pub fn child(mut self, entity: BoxedEntity, config: ChildConfig) -> Self {
        self.children = self.children.child(entity, config);
        self
    }

    /// The attached children.
    #[must_use]
    pub fn children(&self) -> &ParallelEntity {
        &self.children
    }
}

impl fmt::Debug for FunctionalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalEntity")
            .field("setup", &self.setup.is_some())
            .field("update", &self.update.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("signal", &self.signal.is_some())
            .field("request_transition", &self.request_transition.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl Behavior for FunctionalEntity {
    fn kind(&self) -> &'static str {
        "FunctionalEntity"
    }

    fn on_setup(&mut self, core: &mut EntityCore, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        self.children.setup_children(frame, config)?;
        if let Some(f) = &mut self.setup {
            f(core, frame, config)?;
        }
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.children.update_children(core, frame)?;
        if let Some(f) = &mut self.update {
            f(core, frame)?;
        }
        if core.requested_transition().is_none()
            && let Some(f) = &mut self.request_transition
            && let Some(transition) = f(frame)
        {
            core.request_transition(transition);
        }
        Ok(())
    }

    fn on_teardown(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        if let Some(f) = &mut self.teardown {
            f(core, frame)?;
        }
        self.children.teardown_children(frame)
    }

    fn on_signal(
        &mut self,
        core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        self.children.signal_children(frame, signal, data)?;
        if let Some(f) = &mut self.signal {
            f(core, frame, signal, data)?;
        }
        Ok(())
    }
}

impl Entity<FunctionalEntity> {
    /// Attaches a child; it is set up immediately if this entity is.
    ///
    /// # Errors
    ///
    /// Propagates the child's setup error.
    pub fn add_entity(&mut self, entity: BoxedEntity, config: ChildConfig) -> EntityResult {
        let (functional, core) = self.parts_mut();
        functional.children.add_entity(core, entity, config)
    }

    /// Detaches a child, tearing it down first if needed.
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`](crate::error::EntityError::EntityNotFound)
    /// if `id` is not a child.
    pub fn remove_entity(&mut self, id: EntityId) -> EntityResult<BoxedEntity> {
        let (functional, core) = self.parts_mut();
        functional.children.remove_entity(core, id)
    }
}

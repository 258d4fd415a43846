//! The entity contract.
//!
//! An entity is split in two:
//!
//! - [`Entity<B>`] owns the fixed outer lifecycle (`setup`, `update`,
//!   `teardown`, `on_signal`) and an [`EntityCore`] holding the bookkeeping:
//!   set-up flag, requested transition, last frame, config bag and listener
//!   registry.
//! - A [`Behavior`] supplies the extension hooks that run inside those calls.
//!
//! Composites hold children as [`BoxedEntity`] trait objects. [`Lifecycle`]
//! is sealed and only implemented by [`Entity<B>`], so the phase checks and
//! the unconditional listener release at teardown cannot be bypassed by a
//! behavior.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::EntityConfig;
use crate::error::{EntityError, EntityResult, Violation};
use crate::events::{EventCallback, EventSource};
use crate::frame::FrameInfo;
use crate::listener::ListenerRegistry;
use crate::transition::Transition;

/// Unique identity of an entity instance, used for diagnostics and for
/// addressing children inside composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Lifecycle bookkeeping shared by every entity.
///
/// Behaviors receive `&mut EntityCore` in each hook to request transitions,
/// read the last frame or the config bag, and register listeners.
#[derive(Debug)]
pub struct EntityCore {
    id: EntityId,
    kind: &'static str,
    set_up: bool,
    transition: Option<Transition>,
    frame: FrameInfo,
    config: Option<EntityConfig>,
    listeners: ListenerRegistry,
}

impl EntityCore {
    fn new(kind: &'static str) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            set_up: false,
            transition: None,
            frame: FrameInfo::initial(),
            config: None,
            listeners: ListenerRegistry::new(),
        }
    }

    /// This entity's identity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The behavior's type name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Whether `setup` has run and `teardown` has not.
    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    /// `None` while running; `Some` once the entity has completed.
    #[must_use]
    pub fn requested_transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Marks the entity as completed.
    pub fn request_transition(&mut self, transition: impl Into<Transition>) {
        let transition = transition.into();
        debug!(entity = %self.id, kind = self.kind, %transition, "transition requested");
        self.transition = Some(transition);
    }

    /// Returns the entity to the running state.
    pub fn clear_transition(&mut self) {
        self.transition = None;
    }

    /// The most recent frame passed to `setup` or `update`.
    #[must_use]
    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    /// The bag received at setup.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the entity is not set up.
    pub fn config(&self) -> EntityResult<&EntityConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| self.violation(Violation::ParentNotSetUp))
    }

    /// Fails with a contract violation unless the entity is set up.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ContractViolation`] when not set up.
    pub fn require_set_up(&self) -> EntityResult {
        if self.set_up {
            Ok(())
        } else {
            Err(self.violation(Violation::ParentNotSetUp))
        }
    }

    /// Subscribes to `event` on `source`; released automatically at teardown.
    pub fn subscribe(
        &mut self,
        source: Rc<dyn EventSource>,
        event: impl Into<String>,
        callback: EventCallback,
    ) {
        self.listeners.subscribe(source, event, callback);
    }

    /// Releases subscriptions early. See [`ListenerRegistry::unsubscribe`].
    pub fn unsubscribe(&mut self, event: &str, callback: Option<&EventCallback>) -> usize {
        self.listeners.unsubscribe(event, callback)
    }

    /// The live subscriptions of this entity.
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Builds and logs a contract violation for this entity.
    #[must_use]
    pub fn violation(&self, violation: Violation) -> EntityError {
        error!(entity = %self.id, kind = self.kind, %violation, "entity contract violation");
        EntityError::ContractViolation {
            entity: self.id,
            kind: self.kind,
            violation,
        }
    }
}

/// Extension hooks run inside the fixed lifecycle of [`Entity<B>`].
///
/// All hooks default to doing nothing.
pub trait Behavior: 'static {
    /// A short type name used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Runs after the core has been marked set up.
    fn on_setup(
        &mut self,
        _core: &mut EntityCore,
        _frame: &FrameInfo,
        _config: &EntityConfig,
    ) -> EntityResult {
        Ok(())
    }

    /// Runs once per frame while set up.
    fn on_update(&mut self, _core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        Ok(())
    }

    /// Runs before the core releases listeners and clears the set-up flag.
    fn on_teardown(&mut self, _core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        Ok(())
    }

    /// Runs when a signal is broadcast through the tree.
    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        _frame: &FrameInfo,
        _signal: &str,
        _data: &Value,
    ) -> EntityResult {
        Ok(())
    }

    /// Wraps this behavior in an [`Entity`] and boxes it for a composite.
    fn boxed(self) -> BoxedEntity
    where
        Self: Sized,
    {
        Box::new(Entity::new(self))
    }
}

mod sealed {
    pub trait Sealed {}
}

/// The object-safe lifecycle interface every child of a composite exposes.
///
/// This trait is sealed: the only implementation is [`Entity<B>`].
pub trait Lifecycle: sealed::Sealed {
    /// This entity's identity.
    fn id(&self) -> EntityId;

    /// The behavior's type name.
    fn kind(&self) -> &'static str;

    /// Whether `setup` has run and `teardown` has not.
    fn is_set_up(&self) -> bool;

    /// `None` while running; `Some` once completed.
    fn requested_transition(&self) -> Option<&Transition>;

    /// Number of live listener subscriptions.
    fn listener_count(&self) -> usize;

    /// Starts the entity with a frame and a config bag.
    ///
    /// # Errors
    ///
    /// Contract violation if already set up; otherwise whatever the
    /// behavior's setup hook returns.
    fn setup(&mut self, frame: &FrameInfo, config: &EntityConfig) -> EntityResult;

    /// Advances the entity by one frame.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up; otherwise the behavior's error.
    fn update(&mut self, frame: &FrameInfo) -> EntityResult;

    /// Stops the entity and releases every listener it registered.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up; otherwise the behavior's error.
    /// Listeners are released and the entity is marked torn down even when
    /// the behavior's teardown hook fails.
    fn teardown(&mut self, frame: &FrameInfo) -> EntityResult;

    /// Delivers a named signal with an arbitrary payload.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up; otherwise the behavior's error.
    fn on_signal(&mut self, frame: &FrameInfo, signal: &str, data: &Value) -> EntityResult;

    /// Upcast for [`downcast_ref`](dyn Lifecycle::downcast_ref).
    fn as_any(&self) -> &dyn Any;

    /// Upcast for [`downcast_mut`](dyn Lifecycle::downcast_mut).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// An owned, type-erased child entity.
pub type BoxedEntity = Box<dyn Lifecycle>;

impl dyn Lifecycle {
    /// Returns the concrete entity if its behavior is `B`.
    #[must_use]
    pub fn downcast_ref<B: Behavior>(&self) -> Option<&Entity<B>> {
        self.as_any().downcast_ref()
    }

    /// Returns the concrete entity if its behavior is `B`.
    pub fn downcast_mut<B: Behavior>(&mut self) -> Option<&mut Entity<B>> {
        self.as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for dyn Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("set_up", &self.is_set_up())
            .finish()
    }
}

/// An entity: fixed lifecycle bookkeeping around a [`Behavior`].
pub struct Entity<B> {
    core: EntityCore,
    behavior: B,
}

impl<B: Behavior> Entity<B> {
    /// Wraps `behavior`. No side effects happen until `setup`.
    #[must_use]
    pub fn new(behavior: B) -> Self {
        Self {
            core: EntityCore::new(behavior.kind()),
            behavior,
        }
    }

    /// The lifecycle bookkeeping.
    #[must_use]
    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    /// The behavior.
    #[must_use]
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// The behavior, mutably. Structural changes that need the parent's
    /// frame or config go through the composite's methods on `Entity<B>`.
    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    /// Both halves at once, for calling behavior methods that need the core.
    pub fn parts_mut(&mut self) -> (&mut B, &mut EntityCore) {
        (&mut self.behavior, &mut self.core)
    }
}

impl<B> fmt::Debug for Entity<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: Behavior> sealed::Sealed for Entity<B> {}

impl<B: Behavior> Lifecycle for Entity<B> {
    fn id(&self) -> EntityId {
        self.core.id
    }

    fn kind(&self) -> &'static str {
        self.core.kind
    }

    fn is_set_up(&self) -> bool {
        self.core.set_up
    }

    fn requested_transition(&self) -> Option<&Transition> {
        self.core.transition.as_ref()
    }

    fn listener_count(&self) -> usize {
        self.core.listeners.len()
    }

    fn setup(&mut self, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        if self.core.set_up {
            return Err(self.core.violation(Violation::AlreadySetUp));
        }
        self.core.set_up = true;
        self.core.transition = None;
        self.core.frame = frame.clone();
        self.core.config = Some(config.clone());
        debug!(entity = %self.core.id, kind = self.core.kind, "setup");
        self.behavior.on_setup(&mut self.core, frame, config)
    }

    fn update(&mut self, frame: &FrameInfo) -> EntityResult {
        if !self.core.set_up {
            return Err(self.core.violation(Violation::UpdateBeforeSetup));
        }
        self.core.frame = frame.clone();
        self.behavior.on_update(&mut self.core, frame)
    }

    fn teardown(&mut self, frame: &FrameInfo) -> EntityResult {
        if !self.core.set_up {
            return Err(self.core.violation(Violation::TeardownBeforeSetup));
        }
        self.core.frame = frame.clone();
        let result = self.behavior.on_teardown(&mut self.core, frame);
        self.core.listeners.unsubscribe_all();
        self.core.set_up = false;
        self.core.config = None;
        debug!(entity = %self.core.id, kind = self.core.kind, "teardown");
        result
    }

    fn on_signal(&mut self, frame: &FrameInfo, signal: &str, data: &Value) -> EntityResult {
        if !self.core.set_up {
            return Err(self.core.violation(Violation::SignalBeforeSetup));
        }
        self.behavior.on_signal(&mut self.core, frame, signal, data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Updates `child` unless it already completed, then reports its transition.
pub(crate) fn step(child: &mut dyn Lifecycle, frame: &FrameInfo) -> EntityResult<Option<Transition>> {
    if child.requested_transition().is_none() {
        child.update(frame)?;
    }
    Ok(child.requested_transition().cloned())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::SurfaceHandle;
    use crate::events::EventBus;

    struct Listening {
        bus: EventBus,
        hits: Rc<Cell<u32>>,
    }

    impl Behavior for Listening {
        fn kind(&self) -> &'static str {
            "Listening"
        }

        fn on_setup(
            &mut self,
            core: &mut EntityCore,
            _frame: &FrameInfo,
            _config: &EntityConfig,
        ) -> EntityResult {
            let hits = Rc::clone(&self.hits);
            core.subscribe(
                Rc::new(self.bus.clone()),
                "ping",
                Rc::new(move |_| hits.set(hits.get() + 1)),
            );
            Ok(())
        }
    }

    /// Subscribes once per update rather than at setup.
    struct LateListening {
        bus: EventBus,
    }

    impl Behavior for LateListening {
        fn kind(&self) -> &'static str {
            "LateListening"
        }

        fn on_update(&mut self, core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
            core.subscribe(Rc::new(self.bus.clone()), "tick", Rc::new(|_| {}));
            Ok(())
        }
    }

    fn config() -> EntityConfig {
        EntityConfig::new(SurfaceHandle::new())
    }

    #[test]
    fn test_set_up_flag_follows_lifecycle() {
        let frame = FrameInfo::initial();
        let mut entity = Entity::new(Listening {
            bus: EventBus::new(),
            hits: Rc::default(),
        });
        assert!(!entity.is_set_up());
        entity.setup(&frame, &config()).unwrap();
        assert!(entity.is_set_up());
        entity.update(&frame).unwrap();
        assert!(entity.is_set_up());
        entity.teardown(&frame).unwrap();
        assert!(!entity.is_set_up());
    }

    #[test]
    fn test_listeners_released_without_explicit_unsubscribe() {
        let frame = FrameInfo::initial();
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let mut entity = Entity::new(Listening {
            bus: bus.clone(),
            hits: Rc::clone(&hits),
        });

        entity.setup(&frame, &config()).unwrap();
        assert_eq!(entity.listener_count(), 1);
        bus.emit("ping", &[]);
        assert_eq!(hits.get(), 1);

        entity.teardown(&frame).unwrap();
        assert_eq!(entity.listener_count(), 0);
        assert_eq!(bus.total_listeners(), 0);
        bus.emit("ping", &[]);
        assert_eq!(hits.get(), 1, "torn-down entity must not hear events");
    }

    #[test]
    fn test_listeners_added_during_update_released_at_teardown() {
        let frame = FrameInfo::initial();
        let bus = EventBus::new();
        let mut entity = Entity::new(LateListening { bus: bus.clone() });

        entity.setup(&frame, &config()).unwrap();
        assert_eq!(entity.listener_count(), 0);
        for _ in 0..3 {
            entity.update(&frame).unwrap();
        }
        assert_eq!(entity.listener_count(), 3);
        assert_eq!(bus.listener_count("tick"), 3);

        entity.teardown(&frame).unwrap();
        assert_eq!(entity.listener_count(), 0);
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn test_contract_violations_are_reported() {
        let frame = FrameInfo::initial();
        let mut entity = Entity::new(Listening {
            bus: EventBus::new(),
            hits: Rc::default(),
        });

        for result in [
            entity.update(&frame),
            entity.teardown(&frame),
            entity.on_signal(&frame, "reset", &Value::Null),
        ] {
            assert!(matches!(result, Err(EntityError::ContractViolation { .. })));
        }

        entity.setup(&frame, &config()).unwrap();
        let err = entity.setup(&frame, &config()).unwrap_err();
        assert!(matches!(
            err,
            EntityError::ContractViolation {
                violation: Violation::AlreadySetUp,
                kind: "Listening",
                ..
            }
        ));
        assert_eq!(entity.listener_count(), 1, "rejected setup must not re-subscribe");
    }

    #[test]
    fn test_setup_clears_previous_transition() {
        let frame = FrameInfo::initial();
        let mut entity = Entity::new(Listening {
            bus: EventBus::new(),
            hits: Rc::default(),
        });
        entity.setup(&frame, &config()).unwrap();
        entity.parts_mut().1.request_transition("won");
        entity.teardown(&frame).unwrap();
        assert_eq!(entity.requested_transition(), Some(&Transition::new("won")));

        entity.setup(&frame, &config()).unwrap();
        assert!(entity.requested_transition().is_none());
    }

    #[test]
    fn test_downcast() {
        let mut boxed: BoxedEntity = Listening {
            bus: EventBus::new(),
            hits: Rc::default(),
        }
        .boxed();
        assert!(boxed.downcast_ref::<Listening>().is_some());
        assert_eq!(boxed.kind(), "Listening");
        let entity = boxed.downcast_mut::<Listening>().unwrap();
        assert_eq!(entity.behavior().hits.get(), 0);
    }
}

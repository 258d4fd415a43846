//! Fan-out composite: every child runs concurrently.
//!
//! Completed children are torn down and marked inactive but keep their
//! position, so child indices stay stable for the lifetime of the composite.

use serde_json::Value;
use tracing::debug;

use crate::config::{ChildConfig, EntityConfig};
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, EntityId, Lifecycle, step};
use crate::error::{EntityError, EntityResult};
use crate::frame::FrameInfo;
use crate::transition::Transition;

/// One child of a composite: the entity, how its config is derived, and
/// whether it is currently running.
#[derive(Debug)]
pub struct ChildRecord {
    entity: BoxedEntity,
    config: ChildConfig,
    active: bool,
}

impl ChildRecord {
    pub(crate) fn new(entity: BoxedEntity, config: ChildConfig) -> Self {
        Self {
            entity,
            config,
            active: false,
        }
    }

    /// The child entity.
    #[must_use]
    pub fn entity(&self) -> &(dyn Lifecycle + 'static) {
        self.entity.as_ref()
    }

    /// The child entity, mutably.
    pub fn entity_mut(&mut self) -> &mut (dyn Lifecycle + 'static) {
        self.entity.as_mut()
    }

    /// How this child's config bag is derived from the parent's.
    #[must_use]
    pub fn config(&self) -> &ChildConfig {
        &self.config
    }

    /// Whether the child is set up and has not yet completed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self, frame: &FrameInfo, parent: &EntityConfig) -> EntityResult {
        if !self.entity.is_set_up() {
            let config = self.config.resolve(parent);
            self.entity.setup(frame, &config)?;
        }
        self.active = true;
        Ok(())
    }

    pub(crate) fn deactivate(&mut self, frame: &FrameInfo) -> EntityResult {
        self.active = false;
        if self.entity.is_set_up() {
            self.entity.teardown(frame)?;
        }
        Ok(())
    }

    pub(crate) fn into_entity(self) -> BoxedEntity {
        self.entity
    }
}

/// Runs a fixed set of children side by side.
#[derive(Debug, Default)]
pub struct ParallelEntity {
    children: Vec<ChildRecord>,
    auto_transition: bool,
}

impl ParallelEntity {
    /// An empty composite that never completes on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A composite over `entities`, each inheriting the parent's config.
    #[must_use]
    pub fn with_children(entities: impl IntoIterator<Item = BoxedEntity>) -> Self {
        Self {
            children: entities
                .into_iter()
                .map(|e| ChildRecord::new(e, ChildConfig::Inherit))
                .collect(),
            auto_transition: false,
        }
    }

    /// Complete with [`Transition::done`] once no child is active.
    #[must_use]
    pub fn auto_transition(mut self, enabled: bool) -> Self {
        self.auto_transition = enabled;
        self
    }

    /// Appends a child before setup.
    #[must_use]
    pub fn child(mut self, entity: BoxedEntity, config: ChildConfig) -> Self {
        self.children.push(ChildRecord::new(entity, config));
        self
    }

    /// Number of children, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the composite holds no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of children still running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.children.iter().filter(|c| c.active).count()
    }

    /// The child record at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&ChildRecord> {
        self.children.get(index)
    }

    /// The child record at `index`, mutably.
    pub fn record_mut(&mut self, index: usize) -> Option<&mut ChildRecord> {
        self.children.get_mut(index)
    }

    /// Iterates over child records in update order.
    pub fn records(&self) -> impl Iterator<Item = &ChildRecord> {
        self.children.iter()
    }

    /// Adds a child; if the parent is set up the child is set up at once.
    ///
    /// # Errors
    ///
    /// Propagates the child's setup error.
    pub fn add_entity(
        &mut self,
        core: &EntityCore,
        entity: BoxedEntity,
        config: ChildConfig,
    ) -> EntityResult {
        let mut record = ChildRecord::new(entity, config);
        if core.is_set_up() {
            record.activate(core.frame(), core.config()?)?;
        }
        debug!(parent = %core.id(), child = %record.entity.id(), "child added");
        self.children.push(record);
        Ok(())
    }

    /// Removes a child, tearing it down first if it is set up.
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`] if `id` is not a child.
    pub fn remove_entity(&mut self, core: &EntityCore, id: EntityId) -> EntityResult<BoxedEntity> {
        let index = self
            .children
            .iter()
            .position(|c| c.entity.id() == id)
            .ok_or(EntityError::EntityNotFound {
                parent: core.id(),
                entity: id,
            })?;
        let mut record = self.children.remove(index);
        record.deactivate(core.frame())?;
        debug!(parent = %core.id(), child = %id, "child removed");
        Ok(record.into_entity())
    }

    /// Tears down and discards every child.
    ///
    /// # Errors
    ///
    /// Propagates the first teardown error; remaining children are still
    /// discarded.
    pub fn remove_all_entities(&mut self, core: &EntityCore) -> EntityResult {
        let mut first_error = None;
        for mut record in self.children.drain(..) {
            if let Err(err) = record.deactivate(core.frame()) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn setup_children(&mut self, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        for record in &mut self.children {
            record.activate(frame, config)?;
        }
        Ok(())
    }

    pub(crate) fn update_children(&mut self, core: &EntityCore, frame: &FrameInfo) -> EntityResult {
        for (index, record) in self.children.iter_mut().enumerate() {
            if !record.active {
                continue;
            }
            if let Some(transition) = step(record.entity.as_mut(), frame)? {
                debug!(parent = %core.id(), index, %transition, "child completed");
                record.deactivate(frame)?;
            }
        }
        Ok(())
    }

    pub(crate) fn teardown_children(&mut self, frame: &FrameInfo) -> EntityResult {
        for record in &mut self.children {
            record.deactivate(frame)?;
        }
        Ok(())
    }

    pub(crate) fn signal_children(&mut self, frame: &FrameInfo, signal: &str, data: &Value) -> EntityResult {
        for record in self.children.iter_mut().filter(|c| c.active) {
            record.entity.on_signal(frame, signal, data)?;
        }
        Ok(())
    }
}

impl Behavior for ParallelEntity {
    fn kind(&self) -> &'static str {
        "ParallelEntity"
    }

    fn on_setup(&mut self, _core: &mut EntityCore, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        self.setup_children(frame, config)
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.update_children(core, frame)?;
        if self.auto_transition && self.active_count() == 0 && core.requested_transition().is_none() {
            core.request_transition(Transition::done());
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.teardown_children(frame)
    }

    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        self.signal_children(frame, signal, data)
    }
}

impl Entity<ParallelEntity> {
    /// See [`ParallelEntity::add_entity`].
    ///
    /// # Errors
    ///
    /// Propagates the child's setup error.
    pub fn add_entity(&mut self, entity: BoxedEntity, config: ChildConfig) -> EntityResult {
        let (parallel, core) = self.parts_mut();
        parallel.add_entity(core, entity, config)
    }

    /// See [`ParallelEntity::remove_entity`].
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`] if `id` is not a child.
    pub fn remove_entity(&mut self, id: EntityId) -> EntityResult<BoxedEntity> {
        let (parallel, core) = self.parts_mut();
        parallel.remove_entity(core, id)
    }

    /// See [`ParallelEntity::remove_all_entities`].
    ///
    /// # Errors
    ///
    /// Propagates the first teardown error.
    pub fn remove_all_entities(&mut self) -> EntityResult {
        let (parallel, core) = self.parts_mut();
        parallel.remove_all_entities(core)
    }
}

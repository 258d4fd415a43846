//! Self-pruning fan-out composite.
//!
//! Same update policy as [`ParallelEntity`](crate::parallel::ParallelEntity),
//! but completed children are removed from the live list, which shrinks over
//! the composite's lifetime.

use serde_json::Value;
use tracing::debug;

use crate::config::{ChildConfig, EntityConfig};
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, EntityId, Lifecycle, step};
use crate::error::{EntityError, EntityResult};
use crate::frame::FrameInfo;
use crate::parallel::ChildRecord;
use crate::transition::Transition;

/// Runs children side by side and drops each one once it completes.
#[derive(Debug)]
pub struct DeflatingCompositeEntity {
    children: Vec<ChildRecord>,
    auto_transition: bool,
}

impl DeflatingCompositeEntity {
    /// An empty composite that completes once its live list is empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            auto_transition: true,
        }
    }

    /// A composite over `entities`, each inheriting the parent's config.
    #[must_use]
    pub fn with_children(entities: impl IntoIterator<Item = BoxedEntity>) -> Self {
        let mut composite = Self::new();
        composite.children = entities
            .into_iter()
            .map(|e| ChildRecord::new(e, ChildConfig::Inherit))
            .collect();
        composite
    }

    /// Whether to complete when the live list becomes empty. On by default.
    #[must_use]
    pub fn auto_transition(mut self, enabled: bool) -> Self {
        self.auto_transition = enabled;
        self
    }

    /// Number of live children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` once every child has completed or been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The live child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&(dyn Lifecycle + 'static)> {
        self.children.get(index).map(ChildRecord::entity)
    }

    /// The live child at `index`, mutably.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut (dyn Lifecycle + 'static)> {
        self.children.get_mut(index).map(ChildRecord::entity_mut)
    }

    /// Identities of the live children, in update order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<EntityId> {
        self.children.iter().map(|c| c.entity().id()).collect()
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
        self.children.push(record);
        Ok(())
    }

    /// Removes a live child, tearing it down first.
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`] if `id` is not a live child.
    pub fn remove_entity(&mut self, core: &EntityCore, id: EntityId) -> EntityResult<BoxedEntity> {
        let index = self
            .children
            .iter()
            .position(|c| c.entity().id() == id)
            .ok_or(EntityError::EntityNotFound {
                parent: core.id(),
                entity: id,
            })?;
        let mut record = self.children.remove(index);
        record.deactivate(core.frame())?;
        Ok(record.into_entity())
    }
}

impl Default for DeflatingCompositeEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for DeflatingCompositeEntity {
    fn kind(&self) -> &'static str {
        "DeflatingCompositeEntity"
    }

    fn on_setup(&mut self, _core: &mut EntityCore, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        for record in &mut self.children {
            record.activate(frame, config)?;
        }
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        let mut index = 0;
        while index < self.children.len() {
            let record = &mut self.children[index];
            if let Some(transition) = step(record.entity_mut(), frame)? {
                record.deactivate(frame)?;
                let removed = self.children.remove(index);
                debug!(
                    parent = %core.id(),
                    child = %removed.entity().id(),
                    %transition,
                    remaining = self.children.len(),
                    "child completed and pruned"
                );
            } else {
                index += 1;
            }
        }
        if self.auto_transition && self.children.is_empty() && core.requested_transition().is_none() {
            core.request_transition(Transition::done());
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        for record in &mut self.children {
            record.deactivate(frame)?;
        }
        Ok(())
    }

    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        for record in self.children.iter_mut().filter(|c| c.is_active()) {
            record.entity_mut().on_signal(frame, signal, data)?;
        }
        Ok(())
    }
}

impl Entity<DeflatingCompositeEntity> {
    /// See [`DeflatingCompositeEntity::add_entity`].
    ///
    /// # Errors
    ///
    /// Propagates the child's setup error.
    pub fn add_entity(&mut self, entity: BoxedEntity, config: ChildConfig) -> EntityResult {
        let (composite, core) = self.parts_mut();
        composite.add_entity(core, entity, config)
    }

    /// See [`DeflatingCompositeEntity::remove_entity`].
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`] if `id` is not a live child.
    pub fn remove_entity(&mut self, id: EntityId) -> EntityResult<BoxedEntity> {
        let (composite, core) = self.parts_mut();
        composite.remove_entity(core, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, config, entries, frame, journal};

    #[test]
    fn test_completed_child_is_spliced_out() {
        let log = journal();
        let a = Probe::new("a", &log).completes_after(1, "x");
        let b = Probe::new("b", &log);
        let b_trigger = b.trigger();
        let b = b.boxed();
        let b_id = b.id();
        let mut composite = Entity::new(DeflatingCompositeEntity::with_children([a.boxed(), b]));
        let frame = frame();

        composite.setup(&frame, &config()).unwrap();
        composite.update(&frame).unwrap();
        assert_eq!(composite.behavior().len(), 1);
        assert_eq!(composite.behavior().child_ids(), vec![b_id]);
        assert!(composite.requested_transition().is_none());

        b_trigger.fire("y");
        composite.update(&frame).unwrap();
        assert!(composite.behavior().is_empty());
        assert_eq!(composite.requested_transition(), Some(&Transition::done()));
        assert_eq!(
            entries(&log),
            vec!["a:setup", "b:setup", "a:update", "a:teardown", "b:update", "b:update", "b:teardown"]
        );
    }

    #[test]
    fn test_added_children_extend_lifetime() {
        let log = journal();
        let mut composite = Entity::new(DeflatingCompositeEntity::with_children([
            Probe::new("a", &log).completes_after(1, "x").boxed(),
        ]));
        let frame = frame();
        composite.setup(&frame, &config()).unwrap();
        composite
            .add_entity(
                Probe::new("b", &log).completes_after(2, "y").boxed(),
                ChildConfig::Inherit,
            )
            .unwrap();

        composite.update(&frame).unwrap();
        assert_eq!(composite.behavior().len(), 1);
        assert!(composite.requested_transition().is_none());

        composite.update(&frame).unwrap();
        assert!(composite.requested_transition().is_some());
    }

    #[test]
    fn test_teardown_unwinds_live_children() {
        let log = journal();
        let mut composite = Entity::new(
            DeflatingCompositeEntity::with_children([Probe::new("a", &log).boxed()])
                .auto_transition(false),
        );
        let frame = frame();
        composite.setup(&frame, &config()).unwrap();
        composite.teardown(&frame).unwrap();
        assert_eq!(entries(&log), vec!["a:setup", "a:teardown"]);
        assert!(!composite.behavior().child(0).unwrap().is_set_up());
    }

    #[test]
    fn test_remove_unknown_entity_fails() {
        let mut composite = Entity::new(DeflatingCompositeEntity::new());
        composite.setup(&frame(), &config()).unwrap();
        assert!(matches!(
            composite.remove_entity(EntityId::new()),
            Err(EntityError::EntityNotFound { .. })
        ));
    }
}

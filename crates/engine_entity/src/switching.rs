//! Exclusive switch: at most one child is set up at a time.

use serde_json::Value;
use tracing::debug;

use crate::config::{ChildConfig, EntityConfig};
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, EntityId, Lifecycle, step};
use crate::error::{EntityError, EntityResult};
use crate::frame::FrameInfo;
use crate::parallel::ChildRecord;

/// Holds a list of children and runs only the selected one.
///
/// The active child is updated until it requests a transition; after that it
/// stays set up, untouched, until the switch moves elsewhere or is torn down.
#[derive(Debug, Default)]
pub struct SwitchingEntity {
    children: Vec<ChildRecord>,
    active: Option<usize>,
    starting_index: Option<usize>,
}

impl SwitchingEntity {
    /// A switch with no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A switch over `entities`, each inheriting the parent's config.
    #[must_use]
    pub fn with_children(entities: impl IntoIterator<Item = BoxedEntity>) -> Self {
        Self {
            children: entities
                .into_iter()
                .map(|e| ChildRecord::new(e, ChildConfig::Inherit))
                .collect(),
            ..Self::default()
        }
    }

    /// Appends a child before setup.
    #[must_use]
    pub fn child(mut self, entity: BoxedEntity, config: ChildConfig) -> Self {
        self.children.push(ChildRecord::new(entity, config));
        self
    }

    /// Child to activate during setup. By default nothing is active.
    #[must_use]
    pub fn starting_index(mut self, index: usize) -> Self {
        self.starting_index = Some(index);
        self
    }

    /// Index of the active child, `None` when nothing is active.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active child.
    #[must_use]
    pub fn active_entity(&self) -> Option<&(dyn Lifecycle + 'static)> {
        self.active.map(|i| self.children[i].entity())
    }

    /// The child at `index`.
    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<&(dyn Lifecycle + 'static)> {
        self.children.get(index).map(ChildRecord::entity)
    }

    /// The child at `index`, mutably.
    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut (dyn Lifecycle + 'static)> {
        self.children.get_mut(index).map(ChildRecord::entity_mut)
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the switch holds no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Adds a child. It is not set up until switched to.
    pub fn add_entity(&mut self, entity: BoxedEntity, config: ChildConfig) {
        self.children.push(ChildRecord::new(entity, config));
    }

    /// Tears down the active child, then sets up the child at `index`.
    /// `None` leaves nothing active.
    ///
    /// # Errors
    ///
    /// [`EntityError::IndexOutOfRange`] for an unknown index, a contract
    /// violation if the switch is not set up, or a child lifecycle error.
    pub fn switch_to_index(&mut self, core: &EntityCore, index: Option<usize>) -> EntityResult {
        core.require_set_up()?;
        if let Some(i) = index
            && i >= self.children.len()
        {
            return Err(EntityError::IndexOutOfRange {
                parent: core.id(),
                index: i,
                len: self.children.len(),
            });
        }

        let frame = core.frame();
        if let Some(current) = self.active.take() {
            self.children[current].deactivate(frame)?;
        }
        self.active = index;
        if let Some(i) = index {
            self.children[i].activate(frame, core.config()?)?;
        }
        debug!(entity = %core.id(), active = ?index, "switched");
        Ok(())
    }

    /// Resolves `id` to its index and switches to it.
    ///
    /// # Errors
    ///
    /// [`EntityError::EntityNotFound`] if `id` is not a child, otherwise as
    /// [`switch_to_index`](Self::switch_to_index).
    pub fn switch_to_entity(&mut self, core: &EntityCore, id: Option<EntityId>) -> EntityResult {
        let index = match id {
            None => None,
            Some(id) => Some(
                self.children
                    .iter()
                    .position(|c| c.entity().id() == id)
                    .ok_or(EntityError::EntityNotFound {
                        parent: core.id(),
                        entity: id,
                    })?,
            ),
        };
        self.switch_to_index(core, index)
    }
}

impl Behavior for SwitchingEntity {
    fn kind(&self) -> &'static str {
        "SwitchingEntity"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.active = None;
        if let Some(index) = self.starting_index {
            self.switch_to_index(core, Some(index))?;
        }
        Ok(())
    }

    fn on_update(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        if let Some(index) = self.active {
            step(self.children[index].entity_mut(), frame)?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        self.switch_to_index(core, None)
    }

    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        if let Some(index) = self.active {
            self.children[index].entity_mut().on_signal(frame, signal, data)?;
        }
        Ok(())
    }
}

impl Entity<SwitchingEntity> {
    /// See [`SwitchingEntity::switch_to_index`].
    ///
    /// # Errors
    ///
    /// As [`SwitchingEntity::switch_to_index`].
    pub fn switch_to_index(&mut self, index: Option<usize>) -> EntityResult {
        let (switch, core) = self.parts_mut();
        switch.switch_to_index(core, index)
    }

    /// See [`SwitchingEntity::switch_to_entity`].
    ///
    /// # Errors
    ///
    /// As [`SwitchingEntity::switch_to_entity`].
    pub fn switch_to_entity(&mut self, id: Option<EntityId>) -> EntityResult {
        let (switch, core) = self.parts_mut();
        switch.switch_to_entity(core, id)
    }
}

//! Race composite: every child starts together and the first to complete
//! decides the outcome.

use serde_json::Value;
use tracing::debug;

use crate::config::{ChildConfig, EntityConfig};
use crate::entity::{Behavior, BoxedEntity, EntityCore, Lifecycle, step};
use crate::error::EntityResult;
use crate::frame::FrameInfo;
use crate::parallel::ChildRecord;
use crate::transition::Transition;

/// One contestant in an [`Alternative`].
#[derive(Debug)]
pub struct AlternativeOption {
    record: ChildRecord,
    label: Option<String>,
}

impl AlternativeOption {
    /// A contestant reported by its list index.
    #[must_use]
    pub fn new(entity: BoxedEntity) -> Self {
        Self {
            record: ChildRecord::new(entity, ChildConfig::Inherit),
            label: None,
        }
    }

    /// Reports this contestant's win as `label` instead of its index.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Overrides the config bag handed to this contestant.
    #[must_use]
    pub fn config(self, config: ChildConfig) -> Self {
        Self {
            record: ChildRecord::new(self.record.into_entity(), config),
            label: self.label,
        }
    }
}

impl From<BoxedEntity> for AlternativeOption {
    fn from(entity: BoxedEntity) -> Self {
        Self::new(entity)
    }
}

/// Completes with the label of the first child (in list order) that
/// completes. The default label is the child's index as a string.
///
/// The winning child's transition params are passed through as the
/// Alternative's own params. All children are torn down together when the
/// Alternative itself is torn down.
#[derive(Debug, Default)]
pub struct Alternative {
    options: Vec<AlternativeOption>,
}

impl Alternative {
    /// A race between `options`.
    #[must_use]
    pub fn new(options: impl IntoIterator<Item = AlternativeOption>) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }

    /// A race between unlabelled `entities`.
    #[must_use]
    pub fn with_children(entities: impl IntoIterator<Item = BoxedEntity>) -> Self {
        Self::new(entities.into_iter().map(AlternativeOption::new))
    }

    /// Number of contestants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if there are no contestants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The contestant at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&(dyn Lifecycle + 'static)> {
        self.options.get(index).map(|o| o.record.entity())
    }

    /// The contestant at `index`, mutably.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut (dyn Lifecycle + 'static)> {
        self.options.get_mut(index).map(|o| o.record.entity_mut())
    }

    fn label(&self, index: usize) -> String {
        self.options[index]
            .label
            .clone()
            .unwrap_or_else(|| index.to_string())
    }

    fn adopt(&self, core: &mut EntityCore, index: usize, won_with: &Transition) {
        if core.requested_transition().is_some() {
            return;
        }
        let label = self.label(index);
        debug!(entity = %core.id(), index, %label, "alternative decided");
        core.request_transition(Transition::with_params(label, won_with.params.clone()));
    }
}

impl Behavior for Alternative {
    fn kind(&self) -> &'static str {
        "Alternative"
    }

    fn on_setup(&mut self, core: &mut EntityCore, frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        for option in &mut self.options {
            option.record.activate(frame, config)?;
        }
        for index in 0..self.options.len() {
            if let Some(transition) = self.options[index].record.entity().requested_transition().cloned() {
                self.adopt(core, index, &transition);
            }
        }
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        for index in 0..self.options.len() {
            if let Some(transition) = step(self.options[index].record.entity_mut(), frame)? {
                self.adopt(core, index, &transition);
            }
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        for option in &mut self.options {
            option.record.deactivate(frame)?;
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
        for option in self.options.iter_mut().filter(|o| o.record.entity().is_set_up()) {
            option.record.entity_mut().on_signal(frame, signal, data)?;
        }
        Ok(())
    }
}

//! Test helpers: a probe behavior that journals its lifecycle calls.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::config::{EntityConfig, SurfaceHandle};
use crate::entity::{Behavior, EntityCore};
use crate::error::EntityResult;
use crate::frame::FrameInfo;
use crate::transition::Transition;

/// Shared, ordered record of lifecycle calls across many probes.
pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Rc::default()
}

pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

pub(crate) fn config() -> EntityConfig {
    EntityConfig::new(SurfaceHandle::new())
}

pub(crate) fn frame() -> FrameInfo {
    FrameInfo::initial()
}

/// Handle to complete a probe from outside the tree on its next update.
#[derive(Clone, Default)]
pub(crate) struct Trigger(Rc<RefCell<Option<Transition>>>);

impl Trigger {
    pub(crate) fn fire(&self, transition: impl Into<Transition>) {
        *self.0.borrow_mut() = Some(transition.into());
    }
}

pub(crate) struct Probe {
    name: &'static str,
    journal: Journal,
    trigger: Trigger,
    complete_after: Option<(u32, Transition)>,
    updates: u32,
}

impl Probe {
    pub(crate) fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: Rc::clone(journal),
            trigger: Trigger::default(),
            complete_after: None,
            updates: 0,
        }
    }

    /// Completes with `transition` on the `n`th update after each setup.
    pub(crate) fn completes_after(mut self, n: u32, transition: impl Into<Transition>) -> Self {
        self.complete_after = Some((n, transition.into()));
        self
    }

    pub(crate) fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    fn log(&self, what: &str) {
        self.journal.borrow_mut().push(format!("{}:{what}", self.name));
    }
}

impl Behavior for Probe {
    fn kind(&self) -> &'static str {
        "Probe"
    }

    fn on_setup(&mut self, _core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.updates = 0;
        self.log("setup");
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        self.updates += 1;
        self.log("update");
        if let Some(transition) = self.trigger.0.borrow_mut().take() {
            core.request_transition(transition);
        } else if let Some((n, transition)) = &self.complete_after
            && self.updates >= *n
        {
            core.request_transition(transition.clone());
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        self.log("teardown");
        Ok(())
    }

    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        _frame: &FrameInfo,
        signal: &str,
        _data: &Value,
    ) -> EntityResult {
        self.log(&format!("signal:{signal}"));
        Ok(())
    }
}

//! Childless entities that each encode one simple completion rule.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::config::EntityConfig;
use crate::entity::{Behavior, Entity, EntityCore};
use crate::error::EntityResult;
use crate::events::{EventCallback, EventSource};
use crate::frame::FrameInfo;
use crate::transition::Transition;

/// Never completes on its own; see [`Entity::<Block>::done`].
#[derive(Debug, Default)]
pub struct Block;

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Behavior for Block {
    fn kind(&self) -> &'static str {
        "Block"
    }
}

impl Entity<Block> {
    /// Completes the block with `transition`.
    pub fn done(&mut self, transition: impl Into<Transition>) {
        self.parts_mut().1.request_transition(transition);
    }

    /// Completes the block with [`Transition::done`].
    pub fn finish(&mut self) {
        self.done(Transition::done());
    }
}

/// Evaluates a predicate once at setup and completes immediately with
/// `"true"` or `"false"`.
pub struct Decision {
    predicate: Box<dyn FnMut() -> bool>,
}

impl Decision {
    pub fn new(predicate: impl FnMut() -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decision").finish_non_exhaustive()
    }
}

impl Behavior for Decision {
    fn kind(&self) -> &'static str {
        "Decision"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        core.request_transition((self.predicate)());
        Ok(())
    }
}

/// Maps the arguments of an event to a completion, or `None` to keep waiting.
pub type EventHandler = Rc<dyn Fn(&[Value]) -> Option<Transition>>;

/// Waits for one named event on a capability bus.
///
/// The subscription is made at setup through the entity's listener registry,
/// so it is released at teardown. A completion observed between frames is
/// exposed on the entity's next update.
pub struct WaitForEvent {
    source: Rc<dyn EventSource>,
    event: String,
    handler: EventHandler,
    pending: Rc<RefCell<Option<Transition>>>,
}

impl WaitForEvent {
    /// Completes with [`Transition::done`] the first time `event` fires.
    pub fn new(source: Rc<dyn EventSource>, event: impl Into<String>) -> Self {
        Self {
            source,
            event: event.into(),
            handler: Rc::new(|_| Some(Transition::done())),
            pending: Rc::default(),
        }
    }

    /// Replaces the default handler.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Fn(&[Value]) -> Option<Transition> + 'static) -> Self {
        self.handler = Rc::new(handler);
        self
    }

    /// The awaited event name.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl fmt::Debug for WaitForEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitForEvent")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl Behavior for WaitForEvent {
    fn kind(&self) -> &'static str {
        "WaitForEvent"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.pending.borrow_mut().take();
        let handler = Rc::clone(&self.handler);
        let pending = Rc::clone(&self.pending);
        let callback: EventCallback = Rc::new(move |args: &[Value]| {
            if pending.borrow().is_some() {
                return;
            }
            // The handler may emit on the same bus, so no borrow is held while it runs.
            let outcome = handler(args);
            let mut slot = pending.borrow_mut();
            if slot.is_none() {
                *slot = outcome;
            }
        });
        core.subscribe(Rc::clone(&self.source), self.event.clone(), callback);
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, _frame: &FrameInfo) -> EntityResult {
        if let Some(transition) = self.pending.borrow_mut().take() {
            core.request_transition(transition);
        }
        Ok(())
    }
}

/// A callback run by [`FunctionCall`].
pub type CallFn = Box<dyn FnMut(&EntityConfig) -> anyhow::Result<()>>;

/// Invokes a callback once at setup and completes immediately.
pub struct FunctionCall {
    call: CallFn,
}

impl FunctionCall {
    pub fn new(call: impl FnMut(&EntityConfig) -> anyhow::Result<()> + 'static) -> Self {
        Self {
            call: Box::new(call),
        }
    }
}

impl fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall").finish_non_exhaustive()
    }
}

impl Behavior for FunctionCall {
    fn kind(&self) -> &'static str {
        "FunctionCall"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, config: &EntityConfig) -> EntityResult {
        (self.call)(config)?;
        core.request_transition(Transition::done());
        Ok(())
    }
}

/// Completes once `duration` milliseconds of scaled frame time have passed
/// since setup.
#[derive(Debug, Clone)]
pub struct Wait {
    duration: f64,
    elapsed: f64,
}

impl Wait {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    /// Scaled time accumulated since setup.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Behavior for Wait {
    fn kind(&self) -> &'static str {
        "Wait"
    }

    fn on_setup(&mut self, _core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.elapsed = 0.0;
        Ok(())
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.elapsed += frame.time_since_last_frame;
        if self.elapsed >= self.duration {
            core.request_transition(Transition::done());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::entity::Lifecycle;
    use crate::error::EntityError;
    use crate::events::EventBus;
    use crate::frame::GameState;
    use crate::testing::{config, frame};

    #[test]
    fn test_block_waits_for_done() {
        let mut block = Entity::new(Block::new());
        let frame = frame();
        block.setup(&frame, &config()).unwrap();
        block.update(&frame).unwrap();
        assert!(block.requested_transition().is_none());
        block.finish();
        assert_eq!(block.requested_transition(), Some(&Transition::done()));
    }

    #[test]
    fn test_decision_evaluates_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut decision = Entity::new(Decision::new(move || {
            counter.set(counter.get() + 1);
            false
        }));
        let frame = frame();
        decision.setup(&frame, &config()).unwrap();
        decision.update(&frame).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(decision.requested_transition(), Some(&Transition::new("false")));
    }

    #[test]
    fn test_wait_for_event_default_handler() {
        let bus = EventBus::new();
        let mut wait = Entity::new(WaitForEvent::new(Rc::new(bus.clone()), "loaded"));
        let frame = frame();
        wait.setup(&frame, &config()).unwrap();
        assert_eq!(bus.listener_count("loaded"), 1);

        wait.update(&frame).unwrap();
        assert!(wait.requested_transition().is_none());

        bus.emit("loaded", &[]);
        assert!(wait.requested_transition().is_none(), "exposed on next update");
        wait.update(&frame).unwrap();
        assert_eq!(wait.requested_transition(), Some(&Transition::done()));

        wait.teardown(&frame).unwrap();
        assert_eq!(bus.listener_count("loaded"), 0);
    }

    #[test]
    fn test_wait_for_event_custom_handler() {
        let bus = EventBus::new();
        let mut wait = Entity::new(
            WaitForEvent::new(Rc::new(bus.clone()), "score").with_handler(|args| {
                let points = args.first()?.as_u64()?;
                (points >= 10).then(|| Transition::with_params("win", json!(points)))
            }),
        );
        let frame = frame();
        wait.setup(&frame, &config()).unwrap();

        bus.emit("score", &[json!(3)]);
        wait.update(&frame).unwrap();
        assert!(wait.requested_transition().is_none());

        bus.emit("score", &[json!(12)]);
        wait.update(&frame).unwrap();
        assert_eq!(
            wait.requested_transition(),
            Some(&Transition::with_params("win", json!(12)))
        );
    }

    #[test]
    fn test_wait_for_event_handler_may_reemit() {
        let bus = EventBus::new();
        let inner = bus.clone();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut wait = Entity::new(WaitForEvent::new(Rc::new(bus.clone()), "ping").with_handler(move |args| {
            counter.set(counter.get() + 1);
            if args.is_empty() {
                inner.emit("ping", &[json!("echo")]);
                None
            } else {
                Some(Transition::new("echoed"))
            }
        }));
        let frame = frame();
        wait.setup(&frame, &config()).unwrap();

        bus.emit("ping", &[]);
        assert_eq!(calls.get(), 2);
        wait.update(&frame).unwrap();
        assert_eq!(wait.requested_transition(), Some(&Transition::new("echoed")));
    }

    #[test]
    fn test_function_call() {
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let mut call = Entity::new(FunctionCall::new(move |config| {
            flag.set(config.get("go").is_some());
            Ok(())
        }));
        call.setup(&frame(), &config().with("go", true)).unwrap();
        assert!(called.get());
        assert!(call.requested_transition().is_some());

        let mut failing = Entity::new(FunctionCall::new(|_| anyhow::bail!("boom")));
        let err = failing.setup(&frame(), &config()).unwrap_err();
        assert!(matches!(err, EntityError::Callback(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_wait_accumulates_scaled_time() {
        let mut wait = Entity::new(Wait::new(30.0));
        let start = frame().with_time_scale(2.0);
        wait.setup(&start, &config()).unwrap();

        let first = start.advance(10.0, GameState::Playing);
        wait.update(&first).unwrap();
        assert!(wait.requested_transition().is_none());

        let paused = first.advance(100.0, GameState::Paused);
        wait.update(&paused).unwrap();
        assert!(wait.requested_transition().is_none());

        let second = paused.advance(5.0, GameState::Playing);
        wait.update(&second).unwrap();
        assert!((wait.behavior().elapsed() - 30.0).abs() < f64::EPSILON);
        assert!(wait.requested_transition().is_some());
    }
}

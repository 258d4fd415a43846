//! Graph composite: named states, each an entity, connected by a
//! transition table.
//!
//! When the active state's entity completes, its transition is resolved to
//! the next state in this order:
//!
//! 1. The current state has no table entry and the transition name is itself
//!    a state (or ending state): jump there directly.
//! 2. The current state has no table entry: fail with
//!    [`EntityError::NoTransitionForState`].
//! 3. Otherwise apply the state's [`TransitionRule`].
//!
//! A resolved name without params inherits the params of the transition
//! that caused it. Reaching an ending state completes the machine with that
//! state's name; ending states are never entered as entities.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::info;

use crate::config::EntityConfig;
use crate::entity::{Behavior, BoxedEntity, Entity, EntityCore, Lifecycle, step};
use crate::error::{EntityError, EntityResult, Violation};
use crate::events::EventBus;
use crate::frame::FrameInfo;
use crate::transition::Transition;

/// Default starting state name.
pub const START: &str = "start";

/// Default ending state name.
pub const END: &str = "end";

/// Event emitted on [`StateMachine::events`] after every state change, with
/// args `[newState, newParams, oldState, oldParams]`.
pub const STATE_CHANGE_EVENT: &str = "stateChange";

/// A resolved next-state descriptor.
///
/// `params: None` passes the params of the triggering transition through.
#[derive(Debug, Clone, PartialEq)]
pub struct NextState {
    pub name: String,
    pub params: Option<Value>,
}

impl NextState {
    /// A state reached with the triggering transition's params.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
        }
    }

    /// A state reached with explicit params.
    #[must_use]
    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params: Some(params),
        }
    }
}

impl From<&str> for NextState {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NextState {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// What a [`Resolver`] sees when a state completes.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// The transition the state's entity requested.
    pub transition: &'a Transition,
    /// Name of the state that completed.
    pub state: &'a str,
    /// Params the completed state was entered with.
    pub state_params: &'a Value,
}

/// Computes the next state from a completed state's transition.
pub type Resolver = Rc<dyn Fn(&TransitionContext<'_>) -> EntityResult<NextState>>;

/// Per-state rule selecting the next state.
#[derive(Clone)]
pub enum TransitionRule {
    /// Always go to this state, passing the transition's params through.
    Literal(String),
    /// Always go to this state with these params.
    LiteralWithParams(String, Value),
    /// Decide from the transition.
    Resolver(Resolver),
}

impl TransitionRule {
    /// Shorthand for [`TransitionRule::Resolver`].
    pub fn resolver(f: impl Fn(&TransitionContext<'_>) -> EntityResult<NextState> + 'static) -> Self {
        Self::Resolver(Rc::new(f))
    }

    /// A resolver backed by a flat `{transition name: next state}` map.
    /// Unmatched transition names fail with [`EntityError::NoTransition`].
    pub fn from_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<NextState>,
    {
        let map: HashMap<String, NextState> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::resolver(move |ctx| {
            map.get(&ctx.transition.name)
                .cloned()
                .ok_or_else(|| EntityError::NoTransition {
                    state: ctx.state.to_string(),
                    transition: ctx.transition.name.clone(),
                })
        })
    }

    fn resolve(&self, ctx: &TransitionContext<'_>) -> EntityResult<NextState> {
        match self {
            Self::Literal(name) => Ok(NextState::new(name.clone())),
            Self::LiteralWithParams(name, params) => Ok(NextState::with_params(name.clone(), params.clone())),
            Self::Resolver(f) => f(ctx),
        }
    }
}

impl fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            Self::LiteralWithParams(name, params) => f
                .debug_tuple("LiteralWithParams")
                .field(name)
                .field(params)
                .finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for TransitionRule {
    fn from(name: &str) -> Self {
        Self::Literal(name.to_string())
    }
}

/// Transition rules keyed by state name.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rules: HashMap<String, TransitionRule>,
}

impl TransitionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `state`.
    #[must_use]
    pub fn rule(mut self, state: impl Into<String>, rule: impl Into<TransitionRule>) -> Self {
        self.rules.insert(state.into(), rule.into());
        self
    }

    /// The rule for `state`.
    #[must_use]
    pub fn get(&self, state: &str) -> Option<&TransitionRule> {
        self.rules.get(state)
    }

    /// Whether `state` has a rule.
    #[must_use]
    pub fn contains(&self, state: &str) -> bool {
        self.rules.contains_key(state)
    }
}

/// Builds a state's entity from the params it is entered with.
pub type StateFactory = Rc<dyn Fn(&Value, &StateMachine) -> BoxedEntity>;

/// How a state's entity is obtained.
pub enum StateEntry {
    /// A concrete entity, set up again every time the state is entered.
    Entity(BoxedEntity),
    /// A factory invoked every time the state is entered.
    Factory(StateFactory),
}

impl StateEntry {
    /// Shorthand for [`StateEntry::Factory`].
    pub fn factory(f: impl Fn(&Value, &StateMachine) -> BoxedEntity + 'static) -> Self {
        Self::Factory(Rc::new(f))
    }
}

impl From<BoxedEntity> for StateEntry {
    fn from(entity: BoxedEntity) -> Self {
        Self::Entity(entity)
    }
}

impl fmt::Debug for StateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(entity) => f.debug_tuple("Entity").field(entity).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// The state entered at setup.
#[derive(Clone)]
pub enum StartingState {
    /// A fixed state and params.
    Fixed(String, Value),
    /// Computed at every setup.
    Computed(Rc<dyn Fn() -> NextState>),
}

impl fmt::Debug for StartingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(name, params) => f.debug_tuple("Fixed").field(name).field(params).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveState {
    name: String,
    params: Value,
}

/// A named-state graph where each state is an entity.
///
/// Only one state entity is set up at a time.
#[derive(Debug)]
pub struct StateMachine {
    states: HashMap<String, StateEntry>,
    transitions: TransitionTable,
    starting: StartingState,
    ending_states: HashSet<String>,
    active: Option<ActiveState>,
    spawned: Option<BoxedEntity>,
    visited: Vec<String>,
    events: EventBus,
}

impl StateMachine {
    /// An empty machine starting in `"start"` and ending in `"end"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            transitions: TransitionTable::new(),
            starting: StartingState::Fixed(START.to_string(), Value::Null),
            ending_states: HashSet::from([END.to_string()]),
            active: None,
            spawned: None,
            visited: Vec::new(),
            events: EventBus::new(),
        }
    }

    /// Registers a state.
    #[must_use]
    pub fn state(mut self, name: impl Into<String>, entry: impl Into<StateEntry>) -> Self {
        self.states.insert(name.into(), entry.into());
        self
    }

    /// Sets the transition table.
    #[must_use]
    pub fn transitions(mut self, table: TransitionTable) -> Self {
        self.transitions = table;
        self
    }

    /// Sets the starting state and its params.
    #[must_use]
    pub fn starting_state(mut self, name: impl Into<String>, params: Value) -> Self {
        self.starting = StartingState::Fixed(name.into(), params);
        self
    }

    /// Computes the starting state at each setup.
    #[must_use]
    pub fn starting_state_fn(mut self, f: impl Fn() -> NextState + 'static) -> Self {
        self.starting = StartingState::Computed(Rc::new(f));
        self
    }

    /// Replaces the set of ending states.
    #[must_use]
    pub fn ending_states<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.ending_states = names.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the active state.
    #[must_use]
    pub fn state_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Params the active state was entered with.
    #[must_use]
    pub fn state_params(&self) -> Option<&Value> {
        self.active.as_ref().map(|a| &a.params)
    }

    /// Every state reached after the starting one, in order, including the
    /// ending state that completed the machine.
    #[must_use]
    pub fn visited_states(&self) -> &[String] {
        &self.visited
    }

    /// Bus carrying [`STATE_CHANGE_EVENT`] notifications.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Whether `name` is a registered state or an ending state.
    #[must_use]
    pub fn is_known_state(&self, name: &str) -> bool {
        self.states.contains_key(name) || self.ending_states.contains(name)
    }

    /// The active state's entity.
    #[must_use]
    pub fn active_entity(&self) -> Option<&(dyn Lifecycle + 'static)> {
        let active = self.active.as_ref()?;
        match self.states.get(&active.name)? {
            StateEntry::Entity(entity) => Some(entity.as_ref()),
            StateEntry::Factory(_) => self.spawned.as_deref(),
        }
    }

    fn active_entity_mut(&mut self) -> Option<&mut (dyn Lifecycle + 'static)> {
        let active = self.active.as_ref()?;
        match self.states.get_mut(&active.name)? {
            StateEntry::Entity(entity) => Some(entity.as_mut()),
            StateEntry::Factory(_) => self.spawned.as_deref_mut(),
        }
    }

    /// Resolves a completed state's transition to the next state and params.
    fn resolve(&self, transition: &Transition) -> EntityResult<(String, Value)> {
        let Some(active) = self.active.as_ref() else {
            return Err(EntityError::InvalidDescriptor {
                state: String::new(),
                reason: "transition requested with no active state".to_string(),
            });
        };
        let next = match self.transitions.get(&active.name) {
            None if self.is_known_state(&transition.name) => NextState::new(transition.name.clone()),
            None => {
                return Err(EntityError::NoTransitionForState {
                    state: active.name.clone(),
                    transition: transition.name.clone(),
                });
            }
            Some(rule) => rule.resolve(&TransitionContext {
                transition,
                state: &active.name,
                state_params: &active.params,
            })?,
        };
        if next.name.is_empty() {
            return Err(EntityError::InvalidDescriptor {
                state: active.name.clone(),
                reason: format!("rule for transition '{}' produced an empty state name", transition.name),
            });
        }
        let params = next.params.unwrap_or_else(|| transition.params.clone());
        Ok((next.name, params))
    }

    fn exit_active(&mut self, frame: &FrameInfo) -> EntityResult<Option<ActiveState>> {
        if let Some(entity) = self.active_entity_mut()
            && entity.is_set_up()
        {
            entity.teardown(frame)?;
        }
        self.spawned = None;
        Ok(self.active.take())
    }

    fn enter(&mut self, core: &mut EntityCore, name: String, params: Value, initial: bool) -> EntityResult {
        let ending = self.ending_states.contains(&name);
        if !ending && !self.states.contains_key(&name) {
            return Err(EntityError::UnknownState {
                machine: core.id(),
                state: name,
            });
        }

        let frame = core.frame().clone();
        let previous = self.exit_active(&frame)?;
        if !initial {
            self.visited.push(name.clone());
        }

        if ending {
            info!(entity = %core.id(), state = %name, "state machine reached ending state");
            core.request_transition(Transition::with_params(name, params));
            return Ok(());
        }

        if let Some(StateEntry::Factory(factory)) = self.states.get(&name) {
            let factory = Rc::clone(factory);
            self.spawned = Some(factory(&params, self));
        }
        self.active = Some(ActiveState {
            name: name.clone(),
            params: params.clone(),
        });
        let config = core.config()?.clone();
        if let Some(entity) = self.active_entity_mut() {
            entity.setup(&frame, &config)?;
        }

        let (old_name, old_params) = previous.map_or((Value::Null, Value::Null), |p| (json!(p.name), p.params));
        info!(entity = %core.id(), state = %name, from = %old_name, "state changed");
        self.events.emit(STATE_CHANGE_EVENT, &[json!(name), params, old_name, old_params]);
        Ok(())
    }

    /// Leaves the active state for `name`, as if a transition had resolved
    /// to it.
    ///
    /// # Errors
    ///
    /// Contract violation if not set up or already completed,
    /// [`EntityError::UnknownState`] for an unknown name, or a state
    /// lifecycle error.
    pub fn change_state(&mut self, core: &mut EntityCore, name: impl Into<String>, params: Value) -> EntityResult {
        core.require_set_up()?;
        if core.requested_transition().is_some() {
            return Err(core.violation(Violation::AlreadyCompleted));
        }
        self.enter(core, name.into(), params, false)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for StateMachine {
    fn kind(&self) -> &'static str {
        "StateMachine"
    }

    fn on_setup(&mut self, core: &mut EntityCore, _frame: &FrameInfo, _config: &EntityConfig) -> EntityResult {
        self.visited.clear();
        self.active = None;
        let (name, params) = match &self.starting {
            StartingState::Fixed(name, params) => (name.clone(), params.clone()),
            StartingState::Computed(f) => {
                let next = f();
                (next.name, next.params.unwrap_or(Value::Null))
            }
        };
        self.enter(core, name, params, true)
    }

    fn on_update(&mut self, core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        if core.requested_transition().is_some() {
            return Ok(());
        }
        let Some(entity) = self.active_entity_mut() else {
            return Ok(());
        };
        if let Some(transition) = step(entity, frame)? {
            let (name, params) = self.resolve(&transition)?;
            self.enter(core, name, params, false)?;
        }
        Ok(())
    }

    fn on_teardown(&mut self, _core: &mut EntityCore, frame: &FrameInfo) -> EntityResult {
        self.exit_active(frame)?;
        Ok(())
    }

    fn on_signal(
        &mut self,
        _core: &mut EntityCore,
        frame: &FrameInfo,
        signal: &str,
        data: &Value,
    ) -> EntityResult {
        if let Some(entity) = self.active_entity_mut() {
            entity.on_signal(frame, signal, data)?;
        }
        Ok(())
    }
}

impl Entity<StateMachine> {
    /// See [`StateMachine::change_state`].
    ///
    /// # Errors
    ///
    /// As [`StateMachine::change_state`].
    pub fn change_state(&mut self, name: impl Into<String>, params: Value) -> EntityResult {
        let (machine, core) = self.parts_mut();
        machine.change_state(core, name, params)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::events::EventSource;
    use crate::leaves::Block;
    use crate::testing::{Probe, config, entries, frame, journal};

    fn level_machine(log: &crate::testing::Journal) -> StateMachine {
        StateMachine::new()
            .state(START, Probe::new("start", log).completes_after(1, "win").boxed())
            .state("middle", Probe::new("middle", log).completes_after(1, "finish").boxed())
            .transitions(
                TransitionTable::new()
                    .rule(START, TransitionRule::from_map([("win", "middle")]))
                    .rule("middle", TransitionRule::from_map([("finish", END)])),
            )
    }

    #[test]
    fn test_walks_table_to_ending_state() {
        let log = journal();
        let mut machine = Entity::new(level_machine(&log));
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        assert_eq!(machine.behavior().state_name(), Some(START));
        assert!(machine.behavior().visited_states().is_empty());

        machine.update(&frame).unwrap();
        assert_eq!(machine.behavior().state_name(), Some("middle"));
        assert!(machine.requested_transition().is_none());

        machine.update(&frame).unwrap();
        assert_eq!(machine.requested_transition(), Some(&Transition::new(END)));
        assert_eq!(machine.behavior().visited_states(), ["middle", "end"]);
        assert_eq!(machine.behavior().state_name(), None);
        assert_eq!(
            entries(&log),
            vec![
                "start:setup", "start:update", "start:teardown",
                "middle:setup", "middle:update", "middle:teardown",
            ]
        );

        machine.teardown(&frame).unwrap();
        assert_eq!(entries(&log).len(), 6, "ending state is never entered");
    }

    #[test]
    fn test_direct_jump_without_table_entry() {
        let log = journal();
        let mut machine = Entity::new(
            StateMachine::new()
                .state(START, Probe::new("start", &log).completes_after(1, "other").boxed())
                .state("other", Probe::new("other", &log).completes_after(1, END).boxed()),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.update(&frame).unwrap();
        assert_eq!(machine.behavior().state_name(), Some("other"));
        machine.update(&frame).unwrap();
        assert_eq!(machine.requested_transition(), Some(&Transition::new(END)));
    }

    #[test]
    fn test_table_rule_wins_over_direct_jump() {
        let log = journal();
        let mut machine = Entity::new(
            StateMachine::new()
                .state(START, Probe::new("start", &log).completes_after(1, "b").boxed())
                .state("a", Block::new().boxed())
                .state("b", Block::new().boxed())
                .transitions(TransitionTable::new().rule(START, "a")),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.update(&frame).unwrap();
        assert_eq!(machine.behavior().state_name(), Some("a"));
        assert_eq!(machine.behavior().visited_states(), ["a"]);
    }

    #[test]
    fn test_missing_rule_is_fatal() {
        let log = journal();
        let mut machine = Entity::new(
            StateMachine::new().state(START, Probe::new("start", &log).completes_after(1, "nowhere").boxed()),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        let err = machine.update(&frame).unwrap_err();
        assert!(matches!(
            err,
            EntityError::NoTransitionForState { ref state, ref transition }
                if state == START && transition == "nowhere"
        ));
        assert_eq!(machine.behavior().state_name(), Some(START), "state kept on failure");
    }

    #[test]
    fn test_flat_map_miss_is_fatal() {
        let log = journal();
        let mut machine = Entity::new(level_machine(&log).state(
            START,
            Probe::new("start", &log).completes_after(1, "lose").boxed(),
        ));
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        assert!(matches!(
            machine.update(&frame),
            Err(EntityError::NoTransition { .. })
        ));
    }

    #[test]
    fn test_unknown_target_state_is_fatal() {
        let log = journal();
        let mut machine = Entity::new(
            StateMachine::new()
                .state(START, Probe::new("start", &log).completes_after(1, "go").boxed())
                .transitions(TransitionTable::new().rule(START, "missing")),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        assert!(matches!(
            machine.update(&frame),
            Err(EntityError::UnknownState { ref state, .. }) if state == "missing"
        ));
    }

    #[test]
    fn test_resolver_params_and_notifications() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let built_with = Rc::new(RefCell::new(Vec::new()));
        let log = journal();

        let record = Rc::clone(&built_with);
        let machine = StateMachine::new()
            .state(
                START,
                Probe::new("start", &log)
                    .completes_after(1, Transition::with_params("scored", json!(12)))
                    .boxed(),
            )
            .state(
                "bonus",
                StateEntry::factory(move |params, machine| {
                    record
                        .borrow_mut()
                        .push((params.clone(), machine.visited_states().to_vec()));
                    Block::new().boxed()
                }),
            )
            .state("normal", Block::new().boxed())
            .transitions(TransitionTable::new().rule(
                START,
                TransitionRule::resolver(|ctx| {
                    let points = ctx.transition.params.as_u64().unwrap_or(0);
                    Ok(if points > 10 {
                        NextState::with_params("bonus", json!({ "multiplier": 2 }))
                    } else {
                        NextState::new("normal")
                    })
                }),
            ));
        let sink = Rc::clone(&changes);
        machine.events().subscribe(
            STATE_CHANGE_EVENT,
            Rc::new(move |args: &[Value]| sink.borrow_mut().push(args.to_vec())),
        );

        let mut machine = Entity::new(machine);
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.update(&frame).unwrap();

        assert_eq!(machine.behavior().state_name(), Some("bonus"));
        assert_eq!(machine.behavior().state_params(), Some(&json!({ "multiplier": 2 })));
        assert_eq!(
            *built_with.borrow(),
            vec![(json!({ "multiplier": 2 }), vec!["bonus".to_string()])]
        );
        let changes = changes.borrow();
        assert_eq!(changes.len(), 2, "initial entry also notifies");
        assert_eq!(changes[0], vec![json!(START), Value::Null, Value::Null, Value::Null]);
        assert_eq!(
            changes[1],
            vec![json!("bonus"), json!({ "multiplier": 2 }), json!(START), Value::Null]
        );
    }

    #[test]
    fn test_literal_rule_passes_params_through() {
        let log = journal();
        let mut machine = Entity::new(
            StateMachine::new()
                .state(
                    START,
                    Probe::new("start", &log)
                        .completes_after(1, Transition::with_params("any", json!("carried")))
                        .boxed(),
                )
                .state("next", Block::new().boxed())
                .transitions(TransitionTable::new().rule(START, "next")),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.update(&frame).unwrap();
        assert_eq!(machine.behavior().state_params(), Some(&json!("carried")));
    }

    #[test]
    fn test_custom_start_and_endings() {
        let mut machine = Entity::new(
            StateMachine::new()
                .state("intro", Block::new().boxed())
                .starting_state_fn(|| NextState::with_params("intro", json!(1)))
                .ending_states(["won", "lost"]),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        assert_eq!(machine.behavior().state_name(), Some("intro"));
        assert_eq!(machine.behavior().state_params(), Some(&json!(1)));

        machine.change_state("lost", json!({ "reason": "timeout" })).unwrap();
        assert_eq!(
            machine.requested_transition(),
            Some(&Transition::with_params("lost", json!({ "reason": "timeout" })))
        );
        assert_eq!(machine.behavior().visited_states(), ["lost"]);
        assert!(machine.behavior().active_entity().is_none());
    }

    #[test]
    fn test_change_state_after_completion_is_violation() {
        let mut machine = Entity::new(
            StateMachine::new()
                .state("intro", Block::new().boxed())
                .starting_state("intro", Value::Null),
        );
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.change_state(END, Value::Null).unwrap();
        assert_eq!(machine.requested_transition(), Some(&Transition::new(END)));

        assert!(matches!(
            machine.change_state("intro", Value::Null),
            Err(EntityError::ContractViolation {
                violation: Violation::AlreadyCompleted,
                ..
            })
        ));
        assert!(machine.behavior().active_entity().is_none());
        assert_eq!(machine.requested_transition(), Some(&Transition::new(END)));
        assert_eq!(machine.behavior().visited_states(), ["end"]);
    }

    #[test]
    fn test_teardown_unwinds_active_state() {
        let log = journal();
        let mut machine = Entity::new(level_machine(&log));
        let frame = frame();
        machine.setup(&frame, &config()).unwrap();
        machine.on_signal(&frame, "pause", &Value::Null).unwrap();
        machine.teardown(&frame).unwrap();
        assert_eq!(
            entries(&log),
            vec!["start:setup", "start:signal:pause", "start:teardown"]
        );
        assert!(machine.behavior().active_entity().is_none());
    }
}

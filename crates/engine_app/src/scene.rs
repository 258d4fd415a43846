//! Demo scene: a small level flow built from every composite.
//!
//! ```text
//! loading ──► play ──cleared/timeout──► results ──► end
//!               └──────────quit──────────────────► end
//! ```
//!
//! `play` races three outcomes: collecting every coin (plus a bonus check),
//! running out of time, and a `quit` event on the capability bus.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::info;

use engine_entity::state_machine::{END, STATE_CHANGE_EVENT};
use engine_entity::transition::DONE;
use engine_entity::{
    Alternative, AlternativeOption, Behavior, BoxedEntity, ChildConfig, Decision, DeflatingCompositeEntity,
    EntitySequence, EventBus, EventSource, FunctionCall, FunctionalEntity, NextState, ParallelEntity, StateEntry,
    StateMachine, SwitchingEntity, Transition, TransitionRule, TransitionTable, Wait, WaitForEvent,
};

/// Event on the capability bus that abandons the level.
pub const QUIT_EVENT: &str = "quit";

/// Milliseconds allowed to collect every coin.
pub const DEFAULT_TIME_LIMIT: f64 = 3000.0;

const LOAD_MS: f64 = 500.0;
const COIN_DELAYS: [f64; 3] = [400.0, 900.0, 1500.0];
const BONUS_MS: f64 = 300.0;
const RESULTS_MS: f64 = 1000.0;

/// Builds the scene's root state machine. `events` is the bus a `quit`
/// event is expected on.
pub fn build(events: &EventBus, time_limit: f64) -> BoxedEntity {
    let bus = events.clone();
    let machine = StateMachine::new()
        .state("loading", loading().boxed())
        .state("play", StateEntry::factory(move |_, _| play(&bus, time_limit)))
        .state("results", StateEntry::factory(|params, _| results(params)))
        .starting_state("loading", Value::Null)
        .transitions(
            TransitionTable::new()
                .rule("loading", "play")
                .rule(
                    "play",
                    TransitionRule::from_map([
                        ("cleared", NextState::with_params("results", json!({ "won": true }))),
                        ("timeout", NextState::with_params("results", json!({ "won": false }))),
                        (QUIT_EVENT, NextState::new(END)),
                    ]),
                )
                .rule("results", END),
        );

    machine.events().subscribe(
        STATE_CHANGE_EVENT,
        Rc::new(|args: &[Value]| {
            if let [to, params, from, _] = args {
                info!(%to, %from, %params, "scene state changed");
            }
        }),
    );

    machine.boxed()
}

fn loading() -> EntitySequence {
    EntitySequence::with_children([
        FunctionCall::new(|config| {
            let level: String = config.get_as("level")?.unwrap_or_else(|| "default".to_string());
            info!(%level, surface = %config.surface(), "loading level");
            Ok(())
        })
        .boxed(),
        Wait::new(LOAD_MS).boxed(),
    ])
}

fn play(events: &EventBus, time_limit: f64) -> BoxedEntity {
    let coins = DeflatingCompositeEntity::with_children(COIN_DELAYS.iter().map(|&delay| Wait::new(delay).boxed()));
    let bonus = EntitySequence::with_children([Wait::new(BONUS_MS).boxed(), Decision::new(|| true).boxed()]);
    let cleared = ParallelEntity::with_children([coins.boxed(), bonus.boxed()]).auto_transition(true);

    Alternative::new([
        AlternativeOption::new(cleared.boxed()).labelled("cleared"),
        AlternativeOption::new(Wait::new(time_limit).boxed()).labelled("timeout"),
        AlternativeOption::new(WaitForEvent::new(Rc::new(events.clone()), QUIT_EVENT).boxed()).labelled(QUIT_EVENT),
    ])
    .boxed()
}

fn results(params: &Value) -> BoxedEntity {
    let won = params.get("won").and_then(Value::as_bool).unwrap_or(false);
    let banners = SwitchingEntity::with_children([
        FunctionCall::new(|_| {
            info!("level cleared");
            Ok(())
        })
        .boxed(),
        FunctionCall::new(|_| {
            info!("level failed");
            Ok(())
        })
        .boxed(),
    ])
    .starting_index(usize::from(!won));

    let shown_at = Rc::new(Cell::new(0.0));
    let outcome = params.clone();
    FunctionalEntity::new()
        .child(banners.boxed(), ChildConfig::Inherit)
        .with_setup({
            let shown_at = Rc::clone(&shown_at);
            move |_, frame, _| {
                shown_at.set(frame.play_time);
                Ok(())
            }
        })
        .with_transition(move |frame| {
            (frame.play_time - shown_at.get() >= RESULTS_MS).then(|| Transition::with_params(DONE, outcome.clone()))
        })
        .boxed()
}

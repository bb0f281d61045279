//! # State Module
//!
//! A [`State`] is a snapshot of the planning world: the set of atomic facts
//! that currently hold plus a metrics table mapping each object identity to
//! its numeric attributes (supply, demand, trips taken, ...).
//!
//! States are values. Applying an action produces a fresh state and never
//! touches its predecessor. For plan reconstruction each state records the
//! handle of the state it was generated from and the handle of the grounded
//! action that generated it; the states themselves live in a [`StateArena`].
//!
//! ```
//! use rideplan::{State, StateArena};
//!
//! let mut start = State::default();
//! start.set_metric("Market", "demand", 20);
//! assert!(!start.is_goal());
//!
//! let mut arena = StateArena::new();
//! let root = arena.insert(start);
//! assert!(arena.enumerate_plan(root).is_empty());
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{DEMAND, NUMBER_TRIPS, SUPPLY};
use crate::entity::{AtomicSentence, SentenceKey};
use crate::{PlanError, Result};

/// Object identity -> attribute name -> value.
pub type Metrics = BTreeMap<String, BTreeMap<String, i64>>;

/// Handle of a state inside a [`StateArena`].
pub type StateId = usize;

/// Index of a grounded action in the catalogue a search runs over.
pub type ActionId = usize;

/// Hashable, order-independent form of a state used by the visited-state guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    facts: Vec<SentenceKey>,
    metrics: Vec<(String, String, i64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct State {
    facts: Vec<AtomicSentence>,
    metrics: Metrics,
    #[serde(skip)]
    parent: Option<StateId>,
    #[serde(skip)]
    action: Option<ActionId>,
}

impl State {
    pub fn new(facts: Vec<AtomicSentence>, metrics: Metrics) -> Self {
        Self {
            facts,
            metrics,
            parent: None,
            action: None,
        }
    }

    /// Records which state and action this state was generated from.
    pub fn with_origin(mut self, parent: StateId, action: ActionId) -> Self {
        self.parent = Some(parent);
        self.action = Some(action);
        self
    }

    pub fn facts(&self) -> &[AtomicSentence] {
        &self.facts
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn action(&self) -> Option<ActionId> {
        self.action
    }

    /// True if a fact equal to `sentence` holds in this state.
    pub fn holds(&self, sentence: &AtomicSentence) -> bool {
        self.facts.iter().any(|f| f == sentence)
    }

    /// Adds a fact unless an equal one already holds.
    pub fn assert_fact(&mut self, sentence: AtomicSentence) {
        if !self.holds(&sentence) {
            self.facts.push(sentence);
        }
    }

    /// Looks up `metrics[object][attribute]`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::MissingMetricKey` if either key is absent. Missing
    /// metrics are never treated as zero.
    pub fn metric(&self, object: &str, attribute: &str) -> Result<i64> {
        self.metrics
            .get(object)
            .and_then(|attrs| attrs.get(attribute))
            .copied()
            .ok_or_else(|| PlanError::missing_metric(object, attribute))
    }

    pub fn set_metric(&mut self, object: impl Into<String>, attribute: impl Into<String>, value: i64) {
        self.metrics
            .entry(object.into())
            .or_default()
            .insert(attribute.into(), value);
    }

    /// Sum of `attribute` over every object that carries it.
    pub fn total(&self, attribute: &str) -> i64 {
        self.metrics
            .values()
            .filter_map(|attrs| attrs.get(attribute))
            .sum()
    }

    pub fn outstanding_demand(&self) -> i64 {
        self.total(DEMAND)
    }

    pub fn outstanding_supply(&self) -> i64 {
        self.total(SUPPLY)
    }

    pub fn number_of_trips(&self) -> i64 {
        self.total(NUMBER_TRIPS)
    }

    /// Goal test: the summed demand across all objects is exactly zero.
    ///
    /// Outstanding supply is not considered, so a goal state may
    /// still hold undelivered supply.
    pub fn is_goal(&self) -> bool {
        self.outstanding_demand() == 0
    }

    pub fn key(&self) -> StateKey {
        let mut facts: Vec<SentenceKey> = self.facts.iter().map(AtomicSentence::key).collect();
        facts.sort();
        facts.dedup();
        let metrics = self
            .metrics
            .iter()
            .flat_map(|(object, attrs)| {
                attrs
                    .iter()
                    .map(move |(attr, value)| (object.clone(), attr.clone(), *value))
            })
            .collect();
        StateKey { facts, metrics }
    }
}

impl std::ops::Index<StateId> for StateArena {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id]
    }
}

/// Owns every state generated during a search run.
///
/// States refer to their predecessors by [`StateId`], so the back-links form
/// a tree rooted at the initial state without any shared ownership.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<State>,
}

impl StateArena {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn insert(&mut self, state: State) -> StateId {
        self.states.push(state);
        self.states.len() - 1
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Walks the predecessor chain from `id` back to the root and returns the
    /// applied actions in the order they were applied.
    pub fn enumerate_plan(&self, id: StateId) -> Vec<ActionId> {
        let mut actions = Vec::new();
        let mut current = self.states.get(id);

        while let Some(state) = current {
            match (state.parent, state.action) {
                (Some(parent), Some(action)) => {
                    actions.push(action);
                    current = self.states.get(parent);
                }
                _ => break,
            }
        }

        actions.reverse();
        actions
    }
}

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use crate::state::{ActionId, StateArena, StateId, StateKey};
use crate::{Action, Result, State};

/// A trait for heuristic functions used to order the frontier.
///
/// Lower values are expanded first. Values must be non-negative.
pub trait Heuristic: Send + Sync {
    fn evaluate(&self, state: &State) -> f64;
}

/// Default heuristic: the sum of the squares of outstanding demand,
/// outstanding supply and the global trip count.
///
/// This is a greedy guide, not a lower bound on plan length. It pulls the
/// search toward states with less unmet demand and supply and fewer trips,
/// and its scale grows with the size of the problem.
///
/// ```
/// use rideplan::{DemandSupplyHeuristic, Heuristic, State};
///
/// let mut state = State::default();
/// state.set_metric("A", "supply", 3);
/// state.set_metric("B", "demand", 4);
/// state.set_metric("The World", "number-trips", 1);
/// assert_eq!(DemandSupplyHeuristic.evaluate(&state), 26.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandSupplyHeuristic;

impl Heuristic for DemandSupplyHeuristic {
    fn evaluate(&self, state: &State) -> f64 {
        let demand = state.outstanding_demand() as f64;
        let supply = state.outstanding_supply() as f64;
        let trips = state.number_of_trips() as f64;
        demand * demand + supply * supply + trips * trips
    }
}

/// Zero heuristic; the frontier degenerates to insertion (FIFO) order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn evaluate(&self, _state: &State) -> f64 {
        0.0
    }
}

/// Frontier entry: ordered by priority, then by insertion sequence.
#[derive(Debug, Clone)]
struct FrontierEntry {
    priority: f64,
    seq: u64,
    id: StateId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Manages the state of one search run: the arena of generated states, the
/// frontier of handles, and the optional visited-state guard.
pub(crate) struct SearchContext<'h> {
    arena: StateArena,
    frontier: BinaryHeap<Reverse<FrontierEntry>>,
    visited: Option<HashSet<StateKey>>,
    heuristic: &'h dyn Heuristic,
    next_seq: u64,
}

impl<'h> SearchContext<'h> {
    /// Creates a context whose frontier holds only `initial`.
    pub(crate) fn new(initial: State, heuristic: &'h dyn Heuristic, deduplicate: bool) -> Self {
        let mut context = Self {
            arena: StateArena::new(),
            frontier: BinaryHeap::new(),
            visited: deduplicate.then(HashSet::new),
            heuristic,
            next_seq: 0,
        };
        context.push(initial);
        context
    }

    fn push(&mut self, state: State) -> StateId {
        let priority = self.heuristic.evaluate(&state);
        let id = self.arena.insert(state);
        self.frontier.push(Reverse(FrontierEntry {
            priority,
            seq: self.next_seq,
            id,
        }));
        self.next_seq += 1;
        id
    }

    /// Pops the lowest-priority state, skipping already expanded states when
    /// the visited guard is on.
    pub(crate) fn next_state(&mut self) -> Option<StateId> {
        while let Some(Reverse(entry)) = self.frontier.pop() {
            let Some(visited) = self.visited.as_mut() else {
                return Some(entry.id);
            };
            let key = self.arena.get(entry.id).map(State::key);
            if let Some(key) = key {
                if visited.insert(key) {
                    return Some(entry.id);
                }
            }
        }
        None
    }

    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.arena[id]
    }

    /// Indices of the grounded actions applicable in `state`.
    pub(crate) fn applicable_actions(actions: &[Action], state: &State) -> Result<Vec<ActionId>> {
        let mut applicable = Vec::new();
        for (id, action) in actions.iter().enumerate() {
            if action.is_applicable(state)? {
                applicable.push(id);
            }
        }
        Ok(applicable)
    }

    /// Applies `actions[action_id]` to the state `parent` and pushes the
    /// successor onto the frontier.
    pub(crate) fn generate_successor(
        &mut self,
        parent: StateId,
        actions: &[Action],
        action_id: ActionId,
    ) -> Result<StateId> {
        let successor = actions[action_id]
            .act_on(self.state(parent))?
            .with_origin(parent, action_id);
        Ok(self.push(successor))
    }

    pub(crate) fn reconstruct_plan(&self, goal: StateId) -> Vec<ActionId> {
        self.arena.enumerate_plan(goal)
    }

    pub(crate) fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub(crate) fn states_generated(&self) -> usize {
        self.arena.len()
    }
}

//! # Planner Module
//!
//! The planner drives a best-first forward search from an initial [`State`]
//! over a catalogue of grounded [`Action`]s:
//!
//! 1. Pop the state with the lowest heuristic value from the frontier
//! 2. If it is a goal state, collect it (goal states are not expanded)
//! 3. Otherwise find every applicable action and push the successors, either
//!    all of them or a uniform sample drawn with replacement
//!
//! The run stops once enough goal states are collected, the frontier runs
//! dry, the iteration cap or deadline is reached, or the cancellation flag is
//! raised. Running out of frontier is not an error: the outcome carries
//! whatever plans were found and a [`SearchStatus`] saying why it stopped.
//!
//! ## Basic Usage
//!
//! ```
//! use rideplan::{ExpansionMode, Planner, PlannerConfig, ProblemDescription};
//!
//! let description = ProblemDescription::from_json(r#"{
//!     "persons":   [{ "name": "Ada", "home": "Depot", "car": "Van" }],
//!     "locations": [{ "name": "Depot", "supply": 100 },
//!                   { "name": "Market", "demand": 100 }],
//!     "cars":      [{ "name": "Van", "capacity": 100, "at": "Depot" }]
//! }"#).unwrap();
//!
//! let config = PlannerConfig::new().with_expansion(ExpansionMode::Exhaustive);
//! let planner = Planner::from_problem(&description.build().unwrap(), config).unwrap();
//!
//! let outcome = planner.run().unwrap();
//! let plan = outcome.first_plan().unwrap();
//! assert_eq!(plan.action_names(), ["Load", "Drive", "Unload"]);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ExpansionMode, PlannerConfig};
use crate::domain::ride_share_schemas;
use crate::grounder::{build_grounded_actions, par_build_grounded_actions};
use crate::plan::Plan;
use crate::problem::Problem;
use crate::search::{DemandSupplyHeuristic, Heuristic, SearchContext};
use crate::state::StateId;
use crate::{Action, PlanError, Result, State};

/// Why a search run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// The requested number of plans or iterations was reached.
    Complete,
    /// The frontier emptied first.
    Exhausted,
    Cancelled,
    DeadlineExceeded,
    /// `max_iterations` was reached first.
    IterationLimit,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchStatus::Complete => "complete",
            SearchStatus::Exhausted => "exhausted",
            SearchStatus::Cancelled => "cancelled",
            SearchStatus::DeadlineExceeded => "deadline exceeded",
            SearchStatus::IterationLimit => "iteration limit",
        };
        write!(f, "{}", label)
    }
}

/// Result of a search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Plans in the order their goal states were popped, or the down-sampled
    /// selection when an output sample was requested.
    pub plans: Vec<Plan>,
    pub status: SearchStatus,
    /// Pop/expand cycles performed.
    pub iterations: u64,
    pub states_generated: usize,
    pub frontier_len: usize,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == SearchStatus::Complete
    }

    /// # Errors
    ///
    /// Returns `PlanError::NoPlanFound` when the run collected no plan.
    pub fn first_plan(&self) -> Result<&Plan> {
        self.plans.first().ok_or(PlanError::NoPlanFound)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What ends a run besides the frontier, the deadline and cancellation.
#[derive(Debug, Clone, Copy)]
enum Budget {
    Plans(usize),
    Iterations(u64),
}

/// Best-first planner over a fixed catalogue of grounded actions.
///
/// The catalogue and the initial state are immutable once the planner is
/// built; every call to [`Planner::execute`] runs an independent search.
pub struct Planner {
    actions: Vec<Action>,
    initial: State,
    config: PlannerConfig,
    heuristic: Box<dyn Heuristic>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Planner {
    /// Creates a planner with the default configuration and the
    /// [`DemandSupplyHeuristic`].
    pub fn new(actions: Vec<Action>, initial: State) -> Self {
        Self {
            actions,
            initial,
            config: PlannerConfig::default(),
            heuristic: Box::new(DemandSupplyHeuristic),
            cancel: None,
        }
    }

    /// Grounds the ride-share schemas against `problem` and builds a planner
    /// starting from its initial state.
    pub fn from_problem(problem: &Problem, config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        let schemas = ride_share_schemas();
        let actions = if config.parallel_grounding {
            par_build_grounded_actions(&schemas, &problem.objects)?
        } else {
            build_grounded_actions(&schemas, &problem.objects)?
        };
        Ok(Self::new(actions, problem.initial_state.clone()).with_config(config))
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_heuristic(mut self, heuristic: impl Heuristic + 'static) -> Self {
        self.heuristic = Box::new(heuristic);
        self
    }

    /// Registers a flag that stops the search when set; checked once per
    /// pop/expand cycle.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs with the configured plan count and output sample.
    pub fn run(&self) -> Result<SearchOutcome> {
        self.execute(self.config.plans_to_find, self.config.output_sample)
    }

    /// Searches until `plans_to_find` goal states are collected.
    ///
    /// When `sample` is given, the collected plans are down-sampled to that
    /// many, drawn uniformly with replacement.
    ///
    /// # Errors
    ///
    /// * `PlanError::InvalidConfig` if `sample` is `Some(0)`
    /// * `PlanError::MissingMetricKey` if an action touches a metric the
    ///   initial state never defined
    pub fn execute(&self, plans_to_find: usize, sample: Option<usize>) -> Result<SearchOutcome> {
        if sample == Some(0) {
            return Err(PlanError::InvalidConfig(
                "output sample must be at least 1".to_string(),
            ));
        }
        self.search(Budget::Plans(plans_to_find), sample)
    }

    /// Runs exactly `iterations` pop/expand cycles (fewer if the frontier
    /// empties), collecting every goal state popped along the way.
    pub fn execute_iterate(&self, iterations: u64) -> Result<SearchOutcome> {
        self.search(Budget::Iterations(iterations), None)
    }

    fn rng(&self) -> StdRng {
        match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn search(&self, budget: Budget, sample: Option<usize>) -> Result<SearchOutcome> {
        let started = Instant::now();
        let deadline = self
            .config
            .time_limit()
            .and_then(|limit| started.checked_add(limit));
        let mut rng = self.rng();
        let mut context = SearchContext::new(
            self.initial.clone(),
            self.heuristic.as_ref(),
            self.config.deduplicate_states,
        );
        let mut goals: Vec<StateId> = Vec::new();
        let mut iterations: u64 = 0;

        let status = loop {
            match budget {
                Budget::Plans(wanted) if goals.len() >= wanted => break SearchStatus::Complete,
                Budget::Iterations(wanted) if iterations >= wanted => {
                    break SearchStatus::Complete
                }
                _ => {}
            }
            if self.is_cancelled() {
                break SearchStatus::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break SearchStatus::DeadlineExceeded;
            }
            if self.config.max_iterations.is_some_and(|max| iterations >= max) {
                break SearchStatus::IterationLimit;
            }

            let Some(id) = context.next_state() else {
                break SearchStatus::Exhausted;
            };
            iterations += 1;

            if context.state(id).is_goal() {
                log::debug!(
                    "Goal state {} found after {} iterations",
                    id,
                    iterations
                );
                goals.push(id);
                continue;
            }
            self.expand(&mut context, id, &mut rng)?;
        };

        let selected = match sample {
            Some(k) if !goals.is_empty() => (0..k)
                .map(|_| goals[rng.random_range(0..goals.len())])
                .collect(),
            _ => goals,
        };
        let plans: Vec<Plan> = selected
            .iter()
            .map(|&goal| {
                Plan::from_trace(
                    &self.actions,
                    &context.reconstruct_plan(goal),
                    context.state(goal),
                )
            })
            .collect::<Result<_>>()?;

        log::info!(
            "Search {} after {} iterations in {:?}: {} plans, {} states generated",
            status,
            iterations,
            started.elapsed(),
            plans.len(),
            context.states_generated()
        );

        Ok(SearchOutcome {
            plans,
            status,
            iterations,
            states_generated: context.states_generated(),
            frontier_len: context.frontier_len(),
        })
    }

    fn expand(&self, context: &mut SearchContext<'_>, id: StateId, rng: &mut StdRng) -> Result<()> {
        let applicable = SearchContext::applicable_actions(&self.actions, context.state(id))?;
        log::trace!("Expanding state {}: {} applicable actions", id, applicable.len());
        if applicable.is_empty() {
            return Ok(());
        }

        match self.config.expansion {
            ExpansionMode::Exhaustive => {
                for action in applicable {
                    context.generate_successor(id, &self.actions, action)?;
                }
            }
            ExpansionMode::Sample(k) => {
                for _ in 0..k {
                    let action = applicable[rng.random_range(0..applicable.len())];
                    context.generate_successor(id, &self.actions, action)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Comparison;
    use crate::entity::{AtomicSentence, Variable, WorldObject};
    use crate::search::ZeroHeuristic;
    use crate::state::Metrics;
    use crate::Delta;

    /// A counter that can only go down, one or two at a time.
    fn countdown(start: i64) -> (Vec<Action>, State) {
        let tick = WorldObject::new("Clock", "timer");
        let schema = |name: &str, step: i64| {
            Action::new(name, vec![Variable::new("timer", "timer")])
                .requires_metric("timer", "demand", Comparison::Gte, step)
                .adjusts("timer", "demand", Delta::Constant(-step))
        };
        let actions = vec![
            schema("One", 1).bind(&[&tick]).unwrap(),
            schema("Two", 2).bind(&[&tick]).unwrap(),
        ];
        let mut state = State::new(Vec::new(), Metrics::new());
        state.set_metric("Clock", "demand", start);
        (actions, state)
    }

    fn exhaustive() -> PlannerConfig {
        PlannerConfig::new().with_expansion(ExpansionMode::Exhaustive)
    }

    #[test]
    fn test_plan_reaches_goal() {
        let (actions, initial) = countdown(4);
        let planner = Planner::new(actions, initial).with_config(exhaustive());
        let outcome = planner.execute(1, None).unwrap();

        assert_eq!(outcome.status, SearchStatus::Complete);
        let plan = outcome.first_plan().unwrap();
        assert_eq!(plan.final_metrics["Clock"]["demand"], 0);
        assert_eq!(plan.action_names(), ["Two", "Two"]);
    }

    #[test]
    fn test_initial_goal_yields_empty_plan() {
        let (actions, initial) = countdown(0);
        let planner = Planner::new(actions, initial).with_config(exhaustive());
        let outcome = planner.execute(1, None).unwrap();
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.first_plan().unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_frontier_is_not_an_error() {
        let (actions, mut initial) = countdown(3);
        initial.set_metric("Elsewhere", "demand", 1);
        let planner = Planner::new(actions, initial).with_config(exhaustive());
        let outcome = planner.execute(1, None).unwrap();

        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert!(outcome.plans.is_empty());
        assert_eq!(outcome.frontier_len, 0);
        assert!(matches!(outcome.first_plan(), Err(PlanError::NoPlanFound)));
    }

    #[test]
    fn test_collects_several_plans() {
        let (actions, initial) = countdown(3);
        let planner = Planner::new(actions, initial).with_config(exhaustive());
        let outcome = planner.execute(3, None).unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.plans.len(), 3);
        for plan in &outcome.plans {
            assert_eq!(plan.final_metrics["Clock"]["demand"], 0);
        }
    }

    #[test]
    fn test_sampling_pushes_exactly_k_successors() {
        let (actions, initial) = countdown(10);
        let config = PlannerConfig::new()
            .with_expansion(ExpansionMode::Sample(5))
            .with_seed(11);
        let planner = Planner::new(actions, initial).with_config(config);
        let outcome = planner.execute_iterate(1).unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.states_generated, 1 + 5);
        assert_eq!(outcome.frontier_len, 5);
    }

    #[test]
    fn test_sampling_draws_k_when_more_actions_apply() {
        let tick = WorldObject::new("Clock", "timer");
        let actions: Vec<Action> = [1, 2, 3]
            .iter()
            .map(|&step| {
                Action::new(format!("Step{}", step), vec![Variable::new("timer", "timer")])
                    .requires_metric("timer", "demand", Comparison::Gte, step)
                    .adjusts("timer", "demand", Delta::Constant(-step))
                    .bind(&[&tick])
                    .unwrap()
            })
            .collect();
        let mut initial = State::new(Vec::new(), Metrics::new());
        initial.set_metric("Clock", "demand", 10);
        assert!(actions.iter().all(|a| a.is_applicable(&initial).unwrap()));

        let config = PlannerConfig::new()
            .with_expansion(ExpansionMode::Sample(2))
            .with_seed(3);
        let planner = Planner::new(actions, initial).with_config(config);
        let outcome = planner.execute_iterate(1).unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.states_generated, 1 + 2);
        assert_eq!(outcome.frontier_len, 2);
    }

    #[test]
    fn test_exhaustive_pushes_every_applicable_action() {
        let (actions, initial) = countdown(10);
        let planner = Planner::new(actions, initial).with_config(exhaustive());
        let outcome = planner.execute_iterate(1).unwrap();
        assert_eq!(outcome.states_generated, 1 + 2);
    }

    #[test]
    fn test_same_seed_same_plans() {
        let (actions, initial) = countdown(9);
        let config = PlannerConfig::new()
            .with_expansion(ExpansionMode::Sample(2))
            .with_seed(3);
        let planner = Planner::new(actions, initial).with_config(config);
        let first = planner.execute(2, Some(4)).unwrap();
        let second = planner.execute(2, Some(4)).unwrap();
        assert_eq!(first.plans, second.plans);
        assert_eq!(first.plans.len(), 4);
    }

    #[test]
    fn test_output_sample_zero_is_rejected() {
        let (actions, initial) = countdown(1);
        let planner = Planner::new(actions, initial);
        assert!(matches!(
            planner.execute(1, Some(0)),
            Err(PlanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_iterate_runs_past_goals() {
        let (actions, initial) = countdown(2);
        let planner = Planner::new(actions, initial)
            .with_config(exhaustive())
            .with_heuristic(ZeroHeuristic);
        // 2 -> {1, 0}; 1 -> {0}; two goals in total.
        let outcome = planner.execute_iterate(100).unwrap();
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.plans.len(), 2);
    }

    #[test]
    fn test_iteration_limit() {
        let (actions, mut initial) = countdown(50);
        initial.set_metric("Elsewhere", "demand", 1);
        let config = exhaustive().with_max_iterations(7);
        let outcome = Planner::new(actions, initial)
            .with_config(config)
            .execute(1, None)
            .unwrap();
        assert_eq!(outcome.status, SearchStatus::IterationLimit);
        assert_eq!(outcome.iterations, 7);
    }

    #[test]
    fn test_cancelled_before_first_pop() {
        let (actions, initial) = countdown(5);
        let flag = Arc::new(AtomicBool::new(true));
        let outcome = Planner::new(actions, initial)
            .with_cancellation(flag)
            .execute(1, None)
            .unwrap();
        assert_eq!(outcome.status, SearchStatus::Cancelled);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_zero_deadline() {
        let (actions, initial) = countdown(5);
        let config = exhaustive().with_time_limit(std::time::Duration::ZERO);
        let outcome = Planner::new(actions, initial)
            .with_config(config)
            .execute(1, None)
            .unwrap();
        assert_eq!(outcome.status, SearchStatus::DeadlineExceeded);
    }

    #[test]
    fn test_missing_metric_propagates() {
        let clock = WorldObject::new("Clock", "timer");
        let action = Action::new("Tick", vec![Variable::new("timer", "timer")])
            .requires_metric("timer", "fuel", Comparison::Gt, 0)
            .bind(&[&clock])
            .unwrap();
        let mut initial = State::default();
        initial.set_metric("Clock", "demand", 1);
        let result = Planner::new(vec![action], initial).execute(1, None);
        assert!(matches!(result, Err(PlanError::MissingMetricKey { .. })));
    }

    #[test]
    fn test_deduplication_bounds_cycles() {
        // Toggle flips a fact back and forth and never reaches the goal.
        let lamp = WorldObject::new("Lamp", "switch");
        let on = Action::new("On", vec![Variable::new("s", "switch")])
            .forbids("lit", &["s"])
            .adds("lit", &["s"])
            .bind(&[&lamp])
            .unwrap();
        let off = Action::new("Off", vec![Variable::new("s", "switch")])
            .requires("lit", &["s"])
            .deletes("lit", &["s"])
            .bind(&[&lamp])
            .unwrap();
        let mut initial = State::new(Vec::<AtomicSentence>::new(), Metrics::new());
        initial.set_metric("Lamp", "demand", 1);

        let config = exhaustive().with_deduplication(true);
        let outcome = Planner::new(vec![on, off], initial)
            .with_config(config)
            .execute(1, None)
            .unwrap();
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.iterations, 2);
    }
}

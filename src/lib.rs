mod action;
mod config;
pub mod domain;
mod entity;
mod error;
mod grounder;
mod plan;
mod planner;
mod problem;
mod search;
mod state;
mod visualizer;

pub use action::{Action, Comparison, Delta, Effects, MetricCondition, MetricEffect, Preconditions};
pub use config::{ExpansionMode, PlannerConfig, DEFAULT_EXPANSION_SAMPLE};
pub use entity::{AtomicSentence, AttributeValue, Attributes, Binding, Variable, WorldObject};
pub use error::{PlanError, Result};
pub use grounder::{build_grounded_actions, ground_action, par_build_grounded_actions};
pub use plan::{Plan, PlanArgument, PlanStep};
pub use planner::{Planner, SearchOutcome, SearchStatus};
pub use problem::{
    build_initial_state, build_world_objects, CarSpec, LocationSpec, PersonSpec, Problem,
    ProblemDescription,
};
pub use search::{DemandSupplyHeuristic, Heuristic, ZeroHeuristic};
pub use state::{ActionId, Metrics, State, StateArena, StateId, StateKey};
pub use visualizer::PlanVisualizer;

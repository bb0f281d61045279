//! # Plan Module
//!
//! A [`Plan`] is the output of a search: the ordered grounded actions that
//! lead from the initial state to a goal state, together with the metrics
//! table of that goal state.
//!
//! Plans are plain data. They serialize to JSON for response formatting and
//! expose the trip statistics used to compare alternative plans.

use serde::Serialize;
use std::fmt;

use crate::domain::{NUMBER_TRIPS, TRIPS_TAKEN};
use crate::state::{ActionId, Metrics};
use crate::{Action, PlanError, Result, State};

/// One bound argument of a plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanArgument {
    pub parameter: String,
    pub kind: String,
    pub value: String,
}

/// A grounded action as it appears in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub action: String,
    pub arguments: Vec<PlanArgument>,
}

impl PlanStep {
    pub fn from_action(action: &Action) -> Self {
        Self {
            action: action.name.clone(),
            arguments: action
                .parameters
                .iter()
                .map(|p| PlanArgument {
                    parameter: p.name.clone(),
                    kind: p.kind.clone(),
                    value: p.label().to_string(),
                })
                .collect(),
        }
    }

    /// Bound value of the named parameter.
    pub fn argument(&self, parameter: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.parameter == parameter)
            .map(|a| a.value.as_str())
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<&str> = self.arguments.iter().map(|a| a.value.as_str()).collect();
        write!(f, "{}({})", self.action, values.join(", "))
    }
}

/// An ordered sequence of grounded actions reaching a goal state.
///
/// ```
/// use rideplan::{Plan, State};
///
/// let mut goal = State::default();
/// goal.set_metric("The World", "number-trips", 4);
/// goal.set_metric("Ada", "trips-taken", 2);
/// goal.set_metric("Bo", "trips-taken", 2);
///
/// let plan = Plan::new(Vec::new(), &goal);
/// assert_eq!(plan.total_trips(), 4);
/// assert_eq!(plan.trip_entropy(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub final_metrics: Metrics,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>, goal: &State) -> Self {
        Self {
            steps,
            final_metrics: goal.metrics().clone(),
        }
    }

    /// Builds a plan from action handles into the catalogue `actions`.
    pub(crate) fn from_trace(actions: &[Action], trace: &[ActionId], goal: &State) -> Result<Self> {
        let steps = trace
            .iter()
            .map(|&id| {
                actions
                    .get(id)
                    .map(PlanStep::from_action)
                    .ok_or(PlanError::UnknownAction(id))
            })
            .collect::<Result<_>>()?;
        Ok(Self::new(steps, goal))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the actions in order.
    pub fn action_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.action.as_str()).collect()
    }

    /// Global trip counter at the goal.
    pub fn total_trips(&self) -> i64 {
        self.final_metrics
            .values()
            .filter_map(|attrs| attrs.get(NUMBER_TRIPS))
            .sum()
    }

    /// Shannon entropy (base 2) of how the trips are spread over persons.
    ///
    /// Each person's `trips-taken` is divided by the total over all persons.
    /// A plan without trips has entropy 0; a plan whose trips are spread
    /// evenly over `n` persons has entropy `log2(n)`.
    pub fn trip_entropy(&self) -> f64 {
        let per_person: Vec<i64> = self
            .final_metrics
            .values()
            .filter_map(|attrs| attrs.get(TRIPS_TAKEN).copied())
            .filter(|&trips| trips > 0)
            .collect();
        let total: i64 = per_person.iter().sum();
        if total == 0 {
            return 0.0;
        }

        let total = total as f64;
        let entropy: f64 = per_person
            .iter()
            .map(|&trips| {
                let p = trips as f64 / total;
                -p * p.log2()
            })
            .sum();
        // A single traveller gives -1 * log2(1) = -0.0.
        entropy.abs()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, step)?;
        }
        Ok(())
    }
}

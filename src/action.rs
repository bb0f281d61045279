//! # Action Module
//!
//! Parameterized STRIPS-style actions with numeric side conditions.
//!
//! The same [`Action`] type describes both a *schema* (formal parameters are
//! unbound [`Variable`]s) and a *grounded instance* (every parameter bound to
//! a world object). An action has:
//!
//! * `preconditions`: sentences that must hold, sentences that must not hold,
//!   and numeric comparisons against the state's metrics table
//! * `effects`: sentences to add, sentences to delete, and numeric deltas
//!
//! Metric deltas may depend on the action's other parameters, e.g. "decrease
//! the location's supply by the bound car's capacity". Such deltas are kept as
//! a [`Delta`] expression on the schema and are resolved to a constant when
//! the schema is bound.
//!
//! ## Basic Usage
//!
//! ```
//! use rideplan::{Action, Comparison, Delta, Variable, WorldObject};
//!
//! let load = Action::new(
//!     "Load",
//!     vec![Variable::new("car_a", "car"), Variable::new("loc_a", "location")],
//! )
//! .requires("at", &["car_a", "loc_a"])
//! .forbids("carrying-load", &["car_a"])
//! .requires_metric("loc_a", "supply", Comparison::Gt, 0)
//! .adds("carrying-load", &["car_a"])
//! .adjusts("loc_a", "supply", Delta::negated("car_a", "capacity"));
//!
//! let van = WorldObject::new("Van", "car").with_number("capacity", 40);
//! let depot = WorldObject::new("Depot", "location");
//!
//! let grounded = load.bind(&[&van, &depot]).unwrap();
//! assert!(grounded.is_grounded());
//! assert_eq!(grounded.effects.metric[0].delta, Delta::Constant(-40));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::entity::{AtomicSentence, Variable, WorldObject};
use crate::{PlanError, Result, State};

/// Comparison operator of a metric precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn holds(self, value: i64, threshold: i64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Gte => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Lte => value <= threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        };
        write!(f, "{}", symbol)
    }
}

/// `metrics[object][attribute] <comparison> threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCondition {
    pub object: Variable,
    pub attribute: String,
    pub comparison: Comparison,
    pub threshold: i64,
}

impl MetricCondition {
    pub fn is_satisfied(&self, state: &State) -> Result<bool> {
        let identity = self.object.identity().ok_or_else(|| PlanError::UnboundParameter {
            action: String::new(),
            parameter: self.object.name.clone(),
        })?;
        let value = state.metric(identity, &self.attribute)?;
        Ok(self.comparison.holds(value, self.threshold))
    }
}

/// Amount a metric effect changes its target by.
///
/// Schemas may use the parameter-dependent forms; binding always rewrites
/// them to `Constant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    Constant(i64),
    /// `+ parameter.attribute`
    Attribute { parameter: String, attribute: String },
    /// `- parameter.attribute`
    NegatedAttribute { parameter: String, attribute: String },
}

impl Delta {
    pub fn negated(parameter: impl Into<String>, attribute: impl Into<String>) -> Self {
        Delta::NegatedAttribute {
            parameter: parameter.into(),
            attribute: attribute.into(),
        }
    }

    pub fn attribute(parameter: impl Into<String>, attribute: impl Into<String>) -> Self {
        Delta::Attribute {
            parameter: parameter.into(),
            attribute: attribute.into(),
        }
    }

    pub fn constant(&self) -> Option<i64> {
        match self {
            Delta::Constant(value) => Some(*value),
            _ => None,
        }
    }

    fn resolve(&self, action: &str, bound: &HashMap<&str, &Variable>) -> Result<i64> {
        let (parameter, attribute, sign) = match self {
            Delta::Constant(value) => return Ok(*value),
            Delta::Attribute {
                parameter,
                attribute,
            } => (parameter, attribute, 1),
            Delta::NegatedAttribute {
                parameter,
                attribute,
            } => (parameter, attribute, -1),
        };
        let var = bound
            .get(parameter.as_str())
            .ok_or_else(|| PlanError::UnboundParameter {
                action: action.to_string(),
                parameter: parameter.clone(),
            })?;
        let value = var
            .number(attribute)
            .ok_or_else(|| PlanError::MissingAttribute {
                object: var.label().to_string(),
                attribute: attribute.clone(),
            })?;
        Ok(sign * value)
    }
}

/// `metrics[target][attribute] += delta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEffect {
    pub target: Variable,
    pub attribute: String,
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preconditions {
    pub positive: Vec<AtomicSentence>,
    pub negative: Vec<AtomicSentence>,
    pub metric: Vec<MetricCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub add: Vec<AtomicSentence>,
    pub delete: Vec<AtomicSentence>,
    pub metric: Vec<MetricEffect>,
}

/// An action schema or grounded action.
///
/// # Examples
///
/// ```
/// use rideplan::{Action, State, Variable, WorldObject};
///
/// let drive = Action::new(
///     "Drive",
///     vec![
///         Variable::new("car_a", "car"),
///         Variable::new("from_loc", "location"),
///         Variable::new("to_loc", "location"),
///     ],
/// )
/// .requires("at", &["car_a", "from_loc"])
/// .adds("at", &["car_a", "to_loc"])
/// .deletes("at", &["car_a", "from_loc"]);
///
/// let van = WorldObject::new("Van", "car");
/// let a = WorldObject::new("A", "location");
/// let b = WorldObject::new("B", "location");
/// let grounded = drive.bind(&[&van, &a, &b]).unwrap();
///
/// let start = State::new(grounded.preconditions.positive.clone(), Default::default());
/// assert!(grounded.is_applicable(&start).unwrap());
///
/// let next = grounded.act_on(&start).unwrap();
/// assert!(next.holds(&grounded.effects.add[0]));
/// assert!(!next.holds(&grounded.effects.delete[0]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub preconditions: Preconditions,
    pub effects: Effects,
}

impl Action {
    /// Creates an action with the given formal parameters and no
    /// preconditions or effects.
    pub fn new(name: impl Into<String>, parameters: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            parameters,
            preconditions: Preconditions::default(),
            effects: Effects::default(),
        }
    }

    /// Looks up a formal parameter by name.
    ///
    /// Unknown names yield a placeholder variable; binding reports it as
    /// `PlanError::UnboundParameter`.
    fn param(&self, name: &str) -> Variable {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| Variable::new(name, ""))
    }

    fn sentence(&self, predicate: &str, terms: &[&str]) -> AtomicSentence {
        AtomicSentence::new(predicate, terms.iter().map(|t| self.param(t)).collect())
    }

    /// Adds a positive precondition over the named parameters.
    pub fn requires(mut self, predicate: &str, terms: &[&str]) -> Self {
        let sentence = self.sentence(predicate, terms);
        self.preconditions.positive.push(sentence);
        self
    }

    /// Adds a negative precondition over the named parameters.
    pub fn forbids(mut self, predicate: &str, terms: &[&str]) -> Self {
        let sentence = self.sentence(predicate, terms);
        self.preconditions.negative.push(sentence);
        self
    }

    pub fn requires_metric(
        mut self,
        parameter: &str,
        attribute: &str,
        comparison: Comparison,
        threshold: i64,
    ) -> Self {
        let object = self.param(parameter);
        self.preconditions.metric.push(MetricCondition {
            object,
            attribute: attribute.to_string(),
            comparison,
            threshold,
        });
        self
    }

    pub fn adds(mut self, predicate: &str, terms: &[&str]) -> Self {
        let sentence = self.sentence(predicate, terms);
        self.effects.add.push(sentence);
        self
    }

    pub fn deletes(mut self, predicate: &str, terms: &[&str]) -> Self {
        let sentence = self.sentence(predicate, terms);
        self.effects.delete.push(sentence);
        self
    }

    pub fn adjusts(mut self, parameter: &str, attribute: &str, delta: Delta) -> Self {
        let target = self.param(parameter);
        self.effects.metric.push(MetricEffect {
            target,
            attribute: attribute.to_string(),
            delta,
        });
        self
    }

    /// True once every formal parameter carries a bound identity.
    pub fn is_grounded(&self) -> bool {
        self.parameters.iter().all(Variable::is_bound)
    }

    /// Returns a fully bound copy of this schema, binding the i-th formal
    /// parameter to `objects[i]`.
    ///
    /// Every sentence, metric condition and metric effect is rewritten to
    /// refer to the bound parameters, and parameter-dependent deltas are
    /// evaluated against them. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// * `PlanError::ArityMismatch` if `objects` has the wrong length
    /// * `PlanError::TypeMismatch` if an object's type differs from its parameter's
    /// * `PlanError::UnboundParameter` if the schema references an unknown parameter
    /// * `PlanError::MissingAttribute` if a delta needs an attribute the object lacks
    pub fn bind(&self, objects: &[&WorldObject]) -> Result<Action> {
        if objects.len() != self.parameters.len() {
            return Err(PlanError::ArityMismatch {
                action: self.name.clone(),
                expected: self.parameters.len(),
                actual: objects.len(),
            });
        }

        let mut parameters = self.parameters.clone();
        for (param, object) in parameters.iter_mut().zip(objects) {
            param.bind(object)?;
        }

        let (preconditions, effects) = {
            let bound: HashMap<&str, &Variable> =
                parameters.iter().map(|p| (p.name.as_str(), p)).collect();

            let lookup = |var: &Variable| -> Result<Variable> {
                bound
                    .get(var.name.as_str())
                    .map(|v| (*v).clone())
                    .ok_or_else(|| PlanError::UnboundParameter {
                        action: self.name.clone(),
                        parameter: var.name.clone(),
                    })
            };
            let rebind = |sentences: &[AtomicSentence]| -> Result<Vec<AtomicSentence>> {
                sentences
                    .iter()
                    .map(|s| {
                        let terms = s.terms.iter().map(&lookup).collect::<Result<Vec<_>>>()?;
                        Ok(AtomicSentence::new(s.name.clone(), terms))
                    })
                    .collect()
            };

            let preconditions = Preconditions {
                positive: rebind(&self.preconditions.positive)?,
                negative: rebind(&self.preconditions.negative)?,
                metric: self
                    .preconditions
                    .metric
                    .iter()
                    .map(|c| {
                        Ok(MetricCondition {
                            object: lookup(&c.object)?,
                            ..c.clone()
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            };

            let effects = Effects {
                add: rebind(&self.effects.add)?,
                delete: rebind(&self.effects.delete)?,
                metric: self
                    .effects
                    .metric
                    .iter()
                    .map(|e| {
                        Ok(MetricEffect {
                            target: lookup(&e.target)?,
                            attribute: e.attribute.clone(),
                            delta: Delta::Constant(e.delta.resolve(&self.name, &bound)?),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            };

            (preconditions, effects)
        };

        Ok(Action {
            name: self.name.clone(),
            parameters,
            preconditions,
            effects,
        })
    }

    /// Checks whether this grounded action can be applied in `state`.
    ///
    /// Positive sentences are checked first, then negative sentences, then
    /// metric conditions; evaluation stops at the first failing clause.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::MissingMetricKey` if a metric condition refers to
    /// a key the state's metrics table does not hold.
    pub fn is_applicable(&self, state: &State) -> Result<bool> {
        if !self.preconditions.positive.iter().all(|s| state.holds(s)) {
            return Ok(false);
        }
        if self.preconditions.negative.iter().any(|s| state.holds(s)) {
            return Ok(false);
        }
        for condition in &self.preconditions.metric {
            let satisfied = condition.is_satisfied(state).map_err(|e| match e {
                PlanError::UnboundParameter { parameter, .. } => PlanError::UnboundParameter {
                    action: self.name.clone(),
                    parameter,
                },
                other => other,
            })?;
            if !satisfied {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Produces the successor of `state` under this action.
    ///
    /// Deletes are removed before adds are appended, and metric deltas are
    /// applied last. The input state is not modified, and the returned state
    /// carries no predecessor link; the search arena attaches one.
    ///
    /// # Errors
    ///
    /// * `PlanError::MissingMetricKey` if an effect targets an absent metric
    /// * `PlanError::UnresolvedDelta` if called on an unbound schema
    pub fn act_on(&self, state: &State) -> Result<State> {
        let mut facts: Vec<AtomicSentence> = state
            .facts()
            .iter()
            .filter(|fact| !self.effects.delete.iter().any(|d| d == *fact))
            .cloned()
            .collect();
        for sentence in &self.effects.add {
            if !facts.iter().any(|f| f == sentence) {
                facts.push(sentence.clone());
            }
        }

        let mut metrics = state.metrics().clone();
        for effect in &self.effects.metric {
            let delta = effect
                .delta
                .constant()
                .ok_or_else(|| PlanError::UnresolvedDelta {
                    action: self.name.clone(),
                    attribute: effect.attribute.clone(),
                })?;
            let identity = effect
                .target
                .identity()
                .ok_or_else(|| PlanError::UnboundParameter {
                    action: self.name.clone(),
                    parameter: effect.target.name.clone(),
                })?;
            let value = metrics
                .get_mut(identity)
                .and_then(|attrs| attrs.get_mut(&effect.attribute))
                .ok_or_else(|| PlanError::missing_metric(identity, &effect.attribute))?;
            *value += delta;
        }

        Ok(State::new(facts, metrics))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<&str> = self.parameters.iter().map(|p| p.label()).collect();
        write!(f, "{}({})", self.name, terms.join(", "))
    }
}

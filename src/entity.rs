//! # Entity Model
//!
//! Typed world objects, the variables that stand in for them inside action
//! schemas, and the atomic sentences built from those variables.
//!
//! A [`Variable`] plays two roles. Inside an action schema it is a formal
//! parameter: it has a name and a type but no bound identity. Once the schema
//! is grounded against a [`WorldObject`] the variable carries that object's
//! identity and a snapshot of its attributes. Two variables are equal when
//! their types and bound identities are equal; attributes never take part in
//! identity.
//!
//! ```
//! use rideplan::{AtomicSentence, Variable, WorldObject};
//!
//! let car = WorldObject::new("Blue Van", "car").with_number("capacity", 200);
//! let depot = WorldObject::new("Depot", "location");
//!
//! let mut car_var = Variable::new("car_a", "car");
//! car_var.bind(&car).unwrap();
//! let mut loc_var = Variable::new("loc_a", "location");
//! loc_var.bind(&depot).unwrap();
//!
//! let fact = AtomicSentence::new("at", vec![car_var.clone(), loc_var.clone()]);
//! // term order does not matter for sentence equality
//! assert_eq!(fact, AtomicSentence::new("at", vec![loc_var, car_var]));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{PlanError, Result};

/// A single attribute value carried by a world object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(i64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Number(_) => None,
            AttributeValue::Text(s) => Some(s.as_str()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Attribute map of a world object, keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Normalises an object type so that `"car"` and `"CAR"` denote the same type.
pub fn normalize_kind(kind: &str) -> String {
    kind.trim().to_uppercase()
}

/// A concrete, typed entity in the planning problem: a car, a location, a
/// person, or the world itself.
///
/// `identity` is the key used in every state's metrics table and the value a
/// bound variable compares by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub identity: String,
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl WorldObject {
    pub fn new(identity: impl Into<String>, kind: &str) -> Self {
        Self {
            identity: identity.into(),
            kind: normalize_kind(kind),
            attributes: Attributes::new(),
        }
    }

    pub fn with_number(mut self, attribute: impl Into<String>, value: i64) -> Self {
        self.attributes
            .insert(attribute.into(), AttributeValue::Number(value));
        self
    }

    pub fn with_text(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(attribute.into(), AttributeValue::Text(value.into()));
        self
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == normalize_kind(kind)
    }

    pub fn number(&self, attribute: &str) -> Option<i64> {
        self.attributes.get(attribute).and_then(|v| v.as_number())
    }
}

impl fmt::Display for WorldObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object: {} - {}", self.identity, self.kind)
    }
}

/// The identity and attribute snapshot a variable takes on when bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub identity: String,
    pub attributes: Attributes,
}

/// A formal parameter of an action schema, or a bound argument of a grounded
/// action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: String,
    pub binding: Option<Binding>,
}

impl Variable {
    /// Creates an unbound variable of the given type.
    pub fn new(name: impl Into<String>, kind: &str) -> Self {
        Self {
            name: name.into(),
            kind: normalize_kind(kind),
            binding: None,
        }
    }

    /// Binds this variable to `object`, copying its identity and attributes.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::TypeMismatch` if the object's type differs from the
    /// variable's declared type.
    pub fn bind(&mut self, object: &WorldObject) -> Result<()> {
        if object.kind != self.kind {
            return Err(PlanError::TypeMismatch {
                object: object.identity.clone(),
                expected: self.kind.clone(),
                actual: object.kind.clone(),
            });
        }
        self.binding = Some(Binding {
            identity: object.identity.clone(),
            attributes: object.attributes.clone(),
        });
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn identity(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.identity.as_str())
    }

    pub fn attribute(&self, attribute: &str) -> Option<&AttributeValue> {
        self.binding.as_ref().and_then(|b| b.attributes.get(attribute))
    }

    pub fn number(&self, attribute: &str) -> Option<i64> {
        self.attribute(attribute).and_then(|v| v.as_number())
    }

    /// Label used when rendering plans: the bound identity, else the name.
    pub fn label(&self) -> &str {
        self.identity().unwrap_or(self.name.as_str())
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity() == other.identity()
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.identity().hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(identity) => write!(f, "{} : {} - {}", self.name, self.kind, identity),
            None => write!(f, "{} : {}", self.name, self.kind),
        }
    }
}

/// A predicate applied to a list of terms, e.g. `at(car_a, loc_a)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicSentence {
    pub name: String,
    pub terms: Vec<Variable>,
}

/// Order-independent hashable form of a sentence, used by the visited-state
/// guard.
pub type SentenceKey = (String, Vec<(String, Option<String>)>);

impl AtomicSentence {
    pub fn new(name: impl Into<String>, terms: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            terms,
        }
    }

    pub fn key(&self) -> SentenceKey {
        let mut terms: Vec<(String, Option<String>)> = self
            .terms
            .iter()
            .map(|t| (t.kind.clone(), t.identity().map(str::to_string)))
            .collect();
        terms.sort();
        (self.name.clone(), terms)
    }
}

/// Names and arities must match, and every term of `self` must have an equal
/// term somewhere in `other`. Position is ignored.
impl PartialEq for AtomicSentence {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.terms.len() == other.terms.len()
            && self.terms.iter().all(|t| other.terms.contains(t))
    }
}

impl fmt::Display for AtomicSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<&str> = self.terms.iter().map(|t| t.label()).collect();
        write!(f, "{}({})", self.name, terms.join(", "))
    }
}

//! # Problem Module
//!
//! Turns a ride-share problem description (persons, locations, cars) into
//! the two inputs a search needs: the list of world objects to ground the
//! domain schemas against, and the initial [`State`].
//!
//! Descriptions are usually read from JSON:
//!
//! ```
//! use rideplan::ProblemDescription;
//!
//! let description = ProblemDescription::from_json(r#"{
//!     "persons":   [{ "name": "Ada", "home": "Elm St", "car": "Van" }],
//!     "locations": [{ "name": "Depot", "supply": 40 },
//!                   { "name": "Market", "demand": 40 }],
//!     "cars":      [{ "name": "Van", "capacity": 40, "at": "Depot" }]
//! }"#).unwrap();
//!
//! let problem = description.build().unwrap();
//! // Ada, Depot, Market, Elm St, Van and the world object.
//! assert_eq!(problem.objects.len(), 6);
//! assert_eq!(problem.initial_state.outstanding_demand(), 40);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::domain::{
    ASSIGNED, AT, CAPACITY, CAR, DEMAND, HOME, IS_ASSIGNED, LOCATION, NUMBER_TRIPS, OWNER,
    PERSON, SUPPLY, TRIPS_TAKEN, WORLD, WORLD_KIND,
};
use crate::entity::{AtomicSentence, Variable, WorldObject};
use crate::state::Metrics;
use crate::{PlanError, Result, State};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSpec {
    pub name: String,
    pub home: String,
    /// Starting location; defaults to `home`.
    #[serde(default)]
    pub at: Option<String>,
    /// Car the person already sits in.
    #[serde(default)]
    pub car: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    #[serde(default)]
    pub supply: i64,
    #[serde(default)]
    pub demand: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    pub name: String,
    pub capacity: i64,
    #[serde(default)]
    pub owner: Option<String>,
    pub at: String,
}

/// Serializable description of a ride-share problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDescription {
    #[serde(default)]
    pub persons: Vec<PersonSpec>,
    #[serde(default)]
    pub locations: Vec<LocationSpec>,
    #[serde(default)]
    pub cars: Vec<CarSpec>,
}

/// A loaded problem: world objects plus the initial state.
#[derive(Debug, Clone)]
pub struct Problem {
    pub objects: Vec<WorldObject>,
    pub initial_state: State,
}

impl ProblemDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Listed locations followed by any person home not already listed.
    fn all_locations(&self) -> Vec<LocationSpec> {
        let mut locations = self.locations.clone();
        for person in &self.persons {
            if !locations.iter().any(|l| l.name == person.home) {
                locations.push(LocationSpec {
                    name: person.home.clone(),
                    supply: 0,
                    demand: 0,
                });
            }
        }
        locations
    }

    /// Checks names are unique and every reference resolves.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::InvalidProblem` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let locations = self.all_locations();
        let invalid = |msg: String| -> Result<()> { Err(PlanError::InvalidProblem(msg)) };

        let mut names = HashSet::new();
        let all_names = self
            .persons
            .iter()
            .map(|p| p.name.as_str())
            .chain(locations.iter().map(|l| l.name.as_str()))
            .chain(self.cars.iter().map(|c| c.name.as_str()));
        for name in all_names {
            if name == WORLD {
                return invalid(format!("'{}' is a reserved name", WORLD));
            }
            if !names.insert(name) {
                return invalid(format!("duplicate name '{}'", name));
            }
        }

        let is_location = |name: &str| locations.iter().any(|l| l.name == name);
        for location in &self.locations {
            if location.supply < 0 || location.demand < 0 {
                return invalid(format!(
                    "location '{}' has negative supply or demand",
                    location.name
                ));
            }
        }
        for car in &self.cars {
            if car.capacity < 0 {
                return invalid(format!("car '{}' has negative capacity", car.name));
            }
            if !is_location(car.at.as_str()) {
                return invalid(format!("car '{}' is at unknown location '{}'", car.name, car.at));
            }
            if let Some(owner) = &car.owner {
                if !self.persons.iter().any(|p| &p.name == owner) {
                    return invalid(format!("car '{}' has unknown owner '{}'", car.name, owner));
                }
            }
        }
        for person in &self.persons {
            if let Some(at) = &person.at {
                if !is_location(at.as_str()) {
                    return invalid(format!(
                        "person '{}' is at unknown location '{}'",
                        person.name, at
                    ));
                }
            }
            if let Some(car) = &person.car {
                if !self.cars.iter().any(|c| &c.name == car) {
                    return invalid(format!(
                        "person '{}' is assigned to unknown car '{}'",
                        person.name, car
                    ));
                }
            }
        }
        Ok(())
    }

    /// Loads the problem into world objects and an initial state.
    pub fn build(&self) -> Result<Problem> {
        let objects = build_world_objects(self)?;
        let initial_state = initial_state_from_objects(self, &objects)?;
        Ok(Problem {
            objects,
            initial_state,
        })
    }
}

/// World objects in grounding order: persons, locations, cars, the world.
pub fn build_world_objects(description: &ProblemDescription) -> Result<Vec<WorldObject>> {
    description.validate()?;

    let mut objects = Vec::new();
    for person in &description.persons {
        objects.push(
            WorldObject::new(&person.name, PERSON)
                .with_number(TRIPS_TAKEN, 0)
                .with_text(HOME, &person.home),
        );
    }
    for location in description.all_locations() {
        objects.push(
            WorldObject::new(location.name, LOCATION)
                .with_number(SUPPLY, location.supply)
                .with_number(DEMAND, location.demand),
        );
    }
    for car in &description.cars {
        let mut object = WorldObject::new(&car.name, CAR).with_number(CAPACITY, car.capacity);
        if let Some(owner) = &car.owner {
            object = object.with_text(OWNER, owner);
        }
        objects.push(object);
    }
    objects.push(WorldObject::new(WORLD, WORLD_KIND).with_number(NUMBER_TRIPS, 0));

    log::debug!("Built {} world objects", objects.len());
    Ok(objects)
}

/// Builds the initial state of `description`.
///
/// # Errors
///
/// Returns `PlanError::InvalidProblem` if the description fails validation.
pub fn build_initial_state(description: &ProblemDescription) -> Result<State> {
    let objects = build_world_objects(description)?;
    initial_state_from_objects(description, &objects)
}

fn initial_state_from_objects(
    description: &ProblemDescription,
    objects: &[WorldObject],
) -> Result<State> {
    let term = |identity: &str| -> Result<Variable> {
        let object = objects
            .iter()
            .find(|o| o.identity == identity)
            .ok_or_else(|| PlanError::InvalidProblem(format!("unknown object '{}'", identity)))?;
        let mut var = Variable::new(&object.identity, &object.kind);
        var.bind(object)?;
        Ok(var)
    };

    let mut state = State::new(Vec::new(), Metrics::new());

    for person in &description.persons {
        match &person.car {
            Some(car) => {
                state.assert_fact(AtomicSentence::new(
                    ASSIGNED,
                    vec![term(&person.name)?, term(car)?],
                ));
                state.assert_fact(AtomicSentence::new(IS_ASSIGNED, vec![term(&person.name)?]));
            }
            None => {
                let at = person.at.as_deref().unwrap_or(person.home.as_str());
                state.assert_fact(AtomicSentence::new(AT, vec![term(at)?, term(&person.name)?]));
            }
        }
    }
    for car in &description.cars {
        state.assert_fact(AtomicSentence::new(AT, vec![term(&car.name)?, term(&car.at)?]));
    }

    for object in objects {
        let attributes: &[&str] = match object.kind.as_str() {
            PERSON => &[TRIPS_TAKEN],
            LOCATION => &[SUPPLY, DEMAND],
            CAR => &[CAPACITY],
            WORLD_KIND => &[NUMBER_TRIPS],
            _ => &[],
        };
        for attribute in attributes {
            if let Some(value) = object.number(attribute) {
                state.set_metric(&object.identity, *attribute, value);
            }
        }
    }

    log::info!(
        "Initial state: {} facts, demand {}, supply {}",
        state.facts().len(),
        state.outstanding_demand(),
        state.outstanding_supply()
    );
    Ok(state)
}

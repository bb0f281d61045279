//! The ride-share logistics domain: object types, metric names, and the four
//! action schemas (`Drive`, `Load`, `Unload`, `Assign`).

use crate::action::{Action, Comparison, Delta};
use crate::entity::Variable;

pub const PERSON: &str = "PERSON";
pub const CAR: &str = "CAR";
pub const LOCATION: &str = "LOCATION";
/// Type of the single world object holding global counters.
pub const WORLD_KIND: &str = "DOMAIN";
/// Identity of the world object.
pub const WORLD: &str = "The World";

pub const SUPPLY: &str = "supply";
pub const DEMAND: &str = "demand";
pub const CAPACITY: &str = "capacity";
pub const TRIPS_TAKEN: &str = "trips-taken";
pub const NUMBER_TRIPS: &str = "number-trips";
pub const HOME: &str = "home";
pub const OWNER: &str = "owner";

pub const AT: &str = "at";
pub const ASSIGNED: &str = "assigned";
pub const IS_ASSIGNED: &str = "is-assigned";
pub const CARRYING_LOAD: &str = "carrying-load";

/// A person drives their assigned car from one location to another.
pub fn drive() -> Action {
    Action::new(
        "Drive",
        vec![
            Variable::new("person_a", PERSON),
            Variable::new("car_a", CAR),
            Variable::new("from_loc", LOCATION),
            Variable::new("to_loc", LOCATION),
            Variable::new("world", WORLD_KIND),
        ],
    )
    .requires(AT, &["car_a", "from_loc"])
    .requires(ASSIGNED, &["person_a", "car_a"])
    .adds(AT, &["car_a", "to_loc"])
    .deletes(AT, &["car_a", "from_loc"])
    .adjusts("world", NUMBER_TRIPS, Delta::Constant(1))
    .adjusts("person_a", TRIPS_TAKEN, Delta::Constant(1))
}

/// An empty car takes on a full load at a location with supply left.
pub fn load() -> Action {
    Action::new(
        "Load",
        vec![
            Variable::new("car_a", CAR),
            Variable::new("loc_a", LOCATION),
            Variable::new("world", WORLD_KIND),
        ],
    )
    .requires(AT, &["car_a", "loc_a"])
    .forbids(CARRYING_LOAD, &["car_a"])
    .requires_metric("loc_a", SUPPLY, Comparison::Gt, 0)
    .adds(CARRYING_LOAD, &["car_a"])
    .adjusts("loc_a", SUPPLY, Delta::negated("car_a", CAPACITY))
}

/// A loaded car drops its load at a location with demand left.
pub fn unload() -> Action {
    Action::new(
        "Unload",
        vec![
            Variable::new("car_a", CAR),
            Variable::new("loc_a", LOCATION),
            Variable::new("world", WORLD_KIND),
        ],
    )
    .requires(CARRYING_LOAD, &["car_a"])
    .requires(AT, &["car_a", "loc_a"])
    .requires_metric("loc_a", DEMAND, Comparison::Gt, 0)
    .deletes(CARRYING_LOAD, &["car_a"])
    .adjusts("loc_a", DEMAND, Delta::negated("car_a", CAPACITY))
}

/// An unassigned person at a car's location gets into that car.
pub fn assign() -> Action {
    Action::new(
        "Assign",
        vec![
            Variable::new("person_a", PERSON),
            Variable::new("car_a", CAR),
            Variable::new("loc_a", LOCATION),
            Variable::new("world", WORLD_KIND),
        ],
    )
    .requires(AT, &["car_a", "loc_a"])
    .requires(AT, &["person_a", "loc_a"])
    .forbids(IS_ASSIGNED, &["person_a"])
    .adds(ASSIGNED, &["person_a", "car_a"])
    .adds(IS_ASSIGNED, &["person_a"])
    .deletes(AT, &["person_a", "loc_a"])
}

/// All schemas of the domain, in the order they are grounded.
pub fn ride_share_schemas() -> Vec<Action> {
    vec![drive(), load(), unload(), assign()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_and_arity() {
        let schemas = ride_share_schemas();
        let summary: Vec<(&str, usize)> = schemas
            .iter()
            .map(|a| (a.name.as_str(), a.parameters.len()))
            .collect();
        assert_eq!(
            summary,
            [("Drive", 5), ("Load", 3), ("Unload", 3), ("Assign", 4)]
        );
    }

    #[test]
    fn test_schemas_are_unbound() {
        assert!(ride_share_schemas().iter().all(|a| !a.is_grounded()));
    }

    #[test]
    fn test_schema_terms_refer_to_parameters() {
        for schema in ride_share_schemas() {
            let names: Vec<&str> = schema.parameters.iter().map(|p| p.name.as_str()).collect();
            let sentences = schema
                .preconditions
                .positive
                .iter()
                .chain(&schema.preconditions.negative)
                .chain(&schema.effects.add)
                .chain(&schema.effects.delete);
            for sentence in sentences {
                for term in &sentence.terms {
                    assert!(
                        names.contains(&term.name.as_str()),
                        "{} uses unknown term {}",
                        schema.name,
                        term.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_load_and_unload_use_capacity_delta() {
        assert_eq!(
            load().effects.metric[0].delta,
            Delta::negated("car_a", CAPACITY)
        );
        assert_eq!(
            unload().effects.metric[0].delta,
            Delta::negated("car_a", CAPACITY)
        );
    }
}

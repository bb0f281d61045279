//! # Grounder
//!
//! Expands action schemas into every concrete action instance the world
//! objects allow. For each formal parameter the objects of matching type form
//! a pool; the grounded actions are the Cartesian product of those pools in
//! parameter order. Cost is the product of the pool sizes, paid once before
//! search starts.
//!
//! ```
//! use rideplan::{build_grounded_actions, Action, Variable, WorldObject};
//!
//! let drive = Action::new(
//!     "Drive",
//!     vec![Variable::new("from_loc", "location"), Variable::new("to_loc", "location")],
//! );
//! let objects = vec![
//!     WorldObject::new("A", "location"),
//!     WorldObject::new("B", "location"),
//!     WorldObject::new("C", "location"),
//! ];
//!
//! let grounded = build_grounded_actions(&[drive], &objects).unwrap();
//! assert_eq!(grounded.len(), 9);
//! ```

use rayon::prelude::*;

use crate::entity::WorldObject;
use crate::{Action, Result};

/// Grounds a single schema against `objects`.
///
/// A parameter whose type matches no object makes the whole schema
/// ungroundable; that is logged and yields an empty list, not an error.
///
/// # Errors
///
/// Propagates binding failures such as `PlanError::MissingAttribute` when a
/// parameter-dependent delta needs an attribute an object does not carry.
pub fn ground_action(schema: &Action, objects: &[WorldObject]) -> Result<Vec<Action>> {
    let pools: Vec<Vec<&WorldObject>> = schema
        .parameters
        .iter()
        .map(|param| objects.iter().filter(|o| o.kind == param.kind).collect())
        .collect();

    if let Some(empty) = pools.iter().position(Vec::is_empty) {
        log::info!(
            "Schema {} is ungroundable: no objects of type {} for parameter {}",
            schema.name,
            schema.parameters[empty].kind,
            schema.parameters[empty].name
        );
        return Ok(Vec::new());
    }

    let mut combinations: Vec<Vec<&WorldObject>> = vec![Vec::new()];
    for pool in &pools {
        let mut next = Vec::with_capacity(combinations.len() * pool.len());
        for base in &combinations {
            for object in pool {
                let mut combination = Vec::with_capacity(pools.len());
                combination.extend_from_slice(base);
                combination.push(*object);
                next.push(combination);
            }
        }
        combinations = next;
    }

    let grounded = combinations
        .iter()
        .map(|combination| schema.bind(combination))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Grounded {} into {} actions", schema.name, grounded.len());
    Ok(grounded)
}

/// Grounds every schema and concatenates the results in schema order.
pub fn build_grounded_actions(schemas: &[Action], objects: &[WorldObject]) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    for schema in schemas {
        actions.extend(ground_action(schema, objects)?);
    }
    log::info!(
        "Grounded {} schemas into {} actions",
        schemas.len(),
        actions.len()
    );
    Ok(actions)
}

/// Same as [`build_grounded_actions`], grounding schemas on the rayon pool.
///
/// The output order matches the sequential version.
pub fn par_build_grounded_actions(
    schemas: &[Action],
    objects: &[WorldObject],
) -> Result<Vec<Action>> {
    let slices = schemas
        .par_iter()
        .map(|schema| ground_action(schema, objects))
        .collect::<Result<Vec<_>>>()?;
    let actions: Vec<Action> = slices.into_iter().flatten().collect();
    log::info!(
        "Grounded {} schemas into {} actions (parallel)",
        schemas.len(),
        actions.len()
    );
    Ok(actions)
}

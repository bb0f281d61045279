use thiserror::Error;

/// Errors raised while building or searching a planning problem.
///
/// Setup problems (a metric the problem never initialised, an attribute a
/// binding needs but the object lacks, a malformed problem description) are
/// fatal and abort the run. Running out of frontier or being cancelled is not
/// an error; see [`crate::SearchStatus`].
///
/// # Examples
///
/// ```
/// use rideplan::PlanError;
///
/// let err = PlanError::MissingMetricKey {
///     object: "loc_b".to_string(),
///     attribute: "demand".to_string(),
/// };
/// assert_eq!(format!("{}", err), "Missing metric key: loc_b.demand");
/// ```
#[derive(Error, Debug)]
pub enum PlanError {
    /// A metric precondition or effect referenced an object/attribute pair
    /// absent from the state's metrics table
    #[error("Missing metric key: {object}.{attribute}")]
    MissingMetricKey { object: String, attribute: String },

    /// Binding needed a numeric attribute the world object does not carry
    #[error("Missing attribute '{attribute}' on object {object}")]
    MissingAttribute { object: String, attribute: String },

    /// A sentence, condition or effect refers to a variable that is not one
    /// of the action's parameters, or is used before being bound
    #[error("Unbound parameter '{parameter}' in action {action}")]
    UnboundParameter { action: String, parameter: String },

    /// A metric effect still carries an unevaluated delta
    #[error("Unresolved metric delta on {attribute} in action {action}")]
    UnresolvedDelta { action: String, attribute: String },

    /// Binding was given the wrong number of objects
    #[error("Action {action} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        action: String,
        expected: usize,
        actual: usize,
    },

    /// An object's type does not match the parameter it was bound to
    #[error("Type mismatch binding {object} ({actual}) to parameter of type {expected}")]
    TypeMismatch {
        object: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A plan trace refers to an action outside the planner's catalogue
    #[error("Unknown action handle {0}")]
    UnknownAction(usize),

    /// Convenience error for callers that require at least one plan
    #[error("No valid plan found to achieve the goal")]
    NoPlanFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PlanError {
    pub(crate) fn missing_metric(object: &str, attribute: &str) -> Self {
        PlanError::MissingMetricKey {
            object: object.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_no_plan_found_display() {
        let err = PlanError::NoPlanFound;
        assert_eq!(
            format!("{}", err),
            "No valid plan found to achieve the goal"
        );
    }

    #[test]
    fn test_missing_metric_key_display() {
        let err = PlanError::missing_metric("The World", "number-trips");
        assert_eq!(
            format!("{}", err),
            "Missing metric key: The World.number-trips"
        );
    }

    #[test]
    fn test_arity_mismatch_display() {
        let err = PlanError::ArityMismatch {
            action: "Drive".to_string(),
            expected: 5,
            actual: 2,
        };
        assert_eq!(format!("{}", err), "Action Drive expects 5 arguments, got 2");
    }

    #[test]
    fn test_invalid_problem_display() {
        let err = PlanError::InvalidProblem("unknown car 'x'".to_string());
        assert_eq!(format!("{}", err), "Invalid problem: unknown car 'x'");
    }

    #[test]
    fn test_io_error_has_source() {
        let err: PlanError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_trait() {
        let err = PlanError::NoPlanFound;
        assert!(err.source().is_none());
    }
}

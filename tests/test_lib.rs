use rideplan::domain::{self, DEMAND, SUPPLY};
use rideplan::{
    build_grounded_actions, par_build_grounded_actions, ExpansionMode, PlanError, PlanVisualizer,
    Planner, PlannerConfig, Problem, ProblemDescription, SearchStatus,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// A(supply 100), B(demand 100), one car of capacity 100 at A.
    fn scenario(preassigned: bool) -> Problem {
        let car = if preassigned { r#", "car": "Van""# } else { "" };
        let json = format!(
            r#"{{
                "persons":   [{{ "name": "Ada", "home": "A"{} }}],
                "locations": [{{ "name": "A", "supply": 100 }},
                              {{ "name": "B", "demand": 100 }}],
                "cars":      [{{ "name": "Van", "capacity": 100, "at": "A" }}]
            }}"#,
            car
        );
        ProblemDescription::from_json(&json)
            .unwrap()
            .build()
            .unwrap()
    }

    fn exhaustive() -> PlannerConfig {
        PlannerConfig::new().with_expansion(ExpansionMode::Exhaustive)
    }

    #[test]
    fn test_ride_share_scenario() {
        let planner = Planner::from_problem(&scenario(true), exhaustive()).unwrap();
        let outcome = planner.execute(1, None).unwrap();

        assert_eq!(outcome.status, SearchStatus::Complete);
        let plan = outcome.first_plan().unwrap();
        let steps: Vec<String> = plan.steps.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            steps,
            [
                "Load(Van, A, The World)",
                "Drive(Ada, Van, A, B, The World)",
                "Unload(Van, B, The World)",
            ]
        );
        assert_eq!(plan.final_metrics["B"][DEMAND], 0);
        assert_eq!(plan.final_metrics["A"][SUPPLY], 0);
        assert_eq!(plan.total_trips(), 1);
        assert_eq!(plan.trip_entropy(), 0.0);
    }

    #[test]
    fn test_unassigned_person_gets_into_car() {
        let planner = Planner::from_problem(&scenario(false), exhaustive()).unwrap();
        let outcome = planner.execute(1, None).unwrap();

        let plan = outcome.first_plan().unwrap();
        assert_eq!(plan.action_names(), ["Load", "Assign", "Drive", "Unload"]);
        assert_eq!(plan.steps[1].argument("person_a"), Some("Ada"));
        assert_eq!(plan.final_metrics["Ada"]["trips-taken"], 1);
    }

    #[test]
    fn test_grounded_catalogue_size() {
        let problem = scenario(true);
        let actions =
            build_grounded_actions(&domain::ride_share_schemas(), &problem.objects).unwrap();
        // Drive 1*1*2*2*1, Load 1*2*1, Unload 1*2*1, Assign 1*1*2*1
        assert_eq!(actions.len(), 4 + 2 + 2 + 2);
        assert!(actions.iter().all(|a| a.is_grounded()));
    }

    #[test]
    fn test_parallel_grounding_matches_sequential() {
        let problem = scenario(false);
        let schemas = domain::ride_share_schemas();
        let sequential = build_grounded_actions(&schemas, &problem.objects).unwrap();
        let parallel = par_build_grounded_actions(&schemas, &problem.objects).unwrap();
        assert_eq!(sequential, parallel);

        let planner =
            Planner::from_problem(&problem, exhaustive().with_parallel_grounding(true)).unwrap();
        assert_eq!(planner.actions(), sequential.as_slice());
    }

    #[test]
    fn test_problem_without_cars_terminates() {
        let problem = ProblemDescription::from_json(
            r#"{
                "persons":   [{ "name": "Ada", "home": "A" }],
                "locations": [{ "name": "A", "supply": 10 }, { "name": "B", "demand": 10 }]
            }"#,
        )
        .unwrap()
        .build()
        .unwrap();

        let planner = Planner::from_problem(&problem, exhaustive()).unwrap();
        assert!(planner.actions().is_empty());

        let outcome = planner.execute(1, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.iterations, 1);
        assert!(matches!(outcome.first_plan(), Err(PlanError::NoPlanFound)));
    }

    #[test]
    fn test_sampled_search_reaches_goal() {
        let config = PlannerConfig::new()
            .with_expansion(ExpansionMode::Sample(4))
            .with_seed(2024);
        let planner = Planner::from_problem(&scenario(true), config).unwrap();
        let outcome = planner.execute(2, Some(5)).unwrap();

        assert_eq!(outcome.status, SearchStatus::Complete);
        assert_eq!(outcome.plans.len(), 5);
        for plan in &outcome.plans {
            assert_eq!(plan.final_metrics["B"][DEMAND], 0);
            assert_eq!(plan.steps.last().map(|s| s.action.as_str()), Some("Unload"));
        }
    }

    #[test]
    fn test_config_from_toml_drives_run() {
        let config = PlannerConfig::from_toml_str(
            r#"
            plans_to_find = 2
            expansion = "exhaustive"
            deduplicate_states = true
            "#,
        )
        .unwrap();
        let planner = Planner::from_problem(&scenario(true), config).unwrap();
        let outcome = planner.run().unwrap();
        assert_eq!(outcome.plans.len(), 2);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_outcome_serializes_to_json() {
        let planner = Planner::from_problem(&scenario(true), exhaustive()).unwrap();
        let outcome = planner.execute(1, None).unwrap();

        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "complete");
        assert_eq!(value["plans"][0]["steps"][1]["action"], "Drive");
        assert_eq!(value["plans"][0]["steps"][1]["arguments"][3]["value"], "B");
        assert_eq!(value["plans"][0]["final_metrics"]["B"]["demand"], 0);
    }

    #[test]
    fn test_invalid_problem_is_rejected() {
        let result = ProblemDescription::from_json(
            r#"{ "cars": [{ "name": "Van", "capacity": 10, "at": "Nowhere" }] }"#,
        )
        .unwrap()
        .build();
        assert!(matches!(result, Err(PlanError::InvalidProblem(_))));
    }

    #[test]
    fn test_visualize_plan() {
        let problem = scenario(true);
        let planner = Planner::from_problem(&problem, exhaustive()).unwrap();
        let outcome = planner.execute(1, None).unwrap();
        let plan = outcome.first_plan().unwrap();

        let path = std::env::temp_dir().join("rideplan_scenario.dot");
        PlanVisualizer::new()
            .write_plan(&problem.initial_state, plan, &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("digraph Plan"));
        assert!(content.contains("Drive(Ada, Van, A, B, The World)"));
        assert!(content.contains("B.demand: 100"));
        assert!(content.contains("step_2 -> goal"));

        std::fs::remove_file(&path).unwrap();
    }
}

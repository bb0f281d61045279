use rideplan::{
    ExpansionMode, PlanVisualizer, Planner, PlannerConfig, ProblemDescription, Result,
};

const PROBLEM: &str = r#"{
    "persons": [
        { "name": "Ada", "home": "Elm St", "at": "North Depot", "car": "Van" },
        { "name": "Bo",  "home": "Oak St", "at": "South Depot" }
    ],
    "locations": [
        { "name": "North Depot", "supply": 120 },
        { "name": "South Depot", "supply": 60 },
        { "name": "Market",      "demand": 120 },
        { "name": "Shelter",     "demand": 60 }
    ],
    "cars": [
        { "name": "Van",   "capacity": 60, "owner": "Ada", "at": "North Depot" },
        { "name": "Truck", "capacity": 60, "owner": "Bo",  "at": "South Depot" }
    ]
}"#;

fn main() -> Result<()> {
    env_logger::init();

    // Optional first argument: a TOML planner configuration.
    let config = match std::env::args().nth(1) {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::new()
            .with_plans_to_find(3)
            .with_expansion(ExpansionMode::Sample(6))
            .with_seed(7)
            .with_parallel_grounding(true),
    };

    let problem = ProblemDescription::from_json(PROBLEM)?.build()?;
    let planner = Planner::from_problem(&problem, config)?;
    println!("Grounded {} actions", planner.actions().len());

    let outcome = planner.run()?;
    println!(
        "Search {}: {} plans, {} iterations, {} states",
        outcome.status,
        outcome.plans.len(),
        outcome.iterations,
        outcome.states_generated
    );

    for (i, plan) in outcome.plans.iter().enumerate() {
        println!(
            "\nPlan {} ({} steps, {} trips, entropy {:.3})",
            i + 1,
            plan.len(),
            plan.total_trips(),
            plan.trip_entropy()
        );
        print!("{}", plan);
    }

    let plan = outcome.first_plan()?;
    PlanVisualizer::new().write_plan(&problem.initial_state, plan, "ride_share_plan.dot")?;
    println!("\nWrote ride_share_plan.dot");

    Ok(())
}

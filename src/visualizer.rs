use crate::{Plan, Result, State};
use log::warn;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Renders plans as Graphviz DOT graphs: the initial state, one node per
/// step, and the goal state's metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanVisualizer;

impl PlanVisualizer {
    pub fn new() -> Self {
        Self
    }

    /// Generate the DOT source for `plan` starting from `initial`.
    pub fn render(&self, initial: &State, plan: &Plan) -> String {
        let mut dot = String::new();
        if let Err(e) = self.write_dot(&mut dot, initial, plan) {
            warn!("Failed to render plan graph: {}", e);
        }
        dot
    }

    fn write_dot(&self, out: &mut impl fmt::Write, initial: &State, plan: &Plan) -> fmt::Result {
        writeln!(out, "digraph Plan {{")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(out, "    node [shape=box, style=filled, fillcolor=lightblue];")?;
        writeln!(out, "    edge [fontsize=10];")?;

        writeln!(
            out,
            "    initial [label=\"Initial State\\n{}\", fillcolor=lightgreen];",
            Self::metrics_to_string(initial)
        )?;

        let goal_label = plan
            .final_metrics
            .iter()
            .flat_map(|(object, attrs)| {
                attrs
                    .iter()
                    .map(move |(attr, value)| format!("{}.{}: {}", object, attr, value))
            })
            .collect::<Vec<_>>()
            .join("\\n");
        writeln!(
            out,
            "    goal [label=\"Goal State\\n{}\", fillcolor=lightpink];",
            escape(&goal_label)
        )?;

        for (i, step) in plan.steps.iter().enumerate() {
            writeln!(out, "    step_{} [label=\"{}\"];", i, escape(&step.to_string()))?;
        }

        let mut previous = "initial".to_string();
        for i in 0..plan.steps.len() {
            let current = format!("step_{}", i);
            writeln!(out, "    {} -> {} [label=\"{}\"];", previous, current, i + 1)?;
            previous = current;
        }
        writeln!(out, "    {} -> goal [color=red, penwidth=2.0];", previous)?;

        writeln!(out, "}}")
    }

    /// Write the DOT rendering of `plan` to `path`.
    pub fn write_plan(&self, initial: &State, plan: &Plan, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render(initial, plan).as_bytes())?;
        Ok(())
    }

    fn metrics_to_string(state: &State) -> String {
        let lines: Vec<String> = state
            .metrics()
            .iter()
            .flat_map(|(object, attrs)| {
                attrs
                    .iter()
                    .map(move |(attr, value)| format!("{}.{}: {}", object, attr, value))
            })
            .collect();
        escape(&lines.join("\\n"))
    }
}

/// Escapes double quotes for a DOT label; `\n` sequences are kept.
fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

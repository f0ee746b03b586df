// Scenario results and the final report table
use crate::colors::*;
use crate::error::{Failure, Outcome};

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub failure: Option<Failure>,
}

impl ScenarioResult {
    pub fn from_outcome(name: &str, outcome: Outcome) -> Self {
        match outcome {
            Ok(()) => ScenarioResult { name: name.to_string(), passed: true, failure: None },
            Err(f) => ScenarioResult { name: name.to_string(), passed: false, failure: Some(f) },
        }
    }

    pub fn is_environmental(&self) -> bool {
        self.failure.as_ref().is_some_and(|f| f.kind.is_environmental())
    }
}

pub fn all_passed(results: &[ScenarioResult]) -> bool {
    results.iter().all(|r| r.passed)
}

const HEAD_TEST: &str = "Test";
const HEAD_RESULT: &str = "Result";

/// Two-column table, one row per scenario in execution order, followed by
/// any environment problems that made a row fail.
pub fn render(results: &[ScenarioResult], color: bool) -> String {
    let w1 = results.iter().map(|r| r.name.len()).chain([HEAD_TEST.len()]).max().unwrap_or(0);
    let w2 = HEAD_RESULT.len().max("False".len());
    let rule = format!("+{}+{}+\n", "-".repeat(w1 + 2), "-".repeat(w2 + 2));

    let mut o = String::new();
    o.push_str(&rule);
    o.push_str(&format!("| {HEAD_TEST:<w1$} | {HEAD_RESULT:^w2$} |\n"));
    o.push_str(&rule);
    for r in results {
        let cell = format!("{:^w2$}", if r.passed { "True" } else { "False" });
        let cell = if color {
            format!("{}{cell}{RESET}", verdict_color(r.passed))
        } else {
            cell
        };
        o.push_str(&format!("| {:<w1$} | {cell} |\n", r.name));
    }
    o.push_str(&rule);

    let env: Vec<&ScenarioResult> = results.iter().filter(|r| r.is_environmental()).collect();
    if !env.is_empty() {
        o.push_str("Environment problems (not target defects):\n");
        for r in env {
            if let Some(f) = &r.failure {
                o.push_str(&format!("  {}: {}\n", r.name, f));
            }
        }
    }
    o
}

// Fixed-order scenario execution with one fresh port per scenario
use std::time::Instant;

use crate::config::Config;
use crate::error::Outcome;
use crate::report::ScenarioResult;
use crate::scenarios::Scenario;

/// Hands out one port per scenario, never the same one twice. A port whose
/// previous owner is still in TIME_WAIT is simply never asked for again.
pub struct PortAllocator {
    next: u16,
}

impl PortAllocator {
    pub fn new(base: u16) -> Self {
        PortAllocator { next: base }
    }

    pub fn next_port(&mut self) -> u16 {
        let p = self.next;
        self.next = self.next.saturating_add(1);
        p
    }
}

/// Scenarios chosen with `--only <key>` (repeatable). No flag means all.
/// Unknown keys are returned as the error.
pub fn select(args: &[String]) -> Result<Vec<Scenario>, String> {
    let keys: Vec<&String> = args.windows(2)
        .filter(|w| w[0] == "--only")
        .map(|w| &w[1])
        .collect();
    if keys.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    let mut picked = Vec::new();
    for k in keys {
        match Scenario::from_key(k) {
            Some(s) => picked.push(s),
            None => return Err(k.clone()),
        }
    }
    Ok(picked)
}

/// Build the target, then run the selected scenarios. Only a build failure
/// aborts the run.
pub async fn run(cfg: &Config, selected: &[Scenario]) -> Outcome<Vec<ScenarioResult>> {
    if let Err(e) = std::fs::create_dir_all(&cfg.harness.artifacts_dir) {
        crate::log::warn(&format!("cannot create {}: {e}", cfg.harness.artifacts_dir));
    }
    if cfg.target.compile {
        crate::log::info(&format!("Compiling {}", cfg.target.executable));
        crate::compile::build(cfg).await?;
    }
    crate::log::separator();
    let mut ports = PortAllocator::new(cfg.harness.base_port);
    Ok(run_scenarios(cfg, &mut ports, selected).await)
}

/// Skipped scenarios still consume their port so numbering matches a full run.
pub async fn run_scenarios(cfg: &Config, ports: &mut PortAllocator, selected: &[Scenario]) -> Vec<ScenarioResult> {
    let mut results = Vec::with_capacity(selected.len());
    for sc in Scenario::ALL {
        let port = ports.next_port();
        if !selected.contains(&sc) {
            crate::log::debug(&format!("skipping {} (port {port})", sc.name()));
            continue;
        }
        crate::log::scenario(sc.name(), port);
        let started = Instant::now();
        let outcome = sc.run(cfg, port).await;
        let r = ScenarioResult::from_outcome(sc.name(), outcome);
        crate::log::verdict(&r.name, r.passed, started.elapsed().as_millis());
        if let Some(f) = &r.failure {
            if f.kind.is_environmental() {
                crate::log::warn(&format!("{}: {f}", r.name));
            } else {
                crate::log::error(&format!("{}: {f}", r.name));
            }
        }
        results.push(r);
    }
    results
}

//! PhaseReport -> human/json string formatting.
//!
//! - **Human** (default): one line per metric, then the final status message
//! - **JSON** (`--json`): `serde_json::to_string_pretty` of the report list

use serde::Serialize;
use strata_bench_engine::PhaseReport;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// A phase report plus the status message captured when it finished.
#[derive(Debug, Serialize)]
pub struct PhaseOutput {
    #[serde(flatten)]
    pub report: PhaseReport,
    pub status: String,
}

/// Format one finished phase for humans.
pub fn format_phase(output: &PhaseOutput) -> String {
    let r = &output.report;
    let name = match r.phase {
        strata_bench_engine::Phase::Load => "Load",
        strata_bench_engine::Phase::Run => "Run",
    };
    format!(
        "{name} runtime(sec): {:.3}\n\
         {name} operations(ops): {}\n\
         {name} throughput(ops/sec): {:.2}\n\
         {}",
        r.elapsed.as_secs_f64(),
        r.measured_operations,
        r.throughput,
        output.status,
        name = name,
    )
}

/// Format every phase according to `mode`.
pub fn format_all(outputs: &[PhaseOutput], mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => outputs
            .iter()
            .map(format_phase)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputMode::Json => serde_json::to_string_pretty(outputs)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
    }
}

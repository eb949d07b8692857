//! Human-readable rendering of analysis results
//!
//! A pure consumer of [`AnalysisResult`]: the analysis itself never prints.
//! JSON output comes for free from the serde derives on the result types.

use crate::AnalysisResult;
use anyhow::Result;
use std::fmt::Write as _;
use std::io::Write;
use taintflow_core::Function;

/// Render the result as indented report lines, seeds first, then tainted
/// instructions in discovery order with their source locations when present.
pub fn render(result: &AnalysisResult, function: &Function) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "taint analysis of function {:?}", result.function);

    if result.seeds.is_empty() {
        let _ = writeln!(out, "  no taint source call sites");
    }
    for seed in &result.seeds {
        let _ = writeln!(
            out,
            "  seed {} via {}",
            seed.operand,
            function.render(seed.call)
        );
    }

    for observation in &result.observations {
        match &observation.location {
            Some(location) => {
                let _ = writeln!(
                    out,
                    "  tainted: {} at {}",
                    function.render(observation.value),
                    location
                );
            }
            None => {
                let _ = writeln!(out, "  tainted: {}", function.render(observation.value));
            }
        }
    }

    out
}

/// Write the rendered report to any `io::Write` sink
pub fn write_report(
    writer: &mut impl Write,
    result: &AnalysisResult,
    function: &Function,
) -> Result<()> {
    writer.write_all(render(result, function).as_bytes())?;
    Ok(())
}

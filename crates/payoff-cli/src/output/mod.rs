pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Locate the month-by-month schedule inside a result envelope.
///
/// Single projections carry it at `result.schedule`; comparisons and card
/// calculators nest it under scenario B (the alternative being evaluated).
pub fn find_schedule(result: &Value) -> Option<&Vec<Value>> {
    let candidates = [
        "/schedule",
        "/b/projection/schedule",
        "/comparison/b/projection/schedule",
    ];
    candidates
        .iter()
        .find_map(|ptr| result.pointer(ptr))
        .and_then(Value::as_array)
}

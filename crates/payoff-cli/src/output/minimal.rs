use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for the headline field of each calculator in priority order, then
/// falls back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_pointers = [
        "/total_cost_of_late_payment",
        "/comparison/net_savings",
        "/comparison/interest_delta",
        "/net_savings",
        "/interest_delta",
        "/months_to_payoff",
    ];

    for ptr in &priority_pointers {
        if let Some(val) = result_obj.pointer(ptr) {
            if !val.is_null() {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    // Non-amortizing comparisons leave every delta null
    if let Some(status) = result_obj
        .pointer("/comparison/status")
        .or_else(|| result_obj.pointer("/status"))
    {
        println!("status: {}", format_minimal(status));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

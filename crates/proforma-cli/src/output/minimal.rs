use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object. Row results
/// (sensitivity, validation) print one line per row.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "equity_irr",
        "irr_pct",
        "lp_total_distributed",
        "development_margin",
        "noi",
        "total_project_cost",
    ];

    match result_obj {
        Value::Object(map) => {
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }

            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
                return;
            }
        }
        Value::Array(rows) => {
            for row in rows {
                println!("{}", format_row(row));
            }
            return;
        }
        _ => {}
    }

    println!("{}", format_minimal(result_obj));
}

fn format_row(row: &Value) -> String {
    match row {
        Value::Object(map) => {
            if let Some(Value::String(message)) = map.get("message") {
                return message.clone();
            }
            map.values().map(format_minimal).collect::<Vec<_>>().join("\t")
        }
        other => format_minimal(other),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// When the result holds a list of records (schedule rows, collateral verdicts,
/// bureau facilities) the first such list becomes the CSV body. Otherwise a
/// two-column `field,value` listing of the result is written.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(_) => match first_record_list(result) {
            Some(arr) => write_array_csv(&mut wtr, arr),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                let mut pairs = Vec::new();
                scalar_pairs("", result, &mut pairs);
                for (key, val) in pairs {
                    let _ = wtr.write_record([key, val]);
                }
            }
        },
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

/// Depth-first search for an array whose first element is an object.
fn first_record_list(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))) => Some(arr),
        Value::Object(map) => map.values().find_map(first_record_list),
        _ => None,
    }
}

fn scalar_pairs(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                scalar_pairs(&name, val, out);
            }
        }
        other => out.push((prefix.to_string(), format_csv_value(other))),
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

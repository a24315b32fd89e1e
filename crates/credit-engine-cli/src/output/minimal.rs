use serde_json::Value;

/// Headline fields, most decisive first. Nested objects are searched too, so an
/// evaluation report yields its `decision` before any stage detail.
const PRIORITY_KEYS: &[&str] = &[
    "decision",
    "total_score",
    "label",
    "collateral_score",
    "installment",
    "payment",
    "score_points",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = headline(result_obj) {
        println!("{}", format_minimal(val));
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

/// First priority key found at the top level, then one level down.
fn headline(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            return Some(val);
        }
    }
    map.values()
        .filter(|v| v.is_object())
        .find_map(|nested| {
            let nested = nested.as_object()?;
            PRIORITY_KEYS
                .iter()
                .find_map(|key| nested.get(*key).filter(|v| !v.is_null()))
        })
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

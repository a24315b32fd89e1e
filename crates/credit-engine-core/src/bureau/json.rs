//! Locate the facility array inside an arbitrarily nested JSON export.
//!
//! SLIK exports arrive in several wrappers (`{"data": {"fasilitas": [...]}}`,
//! bare arrays, per-lender groups). Rather than hard-coding paths, every array
//! of objects in the tree is scored by how many schema fields its keys cover.
//! The winner is the highest score, then the longest array, then the first
//! encountered in document order (`serde_json` is built with `preserve_order`).

use std::collections::BTreeSet;

use serde_json::Value;

use crate::fields::{normalize_key, record_from_json, scalar_text, first_present};

use super::schema::{schema_match_count, BORROWER_NAME_KEYS};
use super::table::{BureauTable, TableSource};

/// A scored array of record-like objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub path: String,
    pub score: usize,
    pub items: &'a [Value],
}

/// Every array holding at least one object, with its schema score, in document order.
pub fn collect_candidates(root: &Value) -> Vec<Candidate<'_>> {
    let mut out = Vec::new();
    walk(root, "$".to_string(), &mut out);
    out
}

fn walk<'a>(value: &'a Value, path: String, out: &mut Vec<Candidate<'a>>) {
    match value {
        Value::Array(items) => {
            if items.iter().any(Value::is_object) {
                let keys: BTreeSet<String> = items
                    .iter()
                    .filter_map(Value::as_object)
                    .flat_map(|obj| obj.keys().map(|k| normalize_key(k)))
                    .collect();
                out.push(Candidate {
                    path: path.clone(),
                    score: schema_match_count(&keys),
                    items,
                });
            }
            for (i, item) in items.iter().enumerate() {
                walk(item, format!("{path}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                walk(v, format!("{path}.{k}"), out);
            }
        }
        _ => {}
    }
}

/// Highest score wins, then longer arrays; earlier candidates win remaining ties.
pub fn best_candidate<'c, 'a>(candidates: &'c [Candidate<'a>]) -> Option<&'c Candidate<'a>> {
    let mut best: Option<&'c Candidate<'a>> = None;
    for c in candidates.iter().filter(|c| c.score > 0) {
        let better = match best {
            None => true,
            Some(b) => (c.score, c.items.len()) > (b.score, b.items.len()),
        };
        if better {
            best = Some(c);
        }
    }
    best
}

/// Build a table from a JSON document, or `None` when nothing record-like exists.
pub fn table_from_json(root: &Value) -> Option<BureauTable> {
    let candidates = collect_candidates(root);
    if let Some(best) = best_candidate(&candidates) {
        tracing::debug!(path = %best.path, score = best.score, len = best.items.len(), "selected bureau record array");
        let objects: Vec<&serde_json::Map<String, Value>> =
            best.items.iter().filter_map(Value::as_object).collect();
        return Some(table_from_objects(
            &objects,
            TableSource::JsonArray {
                path: best.path.clone(),
            },
        ));
    }

    let obj = root.as_object()?;
    let keys: BTreeSet<String> = obj.keys().map(|k| normalize_key(k)).collect();
    if schema_match_count(&keys) >= 1 {
        tracing::debug!("treating root JSON object as a single record");
        Some(table_from_objects(&[obj], TableSource::JsonObject))
    } else {
        None
    }
}

/// Headers are the union of keys in first-seen order; nested values are dropped.
fn table_from_objects(
    objects: &[&serde_json::Map<String, Value>],
    source: TableSource,
) -> BureauTable {
    let mut headers: Vec<String> = Vec::new();
    for obj in objects {
        for (k, v) in obj.iter() {
            if scalar_text(v).is_some() && !headers.contains(k) {
                headers.push(k.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).and_then(scalar_text).unwrap_or_default())
                .collect()
        })
        .collect();

    BureauTable {
        source,
        headers,
        rows,
    }
}

/// Depth-first search of objects (not arrays) for a borrower name field.
pub fn find_borrower_name(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    if let Some(name) = first_present(&record_from_json(obj), BORROWER_NAME_KEYS) {
        return Some(name.to_string());
    }
    obj.values().find_map(find_borrower_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_finds_nested_array() {
        let doc = json!({
            "header": {"nama_debitur": "Siti Aminah"},
            "data": {
                "fasilitas": [
                    {"nama_pelapor": "BRI", "kualitas": "1", "baki_debet": "5000000"},
                    {"nama_pelapor": "BNI", "kualitas": "2", "baki_debet": "1000000"}
                ]
            }
        });
        let table = table_from_json(&doc).unwrap();
        assert_eq!(
            table.source,
            TableSource::JsonArray {
                path: "$.data.fasilitas".into()
            }
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(find_borrower_name(&doc), Some("Siti Aminah".to_string()));
    }

    #[test]
    fn test_higher_score_beats_longer_array() {
        let doc = json!({
            "contacts": [{"phone": "1"}, {"phone": "2"}, {"phone": "3"}, {"kol": "x"}],
            "facilities": [{"lender": "A", "quality": "1", "plafond": "10"}]
        });
        let candidates = collect_candidates(&doc);
        let best = best_candidate(&candidates).unwrap();
        assert_eq!(best.path, "$.facilities");
        assert_eq!(best.score, 3);
    }

    #[test]
    fn test_tie_prefers_longer_then_first() {
        let doc = json!([
            {"a": [{"kol": "1"}]},
            {"b": [{"kol": "1"}, {"kol": "2"}]},
            {"c": [{"kol": "3"}, {"kol": "4"}]}
        ]);
        let candidates = collect_candidates(&doc);
        let best = best_candidate(&candidates).unwrap();
        assert_eq!(best.path, "$[1].b");
    }

    #[test]
    fn test_root_object_single_record() {
        let doc = json!({"lender_name": "BCA", "quality_code": 1, "meta": {"x": 1}});
        let table = table_from_json(&doc).unwrap();
        assert_eq!(table.source, TableSource::JsonObject);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.headers, vec!["lender_name".to_string(), "quality_code".to_string()]);
    }

    #[test]
    fn test_document_order_is_kept() {
        let doc: Value = serde_json::from_str(
            r#"{"zz": [{"kol": "1"}, {"kol": "2"}], "aa": [{"kol": "3"}, {"kol": "4"}]}"#,
        )
        .unwrap();
        let table = table_from_json(&doc).unwrap();
        assert_eq!(table.source, TableSource::JsonArray { path: "$.zz".into() });

        let doc: Value =
            serde_json::from_str(r#"[{"plafon": 10, "kualitas": "1", "bank": "BRI"}]"#).unwrap();
        let table = table_from_json(&doc).unwrap();
        assert_eq!(table.headers, vec!["plafon", "kualitas", "bank"]);
    }

    #[test]
    fn test_nothing_record_like() {
        assert_eq!(table_from_json(&json!({"foo": [{"bar": 1}]})), None);
        assert_eq!(table_from_json(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_union_headers_fill_missing_cells() {
        let doc = json!([{"kol": "1"}, {"kol": "2", "plafon": 100}]);
        let table = table_from_json(&doc).unwrap();
        assert_eq!(table.headers, vec!["kol".to_string(), "plafon".to_string()]);
        assert_eq!(table.rows[0], vec!["1".to_string(), String::new()]);
        assert_eq!(table.rows[1], vec!["2".to_string(), "100".to_string()]);
    }
}

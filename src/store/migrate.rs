use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::models::{coerce_cadence, Friction, Routine, Season};

/// Decodes a persisted snapshot. Corrupt or non-array data yields an empty
/// collection; individual entries that cannot be decoded are dropped.
pub fn load_routines(raw: &str) -> Vec<Routine> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::warn!("Stored routines are not an array, starting empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Stored routines are not valid JSON, starting empty: {}", e);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match decode(item) {
            Ok(routine) => Some(routine),
            Err(e) => {
                tracing::warn!("Dropping unreadable stored routine: {}", e);
                None
            }
        })
        .collect()
}

/// Validates and decodes an import payload. On rejection returns the reason.
pub fn parse_import(raw: &str) -> std::result::Result<Vec<Routine>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("not valid JSON: {e}"))?;
    let Value::Array(items) = value else {
        return Err("not an array".to_string());
    };

    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            return Err(format!("entry {index} is not an object"));
        };
        let id = non_empty_str(obj, "id")
            .ok_or_else(|| format!("entry {index} has no id"))?;
        if non_empty_str(obj, "name").is_none() {
            return Err(format!("entry {index} has no name"));
        }
        if !obj.get("cadenceDays").is_some_and(Value::is_number) {
            return Err(format!("entry {index} has no numeric cadenceDays"));
        }
        if !seen.insert(id.to_string()) {
            return Err(format!("duplicate id '{id}'"));
        }
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode(item).map_err(|e| format!("entry {index}: {e}")))
        .collect()
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn decode(item: Value) -> serde_json::Result<Routine> {
    let mut routine: Routine = serde_json::from_value(migrate_routine(item))?;
    routine.sort_history();
    if !routine.history.is_empty() {
        routine.refresh_last_completed();
    }
    Ok(routine)
}

/// Brings an older stored routine up to the current shape.
fn migrate_routine(mut value: Value) -> Value {
    let Some(obj) = value.as_object_mut() else {
        return value;
    };

    for key in ["lastCompletedAt", "skippedUntil"] {
        if obj.get(key).and_then(Value::as_str) == Some("") {
            obj.insert(key.to_string(), Value::Null);
        }
    }

    let mut history: Vec<Value> = match obj.remove("history") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                // legacy plain-timestamp entries
                Value::String(date) => Some(json!({ "date": date })),
                Value::Object(map) if map.get("date").is_some_and(Value::is_string) => {
                    Some(Value::Object(map))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    if history.is_empty() {
        if let Some(last) = obj.get("lastCompletedAt").and_then(Value::as_str) {
            history.push(json!({ "date": last }));
        }
    }
    obj.insert("history".to_string(), Value::Array(history));

    if !obj.get("tags").is_some_and(Value::is_array) {
        obj.insert("tags".to_string(), json!([]));
    }

    let blank_link = match obj.get("link") {
        Some(Value::String(link)) => link.trim().is_empty(),
        Some(Value::Null) => true,
        _ => false,
    };
    if blank_link {
        obj.remove("link");
    }

    if obj.get("isArchived") == Some(&Value::Null) {
        obj.remove("isArchived");
    }

    let overrides = match obj.remove("cadenceBySeason") {
        Some(Value::Object(map)) => season_overrides(map),
        _ => None,
    };
    if let Some(overrides) = overrides {
        obj.insert("cadenceBySeason".to_string(), overrides);
    }

    let known_friction = obj
        .get("friction")
        .and_then(Value::as_str)
        .is_some_and(|f| f.parse::<Friction>().is_ok());
    if !known_friction {
        obj.remove("friction");
    } else if let Some(Value::String(f)) = obj.get_mut("friction") {
        *f = f.trim().to_ascii_lowercase();
    }

    value
}

/// Keeps usable per-season cadences, truncated to whole days. Unknown seasons
/// and non-numeric or non-positive values are dropped one by one.
fn season_overrides(map: Map<String, Value>) -> Option<Value> {
    let kept: Map<String, Value> = map
        .into_iter()
        .filter(|(season, _)| season.parse::<Season>().is_ok())
        .filter_map(|(season, days)| {
            let days = days.as_f64().filter(|d| d.is_finite() && *d >= 1.0)?;
            Some((season, json!(coerce_cadence(days))))
        })
        .collect();
    (!kept.is_empty()).then_some(Value::Object(kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;

    #[test]
    fn corrupt_snapshots_load_empty() {
        assert!(load_routines("{not json").is_empty());
        assert!(load_routines(r#"{"id": "r1"}"#).is_empty());
        assert!(load_routines("null").is_empty());
    }

    #[test]
    fn legacy_string_history_becomes_events() {
        let raw = r#"[{
            "id": "r1",
            "name": "Hair",
            "cadenceDays": 30,
            "friction": "medium",
            "lastCompletedAt": "2026-04-02T10:00:00.000Z",
            "skippedUntil": null,
            "history": ["2026-03-01T10:00:00.000Z", "2026-04-02T10:00:00.000Z"]
        }]"#;

        let routines = load_routines(raw);

        assert_eq!(routines.len(), 1);
        let history = &routines[0].history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, at("2026-04-02T10:00:00Z"));
        assert_eq!(history[1].date, at("2026-03-01T10:00:00Z"));
        assert!(routines[0].tags.is_empty());
    }

    #[test]
    fn synthesizes_history_from_last_completed() {
        let raw = r#"[{
            "id": "r1",
            "name": "Nails",
            "cadenceDays": 10,
            "lastCompletedAt": "2026-04-02T10:00:00Z",
            "link": ""
        }]"#;

        let routines = load_routines(raw);

        assert_eq!(routines[0].history.len(), 1);
        assert_eq!(routines[0].history[0].date, at("2026-04-02T10:00:00Z"));
        assert_eq!(routines[0].link, None);
    }

    #[test]
    fn unreadable_entries_are_dropped_individually() {
        let raw = r#"[
            {"id": "ok", "name": "Brows", "cadenceDays": 21},
            {"id": "bad", "name": "Broken", "cadenceDays": "soon"}
        ]"#;

        let routines = load_routines(raw);

        assert_eq!(routines.len(), 1);
        assert_eq!(routines[0].id, "ok");
    }

    #[test]
    fn last_completed_follows_newest_history_entry() {
        let raw = r#"[{
            "id": "r1",
            "name": "Hair",
            "cadenceDays": 30,
            "lastCompletedAt": "2026-04-01T10:00:00Z",
            "history": [{"date": "2026-04-01T10:00:00Z"}, {"date": "2026-05-01T10:00:00Z"}]
        }]"#;

        let routines = load_routines(raw);

        assert_eq!(routines[0].history[0].date, at("2026-05-01T10:00:00Z"));
        assert_eq!(routines[0].last_completed_at, Some(at("2026-05-01T10:00:00Z")));
    }

    #[test]
    fn bad_season_overrides_and_friction_keep_the_routine() {
        let raw = r#"[{
            "id": "r1",
            "name": "Brows",
            "cadenceDays": 21,
            "friction": "extreme",
            "cadenceBySeason": {"winter": 27.6, "summer": -3, "autumn": 10},
            "history": [{"date": "2026-05-01T10:00:00Z"}]
        }, {
            "id": "r2",
            "name": "Nails",
            "cadenceDays": 10,
            "friction": "High",
            "cadenceBySeason": {"winter": null}
        }]"#;

        let routines = load_routines(raw);

        assert_eq!(routines.len(), 2);
        let brows = &routines[0];
        assert_eq!(brows.friction, Friction::Medium);
        assert_eq!(brows.season_override(Season::Winter), Some(27));
        assert_eq!(brows.season_override(Season::Summer), None);
        assert_eq!(brows.history.len(), 1);

        let nails = &routines[1];
        assert_eq!(nails.friction, Friction::High);
        assert_eq!(nails.cadence_by_season, None);
    }

    #[test]
    fn import_requires_name_id_and_numeric_cadence() {
        assert!(parse_import(r#"[{"id": "a", "cadenceDays": 7}]"#).is_err());
        assert!(parse_import(r#"[{"id": "", "name": "x", "cadenceDays": 7}]"#).is_err());
        assert!(parse_import(r#"[{"id": "a", "name": "x", "cadenceDays": "7"}]"#).is_err());
        assert!(parse_import(r#"[{"id": "a", "name": "x", "cadenceDays": 7}, 3]"#).is_err());
        assert!(parse_import(r#"{"id": "a"}"#).is_err());
        assert!(parse_import("garbage").is_err());
    }

    #[test]
    fn import_rejects_duplicate_ids() {
        let raw = r#"[
            {"id": "a", "name": "x", "cadenceDays": 7},
            {"id": "a", "name": "y", "cadenceDays": 3}
        ]"#;
        let err = parse_import(raw).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn import_rejects_undecodable_dates() {
        let raw = r#"[{"id": "a", "name": "x", "cadenceDays": 7, "skippedUntil": "next tuesday"}]"#;
        assert!(parse_import(raw).is_err());
    }

    #[test]
    fn import_accepts_minimal_entries() {
        let routines = parse_import(r#"[{"id": "a", "name": "x", "cadenceDays": 2.5}]"#)
            .expect("valid payload");
        assert_eq!(routines[0].cadence_days, 2);
        assert!(routines[0].history.is_empty());
    }
}

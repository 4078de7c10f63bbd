use crate::analysis::buckets::WeekStart;
use crate::analysis::forecast::VarianceFormula;
use crate::models::analytics::ParetoMetric;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveAnalyticsSettings {
    pub week_start: WeekStart,
    pub kpi_window_days: i64,
    pub sla_threshold_hours: f64,
    pub sprint_history_limit: usize,
    pub forecast_variance: VarianceFormula,
    pub pareto_metric: ParetoMetric,
    pub demo_seed: u64,
    pub demo_item_count: usize,
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_settings(workspace_path: String) -> Result<Value, String> {
    load_settings_from_disk(&workspace_path)
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn save_settings(workspace_path: String, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&workspace_path, settings)
}

pub fn load_effective_analytics_settings(
    workspace_path: &str,
) -> Result<EffectiveAnalyticsSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(effective_from_value(&settings))
}

fn effective_from_value(settings: &Value) -> EffectiveAnalyticsSettings {
    let u64_or = |key: &str, default: u64| settings.get(key).and_then(Value::as_u64).unwrap_or(default);
    let str_of = |key: &str| settings.get(key).and_then(Value::as_str).unwrap_or_default();

    EffectiveAnalyticsSettings {
        week_start: match str_of("weekStart") {
            "sunday" => WeekStart::Sunday,
            _ => WeekStart::Monday,
        },
        kpi_window_days: u64_or("kpiWindowDays", 14) as i64,
        sla_threshold_hours: u64_or("slaThresholdHours", 72) as f64,
        sprint_history_limit: u64_or("sprintHistoryLimit", 10) as usize,
        forecast_variance: match str_of("forecastVariance") {
            "legacy" => VarianceFormula::Legacy,
            _ => VarianceFormula::Squared,
        },
        pareto_metric: match str_of("paretoMetric") {
            "count" => ParetoMetric::Count,
            _ => ParetoMetric::BlockedHours,
        },
        demo_seed: u64_or("demoSeed", 42),
        demo_item_count: u64_or("demoItemCount", 240) as usize,
    }
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_nuvio_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, resetting to defaults: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_nuvio_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("Saved settings for {workspace_path}");
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path).join(".nuvio").join("settings.json")
}

pub(crate) fn ensure_nuvio_dir(workspace_path: &str) -> Result<(), String> {
    let dir = Path::new(workspace_path).join(".nuvio");
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create .nuvio directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    // Runs before defaults are merged so a legacy day value is not shadowed.
    if version < 1 {
        migrate_sla_days_to_hours(&mut out);
    }

    if version < 2 {
        ensure_key(&mut out, "forecastVariance", json!("squared"));
        ensure_key(&mut out, "paretoMetric", json!("blockedHours"));
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "weekStart": "monday",
        "kpiWindowDays": 14,
        "slaThresholdHours": 72,
        "sprintHistoryLimit": 10,
        "forecastVariance": "squared",
        "paretoMetric": "blockedHours",
        "demoSeed": 42,
        "demoItemCount": 240
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn ensure_key(target: &mut Value, key: &str, value: Value) {
    if let Some(obj) = target.as_object_mut() {
        obj.entry(key.to_string()).or_insert(value);
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn migrate_sla_days_to_hours(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(days) = obj.remove("slaThresholdDays").and_then(|v| v.as_f64()) else {
        return;
    };
    if !obj.contains_key("slaThresholdHours") {
        obj.insert("slaThresholdHours".to_string(), json!((days * 24.0).round() as u64));
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "kpiWindowDays", 7, 28, 14);
    clamp_u64(obj, "slaThresholdHours", 1, 720, 72);
    clamp_u64(obj, "sprintHistoryLimit", 1, 52, 10);
    clamp_u64(obj, "demoItemCount", 10, 2000, 240);
    clamp_u64(obj, "demoSeed", 0, u64::MAX, 42);

    sanitize_enum(obj, "weekStart", &["monday", "sunday"], "monday");
    sanitize_enum(obj, "forecastVariance", &["squared", "legacy"], "squared");
    sanitize_enum(obj, "paretoMetric", &["blockedHours", "count"], "blockedHours");
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_legacy_sla_days_to_hours() {
        let migrated = migrate_settings(json!({ "slaThresholdDays": 2 }));

        assert_eq!(migrated["slaThresholdHours"], json!(48));
        assert!(migrated.get("slaThresholdDays").is_none());
        assert_eq!(migrated["forecastVariance"], json!("squared"));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn clamps_numbers_and_rejects_unknown_enums() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "kpiWindowDays": 90,
            "slaThresholdHours": 0,
            "weekStart": "friday",
            "paretoMetric": "count"
        }));

        assert_eq!(migrated["kpiWindowDays"], json!(28));
        assert_eq!(migrated["slaThresholdHours"], json!(1));
        assert_eq!(migrated["weekStart"], json!("monday"));
        assert_eq!(migrated["paretoMetric"], json!("count"));
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "demoSeed": 7 }));
        merge_settings(&mut existing, &json!({ "weekStart": "sunday" }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["weekStart"], json!("sunday"));
        assert_eq!(migrated["demoSeed"], json!(7));
        assert_eq!(migrated["sprintHistoryLimit"], json!(10));
    }

    #[test]
    fn defaults_hold_only_analytics_keys() {
        let migrated = migrate_settings(json!({}));
        let mut keys: Vec<&str> = migrated
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "demoItemCount",
                "demoSeed",
                "forecastVariance",
                "kpiWindowDays",
                "paretoMetric",
                "schema_version",
                "slaThresholdHours",
                "sprintHistoryLimit",
                "weekStart",
            ]
        );
    }

    #[test]
    fn effective_settings_follow_sanitized_values() {
        let effective = effective_from_value(&migrate_settings(json!({
            "schema_version": 2,
            "weekStart": "sunday",
            "forecastVariance": "legacy",
            "demoItemCount": 5
        })));

        assert_eq!(effective.week_start, WeekStart::Sunday);
        assert_eq!(effective.forecast_variance, VarianceFormula::Legacy);
        assert_eq!(effective.pareto_metric, ParetoMetric::BlockedHours);
        assert_eq!(effective.demo_item_count, 10);
        assert_eq!(effective.kpi_window_days, 14);
        assert_eq!(effective.sla_threshold_hours, 72.0);
    }
}

// src/sensors.rs

//! Consumer adapter: maps a snapshot onto named sensor readouts.
//!
//! Each announcement becomes one sensor, followed by three diagnostic
//! sensors (status, last update time, consecutive errors).

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::models::{AnnouncementRecord, InstanceKey, Snapshot};

const DOMAIN: &str = "planviewer";

/// What a sensor reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Announcement,
    Diagnostic,
}

/// One named, observable property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub unique_id: String,
    pub name: String,
    pub kind: SensorKind,
    pub state: Value,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// All sensors for one instance's snapshot.
pub fn sensors_for(key: &InstanceKey, snapshot: &Snapshot) -> Vec<Sensor> {
    let mut sensors = announcement_sensors(key, &snapshot.records);
    sensors.extend(diagnostic_sensors(key, snapshot));
    sensors
}

/// One sensor per announcement, numbered from 1 in page order.
pub fn announcement_sensors(key: &InstanceKey, records: &[AnnouncementRecord]) -> Vec<Sensor> {
    let municipality = municipality_label(&key.municipality);

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let position = index + 1;
            let title_slug = record.title.to_lowercase().replace(' ', "_");

            let mut attributes = Map::new();
            attributes.insert(
                "start_date".to_string(),
                record
                    .start_date
                    .map(|d| json!(d.format("%Y-%m-%d").to_string()))
                    .unwrap_or(Value::Null),
            );
            attributes.insert("end_date".to_string(), json!(record.end_date));
            attributes.insert("link".to_string(), json!(record.link));

            Sensor {
                unique_id: format!(
                    "{DOMAIN}_{municipality}_{}_{position}_{title_slug}",
                    key.name
                ),
                name: format!("{municipality} {position}"),
                kind: SensorKind::Announcement,
                state: json!(record.title),
                attributes,
            }
        })
        .collect()
}

/// Status, last update and error count readouts.
pub fn diagnostic_sensors(key: &InstanceKey, snapshot: &Snapshot) -> Vec<Sensor> {
    let municipality = municipality_label(&key.municipality);
    let health = snapshot.health();

    let readouts = [
        (
            "last_update_status",
            "Last Update Status",
            json!(health.status.to_string()),
        ),
        (
            "last_update_time",
            "Coordinator Last Update",
            health
                .last_success_at
                .map(|t| json!(t.to_rfc3339()))
                .unwrap_or(Value::Null),
        ),
        (
            "consecutive_errors",
            "Consecutive Update Errors",
            json!(health.consecutive_error_count),
        ),
    ];

    readouts
        .into_iter()
        .map(|(data_key, label, state)| Sensor {
            unique_id: format!("{DOMAIN}_{municipality}_{}_diag_{data_key}", key.name),
            name: format!("{} {label}", key.name),
            kind: SensorKind::Diagnostic,
            state,
            attributes: Map::new(),
        })
        .collect()
}

fn municipality_label(municipality: &str) -> String {
    municipality.to_uppercase().replace(' ', "_")
}

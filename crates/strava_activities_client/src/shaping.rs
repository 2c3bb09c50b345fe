//! Projection of raw activities into export rows with derived columns.

use crate::{ActivityRecord, LatLng};
use chrono::NaiveDate;
use serde::Serialize;

/// Multiply a speed in m/s by this to get km/h.
pub const MPS_TO_KMH: f64 = 3.6;

const SECONDS_PER_DAY: u64 = 86_400;

/// One export row. Field order is the column order of the output file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShapedRecord {
    pub id: u64,
    pub start_date_local: String,
    pub distance: f64,
    pub moving_time_seconds: u64,
    pub start_latlng: String,
    pub average_speed: f64,
    pub max_speed: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub moving_time: String,
    pub distance_km: f64,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub average_speed_kmh: f64,
    pub max_speed_kmh: f64,
}

impl ShapedRecord {
    pub const COLUMNS: [&'static str; 14] = [
        "id",
        "start_date_local",
        "distance",
        "moving_time_seconds",
        "start_latlng",
        "average_speed",
        "max_speed",
        "type",
        "moving_time",
        "distance_km",
        "start_date",
        "start_time",
        "average_speed_kmh",
        "max_speed_kmh",
    ];
}

pub fn shape(record: &ActivityRecord) -> ShapedRecord {
    let local = record.start_date_local;
    ShapedRecord {
        id: record.id,
        start_date_local: local.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        distance: record.distance,
        moving_time_seconds: record.moving_time,
        start_latlng: format_latlng(record.start_latlng),
        average_speed: record.average_speed,
        max_speed: record.max_speed,
        activity_type: record.activity_type.clone(),
        moving_time: format_moving_time(record.moving_time),
        distance_km: record.distance / 1000.0,
        start_date: local.date_naive(),
        start_time: local.format("%H:%M").to_string(),
        average_speed_kmh: record.average_speed * MPS_TO_KMH,
        max_speed_kmh: record.max_speed * MPS_TO_KMH,
    }
}

/// Shape every record, keeping the provider's order.
pub fn shape_all(records: &[ActivityRecord]) -> Vec<ShapedRecord> {
    records.iter().map(shape).collect()
}

/// Render seconds as `H:MM:SS`, prefixed with `N day(s), ` past 24 hours.
pub fn format_moving_time(total_seconds: u64) -> String {
    let days = total_seconds / SECONDS_PER_DAY;
    let rest = total_seconds % SECONDS_PER_DAY;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

fn format_latlng(latlng: Option<LatLng>) -> String {
    match latlng {
        Some(LatLng { lat, lng }) => format!("[{lat}, {lng}]"),
        None => "[]".to_string(),
    }
}

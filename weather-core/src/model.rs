use serde::{Deserialize, Serialize};

/// Weather snapshot for a city at the present moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city_name: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed: f64,
    /// Short condition label, e.g. "Clouds".
    pub condition: String,
}

/// One periodic forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// UNIX timestamp in seconds.
    pub timestamp: i64,
    pub temperature_c: f64,
    pub icon: String,
    pub description: String,
}

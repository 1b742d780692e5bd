//! Pure derivation of what to show from a [`LookupState`].

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::{
    model::{CurrentConditions, ForecastEntry},
    view_model::LookupState,
};

pub const LOADING_TEXT: &str = "Loading...";
pub const PLACEHOLDER_TEXT: &str = "No weather data yet. Search for a city to get started.";
pub const SEARCH_PROMPT: &str = "Enter city name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A lookup is in flight; nothing else is shown.
    Loading,
    /// No data to show and not loading.
    Placeholder { error: Option<String> },
    Weather(WeatherView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherView {
    pub error: Option<String>,
    pub city: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind_speed: String,
    pub days: Vec<ForecastCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCard {
    /// Abbreviated weekday, e.g. "Mon".
    pub weekday: String,
    pub icon_url: String,
    pub description: String,
    pub temperature: String,
}

/// Build the view for `state`, formatting weekdays in `tz`.
pub fn render<Tz>(state: &LookupState, icon_base_url: &str, tz: &Tz) -> View
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if state.pending {
        return View::Loading;
    }

    match &state.current {
        Some(current) if !state.forecast.is_empty() => View::Weather(WeatherView {
            error: state.error.clone(),
            ..weather_view(current, &state.forecast, icon_base_url, tz)
        }),
        _ => View::Placeholder {
            error: state.error.clone(),
        },
    }
}

fn weather_view<Tz>(
    current: &CurrentConditions,
    forecast: &[ForecastEntry],
    icon_base_url: &str,
    tz: &Tz,
) -> WeatherView
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    WeatherView {
        error: None,
        city: current.city_name.clone(),
        temperature: format!("{}°C", current.temperature_c.floor() as i64),
        condition: current.condition.clone(),
        humidity: format!("{}%", round_half_up(current.humidity_pct)),
        wind_speed: format!("{} mph", round_half_up(current.wind_speed)),
        days: forecast
            .iter()
            .map(|entry| forecast_card(entry, icon_base_url, tz))
            .collect(),
    }
}

fn forecast_card<Tz>(entry: &ForecastEntry, icon_base_url: &str, tz: &Tz) -> ForecastCard
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let weekday = DateTime::from_timestamp(entry.timestamp, 0)
        .map(|dt| dt.with_timezone(tz).format("%a").to_string())
        .unwrap_or_default();

    ForecastCard {
        weekday,
        icon_url: format!("{}/{}.png", icon_base_url.trim_end_matches('/'), entry.icon),
        description: entry.description.clone(),
        temperature: format!("{}°C", round_half_up(entry.temperature_c)),
    }
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    let rounded = value.round();
    if (rounded - value).abs() == 0.5 {
        value.ceil() as i64
    } else {
        rounded as i64
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Loading => writeln!(f, "{LOADING_TEXT}"),
            View::Placeholder { error } => {
                if let Some(error) = error {
                    writeln!(f, "! {error}")?;
                }
                writeln!(f, "{PLACEHOLDER_TEXT}")?;
                writeln!(f, "{SEARCH_PROMPT}:")
            }
            View::Weather(view) => view.fmt(f),
        }
    }
}

impl fmt::Display for WeatherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "! {error}")?;
        }

        writeln!(f, "{}", self.city)?;
        writeln!(f, "{}  {}", self.temperature, self.condition)?;
        writeln!(f, "Humidity: {}   Wind Speed: {}", self.humidity, self.wind_speed)?;
        writeln!(f)?;
        writeln!(f, "{}-day Forecast", self.days.len())?;

        for day in &self.days {
            writeln!(
                f,
                "  {:<4} {:>5}  {} ({})",
                day.weekday, day.temperature, day.description, day.icon_url
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{SEARCH_PROMPT}:")
    }
}

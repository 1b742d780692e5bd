use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{Endpoint, ProviderError},
    model::{CurrentConditions, ForecastEntry},
};

use super::WeatherProvider;

const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            api_key,
            base_url: base_url.into(),
            http,
        })
    }

    async fn fetch_body(&self, endpoint: Endpoint, city: &str) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path());

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
            ])
            .send()
            .await
            .map_err(|source| ProviderError::Request { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<CurrentConditions, ProviderError> {
        let body = self.fetch_body(Endpoint::Current, city).await?;
        debug!(city, payload = %body, "raw current conditions response");

        parse_current(&body)
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, ProviderError> {
        let body = self.fetch_body(Endpoint::Forecast, city).await?;

        parse_forecast(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Parse a `/weather` body. The first weather descriptor supplies the label.
pub fn parse_current(body: &str) -> Result<CurrentConditions, ProviderError> {
    let endpoint = Endpoint::Current;
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|source| ProviderError::Parse { endpoint, source })?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or(ProviderError::MissingCondition { endpoint })?;

    Ok(CurrentConditions {
        city_name: parsed.name,
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        condition: condition.main,
    })
}

/// Parse a `/forecast` body into every sample, order preserved.
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastEntry>, ProviderError> {
    let endpoint = Endpoint::Forecast;
    let parsed: OwForecastResponse =
        serde_json::from_str(body).map_err(|source| ProviderError::Parse { endpoint, source })?;

    parsed
        .list
        .into_iter()
        .map(|entry| -> Result<ForecastEntry, ProviderError> {
            let weather = entry
                .weather
                .into_iter()
                .next()
                .ok_or(ProviderError::MissingCondition { endpoint })?;

            Ok(ForecastEntry {
                timestamp: entry.dt,
                temperature_c: entry.main.temp,
                icon: weather.icon,
                description: weather.description,
            })
        })
        .collect()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

use crate::{
    Config,
    error::ProviderError,
    model::{CurrentConditions, ForecastEntry},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`.
    async fn current(&self, city: &str) -> Result<CurrentConditions, ProviderError>;

    /// Raw periodic forecast samples for `city`, in chronological order.
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, ProviderError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.api_base_url.clone(),
        config.timeout(),
    )?;

    Ok(Arc::new(provider))
}

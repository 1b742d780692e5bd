//! The two-phase fetch behind a city lookup.
//!
//! Current conditions are requested first; the forecast is only requested if
//! that succeeds. The result records which phase failed instead of collapsing
//! every failure into one flag.

use tracing::debug;

use crate::{
    error::ProviderError,
    model::{CurrentConditions, ForecastEntry},
    provider::WeatherProvider,
};

/// Samples per day in a 3-hourly forecast series.
pub const SAMPLES_PER_DAY: usize = 8;

#[derive(Debug)]
pub enum LookupOutcome {
    Complete {
        current: CurrentConditions,
        forecast: Vec<ForecastEntry>,
    },
    CurrentFailed(ProviderError),
    ForecastFailed {
        current: CurrentConditions,
        error: ProviderError,
    },
}

impl LookupOutcome {
    pub fn status(&self) -> LookupStatus {
        match self {
            LookupOutcome::Complete { .. } => LookupStatus::Complete,
            LookupOutcome::CurrentFailed(_) => LookupStatus::CurrentFailed,
            LookupOutcome::ForecastFailed { .. } => LookupStatus::ForecastFailed,
        }
    }
}

/// How a lookup ended, as seen by whoever applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Complete,
    CurrentFailed,
    ForecastFailed,
    /// A newer lookup started before this one finished; its result was dropped.
    Superseded,
    /// The lookup ended without an outcome, e.g. its task panicked.
    Abandoned,
}

impl LookupStatus {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            LookupStatus::CurrentFailed | LookupStatus::ForecastFailed | LookupStatus::Abandoned
        )
    }
}

/// Run both requests for `city` and derive the daily forecast.
pub async fn fetch_lookup(provider: &dyn WeatherProvider, city: &str) -> LookupOutcome {
    let current = match provider.current(city).await {
        Ok(current) => current,
        Err(err) => return LookupOutcome::CurrentFailed(err),
    };

    match provider.forecast(city).await {
        Ok(samples) => {
            let forecast = daily_forecast(samples);
            debug!(city, days = forecast.len(), "lookup complete");
            LookupOutcome::Complete { current, forecast }
        }
        Err(error) => LookupOutcome::ForecastFailed { current, error },
    }
}

/// Keep one sample per day: every entry whose index is a multiple of
/// [`SAMPLES_PER_DAY`], in source order.
pub fn daily_forecast(samples: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
    samples.into_iter().step_by(SAMPLES_PER_DAY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub::{StubProvider, london, samples};

    #[test]
    fn daily_forecast_keeps_every_eighth_sample() {
        for n in [0usize, 1, 7, 8, 9, 16, 39, 40] {
            let raw = samples(n);
            let daily = daily_forecast(raw.clone());

            assert_eq!(daily.len(), n.div_ceil(SAMPLES_PER_DAY), "n = {n}");
            for (i, entry) in daily.iter().enumerate() {
                assert_eq!(*entry, raw[i * SAMPLES_PER_DAY]);
            }
        }
    }

    #[tokio::test]
    async fn complete_when_both_phases_succeed() {
        let provider = StubProvider {
            current: Some(london()),
            forecast: Some(samples(40)),
            ..Default::default()
        };

        let outcome = fetch_lookup(&provider, "london").await;

        assert_eq!(outcome.status(), LookupStatus::Complete);
        match outcome {
            LookupOutcome::Complete { current, forecast } => {
                assert_eq!(current, london());
                assert_eq!(forecast.len(), 5);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_failure_skips_forecast_request() {
        let provider = StubProvider {
            forecast: Some(samples(8)),
            ..Default::default()
        };

        let outcome = fetch_lookup(&provider, "nowhere123").await;

        assert_eq!(outcome.status(), LookupStatus::CurrentFailed);
        assert_eq!(provider.calls(), (1, 0));
    }

    #[tokio::test]
    async fn forecast_failure_carries_current() {
        let provider = StubProvider {
            current: Some(london()),
            ..Default::default()
        };

        match fetch_lookup(&provider, "london").await {
            LookupOutcome::ForecastFailed { current, error } => {
                assert_eq!(current.city_name, "London");
                assert_eq!(error.endpoint(), Some(crate::error::Endpoint::Forecast));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

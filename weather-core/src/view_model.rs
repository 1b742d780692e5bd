use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::SearchError,
    lookup::{LookupOutcome, LookupStatus, fetch_lookup},
    model::{CurrentConditions, ForecastEntry},
    provider::WeatherProvider,
};

/// Banner shown for any failed lookup.
pub const FETCH_FAILED_MESSAGE: &str = "Could not fetch data, please try again!";

/// Everything the view is derived from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupState {
    pub city: String,
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<ForecastEntry>,
    pub pending: bool,
    pub error: Option<String>,
    pub search_input: String,
}

/// Identifies one lookup. Only the most recently issued ticket may change state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    city: String,
}

impl LookupTicket {
    pub fn city(&self) -> &str {
        &self.city
    }
}

#[derive(Debug)]
pub struct WeatherViewModel {
    provider: Arc<dyn WeatherProvider>,
    default_city: String,
    state: LookupState,
    generation: u64,
    activated: bool,
}

impl WeatherViewModel {
    pub fn new(provider: Arc<dyn WeatherProvider>, default_city: impl Into<String>) -> Self {
        let default_city = default_city.into();
        Self {
            provider,
            state: LookupState {
                city: default_city.clone(),
                ..LookupState::default()
            },
            default_city,
            generation: 0,
            activated: false,
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    /// Load the default city on first activation. Later calls do nothing.
    pub async fn activate(&mut self) -> Option<LookupStatus> {
        if self.activated {
            return None;
        }
        self.activated = true;

        let city = self.default_city.clone();
        Some(self.load_city(&city).await)
    }

    /// Fetch current conditions and forecast for `name` and apply the result.
    pub async fn load_city(&mut self, name: &str) -> LookupStatus {
        let ticket = self.begin(name);
        let outcome = fetch_lookup(self.provider.as_ref(), name).await;
        self.finish(&ticket, outcome)
    }

    /// Start a lookup: records the city, marks the state pending and
    /// supersedes any lookup still in flight.
    pub fn begin(&mut self, name: &str) -> LookupTicket {
        self.generation += 1;
        self.activated = true;

        self.state.city = name.to_string();
        self.state.pending = true;
        self.state.error = None;

        debug!(city = name, generation = self.generation, "lookup started");

        LookupTicket {
            generation: self.generation,
            city: name.to_string(),
        }
    }

    /// Apply a finished lookup. Stale tickets leave the state untouched.
    pub fn finish(&mut self, ticket: &LookupTicket, outcome: LookupOutcome) -> LookupStatus {
        if ticket.generation != self.generation {
            debug!(
                city = %ticket.city,
                generation = ticket.generation,
                latest = self.generation,
                "dropping superseded lookup"
            );
            return LookupStatus::Superseded;
        }

        let status = outcome.status();
        match outcome {
            LookupOutcome::Complete { current, forecast } => {
                self.state.current = Some(current);
                self.state.forecast = forecast;
            }
            LookupOutcome::CurrentFailed(err) => {
                warn!(city = %ticket.city, error = %err, "current conditions lookup failed");
                self.state.error = Some(FETCH_FAILED_MESSAGE.to_string());
            }
            LookupOutcome::ForecastFailed { current, error } => {
                warn!(city = %ticket.city, error = %error, "forecast lookup failed");
                self.state.current = Some(current);
                self.state.error = Some(FETCH_FAILED_MESSAGE.to_string());
            }
        }

        self.state.pending = false;
        status
    }

    /// Give up on a lookup that produced no outcome, e.g. a task that panicked.
    /// The state shows the usual fetch failure banner.
    pub fn abandon(&mut self, ticket: &LookupTicket) -> LookupStatus {
        if ticket.generation != self.generation {
            return LookupStatus::Superseded;
        }

        self.state.error = Some(FETCH_FAILED_MESSAGE.to_string());
        self.state.pending = false;
        LookupStatus::Abandoned
    }

    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.state.search_input = input.into();
    }

    /// Validate and consume the search input.
    ///
    /// Returns the raw, untrimmed input and clears the field. Blank input sets
    /// the prompt message and leaves everything else alone.
    pub fn submit_search(&mut self) -> Result<String, SearchError> {
        if self.state.search_input.trim().is_empty() {
            self.state.error = Some(SearchError::EmptyInput.to_string());
            return Err(SearchError::EmptyInput);
        }

        Ok(std::mem::take(&mut self.state.search_input))
    }

    /// Submit the search input and, if it is not blank, look the city up.
    pub async fn search(&mut self) -> Result<LookupStatus, SearchError> {
        let city = self.submit_search()?;
        Ok(self.load_city(&city).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub::{StubProvider, london, samples};

    fn view_model(provider: StubProvider) -> (WeatherViewModel, Arc<StubProvider>) {
        let provider = Arc::new(provider);
        let vm = WeatherViewModel::new(provider.clone(), "london");
        (vm, provider)
    }

    fn healthy() -> StubProvider {
        StubProvider {
            current: Some(london()),
            forecast: Some(samples(40)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn activate_loads_default_city_once() {
        let (mut vm, provider) = view_model(healthy());

        assert_eq!(vm.activate().await, Some(LookupStatus::Complete));
        assert_eq!(vm.activate().await, None);

        assert_eq!(provider.calls(), (1, 1));
        assert_eq!(vm.state().city, "london");
        assert_eq!(vm.state().forecast.len(), 5);
        assert!(!vm.state().pending);
        assert!(vm.state().error.is_none());
    }

    #[tokio::test]
    async fn blank_search_sets_prompt_without_requests() {
        let (mut vm, provider) = view_model(healthy());
        vm.activate().await;
        let before = vm.state().clone();

        for input in ["", "   ", "\t\n"] {
            vm.set_search_input(input);
            assert_eq!(vm.search().await, Err(SearchError::EmptyInput));
        }

        let after = vm.state();
        assert_eq!(after.error.as_deref(), Some("Please enter a city name."));
        assert_eq!(after.city, before.city);
        assert_eq!(after.current, before.current);
        assert_eq!(after.forecast, before.forecast);
        assert_eq!(provider.calls(), (1, 1));
    }

    #[tokio::test]
    async fn search_uses_raw_input_and_clears_field() {
        let (mut vm, _) = view_model(healthy());

        vm.set_search_input("  paris ");
        assert_eq!(vm.search().await, Ok(LookupStatus::Complete));

        assert_eq!(vm.state().city, "  paris ");
        assert!(vm.state().search_input.is_empty());
    }

    #[tokio::test]
    async fn current_failure_sets_error_and_clears_pending() {
        let (mut vm, _) = view_model(StubProvider::default());

        let status = vm.load_city("nowhere123").await;

        assert_eq!(status, LookupStatus::CurrentFailed);
        assert!(status.is_failure());
        let state = vm.state();
        assert!(!state.pending);
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.city, "nowhere123");
        assert!(state.current.is_none());
    }

    #[tokio::test]
    async fn forecast_failure_keeps_stale_forecast() {
        let (mut vm, _) = view_model(healthy());
        vm.load_city("london").await;
        let old_forecast = vm.state().forecast.clone();

        let mut changed = london();
        changed.city_name = "Nowhere".to_string();
        vm.provider = Arc::new(StubProvider {
            current: Some(changed.clone()),
            ..Default::default()
        });

        let status = vm.load_city("nowhere123").await;

        assert_eq!(status, LookupStatus::ForecastFailed);
        let state = vm.state();
        assert!(!state.pending);
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.current.as_ref(), Some(&changed));
        assert_eq!(state.forecast, old_forecast);
    }

    #[tokio::test]
    async fn successful_lookup_clears_previous_error() {
        let (mut vm, _) = view_model(healthy());
        vm.set_search_input(" ");
        let _ = vm.submit_search();
        assert!(vm.state().error.is_some());

        vm.load_city("london").await;

        assert!(vm.state().error.is_none());
    }

    #[tokio::test]
    async fn superseded_ticket_is_ignored() {
        let (mut vm, provider) = view_model(healthy());

        let first = vm.begin("london");
        let second = vm.begin("paris");
        assert_eq!(second.city(), "paris");

        let stale = fetch_lookup(provider.as_ref(), first.city()).await;
        assert_eq!(vm.finish(&first, stale), LookupStatus::Superseded);
        assert!(vm.state().pending);
        assert!(vm.state().current.is_none());
        assert_eq!(vm.state().city, "paris");

        let fresh = fetch_lookup(provider.as_ref(), second.city()).await;
        assert_eq!(vm.finish(&second, fresh), LookupStatus::Complete);
        assert!(!vm.state().pending);
    }

    #[test]
    fn abandoning_latest_lookup_clears_pending() {
        let (mut vm, _) = view_model(healthy());

        let stale = vm.begin("london");
        let latest = vm.begin("paris");

        assert_eq!(vm.abandon(&stale), LookupStatus::Superseded);
        assert!(vm.state().pending);

        let status = vm.abandon(&latest);
        assert_eq!(status, LookupStatus::Abandoned);
        assert!(status.is_failure());
        assert!(!vm.state().pending);
        assert_eq!(vm.state().error.as_deref(), Some(FETCH_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn searching_a_new_city_loads_it_once() {
        let (mut vm, provider) = view_model(healthy());

        vm.set_search_input("paris");
        assert_eq!(vm.search().await, Ok(LookupStatus::Complete));

        assert_eq!(vm.state().city, "paris");
        assert_eq!(provider.calls(), (1, 1));
        assert_eq!(vm.activate().await, None);
        assert_eq!(provider.calls(), (1, 1));
    }

    #[tokio::test]
    async fn explicit_lookup_counts_as_activation() {
        let (mut vm, provider) = view_model(healthy());

        vm.load_city("paris").await;
        assert_eq!(vm.activate().await, None);
        assert_eq!(provider.calls(), (1, 1));
    }
}

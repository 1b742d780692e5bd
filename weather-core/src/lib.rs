//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider behind the `WeatherProvider` trait
//! - The two-phase city lookup and the view model that tracks its state
//! - Pure rendering of that state into a printable view
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod view;
pub mod view_model;

pub use config::Config;
pub use error::{Endpoint, ProviderError, SearchError};
pub use lookup::{LookupOutcome, LookupStatus, fetch_lookup};
pub use model::{CurrentConditions, ForecastEntry};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use view::{View, render};
pub use view_model::{FETCH_FAILED_MESSAGE, LookupState, LookupTicket, WeatherViewModel};

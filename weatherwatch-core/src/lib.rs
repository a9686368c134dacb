//! Core library for the Weather Watch client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream clients (OpenWeather weather, forecast and geocoding)
//! - The debounced search box and the fetch state machine
//! - An event loop tying them together for any front end
//!
//! It is used by `weatherwatch-cli`, but a different front end only needs an
//! [`AppHandle`] to drive it.

pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod model;
pub mod provider;
pub mod search;
pub mod view;

pub use app::{Action, App, AppClosed, AppHandle, AppOptions, Snapshot};
pub use config::Config;
pub use error::{Endpoint, WeatherError};
pub use model::{
    CommittedLocation, Condition, CurrentWeather, Forecast, ForecastSample, ForecastTab,
    Suggestion, Theme, Timeframe, TrendPoint,
};
pub use provider::{GeocodingProvider, OpenWeatherClient, WeatherProvider};
pub use view::FetchState;

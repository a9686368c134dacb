use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{CurrentWeather, Forecast, Suggestion},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of current conditions and three-hour forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError>;

    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError>;
}

/// Resolves partial location text into candidate places.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, WeatherError>;
}

pub(crate) fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

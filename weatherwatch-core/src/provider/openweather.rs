use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::{Config, Endpoints},
    error::{Endpoint, WeatherError},
    model::{CurrentWeather, Forecast, ForecastSample, Suggestion},
    provider::{GeocodingProvider, WeatherProvider, truncate_body, unix_to_utc},
};

/// OpenWeather client for current conditions, forecasts and geocoding.
///
/// Temperatures are requested without a `units` parameter, so they arrive
/// in Kelvin.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    endpoints: Endpoints,
    suggestion_limit: u8,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, endpoints: Endpoints) -> Self {
        Self { api_key, http: Client::new(), endpoints, suggestion_limit: 5 }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_api_key()?.to_owned();
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            http,
            endpoints: config.endpoints.clone(),
            suggestion_limit: config.suggestion_limit,
        })
    }

    pub fn with_suggestion_limit(mut self, limit: u8) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// GET `url` and decode the JSON body.
    ///
    /// A 404 becomes `NotFound` only when `location` is given; the geocoding
    /// endpoint answers unknown text with an empty list instead.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &str,
        query: &[(&str, &str)],
        location: Option<&str>,
    ) -> Result<T, WeatherError> {
        debug!(%endpoint, url, "sending request");

        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::unavailable(endpoint, e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::unavailable(endpoint, e.to_string()))?;

        if let (StatusCode::NOT_FOUND, Some(location)) = (status, location) {
            return Err(WeatherError::not_found(location));
        }

        if !status.is_success() {
            return Err(WeatherError::unavailable(
                endpoint,
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::malformed(endpoint, e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    name: String,
    country: String,
    state: Option<String>,
}

fn first_weather(weather: &[OwWeather], endpoint: Endpoint) -> Result<&OwWeather, WeatherError> {
    weather
        .first()
        .ok_or_else(|| WeatherError::malformed(endpoint, "empty `weather` array"))
}

fn timestamp(dt: i64, endpoint: Endpoint) -> Result<chrono::DateTime<chrono::Utc>, WeatherError> {
    unix_to_utc(dt).ok_or_else(|| WeatherError::malformed(endpoint, format!("bad timestamp {dt}")))
}

impl TryFrom<OwForecastEntry> for ForecastSample {
    type Error = WeatherError;

    fn try_from(entry: OwForecastEntry) -> Result<Self, Self::Error> {
        let time = timestamp(entry.dt, Endpoint::Forecast)?;
        let weather = first_weather(&entry.weather, Endpoint::Forecast)?;

        Ok(ForecastSample {
            time,
            temp_k: entry.main.temp,
            temp_min_k: entry.main.temp_min.unwrap_or(entry.main.temp),
            temp_max_k: entry.main.temp_max.unwrap_or(entry.main.temp),
            feels_like_k: entry.main.feels_like,
            humidity_pct: entry.main.humidity,
            wind_speed_mps: entry.wind.speed,
            condition: weather.main.clone(),
            description: weather.description.clone(),
            icon: weather.icon.clone(),
            pop: entry.pop,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/weather", self.endpoints.weather_base);
        let parsed: OwCurrentResponse = self
            .get_json(Endpoint::Current, &url, &[("q", location)], Some(location))
            .await?;

        let observation_time = timestamp(parsed.dt, Endpoint::Current)?;
        let weather = first_weather(&parsed.weather, Endpoint::Current)?;

        Ok(CurrentWeather {
            location_name: parsed.name,
            observation_time,
            temp_k: parsed.main.temp,
            feels_like_k: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            condition: weather.main.clone(),
            description: weather.description.clone(),
            icon: weather.icon.clone(),
        })
    }

    async fn forecast(&self, location: &str) -> Result<Forecast, WeatherError> {
        let url = format!("{}/forecast", self.endpoints.weather_base);
        let parsed: OwForecastResponse = self
            .get_json(Endpoint::Forecast, &url, &[("q", location)], Some(location))
            .await?;

        let samples = parsed
            .list
            .into_iter()
            .map(ForecastSample::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(location, samples = samples.len(), "forecast received");
        Ok(Forecast { samples })
    }
}

#[async_trait]
impl GeocodingProvider for OpenWeatherClient {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, WeatherError> {
        let limit = self.suggestion_limit.to_string();
        let parsed: Vec<OwGeocodeEntry> = self
            .get_json(
                Endpoint::Geocoding,
                &self.endpoints.geocode_base,
                &[("q", query), ("limit", limit.as_str())],
                None,
            )
            .await?;

        Ok(parsed
            .into_iter()
            .map(|e| Suggestion { name: e.name, country: e.country, region: e.state })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: serde_json::Value) -> OwForecastEntry {
        serde_json::from_value(json).expect("entry should deserialize")
    }

    #[test]
    fn forecast_entry_defaults_pop_and_extremes() {
        let sample = ForecastSample::try_from(entry(serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 290.0, "feels_like": 289.0, "humidity": 70 },
            "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 3.5 }
        })))
        .expect("sample should convert");

        assert_eq!(sample.pop, 0.0);
        assert_eq!(sample.temp_min_k, 290.0);
        assert_eq!(sample.temp_max_k, 290.0);
        assert_eq!(sample.condition, "Rain");
    }

    #[test]
    fn forecast_entry_without_weather_is_malformed() {
        let err = ForecastSample::try_from(entry(serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 290.0, "feels_like": 289.0, "humidity": 70 },
            "weather": [],
            "wind": { "speed": 3.5 }
        })))
        .unwrap_err();

        assert!(matches!(
            err,
            WeatherError::MalformedResponse { endpoint: Endpoint::Forecast, .. }
        ));
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = OpenWeatherClient::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Forecast samples are three hours apart, so eight of them span a day.
pub const SAMPLES_PER_DAY: usize = 8;

/// Number of points shown in a trend series.
pub const TREND_POINTS: usize = 5;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Round to one decimal place, the precision temperatures are shown with.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}

/// A location string handed to the weather lookup. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommittedLocation(String);

impl CommittedLocation {
    /// Trim `raw`; `None` when nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommittedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One candidate place returned by the geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub country: String,
    pub region: Option<String>,
}

impl Suggestion {
    /// `name[, region], country`, the string committed when this suggestion is picked.
    pub fn label(&self) -> String {
        match self.region.as_deref().filter(|r| !r.is_empty()) {
            Some(region) => format!("{}, {}, {}", self.name, region, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location_name: String,
    pub observation_time: DateTime<Utc>,
    pub temp_k: f64,
    pub feels_like_k: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Short group such as "Rain" or "Clear".
    pub condition: String,
    pub description: String,
    pub icon: String,
}

impl CurrentWeather {
    pub fn temp_c(&self) -> f64 {
        kelvin_to_celsius(self.temp_k)
    }

    pub fn feels_like_c(&self) -> f64 {
        kelvin_to_celsius(self.feels_like_k)
    }
}

/// A single three-hour forecast entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub time: DateTime<Utc>,
    pub temp_k: f64,
    pub temp_min_k: f64,
    pub temp_max_k: f64,
    pub feels_like_k: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Probability of precipitation, 0..=1.
    pub pop: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    pub samples: Vec<ForecastSample>,
}

impl Forecast {
    pub fn hourly(&self) -> &[ForecastSample] {
        &self.samples
    }

    /// One sample per day, read from offsets 0, 8, 16, ...
    ///
    /// This is a sampling of the three-hour series; nothing is averaged.
    pub fn daily(&self) -> Vec<&ForecastSample> {
        self.samples.iter().step_by(SAMPLES_PER_DAY).collect()
    }

    pub fn trends(&self, timeframe: Timeframe) -> Vec<TrendPoint> {
        let points: Vec<&ForecastSample> = match timeframe {
            Timeframe::Daily => self.samples.iter().take(TREND_POINTS).collect(),
            Timeframe::Weekly => self.daily().into_iter().take(TREND_POINTS).collect(),
        };

        points.into_iter().map(TrendPoint::from).collect()
    }
}

/// Span covered by a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// The next five three-hour samples.
    Daily,
    /// Five daily samples.
    Weekly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub time: DateTime<Utc>,
    pub temp_c: f64,
    pub precip_pct: f64,
    pub wind_kmh: f64,
    pub humidity_pct: u8,
}

impl From<&ForecastSample> for TrendPoint {
    fn from(sample: &ForecastSample) -> Self {
        Self {
            time: sample.time,
            temp_c: kelvin_to_celsius(sample.temp_k),
            precip_pct: sample.pop * 100.0,
            wind_kmh: mps_to_kmh(sample.wind_speed_mps),
            humidity_pct: sample.humidity_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Which forecast view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastTab {
    #[default]
    Hourly,
    Daily,
}

/// Condition groups with a dedicated glyph. Unknown groups render as clouds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
}

impl Condition {
    pub fn from_group(group: &str) -> Self {
        match group.to_lowercase().as_str() {
            "clear" => Condition::Clear,
            "rain" => Condition::Rain,
            "drizzle" => Condition::Drizzle,
            "thunderstorm" => Condition::Thunderstorm,
            "snow" => Condition::Snow,
            _ => Condition::Clouds,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Condition::Clear => "☀",
            Condition::Clouds => "☁",
            Condition::Rain => "🌧",
            Condition::Drizzle => "🌦",
            Condition::Thunderstorm => "⛈",
            Condition::Snow => "❄",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(index: i64) -> ForecastSample {
        ForecastSample {
            time: DateTime::from_timestamp(1_700_000_000 + index * 3 * 3600, 0)
                .expect("valid timestamp"),
            temp_k: 280.0 + index as f64,
            temp_min_k: 279.0 + index as f64,
            temp_max_k: 281.0 + index as f64,
            feels_like_k: 278.0,
            humidity_pct: 60,
            wind_speed_mps: 5.0,
            condition: "Clouds".to_string(),
            description: "scattered clouds".to_string(),
            icon: "03d".to_string(),
            pop: 0.25,
        }
    }

    pub(crate) fn forecast_of(len: i64) -> Forecast {
        Forecast { samples: (0..len).map(sample).collect() }
    }

    #[test]
    fn committed_location_rejects_blank_input() {
        assert!(CommittedLocation::new("").is_none());
        assert!(CommittedLocation::new(" \t ").is_none());
        assert_eq!(CommittedLocation::new("  Lyon ").expect("non-empty").as_str(), "Lyon");
    }

    #[test]
    fn kelvin_conversion_is_exact_offset() {
        assert_eq!(round1(kelvin_to_celsius(300.15)), 27.0);
        assert_eq!(round1(kelvin_to_celsius(273.15)), 0.0);
        assert_eq!(round1(kelvin_to_celsius(263.15)), -10.0);
    }

    #[test]
    fn label_inserts_region_before_country() {
        let paris = Suggestion { name: "Paris".into(), country: "FR".into(), region: None };
        assert_eq!(paris.label(), "Paris, FR");

        let texas = Suggestion {
            name: "Paris".into(),
            country: "US".into(),
            region: Some("TX".into()),
        };
        assert_eq!(texas.label(), "Paris, TX, US");
    }

    #[test]
    fn empty_region_is_skipped() {
        let s = Suggestion {
            name: "Oslo".into(),
            country: "NO".into(),
            region: Some(String::new()),
        };
        assert_eq!(s.label(), "Oslo, NO");
    }

    #[test]
    fn daily_takes_every_eighth_sample() {
        let forecast = forecast_of(40);
        let daily = forecast.daily();

        assert_eq!(daily.len(), 5);
        let expected: Vec<_> = [0, 8, 16, 24, 32].iter().map(|&i| &forecast.samples[i]).collect();
        assert_eq!(daily, expected);
    }

    #[test]
    fn daily_of_short_forecast_keeps_first_sample() {
        assert_eq!(forecast_of(3).daily().len(), 1);
        assert!(Forecast::default().daily().is_empty());
    }

    #[test]
    fn trends_cover_five_points() {
        let forecast = forecast_of(40);

        let daily = forecast.trends(Timeframe::Daily);
        assert_eq!(daily.len(), 5);
        assert_eq!(daily[1].time, forecast.samples[1].time);
        assert_eq!(daily[0].precip_pct, 25.0);
        assert_eq!(daily[0].wind_kmh, 18.0);

        let weekly = forecast.trends(Timeframe::Weekly);
        assert_eq!(weekly.len(), 5);
        assert_eq!(weekly[4].time, forecast.samples[32].time);
    }

    #[test]
    fn theme_toggles_back_and_forth() {
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Dark.toggle().toggle(), Theme::Dark);
    }

    #[test]
    fn unknown_condition_falls_back_to_clouds() {
        assert_eq!(Condition::from_group("Rain"), Condition::Rain);
        assert_eq!(Condition::from_group("Mist"), Condition::Clouds);
    }
}

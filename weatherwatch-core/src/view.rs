//! Fetch lifecycle for committed locations.

use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{CommittedLocation, CurrentWeather, Forecast},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading {
        location: String,
    },
    Success {
        current: CurrentWeather,
        forecast: Forecast,
    },
    Error {
        message: String,
    },
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Success { .. } | FetchState::Error { .. })
    }
}

/// Identifies one lookup. Only the ticket with the latest `seq` may finish it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub location: CommittedLocation,
}

/// Fetch both payloads for `location` concurrently. The first failure wins
/// and the other request is dropped.
pub async fn fetch_report(
    provider: &dyn WeatherProvider,
    location: &str,
) -> Result<(CurrentWeather, Forecast), WeatherError> {
    tokio::try_join!(provider.current(location), provider.forecast(location))
}

#[derive(Debug)]
pub struct WeatherViewController {
    state: FetchState,
    latest_seq: u64,
    fallback: CommittedLocation,
}

impl WeatherViewController {
    pub fn new(fallback: CommittedLocation) -> Self {
        Self { state: FetchState::Idle, latest_seq: 0, fallback }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Sequence number of the most recent commit; 0 before the first one.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn fallback(&self) -> &CommittedLocation {
        &self.fallback
    }

    /// Start a lookup, superseding whatever is in flight.
    pub fn commit(&mut self, location: CommittedLocation) -> Ticket {
        self.latest_seq += 1;
        info!(seq = self.latest_seq, %location, "lookup committed");

        self.state = FetchState::Loading { location: location.to_string() };
        Ticket { seq: self.latest_seq, location }
    }

    /// Apply the outcome of lookup `seq`. Outcomes of superseded lookups are
    /// ignored; returns whether the state changed.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<(CurrentWeather, Forecast), WeatherError>,
    ) -> bool {
        if seq != self.latest_seq || !self.state.is_loading() {
            debug!(seq, latest = self.latest_seq, "ignoring superseded lookup");
            return false;
        }

        self.state = match result {
            Ok((current, forecast)) => FetchState::Success { current, forecast },
            Err(err) => {
                warn!(seq, error = %err, "lookup failed");
                FetchState::Error { message: err.user_message() }
            }
        };
        true
    }

    /// Commit the fallback location. Only offered from the error state.
    pub fn retry(&mut self) -> Option<Ticket> {
        if !matches!(self.state, FetchState::Error { .. }) {
            return None;
        }
        let fallback = self.fallback.clone();
        Some(self.commit(fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::forecast_of;
    use async_trait::async_trait;
    use chrono::Utc;

    fn location(s: &str) -> CommittedLocation {
        CommittedLocation::new(s).expect("non-empty")
    }

    fn current(name: &str) -> CurrentWeather {
        CurrentWeather {
            location_name: name.to_string(),
            observation_time: Utc::now(),
            temp_k: 288.15,
            feels_like_k: 287.0,
            humidity_pct: 55,
            wind_speed_mps: 4.0,
            condition: "Clear".to_string(),
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
        }
    }

    fn report(name: &str) -> Result<(CurrentWeather, Forecast), WeatherError> {
        Ok((current(name), forecast_of(8)))
    }

    fn controller() -> WeatherViewController {
        WeatherViewController::new(location("New York"))
    }

    #[test]
    fn commit_enters_loading_with_fresh_sequence() {
        let mut view = controller();
        assert_eq!(view.state(), &FetchState::Idle);

        let first = view.commit(location("Oslo"));
        let second = view.commit(location("Bergen"));

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(view.state(), &FetchState::Loading { location: "Bergen".into() });
    }

    #[test]
    fn success_requires_latest_ticket() {
        let mut view = controller();
        let a = view.commit(location("A"));
        let b = view.commit(location("B"));

        assert!(view.complete(b.seq, report("B")));
        assert!(!view.complete(a.seq, report("A")));

        match view.state() {
            FetchState::Success { current, .. } => assert_eq!(current.location_name, "B"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn late_error_cannot_overwrite_newer_success() {
        let mut view = controller();
        let a = view.commit(location("A"));
        let b = view.commit(location("B"));

        view.complete(b.seq, report("B"));
        view.complete(a.seq, Err(WeatherError::not_found("A")));

        assert!(matches!(view.state(), FetchState::Success { .. }));
    }

    #[test]
    fn not_found_surfaces_as_error_message() {
        let mut view = controller();
        let t = view.commit(location("Atlantis"));

        view.complete(t.seq, Err(WeatherError::not_found("Atlantis")));

        match view.state() {
            FetchState::Error { message } => assert!(message.contains("not found")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn new_commit_clears_error() {
        let mut view = controller();
        let t = view.commit(location("Atlantis"));
        view.complete(t.seq, Err(WeatherError::not_found("Atlantis")));

        view.commit(location("Lima"));
        assert!(view.state().is_loading());
    }

    #[test]
    fn retry_commits_fallback_only_from_error() {
        let mut view = controller();
        assert!(view.retry().is_none());

        let t = view.commit(location("Atlantis"));
        view.complete(t.seq, Err(WeatherError::not_found("Atlantis")));

        let retry = view.retry().expect("retry offered");
        assert_eq!(retry.location.as_str(), "New York");
        assert!(view.complete(retry.seq, report("New York")));
        assert!(view.state().is_terminal());
        assert!(view.retry().is_none());
    }

    #[derive(Debug)]
    struct HalfBroken;

    #[async_trait]
    impl WeatherProvider for HalfBroken {
        async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
            Ok(current(location))
        }

        async fn forecast(&self, _location: &str) -> Result<Forecast, WeatherError> {
            Err(WeatherError::unavailable(crate::error::Endpoint::Forecast, "status 503"))
        }
    }

    #[tokio::test]
    async fn fetch_report_fails_when_either_request_fails() {
        let err = fetch_report(&HalfBroken, "Quito").await.unwrap_err();

        assert!(err.user_message().contains("Forecast unavailable"));
    }
}

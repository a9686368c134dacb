//! The event loop that owns the search and view controllers.
//!
//! User actions, debounce releases and network completions are all funneled
//! into one task and handled one at a time, so controller state has a single
//! mutator. Every handled message publishes a fresh [`Snapshot`].

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::{
    config::Config,
    debounce::{DebounceGate, Fired},
    error::WeatherError,
    model::{CommittedLocation, CurrentWeather, Forecast, ForecastTab, Suggestion, Theme},
    provider::{GeocodingProvider, WeatherProvider},
    search::SearchController,
    view::{FetchState, Ticket, WeatherViewController, fetch_report},
};

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Type(String),
    SelectSuggestion(usize),
    Submit,
    OutsideInteraction,
    /// Look up the fallback location after an error.
    Retry,
    ToggleTheme,
    SelectTab(ForecastTab),
    Quit,
}

/// An action plus, optionally, where to report the lookup it started.
#[derive(Debug)]
struct Request {
    action: Action,
    reply: Option<oneshot::Sender<Option<u64>>>,
}

#[derive(Debug)]
enum Completion {
    Suggestions {
        generation: u64,
        query: String,
        list: Vec<Suggestion>,
    },
    Weather {
        seq: u64,
        result: Result<(CurrentWeather, Forecast), WeatherError>,
    },
}

/// Everything a display layer needs to render one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub input_text: String,
    pub suggestions: Vec<Suggestion>,
    pub suggestions_visible: bool,
    pub fetch: FetchState,
    /// Sequence number of the lookup `fetch` belongs to.
    pub lookup_seq: u64,
    pub theme: Theme,
    pub tab: ForecastTab,
    pub fallback_location: String,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub startup_location: Option<String>,
    pub fallback_location: String,
    pub theme: Theme,
    pub debounce: Duration,
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            startup_location: Some(config.default_location.clone()),
            fallback_location: config.fallback_location.clone(),
            theme: config.theme,
            debounce: config.debounce(),
        }
    }
}

#[derive(Debug, Error)]
#[error("the app loop has stopped")]
pub struct AppClosed;

#[derive(Debug)]
pub struct App {
    search: SearchController,
    view: WeatherViewController,
    theme: Theme,
    tab: ForecastTab,
    startup: Option<CommittedLocation>,
    weather: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn GeocodingProvider>,
    requests: mpsc::UnboundedReceiver<Request>,
    fired: mpsc::UnboundedReceiver<Fired<String>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    state: watch::Sender<Snapshot>,
}

impl App {
    pub fn new(
        options: AppOptions,
        weather: Arc<dyn WeatherProvider>,
        geocoder: Arc<dyn GeocodingProvider>,
    ) -> anyhow::Result<(Self, AppHandle)> {
        let fallback = CommittedLocation::new(&options.fallback_location)
            .ok_or_else(|| anyhow::anyhow!("Fallback location must not be empty"))?;
        let startup = options
            .startup_location
            .as_deref()
            .map(|raw| {
                CommittedLocation::new(raw)
                    .ok_or_else(|| anyhow::anyhow!("Default location must not be empty"))
            })
            .transpose()?;

        let (gate, fired) = DebounceGate::channel(options.debounce);
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();

        let mut app = Self {
            search: SearchController::new(gate),
            view: WeatherViewController::new(fallback),
            theme: options.theme,
            tab: ForecastTab::default(),
            startup,
            weather,
            geocoder,
            requests,
            fired,
            completions_tx,
            completions,
            state: watch::Sender::new(Snapshot::default()),
        };
        app.state.send_replace(app.snapshot());

        let handle = AppHandle { requests: requests_tx, state: app.state.subscribe() };
        Ok((app, handle))
    }

    /// Run until `Action::Quit` or until every handle is dropped.
    pub async fn run(mut self) {
        if let Some(location) = self.startup.take() {
            self.commit(location);
            self.publish();
        }

        loop {
            let mut ack = None;

            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request { action: Action::Quit, .. }) | None => break,
                    Some(Request { action, reply }) => {
                        let started = self.handle_action(action);
                        ack = reply.map(|reply| (reply, started));
                    }
                },
                Some(fired) = self.fired.recv() => self.handle_fired(fired),
                Some(done) = self.completions.recv() => self.handle_completion(done),
            }

            // Acknowledge only once the snapshot reflects the action.
            self.publish();
            if let Some((reply, started)) = ack {
                let _ = reply.send(started);
            }
        }

        debug!("app loop stopped");
    }

    /// Returns the sequence number of the lookup the action started, if any.
    fn handle_action(&mut self, action: Action) -> Option<u64> {
        debug!(?action, "action");

        let ticket = match action {
            Action::Type(text) => {
                self.search.on_type(text);
                None
            }
            Action::SelectSuggestion(index) => {
                self.search.select_index(index).map(|location| self.view.commit(location))
            }
            Action::Submit => self.search.on_submit().map(|location| self.view.commit(location)),
            Action::OutsideInteraction => {
                self.search.on_outside_interaction();
                None
            }
            Action::Retry => self.view.retry(),
            Action::ToggleTheme => {
                self.theme = self.theme.toggle();
                None
            }
            Action::SelectTab(tab) => {
                self.tab = tab;
                None
            }
            Action::Quit => None,
        };

        ticket.map(|ticket| {
            let seq = ticket.seq;
            self.spawn_lookup(ticket);
            seq
        })
    }

    fn handle_fired(&mut self, fired: Fired<String>) {
        let Some(query) = self.search.on_debounce_fired(&fired) else {
            return;
        };

        let generation = fired.generation;
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let list = geocoder.suggest(&query).await.unwrap_or_else(|err| {
                warn!(query = %query, error = %err, "suggestion lookup failed");
                Vec::new()
            });
            let _ = tx.send(Completion::Suggestions { generation, query, list });
        });
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Suggestions { generation, query, list } => {
                self.search.on_suggestions_received(generation, &query, list);
            }
            Completion::Weather { seq, result } => {
                self.view.complete(seq, result);
            }
        }
    }

    fn commit(&mut self, location: CommittedLocation) {
        let ticket = self.view.commit(location);
        self.spawn_lookup(ticket);
    }

    fn spawn_lookup(&self, ticket: Ticket) {
        let weather = Arc::clone(&self.weather);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = fetch_report(weather.as_ref(), ticket.location.as_str()).await;
            let _ = tx.send(Completion::Weather { seq: ticket.seq, result });
        });
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            input_text: self.search.input_text().to_string(),
            suggestions: self.search.suggestions().to_vec(),
            suggestions_visible: self.search.suggestions_visible(),
            fetch: self.view.state().clone(),
            lookup_seq: self.view.latest_seq(),
            theme: self.theme,
            tab: self.tab,
            fallback_location: self.view.fallback().to_string(),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

/// Sends actions to a running [`App`] and observes its snapshots.
#[derive(Debug, Clone)]
pub struct AppHandle {
    requests: mpsc::UnboundedSender<Request>,
    state: watch::Receiver<Snapshot>,
}

impl AppHandle {
    pub fn send(&self, action: Action) -> Result<(), AppClosed> {
        self.requests.send(Request { action, reply: None }).map_err(|_| AppClosed)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.clone()
    }

    /// Wait until a lookup newer than `after_seq` has finished.
    pub async fn lookup_finished(&mut self, after_seq: u64) -> Result<Snapshot, AppClosed> {
        let snapshot = self
            .state
            .wait_for(|s| s.lookup_seq > after_seq && s.fetch.is_terminal())
            .await
            .map_err(|_| AppClosed)?;
        Ok(snapshot.clone())
    }

    /// Send `action` and wait until the loop has handled it. Yields the
    /// sequence number of the lookup it started, if any.
    pub async fn dispatch(&self, action: Action) -> Result<Option<u64>, AppClosed> {
        let (reply, started) = oneshot::channel();
        self.requests.send(Request { action, reply: Some(reply) }).map_err(|_| AppClosed)?;
        started.await.map_err(|_| AppClosed)
    }

    /// Send `action` and wait for the lookup it starts. Returns `None` when
    /// the action did not start one, e.g. a blank submit.
    ///
    /// If a newer lookup supersedes this one, its outcome is returned instead.
    pub async fn commit_with(&mut self, action: Action) -> Result<Option<Snapshot>, AppClosed> {
        match self.dispatch(action).await? {
            Some(seq) => self.lookup_finished(seq - 1).await.map(Some),
            None => Ok(None),
        }
    }
}

//! Interactive search session.
//!
//! `inquire` prompts block, so they run on the blocking pool while the app
//! loop keeps handling debounce timers and network completions.

use std::fmt;

use anyhow::{Context, Result};
use inquire::{
    Autocomplete, CustomUserError, InquireError, Select, Text, autocompletion::Replacement,
};
use tracing::debug;
use weatherwatch_core::{
    Action, AppHandle, FetchState, ForecastTab, Snapshot, Suggestion, Timeframe,
};

use crate::render::{self, Palette};

const SEARCH_HELP: &str =
    "type to search, ↑↓ to pick a suggestion, enter to look up, esc to go back";

/// Feeds every edit of the prompt into the app and lists whatever
/// suggestions the app currently holds.
///
/// Suggestions arrive asynchronously, so the list shown reflects the latest
/// response at the time of the most recent keystroke.
#[derive(Clone)]
struct SuggestionFeed {
    handle: AppHandle,
    last_input: Option<String>,
}

impl Autocomplete for SuggestionFeed {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        if self.last_input.as_deref() != Some(input) {
            self.last_input = Some(input.to_string());
            self.handle.send(Action::Type(input.to_string()))?;
        }

        let snapshot = self.handle.snapshot();
        if !snapshot.suggestions_visible {
            return Ok(Vec::new());
        }
        Ok(snapshot.suggestions.iter().map(Suggestion::label).collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum MenuChoice {
    Search,
    Retry(String),
    SwitchTab(ForecastTab),
    Trends(Timeframe),
    ToggleTheme,
    Quit,
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuChoice::Search => f.write_str("Search another location"),
            MenuChoice::Retry(fallback) => write!(f, "Retry with {fallback}"),
            MenuChoice::SwitchTab(ForecastTab::Hourly) => f.write_str("Show hourly forecast"),
            MenuChoice::SwitchTab(ForecastTab::Daily) => f.write_str("Show daily forecast"),
            MenuChoice::Trends(Timeframe::Daily) => f.write_str("Trends: next 15 hours"),
            MenuChoice::Trends(Timeframe::Weekly) => f.write_str("Trends: next 5 days"),
            MenuChoice::ToggleTheme => f.write_str("Toggle theme"),
            MenuChoice::Quit => f.write_str("Quit"),
        }
    }
}

fn menu_for(snapshot: &Snapshot) -> Vec<MenuChoice> {
    let mut choices = vec![MenuChoice::Search];

    match &snapshot.fetch {
        FetchState::Error { .. } => {
            choices.insert(0, MenuChoice::Retry(snapshot.fallback_location.clone()));
        }
        FetchState::Success { .. } => {
            let other = match snapshot.tab {
                ForecastTab::Hourly => ForecastTab::Daily,
                ForecastTab::Daily => ForecastTab::Hourly,
            };
            choices.push(MenuChoice::SwitchTab(other));
            choices.push(MenuChoice::Trends(Timeframe::Daily));
            choices.push(MenuChoice::Trends(Timeframe::Weekly));
        }
        FetchState::Idle | FetchState::Loading { .. } => {}
    }

    choices.push(MenuChoice::ToggleTheme);
    choices.push(MenuChoice::Quit);
    choices
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.context("Prompt task failed")
}

/// What the search prompt ended with.
enum SearchOutcome {
    Looked(Snapshot),
    Dismissed,
    Quit,
}

async fn search(handle: &mut AppHandle) -> Result<SearchOutcome> {
    let feed = SuggestionFeed { handle: handle.clone(), last_input: None };

    let answer = blocking(move || {
        Text::new("Location:")
            .with_autocomplete(feed)
            .with_help_message(SEARCH_HELP)
            .prompt()
    })
    .await?;

    let text = match answer {
        Ok(text) => text,
        Err(InquireError::OperationCanceled) => {
            debug!("search prompt dismissed");
            handle.send(Action::OutsideInteraction)?;
            return Ok(SearchOutcome::Dismissed);
        }
        Err(InquireError::OperationInterrupted) => return Ok(SearchOutcome::Quit),
        Err(err) => return Err(err).context("Location prompt failed"),
    };

    let picked = handle.snapshot().suggestions.iter().position(|s| s.label() == text);
    let action = match picked {
        Some(index) => Action::SelectSuggestion(index),
        None => {
            handle.dispatch(Action::Type(text)).await?;
            Action::Submit
        }
    };
    debug!(?action, "committing from search prompt");

    match handle.commit_with(action).await? {
        Some(snapshot) => Ok(SearchOutcome::Looked(snapshot)),
        None => Ok(SearchOutcome::Dismissed),
    }
}

fn show(snapshot: &Snapshot) {
    print!("\n{}", render::render(snapshot));
}

/// Run the prompt loop until the user quits.
pub async fn run(mut handle: AppHandle) -> Result<()> {
    let snapshot = handle.lookup_finished(0).await?;
    show(&snapshot);

    loop {
        let snapshot = handle.snapshot();
        let choices = menu_for(&snapshot);

        let choice = blocking(move || Select::new("What next?", choices).prompt()).await?;
        let choice = match choice {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                MenuChoice::Quit
            }
            Err(err) => return Err(err).context("Menu prompt failed"),
        };

        debug!(%choice, "menu choice");
        match choice {
            MenuChoice::Search => match search(&mut handle).await? {
                SearchOutcome::Looked(snapshot) => show(&snapshot),
                SearchOutcome::Dismissed => {}
                SearchOutcome::Quit => break,
            },
            MenuChoice::Retry(_) => {
                if let Some(snapshot) = handle.commit_with(Action::Retry).await? {
                    show(&snapshot);
                }
            }
            MenuChoice::SwitchTab(tab) => {
                handle.dispatch(Action::SelectTab(tab)).await?;
                show(&handle.snapshot());
            }
            MenuChoice::Trends(timeframe) => {
                if let FetchState::Success { forecast, .. } = &snapshot.fetch {
                    let palette = Palette::for_theme(snapshot.theme);
                    print!("\n{}", render::render_trends(forecast, timeframe, palette));
                }
            }
            MenuChoice::ToggleTheme => {
                handle.dispatch(Action::ToggleTheme).await?;
                show(&handle.snapshot());
            }
            MenuChoice::Quit => break,
        }
    }

    handle.send(Action::Quit)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_menu_leads_with_retry() {
        let snapshot = Snapshot {
            fetch: FetchState::Error { message: "nope".into() },
            fallback_location: "New York".into(),
            ..Default::default()
        };

        let menu = menu_for(&snapshot);
        assert_eq!(menu[0], MenuChoice::Retry("New York".into()));
        assert_eq!(menu[0].to_string(), "Retry with New York");
        assert!(!menu.iter().any(|c| matches!(c, MenuChoice::Trends(_))));
    }

    #[test]
    fn idle_menu_offers_search_theme_and_quit() {
        let menu = menu_for(&Snapshot::default());
        assert_eq!(menu, vec![MenuChoice::Search, MenuChoice::ToggleTheme, MenuChoice::Quit]);
    }
}

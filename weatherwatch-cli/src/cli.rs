use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use weatherwatch_core::{
    Action, App, AppOptions, CommittedLocation, Config, FetchState, ForecastTab, GeocodingProvider,
    OpenWeatherClient, Theme,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherwatch", version, about = "Current weather and forecasts from OpenWeather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search interactively with place suggestions (the default).
    Search,

    /// Show weather for a location and exit.
    Show {
        /// Location name, e.g. "Paris" or "Paris, TX, US".
        location: String,

        /// Show the daily forecast instead of the hourly one.
        #[arg(long)]
        daily: bool,

        /// Use the light theme regardless of the configured one.
        #[arg(long)]
        light: bool,
    },

    /// List places matching partial text.
    Suggest {
        text: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let client = Arc::new(OpenWeatherClient::from_config(&config)?);

        match self.command.unwrap_or(Command::Search) {
            Command::Search => {
                let (app, handle) =
                    App::new(AppOptions::from(&config), client.clone(), client)?;
                let app_task = tokio::spawn(app.run());

                interactive::run(handle).await?;
                app_task.await.context("App loop panicked")?;
            }
            Command::Show { location, daily, light } => {
                if CommittedLocation::new(&location).is_none() {
                    bail!("Location must not be empty");
                }

                let mut options = AppOptions::from(&config);
                options.startup_location = Some(location);
                if light {
                    options.theme = Theme::Light;
                }

                let (app, mut handle) = App::new(options, client.clone(), client)?;
                let app_task = tokio::spawn(app.run());

                if daily {
                    handle.dispatch(Action::SelectTab(ForecastTab::Daily)).await?;
                }
                let snapshot = handle.lookup_finished(0).await?;
                handle.send(Action::Quit)?;
                app_task.await.context("App loop panicked")?;

                if let FetchState::Error { message } = &snapshot.fetch {
                    bail!("{message}");
                }
                print!("{}", render::render(&snapshot));
            }
            Command::Suggest { text } => {
                let places = client
                    .suggest(&text)
                    .await
                    .with_context(|| format!("Failed to look up places matching '{text}'"))?;
                let palette = render::Palette::for_theme(config.theme);
                print!("{}", render::render_suggestions(&places, palette));
            }
        }

        Ok(())
    }
}

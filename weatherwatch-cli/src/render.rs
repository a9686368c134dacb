//! Text rendering of app snapshots. Everything here is a pure function of
//! its arguments.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize};
use weatherwatch_core::{
    Condition, CurrentWeather, FetchState, Forecast, ForecastTab, Snapshot, Suggestion, Theme,
    Timeframe,
    model::{kelvin_to_celsius, mps_to_kmh, round1},
};

/// Samples per row in the hourly view.
const HOURLY_COLUMNS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                accent: Color::Cyan,
                text: Color::White,
                muted: Color::Grey,
                error: Color::Red,
            },
            Theme::Light => Self {
                accent: Color::DarkBlue,
                text: Color::Black,
                muted: Color::DarkGrey,
                error: Color::DarkRed,
            },
        }
    }
}

fn local(time: DateTime<Utc>) -> DateTime<Local> {
    time.with_timezone(&Local)
}

fn celsius(kelvin: f64) -> String {
    format!("{:.1}°C", round1(kelvin_to_celsius(kelvin)))
}

fn degrees(kelvin: f64) -> String {
    format!("{:.1}°", round1(kelvin_to_celsius(kelvin)))
}

fn glyph(condition: &str) -> &'static str {
    Condition::from_group(condition).glyph()
}

/// The whole screen for `snapshot`.
pub fn render(snapshot: &Snapshot) -> String {
    let palette = Palette::for_theme(snapshot.theme);

    match &snapshot.fetch {
        FetchState::Idle => String::new(),
        FetchState::Loading { location } => {
            format!("{}\n", format!("Loading weather for {location}...").with(palette.muted))
        }
        FetchState::Error { message } => {
            let mut out = String::new();
            let _ = writeln!(out, "{}", message.as_str().with(palette.error).bold());
            let _ = writeln!(
                out,
                "{}",
                format!("You can retry with {}.", snapshot.fallback_location).with(palette.muted)
            );
            out
        }
        FetchState::Success { current, forecast } => {
            let mut out = render_current(current, palette);
            out.push('\n');
            out.push_str(&render_forecast(forecast, snapshot.tab, palette));
            out
        }
    }
}

pub fn render_current(current: &CurrentWeather, palette: Palette) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        "📍".with(palette.accent),
        current.location_name.as_str().with(palette.text).bold()
    );
    let _ = writeln!(
        out,
        "{}",
        local(current.observation_time).format("%A, %B %-d").to_string().with(palette.muted)
    );
    let _ = writeln!(
        out,
        "{} {}  {}",
        glyph(&current.condition),
        celsius(current.temp_k).with(palette.text).bold(),
        current.description.as_str().with(palette.muted)
    );
    let _ = writeln!(
        out,
        "Wind {}   Humidity {}   Feels like {}",
        format!("{} km/h", mps_to_kmh(current.wind_speed_mps).round()).with(palette.accent),
        format!("{}%", current.humidity_pct).with(palette.accent),
        celsius(current.feels_like_k).with(palette.accent),
    );

    out
}

fn tab_header(active: ForecastTab, palette: Palette) -> String {
    let label = |tab: ForecastTab, name: &str| {
        if tab == active {
            format!("[{name}]").with(palette.accent).bold().to_string()
        } else {
            format!(" {name} ").with(palette.muted).to_string()
        }
    };

    format!("{} {}", label(ForecastTab::Hourly, "Hourly"), label(ForecastTab::Daily, "Daily"))
}

pub fn render_forecast(forecast: &Forecast, tab: ForecastTab, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", tab_header(tab, palette));

    match tab {
        ForecastTab::Hourly => {
            for (row, chunk) in forecast.hourly().chunks(HOURLY_COLUMNS).enumerate() {
                let mut times = String::new();
                let mut temps = String::new();
                for (col, sample) in chunk.iter().enumerate() {
                    let time = if row == 0 && col == 0 {
                        "Now".to_string()
                    } else {
                        local(sample.time).format("%H:%M").to_string()
                    };
                    let _ = write!(times, "{time:<9}");
                    let glyph = glyph(&sample.condition);
                    let _ = write!(temps, "{} {:<7}", glyph, degrees(sample.temp_k));
                }
                let _ = writeln!(out, "{}", times.trim_end().with(palette.muted));
                let _ = writeln!(out, "{}", temps.trim_end().with(palette.text));
            }
        }
        ForecastTab::Daily => {
            for sample in forecast.daily() {
                let _ = writeln!(
                    out,
                    "{:<12} {}  {} {}",
                    local(sample.time).format("%a, %-m/%d").to_string(),
                    glyph(&sample.condition),
                    degrees(sample.temp_max_k).with(palette.text).bold(),
                    degrees(sample.temp_min_k).with(palette.muted),
                );
            }
        }
    }

    out
}

pub fn render_trends(forecast: &Forecast, timeframe: Timeframe, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!("{:<12} {:>8} {:>8} {:>10} {:>9}", "", "Temp", "Precip", "Wind", "Humidity")
            .with(palette.muted)
    );

    for point in forecast.trends(timeframe) {
        let when = match timeframe {
            Timeframe::Daily => local(point.time).format("%H:%M"),
            Timeframe::Weekly => local(point.time).format("%a"),
        };
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>8} {:>10} {:>9}",
            when.to_string(),
            format!("{}°C", point.temp_c.round()),
            format!("{}%", point.precip_pct.round()),
            format!("{} km/h", point.wind_kmh.round()),
            format!("{}%", point.humidity_pct),
        );
    }

    out
}

pub fn render_suggestions(suggestions: &[Suggestion], palette: Palette) -> String {
    if suggestions.is_empty() {
        return format!("{}\n", "No matching places.".with(palette.muted));
    }

    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}\n", format!("{}.", i + 1).with(palette.muted), s.label()))
        .collect()
}

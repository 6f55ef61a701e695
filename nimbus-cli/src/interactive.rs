//! Menu-driven session: the terminal rendition of the widget page.

use std::fmt;

use anyhow::Result;
use inquire::{InquireError, Password, Select, Text};
use nimbus_core::{DisplayUnit, Widget};

use crate::terminal::TerminalSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Search,
    Locate,
    ToggleUnit(DisplayUnit),
    Recent,
    SaveKey,
    ClearKey,
    Demo,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Search => f.write_str("Search city"),
            MenuItem::Locate => f.write_str("Use my location"),
            MenuItem::ToggleUnit(DisplayUnit::Metric) => f.write_str("Switch to °C"),
            MenuItem::ToggleUnit(DisplayUnit::Imperial) => f.write_str("Switch to °F"),
            MenuItem::Recent => f.write_str("Recent searches"),
            MenuItem::SaveKey => f.write_str("Save API key"),
            MenuItem::ClearKey => f.write_str("Clear API key"),
            MenuItem::Demo => f.write_str("Show demo data"),
            MenuItem::Quit => f.write_str("Quit"),
        }
    }
}

/// Entries offered right now. Fetch-capable entries only appear while the
/// controls are enabled.
fn menu(widget: &Widget<TerminalSurface>) -> Vec<MenuItem> {
    let mut items = Vec::new();

    if widget.controls_enabled() {
        let other_unit = match widget.unit() {
            DisplayUnit::Metric => DisplayUnit::Imperial,
            DisplayUnit::Imperial => DisplayUnit::Metric,
        };
        items.extend([MenuItem::Search, MenuItem::Locate, MenuItem::ToggleUnit(other_unit)]);
        if !widget.recent_searches().is_empty() {
            items.push(MenuItem::Recent);
        }
    }

    items.push(MenuItem::SaveKey);
    if widget.controls_enabled() {
        items.push(MenuItem::ClearKey);
    }
    items.extend([MenuItem::Demo, MenuItem::Quit]);
    items
}

pub async fn run(widget: &Widget<TerminalSurface>) -> Result<()> {
    widget.start().await;

    loop {
        let choice = match Select::new("What next?", menu(widget)).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match choice {
            MenuItem::Search => {
                if let Some(city) = ask(Text::new("City:").prompt())? {
                    widget.submit_search(&city).await;
                }
            }
            MenuItem::Locate => widget.use_geolocation().await,
            MenuItem::ToggleUnit(unit) => widget.set_unit(unit).await,
            MenuItem::Recent => {
                let recent = widget.recent_searches();
                let picked = ask(Select::new("Recent searches:", recent.clone()).prompt())?;
                if let Some(index) = picked.and_then(|city| recent.iter().position(|c| *c == city)) {
                    widget.select_recent(index).await;
                }
            }
            MenuItem::SaveKey => {
                let key = ask(
                    Password::new("OpenWeatherMap API key:")
                        .without_confirmation()
                        .prompt(),
                )?;
                if let Some(key) = key {
                    widget.save_key(&key).await;
                }
            }
            MenuItem::ClearKey => widget.clear_key().await,
            MenuItem::Demo => widget.use_demo_data().await,
            MenuItem::Quit => break,
        }
    }

    Ok(())
}

/// Escape on a sub-prompt goes back to the menu instead of ending the session.
fn ask<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

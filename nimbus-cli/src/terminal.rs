use std::cell::Cell;

use nimbus_core::{ApiStatus, DisplayFields, DisplayUnit, StatusKind, Surface};

/// How chatty the surface is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Menu-driven session: every status, toggle and list refresh is shown.
    Interactive,
    /// Single command: only results and problems are shown.
    OneShot,
}

/// Draws the widget on stdout/stderr.
#[derive(Debug)]
pub struct TerminalSurface {
    mode: Mode,
    assume_yes: bool,
    failed: Cell<bool>,
}

impl TerminalSurface {
    pub fn new(mode: Mode) -> Self {
        Self { mode, assume_yes: false, failed: Cell::new(false) }
    }

    /// Answer every confirmation with yes.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Whether an error has been shown since creation.
    pub fn failed(&self) -> bool {
        self.failed.get()
    }

    fn interactive(&self) -> bool {
        self.mode == Mode::Interactive
    }
}

impl Surface for TerminalSurface {
    fn show_loading(&self) {
        if self.interactive() {
            eprintln!("Loading...");
        }
    }

    fn hide_loading(&self) {}

    fn show_error(&self, message: &str) {
        self.failed.set(true);
        eprintln!("error: {message}");
    }

    fn hide_error(&self) {}

    fn render(&self, fields: &DisplayFields) {
        println!();
        println!("{}", fields.location);
        println!("{}", fields.date);
        println!();
        println!("  {}  {}", fields.temperature, fields.description);
        println!(
            "  Feels like {}   High {}   Low {}",
            fields.feels_like, fields.max_temp, fields.min_temp
        );
        println!(
            "  Humidity {}   Wind {}   Pressure {}",
            fields.humidity, fields.wind_speed, fields.pressure
        );
        println!(
            "  Visibility {}   Precipitation {}",
            fields.visibility, fields.precipitation
        );
        println!("  Sunrise {}   Sunset {}", fields.sunrise, fields.sunset);
        println!("  UV index {} ({}, estimated)", fields.uv_index, fields.uv_description);
        println!("  Icon {}", fields.icon_url);
        println!();
    }

    fn render_recent(&self, cities: &[String]) {
        if self.interactive() && !cities.is_empty() {
            println!("Recent: {}", cities.join(" · "));
        }
    }

    fn set_unit_toggles(&self, unit: DisplayUnit) {
        if self.interactive() {
            let (c, f) = match unit {
                DisplayUnit::Metric => ("[°C]", " °F "),
                DisplayUnit::Imperial => (" °C ", "[°F]"),
            };
            println!("Units: {c} {f}");
        }
    }

    fn set_controls_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "controls");
    }

    fn set_api_status(&self, status: &ApiStatus) {
        if status.message.is_empty() {
            return;
        }

        match (self.mode, status.kind) {
            (_, StatusKind::Plain) => eprintln!("{}", status.message),
            (Mode::Interactive, _) => println!("{}", status.message),
            (Mode::OneShot, _) => {}
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        match inquire::Confirm::new(prompt).with_default(false).prompt() {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt failed, treating as no");
                false
            }
        }
    }
}

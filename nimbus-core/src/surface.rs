use std::time::Duration;

use crate::model::{DisplayFields, DisplayUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Plain,
    Info,
    Success,
}

/// Content of the credential-status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStatus {
    pub message: String,
    pub kind: StatusKind,
    /// Clear the line after this long. Fire-and-forget: a later status does
    /// not cancel an earlier timer.
    pub clear_after: Option<Duration>,
}

impl ApiStatus {
    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self { message: message.into(), kind, clear_after: None }
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self::new(message, StatusKind::Plain)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, StatusKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, StatusKind::Success)
    }

    pub fn clear_after(mut self, delay: Duration) -> Self {
        self.clear_after = Some(delay);
        self
    }
}

/// Everything the widget draws on.
///
/// Methods take `&self`; implementations keep whatever state they need behind
/// interior mutability.
pub trait Surface {
    fn show_loading(&self);
    fn hide_loading(&self);

    /// Error banner. Also hides the weather panel.
    fn show_error(&self, message: &str);
    fn hide_error(&self);

    fn render(&self, fields: &DisplayFields);

    /// Rebuild the recent-search list, one selectable entry per city.
    fn render_recent(&self, cities: &[String]);

    /// Press the toggle for `unit`, release the other one.
    fn set_unit_toggles(&self, unit: DisplayUnit);

    /// Enable or disable search, location and unit controls.
    fn set_controls_enabled(&self, enabled: bool);

    fn set_api_status(&self, status: &ApiStatus);

    /// Ask the user a yes/no question.
    fn confirm(&self, prompt: &str) -> bool;
}

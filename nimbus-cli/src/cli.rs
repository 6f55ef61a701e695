use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use nimbus_core::{
    Config, DisplayUnit, FileStore, KeyValueStore, MemoryStore, RecentSearches, Widget,
    api_from_config, storage::API_KEY_KEY,
};

use crate::{
    interactive,
    terminal::{Mode, TerminalSurface},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nimbus", version, about = "Current weather for a city or your location")]
pub struct Cli {
    /// Unit system for this run; defaults to `default_unit` from the config file.
    #[arg(long, global = true, value_enum)]
    pub unit: Option<UnitArg>,

    /// Keep the API key and recent searches in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Without a subcommand, start an interactive session.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Metric,
    Imperial,
}

impl From<UnitArg> for DisplayUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Metric => DisplayUnit::Metric,
            UnitArg::Imperial => DisplayUnit::Imperial,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: String,
    },

    /// Show current weather for your location.
    Here,

    /// Manage the OpenWeatherMap API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// List recent searches.
    Recent,

    /// Show built-in sample data; needs no API key.
    Demo,

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyAction {
    /// Validate and store a key. Prompts when KEY is omitted.
    Set { key: Option<String> },

    /// Remove the stored key.
    Clear {
        /// Don't ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Check the stored key against the API.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the effective configuration.
    Show,
    /// Write a config file with default values if none exists.
    Init,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = Config::load()?;
        let unit = self.unit.map(DisplayUnit::from).unwrap_or(config.default_unit);
        let store = self.store(&config)?;

        let Some(command) = self.command else {
            let widget = build_widget(&config, store, unit, TerminalSurface::new(Mode::Interactive))?;
            interactive::run(&widget).await?;
            return Ok(ExitCode::SUCCESS);
        };

        match command {
            Command::Show { city } => {
                let widget = build_widget(&config, store, unit, TerminalSurface::new(Mode::OneShot))?;
                require_key(&widget).await?;
                widget.fetch_by_city(&city).await;
                Ok(exit_code(&widget))
            }
            Command::Here => {
                let widget = build_widget(&config, store, unit, TerminalSurface::new(Mode::OneShot))?;
                require_key(&widget).await?;
                widget.use_geolocation().await;
                Ok(exit_code(&widget))
            }
            Command::Key { action } => {
                let yes = matches!(action, KeyAction::Clear { yes: true });
                let surface = TerminalSurface::new(Mode::Interactive).assume_yes(yes);
                let widget = build_widget(&config, store.clone(), unit, surface)?;
                run_key_action(&widget, store.as_ref(), action).await
            }
            Command::Recent => {
                let recent = RecentSearches::load(store.as_ref()).await;
                if recent.is_empty() {
                    println!("No recent searches.");
                }
                for (i, city) in recent.entries().iter().enumerate() {
                    println!("{}. {city}", i + 1);
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Demo => {
                let widget = build_widget(&config, store, unit, TerminalSurface::new(Mode::OneShot))?;
                widget.use_demo_data().await;
                Ok(exit_code(&widget))
            }
            Command::Config { action } => run_config_action(&config, action),
        }
    }

    fn store(&self, config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }

        Ok(Arc::new(FileStore::new(config.storage_file_path()?)))
    }
}

fn build_widget(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    unit: DisplayUnit,
    surface: TerminalSurface,
) -> anyhow::Result<Widget<TerminalSurface>> {
    let api = Arc::new(api_from_config(config)?);
    let geolocation = config.geolocation_provider()?;

    Ok(Widget::new(surface, api, store, geolocation).with_unit(unit))
}

async fn require_key(widget: &Widget<TerminalSurface>) -> anyhow::Result<()> {
    widget.start().await;
    if widget.controls_enabled() {
        Ok(())
    } else {
        Err(anyhow!(
            "No valid API key configured.\n\
             Hint: run `nimbus key set` and paste your OpenWeatherMap key."
        ))
    }
}

fn exit_code(widget: &Widget<TerminalSurface>) -> ExitCode {
    if widget.surface().failed() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

async fn run_key_action(
    widget: &Widget<TerminalSurface>,
    store: &dyn KeyValueStore,
    action: KeyAction,
) -> anyhow::Result<ExitCode> {
    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => inquire::Password::new("OpenWeatherMap API key:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?,
            };
            widget.save_key(&key).await;
        }
        KeyAction::Clear { .. } => {
            widget.clear_key().await;
            let code = if key_cleared(store).await { ExitCode::SUCCESS } else { ExitCode::FAILURE };
            return Ok(code);
        }
        KeyAction::Status => widget.start().await,
    }

    if widget.controls_enabled() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Whether storage no longer holds a key. A declined prompt or an unreadable
/// store both count as not cleared.
async fn key_cleared(store: &dyn KeyValueStore) -> bool {
    matches!(store.get(API_KEY_KEY).await, Ok(None))
}

fn run_config_action(config: &Config, action: ConfigAction) -> anyhow::Result<ExitCode> {
    match action {
        ConfigAction::Path => println!("{}", Config::config_file_path()?.display()),
        ConfigAction::Show => {
            print!("{}", config.to_toml_string()?);
            println!("# storage: {}", config.storage_file_path()?.display());
        }
        ConfigAction::Init => {
            let path = Config::config_file_path()?;
            if path.exists() {
                println!("Config already exists: {}", path.display());
            } else {
                Config::default().save()?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nimbus_core::{OpenWeatherClient, geolocation::Unsupported};

    fn confirming_widget(store: Arc<dyn KeyValueStore>) -> Widget<TerminalSurface> {
        let surface = TerminalSurface::new(Mode::OneShot).assume_yes(true);
        Widget::new(surface, Arc::new(OpenWeatherClient::default()), store, Box::new(Unsupported))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["nimbus"]).expect("must parse");
        assert!(cli.command.is_none());
        assert!(!cli.ephemeral);
    }

    #[test]
    fn global_unit_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["nimbus", "show", "London", "--unit", "imperial"])
            .expect("must parse");

        assert!(matches!(cli.command, Some(Command::Show { ref city }) if city == "London"));
        assert_eq!(cli.unit.map(DisplayUnit::from), Some(DisplayUnit::Imperial));
    }

    #[test]
    fn key_clear_accepts_yes() {
        let cli = Cli::try_parse_from(["nimbus", "key", "clear", "-y"]).expect("must parse");
        assert!(matches!(
            cli.command,
            Some(Command::Key { action: KeyAction::Clear { yes: true } })
        ));
    }

    #[tokio::test]
    async fn confirmed_clear_removes_stored_key() {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::new().with_entry(API_KEY_KEY, "0123456789abcdef"));
        let widget = confirming_widget(store.clone());

        widget.clear_key().await;
        assert!(key_cleared(store.as_ref()).await);
    }

    #[tokio::test]
    async fn clear_with_unavailable_storage_is_not_cleared() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::unavailable());
        let widget = confirming_widget(store.clone());

        widget.clear_key().await;
        assert!(!key_cleared(store.as_ref()).await);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(Cli::try_parse_from(["nimbus", "--unit", "kelvin", "demo"]).is_err());
    }
}

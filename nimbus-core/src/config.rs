use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    geolocation::{DEFAULT_IP_LOOKUP_URL, FixedPosition, Geolocation, IpLookup, Unsupported},
    model::{Coordinates, DisplayUnit},
    provider::openweather::DEFAULT_BASE_URL,
};

/// How the location action finds the device position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Approximate position of the public IP address.
    #[default]
    Ip,
    /// `latitude`/`longitude` from this file.
    Fixed,
    /// Treat the capability as absent.
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub mode: GeolocationMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_lookup_url: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_unit = "imperial"
/// request_timeout_secs = 10
///
/// [geolocation]
/// mode = "fixed"
/// latitude = 51.5072
/// longitude = -0.1276
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub default_unit: DisplayUnit,
    /// No timeout beyond the transport's own when absent.
    pub request_timeout_secs: Option<u64>,
    /// Where the API key and recent searches live. Defaults to the platform data dir.
    pub storage_path: Option<PathBuf>,
    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            default_unit: DisplayUnit::default(),
            request_timeout_secs: None,
            storage_path: None,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the key-value storage file.
    pub fn storage_file_path(&self) -> Result<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("storage.json")),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "nimbus", "nimbus")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// HTTP client shared by the weather API and IP geolocation.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().context("Failed to build HTTP client")
    }

    /// Construct the geolocation provider selected by `[geolocation]`.
    pub fn geolocation_provider(&self) -> Result<Box<dyn Geolocation>> {
        let geo = &self.geolocation;
        let provider: Box<dyn Geolocation> = match geo.mode {
            GeolocationMode::Off => Box::new(Unsupported),
            GeolocationMode::Ip => {
                Box::new(IpLookup::new(geo.ip_lookup_url.clone(), self.http_client()?))
            }
            GeolocationMode::Fixed => {
                let (Some(latitude), Some(longitude)) = (geo.latitude, geo.longitude) else {
                    return Err(anyhow!(
                        "Geolocation mode is \"fixed\" but latitude/longitude are not set.\n\
                         Hint: add `latitude` and `longitude` under [geolocation] in {}.",
                        Self::config_file_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|_| "config.toml".to_string())
                    ));
                };
                Box::new(FixedPosition(Coordinates { latitude, longitude }))
            }
        };

        Ok(provider)
    }
}

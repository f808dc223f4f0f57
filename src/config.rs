use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const AREA_LIST_URL: &str = "http://www.jma.go.jp/bosai/common/const/area.json";
pub const FORECAST_BASE_URL: &str = "https://www.jma.go.jp/bosai/forecast/data/forecast";

const APP_DIR: &str = "jma-wx";
const DB_FILE: &str = "weather_forecast.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Region list endpoint (JSON object with an `offices` field)
    pub area_list_url: String,

    /// Forecast endpoint; the region code is appended as `/{code}.json`
    pub forecast_base_url: String,

    /// SQLite file used by the cached variant
    pub database_path: PathBuf,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

fn default_timeout() -> u64 {
    10
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 360,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            area_list_url: AREA_LIST_URL.to_string(),
            forecast_base_url: FORECAST_BASE_URL.to_string(),
            database_path: data_dir.join(DB_FILE),
            request_timeout_secs: default_timeout(),
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    /// Config pointing both endpoints at `base_url`, with the database at `database_path`.
    pub fn with_base_url(base_url: &str, database_path: impl Into<PathBuf>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            area_list_url: format!("{}/area.json", base),
            forecast_base_url: base.to_string(),
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the user config dir, writing defaults if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.area_list_url, "area_list_url")?;
        validate_url(&self.forecast_base_url, "forecast_base_url")?;
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs: must be greater than zero");
        }
        Ok(())
    }

    /// `{forecast_base_url}/{code}.json`
    pub fn forecast_url(&self, code: &str) -> String {
        format!(
            "{}/{}.json",
            self.forecast_base_url.trim_end_matches('/'),
            code
        )
    }

    fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);
        Ok(dir.join("config.toml"))
    }
}

fn validate_url(value: &str, field: &str) -> Result<()> {
    let url = reqwest::Url::parse(value).with_context(|| format!("{}: invalid URL", field))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("{}: unsupported scheme '{}'", field, other),
    }
}

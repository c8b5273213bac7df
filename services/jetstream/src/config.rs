//! Configuration loading.
//!
//! Built-in defaults are overlaid by an optional YAML file (`--config` or
//! `JETSTREAM_CONFIG`); command-line flags and their environment variables
//! are applied on top by the binary. Provider credentials come from the
//! `ECMWF_API_*` environment variables or `~/.ecmwfapirc`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use jet_common::{AvailabilityWindow, JetError, JetResult, StyleConfig};
use projection::ProjectionKind;
use renderer::{Color, Colormap, OverlayKind, RenderConfig, VectorConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default API base when neither the config nor the credentials name one.
pub const DEFAULT_API_URL: &str = "https://api.ecmwf.int/v1";

/// Root configuration, as read from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub render: RenderSettings,
}

/// Data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Full request URL. Derived from the API base and dataset when unset.
    pub endpoint: Option<String>,
    pub dataset: String,
    pub class: String,
    pub stream: String,
    pub grid: String,
    pub times: Vec<String>,
    pub first_date: NaiveDate,
    pub last_date: Option<NaiveDate>,
    pub publication_lag_days: u32,
    pub request_timeout_secs: Option<u64>,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let window = AvailabilityWindow::era_interim();
        Self {
            endpoint: None,
            dataset: "interim".to_string(),
            class: "ei".to_string(),
            stream: "oper".to_string(),
            grid: "0.75/0.75".to_string(),
            times: vec!["18:00:00".to_string()],
            first_date: window.first,
            last_date: window.last,
            publication_lag_days: window.publication_lag_days,
            request_timeout_secs: None,
            credentials: None,
        }
    }
}

impl ProviderConfig {
    pub fn window(&self) -> AvailabilityWindow {
        AvailabilityWindow {
            first: self.first_date,
            last: self.last_date,
            publication_lag_days: self.publication_lag_days,
        }
    }

    /// The URL requests are sent to.
    pub fn endpoint_url(&self) -> String {
        if let Some(endpoint) = &self.endpoint {
            return endpoint.clone();
        }
        let base = self
            .credentials
            .as_ref()
            .and_then(|c| c.url.as_deref())
            .unwrap_or(DEFAULT_API_URL);
        format!("{}/datasets/{}", base.trim_end_matches('/'), self.dataset)
    }
}

/// API key and account email for the provider.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub url: Option<String>,
    pub key: String,
    pub email: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

impl Credentials {
    /// Read `ECMWF_API_KEY`, `ECMWF_API_EMAIL` and `ECMWF_API_URL`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let key = lookup("ECMWF_API_KEY").filter(|k| !k.is_empty())?;
        let email = lookup("ECMWF_API_EMAIL").filter(|e| !e.is_empty())?;
        Some(Self {
            url: lookup("ECMWF_API_URL").filter(|u| !u.is_empty()),
            key,
            email,
        })
    }

    /// Parse an `.ecmwfapirc` JSON file.
    pub fn from_rc_file(path: &Path) -> JetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            JetError::Config(format!("Invalid credentials file {}: {}", path.display(), e))
        })
    }

    /// Environment first, then `~/.ecmwfapirc`. Absent credentials are not
    /// an error; a malformed rc file is.
    pub fn discover() -> JetResult<Option<Self>> {
        if let Some(creds) = Self::from_env() {
            debug!("Using provider credentials from the environment");
            return Ok(Some(creds));
        }
        match dirs::home_dir().map(|home| home.join(".ecmwfapirc")) {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Using provider credentials file");
                Self::from_rc_file(&path).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Plotting settings, as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub dpi: u32,
    pub projection: String,
    pub colormap: String,
    pub overlay: String,
    pub overlay_spacing: u32,
    pub vmin: f32,
    pub vmax: f32,
    pub graticule_spacing: f64,
    pub background: String,
    pub font: Option<PathBuf>,
    /// JSON file of gradient styles.
    pub style_file: Option<PathBuf>,
    /// Style from `style_file` to use instead of `colormap`.
    pub style: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dpi: 150,
            projection: "cyl".to_string(),
            colormap: "jetstream".to_string(),
            overlay: "none".to_string(),
            overlay_spacing: 40,
            vmin: 30.0,
            vmax: 220.0,
            graticule_spacing: 30.0,
            background: "#ffffff".to_string(),
            font: None,
            style_file: None,
            style: None,
        }
    }
}

impl RenderSettings {
    /// Resolve names into a renderer configuration.
    ///
    /// Unknown projections, colormaps and overlays are render errors.
    pub fn to_render_config(&self) -> JetResult<RenderConfig> {
        let projection: ProjectionKind = self
            .projection
            .parse()
            .map_err(|e: projection::ProjectionError| JetError::Render(e.to_string()))?;
        let overlay: OverlayKind = self.overlay.parse()?;

        let styles = self
            .style_file
            .as_ref()
            .map(|path| {
                StyleConfig::from_file(path).map_err(|e| {
                    JetError::Config(format!("style file {}: {}", path.display(), e))
                })
            })
            .transpose()?;
        let colormap_name = self.style.as_deref().unwrap_or(&self.colormap);
        let colormap = Colormap::resolve(colormap_name, styles.as_ref())?;

        let background = Color::from_hex(&self.background).ok_or_else(|| {
            JetError::Render(format!("invalid background color '{}'", self.background))
        })?;

        let defaults = RenderConfig::default();
        Ok(RenderConfig {
            dpi: self.dpi,
            projection,
            colormap,
            overlay,
            vectors: VectorConfig {
                spacing: self.overlay_spacing,
                ..VectorConfig::default()
            },
            vmin: self.vmin,
            vmax: self.vmax,
            graticule_spacing: self.graticule_spacing,
            background,
            font: self.font.clone(),
            ..defaults
        })
    }
}

impl AppConfig {
    /// Load a YAML config file.
    pub fn load(path: &Path) -> JetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            JetError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_yaml::from_str(&content).map_err(|e| {
            JetError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Defaults, overlaid by `path` when given, plus discovered credentials.
    pub fn load_layered(path: Option<&Path>) -> JetResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.provider.credentials = Credentials::discover()?;
        Ok(config)
    }
}

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cropdash_cli::OutputFormat;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
    pub chart: ChartConfig,
    pub output: OutputConfig,
    pub debug: DebugConfig,
}

/// Input files and column naming.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    pub primary: Option<PathBuf>,
    pub secondary: Option<PathBuf>,
    pub delimiter: Option<u8>,
    /// Extra header aliases, source header -> canonical column name.
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub crop_info_panel: bool,
    pub show_boxplot: bool,
    pub top_n: usize,
    pub unselected_opacity: f64,
    pub image_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Band width of one bar in the top-N charts.
    pub bar_step: u32,
    pub bar_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub vega_version: String,
    pub vega_lite_version: String,
    pub vega_embed_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            data: DataConfig::default(),
            dashboard: DashboardConfig::default(),
            chart: ChartConfig::default(),
            output: OutputConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Crop Yield Dashboard".to_string(),
            crop_info_panel: true,
            show_boxplot: false,
            top_n: 10,
            unselected_opacity: 0.2,
            image_dir: PathBuf::from("images"),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            bar_step: 30,
            bar_color: "#5F4747".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "html".to_string(),
            vega_version: "5".to_string(),
            vega_lite_version: "5".to_string(),
            vega_embed_version: "6".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        if let Ok(user_config) = Self::load_user_config(app_name) {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a config directory (default → file in `manager`)
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(Self::read_config_file(&manager.config_path("config.toml"))?);
        config.validate()?;
        Ok(config)
    }

    /// Load user configuration from ~/.config/cropdash/config.toml
    fn load_user_config(app_name: &str) -> Result<AppConfig> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::read_config_file(&config_manager.config_path("config.toml"))
    }

    fn read_config_file(config_path: &Path) -> Result<AppConfig> {
        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.data.merge(other.data);
        self.dashboard.merge(other.dashboard);
        self.chart.merge(other.chart);
        self.output.merge(other.output);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.dashboard.top_n == 0 {
            return Err(eyre!("top_n must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.dashboard.unselected_opacity) {
            return Err(eyre!(
                "unselected_opacity must be between 0 and 1, got {}",
                self.dashboard.unselected_opacity
            ));
        }

        if self.chart.width == 0 || self.chart.height == 0 || self.chart.bar_step == 0 {
            return Err(eyre!("chart width, height and bar_step must be greater than 0"));
        }

        if !is_hex_color(&self.chart.bar_color) {
            return Err(eyre!(
                "Invalid bar_color: {}. Expected #RRGGBB",
                self.chart.bar_color
            ));
        }

        if OutputFormat::from_name(&self.output.format).is_none() {
            return Err(eyre!(
                "Invalid output format: {}. Must be 'html' or 'json'",
                self.output.format
            ));
        }

        for (from, to) in &self.data.aliases {
            if crate::schema::canonical_name(to, &[]).is_none() {
                return Err(eyre!(
                    "Alias '{}' maps to unknown column '{}'",
                    from,
                    to
                ));
            }
        }

        Ok(())
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

// Merge implementations for each config section
impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        if other.primary.is_some() {
            self.primary = other.primary;
        }
        if other.secondary.is_some() {
            self.secondary = other.secondary;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        self.aliases.extend(other.aliases);
    }
}

impl DashboardConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DashboardConfig::default();
        if other.title != default.title {
            self.title = other.title;
        }
        if other.crop_info_panel != default.crop_info_panel {
            self.crop_info_panel = other.crop_info_panel;
        }
        if other.show_boxplot != default.show_boxplot {
            self.show_boxplot = other.show_boxplot;
        }
        if other.top_n != default.top_n {
            self.top_n = other.top_n;
        }
        if other.unselected_opacity != default.unselected_opacity {
            self.unselected_opacity = other.unselected_opacity;
        }
        if other.image_dir != default.image_dir {
            self.image_dir = other.image_dir;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.bar_step != default.bar_step {
            self.bar_step = other.bar_step;
        }
        if other.bar_color != default.bar_color {
            self.bar_color = other.bar_color;
        }
    }
}

impl OutputConfig {
    pub fn merge(&mut self, other: Self) {
        let default = OutputConfig::default();
        if other.format != default.format {
            self.format = other.format;
        }
        if other.vega_version != default.vega_version {
            self.vega_version = other.vega_version;
        }
        if other.vega_lite_version != default.vega_lite_version {
            self.vega_lite_version = other.vega_lite_version;
        }
        if other.vega_embed_version != default.vega_embed_version {
            self.vega_embed_version = other.vega_embed_version;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.dashboard.top_n, AppConfig::default().dashboard.top_n);
        assert_eq!(parsed.chart.bar_color, "#5F4747");
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#5F4747"));
        assert!(!is_hex_color("5F4747"));
        assert!(!is_hex_color("#5F474"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_merge_aliases_accumulate() {
        let mut base = AppConfig::default();
        base.data.aliases.insert("Land".into(), "country".into());
        let mut other = AppConfig::default();
        other.data.aliases.insert("Crop".into(), "item".into());
        other.data.delimiter = Some(b';');
        base.merge(other);
        assert_eq!(base.data.aliases.len(), 2);
        assert_eq!(base.data.delimiter, Some(b';'));
    }
}

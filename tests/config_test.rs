use cropdash::config::{AppConfig, ConfigManager};
use cropdash::{DashboardSettings, OutputFormat};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert!(config.data.primary.is_none());
    assert!(config.data.aliases.is_empty());

    assert_eq!(config.dashboard.top_n, 10);
    assert_eq!(config.dashboard.unselected_opacity, 0.2);
    assert!(config.dashboard.crop_info_panel);
    assert!(!config.dashboard.show_boxplot);

    assert_eq!(config.chart.width, 900);
    assert_eq!(config.chart.height, 400);
    assert_eq!(config.chart.bar_step, 30);
    assert_eq!(config.chart.bar_color, "#5F4747");

    assert_eq!(config.output.format, "html");
    assert!(!config.debug.enabled);
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");

    assert!(config_path.exists());
    let content = fs::read_to_string(&config_path).expect("Failed to read config");
    assert!(content.contains("[data]"));
    assert!(content.contains("[dashboard]"));
    assert!(content.contains("[chart]"));
    assert!(content.contains("[output]"));
    assert!(content.contains("[debug]"));
    assert!(content.contains("version = \"0.1\""));
}

#[test]
fn test_write_config_without_force_fails_if_exists() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    config_manager
        .write_default_config(false)
        .expect("First write should succeed");

    let result = config_manager.write_default_config(false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("already exists"));
}

#[test]
fn test_write_config_with_force_overwrites() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let first_path = config_manager
        .write_default_config(false)
        .expect("First write should succeed");
    let second_path = config_manager
        .write_default_config(true)
        .expect("Second write with force should succeed");

    assert_eq!(first_path, second_path);
}

#[test]
fn test_load_from_dir_without_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).expect("Should load default config");
    assert_eq!(config.version, "0.1");
    assert_eq!(config.dashboard.top_n, 10);
}

#[test]
fn test_load_minimal_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager
        .ensure_config_dir()
        .expect("Failed to create config dir");

    let minimal_config = r#"
version = "0.1"

[data]
secondary = "climate.csv"
delimiter = 59

[data.aliases]
"Land" = "country"

[dashboard]
show_boxplot = true
top_n = 5
"#;
    fs::write(config_manager.config_path("config.toml"), minimal_config)
        .expect("Failed to write minimal config");

    let config = AppConfig::load_from(&config_manager).expect("Failed to load config");

    assert_eq!(config.data.secondary, Some("climate.csv".into()));
    assert_eq!(config.data.delimiter, Some(b';'));
    assert_eq!(config.data.aliases.get("Land").map(String::as_str), Some("country"));
    assert!(config.dashboard.show_boxplot);
    assert_eq!(config.dashboard.top_n, 5);

    // unspecified values keep their defaults
    assert_eq!(config.chart.width, 900);
    assert_eq!(config.output.format, "html");

    let settings = DashboardSettings::from_config(&config);
    assert_eq!(settings.style.top_n, 5);
    assert!(settings.show_boxplot);
}

#[test]
fn test_invalid_toml_is_reported() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(config_manager.config_path("config.toml"), "[dashboard\n").unwrap();

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse config file"));
}

#[test]
fn test_merge_does_not_override_with_defaults() {
    let mut base = AppConfig::default();
    base.chart.width = 1200;
    base.dashboard.title = "Custom".to_string();

    base.merge(AppConfig::default());

    assert_eq!(base.chart.width, 1200);
    assert_eq!(base.dashboard.title, "Custom");
}

#[test]
fn test_validate_config_valid() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_validate_config_invalid_version() {
    let config = AppConfig {
        version: "1.0".to_string(),
        ..AppConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Unsupported config version"));
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.dashboard.top_n = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.dashboard.unselected_opacity = 1.5;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.chart.bar_color = "brown".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.output.format = "svg".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.data.aliases.insert("Land".into(), "nation".into());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("unknown column 'nation'"));
}

#[test]
fn test_output_format_from_config() {
    let mut config = AppConfig::default();
    config.output.format = "json".to_string();
    let args = <cropdash::Args as clap::Parser>::parse_from(["cropdash", "data.csv"]);
    assert_eq!(cropdash::output_format(&args, &config), OutputFormat::Json);

    let args = <cropdash::Args as clap::Parser>::parse_from([
        "cropdash", "data.csv", "--format", "html",
    ]);
    assert_eq!(cropdash::output_format(&args, &config), OutputFormat::Html);
}

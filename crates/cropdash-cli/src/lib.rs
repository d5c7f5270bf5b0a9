//! Shared CLI definitions for cropdash.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Temperature unit used for the average temperature indicator
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum UnitArg {
    /// Degrees Celsius (as stored in the source data)
    #[default]
    Celsius,
    /// Degrees Fahrenheit (converted from Celsius on every render)
    Fahrenheit,
}

/// Indicator plotted against yield
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum IndicatorArg {
    /// Pesticide use in tonnes
    #[default]
    Pesticides,
    /// Average temperature
    AvgTemp,
    /// GDP per capita
    GdpPerCapita,
    /// Food supply
    FoodSupply,
}

/// Output document format
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Self-contained HTML page embedding the chart layout with vega-embed
    Html,
    /// JSON document with the chart layout, aggregates and controls
    Json,
}

impl OutputFormat {
    /// Parse format from a config string ("html" or "json").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "html" => Some(Self::Html),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Command-line arguments for cropdash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "cropdash",
    version,
    about = "Cross-filtered crop yield dashboards from CSV tables",
    long_about = "Loads a crop yield table (optionally joined with a climate classification table), \
applies the current filter selection and writes a linked multi-view Vega-Lite dashboard."
)]
pub struct Args {
    /// Primary CSV table (country, year, item, yield and indicator columns).
    /// Falls back to [data] primary in the config file.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Secondary CSV table providing a climate classification per country
    #[arg(long = "secondary", value_name = "PATH")]
    pub secondary: Option<PathBuf>,

    /// Specify the delimiter to use when reading the CSV tables
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Temperature unit for the average temperature indicator
    #[arg(long = "unit", value_enum)]
    pub unit: Option<UnitArg>,

    /// First year to include (clamped to the observed range)
    #[arg(long = "year-min", value_name = "YEAR")]
    pub year_min: Option<i32>,

    /// Last year to include (clamped to the observed range)
    #[arg(long = "year-max", value_name = "YEAR")]
    pub year_max: Option<i32>,

    /// Restrict the dashboard to one country ("All" for every country)
    #[arg(long = "country", value_name = "NAME")]
    pub country: Option<String>,

    /// Indicator plotted against yield
    #[arg(long = "indicator", value_enum)]
    pub indicator: Option<IndicatorArg>,

    /// Show the crop information panel for this crop
    #[arg(long = "crop-info", value_name = "CROP")]
    pub crop_info: Option<String>,

    /// Pre-select a country bar (cross-filters the linked views)
    #[arg(long = "select-country", value_name = "NAME")]
    pub select_country: Option<String>,

    /// Pre-select a crop legend entry (cross-filters the linked views)
    #[arg(long = "select-crop", value_name = "CROP")]
    pub select_crop: Option<String>,

    /// Output format (default: html, or [output] format in the config file)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the output to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the sidebar control options (year bounds, countries, indicators) as JSON and exit
    #[arg(long = "controls", action)]
    pub controls: bool,

    /// Enable debug logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/cropdash/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_flags() {
        let args = Args::try_parse_from([
            "cropdash",
            "yield.csv",
            "--unit",
            "fahrenheit",
            "--year-min",
            "2000",
            "--year-max",
            "2005",
            "--country",
            "Kenya",
            "--indicator",
            "gdp-per-capita",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("yield.csv")));
        assert_eq!(args.unit, Some(UnitArg::Fahrenheit));
        assert_eq!(args.year_min, Some(2000));
        assert_eq!(args.year_max, Some(2005));
        assert_eq!(args.country.as_deref(), Some("Kenya"));
        assert_eq!(args.indicator, Some(IndicatorArg::GdpPerCapita));
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["cropdash", "--force"]).is_err());
        assert!(Args::try_parse_from(["cropdash", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("HTML"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_name("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("svg"), None);
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--year-min"));
        assert!(md.contains("--select-crop"));
        assert!(!md.contains("`--help`"));
    }
}

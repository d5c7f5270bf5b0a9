//! Cross-filtered crop yield dashboard.
//!
//! Loads a yield table (optionally joined with climate data), applies the
//! sidebar filter state, computes the ranking and summary tables, and
//! emits a linked set of Vega-Lite views as JSON or a standalone HTML page.

use color_eyre::Result;
use tracing::info;

pub mod aggregate;
pub mod chart_spec;
pub mod config;
pub mod crop_info;
pub mod dashboard;
pub mod filter;
pub mod render;
pub mod schema;
pub mod selection;
pub mod source;

pub use aggregate::Aggregates;
pub use config::{AppConfig, ConfigManager};
pub use cropdash_cli::{Args, OutputFormat};
pub use dashboard::{Dashboard, DashboardSettings, RenderPass};
pub use filter::{FilterState, SidebarControls};
pub use selection::Selection;
pub use source::{Dataset, LoadOptions, LoadWarning};

/// Application name used for the config directory and log filter
pub const APP_NAME: &str = "cropdash";

/// Selection predicates requested on the command line.
pub fn selection_from_args(args: &Args) -> Selection {
    Selection {
        country: args.select_country.clone(),
        crop: args.select_crop.clone(),
    }
}

/// Output format: CLI flag, then `[output] format`, then HTML.
pub fn output_format(args: &Args, config: &AppConfig) -> OutputFormat {
    args.format
        .or_else(|| OutputFormat::from_name(&config.output.format))
        .unwrap_or(OutputFormat::Html)
}

/// Load the data, run one render pass and write the result.
pub fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let options = LoadOptions::from_args_and_config(args, config)?;
    let dataset = Dataset::load(&options)?;
    info!(
        rows = dataset.height(),
        warnings = dataset.warnings().len(),
        "loaded dataset"
    );

    let filter = FilterState::from_args(args, dataset.year_bounds()?)?;

    if args.controls {
        let controls = SidebarControls::from_dataset(&dataset, filter.unit)?;
        let json = serde_json::to_string_pretty(&controls)?;
        return render::write_output(args.output.as_deref(), &json);
    }

    let dashboard = Dashboard::new(dataset, DashboardSettings::from_config(config));
    let pass = dashboard.render_pass(&filter, &selection_from_args(args))?;

    let format = output_format(args, config);
    let renderer = render::renderer_for(format, &config.output);
    let content = renderer.render(&pass)?;
    render::write_output(args.output.as_deref(), &content)
}

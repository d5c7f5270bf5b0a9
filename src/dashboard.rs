//! Ties the pipeline together: Filter → Aggregate → Chart spec, recomputed
//! from the immutable dataset on every pass.

use color_eyre::Result;
use polars::prelude::DataFrame;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::aggregate::Aggregates;
use crate::chart_spec::{
    climate_scatter_view, compose_layout, indicator_boxplot_view, indicator_scatter_view,
    top_indicator_view, top_yield_view, yield_trend_view, ChartStyle, Concat, ViewSpec,
};
use crate::config::AppConfig;
use crate::crop_info::{self, CropInfo};
use crate::filter::{FilterState, SidebarControls};
use crate::selection::Selection;
use crate::source::{Dataset, LoadWarning};

/// Presentation settings, taken from the `[dashboard]` and `[chart]`
/// config sections.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub title: String,
    /// Show the crop information panel.
    pub crop_info_panel: bool,
    pub show_boxplot: bool,
    pub concat: Concat,
    pub style: ChartStyle,
    pub image_dir: PathBuf,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DashboardSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            title: config.dashboard.title.clone(),
            crop_info_panel: config.dashboard.crop_info_panel,
            show_boxplot: config.dashboard.show_boxplot,
            concat: Concat::Vertical,
            style: ChartStyle {
                width: config.chart.width,
                height: config.chart.height,
                bar_step: config.chart.bar_step,
                bar_color: config.chart.bar_color.clone(),
                top_n: config.dashboard.top_n,
                unselected_opacity: config.dashboard.unselected_opacity,
            },
            image_dir: config.dashboard.image_dir.clone(),
        }
    }

    pub fn with_boxplot(mut self, show: bool) -> Self {
        self.show_boxplot = show;
        self
    }

    pub fn with_crop_info_panel(mut self, show: bool) -> Self {
        self.crop_info_panel = show;
        self
    }
}

/// Everything produced by one pass. Nothing here is kept between passes.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub title: String,
    pub filter: FilterState,
    pub selection: Selection,
    pub controls: SidebarControls,
    pub warnings: Vec<LoadWarning>,
    /// Names of the composed views, in layout order.
    pub views: Vec<String>,
    /// The composed Vega-Lite spec.
    pub layout: Value,
    pub aggregates: Aggregates,
    pub crop_info: Option<CropInfo>,
    pub filtered_rows: usize,
    /// Opacity of marks outside the active selection.
    pub unselected_opacity: f64,
}

pub struct Dashboard {
    dataset: Dataset,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(dataset: Dataset, settings: DashboardSettings) -> Self {
        Self { dataset, settings }
    }

    /// Run the whole pipeline for one interaction.
    pub fn render_pass(&self, filter: &FilterState, selection: &Selection) -> Result<RenderPass> {
        let start = Instant::now();

        let filtered = filter.apply(&self.dataset)?;
        let aggregates = Aggregates::compute(
            &filtered,
            filter.indicator,
            selection,
            self.settings.style.top_n,
        )?;
        let views = self.build_views(&filtered, &aggregates, filter)?;
        let layout = compose_layout(&views, self.settings.concat, selection)?;
        let controls = SidebarControls::from_dataset(&self.dataset, filter.unit)?;
        let crop_info = self
            .settings
            .crop_info_panel
            .then(|| crop_info::lookup(filter.crop_info, &self.settings.image_dir));

        info!(
            rows = filtered.height(),
            views = views.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "render pass complete"
        );

        Ok(RenderPass {
            title: self.settings.title.clone(),
            filter: filter.clone(),
            selection: selection.clone(),
            controls,
            warnings: self.dataset.warnings().to_vec(),
            views: views.iter().map(|v| v.name.clone()).collect(),
            layout,
            aggregates,
            crop_info,
            filtered_rows: filtered.height(),
            unselected_opacity: self.settings.style.unselected_opacity,
        })
    }

    fn build_views(
        &self,
        filtered: &DataFrame,
        aggregates: &Aggregates,
        filter: &FilterState,
    ) -> Result<Vec<ViewSpec>> {
        let style = &self.settings.style;
        let label = filter.indicator_label();

        let mut views = vec![
            top_yield_view(&aggregates.by_country_crop, style)?,
            top_indicator_view(&aggregates.indicator_by_country_crop, &label, style)?,
            yield_trend_view(filtered, style)?,
            indicator_scatter_view(filtered, filter.indicator, &label, style)?,
        ];
        if self.dataset.has_climate() {
            views.push(climate_scatter_view(&aggregates.country_year, &label, style)?);
        }
        if self.settings.show_boxplot {
            views.push(indicator_boxplot_view(filtered, filter.indicator, &label, style)?);
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_spec::{CLIMATE_SCATTER_VIEW, INDICATOR_BOXPLOT_VIEW};
    use crate::crop_info::Crop;
    use polars::prelude::*;

    fn dataset(with_climate: bool) -> Dataset {
        let mut df = df!(
            "country" => &["Kenya", "Kenya", "Togo"],
            "year" => &[2010, 2011, 2010],
            "item" => &["Maize", "Wheat", "Maize"],
            "yield_hg_ha" => &[100.0, 150.0, 50.0],
            "avg_temp" => &[20.0, 21.0, 27.0]
        )
        .unwrap();
        if with_climate {
            df.with_column(Series::new("climate".into(), &["Tropical", "Tropical", "Savanna"]))
                .unwrap();
        }
        Dataset::from_normalized(df).unwrap()
    }

    #[test]
    fn test_climate_view_only_with_climate_data() {
        let settings = DashboardSettings::default();
        let without = Dashboard::new(dataset(false), settings.clone())
            .render_pass(&FilterState::new(), &Selection::none())
            .unwrap();
        assert_eq!(without.views.len(), 4);
        assert!(!without.views.iter().any(|v| v == CLIMATE_SCATTER_VIEW));

        let with = Dashboard::new(dataset(true), settings)
            .render_pass(&FilterState::new(), &Selection::none())
            .unwrap();
        assert!(with.views.iter().any(|v| v == CLIMATE_SCATTER_VIEW));
    }

    #[test]
    fn test_boxplot_flag() {
        let settings = DashboardSettings::default().with_boxplot(true);
        let pass = Dashboard::new(dataset(false), settings)
            .render_pass(&FilterState::new(), &Selection::none())
            .unwrap();
        assert_eq!(pass.views.last().map(String::as_str), Some(INDICATOR_BOXPLOT_VIEW));
        assert_eq!(pass.layout["vconcat"].as_array().unwrap().len(), pass.views.len());
    }

    #[test]
    fn test_crop_info_panel_follows_settings() {
        let filter = FilterState::new().with_crop_info(Some(Crop::Maize));
        let shown = Dashboard::new(dataset(false), DashboardSettings::default())
            .render_pass(&filter, &Selection::none())
            .unwrap();
        assert_eq!(shown.crop_info.unwrap().title, "Maize");

        let hidden = Dashboard::new(
            dataset(false),
            DashboardSettings::default().with_crop_info_panel(false),
        )
        .render_pass(&filter, &Selection::none())
        .unwrap();
        assert!(hidden.crop_info.is_none());
    }

    #[test]
    fn test_selection_seeds_layout_params() {
        let pass = Dashboard::new(dataset(false), DashboardSettings::default())
            .render_pass(&FilterState::new(), &Selection::none().with_crop("Wheat"))
            .unwrap();
        let params = pass.layout["params"].as_array().unwrap();
        let crop = params
            .iter()
            .find(|p| p["name"] == "crop_selection")
            .unwrap();
        assert_eq!(crop["value"], serde_json::json!([{ "item": "Wheat" }]));
        // the server-side top-yield table is restricted to the selected crop
        assert_eq!(pass.aggregates.top_yield.height(), 1);
    }
}

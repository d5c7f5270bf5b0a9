//! Filter state and the filtered view it derives from a dataset.
//!
//! A `FilterState` is rebuilt from the controls on every interaction and
//! passed down the pipeline by value; nothing here mutates the dataset.

use color_eyre::Result;
use cropdash_cli::{IndicatorArg, UnitArg};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::crop_info::Crop;
use crate::schema::{self, AVG_TEMP, COUNTRY, YEAR};
use crate::source::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert the canonical Celsius column into this unit.
    fn convert_expr(self, celsius: Expr) -> Expr {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * lit(9.0) / lit(5.0) + lit(32.0),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Celsius => "Celsius (°C)",
            Self::Fahrenheit => "Fahrenheit (°F)",
        }
    }
}

impl From<UnitArg> for TemperatureUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Celsius => Self::Celsius,
            UnitArg::Fahrenheit => Self::Fahrenheit,
        }
    }
}

/// Inclusive year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamp both ends into the observed `(min, max)` range.
    pub fn clamp_to(self, bounds: (i32, i32)) -> Self {
        let (lo, hi) = bounds;
        Self::new(self.min.clamp(lo, hi), self.max.clamp(lo, hi))
    }

    fn predicate(&self) -> Expr {
        col(YEAR)
            .gt_eq(lit(self.min))
            .and(col(YEAR).lt_eq(lit(self.max)))
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: i32::MIN,
            max: i32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryFilter {
    #[default]
    All,
    Only(String),
}

impl CountryFilter {
    pub const ALL_LABEL: &'static str = "All";

    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(Self::ALL_LABEL) {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    fn predicate(&self) -> Option<Expr> {
        match self {
            Self::All => None,
            Self::Only(name) => Some(col(COUNTRY).eq(lit(name.clone()))),
        }
    }
}

impl fmt::Display for CountryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL_LABEL),
            Self::Only(name) => f.write_str(name),
        }
    }
}

/// Measure plotted against yield. Choosing one never filters rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    #[default]
    Pesticides,
    AvgTemp,
    GdpPerCapita,
    FoodSupply,
}

impl Indicator {
    pub const ALL: [Self; 4] = [
        Self::Pesticides,
        Self::AvgTemp,
        Self::GdpPerCapita,
        Self::FoodSupply,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Self::Pesticides => schema::PESTICIDES,
            Self::AvgTemp => schema::AVG_TEMP,
            Self::GdpPerCapita => schema::GDP_PER_CAPITA,
            Self::FoodSupply => schema::FOOD_SUPPLY,
        }
    }

    /// Human-readable label; the temperature label carries the unit.
    pub fn label(self, unit: TemperatureUnit) -> String {
        match self {
            Self::Pesticides => "Pesticides (tonnes)".to_string(),
            Self::AvgTemp => format!("Avg Temp ({})", unit.symbol()),
            Self::GdpPerCapita => "GDP per Capita".to_string(),
            Self::FoodSupply => "Food Supply".to_string(),
        }
    }
}

impl From<IndicatorArg> for Indicator {
    fn from(arg: IndicatorArg) -> Self {
        match arg {
            IndicatorArg::Pesticides => Self::Pesticides,
            IndicatorArg::AvgTemp => Self::AvgTemp,
            IndicatorArg::GdpPerCapita => Self::GdpPerCapita,
            IndicatorArg::FoodSupply => Self::FoodSupply,
        }
    }
}

/// The current selection of every sidebar control.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterState {
    pub unit: TemperatureUnit,
    pub years: YearRange,
    pub country: CountryFilter,
    pub indicator: Indicator,
    pub crop_info: Option<Crop>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: TemperatureUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_country(mut self, country: CountryFilter) -> Self {
        self.country = country;
        self
    }

    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn with_crop_info(mut self, crop: Option<Crop>) -> Self {
        self.crop_info = crop;
        self
    }

    /// Build a state from CLI args; the year range defaults to and is
    /// clamped to the observed bounds.
    pub fn from_args(args: &cropdash_cli::Args, bounds: Option<(i32, i32)>) -> Result<Self> {
        let crop_info = args
            .crop_info
            .as_deref()
            .map(Crop::from_str)
            .transpose()
            .map_err(|e| color_eyre::eyre::eyre!(e))?;

        let mut state = Self::new()
            .with_unit(args.unit.map(Into::into).unwrap_or_default())
            .with_indicator(args.indicator.map(Into::into).unwrap_or_default())
            .with_crop_info(crop_info);
        if let Some(country) = &args.country {
            state = state.with_country(CountryFilter::parse(country));
        }
        if let Some((lo, hi)) = bounds {
            let years = YearRange::new(args.year_min.unwrap_or(lo), args.year_max.unwrap_or(hi));
            state = state.with_years(years.clamp_to((lo, hi)));
        } else if args.year_min.is_some() || args.year_max.is_some() {
            state = state.with_years(YearRange::new(
                args.year_min.unwrap_or(i32::MIN),
                args.year_max.unwrap_or(i32::MAX),
            ));
        }
        Ok(state)
    }

    /// Label of the selected indicator, unit-aware.
    pub fn indicator_label(&self) -> String {
        self.indicator.label(self.unit)
    }

    /// Derive the filtered view: unit conversion applied to the canonical
    /// Celsius column, then year range AND country.
    pub fn apply(&self, dataset: &Dataset) -> Result<DataFrame> {
        let mut lf = dataset.frame().clone().lazy();
        if dataset.has_temperature() && self.unit != TemperatureUnit::Celsius {
            lf = lf.with_column(self.unit.convert_expr(col(AVG_TEMP)).alias(AVG_TEMP));
        }

        let mut predicate = self.years.predicate();
        if let Some(country) = self.country.predicate() {
            predicate = predicate.and(country);
        }
        let df = lf.filter(predicate).collect()?;
        tracing::debug!(
            rows = df.height(),
            of = dataset.height(),
            country = %self.country,
            "applied filter state"
        );
        Ok(df)
    }
}

/// Options offered by the sidebar controls, derived from the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarControls {
    pub units: Vec<&'static str>,
    /// Observed year bounds for the range slider.
    pub year_bounds: Option<(i32, i32)>,
    /// `"All"` followed by the sorted distinct countries.
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub crops: Vec<&'static str>,
}

impl SidebarControls {
    pub fn from_dataset(dataset: &Dataset, unit: TemperatureUnit) -> Result<Self> {
        let mut countries = vec![CountryFilter::ALL_LABEL.to_string()];
        countries.extend(dataset.countries()?);
        Ok(Self {
            units: vec![
                TemperatureUnit::Celsius.label(),
                TemperatureUnit::Fahrenheit.label(),
            ],
            year_bounds: dataset.year_bounds()?,
            countries,
            indicators: Indicator::ALL.iter().map(|i| i.label(unit)).collect(),
            crops: Crop::ALL.iter().map(|c| c.name()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let df = df!(
            "country" => &["Kenya", "Kenya", "Togo"],
            "year" => &[Some(2010), Some(2011), Some(2010)],
            "item" => &["Maize", "Maize", "Maize"],
            "yield_hg_ha" => &[100.0, 150.0, 50.0],
            "avg_temp" => &[20.0, 25.0, 30.0]
        )
        .unwrap();
        Dataset::from_normalized(df).unwrap()
    }

    #[test]
    fn test_year_range_clamp_and_swap() {
        let r = YearRange::new(2015, 1990).clamp_to((2000, 2010));
        assert_eq!(r, YearRange { min: 2000, max: 2010 });
        assert_eq!(YearRange::new(1990, 2015).clamp_to((2000, 2010)), r);
    }

    #[test]
    fn test_country_filter_parse() {
        assert_eq!(CountryFilter::parse("all"), CountryFilter::All);
        assert_eq!(CountryFilter::parse(""), CountryFilter::All);
        assert_eq!(
            CountryFilter::parse(" Kenya "),
            CountryFilter::Only("Kenya".to_string())
        );
        assert_eq!(CountryFilter::parse("Kenya").to_string(), "Kenya");
        assert_eq!(CountryFilter::All.to_string(), "All");
    }

    #[test]
    fn test_indicator_labels() {
        assert_eq!(
            Indicator::AvgTemp.label(TemperatureUnit::Fahrenheit),
            "Avg Temp (°F)"
        );
        assert_eq!(
            Indicator::AvgTemp.label(TemperatureUnit::Celsius),
            "Avg Temp (°C)"
        );
        assert_eq!(Indicator::from(IndicatorArg::GdpPerCapita), Indicator::GdpPerCapita);
        assert_eq!(Indicator::FoodSupply.column(), schema::FOOD_SUPPLY);
    }

    #[test]
    fn test_apply_year_and_country() {
        let ds = dataset();
        let state = FilterState::new()
            .with_years(YearRange::new(2010, 2010))
            .with_country(CountryFilter::parse("Kenya"));
        let df = state.apply(&ds).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("yield_hg_ha").unwrap().f64().unwrap().get(0), Some(100.0));
    }

    #[test]
    fn test_apply_fahrenheit_uses_celsius_source() {
        let ds = dataset();
        let fahrenheit = FilterState::new().with_unit(TemperatureUnit::Fahrenheit);
        let first = fahrenheit.apply(&ds).unwrap();
        let _celsius = fahrenheit.clone().with_unit(TemperatureUnit::Celsius).apply(&ds).unwrap();
        let again = fahrenheit.apply(&ds).unwrap();
        assert!(first
            .column(AVG_TEMP)
            .unwrap()
            .as_materialized_series()
            .equals(again.column(AVG_TEMP).unwrap().as_materialized_series()));
        assert_eq!(first.column(AVG_TEMP).unwrap().f64().unwrap().get(0), Some(68.0));
        // the dataset itself stays in Celsius
        assert_eq!(ds.frame().column(AVG_TEMP).unwrap().f64().unwrap().get(0), Some(20.0));
    }

    #[test]
    fn test_sidebar_controls() {
        let controls = SidebarControls::from_dataset(&dataset(), TemperatureUnit::Celsius).unwrap();
        assert_eq!(controls.year_bounds, Some((2010, 2011)));
        assert_eq!(controls.countries, vec!["All", "Kenya", "Togo"]);
        assert_eq!(controls.indicators.len(), 4);
        assert!(controls.indicators.contains(&"Avg Temp (°C)".to_string()));
    }
}

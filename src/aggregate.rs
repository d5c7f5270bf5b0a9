//! Derived summary tables, recomputed from the filtered view on every pass.
//!
//! Ranking ties (equal totals or means) are broken by country name,
//! ascending, so the top-N cut is deterministic.

use color_eyre::Result;
use polars::prelude::*;
use std::time::Instant;

use crate::filter::Indicator;
use crate::schema::derived::{INDICATOR_COUNT, INDICATOR_SUM, MEAN_INDICATOR, RANK, TOTAL_YIELD};
use crate::schema::{CLIMATE, COUNTRY, ITEM, YEAR, YIELD};
use crate::selection::Selection;

/// Number of countries kept by the top-N views.
pub const TOP_N: usize = 10;

/// Sort by `measure` descending (missing last, ties by country) and keep
/// the first `n` rows with a 1-based rank column.
fn rank_descending(lf: LazyFrame, measure: &str, n: usize) -> Result<DataFrame> {
    let df = lf
        .filter(col(measure).is_not_null())
        .sort_by_exprs(
            [col(measure), col(COUNTRY)],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_nulls_last(true),
        )
        .limit(n as IdxSize)
        .with_row_index(RANK, Some(1))
        .collect()?;
    Ok(df)
}

/// Total yield per (country, crop). The top-yield bar re-aggregates this
/// after dropping deselected crops.
pub fn yield_by_country_crop(df: &DataFrame) -> Result<DataFrame> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(COUNTRY), col(ITEM)])
        .agg([col(YIELD).sum().alias(TOTAL_YIELD)])
        .sort_by_exprs([col(COUNTRY), col(ITEM)], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Top `n` countries by total yield, optionally over a single crop.
pub fn top_countries_by_yield(df: &DataFrame, crop: Option<&str>, n: usize) -> Result<DataFrame> {
    let mut lf = df.clone().lazy();
    if let Some(crop) = crop {
        lf = lf.filter(col(ITEM).eq(lit(crop.to_string())));
    }
    let grouped = lf
        .group_by([col(COUNTRY), col(ITEM)])
        .agg([col(YIELD).sum().alias(TOTAL_YIELD)])
        .group_by([col(COUNTRY)])
        .agg([col(TOTAL_YIELD).sum()]);
    rank_descending(grouped, TOTAL_YIELD, n)
}

/// Sum and count of the indicator's present values per (country, crop).
/// The top-indicator bar derives its crop-filtered mean from these.
pub fn indicator_by_country_crop(df: &DataFrame, indicator: Indicator) -> Result<DataFrame> {
    let measure = col(indicator.column()).cast(DataType::Float64);
    let out = df
        .clone()
        .lazy()
        .group_by([col(COUNTRY), col(ITEM)])
        .agg([
            measure.clone().sum().alias(INDICATOR_SUM),
            measure.count().cast(DataType::Float64).alias(INDICATOR_COUNT),
        ])
        .sort_by_exprs([col(COUNTRY), col(ITEM)], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// Top `n` countries by mean of the indicator. Countries with no
/// indicator values at all are left out.
pub fn top_countries_by_indicator(
    df: &DataFrame,
    indicator: Indicator,
    n: usize,
) -> Result<DataFrame> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(COUNTRY)])
        .agg([col(indicator.column()).mean().alias(MEAN_INDICATOR)]);
    rank_descending(grouped, MEAN_INDICATOR, n)
}

/// One row per (country, year, climate) with total yield and mean indicator.
pub fn country_year_summary(df: &DataFrame, indicator: Indicator) -> Result<DataFrame> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(COUNTRY), col(YEAR), col(CLIMATE)])
        .agg([
            col(YIELD).sum().alias(TOTAL_YIELD),
            col(indicator.column()).mean().alias(MEAN_INDICATOR),
        ])
        .sort_by_exprs(
            [col(COUNTRY), col(YEAR), col(CLIMATE)],
            SortMultipleOptions::default().with_nulls_last(true),
        )
        .collect()?;
    Ok(out)
}

/// All derived tables of one render pass.
#[derive(Debug, Clone)]
pub struct Aggregates {
    pub by_country_crop: DataFrame,
    pub indicator_by_country_crop: DataFrame,
    pub top_yield: DataFrame,
    pub top_indicator: DataFrame,
    pub country_year: DataFrame,
}

impl Aggregates {
    pub fn compute(
        filtered: &DataFrame,
        indicator: Indicator,
        selection: &Selection,
        n: usize,
    ) -> Result<Self> {
        let start = Instant::now();
        let aggregates = Self {
            by_country_crop: yield_by_country_crop(filtered)?,
            indicator_by_country_crop: indicator_by_country_crop(filtered, indicator)?,
            top_yield: top_countries_by_yield(filtered, selection.crop.as_deref(), n)?,
            top_indicator: top_countries_by_indicator(filtered, indicator, n)?,
            country_year: country_year_summary(filtered, indicator)?,
        };
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            top_yield = aggregates.top_yield.height(),
            country_year = aggregates.country_year.height(),
            "computed aggregates"
        );
        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "country" => &["Kenya", "Kenya", "Togo", "Ghana", "Ghana", "Benin"],
            "year" => &[2010, 2011, 2010, 2010, 2010, 2011],
            "item" => &["Maize", "Wheat", "Maize", "Maize", "Wheat", "Maize"],
            "yield_hg_ha" => &[100.0, 150.0, 50.0, 200.0, 50.0, 250.0],
            "pesticides_tonnes" => &[Some(1.0), Some(3.0), None, Some(4.0), Some(6.0), Some(5.0)],
            "climate" => &[Some("Tropical"), Some("Tropical"), None, Some("Savanna"), Some("Savanna"), Some("Savanna")]
        )
        .unwrap()
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_top_yield_ties_break_alphabetically() {
        // Kenya 250, Ghana 250, Benin 250, Togo 50
        let top = top_countries_by_yield(&sample(), None, TOP_N).unwrap();
        assert_eq!(strings(&top, COUNTRY), vec!["Benin", "Ghana", "Kenya", "Togo"]);
        let ranks: Vec<Option<IdxSize>> = top
            .column(RANK)
            .unwrap()
            .as_materialized_series()
            .idx()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_top_yield_respects_n_and_crop() {
        let top = top_countries_by_yield(&sample(), Some("Maize"), 2).unwrap();
        assert_eq!(top.height(), 2);
        assert_eq!(strings(&top, COUNTRY), vec!["Benin", "Ghana"]);
        let totals = top.column(TOTAL_YIELD).unwrap().f64().unwrap();
        assert_eq!(totals.get(0), Some(250.0));
        assert_eq!(totals.get(1), Some(200.0));
    }

    #[test]
    fn test_top_indicator_mean_skips_missing() {
        let top = top_countries_by_indicator(&sample(), Indicator::Pesticides, TOP_N).unwrap();
        // Togo has no pesticide values; Benin and Ghana tie at 5.0
        assert_eq!(strings(&top, COUNTRY), vec!["Benin", "Ghana", "Kenya"]);
        let means = top.column(MEAN_INDICATOR).unwrap().f64().unwrap();
        assert_eq!(means.get(0), Some(5.0));
    }

    #[test]
    fn test_indicator_partials_per_country_crop() {
        let partials = indicator_by_country_crop(&sample(), Indicator::Pesticides).unwrap();
        assert_eq!(partials.height(), 6);
        let togo = partials
            .clone()
            .lazy()
            .filter(col(COUNTRY).eq(lit("Togo")))
            .collect()
            .unwrap();
        assert_eq!(togo.column(INDICATOR_SUM).unwrap().f64().unwrap().get(0), Some(0.0));
        assert_eq!(togo.column(INDICATOR_COUNT).unwrap().f64().unwrap().get(0), Some(0.0));
        let ghana_wheat = partials
            .lazy()
            .filter(col(COUNTRY).eq(lit("Ghana")).and(col(ITEM).eq(lit("Wheat"))))
            .collect()
            .unwrap();
        assert_eq!(ghana_wheat.column(INDICATOR_SUM).unwrap().f64().unwrap().get(0), Some(6.0));
        assert_eq!(ghana_wheat.column(INDICATOR_COUNT).unwrap().f64().unwrap().get(0), Some(1.0));
    }

    #[test]
    fn test_country_year_summary_one_row_per_triple() {
        let summary = country_year_summary(&sample(), Indicator::Pesticides).unwrap();
        // (Kenya,2010,T) (Kenya,2011,T) (Togo,2010,null) (Ghana,2010,S) (Benin,2011,S)
        assert_eq!(summary.height(), 5);
        let ghana = summary
            .clone()
            .lazy()
            .filter(col(COUNTRY).eq(lit("Ghana")))
            .collect()
            .unwrap();
        assert_eq!(ghana.column(TOTAL_YIELD).unwrap().f64().unwrap().get(0), Some(250.0));
        assert_eq!(ghana.column(MEAN_INDICATOR).unwrap().f64().unwrap().get(0), Some(5.0));
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        let empty = sample().head(Some(0));
        let aggs = Aggregates::compute(&empty, Indicator::Pesticides, &Selection::none(), TOP_N).unwrap();
        assert_eq!(aggs.by_country_crop.height(), 0);
        assert_eq!(aggs.indicator_by_country_crop.height(), 0);
        assert_eq!(aggs.top_yield.height(), 0);
        assert_eq!(aggs.top_indicator.height(), 0);
        assert_eq!(aggs.country_year.height(), 0);
        assert!(aggs.top_yield.column(RANK).is_ok());
    }
}

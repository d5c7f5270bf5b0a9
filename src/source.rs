//! Data loading: read the CSV tables, normalize key columns and join the
//! climate classification onto the observation table.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::schema::{self, AVG_TEMP, CLIMATE, COUNTRY, COUNTRY_KEY, ITEM, YEAR, YIELD};

const WHITESPACE: &str = " \t\r\n";

/// Degradations found while loading. The dashboard still renders; these are
/// shown as a warning banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// An indicator column is absent and was replaced with missing values.
    MissingColumn { column: String },
    /// The secondary table could not be joined.
    SecondarySkipped { reason: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } if column == AVG_TEMP => write!(
                f,
                "{} column not found in data; the temperature unit setting has no effect.",
                column
            ),
            Self::MissingColumn { column } => write!(f, "{} column not found in data.", column),
            Self::SecondarySkipped { reason } => {
                write!(f, "Climate table was not joined: {}", reason)
            }
        }
    }
}

/// Where to read the tables from and how.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub primary: PathBuf,
    pub secondary: Option<PathBuf>,
    pub delimiter: Option<u8>,
    /// Extra header aliases (raw header, canonical name).
    pub aliases: Vec<(String, String)>,
}

impl LoadOptions {
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            ..Default::default()
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<PathBuf>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.push((from.to_string(), to.to_string()));
        self
    }

    /// Create LoadOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &cropdash_cli::Args, config: &AppConfig) -> Result<Self> {
        let primary = args
            .path
            .clone()
            .or_else(|| config.data.primary.clone())
            .ok_or_else(|| eyre!("No primary table given (pass a PATH or set [data] primary)"))?;

        Ok(Self {
            primary,
            secondary: args.secondary.clone().or_else(|| config.data.secondary.clone()),
            delimiter: args.delimiter.or(config.data.delimiter),
            aliases: config
                .data
                .aliases
                .iter()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect(),
        })
    }
}

/// The normalized observation table. Never mutated after loading; every
/// render pass works on a filtered copy.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    warnings: Vec<LoadWarning>,
    has_temperature: bool,
}

impl Dataset {
    /// Load the primary table and, if configured, left-join the secondary one.
    pub fn load(options: &LoadOptions) -> Result<Self> {
        let raw = read_csv_as_strings(&options.primary, options.delimiter)?;
        debug!(
            rows = raw.height(),
            path = %options.primary.display(),
            "read primary table"
        );
        let (mut df, mut warnings) = normalize(raw, &options.aliases)?;

        if let Some(secondary) = &options.secondary {
            // an unusable secondary table degrades to no climate data
            match read_csv_as_strings(secondary, options.delimiter) {
                Ok(raw) => match prepare_secondary(raw, &options.aliases)? {
                    Ok((lookup, keys)) => {
                        df = left_join_climate(df, lookup, &keys)?;
                    }
                    Err(warning) => warnings.push(warning),
                },
                Err(e) => warnings.push(LoadWarning::SecondarySkipped {
                    reason: e.to_string(),
                }),
            }
        }

        Self::finish(df, warnings)
    }

    /// Wrap a frame that already uses the canonical column names and types
    /// (year as integer, measures as floats).
    pub fn from_normalized(df: DataFrame) -> Result<Self> {
        require_columns(&df, &schema::REQUIRED)?;
        let mut warnings = Vec::new();
        let df = fill_missing_indicators(df, &mut warnings)?;
        let df = if df.column(COUNTRY_KEY).is_err() {
            df.lazy()
                .with_column(col(COUNTRY).str().to_uppercase().alias(COUNTRY_KEY))
                .collect()?
        } else {
            df
        };
        Self::finish(df, warnings)
    }

    fn finish(mut df: DataFrame, warnings: Vec<LoadWarning>) -> Result<Self> {
        if df.column(CLIMATE).is_err() {
            df.with_column(Series::full_null(
                CLIMATE.into(),
                df.height(),
                &DataType::String,
            ))?;
        }
        let has_temperature = !warnings
            .iter()
            .any(|w| matches!(w, LoadWarning::MissingColumn { column } if column == AVG_TEMP));
        for warning in &warnings {
            warn!("{}", warning);
        }
        Ok(Self {
            df,
            warnings,
            has_temperature,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// False when the temperature column was absent; unit conversion is then a no-op.
    pub fn has_temperature(&self) -> bool {
        self.has_temperature
    }

    /// True when at least one row carries a climate classification.
    pub fn has_climate(&self) -> bool {
        self.df
            .column(CLIMATE)
            .map(|c| c.null_count() < self.df.height())
            .unwrap_or(false)
    }

    /// Observed (min, max) year, ignoring rows whose year did not parse.
    pub fn year_bounds(&self) -> Result<Option<(i32, i32)>> {
        let years = self.df.column(YEAR)?.as_materialized_series().i32()?;
        Ok(years.min().zip(years.max()))
    }

    /// Distinct country names, sorted.
    pub fn countries(&self) -> Result<Vec<String>> {
        distinct_strings(&self.df, COUNTRY)
    }
}

fn distinct_strings(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = df.column(column)?.as_materialized_series().str()?;
    let set: BTreeSet<String> = values.into_iter().flatten().map(str::to_string).collect();
    Ok(set.into_iter().collect())
}

/// Read a CSV with every column as a string and trimmed header names.
pub fn read_csv_as_strings(path: &Path, delimiter: Option<u8>) -> Result<DataFrame> {
    if !path.exists() {
        return Err(eyre!("Failed to read {}: file not found", path.display()));
    }
    let mut read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0));
    if let Some(delimiter) = delimiter {
        read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
    }
    let mut df = read_options
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

/// Parse a year cell. Accepts plain integers, whole floats and dates;
/// anything else becomes missing.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(year) = s.parse::<i32>() {
        return Some(year);
    }
    if let Ok(f) = s.parse::<f64>() {
        return (f.is_finite() && f.fract() == 0.0 && f.abs() < i32::MAX as f64)
            .then_some(f as i32);
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.year());
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.year());
        }
    }
    None
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &name in required {
        if df.column(name).is_err() {
            return Err(eyre!("Missing required column: {}", name));
        }
    }
    Ok(())
}

/// Rename raw headers to canonical names. A header already spelled as the
/// canonical name claims it before any alias does; other headers mapping to
/// a claimed name are dropped.
fn apply_aliases(df: DataFrame, aliases: &[(String, String)]) -> Result<DataFrame> {
    let resolved: Vec<Option<&str>> = df
        .get_column_names_str()
        .iter()
        .map(|raw| schema::canonical_name(raw, aliases))
        .collect();

    let mut owner: HashMap<&str, usize> = HashMap::new();
    for exact_pass in [true, false] {
        for (idx, (column, canonical)) in df.get_columns().iter().zip(&resolved).enumerate() {
            let Some(canonical) = *canonical else { continue };
            let exact = column.name().trim().eq_ignore_ascii_case(canonical);
            if exact == exact_pass {
                owner.entry(canonical).or_insert(idx);
            }
        }
    }

    let mut columns = Vec::with_capacity(df.width());
    for (idx, (column, canonical)) in df.get_columns().iter().zip(&resolved).enumerate() {
        match *canonical {
            Some(canonical) if owner.get(canonical) == Some(&idx) => {
                columns.push(column.clone().with_name(canonical.into()));
            }
            Some(canonical) => {
                debug!(header = %column.name(), canonical, "dropping duplicate column");
            }
            None => columns.push(column.clone()),
        }
    }
    Ok(DataFrame::new(columns)?)
}

fn replace_year_column(mut df: DataFrame) -> Result<DataFrame> {
    let as_text = df.column(YEAR)?.cast(&DataType::String)?;
    let years: Vec<Option<i32>> = as_text
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_year))
        .collect();
    let unparsed = years.iter().filter(|y| y.is_none()).count();
    if unparsed > 0 {
        debug!(unparsed, "year values coerced to missing");
    }
    df.with_column(Series::new(YEAR.into(), years))?;
    Ok(df)
}

fn fill_missing_indicators(mut df: DataFrame, warnings: &mut Vec<LoadWarning>) -> Result<DataFrame> {
    for name in schema::INDICATORS {
        if df.column(name).is_err() {
            warnings.push(LoadWarning::MissingColumn {
                column: name.to_string(),
            });
            df.with_column(Series::full_null(name.into(), df.height(), &DataType::Float64))?;
        }
    }
    Ok(df)
}

fn trimmed(name: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(WHITESPACE))
}

/// Normalize a raw (all-string) primary table.
pub fn normalize(
    raw: DataFrame,
    aliases: &[(String, String)],
) -> Result<(DataFrame, Vec<LoadWarning>)> {
    let df = apply_aliases(raw, aliases)?;
    require_columns(&df, &schema::REQUIRED)?;

    let mut warnings = Vec::new();
    let df = fill_missing_indicators(df, &mut warnings)?;
    let df = replace_year_column(df)?;

    let mut exprs = vec![
        trimmed(COUNTRY).alias(COUNTRY),
        trimmed(COUNTRY).str().to_uppercase().alias(COUNTRY_KEY),
        trimmed(ITEM).alias(ITEM),
        col(YIELD).cast(DataType::Float64).alias(YIELD),
    ];
    for name in schema::INDICATORS {
        exprs.push(col(name).cast(DataType::Float64).alias(name));
    }
    if df.column(CLIMATE).is_ok() {
        exprs.push(trimmed(CLIMATE).alias(CLIMATE));
    }

    let df = df.lazy().with_columns(exprs).collect()?;
    Ok((df, warnings))
}

/// Reduce the secondary table to its join keys plus the climate column,
/// one row per key. Returns a warning instead when it cannot be joined.
fn prepare_secondary(
    raw: DataFrame,
    aliases: &[(String, String)],
) -> Result<std::result::Result<(DataFrame, Vec<&'static str>), LoadWarning>> {
    let df = apply_aliases(raw, aliases)?;
    for needed in [COUNTRY, CLIMATE] {
        if df.column(needed).is_err() {
            return Ok(Err(LoadWarning::SecondarySkipped {
                reason: format!("missing column {}", needed),
            }));
        }
    }

    let mut keys = vec![COUNTRY_KEY];
    let mut df = df;
    if df.column(YEAR).is_ok() {
        df = replace_year_column(df)?;
        keys.push(YEAR);
    }
    let mut exprs = vec![
        trimmed(COUNTRY).str().to_uppercase().alias(COUNTRY_KEY),
        trimmed(CLIMATE).alias(CLIMATE),
    ];
    if df.column(ITEM).is_ok() {
        exprs.push(trimmed(ITEM).alias(ITEM));
        keys.push(ITEM);
    }

    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let lookup = df
        .lazy()
        .with_columns(exprs)
        .group_by_stable(key_exprs)
        .agg([col(CLIMATE).first()])
        .collect()?;
    debug!(rows = lookup.height(), keys = ?keys, "prepared climate lookup");
    Ok(Ok((lookup, keys)))
}

/// Left join: every primary row survives, unmatched rows get a missing climate.
fn left_join_climate(primary: DataFrame, lookup: DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let primary = if primary.column(CLIMATE).is_ok() {
        primary.drop(CLIMATE)?
    } else {
        primary
    };
    let on: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let joined = primary
        .lazy()
        .join(
            lookup.lazy(),
            on.clone(),
            on,
            JoinArgs {
                maintain_order: MaintainOrderJoin::Left,
                ..JoinArgs::new(JoinType::Left)
            },
        )
        .collect()?;
    Ok(joined)
}

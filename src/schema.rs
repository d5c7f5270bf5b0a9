//! Canonical column names of the normalized observation table.
//!
//! Source files use a handful of different headers for the same measure;
//! the loader maps all of them onto these names.

pub const COUNTRY: &str = "country";
/// Upper-cased, trimmed country name used only as a join key.
pub const COUNTRY_KEY: &str = "country_key";
pub const YEAR: &str = "year";
pub const ITEM: &str = "item";
pub const YIELD: &str = "yield_hg_ha";
pub const PESTICIDES: &str = "pesticides_tonnes";
pub const AVG_TEMP: &str = "avg_temp";
pub const GDP_PER_CAPITA: &str = "gdp_per_capita";
pub const FOOD_SUPPLY: &str = "food_supply";
pub const CLIMATE: &str = "climate";

/// Columns the primary table cannot do without.
pub const REQUIRED: [&str; 4] = [COUNTRY, YEAR, ITEM, YIELD];

/// Indicator measures; absent ones degrade to all-missing columns.
pub const INDICATORS: [&str; 4] = [PESTICIDES, AVG_TEMP, GDP_PER_CAPITA, FOOD_SUPPLY];

// ── Derived aggregate columns ───────────────────────────────────────────────
pub mod derived {
    pub const TOTAL_YIELD: &str = "total_yield";
    pub const MEAN_INDICATOR: &str = "mean_indicator";
    /// Per-crop partial sums behind the client-side mean.
    pub const INDICATOR_SUM: &str = "indicator_sum";
    pub const INDICATOR_COUNT: &str = "indicator_count";
    pub const RANK: &str = "rank";
}

/// Header aliases seen in the wild, matched case-insensitively after trimming.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("country/area", COUNTRY),
    ("area", COUNTRY),
    ("country", COUNTRY),
    ("year", YEAR),
    ("item", ITEM),
    ("crop", ITEM),
    ("hg/ha_yield", YIELD),
    ("yield", YIELD),
    ("yield_hg_ha", YIELD),
    ("pesticides_tonnes", PESTICIDES),
    ("pesticides", PESTICIDES),
    ("avg_temp", AVG_TEMP),
    ("average_temperature", AVG_TEMP),
    ("gdp_per_capita_clean", GDP_PER_CAPITA),
    ("gdp_per_capita", GDP_PER_CAPITA),
    ("food_supply", FOOD_SUPPLY),
    ("climate", CLIMATE),
    ("climate_zone", CLIMATE),
    ("climate zone", CLIMATE),
    ("climate_classification", CLIMATE),
];

/// Resolve a raw header to its canonical name, consulting user aliases first.
/// A user alias may point at any known header spelling, e.g. `Land -> Area`.
pub fn canonical_name<'a>(header: &str, extra: &'a [(String, String)]) -> Option<&'a str> {
    let needle = header.trim().to_lowercase();
    match extra
        .iter()
        .find(|(from, _)| from.trim().to_lowercase() == needle)
    {
        Some((_, to)) => match default_alias(to) {
            Some(canonical) => Some(canonical),
            None => Some(to.as_str()),
        },
        None => default_alias(&needle),
    }
}

fn default_alias(header: &str) -> Option<&'static str> {
    let needle = header.trim().to_lowercase();
    DEFAULT_ALIASES
        .iter()
        .find(|(from, _)| *from == needle)
        .map(|(_, to)| *to)
}

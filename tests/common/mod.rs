#![allow(dead_code)]

use cropdash::{Dataset, LoadOptions};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Yield table in the shape of the public crop yield export.
pub const PRIMARY_CSV: &str = "\
Area,Item,Year,hg/ha_yield,pesticides_tonnes,avg_temp,GDP_per_capita_clean,food_supply
Kenya,Maize,2010,100,10,20.5,1000,2100
Kenya,Maize,2011,150,12,21.0,1100,2150
Kenya,Wheat,2011,80,12,21.0,1100,2150
 Togo ,Maize,2010,50,,27.0,600,
Ghana,Cassava,2012-01-01,300,5,26.5,1500,2500
Ghana,Maize,not a year,40,5,26.5,1500,2500
";

/// The three-row table from the year-range scenario.
pub const SCENARIO_CSV: &str = "\
country,year,item,yield_hg_ha,pesticides_tonnes,avg_temp,gdp_per_capita,food_supply
Kenya,2010,Maize,100,1,20,1000,2000
Kenya,2011,Maize,150,2,21,1000,2000
Togo,2010,Maize,50,3,27,600,1800
";

/// Climate lookup keyed by country only, with a duplicated key.
pub const CLIMATE_CSV: &str = "\
Country,Climate Zone
KENYA,Tropical
Togo,Savanna
Togo,Desert
";

pub fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

pub fn primary_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_csv(&dir, "yield.csv", PRIMARY_CSV);
    (dir, path)
}

pub fn load(path: PathBuf) -> Dataset {
    Dataset::load(&LoadOptions::new(path)).expect("Failed to load fixture")
}

pub fn load_csv(content: &str) -> (TempDir, Dataset) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_csv(&dir, "data.csv", content);
    let dataset = load(path);
    (dir, dataset)
}

pub fn load_with_climate() -> (TempDir, Dataset) {
    let (dir, primary) = primary_fixture();
    let secondary = write_csv(&dir, "climate.csv", CLIMATE_CSV);
    let dataset = Dataset::load(&LoadOptions::new(primary).with_secondary(secondary))
        .expect("Failed to load fixture with climate");
    (dir, dataset)
}

pub fn strings(df: &polars::prelude::DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

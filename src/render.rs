//! Turn a render pass into output: the raw spec bundle as JSON, or a
//! self-contained HTML page that mounts the layout with vega-embed.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use cropdash_cli::OutputFormat;

use crate::chart_spec::frame_to_values;
use crate::config::OutputConfig;
use crate::dashboard::RenderPass;
use crate::schema::derived::{RANK, TOTAL_YIELD};
use crate::schema::COUNTRY;
use crate::selection::Predicate;

pub trait Renderer {
    fn render(&self, pass: &RenderPass) -> Result<String>;
}

/// Pick the renderer for an output format.
pub fn renderer_for(format: OutputFormat, output: &OutputConfig) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Json => Box::new(JsonRenderer),
        OutputFormat::Html => Box::new(HtmlRenderer::from_config(output)),
    }
}

fn frame_rows(df: &DataFrame) -> Result<Vec<Value>> {
    let names: Vec<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
    frame_to_values(df, &names)
}

/// Pretty-printed JSON bundle of everything a pass produced.
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, pass: &RenderPass) -> Result<String> {
        let bundle = json!({
            "title": pass.title,
            "filter": pass.filter,
            "selection": pass.selection,
            "controls": pass.controls,
            "warnings": pass.warnings,
            "crop_info": pass.crop_info,
            "filtered_rows": pass.filtered_rows,
            "views": pass.views,
            "aggregates": {
                "top_yield": frame_rows(&pass.aggregates.top_yield)?,
                "top_indicator": frame_rows(&pass.aggregates.top_indicator)?,
                "country_year": frame_rows(&pass.aggregates.country_year)?,
            },
            "layout": pass.layout,
        });
        Ok(serde_json::to_string_pretty(&bundle)?)
    }
}

pub struct HtmlRenderer {
    pub vega_version: String,
    pub vega_lite_version: String,
    pub vega_embed_version: String,
}

impl HtmlRenderer {
    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            vega_version: output.vega_version.clone(),
            vega_lite_version: output.vega_lite_version.clone(),
            vega_embed_version: output.vega_embed_version.clone(),
        }
    }

    fn sidebar(&self, pass: &RenderPass) -> String {
        let filter = &pass.filter;
        let controls = &pass.controls;
        let years = match controls.year_bounds {
            Some((lo, hi)) => format!(
                "{} to {} (data: {} to {})",
                filter.years.min.max(lo),
                filter.years.max.min(hi),
                lo,
                hi
            ),
            None => "no years".to_string(),
        };
        let mut out = String::new();
        out.push_str("<aside class=\"sidebar\">\n<h2>Filters</h2>\n<dl>\n");
        let entries = [
            ("Temperature unit", filter.unit.label().to_string()),
            ("Years", years),
            (
                "Country",
                format!(
                    "{} ({} available)",
                    filter.country,
                    controls.countries.len().saturating_sub(1)
                ),
            ),
            ("Indicator", filter.indicator_label()),
            (
                "Selected country",
                pass.selection.country.clone().unwrap_or_else(|| "all".into()),
            ),
            (
                "Selected crop",
                pass.selection.crop.clone().unwrap_or_else(|| "all".into()),
            ),
            ("Rows", pass.filtered_rows.to_string()),
        ];
        for (term, value) in entries {
            let _ = writeln!(
                out,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(term),
                escape_html(&value)
            );
        }
        out.push_str("</dl>\n</aside>\n");
        out
    }

    fn crop_panel(&self, pass: &RenderPass) -> String {
        match &pass.crop_info {
            Some(info) => format!(
                "<section class=\"crop-info\">\n<h2>{}</h2>\n<img src=\"{}\" alt=\"{}\">\n<p>{}</p>\n</section>\n",
                escape_html(&info.title),
                escape_html(&info.image.to_string_lossy()),
                escape_html(&info.title),
                escape_html(&info.description)
            ),
            None => String::new(),
        }
    }

    fn top_yield_table(&self, pass: &RenderPass) -> Result<String> {
        let df = &pass.aggregates.top_yield;
        let ranks = df.column(RANK)?.as_materialized_series().idx()?;
        let countries = df.column(COUNTRY)?.as_materialized_series().str()?;
        let totals = df.column(TOTAL_YIELD)?.as_materialized_series().f64()?;

        let mut out = String::from(
            "<table class=\"top-n\">\n<thead><tr><th>Rank</th><th>Country</th><th>Total yield (hg/ha)</th></tr></thead>\n<tbody>\n",
        );
        for ((rank, country), total) in ranks.into_iter().zip(countries).zip(totals) {
            let country = country.unwrap_or("");
            let opacity = pass.selection.opacity_for(
                Predicate::CountryClick,
                country,
                pass.unselected_opacity,
            );
            let _ = writeln!(
                out,
                "<tr style=\"opacity: {}\"><td>{}</td><td>{}</td><td>{:.0}</td></tr>",
                opacity,
                rank.unwrap_or_default(),
                escape_html(country),
                total.unwrap_or_default()
            );
        }
        out.push_str("</tbody>\n</table>\n");
        Ok(out)
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, pass: &RenderPass) -> Result<String> {
        let warnings: String = pass
            .warnings
            .iter()
            .map(|w| format!("<div class=\"warning\">{}</div>\n", escape_html(&w.to_string())))
            .collect();
        let spec = serde_json::to_string(&pass.layout)?;

        let html = format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://cdn.jsdelivr.net/npm/vega@{vega}"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-lite@{vega_lite}"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-embed@{vega_embed}"></script>
<style>
  body {{ font-family: sans-serif; margin: 0; display: flex; color: #212529; }}
  .sidebar {{ width: 260px; padding: 16px; background: #f8f9fa; border-right: 1px solid #dee2e6; }}
  .sidebar dt {{ font-weight: 600; margin-top: 8px; }}
  .sidebar dd {{ margin: 0; }}
  main {{ flex: 1; padding: 16px; }}
  h1 {{ font-size: 20px; }}
  .warning {{ background: #fff3cd; border: 1px solid #ffe69c; padding: 6px 10px; margin-bottom: 6px; border-radius: 4px; }}
  .crop-info img {{ max-width: 240px; }}
  table.top-n {{ border-collapse: collapse; margin-top: 16px; }}
  table.top-n td, table.top-n th {{ border: 1px solid #dee2e6; padding: 4px 8px; }}
</style>
</head>
<body>
{sidebar}<main>
<h1>{title}</h1>
{warnings}{crop_panel}<div id="vis"></div>
{table}</main>
<script>
vegaEmbed("#vis", {spec}, {{ actions: false }}).catch(console.error);
</script>
</body>
</html>
"##,
            title = escape_html(&pass.title),
            vega = self.vega_version,
            vega_lite = self.vega_lite_version,
            vega_embed = self.vega_embed_version,
            sidebar = self.sidebar(pass),
            warnings = warnings,
            crop_panel = self.crop_panel(pass),
            table = self.top_yield_table(pass)?,
            // keep a literal "</script>" inside the data from closing the tag
            spec = spec.replace("</", "<\\/"),
        );
        Ok(html)
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write rendered output to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
        assert_eq!(escape_html("Côte d\"Ivoire"), "Côte d&quot;Ivoire");
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_write_output_missing_dir_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.html");
        let err = write_output(Some(&path), "x").unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"));
    }
}

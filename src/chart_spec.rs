//! Vega-Lite view specifications for the linked dashboard charts.
//!
//! Every view is a unit spec with its rows inlined. Cross-filtering is
//! declared with top-level point-selection params (see [`compose_layout`]);
//! each view lists the predicates it is filtered by, the ones it emits, and
//! the one that drives its opacity.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::filter::Indicator;
use crate::schema::derived::{INDICATOR_COUNT, INDICATOR_SUM, MEAN_INDICATOR, RANK, TOTAL_YIELD};
use crate::schema::{CLIMATE, COUNTRY, FOOD_SUPPLY, ITEM, YEAR, YIELD};
use crate::selection::{Predicate, Selection, SELECTED_OPACITY, UNSELECTED_OPACITY};

pub const SCHEMA_URL: &str = "https://vega.github.io/schema/vega-lite/v5.json";

pub const TOP_YIELD_VIEW: &str = "top_yield";
pub const TOP_INDICATOR_VIEW: &str = "top_indicator";
pub const YIELD_TREND_VIEW: &str = "yield_trend";
pub const INDICATOR_SCATTER_VIEW: &str = "indicator_scatter";
pub const CLIMATE_SCATTER_VIEW: &str = "climate_scatter";
pub const INDICATOR_BOXPLOT_VIEW: &str = "indicator_boxplot";

const YIELD_TITLE: &str = "Yield (hg/ha)";
const TOTAL_YIELD_TITLE: &str = "Total Yield (hg/ha)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Bar,
    Line,
    Circle,
    Boxplot,
}

impl Mark {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Boxplot => "boxplot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Ordinal => "ordinal",
            Self::Quantitative => "quantitative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    X,
    Y,
    Color,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// A field definition for one encoding channel or tooltip entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub field: String,
    pub field_type: FieldType,
    pub title: Option<String>,
    pub aggregate: Option<&'static str>,
    sort: Option<Value>,
    legend: Option<Value>,
    axis: Option<Value>,
}

impl Encoding {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            field_type,
            title: None,
            aggregate: None,
            sort: None,
            legend: None,
            axis: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn aggregate(mut self, op: &'static str) -> Self {
        self.aggregate = Some(op);
        self
    }

    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn legend(mut self, legend: Value) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Hide the legend for this channel.
    pub fn no_legend(self) -> Self {
        self.legend(Value::Null)
    }

    pub fn axis(mut self, axis: Value) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut def = Map::new();
        def.insert("field".into(), json!(self.field));
        def.insert("type".into(), json!(self.field_type.as_str()));
        if let Some(op) = self.aggregate {
            def.insert("aggregate".into(), json!(op));
        }
        if let Some(title) = &self.title {
            def.insert("title".into(), json!(title));
        }
        if let Some(sort) = &self.sort {
            def.insert("sort".into(), sort.clone());
        }
        if let Some(legend) = &self.legend {
            def.insert("legend".into(), legend.clone());
        }
        if let Some(axis) = &self.axis {
            def.insert("axis".into(), axis.clone());
        }
        Value::Object(def)
    }
}

/// Client-side data transforms, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Keep rows inside a selection; an empty selection keeps everything.
    FilterParam(Predicate),
    /// Vega expression filter, e.g. `datum.rank <= 10`.
    FilterExpr(String),
    Aggregate {
        ops: Vec<AggregateOp>,
        groupby: Vec<String>,
    },
    /// Derived field from a Vega expression.
    Calculate { expr: String, alias: String },
    Window {
        op: &'static str,
        alias: String,
        sort: Vec<(String, Order)>,
    },
}

impl Transform {
    pub fn to_json(&self) -> Value {
        match self {
            Self::FilterParam(predicate) => {
                json!({ "filter": { "param": predicate.param_name(), "empty": true } })
            }
            Self::FilterExpr(expr) => json!({ "filter": expr }),
            Self::Aggregate { ops, groupby } => json!({
                "aggregate": ops
                    .iter()
                    .map(|a| json!({ "op": a.op, "field": a.field, "as": a.alias }))
                    .collect::<Vec<_>>(),
                "groupby": groupby,
            }),
            Self::Calculate { expr, alias } => json!({ "calculate": expr, "as": alias }),
            Self::Window { op, alias, sort } => json!({
                "window": [{ "op": op, "as": alias }],
                "sort": sort
                    .iter()
                    .map(|(field, order)| json!({ "field": field, "order": order.as_str() }))
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOp {
    pub op: &'static str,
    pub field: String,
    pub alias: String,
}

impl AggregateOp {
    pub fn new(op: &'static str, field: &str, alias: &str) -> Self {
        Self {
            op,
            field: field.to_string(),
            alias: alias.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Height {
    Fixed(u32),
    /// Band step per discrete value.
    Step(u32),
}

/// One unit view of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub name: String,
    pub title: String,
    pub mark: Mark,
    mark_props: Map<String, Value>,
    pub values: Vec<Value>,
    encodings: BTreeMap<Channel, Encoding>,
    tooltips: Vec<Encoding>,
    pub transforms: Vec<Transform>,
    pub filtered_by: Vec<Predicate>,
    pub emits: Vec<Predicate>,
    pub highlight: Option<Predicate>,
    width: Option<u32>,
    height: Option<Height>,
    unselected_opacity: f64,
}

impl ViewSpec {
    pub fn new(name: impl Into<String>, mark: Mark) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            mark,
            mark_props: Map::new(),
            values: Vec::new(),
            encodings: BTreeMap::new(),
            tooltips: Vec::new(),
            transforms: Vec::new(),
            filtered_by: Vec::new(),
            emits: Vec::new(),
            highlight: None,
            width: None,
            height: None,
            unselected_opacity: UNSELECTED_OPACITY,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn mark_property(mut self, key: &str, value: Value) -> Self {
        self.mark_props.insert(key.to_string(), value);
        self
    }

    /// Inline the given columns of `df` as the view's data.
    pub fn data(mut self, df: &DataFrame, columns: &[&str]) -> Result<Self> {
        self.values = frame_to_values(df, columns)?;
        Ok(self)
    }

    pub fn encode(mut self, channel: Channel, encoding: Encoding) -> Self {
        self.encodings.insert(channel, encoding);
        self
    }

    pub fn tooltip(mut self, encoding: Encoding) -> Self {
        self.tooltips.push(encoding);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn filtered_by(mut self, predicate: Predicate) -> Self {
        self.filtered_by.push(predicate);
        self
    }

    pub fn emits(mut self, predicate: Predicate) -> Self {
        self.emits.push(predicate);
        self
    }

    pub fn highlight_by(mut self, predicate: Predicate) -> Self {
        self.highlight = Some(predicate);
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: Height) -> Self {
        self.height = Some(height);
        self
    }

    pub fn unselected_opacity(mut self, opacity: f64) -> Self {
        self.unselected_opacity = opacity;
        self
    }

    /// Predicates this view needs defined somewhere in the layout.
    fn referenced(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.filtered_by.iter().copied().chain(self.highlight)
    }

    pub fn to_json(&self) -> Value {
        let mut view = Map::new();
        view.insert("name".into(), json!(self.name));
        if !self.title.is_empty() {
            view.insert("title".into(), json!(self.title));
        }
        if let Some(width) = self.width {
            view.insert("width".into(), json!(width));
        }
        match self.height {
            Some(Height::Fixed(h)) => {
                view.insert("height".into(), json!(h));
            }
            Some(Height::Step(step)) => {
                view.insert("height".into(), json!({ "step": step }));
            }
            None => {}
        }
        view.insert("data".into(), json!({ "values": self.values }));

        let mut mark = Map::new();
        mark.insert("type".into(), json!(self.mark.as_str()));
        mark.extend(self.mark_props.clone());
        view.insert("mark".into(), Value::Object(mark));

        // selection filters run before any reshaping transform
        let transforms: Vec<Value> = self
            .filtered_by
            .iter()
            .map(|p| Transform::FilterParam(*p).to_json())
            .chain(self.transforms.iter().map(Transform::to_json))
            .collect();
        if !transforms.is_empty() {
            view.insert("transform".into(), Value::Array(transforms));
        }

        let mut encoding = Map::new();
        for (channel, enc) in &self.encodings {
            encoding.insert(channel.as_str().into(), enc.to_json());
        }
        if let Some(predicate) = self.highlight {
            encoding.insert(
                "opacity".into(),
                json!({
                    "condition": {
                        "param": predicate.param_name(),
                        "value": SELECTED_OPACITY,
                        "empty": true,
                    },
                    "value": self.unselected_opacity,
                }),
            );
        }
        if !self.tooltips.is_empty() {
            encoding.insert(
                "tooltip".into(),
                Value::Array(self.tooltips.iter().map(Encoding::to_json).collect()),
            );
        }
        view.insert("encoding".into(), Value::Object(encoding));

        Value::Object(view)
    }
}

/// Serialize the listed columns (those present) of `df` as row objects.
/// Missing values become `null`.
pub fn frame_to_values(df: &DataFrame, columns: &[&str]) -> Result<Vec<Value>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }
    let present: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| df.column(c).is_ok())
        .collect();
    let mut selected = df.select(present)?;
    let mut buf = Vec::new();
    JsonWriter::new(&mut buf)
        .with_json_format(JsonFormat::Json)
        .finish(&mut selected)?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Sizes and colors shared by the view builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub bar_step: u32,
    pub bar_color: String,
    pub top_n: usize,
    pub unselected_opacity: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            bar_step: 30,
            bar_color: "#5F4747".to_string(),
            top_n: crate::aggregate::TOP_N,
            unselected_opacity: UNSELECTED_OPACITY,
        }
    }
}

/// Top-N countries by total yield over the crops in the current crop
/// selection. Ranking happens client-side so that legend clicks re-rank.
pub fn top_yield_view(by_country_crop: &DataFrame, style: &ChartStyle) -> Result<ViewSpec> {
    Ok(ViewSpec::new(TOP_YIELD_VIEW, Mark::Bar)
        .title(format!("Top {} Countries by Total Yield", style.top_n))
        .mark_property("color", json!(style.bar_color))
        .data(by_country_crop, &[COUNTRY, ITEM, TOTAL_YIELD])?
        .filtered_by(Predicate::CropClick)
        .transform(Transform::Aggregate {
            ops: vec![AggregateOp::new("sum", TOTAL_YIELD, TOTAL_YIELD)],
            groupby: vec![COUNTRY.into()],
        })
        .transform(Transform::Window {
            op: "row_number",
            alias: RANK.into(),
            sort: vec![
                (TOTAL_YIELD.into(), Order::Descending),
                (COUNTRY.into(), Order::Ascending),
            ],
        })
        .transform(Transform::FilterExpr(format!(
            "datum.{} <= {}",
            RANK, style.top_n
        )))
        .encode(
            Channel::X,
            Encoding::new(TOTAL_YIELD, FieldType::Quantitative).title(YIELD_TITLE),
        )
        .encode(
            Channel::Y,
            Encoding::new(COUNTRY, FieldType::Nominal)
                .title("Country")
                .sort(json!("-x")),
        )
        .tooltip(Encoding::new(COUNTRY, FieldType::Nominal).title("Country"))
        .tooltip(Encoding::new(TOTAL_YIELD, FieldType::Quantitative).title(TOTAL_YIELD_TITLE))
        .emits(Predicate::CountryClick)
        .highlight_by(Predicate::CountryClick)
        .unselected_opacity(style.unselected_opacity)
        .width(style.width)
        .height(Height::Step(style.bar_step)))
}

/// Top-N countries by mean indicator value over the crops in the current
/// crop selection. The mean is rebuilt from per-crop sums and counts so the
/// ranking follows legend clicks like the yield bar does.
pub fn top_indicator_view(
    indicator_by_country_crop: &DataFrame,
    indicator_label: &str,
    style: &ChartStyle,
) -> Result<ViewSpec> {
    let title = format!("Mean {}", indicator_label);
    Ok(ViewSpec::new(TOP_INDICATOR_VIEW, Mark::Bar)
        .title(format!("Top {} Countries by {}", style.top_n, title))
        .mark_property("color", json!(style.bar_color))
        .data(
            indicator_by_country_crop,
            &[COUNTRY, ITEM, INDICATOR_SUM, INDICATOR_COUNT],
        )?
        .filtered_by(Predicate::CropClick)
        .transform(Transform::Aggregate {
            ops: vec![
                AggregateOp::new("sum", INDICATOR_SUM, INDICATOR_SUM),
                AggregateOp::new("sum", INDICATOR_COUNT, INDICATOR_COUNT),
            ],
            groupby: vec![COUNTRY.into()],
        })
        // countries without any indicator value are not ranked
        .transform(Transform::FilterExpr(format!("datum.{} > 0", INDICATOR_COUNT)))
        .transform(Transform::Calculate {
            expr: format!("datum.{} / datum.{}", INDICATOR_SUM, INDICATOR_COUNT),
            alias: MEAN_INDICATOR.into(),
        })
        .transform(Transform::Window {
            op: "row_number",
            alias: RANK.into(),
            sort: vec![
                (MEAN_INDICATOR.into(), Order::Descending),
                (COUNTRY.into(), Order::Ascending),
            ],
        })
        .transform(Transform::FilterExpr(format!(
            "datum.{} <= {}",
            RANK, style.top_n
        )))
        .encode(
            Channel::X,
            Encoding::new(MEAN_INDICATOR, FieldType::Quantitative).title(title.clone()),
        )
        .encode(
            Channel::Y,
            Encoding::new(COUNTRY, FieldType::Nominal)
                .title("Country")
                .sort(json!("-x")),
        )
        .tooltip(Encoding::new(COUNTRY, FieldType::Nominal).title("Country"))
        .tooltip(Encoding::new(MEAN_INDICATOR, FieldType::Quantitative).title(title))
        .emits(Predicate::CountryClick)
        .highlight_by(Predicate::CountryClick)
        .unselected_opacity(style.unselected_opacity)
        .width(style.width)
        .height(Height::Step(style.bar_step)))
}

/// Total yield per year, one line per crop. The crop legend is the input
/// of the crop-click selection.
pub fn yield_trend_view(filtered: &DataFrame, style: &ChartStyle) -> Result<ViewSpec> {
    Ok(ViewSpec::new(YIELD_TREND_VIEW, Mark::Line)
        .title("Crop Yield Over Time")
        .mark_property("point", json!(true))
        .data(filtered, &[COUNTRY, YEAR, ITEM, YIELD])?
        .filtered_by(Predicate::CountryClick)
        .encode(Channel::X, Encoding::new(YEAR, FieldType::Ordinal).title("Year"))
        .encode(
            Channel::Y,
            Encoding::new(YIELD, FieldType::Quantitative)
                .aggregate("sum")
                .title(TOTAL_YIELD_TITLE),
        )
        .encode(
            Channel::Color,
            Encoding::new(ITEM, FieldType::Nominal)
                .title("Crop")
                .legend(json!({ "title": "Crop", "orient": "top", "columns": 5 })),
        )
        .tooltip(Encoding::new(YEAR, FieldType::Ordinal).title("Year"))
        .tooltip(Encoding::new(ITEM, FieldType::Nominal).title("Crop"))
        .tooltip(
            Encoding::new(YIELD, FieldType::Quantitative)
                .aggregate("sum")
                .title(TOTAL_YIELD_TITLE),
        )
        .emits(Predicate::CropClick)
        .highlight_by(Predicate::CropClick)
        .unselected_opacity(style.unselected_opacity)
        .width(style.width)
        .height(Height::Fixed(style.height)))
}

/// Row-level yield against the chosen indicator.
pub fn indicator_scatter_view(
    filtered: &DataFrame,
    indicator: Indicator,
    indicator_label: &str,
    style: &ChartStyle,
) -> Result<ViewSpec> {
    let mut columns = vec![COUNTRY, YEAR, ITEM, YIELD, indicator.column()];
    if indicator.column() != FOOD_SUPPLY {
        columns.push(FOOD_SUPPLY);
    }
    Ok(ViewSpec::new(INDICATOR_SCATTER_VIEW, Mark::Circle)
        .title(format!("Yield vs. {}", indicator_label))
        .data(filtered, &columns)?
        .filtered_by(Predicate::CountryClick)
        .encode(
            Channel::X,
            Encoding::new(indicator.column(), FieldType::Quantitative).title(indicator_label),
        )
        .encode(
            Channel::Y,
            Encoding::new(YIELD, FieldType::Quantitative).title(YIELD_TITLE),
        )
        .encode(Channel::Color, Encoding::new(ITEM, FieldType::Nominal).no_legend())
        .tooltip(Encoding::new(COUNTRY, FieldType::Nominal).title("Country"))
        .tooltip(Encoding::new(indicator.column(), FieldType::Quantitative).title(indicator_label))
        .tooltip(Encoding::new(YIELD, FieldType::Quantitative).title(YIELD_TITLE))
        .tooltip(Encoding::new(ITEM, FieldType::Nominal).title("Crop"))
        .tooltip(Encoding::new(FOOD_SUPPLY, FieldType::Quantitative).title("Food Supply"))
        .emits(Predicate::CropClick)
        .highlight_by(Predicate::CropClick)
        .unselected_opacity(style.unselected_opacity)
        .width(style.width)
        .height(Height::Fixed(style.height)))
}

/// Per (country, year) totals against the mean indicator, colored by
/// climate zone.
pub fn climate_scatter_view(
    country_year: &DataFrame,
    indicator_label: &str,
    style: &ChartStyle,
) -> Result<ViewSpec> {
    let x_title = format!("Mean {}", indicator_label);
    Ok(ViewSpec::new(CLIMATE_SCATTER_VIEW, Mark::Circle)
        .title(format!("Total Yield vs. {} by Climate", x_title))
        .data(
            country_year,
            &[COUNTRY, YEAR, CLIMATE, TOTAL_YIELD, MEAN_INDICATOR],
        )?
        .filtered_by(Predicate::CountryClick)
        .encode(
            Channel::X,
            Encoding::new(MEAN_INDICATOR, FieldType::Quantitative).title(x_title.clone()),
        )
        .encode(
            Channel::Y,
            Encoding::new(TOTAL_YIELD, FieldType::Quantitative).title(TOTAL_YIELD_TITLE),
        )
        .encode(
            Channel::Color,
            Encoding::new(CLIMATE, FieldType::Nominal).title("Climate"),
        )
        .tooltip(Encoding::new(COUNTRY, FieldType::Nominal).title("Country"))
        .tooltip(Encoding::new(YEAR, FieldType::Ordinal).title("Year"))
        .tooltip(Encoding::new(CLIMATE, FieldType::Nominal).title("Climate"))
        .tooltip(Encoding::new(MEAN_INDICATOR, FieldType::Quantitative).title(x_title))
        .tooltip(Encoding::new(TOTAL_YIELD, FieldType::Quantitative).title(TOTAL_YIELD_TITLE))
        .width(style.width)
        .height(Height::Fixed(style.height)))
}

/// Distribution of the indicator per crop.
pub fn indicator_boxplot_view(
    filtered: &DataFrame,
    indicator: Indicator,
    indicator_label: &str,
    style: &ChartStyle,
) -> Result<ViewSpec> {
    Ok(ViewSpec::new(INDICATOR_BOXPLOT_VIEW, Mark::Boxplot)
        .title(format!("Box Plot: {} by Crop", indicator_label))
        .data(filtered, &[COUNTRY, ITEM, indicator.column()])?
        .encode(
            Channel::X,
            Encoding::new(ITEM, FieldType::Nominal)
                .title("Crop")
                .axis(json!({ "labelAngle": -45 })),
        )
        .encode(
            Channel::Y,
            Encoding::new(indicator.column(), FieldType::Quantitative).title(indicator_label),
        )
        .encode(
            Channel::Color,
            Encoding::new(ITEM, FieldType::Nominal).title("Crop").no_legend(),
        )
        .width(style.width)
        .height(Height::Fixed(style.height)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concat {
    #[default]
    Vertical,
    Horizontal,
}

impl Concat {
    fn key(self) -> &'static str {
        match self {
            Self::Vertical => "vconcat",
            Self::Horizontal => "hconcat",
        }
    }
}

/// Compose views into one layout with the shared selection params.
///
/// Each predicate emitted by at least one view becomes a top-level point
/// selection, seeded from `selection`. Color scales are resolved per view.
pub fn compose_layout(views: &[ViewSpec], concat: Concat, selection: &Selection) -> Result<Value> {
    let mut params = Vec::new();
    for predicate in Predicate::ALL {
        let emitters: Vec<&str> = views
            .iter()
            .filter(|v| v.emits.contains(&predicate))
            .map(|v| v.name.as_str())
            .collect();

        if emitters.is_empty() {
            if let Some(view) = views.iter().find(|v| v.referenced().any(|p| p == predicate)) {
                return Err(eyre!(
                    "View '{}' uses selection '{}' but no view emits it",
                    view.name,
                    predicate.param_name()
                ));
            }
            continue;
        }

        let mut param = Map::new();
        param.insert("name".into(), json!(predicate.param_name()));
        param.insert(
            "select".into(),
            json!({ "type": "point", "fields": [predicate.field()], "on": "click" }),
        );
        if predicate.legend_bound() {
            param.insert("bind".into(), json!("legend"));
        }
        if let Some(value) = selection.param_value(predicate) {
            param.insert("value".into(), value);
        }
        param.insert("views".into(), json!(emitters));
        params.push(Value::Object(param));
    }

    let mut layout = Map::new();
    layout.insert("$schema".into(), json!(SCHEMA_URL));
    if !params.is_empty() {
        layout.insert("params".into(), Value::Array(params));
    }
    layout.insert(
        concat.key().into(),
        Value::Array(views.iter().map(ViewSpec::to_json).collect()),
    );
    layout.insert(
        "resolve".into(),
        json!({ "scale": { "color": "independent" } }),
    );
    Ok(Value::Object(layout))
}

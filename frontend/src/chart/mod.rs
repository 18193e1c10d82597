//! Chart Spec Renderer
//!
//! Turns a [`VisualizationSpec`](shared::VisualizationSpec) attached to an
//! assistant answer into a render-ready view model. Drawing is left to the
//! view layer; everything it needs (labels, colors, grouping, domains,
//! formatted values) is computed here.

pub mod format;
mod render;

pub use render::{ChartRenderer, render};

use palette::Srgb;

pub const PRIMARY_COLOR: Srgb<u8> = Srgb::new(0x1d, 0x4e, 0xd8);
/// Second line series and anomalous scatter points.
pub const CONTRAST_COLOR: Srgb<u8> = Srgb::new(0xdc, 0x26, 0x26);

/// Lines beyond the second cycle through these.
pub const EXTRA_SERIES_COLORS: [Srgb<u8>; 4] = [
    Srgb::new(0x16, 0xa3, 0x4a),
    Srgb::new(0xd9, 0x77, 0x06),
    Srgb::new(0x7c, 0x3a, 0xed),
    Srgb::new(0x08, 0x91, 0xb2),
];

pub fn series_color(index: usize) -> Srgb<u8> {
    match index {
        0 => PRIMARY_COLOR,
        1 => CONTRAST_COLOR,
        n => EXTRA_SERIES_COLORS[(n - 2) % EXTRA_SERIES_COLORS.len()],
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Scatter,
    Line,
    Table,
    Unknown(String),
}

impl From<&str> for ChartType {
    fn from(raw: &str) -> Self {
        match raw {
            "bar" => ChartType::Bar,
            "scatter" => ChartType::Scatter,
            "line" => ChartType::Line,
            "table" => ChartType::Table,
            other => ChartType::Unknown(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedChart {
    pub title: String,
    pub body: ChartBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChartBody {
    Bar(BarChart),
    Scatter(ScatterChart),
    Line(LineChart),
    Table(TableView),
    /// Normal rendered state for chart kinds this client cannot draw.
    Unsupported { chart_type: String, notice: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    pub key: String,
    pub label: String,
}

impl Axis {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            label: format::axis_label(key),
        }
    }

    /// Scatter axes keep their underscores: `float_id` becomes `FLOAT_ID`.
    pub fn upper_cased(key: &str) -> Self {
        Self {
            key: key.to_string(),
            label: key.to_uppercase(),
        }
    }
}

// ===== BAR =====

#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub color: Srgb<u8>,
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub category: String,
    /// `None` draws no bar; the label still shows the raw cell.
    pub value: Option<f64>,
    pub label: String,
}

// ===== SCATTER =====

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointStyle {
    Normal,
    Anomaly,
}

impl PointStyle {
    pub fn color(self) -> Srgb<u8> {
        match self {
            PointStyle::Normal => PRIMARY_COLOR,
            PointStyle::Anomaly => CONTRAST_COLOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: Srgb<u8>,
}

pub fn anomaly_legend() -> [LegendEntry; 2] {
    [
        LegendEntry {
            label: "Normal values",
            color: PointStyle::Normal.color(),
        },
        LegendEntry {
            label: "Anomalies",
            color: PointStyle::Anomaly.color(),
        },
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterChart {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<ScatterSeries>,
    pub legend: [LegendEntry; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterPoint {
    pub category: String,
    pub value: Option<f64>,
    pub label: String,
    pub style: PointStyle,
}

// ===== LINE =====

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeDomain {
    pub min_ms: i64,
    pub max_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
    pub x_label: &'static str,
    pub y_axis: Axis,
    pub domain: TimeDomain,
    pub series: Vec<LineSeries>,
}

impl LineChart {
    pub fn tick_label(&self, timestamp_ms: i64) -> String {
        format::format_tick_date(timestamp_ms)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub color: Srgb<u8>,
    /// Sorted by time.
    pub points: Vec<LinePoint>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinePoint {
    pub time_ms: i64,
    pub value: Option<f64>,
    pub label: String,
    pub time_label: String,
}

// ===== TABLE =====

#[derive(Clone, Debug, PartialEq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    /// Present when rows were cut, e.g. `Showing first 50 of 60 rows`.
    pub notice: Option<String>,
}

use super::format::{self, category_text, format_cell, format_utc, numeric, parse_timestamp_ms};
use super::{
    Axis, Bar, BarChart, ChartBody, ChartType, LineChart, LinePoint, LineSeries, PointStyle,
    RenderedChart, ScatterChart, ScatterPoint, ScatterSeries, TableView, TimeDomain,
    anomaly_legend, series_color, PRIMARY_COLOR,
};
use indexmap::IndexMap;
use shared::{ChartParameters, ChartSection, DataRow, VisualizationSpec, is_truthy};

const DEFAULT_GROUP: &str = "default";

#[derive(Clone, Debug)]
pub struct ChartRenderer {
    decimals: usize,
    table_row_limit: usize,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(&ChartSection::default())
    }
}

/// Renders with the default chart settings.
pub fn render(spec: Option<&VisualizationSpec>) -> Option<RenderedChart> {
    ChartRenderer::default().render(spec)
}

impl ChartRenderer {
    pub fn new(config: &ChartSection) -> Self {
        Self {
            decimals: config.decimals,
            table_row_limit: config.table_row_limit,
        }
    }

    /// `None` for an absent spec, empty data, or a spec missing the axis
    /// keys its chart kind needs.
    pub fn render(&self, spec: Option<&VisualizationSpec>) -> Option<RenderedChart> {
        let spec = spec?;
        if spec.data.is_empty() {
            return None;
        }

        let parameters = &spec.parameters;
        let body = match ChartType::from(spec.chart_type.as_str()) {
            ChartType::Bar => ChartBody::Bar(self.bar(&spec.data, parameters)?),
            ChartType::Scatter => ChartBody::Scatter(self.scatter(&spec.data, parameters)?),
            ChartType::Line => ChartBody::Line(self.line(&spec.data, parameters)?),
            ChartType::Table => ChartBody::Table(self.table(&spec.data, parameters)),
            ChartType::Unknown(chart_type) => {
                log::warn!("Unsupported chart type '{chart_type}'");
                ChartBody::Unsupported {
                    notice: format!("Unsupported chart type: {chart_type}"),
                    chart_type,
                }
            }
        };

        Some(RenderedChart {
            title: spec.title.clone(),
            body,
        })
    }

    fn bar(&self, data: &[DataRow], parameters: &ChartParameters) -> Option<BarChart> {
        let (x_key, y_key) = required_axes("bar", parameters)?;
        let bars = data
            .iter()
            .map(|row| Bar {
                category: category_text(row.get(x_key)),
                value: numeric(row.get(y_key)),
                label: format_cell(row.get(y_key), self.decimals),
            })
            .collect();

        Some(BarChart {
            x_axis: Axis::new(x_key),
            y_axis: Axis::new(y_key),
            color: PRIMARY_COLOR,
            bars,
        })
    }

    fn scatter(&self, data: &[DataRow], parameters: &ChartParameters) -> Option<ScatterChart> {
        let (x_key, y_key) = required_axes("scatter", parameters)?;
        let color_by = parameters.color_by_enabled();

        let series = group_rows(data, &["parameter"])
            .into_iter()
            .map(|(name, rows)| {
                let group_anomalous = rows.first().is_some_and(|row| is_anomaly(row));
                let points = rows
                    .iter()
                    .map(|row| ScatterPoint {
                        category: category_text(row.get(x_key)),
                        value: numeric(row.get(y_key)),
                        label: format_cell(row.get(y_key), self.decimals),
                        style: if color_by && (group_anomalous || is_anomaly(row)) {
                            PointStyle::Anomaly
                        } else {
                            PointStyle::Normal
                        },
                    })
                    .collect();
                ScatterSeries { name, points }
            })
            .collect();

        Some(ScatterChart {
            x_axis: Axis::upper_cased(x_key),
            y_axis: Axis::upper_cased(y_key),
            series,
            legend: anomaly_legend(),
        })
    }

    fn line(&self, data: &[DataRow], parameters: &ChartParameters) -> Option<LineChart> {
        let Some(y_key) = parameters.y_axis.as_deref() else {
            log::warn!("line chart without y_axis, nothing to draw");
            return None;
        };

        let mut domain: Option<TimeDomain> = None;
        let series: Vec<LineSeries> = group_rows(data, &["region", "parameter"])
            .into_iter()
            .enumerate()
            .map(|(index, (name, rows))| {
                let mut points: Vec<LinePoint> = rows
                    .iter()
                    .filter_map(|row| {
                        let Some(time_ms) = row_timestamp(row) else {
                            log::debug!("line chart: dropping row without a readable date");
                            return None;
                        };
                        Some(LinePoint {
                            time_ms,
                            value: numeric(row.get(y_key)),
                            label: format_cell(row.get(y_key), self.decimals),
                            time_label: format_utc(time_ms),
                        })
                    })
                    .collect();
                points.sort_by_key(|point| point.time_ms);

                for point in &points {
                    domain = Some(match domain {
                        Some(TimeDomain { min_ms, max_ms }) => TimeDomain {
                            min_ms: min_ms.min(point.time_ms),
                            max_ms: max_ms.max(point.time_ms),
                        },
                        None => TimeDomain {
                            min_ms: point.time_ms,
                            max_ms: point.time_ms,
                        },
                    });
                }

                LineSeries {
                    name,
                    color: series_color(index),
                    points,
                }
            })
            .collect();

        let Some(domain) = domain else {
            log::warn!("line chart has no rows with a readable date");
            return None;
        };

        Some(LineChart {
            x_label: "Date",
            y_axis: Axis::new(y_key),
            domain,
            series,
        })
    }

    fn table(&self, data: &[DataRow], parameters: &ChartParameters) -> TableView {
        let columns: Vec<String> = match &parameters.columns {
            Some(columns) => columns.clone(),
            None => data
                .first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        };

        let rows = data
            .iter()
            .take(self.table_row_limit)
            .map(|row| {
                columns
                    .iter()
                    .map(|column| format_cell(row.get(column), self.decimals))
                    .collect()
            })
            .collect();

        let total_rows = data.len();
        TableView {
            headers: columns.iter().map(|column| format::axis_label(column)).collect(),
            columns,
            rows,
            total_rows,
            notice: (total_rows > self.table_row_limit).then(|| {
                format!(
                    "Showing first {} of {} rows",
                    self.table_row_limit, total_rows
                )
            }),
        }
    }
}

fn required_axes<'a>(chart: &str, parameters: &'a ChartParameters) -> Option<(&'a str, &'a str)> {
    match (parameters.x_axis.as_deref(), parameters.y_axis.as_deref()) {
        (Some(x_key), Some(y_key)) => Some((x_key, y_key)),
        _ => {
            log::warn!("{chart} chart needs both x_axis and y_axis, nothing to draw");
            None
        }
    }
}

fn is_anomaly(row: &DataRow) -> bool {
    row.get("is_anomaly").is_some_and(is_truthy)
}

/// Groups rows by the first truthy field among `keys`, in discovery order.
fn group_rows<'a>(data: &'a [DataRow], keys: &[&str]) -> IndexMap<String, Vec<&'a DataRow>> {
    let mut groups: IndexMap<String, Vec<&DataRow>> = IndexMap::new();
    for row in data {
        let name = keys
            .iter()
            .find_map(|key| row.get(*key).filter(|value| is_truthy(value)))
            .map_or_else(|| DEFAULT_GROUP.to_string(), |value| category_text(Some(value)));
        groups.entry(name).or_default().push(row);
    }
    groups
}

fn row_timestamp(row: &DataRow) -> Option<i64> {
    ["date", "profile_date"]
        .iter()
        .find_map(|key| row.get(*key).filter(|value| is_truthy(value)))
        .and_then(|value| value.as_str())
        .and_then(parse_timestamp_ms)
}

//! Profile chart inputs derived from a measurement series.

use shared::{Measurement, Parameter};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthPoint {
    pub pressure: f64,
    pub value: f64,
}

/// Parameters with at least one value in `measurements`, in catalog order.
pub fn available_parameters(measurements: &[Measurement]) -> Vec<Parameter> {
    Parameter::ALL
        .into_iter()
        .filter(|parameter| {
            measurements
                .iter()
                .any(|measurement| measurement.value(*parameter).is_some())
        })
        .collect()
}

/// Depth profile for `parameter`. Rows without a value are skipped, so a
/// parameter the float never measured yields an empty series.
pub fn profile_series(measurements: &[Measurement], parameter: Parameter) -> Vec<DepthPoint> {
    measurements
        .iter()
        .filter_map(|measurement| {
            measurement.value(parameter).map(|value| DepthPoint {
                pressure: measurement.pressure,
                value,
            })
        })
        .collect()
}

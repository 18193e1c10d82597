use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== IDENTIFIERS =====

/// Platform (float) identifier. The gateway sends either a WMO string or a
/// bare number, both are normalized to their string form.
pub type FloatId = String;

/// Measurement cycle (profile) identifier.
pub type ProfileId = i64;

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<FloatId, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "float id must be a string or a number, got {other}"
        ))),
    }
}

// ===== GATEWAY RECORD TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Last known position of a float, as listed on the map.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FloatLocation {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: FloatId,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "profile_date", alias = "last_report_date", default)]
    pub last_report_date: Option<String>,
    #[serde(default)]
    pub project_name: String,
}

impl FloatLocation {
    /// Both coordinates are present. Invalid records never reach the map.
    pub fn is_valid(&self) -> bool {
        self.position().is_some()
    }

    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FloatSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: FloatId,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub wmo_inst_type: String,
    #[serde(default)]
    pub sensors_list: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub cycle_number: i64,
    pub profile_date: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One depth sample of a profile. Every scientific value may be absent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    pub pressure: f64,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub psal: Option<f64>,
    #[serde(default)]
    pub doxy: Option<f64>,
    #[serde(default)]
    pub chla: Option<f64>,
    #[serde(default)]
    pub nitrate: Option<f64>,
    #[serde(default)]
    pub bbp700: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl Measurement {
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temp => self.temp,
            Parameter::Psal => self.psal,
            Parameter::Doxy => self.doxy,
            Parameter::Chla => self.chla,
            Parameter::Nitrate => self.nitrate,
            Parameter::Bbp700 => self.bbp700,
            Parameter::Ph => self.ph,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub profile_date: Option<String>,
}

impl TrajectoryPoint {
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

// ===== PARAMETERS =====

/// Scientific quantity selectable for charting.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    #[default]
    Temp,
    Psal,
    Doxy,
    Chla,
    Nitrate,
    Bbp700,
    Ph,
}

impl Parameter {
    /// Catalog order, used wherever parameters are listed.
    pub const ALL: [Parameter; 7] = [
        Parameter::Temp,
        Parameter::Psal,
        Parameter::Doxy,
        Parameter::Chla,
        Parameter::Nitrate,
        Parameter::Bbp700,
        Parameter::Ph,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Temp => "temp",
            Parameter::Psal => "psal",
            Parameter::Doxy => "doxy",
            Parameter::Chla => "chla",
            Parameter::Nitrate => "nitrate",
            Parameter::Bbp700 => "bbp700",
            Parameter::Ph => "ph",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Parameter::Temp => "Temperature",
            Parameter::Psal => "Salinity",
            Parameter::Doxy => "Oxygen",
            Parameter::Chla => "Chlorophyll-a",
            Parameter::Nitrate => "Nitrate",
            Parameter::Bbp700 => "Backscatter 700nm",
            Parameter::Ph => "pH",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temp => "°C",
            Parameter::Psal => "PSU",
            Parameter::Doxy | Parameter::Nitrate => "μmol/kg",
            Parameter::Chla => "mg/m³",
            Parameter::Bbp700 => "m⁻¹",
            Parameter::Ph => "",
        }
    }

    /// Axis caption, e.g. `Temperature (°C)`.
    pub fn axis_label(&self) -> String {
        format!("{} ({})", self.display_name(), self.unit())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parameter '{0}'")]
pub struct UnknownParameter(pub String);

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|parameter| parameter.key() == key)
            .ok_or_else(|| UnknownParameter(key.to_string()))
    }
}

// ===== CHAT =====

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<VisualizationSpec>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            visualization: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            visualization: None,
        }
    }
}

/// Body posted to the answering backend: the whole ordered history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub history: Vec<ChatMessage>,
}

// ===== VISUALIZATION =====

/// Heterogeneous tabular row as produced by the answering backend.
pub type DataRow = serde_json::Map<String, serde_json::Value>;

/// Declarative chart description attached to an assistant answer. The
/// `chart_type` stays a raw string so unknown kinds survive decoding.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VisualizationSpec {
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Vec<DataRow>,
    #[serde(default)]
    pub parameters: ChartParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChartParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_by: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl ChartParameters {
    pub fn color_by_enabled(&self) -> bool {
        self.color_by.as_ref().is_some_and(is_truthy)
    }
}

/// Loose truthiness used for backend-provided flags: `null`, `false`, `0`,
/// `""` are false, everything else is true.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        serde_json::Value::String(text) => !text.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

// ===== CONFIG TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub map: MapSection,
    pub fetch: FetchSection,
    pub chart: ChartSection,
    pub chat: ChatSection,
    pub selection: SelectionSection,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported config version '{0}'")]
    UnsupportedVersion(String),
}

impl AppConfig {
    /// Parse a TOML config. Older known versions are upgraded in place;
    /// unknown versions are reported so the caller can fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(text)?;
        match config.app.migration_strategy() {
            MigrationStrategy::None => Ok(config),
            MigrationStrategy::Upgrade(_) => {
                config.app.version = AppSection::CURRENT_VERSION.to_string();
                Ok(config)
            }
            MigrationStrategy::Recreate => Err(ConfigError::UnsupportedVersion(config.app.version)),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// Versioning metadata used to decide how a stored config is migrated
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn migration_strategy(&self) -> MigrationStrategy {
        match self.version.as_str() {
            AppSection::CURRENT_VERSION => MigrationStrategy::None,
            "0.9.0" => MigrationStrategy::Upgrade("0.9.0 -> 1.0.0".to_string()),
            _ => MigrationStrategy::Recreate,
        }
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStrategy {
    None,
    Upgrade(String),
    Recreate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapSection {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub initial_zoom: u8,
    pub fly_to_zoom: u8,
    pub active_only: bool,
}

impl Default for MapSection {
    fn default() -> Self {
        // Indian Ocean
        Self {
            center_latitude: 20.0,
            center_longitude: 77.0,
            initial_zoom: 4,
            fly_to_zoom: 6,
            active_only: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FetchSection {
    /// Zero disables the timeout.
    pub request_timeout_ms: u64,
    pub profiles_with_data_only: bool,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            profiles_with_data_only: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChartSection {
    pub table_row_limit: usize,
    pub decimals: usize,
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            table_row_limit: 50,
            decimals: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatSection {
    pub allow_concurrent: bool,
    pub failure_message: String,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            allow_concurrent: false,
            failure_message: "Sorry, I couldn't get an answer.".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SelectionSection {
    pub default_parameter: Parameter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_ids_accept_numbers() {
        let location: FloatLocation = serde_json::from_str(
            r#"{"id": 2902746, "latitude": 12.5, "longitude": null, "profile_date": "2023-04-01", "project_name": "ARGO"}"#,
        )
        .unwrap();
        assert_eq!(location.id, "2902746");
        assert_eq!(location.last_report_date.as_deref(), Some("2023-04-01"));
        assert!(!location.is_valid());
    }

    #[test]
    fn parameter_keys_round_trip_through_from_str() {
        for parameter in Parameter::ALL {
            assert_eq!(parameter.key().parse::<Parameter>(), Ok(parameter));
        }
        assert_eq!(
            "salinity".parse::<Parameter>(),
            Err(UnknownParameter("salinity".to_string()))
        );
        assert_eq!(Parameter::Psal.axis_label(), "Salinity (PSU)");
    }

    #[test]
    fn chat_roles_use_backend_names() {
        let reply: ChatMessage =
            serde_json::from_str(r#"{"role": "ai", "content": "hello"}"#).unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.visualization.is_none());

        let encoded = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(encoded, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn visualization_keeps_unknown_chart_types() {
        let spec: VisualizationSpec = serde_json::from_value(serde_json::json!({
            "chart_type": "heatmap",
            "title": "Heat",
            "data": [{"a": 1}],
            "parameters": {"x_axis": "a", "color_by": "is_anomaly"}
        }))
        .unwrap();
        assert_eq!(spec.chart_type, "heatmap");
        assert_eq!(spec.parameters.x_axis.as_deref(), Some("a"));
        assert!(spec.parameters.color_by_enabled());
        assert!(spec.parameters.columns.is_none());
    }

    #[test]
    fn truthiness_matches_backend_flags() {
        assert!(!is_truthy(&serde_json::json!(null)));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(is_truthy(&serde_json::json!(1)));
        assert!(is_truthy(&serde_json::json!("yes")));
    }

    #[test]
    fn config_defaults_and_partial_files() {
        let config = AppConfig::from_toml_str("[map]\nactive_only = false\n").unwrap();
        assert!(!config.map.active_only);
        assert_eq!(config.map.fly_to_zoom, 6);
        assert_eq!(config.chart.table_row_limit, 50);
        assert_eq!(config.selection.default_parameter, Parameter::Temp);

        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn config_versions_are_migrated_or_rejected() {
        let upgraded = AppConfig::from_toml_str("[app]\nversion = \"0.9.0\"\n").unwrap();
        assert_eq!(upgraded.app.version, AppSection::CURRENT_VERSION);

        let error = AppConfig::from_toml_str("[app]\nversion = \"7.0.0\"\n").unwrap_err();
        assert!(matches!(error, ConfigError::UnsupportedVersion(version) if version == "7.0.0"));
    }
}

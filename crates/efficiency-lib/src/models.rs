//! Core data models shared by the pipeline, trainer and prediction service

use serde::{Deserialize, Serialize};

/// Number of model input features
pub const NUM_FEATURES: usize = 14;

/// Feature names in model input order.
///
/// Artifacts are written against this exact list; any change needs a full
/// pipeline and training run before serving.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Operation_Mode",
    "Temperature_C",
    "Vibration_Hz",
    "Power_Consumption_kW",
    "Network_Latency_ms",
    "Packet_Loss_%",
    "Quality_Control_Defect_Rate_%",
    "Production_Speed_units_per_hr",
    "Predictive_Maintenance_Score",
    "Error_Rate_%",
    "Year",
    "Month",
    "Day",
    "Hour",
];

/// The only categorical input feature
pub const OPERATION_MODE: &str = "Operation_Mode";

/// Position of [`OPERATION_MODE`] in [`FEATURE_NAMES`]
pub const OPERATION_MODE_INDEX: usize = 0;

/// Label rendered for class ids outside the fixed label table
pub const INVALID_PREDICTION: &str = "Invalid prediction";

/// One telemetry sample as it appears in the raw CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Machine_ID")]
    pub machine_id: String,
    #[serde(rename = "Operation_Mode")]
    pub operation_mode: String,
    #[serde(rename = "Temperature_C")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "Vibration_Hz")]
    pub vibration_hz: Option<f64>,
    #[serde(rename = "Power_Consumption_kW")]
    pub power_consumption_kw: Option<f64>,
    #[serde(rename = "Network_Latency_ms")]
    pub network_latency_ms: Option<f64>,
    #[serde(rename = "Packet_Loss_%")]
    pub packet_loss_pct: Option<f64>,
    #[serde(rename = "Quality_Control_Defect_Rate_%")]
    pub defect_rate_pct: Option<f64>,
    #[serde(rename = "Production_Speed_units_per_hr")]
    pub production_speed: Option<f64>,
    #[serde(rename = "Predictive_Maintenance_Score")]
    pub maintenance_score: Option<f64>,
    #[serde(rename = "Error_Rate_%")]
    pub error_rate_pct: Option<f64>,
    #[serde(rename = "Efficiency_Status")]
    pub efficiency_status: String,
}

impl RawRecord {
    /// Sensor readings paired with their feature names, in feature order
    pub fn sensor_values(&self) -> [(&'static str, Option<f64>); 9] {
        [
            (FEATURE_NAMES[1], self.temperature_c),
            (FEATURE_NAMES[2], self.vibration_hz),
            (FEATURE_NAMES[3], self.power_consumption_kw),
            (FEATURE_NAMES[4], self.network_latency_ms),
            (FEATURE_NAMES[5], self.packet_loss_pct),
            (FEATURE_NAMES[6], self.defect_rate_pct),
            (FEATURE_NAMES[7], self.production_speed),
            (FEATURE_NAMES[8], self.maintenance_score),
            (FEATURE_NAMES[9], self.error_rate_pct),
        ]
    }
}

/// Ordered efficiency target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EfficiencyLabel {
    Low,
    Medium,
    High,
}

impl EfficiencyLabel {
    pub const ALL: [EfficiencyLabel; 3] = [
        EfficiencyLabel::Low,
        EfficiencyLabel::Medium,
        EfficiencyLabel::High,
    ];

    /// Ordinal code: Low=0, Medium=1, High=2
    pub fn code(self) -> usize {
        match self {
            EfficiencyLabel::Low => 0,
            EfficiencyLabel::Medium => 1,
            EfficiencyLabel::High => 2,
        }
    }

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Low" => Some(EfficiencyLabel::Low),
            "Medium" => Some(EfficiencyLabel::Medium),
            "High" => Some(EfficiencyLabel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EfficiencyLabel::Low => "Low",
            EfficiencyLabel::Medium => "Medium",
            EfficiencyLabel::High => "High",
        }
    }
}

impl std::fmt::Display for EfficiencyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a classifier output id to its label, or the invalid-prediction sentinel
pub fn label_for_class(class_id: i64) -> &'static str {
    usize::try_from(class_id)
        .ok()
        .and_then(EfficiencyLabel::from_code)
        .map(EfficiencyLabel::as_str)
        .unwrap_or(INVALID_PREDICTION)
}

/// Numeric feature row in [`FEATURE_NAMES`] order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; NUM_FEATURES]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; NUM_FEATURES] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }
}

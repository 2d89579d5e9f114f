use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

/// Upper bound (inclusive) of each EPA band.
const AQI_BANDS: [(u32, AqiCategory); 5] = [
    (50, AqiCategory::Good),
    (100, AqiCategory::Moderate),
    (150, AqiCategory::UnhealthyForSensitiveGroups),
    (200, AqiCategory::Unhealthy),
    (300, AqiCategory::VeryUnhealthy),
];

impl AqiCategory {
    pub fn from_aqi(aqi: u32) -> Self {
        AQI_BANDS
            .iter()
            .find(|(upper, _)| aqi <= *upper)
            .map(|(_, category)| *category)
            .unwrap_or(AqiCategory::Hazardous)
    }

    /// AirNow category numbers, 1 (Good) through 6 (Hazardous).
    pub fn from_number(number: u32) -> Self {
        match number {
            1 => AqiCategory::Good,
            2 => AqiCategory::Moderate,
            3 => AqiCategory::UnhealthyForSensitiveGroups,
            4 => AqiCategory::Unhealthy,
            5 => AqiCategory::VeryUnhealthy,
            6 => AqiCategory::Hazardous,
            _ => AqiCategory::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
            AqiCategory::Unknown => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AqiCategory::Good => "🟢",
            AqiCategory::Moderate => "🟡",
            AqiCategory::UnhealthyForSensitiveGroups => "🟠",
            AqiCategory::Unhealthy => "🔴",
            AqiCategory::VeryUnhealthy => "🟣",
            AqiCategory::Hazardous => "🟤",
            AqiCategory::Unknown => "⚪",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AqiReading {
    pub parameter: String,
    pub aqi: Option<u32>,
    pub category: AqiCategory,
    pub reporting_area: Option<String>,
    /// Observation hour or forecast date, as reported.
    pub date_label: String,
    pub discussion: Option<String>,
    pub action_day: bool,
}

/// Band from the numeric index when one is given (AirNow sends `-1` for
/// "none"), otherwise from the provider's category number.
pub fn categorize(aqi: i64, category_number: Option<u32>) -> (Option<u32>, AqiCategory) {
    match u32::try_from(aqi) {
        Ok(value) => (Some(value), AqiCategory::from_aqi(value)),
        Err(_) => (None, category_number.map(AqiCategory::from_number).unwrap_or(AqiCategory::Unknown)),
    }
}

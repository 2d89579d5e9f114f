//! Alert ranking by severity, urgency and certainty.

use crate::model::{Alert, Certainty, Severity, Urgency};

const SEVERITY_WEIGHTS: [(Severity, u8); 5] = [
    (Severity::Extreme, 4),
    (Severity::Severe, 3),
    (Severity::Moderate, 2),
    (Severity::Minor, 1),
    (Severity::Unknown, 0),
];

const URGENCY_WEIGHTS: [(Urgency, u8); 4] = [
    (Urgency::Immediate, 3),
    (Urgency::Expected, 2),
    (Urgency::Future, 1),
    (Urgency::Unknown, 0),
];

const CERTAINTY_WEIGHTS: [(Certainty, u8); 4] = [
    (Certainty::Observed, 3),
    (Certainty::Likely, 2),
    (Certainty::Possible, 1),
    (Certainty::Unknown, 0),
];

fn weight<T: PartialEq>(table: &[(T, u8)], key: &T) -> u8 {
    table.iter().find(|(k, _)| k == key).map(|(_, w)| *w).unwrap_or(0)
}

impl Alert {
    pub fn priority(&self) -> u8 {
        weight(&SEVERITY_WEIGHTS, &self.severity)
            + weight(&URGENCY_WEIGHTS, &self.urgency)
            + weight(&CERTAINTY_WEIGHTS, &self.certainty)
    }

    /// First sentence of the instruction text, if any.
    pub fn bottom_line(&self) -> Option<String> {
        let instruction = self.instruction.as_deref()?.trim();
        if instruction.is_empty() {
            return None;
        }
        let flat = instruction.split_whitespace().collect::<Vec<_>>().join(" ");
        match flat.find('.') {
            Some(idx) => Some(flat[..=idx].to_string()),
            None => Some(flat.chars().take(100).collect()),
        }
    }
}

/// Highest priority first. Equal scores keep provider order.
pub fn rank(mut alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.sort_by_key(|alert| std::cmp::Reverse(alert.priority()));
    alerts
}

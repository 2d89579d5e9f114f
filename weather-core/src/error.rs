use thiserror::Error;

/// Failures of a whole resolution, plus the soft per-provider failure that
/// is folded into the fact set instead of being returned.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Could not locate: {query}")]
    LocationNotFound { query: String },

    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable { provider: &'static str, reason: String },

    #[error("Unable to fetch weather for: {query}")]
    NoWeatherDataAvailable { query: String },
}

impl ResolveError {
    pub fn provider(provider: &'static str, err: &anyhow::Error) -> Self {
        Self::ProviderUnavailable { provider, reason: format!("{err:#}") }
    }

    /// Only the soft variant lets the pipeline continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ResolveError::ProviderUnavailable { .. })
    }

    pub fn reason(&self) -> String {
        match self {
            ResolveError::ProviderUnavailable { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

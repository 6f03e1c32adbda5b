use thiserror::Error;

#[derive(Debug, Error)]
pub enum TravelError {
    #[error("Google API key not found. Set GOOGLE_API_KEY in the environment or .env file")]
    ConfigMissing,
    #[error("Invalid trip request: {0}")]
    InvalidTrip(String),
    #[error("Could not resolve airports for '{location}': {reason}")]
    ResolutionFailure { location: String, reason: String },
    #[error("Flight search failed: {0}")]
    QueryFailure(QueryFailure),
    #[error("Error generating plan: {0}")]
    GenerationFailure(String),
}

/// Why a flight search produced no usable result
#[derive(Debug, Error)]
pub enum QueryFailure {
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl QueryFailure {
    /// HTTP status of the failed call, 0 when the upstream never answered
    pub fn status(&self) -> u16 {
        match self {
            QueryFailure::Status { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QueryFailure::Status { .. } => "Status",
            QueryFailure::Transport(_) => "Transport",
            QueryFailure::Malformed(_) => "Malformed",
        }
    }
}

impl From<QueryFailure> for TravelError {
    fn from(failure: QueryFailure) -> Self {
        TravelError::QueryFailure(failure)
    }
}

impl TravelError {
    pub fn resolution(location: &str, reason: impl Into<String>) -> Self {
        TravelError::ResolutionFailure {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    /// Short label used as a metric attribute
    pub fn kind(&self) -> &'static str {
        match self {
            TravelError::ConfigMissing => "ConfigMissing",
            TravelError::InvalidTrip(_) => "InvalidTrip",
            TravelError::ResolutionFailure { .. } => "ResolutionFailure",
            TravelError::QueryFailure(_) => "QueryFailure",
            TravelError::GenerationFailure(_) => "GenerationFailure",
        }
    }
}

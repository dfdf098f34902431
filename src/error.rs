use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("insufficient data for {team}: {reason}")]
    InsufficientData { team: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ForecastError {
    pub fn insufficient(team: &str, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            team: team.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

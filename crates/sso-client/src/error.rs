use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Raised before any navigation happens.
    #[error("Redirect URI is not on this application's origin: {0}")]
    InvalidRedirectUri(String),

    #[error("SSO error: {0}")]
    Sso(String),

    #[error("Callback URL carries no authorization code")]
    MissingCode,

    #[error("No session")]
    NotAuthenticated,

    #[error("Auth server answered {status}: {error}: {message}")]
    Server {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

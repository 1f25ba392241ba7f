use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend url must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status} for {path}")]
    Status { path: &'static str, status: u16 },
    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed payload from {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("robot address is empty")]
    MissingAddress,
    #[error("invalid robot address '{0}'")]
    InvalidAddress(String),
    #[error("robot refused: {0}")]
    Refused(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

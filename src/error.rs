use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("insights API returned HTTP {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address `{address}`: {reason}")]
    Address { address: String, reason: String },

    #[error("no recipients configured")]
    NoRecipients,

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp error: {0}")]
    Smtp(String),
}

use thiserror::Error;

/// Errors raised while parsing VAST documents or resolving their creatives
#[derive(Error, Debug)]
pub enum VastError {
    #[error("Failed to parse XML: {0}")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid VAST version: {0}")]
    InvalidVersion(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid settings: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Inconsistent resource: {kind} cannot carry creative type {creative_type}")]
    InconsistentResource { kind: String, creative_type: String },

    #[error("No such method: {0}")]
    NoSuchMethod(String),

    #[error("No overload of {method} accepts ({params})")]
    ParameterMismatch { method: String, params: String },

    #[error("Instance method {0} called without an instance")]
    NullTarget(String),

    #[error("Method {0} is not accessible")]
    InaccessibleMethod(String),

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Cannot cast {class} to {target}")]
    ClassCast { class: String, target: String },

    #[error("Unknown error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VastError>;

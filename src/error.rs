use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoamError>;

#[derive(Error, Debug)]
pub enum RoamError {
    #[error("Failed to execute {program}: {source}")]
    CommandExecution {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan on '{interface}' failed: {message}")]
    ScanFailed { interface: String, message: String },

    #[error("No visible cell advertises '{0}'")]
    NoMatchingCell(String),

    #[error("Network '{0}' is encrypted and no passkey was given")]
    MissingPasskey(String),

    #[error("Invalid passkey: {0}")]
    InvalidPasskey(String),

    #[error("Scheme name '{0}' cannot be stored in an interfaces file")]
    InvalidSchemeName(String),

    #[error("Scheme '{0}' already exists")]
    SchemeExists(String),

    #[error("Scheme store '{path}': {source}")]
    SchemeStore {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("wpa_passphrase failed: {0}")]
    PassphraseFailed(String),

    #[error("No scheme to connect to")]
    NoScheme,

    #[error("Connection to '{scheme}' failed: {message}")]
    ConnectionFailed { scheme: String, message: String },
}

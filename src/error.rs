#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Please create a yaml config file in {}", .0.display())]
    ConfigMissing(std::path::PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    ConfigParseError {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Role profile {role:?} refers to unknown account {account:?}")]
    UnresolvedAccountReference { role: String, account: String },

    #[error("Failed to obtain credentials for {name:?}: {source}")]
    CredentialRequestFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to write {}: {source}", path.display())]
    FileWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No AWS credentials available ({0})")]
    CredentialsNotFound(String),

    #[error(transparent)]
    StdIoError(#[from] std::io::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    InvalidHeaderNameError(#[from] reqwest::header::InvalidHeaderName),

    #[error(transparent)]
    InvalidHeaderValueError(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    HttpError(#[from] http::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("API Error ({0}): {1}")]
    ApiError(reqwest::StatusCode, String),
}

impl Error {
    /// Wrap an STS boundary failure with the account or role it was issued for.
    pub fn credential_request_failed(name: &str, source: Error) -> Self {
        Self::CredentialRequestFailed {
            name: name.to_owned(),
            source: Box::new(source),
        }
    }

    pub fn file_write_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.to_owned(),
            source,
        }
    }
}

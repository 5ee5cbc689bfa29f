use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Release resolution failed: {0}")]
    Resolution(String),

    #[error("Could not determine data directory\n\n\
             Hint: relpm keeps its registry, packages and links under a per-user\n\
             data directory. Set RELPM_HOME to choose one explicitly, e.g.\n\
               export RELPM_HOME=\"$HOME/.relpm\"")]
    NoDataDir,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Request error")]
    RequestError(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    StatusError {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Invalid search url: {0}")]
    UrlError(String),
    #[error("Invalid year range {oldest}..={newest}")]
    YearRangeError { oldest: u16, newest: u16 },
    #[error("Snapshot serialization error")]
    SerializeError(#[from] serde_json::Error),
    #[error("Snapshot write error")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Invalid price {label:?} for {link}")]
    InvalidPrice { link: String, label: String },
    #[error("Invalid publish date {raw:?} for {link}")]
    InvalidDate { link: String, raw: String },
}

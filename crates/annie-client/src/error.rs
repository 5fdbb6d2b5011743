use thiserror::Error;

/// Errors returned by the App Annie API client.
#[derive(Debug, Error)]
pub enum AnnieError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status and the body did not carry the
    /// expected payload.
    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    /// Missing API key or base URL. Raised before any request is sent.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An identifying field is absent from an API record.
    #[error("schema drift: {record} record is missing '{field}'")]
    SchemaDrift { record: String, field: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

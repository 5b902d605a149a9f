use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// A required option is missing or an option value cannot be used.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The vectors handed to the combination step cannot be combined.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The endpoint rejected the request with a 4xx status.
    #[error("Client request error ({status}) from endpoint {endpoint}: {body}")]
    ClientRequest {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The endpoint answered with any other non-success status.
    #[error("Unsuccessful status code {status} from endpoint {endpoint}")]
    Service { endpoint: String, status: u16 },

    /// The response payload could not be read as an embedding response.
    #[error("Malformed response: {0}")]
    Resource(String),

    /// The request never produced a response (connection, DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    /// True for errors carrying a non-success HTTP status from the endpoint.
    pub fn is_remote_call(&self) -> bool {
        matches!(self, Self::ClientRequest { .. } | Self::Service { .. })
    }
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

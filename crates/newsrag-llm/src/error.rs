use thiserror::Error;

/// Errors returned by the chat completions client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("chat API returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The completion carried no choices.
    #[error("chat API returned no choices for model {model}")]
    EmptyCompletion { model: String },

    #[error("invalid chat client configuration: {0}")]
    InvalidConfig(String),
}

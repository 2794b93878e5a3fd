use thiserror::Error;

/// Errors from the text-generation client.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation API key is not configured")]
    MissingApiKey,

    #[error("unexpected HTTP status {status} from generation API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no response generated")]
    EmptyCompletion,

    /// Every attempt failed; carries the last error seen.
    #[error("failed after {retries} retries: {last}")]
    Exhausted {
        retries: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

/// Errors from analysing one review batch.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot analyze empty review batch")]
    EmptyBatch,

    #[error("failed to generate analysis: {0}")]
    Generation(#[from] GenerationError),

    #[error("failed to extract valid JSON from response: {preview}")]
    NoJsonObject { preview: String },

    #[error("failed to parse analysis response: {0}")]
    Decode(#[source] serde_json::Error),

    /// A required section came back empty.
    #[error("analysis result missing {0}")]
    MissingField(&'static str),
}

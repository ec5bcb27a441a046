/// Failure of a single gateway round trip.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The model answered, but not with JSON of the requested shape.
    #[error("structured response did not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),
}

impl GatewayError {
    /// Whether repeating the same request could succeed.
    ///
    /// Schema violations are permanent: the same prompt is expected to
    /// produce the same malformed shape.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey | Self::Schema(_) => false,
        }
    }
}

use thiserror::Error;

/// Errors that can occur when using the llm-relay library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    #[error("{provider} unavailable (HTTP {status}): {message}")]
    Unavailable {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Unrecognized model name: {0}")]
    UnsupportedModel(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// How the dispatch loop should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying after a pause: rate limits, provider outages,
    /// transport-level trouble.
    Transient,
    /// Retrying cannot help: malformed input, broken response bodies,
    /// misconfiguration.
    Fatal,
    /// No provider is registered for the requested model.
    Unsupported,
}

impl Error {
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Error::InvalidContent(message.into())
    }

    pub fn empty_response(provider: impl Into<String>) -> Self {
        Error::EmptyResponse(provider.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Map a provider HTTP status and extracted message onto the taxonomy.
    pub fn from_status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        match status {
            429 => Error::RateLimited { provider, message },
            500..=599 => Error::Unavailable {
                provider,
                status,
                message,
            },
            _ => Error::Api {
                provider,
                status,
                message,
            },
        }
    }

    /// Classify this error for the retry loop. Every provider error a
    /// request can surface lands in exactly one class.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::RateLimited { .. } | Error::Unavailable { .. } | Error::Api { .. } => {
                ErrorClass::Transient
            }
            // Connection resets and timeouts are transient; a body we could
            // not decode is not going to decode better next time.
            Error::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                ErrorClass::Transient
            }
            Error::UnsupportedModel(_) => ErrorClass::Unsupported,
            _ => ErrorClass::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_429_maps_to_rate_limited() {
        let err = Error::from_status("gemini", 429, "quota exceeded");
        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn test_status_5xx_maps_to_unavailable() {
        for status in [500, 502, 503, 529] {
            let err = Error::from_status("anthropic", status, "overloaded");
            assert!(matches!(err, Error::Unavailable { .. }), "status {status}");
            assert_eq!(err.class(), ErrorClass::Transient);
        }
    }

    #[test]
    fn test_other_statuses_map_to_api_error() {
        let err = Error::from_status("gemini", 400, "invalid argument");
        assert!(matches!(err, Error::Api { status: 400, .. }));
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn test_content_and_config_errors_are_fatal() {
        assert_eq!(
            Error::invalid_content("bad data URI").class(),
            ErrorClass::Fatal
        );
        assert_eq!(Error::config("missing key").class(), ErrorClass::Fatal);
        assert_eq!(Error::empty_response("gemini").class(), ErrorClass::Fatal);
    }

    #[test]
    fn test_unsupported_model_has_its_own_class() {
        let err = Error::UnsupportedModel("gpt-4o".to_string());
        assert_eq!(err.class(), ErrorClass::Unsupported);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_serde_errors_are_fatal() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.class(), ErrorClass::Fatal);
    }
}

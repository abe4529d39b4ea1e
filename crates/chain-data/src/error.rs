use thiserror::Error;

/// Chain data gateway errors.
///
/// Read operations never surface these to callers (they degrade to cache or
/// defaults); broadcast and status lookups do.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway configuration: {0}")]
    Config(String),

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("all {attempted} providers failed for {endpoint}: {last_error}")]
    ProvidersExhausted {
        endpoint: String,
        attempted: usize,
        last_error: String,
    },

    #[error("invalid raw transaction: {0}")]
    InvalidTransaction(String),

    /// The provider answered with a non-2xx status; `message` is its body verbatim.
    #[error("broadcast rejected: {message}")]
    BroadcastRejected { status: u16, message: String },

    /// The request may have reached the provider; acceptance is unknown.
    #[error("broadcast outcome unknown: {0}")]
    BroadcastUnknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_status() {
        let err = GatewayError::Status {
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 503: overloaded");
    }

    #[test]
    fn broadcast_rejection_keeps_provider_message() {
        let message = "sendrawtransaction RPC error: {\"code\":-26,\"message\":\"dust\"}";
        let err = GatewayError::BroadcastRejected {
            status: 400,
            message: message.into(),
        };
        assert!(err.to_string().ends_with(message));
    }

    #[test]
    fn display_providers_exhausted() {
        let err = GatewayError::ProvidersExhausted {
            endpoint: "/fee-estimates".into(),
            attempted: 2,
            last_error: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "all 2 providers failed for /fee-estimates: timeout"
        );
    }
}

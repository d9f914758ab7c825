//! Typed error hierarchy for webhook processing.
//!
//! Every failure a delivery can hit falls into one of three kinds:
//! - `Authentication`: the signature did not check out
//! - `Validation`: the request itself is unusable
//! - `Persistence`: the store failed underneath us

use thiserror::Error;

use crate::webhook::signature::SignatureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Validation,
    Persistence,
}

/// Errors from handling a single webhook delivery.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing github header {0}")]
    MissingHeader(&'static str),

    #[error("could not read body: {0}")]
    UnreadableBody(String),

    #[error("{0}")]
    Signature(#[from] SignatureError),

    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to log event: {0}")]
    DeliveryLog(#[source] anyhow::Error),

    #[error("failed to update tasks after {committed} changes: {source}")]
    Transition {
        committed: i64,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Signature(e) if !e.is_malformed() => ErrorKind::Authentication,
            Self::MissingHeader(_)
            | Self::UnreadableBody(_)
            | Self::Signature(_)
            | Self::InvalidPayload { .. } => ErrorKind::Validation,
            Self::DeliveryLog(_) | Self::Transition { .. } => ErrorKind::Persistence,
        }
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader(_) => "bad_request",
            Self::UnreadableBody(_) => "bad_body",
            Self::Signature(e) if e.is_malformed() => "bad_signature_header",
            Self::Signature(_) => "bad_signature",
            Self::InvalidPayload { event, .. } if event == "push" => "push_parse",
            Self::InvalidPayload { .. } => "pr_parse",
            Self::DeliveryLog(_) => "db_event_log",
            Self::Transition { .. } => "db_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn missing_header_is_validation() {
        let err = SyncError::MissingHeader("X-GitHub-Event");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "bad_request");
        assert!(err.to_string().contains("X-GitHub-Event"));
    }

    #[test]
    fn signature_mismatch_is_authentication() {
        let err = SyncError::from(SignatureError::Mismatch);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.code(), "bad_signature");
    }

    #[test]
    fn missing_signature_is_authentication() {
        let err = SyncError::from(SignatureError::Missing);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.code(), "bad_signature");
    }

    #[test]
    fn empty_secret_is_authentication() {
        let err = SyncError::from(SignatureError::EmptySecret);
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn malformed_signature_header_is_validation() {
        let err = SyncError::from(SignatureError::MalformedHeader);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "bad_signature_header");

        let err = SyncError::from(SignatureError::UnsupportedAlgorithm("sha1".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn payload_codes_follow_event() {
        let push = SyncError::InvalidPayload {
            event: "push".into(),
            source: decode_error(),
        };
        let pr = SyncError::InvalidPayload {
            event: "pull_request".into(),
            source: decode_error(),
        };
        assert_eq!(push.code(), "push_parse");
        assert_eq!(pr.code(), "pr_parse");
        assert_eq!(pr.kind(), ErrorKind::Validation);
    }

    #[test]
    fn store_failures_are_persistence() {
        let log = SyncError::DeliveryLog(anyhow::anyhow!("disk full"));
        let update = SyncError::Transition {
            committed: 3,
            source: anyhow::anyhow!("locked"),
        };
        assert_eq!(log.kind(), ErrorKind::Persistence);
        assert_eq!(update.kind(), ErrorKind::Persistence);
        assert_eq!(update.code(), "db_update");
        assert!(update.to_string().contains('3'));
    }

    #[test]
    fn sync_error_implements_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&SyncError::MissingHeader("X-GitHub-Delivery"));
    }
}

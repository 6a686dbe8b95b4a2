//! Errors - 期待される失敗の分類
//!
//! ErrorKind は閉じた列挙です。新しい失敗モードは variant を 1 つと
//! `status::STATUS_TABLE` の行を 1 つ足すだけで追加できます。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::status::{ErrorClassifier, StatusCode};

/// Closed classification of expected info-request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    UnauthorizedServer,
    InternalError,
    ConnectionFail,
    Unclassified,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::BadRequest,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::UnauthorizedServer,
        ErrorKind::InternalError,
        ErrorKind::ConnectionFail,
        ErrorKind::Unclassified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::UnauthorizedServer => "unauthorized_server",
            Self::InternalError => "internal_error",
            Self::ConnectionFail => "connection_fail",
            Self::Unclassified => "unclassified",
        }
    }

    /// Parses a kind name reported by a peer.
    ///
    /// Case, `_` and `-` are ignored, so `BadRequest`, `bad_request` and
    /// `bad-request` are equivalent. Anything unknown is `Unclassified`.
    pub fn from_name(name: &str) -> Self {
        let folded: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "badrequest" => Self::BadRequest,
            "forbidden" => Self::Forbidden,
            "notfound" => Self::NotFound,
            "unauthorizedserver" => Self::UnauthorizedServer,
            "internalerror" => Self::InternalError,
            "connectionfail" => Self::ConnectionFail,
            _ => Self::Unclassified,
        }
    }

    pub fn status_code(self) -> StatusCode {
        ErrorClassifier::classify(self)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by an info request handler.
///
/// `Classified` carries one of the expected kinds; `Unexpected` wraps any
/// other failure and is treated as an internal error after logging.
#[derive(Debug, Error)]
pub enum InfoError {
    #[error("{kind}: {message}")]
    Classified { kind: ErrorKind, message: String },

    #[error("unexpected failure: {0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl InfoError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Classified {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized_server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnauthorizedServer, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn connection_fail(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionFail, message)
    }

    pub fn unexpected(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Unexpected(source.into())
    }

    /// Unexpected failures count as internal errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Classified { kind, .. } => *kind,
            Self::Unexpected(_) => ErrorKind::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_ignores_case_and_separators() {
        assert_eq!(ErrorKind::from_name("BadRequest"), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::from_name("bad_request"), ErrorKind::BadRequest);
        assert_eq!(
            ErrorKind::from_name("UNAUTHORIZED-SERVER"),
            ErrorKind::UnauthorizedServer
        );
        assert_eq!(ErrorKind::from_name("teapot"), ErrorKind::Unclassified);
    }

    #[test]
    fn as_str_roundtrips_through_from_name() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_name(kind.as_str()), kind);
        }
    }

    #[test]
    fn unexpected_errors_are_internal() {
        let err = InfoError::unexpected("disk on fire");
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_ERROR);
        assert!(err.is_unexpected());
        assert_eq!(err.to_string(), "unexpected failure: disk on fire");
    }

    #[test]
    fn classified_error_message_names_kind() {
        let err = InfoError::forbidden("not allowed");
        assert_eq!(err.to_string(), "forbidden: not allowed");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}

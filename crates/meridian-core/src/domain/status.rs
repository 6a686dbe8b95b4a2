//! Protocol status codes and the ErrorKind → StatusCode classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ErrorKind;

/// Outcome code returned to peers and recorded in the connection log.
///
/// Positive values follow HTTP semantics. Two sentinels sit outside that
/// range: `-1` (the call could not be attempted, e.g. peer unreachable) and
/// `0` (outcome unknown). They are kept distinct because retry logic on the
/// calling side treats them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(i32);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const BAD_REQUEST: Self = Self(400);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const PRECONDITION_FAILED: Self = Self(412);
    pub const INTERNAL_ERROR: Self = Self(500);
    pub const CONNECTION_FAILED: Self = Self(-1);
    pub const UNKNOWN: Self = Self(0);

    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// `-1` and `0` are not protocol codes and cannot be sent as a response.
    pub const fn is_sentinel(self) -> bool {
        self.0 <= 0
    }

    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lookup table backing [`ErrorClassifier`]. One row per `ErrorKind`.
pub const STATUS_TABLE: [(ErrorKind, StatusCode); 7] = [
    (ErrorKind::BadRequest, StatusCode::BAD_REQUEST),
    (ErrorKind::Forbidden, StatusCode::FORBIDDEN),
    (ErrorKind::NotFound, StatusCode::NOT_FOUND),
    (ErrorKind::UnauthorizedServer, StatusCode::PRECONDITION_FAILED),
    (ErrorKind::InternalError, StatusCode::INTERNAL_ERROR),
    (ErrorKind::ConnectionFail, StatusCode::CONNECTION_FAILED),
    (ErrorKind::Unclassified, StatusCode::UNKNOWN),
];

/// Pure, total mapping from failure kind to status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(kind: ErrorKind) -> StatusCode {
        STATUS_TABLE
            .iter()
            .find(|(row, _)| *row == kind)
            .map(|(_, code)| *code)
            .unwrap_or(StatusCode::UNKNOWN)
    }

    /// Classifies a kind name received from a peer; unknown names map to `0`.
    pub fn classify_name(name: &str) -> StatusCode {
        Self::classify(ErrorKind::from_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::BadRequest, 400)]
    #[case(ErrorKind::Forbidden, 403)]
    #[case(ErrorKind::NotFound, 404)]
    #[case(ErrorKind::UnauthorizedServer, 412)]
    #[case(ErrorKind::InternalError, 500)]
    #[case(ErrorKind::ConnectionFail, -1)]
    #[case(ErrorKind::Unclassified, 0)]
    fn classifies_each_kind(#[case] kind: ErrorKind, #[case] expected: i32) {
        assert_eq!(ErrorClassifier::classify(kind).as_i32(), expected);
        // deterministic across calls
        assert_eq!(ErrorClassifier::classify(kind), ErrorClassifier::classify(kind));
    }

    #[test]
    fn table_covers_every_kind_once() {
        for kind in ErrorKind::ALL {
            let rows = STATUS_TABLE.iter().filter(|(row, _)| *row == kind).count();
            assert_eq!(rows, 1, "{kind} must have exactly one row");
        }
    }

    #[rstest]
    #[case("not_found", 404)]
    #[case("ConnectionFail", -1)]
    #[case("gateway_timeout", 0)]
    #[case("", 0)]
    fn classifies_peer_names(#[case] name: &str, #[case] expected: i32) {
        assert_eq!(ErrorClassifier::classify_name(name).as_i32(), expected);
    }

    #[test]
    fn sentinels_are_distinct_and_not_protocol_codes() {
        assert_ne!(StatusCode::CONNECTION_FAILED, StatusCode::UNKNOWN);
        assert!(StatusCode::CONNECTION_FAILED.is_sentinel());
        assert!(StatusCode::UNKNOWN.is_sentinel());
        assert!(!StatusCode::NOT_FOUND.is_sentinel());
        assert!(StatusCode::OK.is_success());
    }

    #[test]
    fn status_code_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&StatusCode::CONNECTION_FAILED).unwrap(), "-1");
    }
}

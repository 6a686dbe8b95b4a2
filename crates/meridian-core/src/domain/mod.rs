//! Domain model (ids, criticality, error kinds, status codes, audit records).

pub mod connection;
pub mod criticality;
pub mod errors;
pub mod ids;
pub mod status;

pub use self::connection::ConnectionRecord;
pub use self::criticality::Criticality;
pub use self::errors::{ErrorKind, InfoError};
pub use self::ids::{Id, IdMarker, RequestId, TaskId};
pub use self::status::{ErrorClassifier, STATUS_TABLE, StatusCode};

//! Classification of transport failures into "absent" and "operational".
//!
//! A 404 during Read means the remote object is gone and the local record
//! must be dropped. The same 404 during Delete is still a failure: the caller
//! asked for a deletion to happen and it did not.

use crate::error::{ClientError, ResourceError};

/// How a failed remote call should be treated by a lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The remote object does not exist.
    Absent,
    /// Anything else: network, server, decode, cancellation.
    Operational,
}

/// Classifies a transport failure.
#[must_use]
pub fn classify(err: &ClientError) -> Classification {
    if err.is_not_found() {
        Classification::Absent
    } else {
        Classification::Operational
    }
}

/// Resolves the result of a Read-style fetch.
///
/// `Ok(Some(_))` when the fetch succeeded, `Ok(None)` when the remote reports
/// the object absent, and an error naming `action` otherwise.
pub fn absent_on_not_found<T>(
    result: Result<T, ClientError>,
    action: impl FnOnce() -> String,
) -> Result<Option<T>, ResourceError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match classify(&err) {
            Classification::Absent => Ok(None),
            Classification::Operational => Err(ResourceError::client(action(), err)),
        },
    }
}

/// Resolves the result of a Delete-style call. Every failure escalates.
pub fn escalate<T>(
    result: Result<T, ClientError>,
    action: impl FnOnce() -> String,
) -> Result<T, ResourceError> {
    result.map_err(|err| ResourceError::client(action(), err))
}

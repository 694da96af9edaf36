//! Status state machine.
//!
//! ```text
//! OPEN         -> IN_PROGRESS, RESOLVED
//! IN_PROGRESS  -> RESOLVED, OPEN
//! RESOLVED     -> OPEN
//! ```
//!
//! There is no terminal state and no self-loop.

use std::str::FromStr;

use chrono::Utc;

use crate::model::RequestStatus;
use crate::model::ServiceRequest;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// `to` is kept as text so unknown status names can be reported too.
    #[error("Cannot transition from {from} to {to}")]
    Invalid { from: RequestStatus, to: String },
}

impl RequestStatus {
    /// Legal successors of `self`.
    pub fn successors(self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Open => &[RequestStatus::InProgress, RequestStatus::Resolved],
            RequestStatus::InProgress => &[RequestStatus::Resolved, RequestStatus::Open],
            RequestStatus::Resolved => &[RequestStatus::Open],
        }
    }

    pub fn can_transition_to(self, target: RequestStatus) -> bool {
        self.successors().contains(&target)
    }
}

/// Move `record` to `target`, stamping `updated_at`.
///
/// On error the record is left untouched.
pub fn transition(
    record: &mut ServiceRequest,
    target: RequestStatus,
) -> Result<&ServiceRequest, TransitionError> {
    let from = record.status();
    if !from.can_transition_to(target) {
        return Err(TransitionError::Invalid {
            from,
            to: target.to_string(),
        });
    }
    record.set_status(target, Utc::now());
    Ok(record)
}

/// Like [`transition`], for a status name that has not been parsed yet.
/// Names outside the enumeration are invalid transitions.
pub fn transition_named<'a>(
    record: &'a mut ServiceRequest,
    target: &str,
) -> Result<&'a ServiceRequest, TransitionError> {
    match RequestStatus::from_str(target) {
        Ok(status) => transition(record, status),
        Err(_) => Err(TransitionError::Invalid {
            from: record.status(),
            to: target.to_string(),
        }),
    }
}

//! Service request domain types.
//!
//! A [`ServiceRequest`] is created once by the intake path and afterwards only
//! its `status` / `updated_at` pair changes, through
//! [`crate::transition::transition`]. All fields are private and exposed
//! through read-only accessors.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::AsRefStr;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use utoipa::ToSchema;

/// Sentiment recorded when the classifier could not provide one.
pub const NEUTRAL_SENTIMENT: &str = "Neutral";

/// Request category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Category {
    #[serde(rename = "IT")]
    #[strum(serialize = "IT")]
    It,
    Facilities,
    /// Fallback when nothing better is known.
    General,
}

/// Request priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Priority {
    High,
    /// Fallback when nothing better is known.
    Low,
}

/// Lifecycle status. See [`crate::transition`] for the legal moves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Initial state of every request.
    Open,
    InProgress,
    Resolved,
}

/// Caller-supplied fields for a new request.
///
/// Produced by the boundary layer after validation; the intake path never
/// rejects one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceRequest {
    pub title: String,
    pub description: String,
    pub requester_name: String,
    pub requester_email: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

/// A stored service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    id: u64,
    title: String,
    description: String,
    requester_name: String,
    requester_email: String,
    category: Category,
    priority: Priority,
    status: RequestStatus,
    /// Sentiment label from the classifier, or `Neutral`.
    ai_notes: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn requester_name(&self) -> &str {
        &self.requester_name
    }

    pub fn requester_email(&self) -> &str {
        &self.requester_email
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Sentiment label from the classifier, or `Neutral`.
    pub fn ai_notes(&self) -> &str {
        &self.ai_notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `None` until the first accepted transition.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub(crate) fn set_status(&mut self, status: RequestStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = Some(at);
    }
}

/// A fully resolved request that has not been given an id yet.
///
/// Category, priority and sentiment are already final here, so the record
/// that comes out of [`ResolvedRequest::into_record`] is complete the moment
/// it becomes visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub title: String,
    pub description: String,
    pub requester_name: String,
    pub requester_email: String,
    pub category: Category,
    pub priority: Priority,
    pub ai_notes: String,
    pub created_at: DateTime<Utc>,
}

impl ResolvedRequest {
    /// Attach the store-issued id. The record starts `OPEN` with no `updated_at`.
    pub fn into_record(self, id: u64) -> ServiceRequest {
        ServiceRequest {
            id,
            title: self.title,
            description: self.description,
            requester_name: self.requester_name,
            requester_email: self.requester_email,
            category: self.category,
            priority: self.priority,
            status: RequestStatus::Open,
            ai_notes: self.ai_notes,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

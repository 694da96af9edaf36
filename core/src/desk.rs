//! RequestDesk owns the request store and runs the three request flows.
//!
//! - create: intake resolver → classifier → store
//! - update status: transition validator → store
//! - list: query engine over a store snapshot
//!
//! The store sits behind one async mutex. A creation holds it only for id
//! assignment plus append, never across the classifier call, so two
//! concurrent creations cannot interleave between `next_id` and `append`.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::classifier::Classifier;
use crate::intake::IntakeResolver;
use crate::model::NewServiceRequest;
use crate::model::RequestStatus;
use crate::model::ServiceRequest;
use crate::query;
use crate::query::ListFilter;
use crate::query::Page;
use crate::query::Pagination;
use crate::store::InMemoryRequestStore;
use crate::store::RequestStore;
use crate::store::StoreError;
use crate::transition;
use crate::transition::TransitionError;

/// Error type for desk operations.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("request not found: {id}")]
    NotFound { id: u64 },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct RequestDesk {
    store: Mutex<Box<dyn RequestStore>>,
    resolver: IntakeResolver,
}

impl RequestDesk {
    pub fn new(store: Box<dyn RequestStore>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store: Mutex::new(store),
            resolver: IntakeResolver::new(classifier),
        }
    }

    /// Desk backed by a fresh [`InMemoryRequestStore`].
    pub fn in_memory(classifier: Arc<dyn Classifier>) -> Self {
        Self::new(Box::new(InMemoryRequestStore::new()), classifier)
    }

    /// Create a request from validated input.
    ///
    /// Classifier problems never surface here; only a store failure can.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, submission: NewServiceRequest) -> Result<ServiceRequest, DeskError> {
        let resolved = self.resolver.resolve(submission).await;

        let record = {
            let mut store = self.store.lock().await;
            let id = store.next_id()?;
            let record = resolved.into_record(id);
            store.append(record.clone())?;
            record
        };

        tracing::info!(
            id = record.id(),
            category = %record.category(),
            priority = %record.priority(),
            ai_notes = record.ai_notes(),
            "request created"
        );
        Ok(record)
    }

    pub async fn get(&self, id: u64) -> Result<ServiceRequest, DeskError> {
        let store = self.store.lock().await;
        store.find_by_id(id).cloned().ok_or(DeskError::NotFound { id })
    }

    /// Apply a status transition to request `id`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: u64,
        target: RequestStatus,
    ) -> Result<ServiceRequest, DeskError> {
        let mut store = self.store.lock().await;
        let record = store.find_by_id_mut(id).ok_or(DeskError::NotFound { id })?;
        let from = record.status();

        match transition::transition(record, target) {
            Ok(updated) => {
                tracing::info!(id, %from, to = %target, "status updated");
                Ok(updated.clone())
            }
            Err(e) => {
                tracing::info!(id, %from, to = %target, "rejected status transition");
                Err(e.into())
            }
        }
    }

    /// One page of requests matching `filter`, oldest first.
    pub async fn list(&self, filter: &ListFilter, pagination: Pagination) -> Page<ServiceRequest> {
        let snapshot = self.store.lock().await.all();
        query::query(&snapshot, filter, pagination)
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }
}

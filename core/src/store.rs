//! Request storage.
//!
//! [`RequestStore`] is the seam a durable backend would plug into. The only
//! implementation shipped here is [`InMemoryRequestStore`], which keeps
//! records in creation order and forgets everything on restart.

use crate::model::ServiceRequest;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Ordered collection of requests keyed by a store-issued id.
///
/// Callers that need `next_id` and `append` to be atomic with respect to
/// each other must serialize access (see [`crate::desk::RequestDesk`]).
pub trait RequestStore: Send + Sync {
    /// Issue a fresh id, strictly greater than every id issued before.
    /// The first id is 1.
    fn next_id(&mut self) -> Result<u64, StoreError>;

    /// Add `record` as the newest entry.
    fn append(&mut self, record: ServiceRequest) -> Result<(), StoreError>;

    fn find_by_id(&self, id: u64) -> Option<&ServiceRequest>;

    fn find_by_id_mut(&mut self, id: u64) -> Option<&mut ServiceRequest>;

    /// Oldest-first snapshot, detached from later mutation.
    fn all(&self) -> Vec<ServiceRequest>;

    /// Number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    records: Vec<ServiceRequest>,
    last_id: u64,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: u64) -> Option<usize> {
        // Ids are appended in increasing order.
        self.records.binary_search_by_key(&id, ServiceRequest::id).ok()
    }
}

impl RequestStore for InMemoryRequestStore {
    fn next_id(&mut self) -> Result<u64, StoreError> {
        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend("id space exhausted".to_string()))?;
        self.last_id = id;
        Ok(id)
    }

    fn append(&mut self, record: ServiceRequest) -> Result<(), StoreError> {
        if let Some(last) = self.records.last()
            && last.id() >= record.id()
        {
            return Err(StoreError::Backend(format!(
                "id {} appended after id {}",
                record.id(),
                last.id()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    fn find_by_id(&self, id: u64) -> Option<&ServiceRequest> {
        self.position(id).map(|idx| &self.records[idx])
    }

    fn find_by_id_mut(&mut self, id: u64) -> Option<&mut ServiceRequest> {
        self.position(id).map(|idx| &mut self.records[idx])
    }

    fn all(&self) -> Vec<ServiceRequest> {
        self.records.clone()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

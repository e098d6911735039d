//! Read-only views over a registry
//!
//! Two levels of visibility are offered. The public summary tells anyone
//! where a batch came from and where it is now, without naming the parties
//! that handled it. The full record and the audit trail are limited to the
//! producer, importer and retailer bound to that batch.
use super::batch::{Batch, BatchId, BatchStatus, TimeStamp};
use super::error::ProvenanceError;
use super::history::HistoryLog;
use super::principal::{Access, Principal};
use super::registry::BatchRegistry;
use super::store::BatchStore;
use chrono::Utc;

/// Public provenance summary. Carries no party identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub origin: String,
    pub status: BatchStatus,
    pub current_location: String, // empty until the first transition
}

/// Every field of a batch except its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDetails {
    pub id: BatchId,
    pub origin: String,
    pub production_date: TimeStamp<Utc>,
    pub producer: Principal,
    pub importer: Principal,
    pub retailer: Principal,
    pub status: BatchStatus,
    pub current_location: String,
}

pub struct QueryService<'a, S: BatchStore> {
    registry: &'a BatchRegistry<S>,
}

impl<'a, S: BatchStore> QueryService<'a, S> {
    pub fn new(registry: &'a BatchRegistry<S>) -> Self {
        Self { registry }
    }

    fn load(&self, id: BatchId) -> Result<Batch, ProvenanceError> {
        self.registry
            .store()
            .load(id)?
            .ok_or(ProvenanceError::NotFound(id))
    }

    fn load_for_party(&self, caller: &Principal, id: BatchId) -> Result<Batch, ProvenanceError> {
        let batch = self.load(id)?;
        if !batch.is_party(caller) {
            tracing::debug!(batch_id = %id, "restricted read refused");
            return Err(ProvenanceError::Unauthorized {
                batch_id: id,
                required: Access::Party,
            });
        }
        Ok(batch)
    }

    /// Open to any caller.
    pub fn get_current_batch(&self, id: BatchId) -> Result<BatchSummary, ProvenanceError> {
        let batch = self.load(id)?;
        Ok(BatchSummary {
            origin: batch.origin().to_owned(),
            status: batch.status(),
            current_location: batch.current_location().to_owned(),
        })
    }

    pub fn get_full_batch_details(
        &self,
        caller: &Principal,
        id: BatchId,
    ) -> Result<BatchDetails, ProvenanceError> {
        let batch = self.load_for_party(caller, id)?;
        Ok(BatchDetails::from(batch))
    }

    /// Status events in the order they were recorded.
    pub fn get_batch_history(
        &self,
        caller: &Principal,
        id: BatchId,
    ) -> Result<HistoryLog, ProvenanceError> {
        let batch = self.load_for_party(caller, id)?;
        Ok(batch.history().clone())
    }
}

impl From<Batch> for BatchDetails {
    fn from(batch: Batch) -> Self {
        Self {
            id: batch.id(),
            origin: batch.origin().to_owned(),
            production_date: batch.production_date().clone(),
            producer: batch.producer().clone(),
            importer: batch.importer().clone(),
            retailer: batch.retailer().clone(),
            status: batch.status(),
            current_location: batch.current_location().to_owned(),
        }
    }
}

impl<S: BatchStore> BatchRegistry<S> {
    pub fn query(&self) -> QueryService<'_, S> {
        QueryService::new(self)
    }
}

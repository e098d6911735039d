//! Batch registration and the custody transitions
use super::batch::{Batch, BatchId, BatchStatus, TimeStamp};
use super::error::ProvenanceError;
use super::events::{EventSink, TransitionEvent};
use super::principal::{Access, Principal, Role};
use super::store::{BatchStore, MemoryStore};
use chrono::Utc;

pub struct BatchRegistry<S = MemoryStore> {
    store: S,
    sinks: Vec<Box<dyn EventSink>>,
}

impl BatchRegistry<MemoryStore> {
    /// Empty registry held in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: BatchStore> BatchRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sinks: vec![],
        }
    }

    /// Register an observer that receives every transition event.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Register a new batch. The caller becomes its producer.
    pub fn create_batch(
        &mut self,
        caller: &Principal,
        id: BatchId,
        origin: impl Into<String>,
        production_date: TimeStamp<Utc>,
        importer: Principal,
        retailer: Principal,
    ) -> Result<TransitionEvent, ProvenanceError> {
        let result = self.try_create(
            caller,
            id,
            origin.into(),
            production_date,
            importer,
            retailer,
        );
        self.finish(id, result)
    }

    /// Producer hands the batch to transport.
    pub fn mark_as_sent(
        &mut self,
        caller: &Principal,
        id: BatchId,
        location: impl Into<String>,
    ) -> Result<TransitionEvent, ProvenanceError> {
        let result = self.transition(caller, id, Role::Producer, location.into());
        self.finish(id, result)
    }

    /// Importer takes receipt of a sent batch.
    pub fn mark_as_received(
        &mut self,
        caller: &Principal,
        id: BatchId,
        location: impl Into<String>,
    ) -> Result<TransitionEvent, ProvenanceError> {
        let result = self.transition(caller, id, Role::Importer, location.into());
        self.finish(id, result)
    }

    /// Retailer confirms final delivery. Delivered is terminal.
    pub fn mark_as_delivered(
        &mut self,
        caller: &Principal,
        id: BatchId,
        location: impl Into<String>,
    ) -> Result<TransitionEvent, ProvenanceError> {
        let result = self.transition(caller, id, Role::Retailer, location.into());
        self.finish(id, result)
    }

    fn try_create(
        &mut self,
        caller: &Principal,
        id: BatchId,
        origin: String,
        production_date: TimeStamp<Utc>,
        importer: Principal,
        retailer: Principal,
    ) -> Result<TransitionEvent, ProvenanceError> {
        if self.store.contains(id)? {
            return Err(ProvenanceError::DuplicateId(id));
        }
        if *caller == importer || *caller == retailer || importer == retailer {
            return Err(ProvenanceError::RoleConflict);
        }
        if !production_date.is_encodable() {
            return Err(ProvenanceError::InvalidTimestamp(production_date.unix()));
        }

        let now = TimeStamp::new();
        let batch = Batch::register(
            id,
            origin,
            production_date,
            caller.clone(),
            importer,
            retailer,
            now.clone(),
        );

        if !self.store.insert_new(&batch)? {
            return Err(ProvenanceError::DuplicateId(id));
        }

        Ok(TransitionEvent {
            batch_id: id,
            from: None,
            to: BatchStatus::Produced,
            location: String::new(),
            actor: caller.clone(),
            timestamp: now,
        })
    }

    // every check runs against the loaded record before the single write
    fn transition(
        &mut self,
        caller: &Principal,
        id: BatchId,
        role: Role,
        location: String,
    ) -> Result<TransitionEvent, ProvenanceError> {
        let mut batch = self
            .store
            .load(id)?
            .ok_or(ProvenanceError::NotFound(id))?;
        let (from, to) = role.transition();

        if batch.status() != from {
            return Err(ProvenanceError::InvalidState {
                batch_id: id,
                expected: from,
                actual: batch.status(),
            });
        }
        if batch.principal_for(role) != caller {
            return Err(ProvenanceError::Unauthorized {
                batch_id: id,
                required: Access::Role(role),
            });
        }

        let now = TimeStamp::new();
        batch.advance(to, location.clone(), now.clone());
        self.store.save(&batch)?;

        Ok(TransitionEvent {
            batch_id: id,
            from: Some(from),
            to,
            location,
            actor: caller.clone(),
            timestamp: now,
        })
    }

    // log the outcome and fan successful events out to the sinks
    fn finish(
        &self,
        id: BatchId,
        result: Result<TransitionEvent, ProvenanceError>,
    ) -> Result<TransitionEvent, ProvenanceError> {
        match &result {
            Ok(event) => {
                tracing::info!(
                    batch_id = %event.batch_id,
                    status = %event.to,
                    location = %event.location,
                    actor = %event.actor,
                    "batch status recorded"
                );
                for sink in &self.sinks {
                    if let Err(err) = sink.publish(event) {
                        tracing::warn!(batch_id = %id, "failed to publish transition event: {err:?}");
                    }
                }
            }
            Err(err) => {
                tracing::debug!(batch_id = %id, kind = err.kind(), "batch operation rejected: {err}");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Parties {
        producer: Principal,
        importer: Principal,
        retailer: Principal,
        stranger: Principal,
    }

    fn parties() -> Parties {
        Parties {
            producer: Principal::new("producer"),
            importer: Principal::new("importer"),
            retailer: Principal::new("retailer"),
            stranger: Principal::new("stranger"),
        }
    }

    fn registry_with_batch(p: &Parties) -> BatchRegistry {
        let mut registry = BatchRegistry::in_memory();
        registry
            .create_batch(
                &p.producer,
                BatchId::new(1),
                "Italy",
                TimeStamp::from_unix(1735123200).unwrap(),
                p.importer.clone(),
                p.retailer.clone(),
            )
            .unwrap();
        registry
    }

    fn stored(registry: &BatchRegistry, id: u64) -> Batch {
        registry.store().load(BatchId::new(id)).unwrap().unwrap()
    }

    #[test]
    fn create_returns_registration_event() {
        let p = parties();
        let mut registry = BatchRegistry::in_memory();
        let event = registry
            .create_batch(
                &p.producer,
                BatchId::new(9),
                "Crete",
                TimeStamp::new(),
                p.importer.clone(),
                p.retailer.clone(),
            )
            .unwrap();

        assert!(event.is_registration());
        assert_eq!(event.to, BatchStatus::Produced);
        assert_eq!(event.actor, p.producer);
        assert_eq!(stored(&registry, 9).producer(), &p.producer);
    }

    #[test]
    fn duplicate_id_leaves_original_untouched() {
        let p = parties();
        let mut registry = registry_with_batch(&p);
        let before = stored(&registry, 1);

        let err = registry
            .create_batch(
                &p.stranger,
                BatchId::new(1),
                "Spain",
                TimeStamp::new(),
                p.importer.clone(),
                p.retailer.clone(),
            )
            .unwrap_err();

        assert!(matches!(err, ProvenanceError::DuplicateId(id) if id == BatchId::new(1)));
        assert_eq!(stored(&registry, 1), before);
    }

    #[test]
    fn roles_must_be_distinct() {
        let p = parties();
        let mut registry = BatchRegistry::in_memory();
        let err = registry
            .create_batch(
                &p.producer,
                BatchId::new(1),
                "Italy",
                TimeStamp::new(),
                p.importer.clone(),
                p.importer.clone(),
            )
            .unwrap_err();

        assert!(matches!(err, ProvenanceError::RoleConflict));
        assert!(registry.store().is_empty().unwrap());
    }

    #[test]
    fn unencodable_production_date_is_rejected() {
        use chrono::TimeZone;
        let p = parties();
        let mut registry = BatchRegistry::in_memory();
        let far = TimeStamp::from(Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap());

        let result = registry.create_batch(
            &p.producer,
            BatchId::new(1),
            "Italy",
            far,
            p.importer.clone(),
            p.retailer.clone(),
        );
        assert!(matches!(result, Err(ProvenanceError::InvalidTimestamp(_))));
        assert!(registry.store().load(BatchId::new(1)).unwrap().is_none());
    }

    #[test]
    fn wrong_state_beats_wrong_caller() {
        let p = parties();
        let mut registry = registry_with_batch(&p);

        let err = registry
            .mark_as_received(&p.stranger, BatchId::new(1), "Milan")
            .unwrap_err();
        assert!(matches!(
            err,
            ProvenanceError::InvalidState {
                expected: BatchStatus::Sent,
                actual: BatchStatus::Produced,
                ..
            }
        ));
    }

    #[test]
    fn failed_transition_changes_nothing() {
        let p = parties();
        let mut registry = registry_with_batch(&p);
        let before = stored(&registry, 1);

        let err = registry
            .mark_as_sent(&p.importer, BatchId::new(1), "Rome")
            .unwrap_err();
        assert!(matches!(
            err,
            ProvenanceError::Unauthorized {
                required: Access::Role(Role::Producer),
                ..
            }
        ));
        assert_eq!(stored(&registry, 1), before);
    }

    #[test]
    fn delivered_is_terminal() {
        let p = parties();
        let mut registry = registry_with_batch(&p);
        let id = BatchId::new(1);
        registry.mark_as_sent(&p.producer, id, "Rome").unwrap();
        registry.mark_as_received(&p.importer, id, "Milan").unwrap();
        registry
            .mark_as_delivered(&p.retailer, id, "Final Store")
            .unwrap();

        for result in [
            registry.mark_as_sent(&p.producer, id, "Again"),
            registry.mark_as_received(&p.importer, id, "Again"),
            registry.mark_as_delivered(&p.retailer, id, "Again"),
        ] {
            assert!(matches!(result, Err(ProvenanceError::InvalidState { .. })));
        }
        assert_eq!(stored(&registry, 1).history().len(), 4);
    }

    #[test]
    fn missing_batch_is_not_found() {
        let p = parties();
        let mut registry = BatchRegistry::in_memory();
        let err = registry
            .mark_as_sent(&p.producer, BatchId::new(42), "Rome")
            .unwrap_err();
        assert!(matches!(err, ProvenanceError::NotFound(_)));
    }

    #[test]
    fn sinks_only_see_successful_operations() {
        let p = parties();
        let seen = Rc::new(RefCell::new(vec![]));
        let mut registry = BatchRegistry::in_memory();
        let log = Rc::clone(&seen);
        registry.subscribe(move |event: &TransitionEvent| log.borrow_mut().push(event.to));

        let id = BatchId::new(1);
        registry
            .create_batch(
                &p.producer,
                id,
                "Italy",
                TimeStamp::new(),
                p.importer.clone(),
                p.retailer.clone(),
            )
            .unwrap();
        let _ = registry.mark_as_sent(&p.stranger, id, "Rome");
        registry.mark_as_sent(&p.producer, id, "Rome").unwrap();

        assert_eq!(*seen.borrow(), [BatchStatus::Produced, BatchStatus::Sent]);
    }

    #[test]
    fn each_role_owns_one_edge() {
        let (_, sent) = Role::Producer.transition();
        let (from_sent, received) = Role::Importer.transition();
        let (from_received, _) = Role::Retailer.transition();
        assert_eq!(sent, from_sent);
        assert_eq!(received, from_received);
    }
}

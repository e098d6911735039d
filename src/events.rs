//! Transition notifications handed to external observers
//!
//! The registry produces one [`TransitionEvent`] per successful mutation, after
//! the record is stored. Delivery is best effort: a sink that fails is logged
//! and skipped, and never changes the outcome of the operation that produced
//! the event.
use super::batch::{BatchId, BatchStatus, TimeStamp};
use super::principal::Principal;
use chrono::Utc;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct TransitionEvent {
    #[n(0)]
    pub batch_id: BatchId,
    #[n(1)]
    pub from: Option<BatchStatus>, // None on registration
    #[n(2)]
    pub to: BatchStatus,
    #[n(3)]
    pub location: String,
    #[n(4)]
    pub actor: Principal,
    #[n(5)]
    pub timestamp: TimeStamp<Utc>,
}

/// Receives transition events from a registry.
pub trait EventSink {
    fn publish(&self, event: &TransitionEvent) -> anyhow::Result<()>;
}

impl EventSink for Sender<TransitionEvent> {
    fn publish(&self, event: &TransitionEvent) -> anyhow::Result<()> {
        self.send(event.clone())
            .map_err(|_| anyhow::anyhow!("event receiver disconnected"))
    }
}

impl<F> EventSink for F
where
    F: Fn(&TransitionEvent),
{
    fn publish(&self, event: &TransitionEvent) -> anyhow::Result<()> {
        self(event);
        Ok(())
    }
}

impl TransitionEvent {
    pub fn is_registration(&self) -> bool {
        self.from.is_none()
    }
}

//! Append-only audit trail kept on every batch
use super::batch::StatusEvent;

/// Ordered status events for one batch. Entries can be appended and read,
/// never removed or reordered.
#[derive(Debug, Default, PartialEq, Eq, Clone, minicbor::Encode, minicbor::Decode)]
pub struct HistoryLog {
    #[n(0)]
    events: Vec<StatusEvent>,
}

impl HistoryLog {
    pub(crate) fn new() -> Self {
        Self { events: vec![] }
    }
    pub(crate) fn append(&mut self, event: StatusEvent) {
        self.events.push(event);
    }
    /// All events in insertion order.
    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }
    pub fn iter(&self) -> std::slice::Iter<'_, StatusEvent> {
        self.events.iter()
    }
    pub fn len(&self) -> usize {
        self.events.len()
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
    /// Hex sha256 over the CBOR encoded events. Two parties holding the same
    /// trail compute the same digest.
    pub fn digest(&self) -> anyhow::Result<String> {
        let cbor = minicbor::to_vec(&self.events)?;
        Ok(sha256::digest(cbor.as_slice()))
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a StatusEvent;
    type IntoIter = std::slice::Iter<'a, StatusEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchStatus, TimeStamp};

    #[test]
    fn append_preserves_order() {
        let mut log = HistoryLog::new();
        log.append(StatusEvent::new(BatchStatus::Produced, String::new(), TimeStamp::new()));
        log.append(StatusEvent::new(BatchStatus::Sent, "Rome".into(), TimeStamp::new()));

        let statuses: Vec<_> = log.iter().map(|e| e.status).collect();
        assert_eq!(statuses, [BatchStatus::Produced, BatchStatus::Sent]);
        assert_eq!(log.events().last().map(|e| e.location.as_str()), Some("Rome"));
    }

    #[test]
    fn digest_tracks_contents() {
        let ts = TimeStamp::from_unix(1735123200).unwrap();
        let mut a = HistoryLog::new();
        a.append(StatusEvent::new(BatchStatus::Produced, String::new(), ts.clone()));
        let b = a.clone();

        assert_eq!(a.digest().unwrap(), b.digest().unwrap());

        a.append(StatusEvent::new(BatchStatus::Sent, "Rome".into(), ts));
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }
}

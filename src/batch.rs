//! Batch records, their status and the timestamps they carry
use super::error::ProvenanceError;
use super::history::HistoryLog;
use super::principal::{Principal, Role};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Caller supplied batch identifier, unique for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub enum BatchStatus {
    #[n(0)]
    Produced,
    #[n(1)]
    Sent,
    #[n(2)]
    Received,
    #[n(3)]
    Delivered,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone + Eq> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone + Eq> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// One entry of a batch's audit trail.
#[derive(Debug, PartialEq, Eq, Clone, minicbor::Encode, minicbor::Decode)]
pub struct StatusEvent {
    #[n(0)]
    pub status: BatchStatus,
    #[n(1)]
    pub location: String,
    #[n(2)]
    pub timestamp: TimeStamp<Utc>, // time of the transition, not of production
}

// persisted as a single record keyed by id
#[derive(Debug, PartialEq, Eq, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Batch {
    #[n(0)]
    id: BatchId,
    #[n(1)]
    origin: String,
    #[n(2)]
    production_date: TimeStamp<Utc>,
    #[n(3)]
    producer: Principal,
    #[n(4)]
    importer: Principal,
    #[n(5)]
    retailer: Principal,
    #[n(6)]
    status: BatchStatus,
    #[n(7)]
    current_location: String,
    #[n(8)]
    history: HistoryLog,
}

impl BatchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
    pub fn get(&self) -> u64 {
        self.0
    }
    /// Big-endian key so storage iterates batches in id order.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for BatchId {
    fn from(value: u64) -> Self {
        BatchId(value)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Produced => "Produced",
            BatchStatus::Sent => "Sent",
            BatchStatus::Received => "Received",
            BatchStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    /// Build from unix seconds, rejecting values the nanosecond encoding can't hold.
    pub fn from_unix(secs: i64) -> Result<Self, ProvenanceError> {
        DateTime::from_timestamp(secs, 0)
            .filter(|dt| dt.timestamp_nanos_opt().is_some())
            .map(TimeStamp)
            .ok_or(ProvenanceError::InvalidTimestamp(secs))
    }
    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }
    /// Whether the instant fits the i64 nanosecond record encoding.
    pub fn is_encodable(&self) -> bool {
        self.0.timestamp_nanos_opt().is_some()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl StatusEvent {
    pub fn new(status: BatchStatus, location: String, timestamp: TimeStamp<Utc>) -> Self {
        Self {
            status,
            location,
            timestamp,
        }
    }
}

impl Batch {
    /// A freshly registered batch: Produced, no location, one history entry.
    pub(crate) fn register(
        id: BatchId,
        origin: String,
        production_date: TimeStamp<Utc>,
        producer: Principal,
        importer: Principal,
        retailer: Principal,
        now: TimeStamp<Utc>,
    ) -> Self {
        let mut history = HistoryLog::new();
        history.append(StatusEvent::new(BatchStatus::Produced, String::new(), now));

        Self {
            id,
            origin,
            production_date,
            producer,
            importer,
            retailer,
            status: BatchStatus::Produced,
            current_location: String::new(),
            history,
        }
    }

    /// Move to the next status. Callers validate role and state first; this
    /// only applies the three updates together.
    pub(crate) fn advance(&mut self, next: BatchStatus, location: String, now: TimeStamp<Utc>) {
        self.history
            .append(StatusEvent::new(next, location.clone(), now));
        self.status = next;
        self.current_location = location;
    }

    pub fn id(&self) -> BatchId {
        self.id
    }
    pub fn origin(&self) -> &str {
        &self.origin
    }
    pub fn production_date(&self) -> &TimeStamp<Utc> {
        &self.production_date
    }
    pub fn producer(&self) -> &Principal {
        &self.producer
    }
    pub fn importer(&self) -> &Principal {
        &self.importer
    }
    pub fn retailer(&self) -> &Principal {
        &self.retailer
    }
    pub fn status(&self) -> BatchStatus {
        self.status
    }
    pub fn current_location(&self) -> &str {
        &self.current_location
    }
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
    pub fn principal_for(&self, role: Role) -> &Principal {
        match role {
            Role::Producer => &self.producer,
            Role::Importer => &self.importer,
            Role::Retailer => &self.retailer,
        }
    }
    /// True when `caller` holds any of the three roles on this batch.
    pub fn is_party(&self, caller: &Principal) -> bool {
        [&self.producer, &self.importer, &self.retailer].contains(&caller)
    }
}

impl<C> minicbor::Encode<C> for BatchId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for BatchId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(BatchId(d.u64()?))
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

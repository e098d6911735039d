use super::batch::{BatchId, BatchStatus};
use super::principal::Access;

#[derive(thiserror::Error, Debug)]
pub enum ProvenanceError {
    #[error("Batch {0} is already registered")]
    DuplicateId(BatchId),
    #[error("Batch {0} does not exist")]
    NotFound(BatchId),
    #[error("Caller is not authorised for batch {batch_id}, requires {required}")]
    Unauthorized { batch_id: BatchId, required: Access },
    #[error("Batch {batch_id} is {actual}, transition requires {expected}")]
    InvalidState {
        batch_id: BatchId,
        expected: BatchStatus,
        actual: BatchStatus,
    },
    #[error("Producer, importer and retailer must be three distinct principals")]
    RoleConflict,
    #[error("Timestamp {0} is outside the representable range")]
    InvalidTimestamp(i64),
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Failed to encode batch record: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),
    #[error("Failed to decode batch record: {0}")]
    Decode(#[from] minicbor::decode::Error),
}

impl ProvenanceError {
    /// Short, stable name of the failure kind. Useful for log fields and for
    /// callers that map failures onto their own codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "duplicate_id",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidState { .. } => "invalid_state",
            Self::RoleConflict => "role_conflict",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::Storage(_) => "storage",
            Self::Encode(_) => "encode",
            Self::Decode(_) => "decode",
        }
    }
}

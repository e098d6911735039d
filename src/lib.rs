pub mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod principal;
pub mod query;
pub mod registry;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use batch::{Batch, BatchId, BatchStatus, StatusEvent, TimeStamp};
pub use error::ProvenanceError;
pub use principal::{Principal, Role};
pub use registry::BatchRegistry;

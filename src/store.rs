//! Persistence for batch records
//!
//! A store holds one record per batch keyed by its id. Records are replaced
//! whole, so a write either lands completely or not at all.
use super::batch::{Batch, BatchId};
use super::error::ProvenanceError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const BATCH_TREE: &str = "batches";

pub trait BatchStore {
    fn load(&self, id: BatchId) -> Result<Option<Batch>, ProvenanceError>;
    /// Insert a record for a new id. Returns false, writing nothing, when the
    /// id is already taken.
    fn insert_new(&mut self, batch: &Batch) -> Result<bool, ProvenanceError>;
    /// Replace the record of an existing batch.
    fn save(&mut self, batch: &Batch) -> Result<(), ProvenanceError>;
    fn len(&self) -> Result<usize, ProvenanceError>;

    fn contains(&self, id: BatchId) -> Result<bool, ProvenanceError> {
        Ok(self.load(id)?.is_some())
    }
    fn is_empty(&self) -> Result<bool, ProvenanceError> {
        Ok(self.len()? == 0)
    }
}

impl<S: BatchStore + ?Sized> BatchStore for Box<S> {
    fn load(&self, id: BatchId) -> Result<Option<Batch>, ProvenanceError> {
        (**self).load(id)
    }
    fn insert_new(&mut self, batch: &Batch) -> Result<bool, ProvenanceError> {
        (**self).insert_new(batch)
    }
    fn save(&mut self, batch: &Batch) -> Result<(), ProvenanceError> {
        (**self).save(batch)
    }
    fn len(&self) -> Result<usize, ProvenanceError> {
        (**self).len()
    }
}

/// In-process store. Starts empty and lives as long as its owner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    batches: BTreeMap<BatchId, Batch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchStore for MemoryStore {
    fn load(&self, id: BatchId) -> Result<Option<Batch>, ProvenanceError> {
        Ok(self.batches.get(&id).cloned())
    }
    fn insert_new(&mut self, batch: &Batch) -> Result<bool, ProvenanceError> {
        if self.batches.contains_key(&batch.id()) {
            return Ok(false);
        }
        self.batches.insert(batch.id(), batch.clone());
        Ok(true)
    }
    fn save(&mut self, batch: &Batch) -> Result<(), ProvenanceError> {
        self.batches.insert(batch.id(), batch.clone());
        Ok(())
    }
    fn len(&self) -> Result<usize, ProvenanceError> {
        Ok(self.batches.len())
    }
}

/// Sled backed store. Each batch is one CBOR value in the `batches` tree.
pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, ProvenanceError> {
        let tree = instance.open_tree(BATCH_TREE)?;
        Ok(Self { tree })
    }
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProvenanceError> {
        let db = sled::open(path)?;
        Self::new(Arc::new(db))
    }
}

impl BatchStore for SledStore {
    fn load(&self, id: BatchId) -> Result<Option<Batch>, ProvenanceError> {
        match self.tree.get(id.to_key())? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }
    fn insert_new(&mut self, batch: &Batch) -> Result<bool, ProvenanceError> {
        let cbor = minicbor::to_vec(batch)?;
        // only succeeds when no record exists under the key
        let swapped = self
            .tree
            .compare_and_swap(batch.id().to_key(), None::<&[u8]>, Some(cbor))?;
        Ok(swapped.is_ok())
    }
    fn save(&mut self, batch: &Batch) -> Result<(), ProvenanceError> {
        let cbor = minicbor::to_vec(batch)?;
        self.tree.insert(batch.id().to_key(), cbor)?;
        Ok(())
    }
    fn len(&self) -> Result<usize, ProvenanceError> {
        Ok(self.tree.len())
    }
}

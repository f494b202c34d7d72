//! In-memory store with the same encoding and immutability rules as [`DirStore`].
//!
//! [`DirStore`]: crate::DirStore

use std::collections::BTreeMap;

use certlab_kernel::{Instance, InstanceId};
use tracing::{debug, warn};

use crate::{InstanceStore, PutOutcome, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<InstanceId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded record for `id`, exactly as a directory store would write it.
    pub fn record(&self, id: &InstanceId) -> Option<&str> {
        self.records.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl InstanceStore for MemoryStore {
    fn put(&mut self, instance: &Instance) -> Result<PutOutcome, StoreError> {
        let encoded = instance.to_json_pretty().map_err(|source| StoreError::Encode {
            id: instance.id.to_string(),
            source,
        })?;
        match self.records.get(&instance.id) {
            Some(existing) if *existing == encoded => {
                debug!(id = %instance.id, "identical instance already stored");
                Ok(PutOutcome::Unchanged)
            }
            Some(_) => {
                warn!(id = %instance.id, "refusing to overwrite instance");
                Err(StoreError::Conflict {
                    id: instance.id.to_string(),
                })
            }
            None => {
                self.records.insert(instance.id.clone(), encoded);
                Ok(PutOutcome::Written)
            }
        }
    }

    fn get(&self, id: &InstanceId) -> Result<Instance, StoreError> {
        let text = self
            .records
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        Instance::from_json(text).map_err(|source| StoreError::Decode {
            location: format!("memory:{id}"),
            source,
        })
    }

    fn contains(&self, id: &InstanceId) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(id))
    }

    fn ids(&self) -> Result<Vec<InstanceId>, StoreError> {
        Ok(self.records.keys().cloned().collect())
    }
}

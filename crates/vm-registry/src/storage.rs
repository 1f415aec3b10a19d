//! In-memory storage for started VMs

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Map from issued identifier to stored entity
///
/// `issue` holds the write guard for the whole generate-and-insert step, so
/// concurrent issuers never observe or hand out the same identifier.
#[derive(Debug)]
pub struct Registry<T> {
    entries: RwLock<HashMap<Uuid, T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> Registry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entity` under a freshly generated identifier and return it
    pub async fn issue(&self, entity: T) -> Uuid {
        let mut entries = self.entries.write().await;

        loop {
            let id = Uuid::new_v4();
            if let Entry::Vacant(slot) = entries.entry(id) {
                slot.insert(entity);
                debug!("Issued registry id {} ({} entries)", id, entries.len());
                return id;
            }
        }
    }

    /// Get a copy of the entity stored under `id`
    pub async fn lookup(&self, id: &Uuid) -> Option<T> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OsImage, VirtualMachine, VmRecord};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn test_vm() -> VirtualMachine {
        VirtualMachine {
            cpu_count: 4,
            mem_size_gb: 16,
            image: OsImage::DebianBookworm,
        }
    }

    #[tokio::test]
    async fn test_issue_and_lookup() {
        let registry: Registry<VmRecord> = Registry::new();
        assert!(registry.is_empty().await);

        let id = registry.issue(VmRecord::new(test_vm())).await;

        let record = registry.lookup(&id).await.expect("VM not found");
        assert_eq!(record.vm, test_vm());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_id() {
        let registry: Registry<VmRecord> = Registry::new();
        assert!(registry.lookup(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_version_4() {
        let registry = Registry::new();
        let id = registry.issue(test_vm()).await;
        assert_eq!(id.get_version_num(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issue_yields_distinct_ids() {
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.issue(test_vm()).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(registry.len().await, 64);
    }
}

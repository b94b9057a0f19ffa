use crate::store::{ReportStore, StoreError, StoredReport};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};

/// In-process single slot, for tests and ephemeral runs. Clones share
/// the slot, so a test can keep a handle while the controller owns one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<StoredReport>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Option<StoredReport>) -> R) -> R {
        let mut guard = match self.slot.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl ReportStore for MemoryStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<StoredReport>, StoreError>> {
        async move { Ok(self.with_slot(|slot| slot.clone())) }.boxed()
    }

    fn save(&self, report: StoredReport) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.with_slot(|slot| *slot = Some(report));
            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.with_slot(|slot| *slot = None);
            Ok(())
        }
        .boxed()
    }
}

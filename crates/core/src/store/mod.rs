mod json_file;
mod memory;

use crate::feedback::FeedbackReport;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// The persisted "latest result": the report plus the raw transcript it
/// was derived from. One slot, overwritten on every new analysis.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredReport {
    pub scenario_id: String,
    pub transcript: Option<String>,
    pub report: FeedbackReport,
    pub saved_at: SystemTime,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("report storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Single-slot repository for the latest report. Injected into the
/// session controller rather than living as ambient global state.
pub trait ReportStore: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Option<StoredReport>, StoreError>>;

    /// Overwrites whatever the slot held before. No history is kept.
    fn save(&self, report: StoredReport) -> BoxFuture<'_, Result<(), StoreError>>;

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

impl<T: ReportStore + ?Sized> ReportStore for Box<T> {
    fn load(&self) -> BoxFuture<'_, Result<Option<StoredReport>, StoreError>> {
        (**self).load()
    }

    fn save(&self, report: StoredReport) -> BoxFuture<'_, Result<(), StoreError>> {
        (**self).save(report)
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        (**self).clear()
    }
}

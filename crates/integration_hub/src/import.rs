//! Contact import job
//!
//! Pages through a provider's full contact set, upserting each contact into
//! the platform's contact repository. The loop rate-limits itself with a
//! fixed inter-page delay and honors cancellation at every page boundary,
//! so a caller-initiated timeout stops further third-party calls promptly.
//!
//! An aborted import never reports partial success: any failure or
//! cancellation mid-loop produces a failed result with zeroed counters and
//! the causing message.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use core_kernel::{PageRequest, PortError};
use domain_crm::{ContactRepository, Credentials, CrmAdapter, UpsertOutcome};

/// Tuning for the import loop.
///
/// The delay strategy is deliberately a fixed inter-page pause, not
/// adaptive backoff; only the duration is configurable.
#[derive(Debug, Clone, Copy)]
pub struct ImportConfig {
    /// Contacts requested per page
    pub page_size: u32,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            page_size: PageRequest::DEFAULT_PAGE_SIZE,
            page_delay: Duration::from_millis(100),
        }
    }
}

/// Result of a contact import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub success: bool,
    /// Contacts newly created in the platform store
    pub contacts_imported: u32,
    /// Contacts refreshed with newer provider data
    pub contacts_updated: u32,
    /// Contacts already up to date
    pub contacts_skipped: u32,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ImportResult {
    /// A successful import with the accumulated counters
    pub fn completed(counters: ImportCounters, duration: Duration) -> Self {
        Self {
            success: true,
            contacts_imported: counters.imported,
            contacts_updated: counters.updated,
            contacts_skipped: counters.skipped,
            duration,
            error: None,
        }
    }

    /// A failed import; counters are zeroed so an abort can never read as
    /// partial success
    pub fn failed(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            contacts_imported: 0,
            contacts_updated: 0,
            contacts_skipped: 0,
            duration,
            error: Some(error.into()),
        }
    }

    /// Elapsed time in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Total contacts the run touched
    pub fn total_processed(&self) -> u32 {
        self.contacts_imported + self.contacts_updated + self.contacts_skipped
    }
}

/// Counters accumulated across import pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounters {
    pub imported: u32,
    pub updated: u32,
    pub skipped: u32,
    pub pages: u32,
}

impl ImportCounters {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.imported += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Why an import run stopped early.
#[derive(Debug)]
pub(crate) enum ImportAbort {
    Cancelled,
    Failed(PortError),
}

impl ImportAbort {
    pub(crate) fn message(&self) -> String {
        match self {
            ImportAbort::Cancelled => "import cancelled".to_string(),
            ImportAbort::Failed(err) => err.to_string(),
        }
    }
}

impl From<PortError> for ImportAbort {
    fn from(err: PortError) -> Self {
        ImportAbort::Failed(err)
    }
}

/// Drains every contact page from the adapter into the repository.
///
/// Pagination starts at page 1 and continues while the provider reports
/// more pages. Cancellation is checked before each page request is issued.
pub(crate) async fn drain_contact_pages(
    adapter: &dyn CrmAdapter,
    repository: &dyn ContactRepository,
    credentials: &Credentials,
    config: ImportConfig,
    cancel: &CancellationToken,
) -> Result<ImportCounters, ImportAbort> {
    let mut counters = ImportCounters::default();
    let mut page = PageRequest::new(1, config.page_size);

    loop {
        if cancel.is_cancelled() {
            return Err(ImportAbort::Cancelled);
        }

        let result = adapter.get_contacts(credentials, page, None).await?;
        counters.pages += 1;
        debug!(
            crm = adapter.crm_id(),
            page = page.page,
            count = result.items.len(),
            "imported contact page"
        );

        for contact in &result.items {
            let outcome = repository.upsert(contact).await?;
            counters.record(outcome);
        }

        if !result.has_next_page() {
            return Ok(counters);
        }
        page = page.next();

        // Fixed inter-page pause so the import never hammers the provider;
        // wake early if the caller cancels.
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(config.page_delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_record_outcomes() {
        let mut counters = ImportCounters::default();
        counters.record(UpsertOutcome::Inserted);
        counters.record(UpsertOutcome::Inserted);
        counters.record(UpsertOutcome::Updated);
        counters.record(UpsertOutcome::Skipped);

        assert_eq!(counters.imported, 2);
        assert_eq!(counters.updated, 1);
        assert_eq!(counters.skipped, 1);
    }

    #[test]
    fn test_failed_result_zeroes_counters() {
        let result = ImportResult::failed("boom", Duration::from_millis(5));
        assert!(!result.success);
        assert_eq!(result.total_processed(), 0);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_completed_result() {
        let counters = ImportCounters {
            imported: 200,
            updated: 30,
            skipped: 10,
            pages: 3,
        };
        let result = ImportResult::completed(counters, Duration::from_secs(2));

        assert!(result.success);
        assert_eq!(result.contacts_imported, 200);
        assert_eq!(result.total_processed(), 240);
        assert_eq!(result.duration_ms(), 2000);
    }

    #[test]
    fn test_abort_messages() {
        assert_eq!(ImportAbort::Cancelled.message(), "import cancelled");

        let failed = ImportAbort::from(PortError::timeout("get_contacts"));
        assert!(failed.message().contains("get_contacts"));
    }
}

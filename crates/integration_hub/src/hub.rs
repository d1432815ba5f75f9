//! CRM Integration Hub
//!
//! The single entry point the rest of the platform uses to talk to CRM
//! systems. The hub owns a registry of provider adapters (resolved once at
//! construction, keyed case-insensitively by provider id) and routes
//! agent-scoped calls to whichever provider the agent has bound via the
//! credential store.
//!
//! # Error posture
//!
//! - "Agent has no CRM connected" is a normal steady state: lookups return
//!   `None` or empty collections, never errors.
//! - Activity logging and task creation are best-effort: a flaky provider
//!   must never block the user action that triggered them, so failures are
//!   logged and swallowed.
//! - User-facing reads (`find_contact_by_phone`, `search_properties`,
//!   `upcoming_inspections`) propagate provider failures so the caller can
//!   show an actionable error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use core_kernel::{AgentId, ImportJobId, PortError};
use domain_crm::{
    Activity, AgentCrmSettings, Contact, ConnectionResult, ContactRepository, CredentialStore,
    Credentials, CrmAdapter, Inspection, Property, Task,
};

use crate::import::{drain_contact_pages, ImportConfig, ImportResult};

/// Registry listing entry for one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub crm_id: String,
    pub display_name: String,
}

/// Central hub for CRM integrations.
///
/// Holds one adapter instance per provider plus the credential store and
/// contact repository collaborators. Cheap to share behind an `Arc`.
pub struct CrmIntegrationHub {
    adapters: HashMap<String, Arc<dyn CrmAdapter>>,
    credential_store: Arc<dyn CredentialStore>,
    contact_repository: Arc<dyn ContactRepository>,
    import_config: ImportConfig,
}

impl CrmIntegrationHub {
    /// Creates a hub over the given adapters and collaborators.
    ///
    /// Adapter ids are registered case-insensitively; a later adapter with
    /// the same id replaces an earlier one.
    pub fn new(
        adapters: Vec<Arc<dyn CrmAdapter>>,
        credential_store: Arc<dyn CredentialStore>,
        contact_repository: Arc<dyn ContactRepository>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.crm_id().to_ascii_lowercase(), adapter))
            .collect();

        Self {
            adapters,
            credential_store,
            contact_repository,
            import_config: ImportConfig::default(),
        }
    }

    /// Overrides the import tuning (page size, inter-page delay)
    pub fn with_import_config(mut self, import_config: ImportConfig) -> Self {
        self.import_config = import_config;
        self
    }

    /// Lists the registered adapters. Static data, no I/O.
    pub fn available_adapters(&self) -> Vec<AdapterInfo> {
        let mut infos: Vec<AdapterInfo> = self
            .adapters
            .values()
            .map(|adapter| AdapterInfo {
                crm_id: adapter.crm_id().to_string(),
                display_name: adapter.display_name().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.crm_id.cmp(&b.crm_id));
        infos
    }

    /// Tests credentials against a named provider.
    ///
    /// An unregistered provider id is a configuration error reported
    /// without any network call.
    pub async fn test_connection(
        &self,
        crm_id: &str,
        credentials: &Credentials,
    ) -> ConnectionResult {
        let Some(adapter) = self.adapter(crm_id) else {
            return ConnectionResult::failed(format!("Unknown CRM: {crm_id}"));
        };

        adapter.test_connection(credentials).await
    }

    /// Imports the agent's full contact set from the named provider.
    ///
    /// On success the `(agent, provider, credentials)` binding is persisted
    /// so subsequent calls only need the agent id. Any failure or
    /// cancellation mid-run aborts the whole import and reports failure
    /// with no partial counts.
    #[instrument(skip(self, credentials, cancel), fields(agent = %agent_id, crm = crm_id))]
    pub async fn import_contacts(
        &self,
        agent_id: AgentId,
        crm_id: &str,
        credentials: Credentials,
        cancel: CancellationToken,
    ) -> ImportResult {
        let started = Instant::now();
        let job_id = ImportJobId::new();

        let Some(adapter) = self.adapter(crm_id) else {
            return ImportResult::failed(format!("Unknown CRM: {crm_id}"), started.elapsed());
        };

        info!(%job_id, "starting CRM contact import");

        let drained = drain_contact_pages(
            adapter.as_ref(),
            self.contact_repository.as_ref(),
            &credentials,
            self.import_config,
            &cancel,
        )
        .await;

        let counters = match drained {
            Ok(counters) => counters,
            Err(abort) => {
                error!(%job_id, reason = %abort.message(), "CRM contact import aborted");
                return ImportResult::failed(abort.message(), started.elapsed());
            }
        };

        // Only a fully drained import earns a persisted binding.
        if let Err(err) = self
            .credential_store
            .save_connection(agent_id, adapter.crm_id(), credentials)
            .await
        {
            error!(%job_id, %err, "failed to persist CRM connection after import");
            return ImportResult::failed(err.to_string(), started.elapsed());
        }

        let duration = started.elapsed();
        info!(
            %job_id,
            imported = counters.imported,
            updated = counters.updated,
            skipped = counters.skipped,
            pages = counters.pages,
            duration_ms = duration.as_millis() as u64,
            "CRM contact import complete"
        );

        ImportResult::completed(counters, duration)
    }

    /// Finds a contact by phone number in the agent's bound CRM.
    ///
    /// Returns `Ok(None)` when the agent has no bound provider - being
    /// unconnected is not an error. Provider failures propagate.
    #[instrument(skip(self, phone), fields(agent = %agent_id))]
    pub async fn find_contact_by_phone(
        &self,
        agent_id: AgentId,
        phone: &str,
    ) -> Result<Option<Contact>, PortError> {
        let Some((adapter, settings)) = self.bound_adapter(agent_id).await? else {
            return Ok(None);
        };

        let contacts = adapter
            .search_contacts_by_phone(&settings.credentials, phone)
            .await?;
        Ok(contacts.into_iter().next())
    }

    /// Logs a call (or other activity) to the agent's bound CRM.
    ///
    /// Best-effort: never propagates failures, because a CRM outage must
    /// not block the user action (e.g. ending a call) that produced the
    /// activity.
    #[instrument(skip(self, activity), fields(agent = %agent_id))]
    pub async fn log_call(&self, agent_id: AgentId, activity: Activity) {
        let Some((adapter, settings)) = self.bound_adapter_best_effort(agent_id).await else {
            return;
        };

        match adapter.log_activity(&settings.credentials, &activity).await {
            Ok(activity_id) => {
                info!(crm = adapter.crm_id(), %activity_id, "logged call to CRM");
            }
            Err(err) => {
                error!(crm = adapter.crm_id(), %err, "failed to log call to CRM");
            }
        }
    }

    /// Creates a follow-up task in the agent's bound CRM.
    ///
    /// Best-effort, like `log_call`.
    #[instrument(skip(self, task), fields(agent = %agent_id))]
    pub async fn create_follow_up(&self, agent_id: AgentId, task: Task) {
        let Some((adapter, settings)) = self.bound_adapter_best_effort(agent_id).await else {
            return;
        };

        match adapter.create_task(&settings.credentials, &task).await {
            Ok(task_id) => {
                info!(crm = adapter.crm_id(), %task_id, "created follow-up task in CRM");
            }
            Err(err) => {
                error!(crm = adapter.crm_id(), %err, "failed to create follow-up task in CRM");
            }
        }
    }

    /// Searches listings by address in the agent's bound CRM.
    ///
    /// Returns an empty list when the agent has no bound provider.
    #[instrument(skip(self, address_query), fields(agent = %agent_id))]
    pub async fn search_properties(
        &self,
        agent_id: AgentId,
        address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        let Some((adapter, settings)) = self.bound_adapter(agent_id).await? else {
            return Ok(Vec::new());
        };

        adapter
            .search_properties_by_address(&settings.credentials, address_query)
            .await
    }

    /// Gets the agent's upcoming inspections from their bound CRM.
    ///
    /// Returns an empty list when the agent has no bound provider. The
    /// stored provider-native agent id, when known, scopes the query.
    #[instrument(skip(self), fields(agent = %agent_id))]
    pub async fn upcoming_inspections(
        &self,
        agent_id: AgentId,
    ) -> Result<Vec<Inspection>, PortError> {
        let Some((adapter, settings)) = self.bound_adapter(agent_id).await? else {
            return Ok(Vec::new());
        };

        adapter
            .upcoming_inspections(&settings.credentials, settings.crm_agent_id.as_deref())
            .await
    }

    /// Removes the agent's CRM binding. Idempotent.
    #[instrument(skip(self), fields(agent = %agent_id))]
    pub async fn disconnect(&self, agent_id: AgentId) -> Result<(), PortError> {
        self.credential_store.delete_connection(agent_id).await
    }

    fn adapter(&self, crm_id: &str) -> Option<Arc<dyn CrmAdapter>> {
        self.adapters.get(&crm_id.to_ascii_lowercase()).cloned()
    }

    /// Resolves the agent's bound adapter and settings.
    ///
    /// `Ok(None)` covers both "no binding" and "binding points at an
    /// unregistered adapter" - the latter is logged since it means a
    /// provider was removed while bindings still reference it.
    async fn bound_adapter(
        &self,
        agent_id: AgentId,
    ) -> Result<Option<(Arc<dyn CrmAdapter>, AgentCrmSettings)>, PortError> {
        let Some(settings) = self.credential_store.get_connection(agent_id).await? else {
            warn!(agent = %agent_id, "no CRM connection for agent");
            return Ok(None);
        };

        match self.adapter(&settings.crm_id) {
            Some(adapter) => Ok(Some((adapter, settings))),
            None => {
                warn!(
                    agent = %agent_id,
                    crm = %settings.crm_id,
                    "agent bound to unregistered CRM adapter"
                );
                Ok(None)
            }
        }
    }

    /// Like `bound_adapter` but swallows store failures, for best-effort
    /// flows that must never error.
    async fn bound_adapter_best_effort(
        &self,
        agent_id: AgentId,
    ) -> Option<(Arc<dyn CrmAdapter>, AgentCrmSettings)> {
        match self.bound_adapter(agent_id).await {
            Ok(found) => found,
            Err(err) => {
                error!(agent = %agent_id, %err, "credential store lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::InMemoryCredentialStore;
    use domain_crm::ports::mock::MockCrmAdapter;
    use test_utils::RecordingContactRepository;

    fn hub_with_mock() -> CrmIntegrationHub {
        CrmIntegrationHub::new(
            vec![Arc::new(MockCrmAdapter::new())],
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(RecordingContactRepository::new()),
        )
    }

    #[test]
    fn test_available_adapters_lists_registry() {
        let hub = hub_with_mock();
        let adapters = hub.available_adapters();

        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].crm_id, "mock");
        assert_eq!(adapters[0].display_name, "Mock CRM");
    }

    #[test]
    fn test_adapter_lookup_is_case_insensitive() {
        let hub = hub_with_mock();
        assert!(hub.adapter("MOCK").is_some());
        assert!(hub.adapter("Mock").is_some());
        assert!(hub.adapter("other").is_none());
    }

    #[tokio::test]
    async fn test_unknown_crm_reported_without_network() {
        let hub = hub_with_mock();
        let credentials = Credentials::new(AgentId::new());

        let result = hub.test_connection("unknown-provider", &credentials).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Unknown CRM: unknown-provider")
        );
    }
}

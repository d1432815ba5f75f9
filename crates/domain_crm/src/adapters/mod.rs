//! Provider adapters
//!
//! One module per CRM provider, each implementing `CrmAdapter` against that
//! provider's REST API. Adapters own everything provider-specific: wire
//! DTOs, pagination translation, status vocabularies, and authentication.
//! Nothing provider-specific escapes this boundary - only the normalized
//! model crosses it.
//!
//! Every adapter holds one long-lived `reqwest::Client`, injected at
//! construction and shared across calls.

mod http;

pub mod agentbox;
pub mod rex;
pub mod vaultre;

pub use agentbox::AgentBoxAdapter;
pub use rex::RexAdapter;
pub use vaultre::VaultReAdapter;

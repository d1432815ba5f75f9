//! Core Kernel - Foundational types for the CRM integration platform
//!
//! This crate provides the fundamental building blocks used by the domain
//! and hub layers:
//! - Strongly-typed identifiers for platform entities
//! - Pagination primitives shared by every provider adapter
//! - The unified `PortError` taxonomy for port implementations

pub mod identifiers;
pub mod paging;
pub mod ports;

pub use identifiers::{AgentId, ImportJobId};
pub use paging::{PageRequest, PagedResult};
pub use ports::{DomainPort, PortError};

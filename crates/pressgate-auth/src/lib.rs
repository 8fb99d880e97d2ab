//! # Pressgate Auth
//!
//! Authentication building blocks for the Pressgate request pipeline:
//!
//! - **Credential hashing**: deterministic digest of machine API keys
//! - **API key validation**: lookup, active/expiry checks, async last-used bump
//! - **Tenant resolution**: cached subdomain/domain/id resolution with status checks
//! - **JWT sessions**: access/refresh issuance, verification, revocation
//! - **Permissions**: capability checks with role-default fallback
//!
//! ## Failure policy
//!
//! Credential validation and tenant resolution are **fail-closed**: a store
//! failure here propagates as [`pressgate_types::InfrastructureError`] and the
//! request is denied. Asynchronous side effects (last-used bumps) are
//! fail-open and never surface on the request path.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// API key validation
pub mod api_key;
/// Deterministic credential hashing and key minting
pub mod credential;
/// Tenant resolution with a read-through cache
pub mod directory;
/// Capability checks and verb-to-capability mapping
pub mod permission;
/// Token revocation set
pub mod revocation;
/// JWT session issuance, verification and refresh
pub mod session;

pub use api_key::ApiKeyValidator;
pub use credential::{generate_api_key, hash_api_key};
pub use directory::{TenantDirectory, TenantSignal};
pub use permission::{authorize, method_capability, require, OwnershipCheck};
pub use revocation::RevocationSet;
pub use session::{SessionConfig, SessionService};

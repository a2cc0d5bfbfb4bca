//! # dbfed-federation
//!
//! User federation from a relational database.
//!
//! [`DbUserStorageProvider`] exposes users stored in an arbitrary SQL schema
//! to the identity host: lookup, search and paging, counting, password
//! validation and update, and minimal user creation and removal. Before a
//! password is checked for a cached user, the provider decides whether the
//! cached snapshot is still fresh and invalidates it when the database has
//! moved on (see [`reconcile`]).
//!
//! ## Security
//!
//! - Presented passwords travel as [`secrecy::SecretString`] and are never
//!   logged
//! - Stored hashes never leave the repository

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credential;
pub mod error;
pub mod host;
pub mod mapper;
pub mod provider;
pub mod reconcile;

pub use config::ProviderConfig;
pub use credential::{CredentialInput, CredentialKind};
pub use error::{FederationError, FederationResult};
pub use host::{CachedIdentity, GroupRef, HostUser, RealmContext, RoleRef, StorageId};
pub use mapper::{FederatedUser, IdentityMapper};
pub use provider::{CredentialValidator, DbUserStorageProvider, UserCountQuery, UserStorageProvider};
pub use reconcile::{FRESHNESS_THRESHOLD, ReconcileOutcome, ReconciliationPolicy};

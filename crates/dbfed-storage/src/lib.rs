//! # dbfed-storage
//!
//! Directory storage abstractions for database user federation.
//!
//! This crate defines the repository interface that concrete directory
//! backends (see `dbfed-storage-sql`) implement, together with the value
//! types that cross it.
//!
//! ## Types
//!
//! - [`IdentityRecord`] - Schema-flexible attribute map for one directory user
//! - [`PagingWindow`] - Offset/limit window for paged searches
//! - [`DirectoryRepository`] - Lookup, search, credential and write operations

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod paging;
pub mod record;

pub use directory::DirectoryRepository;
pub use error::{StorageError, StorageResult};
pub use paging::PagingWindow;
pub use record::IdentityRecord;

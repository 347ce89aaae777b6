//! Repository chain for stowage.
//!
//! A [`CachedRepository`] sits in front of a terminal store such as
//! [`LocalRepository`]: fetches are memoized by [`Query::signature`] and
//! bounded by the configured timeout, saves pass straight through.

pub mod cache;
pub mod context;
pub mod error;
pub mod local;
pub mod query;
pub mod repository;

pub use cache::ResultCache;
pub use context::{open_local, Context};
pub use error::{StowageError, StowageResult};
pub use local::LocalRepository;
pub use query::Query;
pub use repository::{CachedRepository, Repository};
pub use tokio_util::sync::CancellationToken;

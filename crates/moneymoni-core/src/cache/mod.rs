//! In-memory query cache for fetched resources.
//!
//! Pages read from here while a refetch is in flight; everything in it is
//! dropped on logout.

mod query;

pub use query::{CachedData, QueryCache};

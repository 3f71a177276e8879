//! Query domain module.
//!
//! Key, policy and result types shared by the resource cache and its
//! consumers. The cache itself lives in the application layer.

mod key;
mod policy;
mod result;

pub use key::{KeyFilter, KeySegment, QueryKey};
pub use policy::{DEFAULT_STALE_AFTER, QueryPolicy};
pub use result::{CachedResult, QueryStatus};

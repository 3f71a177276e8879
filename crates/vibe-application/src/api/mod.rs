//! Typed resource API over the query cache.

mod dashboard;
pub(crate) mod fetch;

pub use dashboard::DashboardApi;

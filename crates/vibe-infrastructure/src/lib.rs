//! Concrete collaborators for the Vibe synchronization layer: the reqwest
//! transport and configuration loading.

pub mod config_service;
pub mod http_transport;
pub mod paths;

pub use config_service::ConfigService;
pub use http_transport::HttpTransport;
pub use paths::VibePaths;

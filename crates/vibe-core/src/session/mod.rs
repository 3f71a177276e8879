//! Session domain module.
//!
//! Authentication state, identity and the wire shapes of the session
//! endpoints. The state machine itself lives in the application layer.

mod model;

pub use model::{AuthState, Identity, LoginRequest, SessionSnapshot, SessionStatus};

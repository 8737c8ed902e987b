//! Gatehouse Auth — password verification, session token
//! issuance/validation with the liveness fast path, and the
//! authorization gate.

pub mod authz;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{SessionOutput, SessionProfile, SessionService};
pub use token::SessionClaims;

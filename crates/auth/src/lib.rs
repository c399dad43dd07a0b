//! `clinic-auth`: authentication boundary and session state.
//!
//! This crate is intentionally decoupled from HTTP: the auth service is
//! reached through the [`AuthService`] trait, implemented in `clinic-infra`.

pub mod claims;
pub mod events;
pub mod principal;
pub mod service;
pub mod session;

pub use claims::{AuthSession, TokenValidationError, validate_session};
pub use events::{AuthEvent, AuthEventKind};
pub use principal::{Credentials, Principal};
pub use service::{AuthError, AuthService};
pub use session::{AuthFailure, SessionSnapshot, SessionState, SessionSubscription};

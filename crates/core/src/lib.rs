//! `clinic-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, the clock abstraction and the
//! timestamp wire format shared by every record type.

pub mod clock;
pub mod error;
pub mod id;
pub mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{EvolutionId, PatientId, UserId};

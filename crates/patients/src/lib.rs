//! `clinic-patients`: patient records and progress notes ("evolutions").
//!
//! Records are persisted by the backend service; this crate defines their wire
//! shape and the deterministic rules the views derive from them.

pub mod evolution;
pub mod patient;
pub mod stats;

pub use evolution::{
    Evolution, EvolutionDraft, EvolutionUpdate, NewEvolution, insert_into_timeline, sort_timeline,
};
pub use patient::{NewPatient, Patient, PatientDraft, PatientUpdate, age_on, filter_by_name};
pub use stats::{RECENT_WINDOW_DAYS, count_recent};

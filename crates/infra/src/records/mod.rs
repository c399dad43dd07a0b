//! Typed record access over a [`DataService`].
//!
//! Views talk to these instead of raw JSON rows.

mod evolutions;
mod patients;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{BackendResult, DataService};

pub use evolutions::EvolutionRecords;
pub use patients::PatientRecords;

/// Both record collections over one data service.
#[derive(Clone)]
pub struct Records {
    pub patients: PatientRecords,
    pub evolutions: EvolutionRecords,
}

impl Records {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self {
            patients: PatientRecords::new(data.clone()),
            evolutions: EvolutionRecords::new(data),
        }
    }
}

fn to_row<T: Serialize>(value: &T) -> BackendResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn from_row<T: DeserializeOwned>(row: Value) -> BackendResult<T> {
    Ok(serde_json::from_value(row)?)
}

fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> BackendResult<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}

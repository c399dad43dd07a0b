use std::sync::Arc;

use clinic_core::{EvolutionId, PatientId};
use clinic_patients::{Evolution, EvolutionUpdate, NewEvolution};

use crate::{BackendResult, DataService, EVOLUTIONS_TABLE, Filter, Order, Select};

use super::{from_row, from_rows, to_row};

/// Progress-note collection access.
#[derive(Clone)]
pub struct EvolutionRecords {
    data: Arc<dyn DataService>,
}

impl EvolutionRecords {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }

    /// A patient's notes, newest date first.
    pub async fn list_by_patient(&self, patient_id: PatientId) -> BackendResult<Vec<Evolution>> {
        let query = Select::from(EVOLUTIONS_TABLE)
            .eq("paciente_id", patient_id)
            .order(Order::desc("data"));
        let rows = self.data.select(&query).await.inspect_err(|err| {
            tracing::warn!(table = EVOLUTIONS_TABLE, op = "list", %patient_id, error = %err, "evolution query failed");
        })?;
        from_rows(rows)
    }

    pub async fn create(&self, evolution: &NewEvolution) -> BackendResult<Evolution> {
        let row = self
            .data
            .insert(EVOLUTIONS_TABLE, to_row(evolution)?)
            .await
            .inspect_err(|err| {
                tracing::warn!(table = EVOLUTIONS_TABLE, op = "create", error = %err, "evolution insert failed");
            })?;
        let created: Evolution = from_row(row)?;
        tracing::info!(evolution_id = %created.id, patient_id = %created.patient_id, "evolution added");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: EvolutionId,
        changes: &EvolutionUpdate,
    ) -> BackendResult<Evolution> {
        let row = self
            .data
            .update(EVOLUTIONS_TABLE, &Filter::eq("id", id), to_row(changes)?)
            .await
            .inspect_err(|err| {
                tracing::warn!(table = EVOLUTIONS_TABLE, op = "update", %id, error = %err, "evolution update failed");
            })?;
        from_row(row)
    }

    pub async fn delete(&self, id: EvolutionId) -> BackendResult<()> {
        self.data
            .delete(EVOLUTIONS_TABLE, &Filter::eq("id", id))
            .await
            .inspect_err(|err| {
                tracing::warn!(table = EVOLUTIONS_TABLE, op = "delete", %id, error = %err, "evolution delete failed");
            })
    }
}

use std::sync::Arc;

use clinic_core::PatientId;
use clinic_patients::{NewPatient, Patient, PatientUpdate};

use crate::{BackendResult, DataService, Filter, Order, PATIENTS_TABLE, Select};

use super::{from_row, from_rows, to_row};

/// Patient collection access.
#[derive(Clone)]
pub struct PatientRecords {
    data: Arc<dyn DataService>,
}

impl PatientRecords {
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }

    /// Every patient, ordered by name ascending.
    pub async fn list_all(&self) -> BackendResult<Vec<Patient>> {
        let query = Select::from(PATIENTS_TABLE).order(Order::asc("nome"));
        let rows = self.data.select(&query).await.inspect_err(|err| {
            tracing::warn!(table = PATIENTS_TABLE, op = "list", error = %err, "patient query failed");
        })?;
        from_rows(rows)
    }

    /// One patient. A missing id is [`crate::BackendError::NotFound`].
    pub async fn get_by_id(&self, id: PatientId) -> BackendResult<Patient> {
        let query = Select::from(PATIENTS_TABLE).eq("id", id);
        let row = self.data.select_single(&query).await.inspect_err(|err| {
            if !err.is_not_found() {
                tracing::warn!(table = PATIENTS_TABLE, op = "get", %id, error = %err, "patient query failed");
            }
        })?;
        from_row(row)
    }

    pub async fn create(&self, patient: &NewPatient) -> BackendResult<Patient> {
        let row = self
            .data
            .insert(PATIENTS_TABLE, to_row(patient)?)
            .await
            .inspect_err(|err| {
                tracing::warn!(table = PATIENTS_TABLE, op = "create", error = %err, "patient insert failed");
            })?;
        let created: Patient = from_row(row)?;
        tracing::info!(patient_id = %created.id, "patient created");
        Ok(created)
    }

    pub async fn update(&self, id: PatientId, changes: &PatientUpdate) -> BackendResult<Patient> {
        let row = self
            .data
            .update(PATIENTS_TABLE, &Filter::eq("id", id), to_row(changes)?)
            .await
            .inspect_err(|err| {
                tracing::warn!(table = PATIENTS_TABLE, op = "update", %id, error = %err, "patient update failed");
            })?;
        from_row(row)
    }

    pub async fn delete(&self, id: PatientId) -> BackendResult<()> {
        self.data
            .delete(PATIENTS_TABLE, &Filter::eq("id", id))
            .await
            .inspect_err(|err| {
                tracing::warn!(table = PATIENTS_TABLE, op = "delete", %id, error = %err, "patient delete failed");
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendError, InMemoryBackend};
    use chrono::NaiveDate;

    fn records() -> (Arc<InMemoryBackend>, PatientRecords) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), PatientRecords::new(backend))
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(2016, 5, 20).unwrap(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn created_patients_come_back_sorted_by_name() {
        let (_, records) = records();
        for name in ["Marina", "Caio", "Lia"] {
            records.create(&new_patient(name)).await.unwrap();
        }
        let names: Vec<_> = records
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Caio", "Lia", "Marina"]);
    }

    #[tokio::test]
    async fn get_by_id_round_trips_and_reports_missing() {
        let (_, records) = records();
        let created = records.create(&new_patient("Caio")).await.unwrap();
        assert_eq!(records.get_by_id(created.id).await.unwrap(), created);

        let err = records.get_by_id(PatientId::new()).await.unwrap_err();
        assert_eq!(err, BackendError::NotFound);
    }

    #[tokio::test]
    async fn update_can_clear_notes() {
        let (_, records) = records();
        let mut input = new_patient("Caio");
        input.notes = Some("alergia a amendoim".to_string());
        let created = records.create(&input).await.unwrap();

        let changes = PatientUpdate {
            notes: Some(None),
            ..Default::default()
        };
        let updated = records.update(created.id, &changes).await.unwrap();
        assert_eq!(updated.notes, None);
        assert_eq!(updated.name, "Caio");
    }

    #[tokio::test]
    async fn delete_removes_the_patient() {
        let (backend, records) = records();
        let created = records.create(&new_patient("Caio")).await.unwrap();
        records.delete(created.id).await.unwrap();
        assert!(backend.rows(PATIENTS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let (backend, records) = records();
        backend.set_unreachable(true);
        assert!(matches!(
            records.list_all().await,
            Err(BackendError::Network(_))
        ));
    }
}

use std::sync::{Arc, RwLock};
use std::time::Duration;

use clinic_core::{Clock, DomainError};
use clinic_infra::PatientRecords;
use clinic_patients::{Patient, PatientDraft};

use super::{InFlight, SubmitError, read, write};
use crate::{Navigator, Route};

pub const CREATE_FAILED: &str = "Erro ao cadastrar paciente. Tente novamente.";
pub const CREATED: &str = "Paciente Cadastrado com Sucesso!";

/// Pause between the success message and the list.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFormState {
    pub draft: PatientDraft,
    pub error: Option<String>,
    pub success: bool,
}

pub struct PatientFormView {
    patients: PatientRecords,
    clock: Arc<dyn Clock>,
    navigator: Navigator,
    state: RwLock<PatientFormState>,
    saving: InFlight,
}

impl PatientFormView {
    pub fn new(patients: PatientRecords, clock: Arc<dyn Clock>, navigator: Navigator) -> Self {
        Self {
            patients,
            clock,
            navigator,
            state: RwLock::new(PatientFormState::default()),
            saving: InFlight::default(),
        }
    }

    pub fn state(&self) -> PatientFormState {
        read(&self.state).clone()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_set()
    }

    pub fn set_name(&self, name: &str) {
        write(&self.state).draft.name = name.to_string();
    }

    /// `YYYY-MM-DD`.
    pub fn set_birth_date(&self, birth_date: &str) {
        write(&self.state).draft.birth_date = birth_date.to_string();
    }

    pub fn set_notes(&self, notes: &str) {
        write(&self.state).draft.notes = notes.to_string();
    }

    /// Validate, create, then schedule the move to the patient list.
    ///
    /// Validation failures never reach the backend.
    pub async fn submit(&self) -> Result<Patient, SubmitError> {
        let _saving = self.saving.try_begin().ok_or(SubmitError::Busy)?;

        let new_patient = {
            let mut state = write(&self.state);
            state.error = None;
            state.success = false;
            match state.draft.validate(self.clock.today()) {
                Ok(new_patient) => new_patient,
                Err(err) => {
                    let message = match err {
                        DomainError::Validation(message) => message,
                        other => other.user_message(),
                    };
                    state.error = Some(message.clone());
                    return Err(SubmitError::Invalid(message));
                }
            }
        };

        match self.patients.create(&new_patient).await {
            Ok(created) => {
                {
                    let mut state = write(&self.state);
                    state.draft = PatientDraft::default();
                    state.success = true;
                }
                self.navigator.navigate_after(REDIRECT_DELAY, Route::Patients);
                Ok(created)
            }
            Err(err) => {
                tracing::warn!(error = %err, "patient creation failed");
                write(&self.state).error = Some(CREATE_FAILED.to_string());
                Err(SubmitError::Failed(CREATE_FAILED.to_string()))
            }
        }
    }

    pub fn render(&self) -> String {
        let state = self.state();
        if state.success {
            return format!(
                "{CREATED}\n\
                 O paciente foi adicionado ao sistema e você será redirecionado para a lista de pacientes.\n"
            );
        }

        let mut out = String::from("Cadastrar Novo Paciente\n");
        out.push_str("Preencha as informações do paciente para adicioná-lo ao sistema.\n\n");
        if let Some(error) = &state.error {
            out.push_str(&format!("! {error}\n\n"));
        }
        out.push_str(&format!("Nome Completo *: {}\n", state.draft.name));
        out.push_str(&format!("Data de Nascimento *: {}\n", state.draft.birth_date));
        out.push_str(&format!("Observações: {}\n", state.draft.notes));
        out.push_str(if self.is_saving() {
            "\nSalvando...\n"
        } else {
            "\n[Cadastrar Paciente]\n"
        });
        out
    }
}

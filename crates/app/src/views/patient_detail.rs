//! Patient detail page and the "add evolution" dialog.

use std::sync::{Arc, RwLock};

use chrono::NaiveDate;

use clinic_core::{Clock, DomainError, PatientId};
use clinic_infra::{BackendError, Records};
use clinic_patients::{Evolution, EvolutionDraft, Patient, insert_into_timeline, sort_timeline};

use super::{
    InFlight, SubmitError, format_date, format_local_date, format_local_date_time, read, write,
};

pub const LOAD_FAILED: &str = "Erro ao carregar dados do paciente";
pub const NOT_FOUND: &str = "Paciente não encontrado";
pub const ADD_FAILED: &str = "Erro ao adicionar evolução";
pub const DATE_INVALID: &str = "Data inválida";

/// Open "add evolution" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionDialog {
    pub draft: EvolutionDraft,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientDetailState {
    pub patient: Option<Patient>,
    /// Newest note date first.
    pub timeline: Vec<Evolution>,
    pub loaded: bool,
    pub error: Option<String>,
    pub dialog: Option<EvolutionDialog>,
}

pub struct PatientDetailView {
    patient_id: PatientId,
    records: Records,
    clock: Arc<dyn Clock>,
    state: RwLock<PatientDetailState>,
    loading: InFlight,
    saving: InFlight,
}

impl PatientDetailView {
    pub fn new(patient_id: PatientId, records: Records, clock: Arc<dyn Clock>) -> Self {
        Self {
            patient_id,
            records,
            clock,
            state: RwLock::new(PatientDetailState::default()),
            loading: InFlight::default(),
            saving: InFlight::default(),
        }
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn state(&self) -> PatientDetailState {
        read(&self.state).clone()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_set()
    }

    /// Load the patient, then their timeline.
    pub async fn load(&self) {
        let Some(_loading) = self.loading.try_begin() else {
            return;
        };

        let result = self.fetch().await;
        let mut state = write(&self.state);
        match result {
            Ok((patient, timeline)) => {
                state.patient = Some(patient);
                state.timeline = timeline;
                state.error = None;
            }
            Err(BackendError::NotFound) => {
                tracing::info!(patient_id = %self.patient_id, "patient not found");
                state.patient = None;
            }
            Err(err) => {
                tracing::warn!(patient_id = %self.patient_id, error = %err, "patient detail failed");
                state.patient = None;
                state.error = Some(LOAD_FAILED.to_string());
            }
        }
        state.loaded = true;
    }

    async fn fetch(&self) -> Result<(Patient, Vec<Evolution>), BackendError> {
        let patient = self.records.patients.get_by_id(self.patient_id).await?;
        let mut timeline = self
            .records
            .evolutions
            .list_by_patient(self.patient_id)
            .await?;
        sort_timeline(&mut timeline);
        Ok((patient, timeline))
    }

    /// Open the dialog with an empty draft dated today.
    pub fn open_dialog(&self) {
        let today = self.clock.today();
        write(&self.state).dialog = Some(EvolutionDialog {
            draft: EvolutionDraft::for_today(today),
            error: None,
        });
    }

    pub fn close_dialog(&self) {
        if self.is_saving() {
            return;
        }
        write(&self.state).dialog = None;
    }

    /// `YYYY-MM-DD`. Opens the dialog if needed.
    pub fn set_evolution_date(&self, raw: &str) -> Result<(), SubmitError> {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| SubmitError::Invalid(DATE_INVALID.to_string()))?;
        self.edit_draft(|draft| draft.date = date);
        Ok(())
    }

    pub fn set_evolution_description(&self, description: &str) {
        self.edit_draft(|draft| draft.description = description.to_string());
    }

    fn edit_draft(&self, edit: impl FnOnce(&mut EvolutionDraft)) {
        let today = self.clock.today();
        let mut state = write(&self.state);
        let dialog = state.dialog.get_or_insert_with(|| EvolutionDialog {
            draft: EvolutionDraft::for_today(today),
            error: None,
        });
        edit(&mut dialog.draft);
    }

    /// Save the dialog's note. On success the note joins the timeline and the
    /// dialog closes.
    pub async fn submit_evolution(&self) -> Result<Evolution, SubmitError> {
        let _saving = self.saving.try_begin().ok_or(SubmitError::Busy)?;

        let new_evolution = {
            let today = self.clock.today();
            let mut state = write(&self.state);
            let dialog = state.dialog.get_or_insert_with(|| EvolutionDialog {
                draft: EvolutionDraft::for_today(today),
                error: None,
            });
            dialog.error = None;
            match dialog.draft.validate(self.patient_id) {
                Ok(new_evolution) => new_evolution,
                Err(err) => {
                    let message = match err {
                        DomainError::Validation(message) => message,
                        other => other.user_message(),
                    };
                    dialog.error = Some(message.clone());
                    return Err(SubmitError::Invalid(message));
                }
            }
        };

        match self.records.evolutions.create(&new_evolution).await {
            Ok(created) => {
                let mut state = write(&self.state);
                insert_into_timeline(&mut state.timeline, created.clone());
                state.dialog = None;
                state.error = None;
                Ok(created)
            }
            Err(err) => {
                tracing::warn!(patient_id = %self.patient_id, error = %err, "evolution creation failed");
                write(&self.state).error = Some(ADD_FAILED.to_string());
                Err(SubmitError::Failed(ADD_FAILED.to_string()))
            }
        }
    }

    pub fn render(&self) -> String {
        let state = self.state();
        if !state.loaded {
            return "Carregando dados do paciente...\n".to_string();
        }

        let mut out = String::new();
        if let Some(error) = &state.error {
            out.push_str(&format!("! {error}\n\n"));
        }
        let Some(patient) = &state.patient else {
            out.push_str(&format!(
                "{NOT_FOUND}\nO paciente solicitado não foi encontrado.\n[Voltar para Lista] -> go /pacientes\n"
            ));
            return out;
        };

        let today = self.clock.today();
        out.push_str(&format!("{}\n", patient.name));
        out.push_str("Detalhes do paciente e histórico de evoluções\n\n");
        out.push_str("Informações do Paciente\n");
        out.push_str(&format!("  Nome Completo: {}\n", patient.name));
        out.push_str(&format!("  Idade: {} anos\n", patient.age_on(today)));
        out.push_str(&format!(
            "  Data de Nascimento: {}\n",
            format_date(patient.birth_date)
        ));
        out.push_str(&format!(
            "  Cadastrado em: {}\n",
            format_local_date(patient.created_at)
        ));
        if let Some(notes) = &patient.notes {
            out.push_str(&format!("  Observações: {notes}\n"));
        }

        out.push_str(&format!(
            "\nHistórico de Evoluções ({} registros)\n",
            state.timeline.len()
        ));
        if state.timeline.is_empty() {
            out.push_str("  Nenhuma evolução registrada\n");
        }
        for evolution in &state.timeline {
            out.push_str(&format!(
                "  {}  (registrada {})\n",
                format_date(evolution.date),
                format_local_date_time(evolution.created_at)
            ));
            for line in evolution.description.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }

        if let Some(dialog) = &state.dialog {
            out.push_str(&format!("\nNova Evolução para {}\n", patient.name));
            if let Some(error) = &dialog.error {
                out.push_str(&format!("  ! {error}\n"));
            }
            out.push_str(&format!("  Data: {}\n", dialog.draft.date.format("%Y-%m-%d")));
            out.push_str(&format!("  Descrição: {}\n", dialog.draft.description));
            out.push_str(if self.is_saving() {
                "  Salvando...\n"
            } else {
                "  [Salvar] [Cancelar]\n"
            });
        }
        out
    }
}

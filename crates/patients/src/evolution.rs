use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, DomainResult, EvolutionId, PatientId};

pub const DESCRIPTION_REQUIRED: &str = "Descrição da evolução é obrigatória";

/// A dated progress note, stored in the `evolucao` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evolution {
    pub id: EvolutionId,
    #[serde(rename = "paciente_id")]
    pub patient_id: PatientId,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "criado_em", with = "clinic_core::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvolution {
    #[serde(rename = "paciente_id")]
    pub patient_id: PatientId,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "descricao")]
    pub description: String,
}

/// Partial update for a note; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionUpdate {
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Input of the "add evolution" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionDraft {
    pub date: NaiveDate,
    pub description: String,
}

impl EvolutionDraft {
    /// Empty draft dated `today`.
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            date: today,
            description: String::new(),
        }
    }

    pub fn validate(&self, patient_id: PatientId) -> DomainResult<NewEvolution> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(DomainError::validation(DESCRIPTION_REQUIRED));
        }
        Ok(NewEvolution {
            patient_id,
            date: self.date,
            description: description.to_string(),
        })
    }
}

/// Order a timeline by note date, newest first.
///
/// The sort is stable: notes sharing a date keep their relative order.
pub fn sort_timeline(timeline: &mut [Evolution]) {
    timeline.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Add a freshly created note to an already ordered timeline.
///
/// The note goes before any existing note with the same date.
pub fn insert_into_timeline(timeline: &mut Vec<Evolution>, evolution: Evolution) {
    let at = timeline
        .iter()
        .position(|e| e.date <= evolution.date)
        .unwrap_or(timeline.len());
    timeline.insert(at, evolution);
}

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, DomainResult, PatientId};

pub const NAME_REQUIRED: &str = "Nome é obrigatório";
pub const BIRTH_DATE_REQUIRED: &str = "Data de nascimento é obrigatória";
pub const BIRTH_DATE_INVALID: &str = "Data de nascimento inválida";
pub const BIRTH_DATE_IN_FUTURE: &str = "Data de nascimento não pode ser futura";

/// A patient record as stored in the `paciente` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "data_nascimento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    #[serde(rename = "criado_em", with = "clinic_core::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Age in complete calendar years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.birth_date, today)
    }

    /// Case-insensitive substring match of `term` against the name.
    ///
    /// Callers are expected to short-circuit blank terms (see [`filter_by_name`]).
    pub fn matches_name(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Insert payload for a new patient. The backend assigns `id` and `criado_em`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "data_nascimento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
}

/// Partial update for a patient; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "data_nascimento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    /// `Some(None)` clears the notes.
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

/// Raw creation-form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientDraft {
    pub name: String,
    /// `YYYY-MM-DD`, empty when not filled in.
    pub birth_date: String,
    pub notes: String,
}

impl PatientDraft {
    /// Validate the draft against `today` and build the insert payload.
    ///
    /// Rules are checked in order and the first failure is returned. Today's
    /// date is an accepted birth date.
    pub fn validate(&self, today: NaiveDate) -> DomainResult<NewPatient> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation(NAME_REQUIRED));
        }

        let raw_birth = self.birth_date.trim();
        if raw_birth.is_empty() {
            return Err(DomainError::validation(BIRTH_DATE_REQUIRED));
        }

        let birth_date = NaiveDate::parse_from_str(raw_birth, "%Y-%m-%d")
            .map_err(|_| DomainError::validation(BIRTH_DATE_INVALID))?;
        if birth_date > today {
            return Err(DomainError::validation(BIRTH_DATE_IN_FUTURE));
        }

        let notes = self.notes.trim();
        Ok(NewPatient {
            name: name.to_string(),
            birth_date,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

/// Age in complete calendar years.
///
/// One year is subtracted while today's (month, day) still precedes the birth
/// (month, day), so someone born on 29 February turns a year older on
/// 1 March in non-leap years.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Patients whose name contains `term`, case-insensitively, in input order.
///
/// A blank term returns every patient.
pub fn filter_by_name(patients: &[Patient], term: &str) -> Vec<Patient> {
    if term.trim().is_empty() {
        return patients.to_vec();
    }
    patients
        .iter()
        .filter(|p| p.matches_name(term))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patient(name: &str) -> Patient {
        Patient {
            id: PatientId::new(),
            name: name.to_string(),
            birth_date: date(1990, 6, 15),
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn age_respects_month_and_day_boundaries() {
        let birth = date(2000, 3, 1);
        assert_eq!(age_on(birth, date(2024, 2, 29)), 23);
        assert_eq!(age_on(birth, date(2024, 3, 1)), 24);
        assert_eq!(age_on(birth, date(2024, 2, 28)), 23);
        assert_eq!(age_on(birth, date(2000, 3, 1)), 0);
    }

    #[test]
    fn leap_day_birthdays_advance_on_first_of_march() {
        let birth = date(2000, 2, 29);
        assert_eq!(age_on(birth, date(2023, 2, 28)), 22);
        assert_eq!(age_on(birth, date(2023, 3, 1)), 23);
        assert_eq!(age_on(birth, date(2024, 2, 29)), 24);
    }

    #[test]
    fn search_is_case_insensitive() {
        let patients = vec![patient("Ana Silva"), patient("Bruno Costa")];
        let upper = filter_by_name(&patients, "Ana");
        let lower = filter_by_name(&patients, "ana");
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);
        assert_eq!(upper[0].name, "Ana Silva");
    }

    #[test]
    fn blank_search_returns_everything_in_order() {
        let patients = vec![patient("Carla"), patient("Ana"), patient("Bia")];
        assert_eq!(filter_by_name(&patients, ""), patients);
        assert_eq!(filter_by_name(&patients, "   "), patients);
    }

    #[test]
    fn search_matches_accented_names() {
        let patients = vec![patient("JOÃO Pedro"), patient("Joana")];
        let found = filter_by_name(&patients, "joão");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "JOÃO Pedro");
    }

    #[test]
    fn draft_validation_reports_first_failure() {
        let today = date(2024, 6, 10);

        let empty = PatientDraft::default();
        assert_eq!(
            empty.validate(today).unwrap_err(),
            DomainError::validation(NAME_REQUIRED)
        );

        let blank_name = PatientDraft {
            name: "   ".into(),
            birth_date: "2030-01-01".into(),
            ..Default::default()
        };
        assert_eq!(
            blank_name.validate(today).unwrap_err(),
            DomainError::validation(NAME_REQUIRED)
        );

        let no_birth = PatientDraft {
            name: "Ana".into(),
            ..Default::default()
        };
        assert_eq!(
            no_birth.validate(today).unwrap_err(),
            DomainError::validation(BIRTH_DATE_REQUIRED)
        );

        let garbage = PatientDraft {
            name: "Ana".into(),
            birth_date: "10/06/2024".into(),
            ..Default::default()
        };
        assert_eq!(
            garbage.validate(today).unwrap_err(),
            DomainError::validation(BIRTH_DATE_INVALID)
        );

        let future = PatientDraft {
            name: "Ana".into(),
            birth_date: "2024-06-11".into(),
            ..Default::default()
        };
        assert_eq!(
            future.validate(today).unwrap_err(),
            DomainError::validation(BIRTH_DATE_IN_FUTURE)
        );
    }

    #[test]
    fn draft_accepts_today_and_trims_fields() {
        let today = date(2024, 6, 10);
        let draft = PatientDraft {
            name: "  Ana Silva ".into(),
            birth_date: "2024-06-10".into(),
            notes: "   ".into(),
        };
        let payload = draft.validate(today).unwrap();
        assert_eq!(payload.name, "Ana Silva");
        assert_eq!(payload.birth_date, today);
        assert_eq!(payload.notes, None);

        let with_notes = PatientDraft {
            notes: " alérgica a dipirona ".into(),
            ..draft
        };
        assert_eq!(
            with_notes.validate(today).unwrap().notes.as_deref(),
            Some("alérgica a dipirona")
        );
    }

    #[test]
    fn wire_shape_uses_collection_column_names() {
        let json = serde_json::json!({
            "id": "6f1c2a52-1b3f-4c7e-9a43-7d2a6f0e5b11",
            "nome": "Ana Silva",
            "data_nascimento": "1990-06-15",
            "observacoes": null,
            "criado_em": "2024-05-01T12:00:00.000000+00:00"
        });
        let p: Patient = serde_json::from_value(json).unwrap();
        assert_eq!(p.name, "Ana Silva");
        assert_eq!(p.birth_date, date(1990, 6, 15));
        assert!(p.notes.is_none());

        let payload = serde_json::to_value(NewPatient {
            name: "Ana".into(),
            birth_date: date(1990, 6, 15),
            notes: None,
        })
        .unwrap();
        assert_eq!(
            payload,
            serde_json::json!({"nome": "Ana", "data_nascimento": "1990-06-15", "observacoes": null})
        );
    }

    #[test]
    fn update_only_serializes_present_fields() {
        let update = PatientUpdate {
            notes: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            serde_json::json!({"observacoes": null})
        );
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        // Day capped at 28 so "same day N years later" always exists.
        (1900i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: age equals the number of whole anniversaries reached.
        #[test]
        fn age_counts_complete_years(birth in arb_date(), offset_days in 0i64..60_000) {
            let today = birth + chrono::Duration::days(offset_days);
            let mut anniversaries = 0;
            while birth
                .checked_add_months(chrono::Months::new(12 * (anniversaries + 1)))
                .is_some_and(|d| d <= today)
            {
                anniversaries += 1;
            }
            prop_assert_eq!(age_on(birth, today), anniversaries as i32);
        }

        /// Property: filtering is idempotent.
        #[test]
        fn filter_is_idempotent(
            names in prop::collection::vec("[A-Za-z ]{0,12}", 0..12),
            term in "[A-Za-z]{0,3}",
        ) {
            let patients: Vec<Patient> = names.iter().map(|n| patient(n)).collect();
            let once = filter_by_name(&patients, &term);
            let twice = filter_by_name(&once, &term);
            prop_assert_eq!(once, twice);
        }
    }
}

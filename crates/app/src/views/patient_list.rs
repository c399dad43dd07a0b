use std::sync::{Arc, RwLock};

use clinic_core::{Clock, PatientId};
use clinic_infra::PatientRecords;
use clinic_patients::{Patient, filter_by_name};

use super::{InFlight, format_date, format_local_date, read, write};

pub const LIST_FAILED: &str = "Erro ao carregar lista de pacientes";
pub const EMPTY_REGISTRY: &str = "Nenhum paciente cadastrado";
pub const NO_MATCHES: &str = "Nenhum paciente encontrado";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientListState {
    pub patients: Vec<Patient>,
    pub search: String,
    pub error: Option<String>,
    pub loaded: bool,
}

impl PatientListState {
    /// Patients matching the current search, in list order.
    pub fn visible(&self) -> Vec<Patient> {
        filter_by_name(&self.patients, &self.search)
    }

    /// A search counts as active as soon as anything was typed.
    pub fn searching(&self) -> bool {
        !self.search.is_empty()
    }
}

pub struct PatientListView {
    patients: PatientRecords,
    clock: Arc<dyn Clock>,
    state: RwLock<PatientListState>,
    loading: InFlight,
}

impl PatientListView {
    pub fn new(patients: PatientRecords, clock: Arc<dyn Clock>) -> Self {
        Self {
            patients,
            clock,
            state: RwLock::new(PatientListState::default()),
            loading: InFlight::default(),
        }
    }

    pub fn state(&self) -> PatientListState {
        read(&self.state).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub async fn load(&self) {
        let Some(_loading) = self.loading.try_begin() else {
            return;
        };

        let result = self.patients.list_all().await;
        let mut state = write(&self.state);
        match result {
            Ok(patients) => {
                state.patients = patients;
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "patient list failed");
                state.error = Some(LIST_FAILED.to_string());
            }
        }
        state.loaded = true;
    }

    pub fn set_search(&self, term: &str) {
        write(&self.state).search = term.to_string();
    }

    /// Id of the `position`-th visible patient, counting from 1.
    pub fn patient_at(&self, position: usize) -> Option<PatientId> {
        let visible = self.state().visible();
        position
            .checked_sub(1)
            .and_then(|index| visible.get(index))
            .map(|p| p.id)
    }

    pub fn render(&self) -> String {
        let state = self.state();
        if !state.loaded {
            return "Carregando pacientes...\n".to_string();
        }

        let today = self.clock.today();
        let visible = state.visible();
        let mut out = String::from("Lista de Pacientes\n");
        out.push_str("Gerencie e visualize todos os pacientes cadastrados\n\n");
        out.push_str(&format!(
            "Buscar: {}    Total: {}\n\n",
            state.search,
            state.patients.len()
        ));
        if let Some(error) = &state.error {
            out.push_str(&format!("! {error}\n\n"));
        }

        if visible.is_empty() {
            if state.searching() {
                out.push_str(&format!("{NO_MATCHES}\nTente ajustar os termos da busca\n"));
            } else {
                out.push_str(&format!(
                    "{EMPTY_REGISTRY}\nComece cadastrando seu primeiro paciente\n"
                ));
            }
            return out;
        }

        for (n, patient) in visible.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} ({} anos)\n",
                n + 1,
                patient.name,
                patient.age_on(today)
            ));
            out.push_str(&format!("   Nascimento: {}\n", format_date(patient.birth_date)));
            if let Some(notes) = &patient.notes {
                out.push_str(&format!("   Observações: {notes}\n"));
            }
            out.push_str(&format!(
                "   Cadastrado em: {}\n",
                format_local_date(patient.created_at)
            ));
        }

        if state.searching() {
            out.push_str(&format!(
                "\nMostrando {} de {} pacientes\n",
                visible.len(),
                state.patients.len()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clinic_core::FixedClock;
    use clinic_infra::{InMemoryBackend, PATIENTS_TABLE};
    use serde_json::json;

    fn setup(names: &[(&str, &str)]) -> (Arc<InMemoryBackend>, PatientListView) {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        let backend = Arc::new(InMemoryBackend::with_clock(clock.clone()));
        for (name, birth) in names {
            backend.seed(
                PATIENTS_TABLE,
                json!({ "nome": name, "data_nascimento": birth, "observacoes": null }),
            );
        }
        let view = PatientListView::new(PatientRecords::new(backend.clone()), clock);
        (backend, view)
    }

    #[tokio::test]
    async fn lists_patients_by_name_with_age() {
        let (_, view) = setup(&[("Marina Souza", "2000-03-01"), ("Caio Lima", "2018-03-02")]);
        assert!(view.render().contains("Carregando pacientes..."));

        view.load().await;
        let page = view.render();
        let caio = page.find("1. Caio Lima (5 anos)").unwrap();
        let marina = page.find("2. Marina Souza (24 anos)").unwrap();
        assert!(caio < marina);
        assert!(page.contains("Nascimento: 01/03/2000"));
        assert!(!page.contains("Mostrando"));
    }

    #[tokio::test]
    async fn search_filters_and_reports_counts() {
        let (_, view) = setup(&[
            ("Ana Clara", "2015-01-01"),
            ("Bruno", "2015-01-01"),
            ("Mariana", "2015-01-01"),
        ]);
        view.load().await;

        view.set_search("ANA");
        let page = view.render();
        assert!(page.contains("Ana Clara"));
        assert!(page.contains("Mariana"));
        assert!(!page.contains("Bruno"));
        assert!(page.contains("Mostrando 2 de 3 pacientes"));
        assert_eq!(view.patient_at(2), view.state().visible().get(1).map(|p| p.id));
        assert_eq!(view.patient_at(0), None);
        assert_eq!(view.patient_at(3), None);

        view.set_search("zzz");
        let page = view.render();
        assert!(page.contains(NO_MATCHES));
        assert!(!page.contains("Mostrando"));
    }

    #[tokio::test]
    async fn empty_registry_has_its_own_message() {
        let (_, view) = setup(&[]);
        view.load().await;
        assert!(view.render().contains(EMPTY_REGISTRY));
    }

    #[tokio::test]
    async fn failure_shows_the_banner() {
        let (backend, view) = setup(&[("Ana", "2015-01-01")]);
        backend.set_unreachable(true);
        view.load().await;

        let page = view.render();
        assert!(page.contains(LIST_FAILED));
        assert!(page.contains(EMPTY_REGISTRY));
        assert!(!view.is_loading());
    }
}

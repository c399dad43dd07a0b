use std::sync::{Arc, RwLock};

use clinic_core::Clock;
use clinic_infra::PatientRecords;
use clinic_patients::count_recent;

use super::{InFlight, read, write};
use crate::Route;

pub const STATS_FAILED: &str = "Erro ao carregar estatísticas";

/// Shortcuts shown under the counters.
const QUICK_ACTIONS: [(&str, &str, Route); 2] = [
    ("Cadastrar Paciente", "Adicionar novo paciente ao sistema", Route::NewPatient),
    ("Ver Pacientes", "Visualizar lista de todos os pacientes", Route::Patients),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    /// Registered within the last 30 days.
    pub recent: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub stats: Option<DashboardStats>,
    pub error: Option<String>,
}

pub struct DashboardView {
    patients: PatientRecords,
    clock: Arc<dyn Clock>,
    state: RwLock<DashboardState>,
    loading: InFlight,
}

impl DashboardView {
    pub fn new(patients: PatientRecords, clock: Arc<dyn Clock>) -> Self {
        Self {
            patients,
            clock,
            state: RwLock::new(DashboardState::default()),
            loading: InFlight::default(),
        }
    }

    pub fn state(&self) -> DashboardState {
        read(&self.state).clone()
    }

    /// Fetch every patient and derive the counters. A failure leaves the
    /// counters empty and raises the banner; loading always ends.
    pub async fn load(&self) {
        let Some(_loading) = self.loading.try_begin() else {
            return;
        };

        let result = self.patients.list_all().await;
        let mut state = write(&self.state);
        match result {
            Ok(patients) => {
                state.stats = Some(DashboardStats {
                    total: patients.len(),
                    recent: count_recent(&patients, self.clock.now()),
                });
                state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "dashboard stats failed");
                state.stats = None;
                state.error = Some(STATS_FAILED.to_string());
            }
        }
    }

    pub fn render(&self) -> String {
        let state = self.state();
        let counter = |value: Option<usize>| match (value, &state.error) {
            (Some(n), _) => n.to_string(),
            (None, Some(_)) => "-".to_string(),
            (None, None) => "...".to_string(),
        };

        let mut out = String::from("Bem-vinda ao Dashboard\n");
        out.push_str(
            "Gerencie seus pacientes e acompanhe suas evoluções de forma simples e eficiente.\n\n",
        );
        if let Some(error) = &state.error {
            out.push_str(&format!("! {error}\n\n"));
        }
        out.push_str(&format!(
            "Total de Pacientes: {}  (Pacientes cadastrados)\n",
            counter(state.stats.map(|s| s.total))
        ));
        out.push_str(&format!(
            "Novos Pacientes: {}  (Últimos 30 dias)\n\n",
            counter(state.stats.map(|s| s.recent))
        ));
        out.push_str("Ações Rápidas\n");
        for (title, description, route) in QUICK_ACTIONS {
            out.push_str(&format!("  {title}: {description}  -> go {route}\n"));
        }
        out
    }
}

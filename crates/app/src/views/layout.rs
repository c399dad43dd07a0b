//! Page chrome shared by every signed-in view.

use crate::Route;

pub const CLINIC_NAME: &str = "CLINICA PITICOS";
pub const TAGLINE: &str = "Sistema de Gestão de Pacientes";
pub const LOADING: &str = "Carregando...";

/// Navigation entries: label and target.
pub const NAVIGATION: [(&str, Route); 2] = [
    ("Lista de Pacientes", Route::Patients),
    ("Cadastrar Paciente", Route::NewPatient),
];

/// Wrap a view body in the header bar.
pub fn frame(email: &str, current: Route, body: &str) -> String {
    let nav: Vec<String> = NAVIGATION
        .iter()
        .map(|(label, route)| {
            if *route == current {
                format!("[{label}]")
            } else {
                label.to_string()
            }
        })
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{CLINIC_NAME}  |  {}  |  {email}  [Sair]\n", nav.join("  ")));
    out.push_str(&"=".repeat(72));
    out.push('\n');
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Full-screen wait indicator while the session resolves.
pub fn waiting() -> String {
    format!("{CLINIC_NAME}\n\n{LOADING}\n")
}

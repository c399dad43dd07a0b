//! Routes and session guards.
//!
//! Guards are pure functions of the route and a session snapshot; the shell
//! re-runs [`resolve`] whenever either changes.

use core::fmt;

use clinic_auth::SessionSnapshot;
use clinic_core::PatientId;

/// Upper bound on redirect hops; the guard rules settle in two.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    Patients,
    NewPatient,
    PatientDetail(PatientId),
    /// Anything else, including `/paciente/<not-a-uuid>`.
    Unmatched,
}

impl Route {
    /// Parse a path. Query strings, fragments and a trailing slash are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match path {
            "/" => Route::Root,
            "/login" => Route::Login,
            "/dashboard" => Route::Dashboard,
            "/pacientes" => Route::Patients,
            "/cadastrar-paciente" => Route::NewPatient,
            other => other
                .strip_prefix("/paciente/")
                .and_then(|id| id.parse().ok())
                .map(Route::PatientDetail)
                .unwrap_or(Route::Unmatched),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Patients => "/pacientes".to_string(),
            Route::NewPatient => "/cadastrar-paciente".to_string(),
            Route::PatientDetail(id) => format!("/paciente/{id}"),
            Route::Unmatched => "*".to_string(),
        }
    }

    /// Only reachable while signed out.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of guarding one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
    /// Session still resolving; show the wait indicator.
    Wait,
}

/// Guard a single route against the session.
pub fn guard(route: Route, session: &SessionSnapshot) -> Resolution {
    match route {
        Route::Root | Route::Unmatched => return Resolution::Redirect(Route::Dashboard),
        _ if session.loading => return Resolution::Wait,
        _ => {}
    }

    let authenticated = session.is_authenticated();
    if route.is_public() {
        if authenticated {
            Resolution::Redirect(Route::Dashboard)
        } else {
            Resolution::Render(route)
        }
    } else if authenticated {
        Resolution::Render(route)
    } else {
        Resolution::Redirect(Route::Login)
    }
}

/// Where a navigation ends up once redirects settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Render(Route),
    /// Waiting on the session while at this route.
    Wait(Route),
}

impl Outcome {
    pub fn route(&self) -> Route {
        match self {
            Outcome::Render(route) | Outcome::Wait(route) => *route,
        }
    }
}

/// Follow redirects until a route renders or the session must be awaited.
pub fn resolve(route: Route, session: &SessionSnapshot) -> Outcome {
    let mut current = route;
    for _ in 0..MAX_REDIRECTS {
        match guard(current, session) {
            Resolution::Render(route) => return Outcome::Render(route),
            Resolution::Wait => return Outcome::Wait(current),
            Resolution::Redirect(next) => {
                tracing::debug!(from = %current, to = %next, "redirect");
                current = next;
            }
        }
    }
    tracing::warn!(route = %current, "redirect chain did not settle");
    Outcome::Render(current)
}
